//! Transition payload: the exact wire shape submitted to the backend.
//!
//! Every field is always serialized. Optional values appear as `null` and
//! collections as `[]`, so the same inputs always yield the same bytes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::resolver::StageRequirement;
use crate::types::{
    ActorContext, FeedbackDefinition, FeedbackSelection, FormState, LineItem, Order, OrderKind,
    StageDefinition,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub feedback_definition_id: i64,
    pub name: String,
    pub is_happy: bool,
    pub is_sad: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub line_id: i64,
    pub line_no: i32,
    pub item_code: String,
    pub item_description: String,
    pub order_qty: i64,
    pub open_qty: i64,
    pub stage_qty: i64,
    pub reason_code: Option<String>,
    pub reason_description: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    /// Submission time, RFC 3339 with millisecond precision.
    pub stage_date: String,
    pub stage_type: String,
    pub order_id: i64,
    pub document_no: String,
    pub stage_definition_id: i64,
    pub stage_definition_detail_id: i64,
    pub menu_name: String,
    pub remarks: Option<String>,
    pub vehicle_id: Option<i64>,
    pub user_id: i64,
    /// Geolocation placeholders; never populated by this crate.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_remarks_mandatory: bool,
    pub is_signature_mandatory: bool,
    pub is_file_upload_mandatory: bool,
    pub is_feedback_mandatory: bool,
    pub is_signature_added: bool,
    pub signature: Option<String>,
    pub file_upload_url: Option<String>,
    pub feedback: Vec<FeedbackRecord>,
    pub lines: Vec<LineRecord>,
}

/// Everything the builder reads. All borrowed; nothing is retained.
#[derive(Debug, Clone, Copy)]
pub struct PayloadInput<'a> {
    pub order: &'a Order,
    pub requirement: &'a StageRequirement,
    pub definition: &'a StageDefinition,
    pub form: &'a FormState,
    pub actor: &'a ActorContext,
    pub feedback_definitions: &'a [FeedbackDefinition],
}

/// Header values that differ per order kind.
struct KindHeader<'a> {
    stage_type: &'static str,
    document_no: &'a str,
}

fn kind_header(order: &Order) -> KindHeader<'_> {
    match order {
        Order::Delivery(o) => KindHeader {
            stage_type: OrderKind::Delivery.stage_type(),
            document_no: &o.header.document_no,
        },
        Order::Pickup(o) => KindHeader {
            stage_type: OrderKind::Pickup.stage_type(),
            document_no: &o.header.document_no,
        },
        // Tasks without a document number are addressed by their title.
        Order::Task(o) => KindHeader {
            stage_type: OrderKind::Task.stage_type(),
            document_no: if o.header.document_no.trim().is_empty() {
                o.title.as_deref().unwrap_or_default()
            } else {
                &o.header.document_no
            },
        },
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadBuilder;

impl PayloadBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build with the current time as the single submission timestamp.
    pub fn build(&self, input: &PayloadInput<'_>) -> TransitionPayload {
        self.build_at(input, Utc::now())
    }

    /// Pure variant of [`build`](Self::build).
    pub fn build_at(&self, input: &PayloadInput<'_>, at: DateTime<Utc>) -> TransitionPayload {
        let PayloadInput {
            order,
            requirement: req,
            definition,
            form,
            actor,
            feedback_definitions,
        } = *input;

        let kh = kind_header(order);
        let signature = form
            .has_signature()
            .then(|| form.signature.clone())
            .flatten();
        let file_upload_url = form
            .has_file()
            .then(|| form.file_upload_url.clone())
            .flatten();

        TransitionPayload {
            stage_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            stage_type: kh.stage_type.to_string(),
            order_id: order.id(),
            document_no: kh.document_no.to_string(),
            stage_definition_id: definition.definition_id,
            stage_definition_detail_id: definition.detail_id,
            menu_name: req.menu_name.clone(),
            remarks: form.remarks_text().map(str::to_string),
            vehicle_id: actor.vehicle_id,
            user_id: actor.user_id,
            latitude: None,
            longitude: None,
            is_remarks_mandatory: req.remarks_required,
            is_signature_mandatory: req.signature_required,
            is_file_upload_mandatory: req.file_upload_required,
            is_feedback_mandatory: req.feedback_required,
            is_signature_added: signature.is_some(),
            signature,
            file_upload_url,
            feedback: feedback_records(form.feedback, feedback_definitions),
            lines: order.active_items().into_iter().map(line_record).collect(),
        }
    }
}

fn feedback_records(
    selection: Option<FeedbackSelection>,
    definitions: &[FeedbackDefinition],
) -> Vec<FeedbackRecord> {
    let Some(sel) = selection else {
        return Vec::new();
    };
    definitions
        .iter()
        .map(|d| FeedbackRecord {
            feedback_definition_id: d.id,
            name: d.name.clone(),
            is_happy: sel == FeedbackSelection::Happy,
            is_sad: sel == FeedbackSelection::Sad,
        })
        .collect()
}

fn line_record(item: &LineItem) -> LineRecord {
    LineRecord {
        line_id: item.id,
        line_no: item.line_no,
        item_code: item.item_code.clone(),
        item_description: item.description.clone(),
        order_qty: item.ordered_qty,
        open_qty: item.open_qty,
        stage_qty: item.stage_qty(),
        reason_code: item.reason_code.clone(),
        reason_description: item.reason_description.clone(),
        remarks: item.remarks.clone(),
    }
}
