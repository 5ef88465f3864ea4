//! Order, line-item and form-state shapes.
//!
//! These are owned by the calling screen; the engine only borrows them for a
//! single transition call.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Delivery,
    Pickup,
    Task,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Delivery => "delivery",
            OrderKind::Pickup => "pickup",
            OrderKind::Task => "task",
        }
    }

    /// Stage-type tag the backend uses to select stage definitions.
    pub fn stage_type(&self) -> &'static str {
        match self {
            OrderKind::Delivery => "DELIVERY_ORDER",
            OrderKind::Pickup => "PICKUP_ORDER",
            OrderKind::Task => "TASK",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delivery" | "delivery_order" => Some(OrderKind::Delivery),
            "pickup" | "pickup_order" => Some(OrderKind::Pickup),
            "task" => Some(OrderKind::Task),
            _ => None,
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LineItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: i64,
    pub line_no: i32,
    pub item_code: String,
    #[serde(default)]
    pub description: String,
    pub ordered_qty: i64,
    /// Quantity still outstanding on the server.
    pub open_qty: i64,
    /// Operator-entered picked/delivered quantity. `None` = not touched.
    #[serde(default)]
    pub actioned_qty: Option<i64>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub reason_description: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl LineItem {
    /// Quantity to report: the operator's entry, or the ordered quantity.
    pub fn stage_qty(&self) -> i64 {
        self.actioned_qty.unwrap_or(self.ordered_qty)
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Fields shared by every order kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHeader {
    pub id: i64,
    pub document_no: String,
    /// Backend status string (e.g. `OPEN`, `REQUESTED`, `CLOSED`).
    pub status: String,
    #[serde(default)]
    pub customer: Option<String>,
    /// Decimal string, kept verbatim from the backend.
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub contact_numbers: Vec<String>,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// A task is its own unit of work; it has no line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOrder {
    #[serde(flatten)]
    pub header: OrderHeader,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Order {
    Delivery(DeliveryOrder),
    Pickup(PickupOrder),
    Task(TaskOrder),
}

impl Order {
    pub fn kind(&self) -> OrderKind {
        match self {
            Order::Delivery(_) => OrderKind::Delivery,
            Order::Pickup(_) => OrderKind::Pickup,
            Order::Task(_) => OrderKind::Task,
        }
    }

    pub fn header(&self) -> &OrderHeader {
        match self {
            Order::Delivery(o) => &o.header,
            Order::Pickup(o) => &o.header,
            Order::Task(o) => &o.header,
        }
    }

    pub fn id(&self) -> i64 {
        self.header().id
    }

    pub fn status(&self) -> &str {
        &self.header().status
    }

    pub fn line_items(&self) -> &[LineItem] {
        match self {
            Order::Delivery(o) => &o.line_items,
            Order::Pickup(o) => &o.line_items,
            Order::Task(_) => &[],
        }
    }

    /// Items that take part in a transition: never cancelled ones.
    pub fn active_items(&self) -> Vec<&LineItem> {
        self.line_items().iter().filter(|i| !i.cancelled).collect()
    }

    /// Replace the line items with a freshly fetched set. No-op for tasks.
    pub fn replace_line_items(&mut self, items: Vec<LineItem>) {
        match self {
            Order::Delivery(o) => o.line_items = items,
            Order::Pickup(o) => o.line_items = items,
            Order::Task(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSelection {
    Happy,
    Sad,
}

/// Header-level operator input for one transition. Per-item entries live on
/// [`LineItem`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    #[serde(default)]
    pub remarks: Option<String>,
    /// Captured signature image, base64-encoded.
    #[serde(default)]
    pub signature: Option<String>,
    /// URL returned by a previous upload; kept across failed submissions.
    #[serde(default)]
    pub file_upload_url: Option<String>,
    #[serde(default)]
    pub feedback: Option<FeedbackSelection>,
}

impl FormState {
    /// Trimmed remarks, `None` when blank.
    pub fn remarks_text(&self) -> Option<&str> {
        non_blank(self.remarks.as_deref())
    }

    pub fn has_signature(&self) -> bool {
        non_blank(self.signature.as_deref()).is_some()
    }

    pub fn has_file(&self) -> bool {
        non_blank(self.file_upload_url.as_deref()).is_some()
    }
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Server-side descriptors
// ---------------------------------------------------------------------------

/// Stage-definition descriptor from the stage-details fetch. Ids are opaque
/// server-assigned values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDefinition {
    pub definition_id: i64,
    pub detail_id: i64,
    #[serde(default)]
    pub remarks_mandatory: bool,
    #[serde(default)]
    pub signature_mandatory: bool,
    #[serde(default)]
    pub file_upload_mandatory: bool,
    #[serde(default)]
    pub feedback_mandatory: bool,
}

/// Head object returned by the stage-details fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDetails {
    pub definition: StageDefinition,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDefinition {
    pub id: i64,
    pub name: String,
}

/// Read-only actor context supplied by the auth collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub user_id: i64,
    #[serde(default)]
    pub vehicle_id: Option<i64>,
}

/// A file captured by the UI, ready for multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, cancelled: bool) -> LineItem {
        LineItem {
            id,
            line_no: id as i32 * 10,
            item_code: format!("SKU-{id}"),
            description: String::new(),
            ordered_qty: 5,
            open_qty: 5,
            actioned_qty: None,
            cancelled,
            reason_code: None,
            reason_description: None,
            remarks: None,
        }
    }

    #[test]
    fn order_deserializes_from_tagged_json() {
        let raw = json!({
            "kind": "pickup",
            "id": 42,
            "documentNo": "PO-42",
            "status": "OPEN",
            "lineItems": [
                {"id": 1, "lineNo": 10, "itemCode": "A", "orderedQty": 3, "openQty": 3}
            ]
        });
        let order: Order = serde_json::from_value(raw).unwrap();
        assert_eq!(order.kind(), OrderKind::Pickup);
        assert_eq!(order.id(), 42);
        assert_eq!(order.status(), "OPEN");
        assert_eq!(order.line_items().len(), 1);
        assert!(!order.line_items()[0].cancelled);
    }

    #[test]
    fn active_items_exclude_cancelled() {
        let order = Order::Delivery(DeliveryOrder {
            header: OrderHeader {
                id: 1,
                document_no: "DO-1".to_string(),
                status: "OPEN".to_string(),
                customer: None,
                amount: None,
                contact_numbers: vec![],
                cancelled: false,
            },
            line_items: vec![item(1, false), item(2, true), item(3, false)],
        });
        let ids: Vec<i64> = order.active_items().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn task_has_no_line_items() {
        let mut task = Order::Task(TaskOrder {
            header: OrderHeader {
                id: 9,
                document_no: "T-9".to_string(),
                status: "OPEN".to_string(),
                customer: None,
                amount: None,
                contact_numbers: vec![],
                cancelled: false,
            },
            title: Some("Inspect site".to_string()),
        });
        task.replace_line_items(vec![item(1, false)]);
        assert!(task.line_items().is_empty());
    }

    #[test]
    fn stage_qty_defaults_to_ordered() {
        let mut i = item(1, false);
        assert_eq!(i.stage_qty(), 5);
        i.actioned_qty = Some(2);
        assert_eq!(i.stage_qty(), 2);
        i.actioned_qty = Some(0);
        assert_eq!(i.stage_qty(), 0, "explicit zero is kept");
    }

    #[test]
    fn blank_form_fields_count_as_absent() {
        let form = FormState {
            remarks: Some("   ".to_string()),
            signature: Some(String::new()),
            file_upload_url: None,
            feedback: None,
        };
        assert_eq!(form.remarks_text(), None);
        assert!(!form.has_signature());
        assert!(!form.has_file());
    }
}
