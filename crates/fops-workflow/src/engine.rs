//! StageTransitionEngine: resolve, validate, build, submit, advance.
//!
//! The engine is a transition function, not a store. It borrows the order
//! and form for one call, and on any failure the caller's stage is simply
//! not advanced. Nothing is mutated on the failure path.

use std::fmt;

use fops_client::ClassifiedError;
use serde_json::Value;
use tracing::{info, warn};

use crate::gateway::{OrderGateway, StageDetailsQuery};
use crate::payload::{PayloadBuilder, PayloadInput, TransitionPayload};
use crate::resolver::{StageDefinitionResolver, StageRequirement};
use crate::stage::Stage;
use crate::types::{
    ActorContext, FeedbackDefinition, FileUpload, FormState, Order, OrderKind, StageDefinition,
    StageDetails,
};
use crate::validator::{Missing, TransitionValidator, Validation};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct TransitionRequest<'a> {
    pub order: &'a Order,
    /// Current stage as tracked by the caller.
    pub stage: Stage,
    pub form: &'a FormState,
    pub actor: &'a ActorContext,
    /// Descriptor from the last stage-details fetch.
    pub definition: &'a StageDefinition,
    pub feedback_definitions: &'a [FeedbackDefinition],
    /// Operator confirmed submitting with no active line items.
    pub confirm_empty_items: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionReceipt {
    pub order_id: i64,
    pub from: Stage,
    pub to: Stage,
    pub menu_name: String,
    /// The resolver found no row for the order's status and fell back to the
    /// kind's initial-stage menu.
    pub was_defaulted: bool,
    pub payload: TransitionPayload,
    /// Persisted record echoed by the backend.
    pub record: Option<Value>,
    pub attempts: u32,
    /// Backend status the order should now carry, where one is defined.
    pub backend_status: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Advanced(TransitionReceipt),
    /// No active line items; nothing was sent. Re-run with
    /// `confirm_empty_items` to proceed.
    EmptyItemsWarning,
}

/// Dry-run result: what would be submitted and whether it would pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub requirement: StageRequirement,
    pub validation: Validation,
    pub payload: TransitionPayload,
    pub next_stage: Option<Stage>,
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// Local validation failed; no network call was made.
    ValidationFailed { missing: Vec<Missing> },
    /// Stage is terminal (or the task is already completed); no network call.
    AlreadyTerminal { stage: Stage },
    /// Caller passed a stage that belongs to another order kind.
    StageKindMismatch { order_kind: OrderKind, stage: Stage },
    /// Classified client error, passed through unchanged.
    Api(ClassifiedError),
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::ValidationFailed { .. } => "VALIDATION_FAILED",
            TransitionError::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
            TransitionError::StageKindMismatch { .. } => "STAGE_KIND_MISMATCH",
            TransitionError::Api(e) => e.code(),
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, TransitionError::Api(e) if e.is_auth_expired())
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::ValidationFailed { missing } => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "VALIDATION_FAILED missing=[{}]", names.join(", "))
            }
            TransitionError::AlreadyTerminal { stage } => {
                write!(f, "ALREADY_TERMINAL stage={stage}")
            }
            TransitionError::StageKindMismatch { order_kind, stage } => {
                write!(f, "STAGE_KIND_MISMATCH order={order_kind} stage={stage}")
            }
            TransitionError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TransitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransitionError::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClassifiedError> for TransitionError {
    fn from(e: ClassifiedError) -> Self {
        TransitionError::Api(e)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct StageTransitionEngine<G: OrderGateway> {
    gateway: G,
    resolver: StageDefinitionResolver,
    validator: TransitionValidator,
    builder: PayloadBuilder,
}

struct Prepared {
    requirement: StageRequirement,
    validation: Validation,
}

impl<G: OrderGateway> StageTransitionEngine<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            resolver: StageDefinitionResolver::new(),
            validator: TransitionValidator::new(),
            builder: PayloadBuilder::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Submit the transition out of `req.stage`.
    ///
    /// On `Ok(Advanced)` the caller moves the order to `receipt.to`. Every
    /// other result leaves the stage where it was.
    pub async fn transition(
        &self,
        req: &TransitionRequest<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let prepared = self.prepare(req)?;
        match prepared.validation {
            Validation::Failed { missing } => {
                warn!(
                    order_id = req.order.id(),
                    stage = %req.stage,
                    missing = missing.len(),
                    "transition blocked by validation"
                );
                return Err(TransitionError::ValidationFailed { missing });
            }
            Validation::EmptyItemsWarning if !req.confirm_empty_items => {
                return Ok(TransitionOutcome::EmptyItemsWarning);
            }
            Validation::EmptyItemsWarning | Validation::Passed => {}
        }

        let to = req
            .stage
            .next()
            .ok_or(TransitionError::AlreadyTerminal { stage: req.stage })?;
        let payload = self.builder.build(&payload_input(req, &prepared.requirement));
        let submitted = self
            .gateway
            .submit_stages(std::slice::from_ref(&payload))
            .await?;

        info!(
            order_id = req.order.id(),
            from = %req.stage,
            to = %to,
            menu = %prepared.requirement.menu_name,
            was_defaulted = prepared.requirement.was_defaulted,
            attempts = submitted.attempts,
            "stage transition accepted"
        );

        Ok(TransitionOutcome::Advanced(TransitionReceipt {
            order_id: req.order.id(),
            from: req.stage,
            to,
            menu_name: prepared.requirement.menu_name,
            was_defaulted: prepared.requirement.was_defaulted,
            payload,
            record: submitted.record,
            attempts: submitted.attempts,
            backend_status: req.stage.backend_status_after(),
        }))
    }

    /// Resolve, validate and build without submitting.
    pub fn preview(&self, req: &TransitionRequest<'_>) -> Result<Preview, TransitionError> {
        let prepared = self.prepare(req)?;
        let payload = self.builder.build(&payload_input(req, &prepared.requirement));
        Ok(Preview {
            requirement: prepared.requirement,
            validation: prepared.validation,
            payload,
            next_stage: req.stage.next(),
        })
    }

    /// Fetch the stage-definition descriptor and active line items for the
    /// transition out of `stage`.
    pub async fn load_stage_details(
        &self,
        order: &Order,
        stage: Stage,
    ) -> Result<StageDetails, TransitionError> {
        check_kind(order, stage)?;
        let requirement = self.resolver.resolve(order.kind(), stage, order.status());
        let query = StageDetailsQuery {
            order_id: order.id(),
            stage_type: order.kind().stage_type().to_string(),
            menu_name: requirement.menu_name,
        };
        Ok(self.gateway.fetch_stage_details(&query).await?)
    }

    pub async fn load_feedback_definitions(
        &self,
    ) -> Result<Vec<FeedbackDefinition>, TransitionError> {
        Ok(self.gateway.fetch_feedback_definitions().await?)
    }

    /// Upload `upload` unless the form already carries a file URL, and store
    /// the returned URL in the form. A later retry of a failed submission
    /// therefore never uploads twice.
    pub async fn attach_file(
        &self,
        form: &mut FormState,
        upload: &FileUpload,
    ) -> Result<String, TransitionError> {
        if let Some(existing) = form.file_upload_url.as_deref().filter(|_| form.has_file()) {
            return Ok(existing.to_string());
        }
        let url = self.gateway.upload_file(upload).await?;
        form.file_upload_url = Some(url.clone());
        Ok(url)
    }

    fn prepare(&self, req: &TransitionRequest<'_>) -> Result<Prepared, TransitionError> {
        check_kind(req.order, req.stage)?;
        if req.stage.is_terminal() {
            return Err(TransitionError::AlreadyTerminal { stage: req.stage });
        }

        let requirement = self
            .resolver
            .resolve(req.order.kind(), req.stage, req.order.status())
            .tightened_by(req.definition);
        if requirement.terminal {
            return Err(TransitionError::AlreadyTerminal { stage: req.stage });
        }

        let items = req.order.active_items();
        let validation = self.validator.validate(&requirement, req.form, &items);
        Ok(Prepared {
            requirement,
            validation,
        })
    }
}

fn check_kind(order: &Order, stage: Stage) -> Result<(), TransitionError> {
    if stage.kind() == order.kind() {
        Ok(())
    } else {
        Err(TransitionError::StageKindMismatch {
            order_kind: order.kind(),
            stage,
        })
    }
}

fn payload_input<'a>(
    req: &TransitionRequest<'a>,
    requirement: &'a StageRequirement,
) -> PayloadInput<'a> {
    PayloadInput {
        order: req.order,
        requirement,
        definition: req.definition,
        form: req.form,
        actor: req.actor,
        feedback_definitions: req.feedback_definitions,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
