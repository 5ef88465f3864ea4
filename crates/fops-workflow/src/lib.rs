//! fops-workflow
//!
//! Order-stage workflow for delivery orders, pickup orders and tasks.
//!
//! Leaf-first:
//! - [`StageDefinitionResolver`]: (kind, stage, status) → [`StageRequirement`]
//!   including the backend menu name. Pure table lookup.
//! - [`TransitionValidator`]: requirement + form + active items →
//!   [`Validation`]. Pure.
//! - [`PayloadBuilder`]: the wire [`TransitionPayload`]. Pure apart from the
//!   single submission timestamp.
//! - [`OrderGateway`]: HTTP boundary; [`HttpOrderGateway`] runs on
//!   `fops_client::ResilientApiClient`.
//! - [`StageTransitionEngine`]: composes the above; stateless between calls.
//!
//! Stage is never stored on the order. The caller supplies the current
//! [`Stage`] and moves to the returned one on success.

pub mod auth;
pub mod engine;
pub mod gateway;
pub mod payload;
pub mod resolver;
pub mod stage;
pub mod types;
pub mod validator;

pub use auth::{token_provider, AuthContext, StaticAuth};
pub use engine::{
    Preview, StageTransitionEngine, TransitionError, TransitionOutcome, TransitionReceipt,
    TransitionRequest,
};
pub use gateway::{
    idempotency_key, HttpOrderGateway, OrderGateway, StageDetailsQuery, SubmissionReceipt,
    IDEMPOTENCY_HEADER,
};
pub use payload::{FeedbackRecord, LineRecord, PayloadBuilder, PayloadInput, TransitionPayload};
pub use resolver::{StageDefinitionResolver, StageRequirement};
pub use stage::{DeliveryStage, PickupStage, Stage, StageParseError, TaskStage};
pub use types::{
    ActorContext, DeliveryOrder, FeedbackDefinition, FeedbackSelection, FileUpload, FormState,
    LineItem, Order, OrderHeader, OrderKind, PickupOrder, StageDefinition, StageDetails,
    TaskOrder,
};
pub use validator::{Missing, TransitionValidator, Validation};
