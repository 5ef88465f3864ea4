pub mod inspect;
pub mod transition;

pub use inspect::{preview, resolve};
pub use transition::{transition, TransitionOptions};

use anyhow::{Context, Result};
use clap::Args;
use fops_workflow::{
    ActorContext, FeedbackDefinition, FormState, Order, Stage, StageDetails,
};
use serde::de::DeserializeOwned;
use std::fs;

/// Inputs shared by `preview` and `transition`. All files are JSON in the
/// serde shapes of the workflow types.
#[derive(Args, Debug)]
pub struct TransitionInput {
    /// Order JSON (tagged with "kind": delivery | pickup | task)
    #[arg(long)]
    pub order: String,

    /// Current stage of the order
    #[arg(long)]
    pub stage: String,

    /// Form state JSON (remarks, signature, fileUploadUrl, feedback)
    #[arg(long)]
    pub form: String,

    /// Stage-details JSON; fetched from the backend when omitted (transition only)
    #[arg(long)]
    pub details: Option<String>,

    /// Feedback definitions JSON array
    #[arg(long)]
    pub feedback: Option<String>,

    /// Acting user id
    #[arg(long, default_value_t = 0)]
    pub user: i64,

    /// Selected vehicle id
    #[arg(long)]
    pub vehicle: Option<i64>,
}

/// Parsed [`TransitionInput`].
pub(crate) struct LoadedInput {
    pub order: Order,
    pub stage: Stage,
    pub form: FormState,
    pub details: Option<StageDetails>,
    pub feedback: Vec<FeedbackDefinition>,
    pub actor: ActorContext,
}

impl LoadedInput {
    pub fn load(input: &TransitionInput) -> Result<Self> {
        let order: Order = read_json(&input.order)?;
        let stage = Stage::parse(order.kind(), &input.stage)?;
        let form: FormState = read_json(&input.form)?;
        let details = match &input.details {
            Some(p) => Some(read_json::<StageDetails>(p)?),
            None => None,
        };
        let feedback = match &input.feedback {
            Some(p) => read_json(p)?,
            None => Vec::new(),
        };
        Ok(Self {
            order,
            stage,
            form,
            details,
            feedback,
            actor: ActorContext {
                user_id: input.user,
                vehicle_id: input.vehicle,
            },
        })
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let s = fs::read_to_string(path).with_context(|| format!("read json: {path}"))?;
    serde_json::from_str(&s).with_context(|| format!("parse json: {path}"))
}
