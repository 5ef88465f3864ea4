//! Offline commands: nothing here contacts the backend.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use fops_client::ClassifiedError;
use fops_workflow::{
    FeedbackDefinition, FileUpload, OrderGateway, OrderKind, Stage, StageDefinitionResolver,
    StageDetails, StageDetailsQuery, StageTransitionEngine, SubmissionReceipt, TransitionError,
    TransitionPayload, TransitionRequest, Validation,
};

use super::{LoadedInput, TransitionInput};

pub fn resolve(kind: &str, stage: &str, status: &str) -> Result<()> {
    let kind = OrderKind::parse(kind)
        .with_context(|| format!("unknown order kind '{kind}' (delivery | pickup | task)"))?;
    let stage = Stage::parse(kind, stage)?;
    let req = StageDefinitionResolver::new().resolve(kind, stage, status);
    println!("{}", serde_json::to_string_pretty(&req)?);
    Ok(())
}

pub fn preview(input: &TransitionInput) -> Result<()> {
    let loaded = LoadedInput::load(input)?;
    let definition = loaded
        .details
        .as_ref()
        .map(|d| d.definition.clone())
        .unwrap_or_default();

    let engine = StageTransitionEngine::new(Offline);
    let p = engine.preview(&TransitionRequest {
        order: &loaded.order,
        stage: loaded.stage,
        form: &loaded.form,
        actor: &loaded.actor,
        definition: &definition,
        feedback_definitions: &loaded.feedback,
        confirm_empty_items: false,
    })?;

    println!("menu_name={}", p.requirement.menu_name);
    println!("was_defaulted={}", p.requirement.was_defaulted);
    if let Some(next) = p.next_stage {
        println!("next_stage={}", next.as_str());
    }
    println!("{}", serde_json::to_string_pretty(&p.payload)?);

    match p.validation {
        Validation::Passed => Ok(()),
        Validation::EmptyItemsWarning => {
            eprintln!("WARNING: no active line items; `transition` requires --confirm-empty");
            Ok(())
        }
        Validation::Failed { missing } => {
            bail!("{}", TransitionError::ValidationFailed { missing })
        }
    }
}

/// Gateway for dry runs. `preview` never calls it.
struct Offline;

fn offline() -> ClassifiedError {
    ClassifiedError::InvalidRequest {
        message: "offline: no backend configured".to_string(),
    }
}

#[async_trait]
impl OrderGateway for Offline {
    async fn fetch_stage_details(
        &self,
        _query: &StageDetailsQuery,
    ) -> Result<StageDetails, ClassifiedError> {
        Err(offline())
    }

    async fn fetch_feedback_definitions(&self) -> Result<Vec<FeedbackDefinition>, ClassifiedError> {
        Err(offline())
    }

    async fn submit_stages(
        &self,
        _batch: &[TransitionPayload],
    ) -> Result<SubmissionReceipt, ClassifiedError> {
        Err(offline())
    }

    async fn upload_file(&self, _upload: &FileUpload) -> Result<String, ClassifiedError> {
        Err(offline())
    }
}
