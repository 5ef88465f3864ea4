use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use fops_client::{Backoff, ReqwestTransport, ResilientApiClient, RetryPolicy};
use fops_config::secrets::resolve_secrets;
use fops_config::{BackoffKind, ClientSettings};
use fops_workflow::{
    token_provider, AuthContext, FileUpload, HttpOrderGateway, StageTransitionEngine, StaticAuth,
    TransitionError, TransitionOutcome, TransitionRequest,
};
use tracing::info;

use super::{LoadedInput, TransitionInput};

pub struct TransitionOptions {
    pub attach: Option<String>,
    pub content_type: String,
    pub confirm_empty: bool,
}

pub fn retry_policy(s: &ClientSettings) -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(s.timeout_ms),
        max_retries: s.max_retries,
        base_delay: Duration::from_millis(s.base_delay_ms),
        backoff: match s.backoff {
            BackoffKind::Linear => Backoff::Linear,
            BackoffKind::Exponential => Backoff::Exponential,
        },
        max_delay: Duration::from_millis(s.max_delay_ms),
    }
}

/// Map an engine error to the operator-facing message. A rejected session is
/// reported on its own so the caller knows to re-authenticate.
fn report(e: TransitionError) -> anyhow::Error {
    if e.is_auth_expired() {
        anyhow!("AUTH_EXPIRED: the API token was rejected (401); sign in again and retry")
    } else {
        anyhow!("TRANSITION_FAILED {e}")
    }
}

pub async fn transition(
    config_paths: &[String],
    input: &TransitionInput,
    opts: &TransitionOptions,
) -> Result<()> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = fops_config::load_layered_yaml(&path_refs)?;
    let settings = loaded.client()?;
    let routes = loaded.routes()?;
    let base_url = settings.require_base_url()?.to_string();
    let secrets = resolve_secrets(&loaded.config_json);
    let token = secrets.require_token()?.to_string();
    info!(config_hash = %loaded.config_hash, base_url = %base_url, "config loaded");

    let mut inp = LoadedInput::load(input)?;

    let auth: Arc<dyn AuthContext> = Arc::new(StaticAuth::new(Some(token), inp.actor.clone()));
    let client = ResilientApiClient::new(
        ReqwestTransport::new(base_url),
        retry_policy(&settings),
        token_provider(auth),
    );
    let gateway = HttpOrderGateway::new(client, routes)
        .with_idempotency_header(settings.idempotency_header);
    let engine = StageTransitionEngine::new(gateway);

    let details = match inp.details.take() {
        Some(d) => d,
        None => engine
            .load_stage_details(&inp.order, inp.stage)
            .await
            .map_err(report)?,
    };
    // Operator entries live on the order file; server items only fill a gap.
    if inp.order.line_items().is_empty() && !details.line_items.is_empty() {
        inp.order.replace_line_items(details.line_items.clone());
    }
    if inp.form.feedback.is_some() && inp.feedback.is_empty() {
        inp.feedback = engine.load_feedback_definitions().await.map_err(report)?;
    }

    if let Some(path) = &opts.attach {
        let bytes = std::fs::read(path).with_context(|| format!("read attachment: {path}"))?;
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        let url = engine
            .attach_file(
                &mut inp.form,
                &FileUpload {
                    file_name,
                    content_type: opts.content_type.clone(),
                    bytes,
                },
            )
            .await
            .map_err(report)?;
        println!("file_upload_url={url}");
    }

    let outcome = engine
        .transition(&TransitionRequest {
            order: &inp.order,
            stage: inp.stage,
            form: &inp.form,
            actor: &inp.actor,
            definition: &details.definition,
            feedback_definitions: &inp.feedback,
            confirm_empty_items: opts.confirm_empty,
        })
        .await
        .map_err(report)?;

    match outcome {
        TransitionOutcome::EmptyItemsWarning => {
            bail!("EMPTY_ITEMS: order has no active line items; re-run with --confirm-empty")
        }
        TransitionOutcome::Advanced(r) => {
            println!("order_id={}", r.order_id);
            println!("from={} to={}", r.from.as_str(), r.to.as_str());
            println!("menu_name={}", r.menu_name);
            println!("was_defaulted={}", r.was_defaulted);
            println!("attempts={}", r.attempts);
            if let Some(status) = r.backend_status {
                println!("backend_status={status}");
            }
            if let Some(record) = &r.record {
                println!("{}", serde_json::to_string_pretty(record)?);
            }
            Ok(())
        }
    }
}
