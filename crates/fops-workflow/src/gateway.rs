//! OrderGateway: the HTTP boundary of the workflow.
//!
//! The engine talks to the backend only through [`OrderGateway`]. The
//! production implementation, [`HttpOrderGateway`], sits on top of
//! [`ResilientApiClient`] so every call inherits timeout, retry and error
//! classification. Test doubles implement the trait directly.

use async_trait::async_trait;
use fops_client::{
    ClassifiedError, HttpMethod, HttpRequest, HttpTransport, RequestBody, ResilientApiClient,
};
use fops_config::RouteSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::payload::TransitionPayload;
use crate::types::{FeedbackDefinition, FileUpload, StageDetails};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Multipart field name the upload endpoint expects.
const UPLOAD_FIELD: &str = "file";

/// Arguments of the stage-details fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDetailsQuery {
    pub order_id: i64,
    pub stage_type: String,
    pub menu_name: String,
}

/// Accepted stage submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Persisted record echoed by the backend, if any.
    pub record: Option<Value>,
    pub attempts: u32,
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn fetch_stage_details(
        &self,
        query: &StageDetailsQuery,
    ) -> Result<StageDetails, ClassifiedError>;

    async fn fetch_feedback_definitions(&self) -> Result<Vec<FeedbackDefinition>, ClassifiedError>;

    /// The backend endpoint is batch-shaped even for one order.
    async fn submit_stages(
        &self,
        batch: &[TransitionPayload],
    ) -> Result<SubmissionReceipt, ClassifiedError>;

    /// Returns the server-assigned file URL.
    async fn upload_file(&self, upload: &FileUpload) -> Result<String, ClassifiedError>;
}

// ---------------------------------------------------------------------------
// HttpOrderGateway
// ---------------------------------------------------------------------------

pub struct HttpOrderGateway<T: HttpTransport> {
    client: ResilientApiClient<T>,
    routes: RouteSettings,
    idempotency_header: bool,
}

impl<T: HttpTransport> HttpOrderGateway<T> {
    pub fn new(client: ResilientApiClient<T>, routes: RouteSettings) -> Self {
        Self {
            client,
            routes,
            idempotency_header: false,
        }
    }

    /// Send a deterministic `Idempotency-Key` with every submission.
    pub fn with_idempotency_header(mut self, enabled: bool) -> Self {
        self.idempotency_header = enabled;
        self
    }

    pub fn client(&self) -> &ResilientApiClient<T> {
        &self.client
    }

    pub fn routes(&self) -> &RouteSettings {
        &self.routes
    }
}

/// Deterministic key for a submission batch: identical bytes, identical key.
pub fn idempotency_key(body: &[u8]) -> Uuid {
    let mut data = b"fops-workflow.submit.v1|".to_vec();
    data.extend_from_slice(body);
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, &data)
}

#[async_trait]
impl<T: HttpTransport> OrderGateway for HttpOrderGateway<T> {
    async fn fetch_stage_details(
        &self,
        query: &StageDetailsQuery,
    ) -> Result<StageDetails, ClassifiedError> {
        let req = HttpRequest::get(self.routes.stage_details.clone())
            .with_query("orderId", query.order_id.to_string())
            .with_query("stageType", query.stage_type.clone())
            .with_query("menuName", query.menu_name.clone());
        let resp = self.client.send(req).await?;
        let body = payload_of(resp.data)?;
        decode(body, "stage details")
    }

    async fn fetch_feedback_definitions(&self) -> Result<Vec<FeedbackDefinition>, ClassifiedError> {
        let resp = self
            .client
            .send(HttpRequest::get(self.routes.feedback_definitions.clone()))
            .await?;
        match payload_of(resp.data)? {
            Value::Null => Ok(Vec::new()),
            body => decode(body, "feedback definitions"),
        }
    }

    async fn submit_stages(
        &self,
        batch: &[TransitionPayload],
    ) -> Result<SubmissionReceipt, ClassifiedError> {
        let body = serde_json::to_value(batch).map_err(|e| ClassifiedError::InvalidRequest {
            message: format!("transition payload not serializable: {e}"),
        })?;

        let mut req = HttpRequest::new(HttpMethod::Post, self.routes.stage_submit.clone());
        if self.idempotency_header {
            let key = idempotency_key(body.to_string().as_bytes());
            debug!(key = %key, batch = batch.len(), "attaching idempotency key");
            req = req.with_header(IDEMPOTENCY_HEADER, key.to_string());
        }

        let resp = self
            .client
            .send(req.with_body(RequestBody::Json(body)))
            .await?;
        let record = payload_of(resp.data)?;
        Ok(SubmissionReceipt {
            record: (!record.is_null()).then_some(record),
            attempts: resp.attempts,
        })
    }

    async fn upload_file(&self, upload: &FileUpload) -> Result<String, ClassifiedError> {
        let req = HttpRequest::new(HttpMethod::Post, self.routes.file_upload.clone()).with_body(
            RequestBody::Multipart {
                field: UPLOAD_FIELD.to_string(),
                file_name: upload.file_name.clone(),
                content_type: upload.content_type.clone(),
                bytes: upload.bytes.clone(),
            },
        );
        let body = self.client.send(req).await?.data;
        let url = body
            .pointer("/data/url")
            .or_else(|| body.get("url"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(u) = url {
            return Ok(u.to_string());
        }
        // Surface an explicit backend rejection before the generic one.
        payload_of(body)?;
        Err(ClassifiedError::Rejected {
            message: "upload response carried no url".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

/// Unwrap the backend envelope `{ success, message?, data? }`.
///
/// `success: false` is an application-level rejection even on HTTP 2xx.
/// Bodies without a `success` field are taken as the payload itself.
fn payload_of(body: Value) -> Result<Value, ClassifiedError> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };
    match map.get("success").and_then(Value::as_bool) {
        Some(false) => {
            let message = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("backend reported failure")
                .to_string();
            Err(ClassifiedError::Rejected { message })
        }
        Some(true) => Ok(map.remove("data").unwrap_or(Value::Null)),
        None => Ok(Value::Object(map)),
    }
}

fn decode<D: DeserializeOwned>(body: Value, what: &str) -> Result<D, ClassifiedError> {
    serde_json::from_value(body).map_err(|e| ClassifiedError::Rejected {
        message: format!("malformed {what} response: {e}"),
    })
}
