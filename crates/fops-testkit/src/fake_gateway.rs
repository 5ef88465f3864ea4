//! In-memory [`OrderGateway`] that records every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use fops_client::ClassifiedError;
use fops_workflow::{
    FeedbackDefinition, FileUpload, OrderGateway, StageDetails, StageDetailsQuery,
    SubmissionReceipt, TransitionPayload,
};

use crate::lock;

pub const FAKE_UPLOAD_URL: &str = "https://files.example.test/uploads/1";

/// Submissions succeed with one attempt unless a reply was queued with
/// [`FakeGateway::push_submit_reply`].
#[derive(Default)]
pub struct FakeGateway {
    details: Mutex<Option<StageDetails>>,
    feedback: Mutex<Vec<FeedbackDefinition>>,
    submit_replies: Mutex<VecDeque<Result<SubmissionReceipt, ClassifiedError>>>,
    upload_reply: Mutex<Option<ClassifiedError>>,

    detail_queries: Mutex<Vec<StageDetailsQuery>>,
    submitted: Mutex<Vec<Vec<TransitionPayload>>>,
    uploads: Mutex<Vec<FileUpload>>,
    feedback_fetches: Mutex<usize>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage_details(self, details: StageDetails) -> Self {
        *lock(&self.details) = Some(details);
        self
    }

    pub fn with_feedback_definitions(self, defs: Vec<FeedbackDefinition>) -> Self {
        *lock(&self.feedback) = defs;
        self
    }

    pub fn push_submit_reply(&self, reply: Result<SubmissionReceipt, ClassifiedError>) {
        lock(&self.submit_replies).push_back(reply);
    }

    pub fn fail_uploads_with(&self, err: ClassifiedError) {
        *lock(&self.upload_reply) = Some(err);
    }

    pub fn submitted(&self) -> Vec<Vec<TransitionPayload>> {
        lock(&self.submitted).clone()
    }

    pub fn submit_count(&self) -> usize {
        lock(&self.submitted).len()
    }

    pub fn upload_count(&self) -> usize {
        lock(&self.uploads).len()
    }

    pub fn detail_queries(&self) -> Vec<StageDetailsQuery> {
        lock(&self.detail_queries).clone()
    }

    /// Every gateway call of any kind.
    pub fn total_calls(&self) -> usize {
        lock(&self.detail_queries).len()
            + *lock(&self.feedback_fetches)
            + self.submit_count()
            + self.upload_count()
    }
}

#[async_trait]
impl OrderGateway for FakeGateway {
    async fn fetch_stage_details(
        &self,
        query: &StageDetailsQuery,
    ) -> Result<StageDetails, ClassifiedError> {
        lock(&self.detail_queries).push(query.clone());
        lock(&self.details)
            .clone()
            .ok_or_else(|| ClassifiedError::HttpClient {
                status: 404,
                message: format!("no stage details for order {}", query.order_id),
            })
    }

    async fn fetch_feedback_definitions(&self) -> Result<Vec<FeedbackDefinition>, ClassifiedError> {
        *lock(&self.feedback_fetches) += 1;
        Ok(lock(&self.feedback).clone())
    }

    async fn submit_stages(
        &self,
        batch: &[TransitionPayload],
    ) -> Result<SubmissionReceipt, ClassifiedError> {
        lock(&self.submitted).push(batch.to_vec());
        lock(&self.submit_replies)
            .pop_front()
            .unwrap_or(Ok(SubmissionReceipt {
                record: None,
                attempts: 1,
            }))
    }

    async fn upload_file(&self, upload: &FileUpload) -> Result<String, ClassifiedError> {
        lock(&self.uploads).push(upload.clone());
        match lock(&self.upload_reply).clone() {
            Some(err) => Err(err),
            None => Ok(FAKE_UPLOAD_URL.to_string()),
        }
    }
}
