//! Resilient API client: timeout, retry, backoff, classification.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ClassifiedError;
use crate::policy::RetryPolicy;
use crate::request::{ApiResponse, HttpRequest, RawResponse};
use crate::transport::HttpTransport;

// ---------------------------------------------------------------------------
// TokenProvider
// ---------------------------------------------------------------------------

/// Supplies the bearer token for outgoing requests.
///
/// The client never stores or refreshes tokens; it asks the provider once per
/// [`ResilientApiClient::send`] call.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn bearer_token(&self) -> Option<String> {
        self()
    }
}

/// Provider for unauthenticated calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl TokenProvider for NoAuth {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// RetryableRequest
// ---------------------------------------------------------------------------

/// Loop state for one `send` call. Created per call, dropped on success or
/// final failure; never persisted.
#[derive(Debug, Clone)]
pub struct RetryableRequest {
    pub request: HttpRequest,
    /// Attempts started so far (1 after the first attempt begins).
    pub attempt: u32,
    pub last_failure: Option<ClassifiedError>,
}

impl RetryableRequest {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            attempt: 0,
            last_failure: None,
        }
    }

    pub fn retries_used(&self) -> u32 {
        self.attempt.saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// ResilientApiClient
// ---------------------------------------------------------------------------

pub struct ResilientApiClient<T: HttpTransport> {
    transport: T,
    policy: RetryPolicy,
    tokens: Arc<dyn TokenProvider>,
}

impl<T: HttpTransport> ResilientApiClient<T> {
    pub fn new(transport: T, policy: RetryPolicy, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            transport,
            policy,
            tokens,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request`, retrying transient failures per the policy.
    ///
    /// Expected network and HTTP conditions are returned as
    /// [`ClassifiedError`]; this never panics.
    pub async fn send(&self, mut request: HttpRequest) -> Result<ApiResponse, ClassifiedError> {
        if !request.path.starts_with('/') {
            return Err(ClassifiedError::InvalidRequest {
                message: format!("path must start with '/': {:?}", request.path),
            });
        }
        if let Some(token) = self.tokens.bearer_token() {
            request
                .headers
                .retain(|(k, _)| !k.eq_ignore_ascii_case("authorization"));
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let mut state = RetryableRequest::new(request);
        loop {
            state.attempt += 1;
            debug!(
                method = state.request.method.as_str(),
                path = %state.request.path,
                attempt = state.attempt,
                "api attempt"
            );

            let err = match self.attempt_once(&state.request).await {
                Ok(raw) if raw.is_success() => {
                    return Ok(ApiResponse {
                        status: raw.status,
                        data: raw.data(),
                        attempts: state.attempt,
                    });
                }
                Ok(raw) => ClassifiedError::from_status(raw.status, raw.message_excerpt()),
                Err(e) => e,
            };

            if err.is_retryable() && state.retries_used() < self.policy.max_retries {
                let delay = self.policy.delay_before_retry(state.attempt);
                warn!(
                    path = %state.request.path,
                    attempt = state.attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "api attempt failed; retrying"
                );
                state.last_failure = Some(err);
                tokio::time::sleep(delay).await;
                continue;
            }

            warn!(
                path = %state.request.path,
                attempts = state.attempt,
                code = err.code(),
                error = %err,
                "api request failed"
            );
            return Err(err);
        }
    }

    async fn attempt_once(&self, req: &HttpRequest) -> Result<RawResponse, ClassifiedError> {
        match tokio::time::timeout(self.policy.timeout, self.transport.execute(req)).await {
            Err(_elapsed) => Err(ClassifiedError::Timeout {
                after: self.policy.timeout,
            }),
            Ok(Err(failure)) => Err(ClassifiedError::from_transport(failure, self.policy.timeout)),
            Ok(Ok(raw)) => Ok(raw),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
