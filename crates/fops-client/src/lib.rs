//! fops-client
//!
//! Resilient HTTP client for the field-operations backend.
//!
//! - Every attempt is bounded by [`RetryPolicy::timeout`].
//! - Transient failures (timeout, network, 408/429/500/502/503/504) are
//!   retried up to [`RetryPolicy::max_retries`] times with linear backoff
//!   (`base_delay * n`) or, opt-in, capped exponential backoff.
//! - Everything else terminates immediately as a [`ClassifiedError`]; 401 is
//!   reported as [`ClassifiedError::AuthExpired`] so callers can force
//!   re-authentication.
//!
//! The client knows nothing about orders. Auth state is injected through a
//! [`TokenProvider`]; the network is reached only through [`HttpTransport`].

mod client;
mod error;
mod policy;
mod request;
mod transport;

pub use client::{NoAuth, ResilientApiClient, RetryableRequest, TokenProvider};
pub use error::{ClassifiedError, TransportFailure};
pub use policy::{is_retryable_status, Backoff, RetryPolicy, RETRYABLE_STATUSES};
pub use request::{ApiResponse, HttpMethod, HttpRequest, RawResponse, RequestBody};
pub use transport::{HttpTransport, ReqwestTransport};
