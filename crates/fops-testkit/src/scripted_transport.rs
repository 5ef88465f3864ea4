//! Scripted [`HttpTransport`]: replays canned outcomes and records every
//! request with the (tokio) instant it arrived.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use fops_client::{HttpRequest, HttpTransport, RawResponse, TransportFailure};
use serde_json::Value;
use tokio::time::Instant;

use crate::lock;

#[derive(Debug, Clone)]
pub enum Outcome {
    Respond(RawResponse),
    Fail(TransportFailure),
    /// Never completes; only the client's timeout ends the attempt.
    Hang,
}

impl Outcome {
    pub fn json(status: u16, body: Value) -> Self {
        Outcome::Respond(RawResponse::json(status, &body))
    }

    pub fn status(status: u16) -> Self {
        Outcome::Respond(RawResponse::new(status, ""))
    }
}

/// Outcomes are consumed in order; the last one repeats once the script
/// runs out.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    seen: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.seen).len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.seen).iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn instants(&self) -> Vec<Instant> {
        lock(&self.seen).iter().map(|(i, _)| *i).collect()
    }

    fn next_outcome(&self) -> Option<Outcome> {
        let mut script = lock(&self.script);
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, req: &HttpRequest) -> Result<RawResponse, TransportFailure> {
        lock(&self.seen).push((Instant::now(), req.clone()));
        match self.next_outcome() {
            Some(Outcome::Respond(r)) => Ok(r),
            Some(Outcome::Fail(f)) => Err(f),
            Some(Outcome::Hang) => std::future::pending().await,
            None => Err(TransportFailure::Network("script exhausted".to_string())),
        }
    }
}
