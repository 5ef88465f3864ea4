//! Test doubles and fixtures for the workflow scenarios under `tests/`.
//!
//! Nothing here touches a real network.

pub mod fake_gateway;
pub mod fixtures;
pub mod scripted_transport;

pub use fake_gateway::FakeGateway;
pub use scripted_transport::{Outcome, ScriptedTransport};

use std::sync::{Mutex, MutexGuard};

/// Lock that survives a poisoned mutex; a panicking test must not cascade.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
