//! Read-only session context: bearer token and acting user/vehicle.
//!
//! The workflow never refreshes or stores credentials. Re-authentication
//! after [`ClassifiedError::AuthExpired`](fops_client::ClassifiedError) is
//! the caller's job.

use std::fmt;
use std::sync::Arc;

use fops_client::TokenProvider;

use crate::types::ActorContext;

pub trait AuthContext: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
    fn actor(&self) -> ActorContext;
}

/// Fixed session, e.g. from env vars in the CLI.
#[derive(Clone, Default)]
pub struct StaticAuth {
    token: Option<String>,
    actor: ActorContext,
}

impl StaticAuth {
    pub fn new(token: Option<String>, actor: ActorContext) -> Self {
        Self { token, actor }
    }
}

impl fmt::Debug for StaticAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticAuth")
            .field("token", &self.token.as_ref().map(|_| "REDACTED"))
            .field("actor", &self.actor)
            .finish()
    }
}

impl AuthContext for StaticAuth {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn actor(&self) -> ActorContext {
        self.actor.clone()
    }
}

struct SessionTokens(Arc<dyn AuthContext>);

impl TokenProvider for SessionTokens {
    fn bearer_token(&self) -> Option<String> {
        self.0.bearer_token()
    }
}

/// Adapt a session into the client's token provider. The token is read
/// fresh on every request.
pub fn token_provider(auth: Arc<dyn AuthContext>) -> Arc<dyn TokenProvider> {
    Arc::new(SessionTokens(auth))
}
