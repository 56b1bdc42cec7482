//! Bearer token contract consumed by the HTTP clients

use crate::provider::ClientResult;
use async_trait::async_trait;
use procwalk_core::CallContext;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Token for the next request, or `None` to send no Authorization header.
    async fn bearer_token(&self, ctx: &CallContext) -> ClientResult<Option<String>>;
}

/// A fixed token from config or the environment.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self, _ctx: &CallContext) -> ClientResult<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}

/// For unsecured local engines.
pub struct NoAuth;

#[async_trait]
impl TokenProvider for NoAuth {
    async fn bearer_token(&self, _ctx: &CallContext) -> ClientResult<Option<String>> {
        Ok(None)
    }
}
