//! ResourceClient trait

use async_trait::async_trait;
use procwalk_core::{
    ApiVersion, CallContext, ChangeStatus, ContextError, ProcessInstance, ProcessInstances,
    ResourceKey, SearchFilter,
};

/// Page size used for direct-children lookups; one page is assumed to hold
/// every child.
pub const CHILDREN_PAGE_SIZE: i32 = 1000;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error types
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("process instance {key} not found")]
    NotFound { key: ResourceKey },

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("process instance {key} is not in a deletable state: {message}")]
    WrongState { key: ResourceKey, message: String },

    #[error("{operation} is not supported by API version {version}")]
    NotSupported {
        operation: &'static str,
        version: ApiVersion,
    },

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error(transparent)]
    Interrupted(#[from] ContextError),
}

impl ClientError {
    /// True for the engine's "404" answer; other failures are not orphans.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn unexpected(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Operations the walker, poller and CLI need from the engine.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    fn api_version(&self) -> ApiVersion;

    /// Fetch one instance; a missing instance is `ClientError::NotFound`.
    async fn fetch_by_key(&self, ctx: &CallContext, key: ResourceKey)
        -> ClientResult<ProcessInstance>;

    async fn search(
        &self,
        ctx: &CallContext,
        filter: &SearchFilter,
        size: i32,
    ) -> ClientResult<ProcessInstances>;

    /// Direct children of `parent`, in engine order.
    async fn search_children(
        &self,
        ctx: &CallContext,
        parent: ResourceKey,
        page_size: i32,
    ) -> ClientResult<Vec<ProcessInstance>> {
        let filter = SearchFilter::default().parent_key(parent);
        let page = self.search(ctx, &filter, page_size).await?;
        Ok(page.items)
    }

    async fn cancel(&self, ctx: &CallContext, key: ResourceKey) -> ClientResult<()>;

    /// Delete an instance and its dependant data. An instance that is still
    /// running yields `ClientError::WrongState`.
    async fn delete(&self, ctx: &CallContext, key: ResourceKey) -> ClientResult<ChangeStatus>;
}
