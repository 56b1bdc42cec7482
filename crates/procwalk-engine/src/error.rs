//! Error types for traversal and polling

use procwalk_client::ClientError;
use procwalk_core::{Chain, ContextError, Path, ResourceKey, State};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cycle detected in process instance ancestry for key {key}")]
    CycleDetected { key: ResourceKey },

    #[error("get {key}")]
    Fetch {
        key: ResourceKey,
        #[source]
        source: ClientError,
    },

    #[error("list children of {key}")]
    ListChildren {
        key: ResourceKey,
        #[source]
        source: ClientError,
    },

    #[error("ancestry fetch")]
    AncestryFetch(#[source] Box<AncestryError>),

    #[error("exceeded max_retries ({max_retries}) waiting for state {state} after {attempts} attempts")]
    RetryBudgetExhausted {
        max_retries: u32,
        state: State,
        attempts: u32,
    },

    #[error(transparent)]
    Interrupted(#[from] ContextError),

    #[error("cancel {key}")]
    Cancel {
        key: ResourceKey,
        #[source]
        source: ClientError,
    },

    #[error("delete {key}")]
    Delete {
        key: ResourceKey,
        #[source]
        source: ClientError,
    },

    #[error("waiting for state {state} failed for {key}")]
    AwaitState {
        key: ResourceKey,
        state: State,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_cycle(&self) -> bool {
        match self {
            Self::CycleDetected { .. } => true,
            Self::AncestryFetch(inner) => inner.source.is_cycle(),
            _ => false,
        }
    }

    /// The underlying context error, if this failure is a cancellation or
    /// deadline rather than a remote failure.
    pub fn interruption(&self) -> Option<ContextError> {
        match self {
            Self::Interrupted(e) => Some(*e),
            Self::Fetch { source: ClientError::Interrupted(e), .. }
            | Self::ListChildren { source: ClientError::Interrupted(e), .. } => Some(*e),
            Self::AncestryFetch(inner) => inner.source.interruption(),
            Self::AwaitState { source, .. } => source.interruption(),
            _ => None,
        }
    }
}

/// Ancestry failure with whatever was collected before it, for diagnostics.
#[derive(Error, Debug)]
#[error("ancestry walk stopped after {} instance(s)", .path.len())]
pub struct AncestryError {
    pub path: Path,
    pub chain: Chain,
    #[source]
    pub source: Error,
}

impl AncestryError {
    pub(crate) fn new(path: Path, chain: Chain, source: impl Into<Error>) -> Self {
        Self {
            path,
            chain,
            source: source.into(),
        }
    }
}
