//! procwalk core - process instance model, call context, backoff and config

pub mod backoff;
pub mod config;
pub mod context;
pub mod error;
pub mod types;

pub use backoff::{BackoffConfig, BackoffPolicy, BackoffStrategy};
pub use config::{ApiConfig, ApiVersion, AuthConfig, Config, HttpConfig};
pub use context::{CallContext, ContextError};
pub use error::{Error, Result};
pub use types::*;
