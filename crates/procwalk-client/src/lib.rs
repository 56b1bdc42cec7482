//! procwalk client - engine API adapters behind one capability trait

pub mod http;
pub mod provider;
pub mod token;
pub mod v87;
pub mod v88;

pub use provider::{ClientError, ClientResult, ResourceClient, CHILDREN_PAGE_SIZE};
pub use token::{NoAuth, StaticToken, TokenProvider};
pub use v87::V87Client;
pub use v88::V88Client;

use procwalk_core::{ApiVersion, Config};
use std::sync::Arc;

/// Build the client for the configured API version.
pub fn new_client(
    config: &Config,
    tokens: Arc<dyn TokenProvider>,
) -> ClientResult<Arc<dyn ResourceClient>> {
    let http = http::HttpCore::new(config, tokens)?;
    let client: Arc<dyn ResourceClient> = match config.api.version {
        ApiVersion::V87 => Arc::new(V87Client::new(http, &config.api)?),
        ApiVersion::V88 => Arc::new(V88Client::new(http, &config.api)?),
    };
    tracing::debug!("Using API version {}", config.api.version);
    Ok(client)
}

/// Token provider derived from the `[auth]` section.
pub fn token_provider(config: &Config) -> Arc<dyn TokenProvider> {
    match &config.auth.token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None => Arc::new(NoAuth),
    }
}
