//! Shared HTTP plumbing: bearer auth, cancellation, status mapping

use crate::provider::{ClientError, ClientResult};
use crate::token::TokenProvider;
use procwalk_core::{CallContext, Config};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 2_048;

pub struct HttpCore {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpCore {
    pub fn new(config: &Config, tokens: Arc<dyn TokenProvider>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;
        Ok(Self { client, tokens })
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Attach the bearer token and send, racing the call context.
    pub async fn send(&self, ctx: &CallContext, builder: RequestBuilder) -> ClientResult<Response> {
        ctx.check()?;
        let builder = match self.tokens.bearer_token(ctx).await? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = ctx.run(builder.send()).await??;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = error_body(ctx, response).await;
            return Err(ClientError::AuthFailed(format!("{status}: {body}")));
        }
        Ok(response)
    }
}

/// `base` + `path`, tolerating a trailing slash on the base.
pub fn endpoint(base: &Url, path: &str) -> ClientResult<Url> {
    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Ok(Url::parse(&joined)?)
}

pub fn parse_base(raw: &str) -> ClientResult<Url> {
    Ok(Url::parse(raw.trim())?)
}

pub async fn json<T: DeserializeOwned>(ctx: &CallContext, response: Response) -> ClientResult<T> {
    ctx.run(response.json::<T>())
        .await?
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Body text for error messages; never fails.
pub async fn error_body(ctx: &CallContext, response: Response) -> String {
    let mut body = match ctx.run(response.text()).await {
        Ok(Ok(text)) => text,
        _ => String::new(),
    };
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

pub async fn unexpected(ctx: &CallContext, response: Response) -> ClientError {
    let status = response.status();
    ClientError::unexpected(status, error_body(ctx, response).await)
}
