//! procwalk configuration
//!
//! Loaded from TOML at startup; a missing file means defaults, CLI flags
//! are applied on top by the binary.

use crate::backoff::BackoffConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_ENV: &str = "PROCWALK_CONFIG";
pub const TOKEN_ENVS: [&str; 2] = ["PROCWALK_TOKEN", "CAMUNDA_TOKEN"];

/// Engine API generation; selects the client implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ApiVersion {
    #[default]
    V87,
    V88,
}

impl ApiVersion {
    pub const SUPPORTED: [&'static str; 2] = ["8.7", "8.8"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V87 => "8.7",
            Self::V88 => "8.8",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .trim_start_matches(['v', 'V'])
            .chars()
            .filter(|c| *c != '.')
            .collect();
        match normalized.as_str() {
            "87" => Ok(Self::V87),
            "88" => Ok(Self::V88),
            _ => Err(Error::unknown_api_version(s, &Self::SUPPORTED)),
        }
    }
}

impl TryFrom<String> for ApiVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ApiVersion> for String {
    fn from(v: ApiVersion) -> Self {
        v.as_str().to_string()
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub http: HttpConfig,
    pub backoff: BackoffConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub version: ApiVersion,
    /// Camunda REST API (cancellation, 8.8 search and fetch).
    pub camunda_base_url: String,
    /// Operate API (8.7 search, fetch and delete).
    pub operate_base_url: String,
    /// Restrict searches to one tenant.
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token; falls back to PROCWALK_TOKEN / CAMUNDA_TOKEN.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: ApiVersion::V87,
            camunda_base_url: "http://localhost:8080".into(),
            operate_base_url: "http://localhost:8081".into(),
            tenant: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: Self = toml::from_str(&content)?;
                tracing::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {} - using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Explicit path, else $PROCWALK_CONFIG, else the per-user config dir.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
            .or_else(Self::default_path)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("procwalk").join("config.toml"))
    }

    /// Fill the token from the environment when the file did not set one.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Same as `apply_env` with a custom variable lookup. Blank values are
    /// skipped so a later variable can still supply the token.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.auth.token.is_some() {
            return;
        }
        self.auth.token = TOKEN_ENVS
            .iter()
            .find_map(|name| lookup(name).filter(|t| !t.trim().is_empty()));
    }

    pub fn validate(&self) -> Result<()> {
        validate_url("camunda_base_url", &self.api.camunda_base_url)?;
        if self.api.version == ApiVersion::V87 {
            validate_url("operate_base_url", &self.api.operate_base_url)?;
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::config("http.timeout_secs must be > 0"));
        }
        self.backoff.validate()
    }

    /// Render the current config as TOML (for `config --dump`).
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config(format!("no {field} provided in api configuration")));
    }
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::config(format!("{field} {value:?} is not a valid URL: {e}")))
}
