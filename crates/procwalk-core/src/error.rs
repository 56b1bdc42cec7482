//! Error types for procwalk configuration and input parsing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown state {0:?} (expected one of: all, active, completed, canceled)")]
    UnknownState(String),

    #[error("unknown API version {given:?} (supported: {supported})")]
    UnknownApiVersion { given: String, supported: String },

    #[error("unknown backoff strategy {0:?} (expected fixed or exponential)")]
    UnknownBackoffStrategy(String),

    #[error("invalid resource key {0:?}")]
    InvalidKey(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("toml error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("toml serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn unknown_api_version(given: impl Into<String>, supported: &[&str]) -> Self {
        Self::UnknownApiVersion {
            given: given.into(),
            supported: supported.join(", "),
        }
    }
}
