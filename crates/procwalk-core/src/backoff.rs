//! Retry delay policy for state polling

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Fixed,
    #[default]
    Exponential,
}

impl FromStr for BackoffStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" | "exp" => Ok(Self::Exponential),
            _ => Err(Error::UnknownBackoffStrategy(s.to_string())),
        }
    }
}

impl std::fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => f.write_str("fixed"),
            Self::Exponential => f.write_str("exponential"),
        }
    }
}

/// Polling budget and delay growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub strategy: BackoffStrategy,
    /// Delay before the second attempt.
    pub initial_delay_ms: u64,
    /// Cap for the exponential strategy.
    pub max_delay_ms: u64,
    /// Attempt budget; 0 means unlimited.
    pub max_retries: u32,
    /// Growth factor for the exponential strategy, must be > 1.
    pub multiplier: f64,
    /// Overall time budget for one wait; 0 disables it.
    pub timeout_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            max_retries: 0,
            multiplier: 2.0,
            timeout_ms: 120_000,
        }
    }
}

impl BackoffConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            strategy: self.strategy,
            multiplier: self.multiplier,
            max_delay: self.max_delay(),
        }
    }

    pub fn next_delay(&self, delay: Duration) -> Duration {
        self.policy().next(delay)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.strategy == BackoffStrategy::Exponential && (self.multiplier.is_nan() || self.multiplier <= 1.0) {
            return Err(Error::config(format!(
                "backoff multiplier must be > 1 for the exponential strategy, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }
}

/// Pure delay computation. The multiplier is not validated here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub strategy: BackoffStrategy,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl BackoffPolicy {
    pub fn next(&self, delay: Duration) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => delay,
            BackoffStrategy::Exponential => {
                Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        }
    }

    /// Infinite sequence of delays starting at `initial`.
    pub fn delays(self, initial: Duration) -> impl Iterator<Item = Duration> {
        std::iter::successors(Some(initial), move |d| Some(self.next(*d)))
    }
}
