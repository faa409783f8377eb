//! SDK Options
//!
//! Layered lifecycle options. Resolution order, lowest to highest precedence:
//! built-in defaults, instance-level options (config file or construction),
//! call-level overrides passed to `init`.

use crate::constants::{SDK_MAX_RETRIES, SDK_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::helpers::BackoffConfig;
use std::time::Duration;

/// Fully resolved lifecycle options
#[derive(Clone, Debug, PartialEq)]
pub struct SdkOptions {
    /// Bound on each load attempt and on every guarded SDK operation
    pub timeout: Duration,
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay schedule between attempts
    pub backoff: BackoffConfig,
}

impl Default for SdkOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(SDK_TIMEOUT_MS),
            max_retries: SDK_MAX_RETRIES,
            backoff: BackoffConfig::default(),
        }
    }
}

impl SdkOptions {
    /// Apply `overrides` on top of these options
    ///
    /// Rejects a zero timeout; the receiver is left untouched on error.
    pub fn merged(&self, overrides: &SdkOverrides) -> Result<Self> {
        overrides.validate()?;

        Ok(Self {
            timeout: overrides.timeout.unwrap_or(self.timeout),
            max_retries: overrides.max_retries.unwrap_or(self.max_retries),
            backoff: overrides.backoff.clone().unwrap_or_else(|| self.backoff.clone()),
        })
    }
}

/// Optional per-field overrides
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SdkOverrides {
    pub timeout: Option<Duration>,
    pub max_retries: Option<u32>,
    pub backoff: Option<BackoffConfig>,
}

impl SdkOverrides {
    /// No overrides
    pub fn none() -> Self {
        Self::default()
    }

    /// Override the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the retry bound
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Override the backoff schedule
    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Check values before they reach a lifecycle
    pub fn validate(&self) -> Result<()> {
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::Invalid {
                message: "SDK timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
