//! Verifier configuration

use crate::error::{AuditError, AuditResult, ConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for placeholder words, keeping them "small integers".
pub const MAX_PLACEHOLDER_BASE: u64 = 1 << 32;

/// Tunables of the probing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Per-call timeout. `None` waits for the transport indefinitely, which
    /// matches the single-transaction on-chain setting.
    pub call_timeout: Option<Duration>,
    /// First placeholder argument; later parameters get `base + i`.
    pub placeholder_base: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            call_timeout: None,
            placeholder_base: 1,
        }
    }
}

impl VerifierConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `NFA1_CALL_TIMEOUT_MS`: per-call timeout in milliseconds (default: none)
    /// - `NFA1_PLACEHOLDER_BASE`: first placeholder argument (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            call_timeout: std::env::var("NFA1_CALL_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
                .or(defaults.call_timeout),
            placeholder_base: std::env::var("NFA1_PLACEHOLDER_BASE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.placeholder_base),
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - call_timeout, when set, is positive
    /// - placeholder_base is in [1, 2^32)
    pub fn validate(&self) -> AuditResult<()> {
        if let Some(timeout) = self.call_timeout {
            if timeout.is_zero() {
                return Err(AuditError::Config(ConfigError::InvalidValue {
                    field: "call_timeout".to_string(),
                    value: format!("{:?}", timeout),
                    reason: "call_timeout must be positive".to_string(),
                }));
            }
        }

        if self.placeholder_base == 0 || self.placeholder_base >= MAX_PLACEHOLDER_BASE {
            return Err(AuditError::Config(ConfigError::InvalidValue {
                field: "placeholder_base".to_string(),
                value: self.placeholder_base.to_string(),
                reason: "placeholder_base must be a small positive integer".to_string(),
            }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(VerifierConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = VerifierConfig::default().with_call_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(AuditError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_placeholder_bounds() {
        let zero = VerifierConfig {
            placeholder_base: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let huge = VerifierConfig {
            placeholder_base: MAX_PLACEHOLDER_BASE,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }
}
