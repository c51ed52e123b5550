//! Configuration loading for the audit tool.
//!
//! Every field has a default except `rpc_url`, which must come from the file
//! or from `--rpc-url`.

use nfa1_core::config::MAX_PLACEHOLDER_BASE;
use nfa1_core::VerifierConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "NFA1_AUDIT_CONFIG";

/// Largest log window a single audit scans.
pub const MAX_LOG_WINDOW_BLOCKS: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuditConfig {
    pub rpc_url: String,
    /// HTTP timeout of one JSON-RPC request
    pub request_timeout_ms: u64,
    /// Verifier timeout of one probe
    pub call_timeout_ms: u64,
    pub log_window_blocks: u64,
    pub placeholder_base: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            request_timeout_ms: 30_000,
            call_timeout_ms: 10_000,
            log_window_blocks: 5_000,
            placeholder_base: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AuditConfig {
    /// Resolve the configuration for one invocation.
    ///
    /// The file comes from `path`, else from `NFA1_AUDIT_CONFIG`, else the
    /// defaults apply. `rpc_url` overrides the file's endpoint.
    pub fn load(path: Option<&Path>, rpc_url: Option<String>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(config_path_from_env);
        let mut config = match path {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        if let Some(url) = rpc_url {
            config.rpc_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.rpc_url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rpc_url",
                reason: "must not be empty (set it in the config file or pass --rpc-url)"
                    .to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "rpc_url",
                reason: "must be an http:// or https:// URL".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "call_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.log_window_blocks == 0 || self.log_window_blocks > MAX_LOG_WINDOW_BLOCKS {
            return Err(ConfigError::InvalidValue {
                field: "log_window_blocks",
                reason: format!("must be in 1..={}", MAX_LOG_WINDOW_BLOCKS),
            });
        }
        if self.placeholder_base == 0 || self.placeholder_base >= MAX_PLACEHOLDER_BASE {
            return Err(ConfigError::InvalidValue {
                field: "placeholder_base",
                reason: format!("must be in 1..{}", MAX_PLACEHOLDER_BASE),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig {
            call_timeout: Some(Duration::from_millis(self.call_timeout_ms)),
            placeholder_base: self.placeholder_base,
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid() -> AuditConfig {
        AuditConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            ..AuditConfig::default()
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AuditConfig::from_toml(
            r#"
            rpc_url = "https://node.example.io"
            log_window_blocks = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.log_window_blocks, 100);
        assert_eq!(config.call_timeout_ms, AuditConfig::default().call_timeout_ms);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = AuditConfig::from_toml("rpc_url = \"http://x\"\nretries = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<(AuditConfig, &str)> = vec![
            (AuditConfig::default(), "rpc_url"),
            (AuditConfig { rpc_url: "ws://node".into(), ..valid() }, "rpc_url"),
            (AuditConfig { request_timeout_ms: 0, ..valid() }, "request_timeout_ms"),
            (AuditConfig { call_timeout_ms: 0, ..valid() }, "call_timeout_ms"),
            (AuditConfig { log_window_blocks: 0, ..valid() }, "log_window_blocks"),
            (
                AuditConfig { log_window_blocks: MAX_LOG_WINDOW_BLOCKS + 1, ..valid() },
                "log_window_blocks",
            ),
            (AuditConfig { placeholder_base: 0, ..valid() }, "placeholder_base"),
        ];
        for (config, expected) in cases {
            match config.validate() {
                Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_from_file_with_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpc_url = \"http://file.example:8545\"\ncall_timeout_ms = 250").unwrap();

        let config = AuditConfig::load(Some(file.path()), None).unwrap();
        assert_eq!(config.rpc_url, "http://file.example:8545");
        assert_eq!(config.verifier_config().call_timeout, Some(Duration::from_millis(250)));

        let overridden =
            AuditConfig::load(Some(file.path()), Some("https://cli.example".to_string())).unwrap();
        assert_eq!(overridden.rpc_url, "https://cli.example");
        assert_eq!(overridden.call_timeout_ms, 250);
    }

    #[test]
    fn test_missing_file() {
        let err = AuditConfig::from_path(Path::new("/nonexistent/nfa1-audit.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
