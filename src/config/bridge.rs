use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::manifest::EXTENSION_ID;

const DEFAULT_INSERT_ATTEMPTS: u32 = 3;
const DEFAULT_NODE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Identifier the host knows this extension by.
    pub extension_id: String,
    /// Upper bound on a single bridge round trip. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// How many ids `create` tries before giving up on primary key conflicts.
    pub insert_attempts: u32,
    /// Probe `/node/health` before handing out a repository factory.
    pub probe_node: bool,
    /// HTTP timeout for requests made through the repository factory.
    pub node_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BridgeConfigFile {
    extension_id: Option<String>,
    request_timeout_secs: Option<u64>,
    insert_attempts: Option<u32>,
    probe_node: Option<bool>,
    node_timeout_secs: Option<u64>,
}

impl BridgeConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: BridgeConfigFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

        let defaults = Self::default();
        let config = Self {
            extension_id: file.extension_id.unwrap_or(defaults.extension_id),
            request_timeout: match file.request_timeout_secs {
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.request_timeout,
            },
            insert_attempts: file.insert_attempts.unwrap_or(defaults.insert_attempts),
            probe_node: file.probe_node.unwrap_or(defaults.probe_node),
            node_timeout: file
                .node_timeout_secs
                .map_or(defaults.node_timeout, Duration::from_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extension_id.trim().is_empty() {
            return Err(Error::Config("extension_id cannot be empty".to_string()));
        }
        if self.insert_attempts == 0 {
            return Err(Error::Config("insert_attempts must be at least 1".to_string()));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.node_timeout.is_zero() {
            return Err(Error::Config(
                "node_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            extension_id: EXTENSION_ID.to_string(),
            request_timeout: None,
            insert_attempts: DEFAULT_INSERT_ATTEMPTS,
            probe_node: false,
            node_timeout: Duration::from_secs(DEFAULT_NODE_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.extension_id, "@yourdlt/plugin-ninjazzz");
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = BridgeConfig::from_toml_str(
            r#"
            extension_id = "@yourdlt/plugin-other"
            request_timeout_secs = 5
            insert_attempts = 1
            probe_node = true
            "#,
        )
        .unwrap();
        assert_eq!(config.extension_id, "@yourdlt/plugin-other");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.insert_attempts, 1);
        assert!(config.probe_node);
        assert_eq!(config.node_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            BridgeConfig::from_toml_str("insert_attempts = 0"),
            Err(Error::Config(_))
        ));
        assert!(BridgeConfig::from_toml_str("request_timeout_secs = 0").is_err());
        assert!(BridgeConfig::from_toml_str("extension_id = \" \"").is_err());
        assert!(BridgeConfig::from_toml_str("unknown_key = 1").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bridge.toml");
        std::fs::write(&path, "node_timeout_secs = 2\n").unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.node_timeout, Duration::from_secs(2));

        let missing = BridgeConfig::load(temp.path().join("missing.toml"));
        assert!(matches!(missing, Err(Error::Config(msg)) if msg.contains("missing.toml")));
    }
}
