//! Gateway configuration
//!
//! One JSON file covers the whole process: broker settings, cloud reporting,
//! registry location, jog defaults and direct-channel timeouts. Every field
//! has a default so a missing file or a sparse file both work; `validate`
//! rejects the combinations that would make the gateway silently useless.

use serde::{Deserialize, Serialize};
use shopfloor_communication::{CloudConfig, DirectChannelConfig, MqttConfig};
use std::path::Path;
use std::time::Duration;

/// Jog defaults applied by the operator console
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JogConfig {
    /// Default X/Y jog step in millimeters
    pub xy_step_mm: f64,
    /// Default Z jog step in millimeters
    pub z_step_mm: f64,
    /// Jog feed rate in mm/min
    pub feed_rate: u32,
}

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            xy_step_mm: 10.0,
            z_step_mm: 5.0,
            feed_rate: 500,
        }
    }
}

/// Direct-channel timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectConfig {
    /// Bound on establishing the TCP connection
    pub connect_timeout_ms: u64,
    /// Bound on the whole reply read loop
    pub reply_timeout_ms: u64,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3000,
            reply_timeout_ms: 5000,
        }
    }
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Broker connection settings
    pub mqtt: MqttConfig,
    /// Cloud status reporting settings
    pub cloud: CloudConfig,
    /// Jog defaults
    pub jog: JogConfig,
    /// Direct-channel timeouts
    pub direct: DirectConfig,
    /// Location of the machine registry file
    pub registry_path: String,
}

impl GatewayConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing file yields the defaults; a present but malformed file is
    /// an error, because running with defaults the operator did not choose
    /// is worse than failing loudly.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mqtt.broker_host.trim().is_empty() {
            anyhow::bail!("mqtt.broker_host must not be empty");
        }
        if self.mqtt.topic_root.trim().is_empty() || self.mqtt.topic_root.contains('/') {
            anyhow::bail!("mqtt.topic_root must be a single topic segment");
        }
        if self.jog.feed_rate == 0 {
            anyhow::bail!("jog.feed_rate must be positive");
        }
        if self.jog.xy_step_mm <= 0.0 || self.jog.z_step_mm <= 0.0 {
            anyhow::bail!("jog step distances must be positive");
        }
        if self.direct.reply_timeout_ms == 0 || self.direct.connect_timeout_ms == 0 {
            anyhow::bail!("direct-channel timeouts must be positive");
        }
        Ok(())
    }

    /// Registry file location, defaulted next to the working directory
    pub fn registry_path(&self) -> &str {
        if self.registry_path.is_empty() {
            "machines.json"
        } else {
            &self.registry_path
        }
    }

    /// Direct-channel timeouts as a channel config
    pub fn direct_channel(&self) -> DirectChannelConfig {
        DirectChannelConfig {
            connect_timeout: Duration::from_millis(self.direct.connect_timeout_ms),
            reply_timeout: Duration::from_millis(self.direct.reply_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        GatewayConfig::default().validate().unwrap();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = GatewayConfig::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.mqtt.topic_root, "cnc");
        assert_eq!(config.jog.feed_rate, 500);
    }

    #[test]
    fn test_sparse_file_fills_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "mqtt": { "broker_host": "broker.local" } }"#).unwrap();

        let config = GatewayConfig::load_from_file(&path).unwrap();
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.direct.reply_timeout_ms, 5000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(GatewayConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.jog.feed_rate = 0;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.mqtt.topic_root = "cnc/fleet".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.direct.reply_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GatewayConfig::default();
        config.cloud.endpoint = "https://example.test/status".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = GatewayConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.cloud.endpoint, "https://example.test/status");
    }
}
