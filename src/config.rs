//! Configuration for the mock relay server.
//!
//! Listen address, callback advertisement, replay transport settings, and
//! definitions seeded at boot.

use crate::definition::{MockRequestDefinition, MockResponseDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockRelayConfig {
    /// Listen address settings
    #[serde(default)]
    pub listen: ListenSettings,

    /// Registration callback URL settings
    #[serde(default)]
    pub callback: CallbackSettings,

    /// Outbound replay transport settings
    #[serde(default)]
    pub replay: ReplaySettings,

    /// Response definitions registered at boot. Definition fields use
    /// their wire names (`mockId`, `statusCode`, `delayMillis`).
    #[serde(default)]
    pub responses: Vec<MockResponseDefinition>,

    /// Request definitions registered at boot
    #[serde(default)]
    pub requests: Vec<MockRequestDefinition>,
}

impl MockRelayConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Seeded definitions pass the same
    /// validation as registered ones.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, definition) in self.responses.iter().enumerate() {
            definition
                .validate()
                .map_err(|e| anyhow::anyhow!("Seed response {}: {}", i, e))?;
        }
        for (i, definition) in self.requests.iter().enumerate() {
            definition
                .validate()
                .map_err(|e| anyhow::anyhow!("Seed request {}: {}", i, e))?;
        }
        Ok(())
    }
}

/// Where the server listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl ListenSettings {
    /// Bind address, resolvable by the listener (names allowed).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// How registration callback URLs are built.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CallbackSettings {
    /// Host to advertise. Local hostname resolution is used when unset.
    #[serde(default)]
    pub advertised_host: Option<String>,

    /// Port to advertise. The listen port is used when unset.
    #[serde(default)]
    pub advertised_port: Option<u16>,
}

/// Outbound replay transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaySettings {
    /// Overall replay timeout in milliseconds. Explicit `null` disables
    /// the bound.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
}

impl ReplaySettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> Option<u64> {
    Some(30_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
listen:
  host: 0.0.0.0
  port: 9000
callback:
  advertised_host: mocks.internal.test
replay:
  timeout_ms: 5000
responses:
  - mockId: hello
    statusCode: 200
    headers:
      Content-Type: [text/plain]
    body: "Hello, World!"
requests:
  - mockId: ping
    hostName: example.test
    schema: http
    endpoint: /ping
    httpMethod: GET
"#;
        let config: MockRelayConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.listen.address(), "0.0.0.0:9000");
        assert_eq!(
            config.callback.advertised_host.as_deref(),
            Some("mocks.internal.test")
        );
        assert_eq!(config.replay.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.responses.len(), 1);
        assert_eq!(config.requests[0].mock_id, "ping");
    }

    #[test]
    fn test_defaults() {
        let config: MockRelayConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.listen.address(), "127.0.0.1:8080");
        assert!(config.callback.advertised_host.is_none());
        assert_eq!(config.replay.timeout_ms, Some(30_000));
        assert!(config.responses.is_empty());
        assert!(config.requests.is_empty());
    }

    #[test]
    fn test_explicit_null_disables_timeout() {
        let config: MockRelayConfig =
            serde_yaml::from_str("replay:\n  timeout_ms: null\n").unwrap();
        assert_eq!(config.replay.timeout(), None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "listen:\n  port: 9901\nresponses:\n  - mockId: seeded\n    statusCode: 204\n"
        )
        .unwrap();

        let config = MockRelayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.listen.port, 9901);
        assert_eq!(config.responses[0].status_code, 204);
    }

    #[test]
    fn test_invalid_seed_rejected() {
        let yaml = r#"
responses:
  - mockId: broken
    statusCode: 299
"#;
        let config: MockRelayConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Seed response 0"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<MockRelayConfig, _> = serde_yaml::from_str("lisen:\n  port: 1\n");
        assert!(result.is_err());
    }
}
