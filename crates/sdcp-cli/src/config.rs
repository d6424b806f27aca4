//! TOML configuration file

use anyhow::{Context, Result};
use sdcp_client::SessionConfig;
use sdcp_discovery::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of `sdcp.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub session: SessionSection,
    pub discovery: DiscoverySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub port: u16,
    pub path: String,
    pub refresh_interval_secs: u64,
    pub handshake_timeout_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            port: defaults.port,
            path: defaults.path,
            refresh_interval_secs: defaults.refresh_interval.as_secs(),
            handshake_timeout_secs: defaults.handshake_timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    pub broadcast_addr: Ipv4Addr,
    pub port: u16,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            broadcast_addr: defaults.broadcast_addr,
            port: defaults.port,
            timeout_ms: defaults.timeout.as_millis() as u64,
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
        }
    }
}

impl FileConfig {
    /// Load `path`, or the default location when none is given.
    ///
    /// A missing default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            port: self.session.port,
            path: self.session.path.clone(),
            refresh_interval: Duration::from_secs(self.session.refresh_interval_secs.max(1)),
            handshake_timeout: Duration::from_secs(self.session.handshake_timeout_secs.max(1)),
            ..Default::default()
        }
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            broadcast_addr: self.discovery.broadcast_addr,
            port: self.discovery.port,
            timeout: Duration::from_millis(self.discovery.timeout_ms),
            poll_interval: Duration::from_millis(self.discovery.poll_interval_ms.max(1)),
            ..Default::default()
        }
    }
}

/// `<config dir>/sdcp/sdcp.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sdcp").join("sdcp.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.session_config().port, 3030);
        assert_eq!(config.discovery_config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_tables() {
        let config = FileConfig::parse(
            r#"
            [session]
            refresh_interval_secs = 5

            [discovery]
            broadcast_addr = "192.168.1.255"
            "#,
        )
        .unwrap();

        let session = config.session_config();
        assert_eq!(session.refresh_interval, Duration::from_secs(5));
        assert_eq!(session.path, "/websocket");

        let discovery = config.discovery_config();
        assert_eq!(discovery.broadcast_addr, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(discovery.port, 3000);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let result = FileConfig::load(Some(Path::new("/nonexistent/sdcp.toml")));
        assert!(result.is_err());
    }
}
