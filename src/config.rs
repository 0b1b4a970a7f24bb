//! Probe configuration
//!
//! Loaded from TOML. Every field has a default matching the classic
//! fragmentation demo (HTTP request to port 80, 8-byte fragments, TTL
//! sweep 1/3/64/128/255), so an empty file is a valid configuration.

use std::net::Ipv4Addr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::fragment::FragmentSizePolicy;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Config parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Settings for one run of the probe plan
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Sensor or host the probes are addressed to
    pub target: Ipv4Addr,
    /// Source address written into every header
    pub source: Ipv4Addr,
    /// TCP destination port for every probe
    pub dst_port: u16,
    /// Bytes per fragment for the fragmented HTTP probe
    pub fragment_size: usize,
    /// How `fragment_size` is validated
    pub size_policy: FragmentSizePolicy,
    /// Application payload carried by the fragmented probe
    pub http_payload: String,
    /// First (offset 0) fragment payload of the overlap probe
    pub overlap_benign: String,
    /// Second (offset 1) fragment payload of the overlap probe
    pub overlap_evil: String,
    /// Fixed source port of the overlap probe
    pub overlap_src_port: u16,
    /// TTL values for the TTL sweep, sent in this order
    pub ttl_sweep: Vec<u8>,
    /// IP identification for fragmented datagrams; random when unset
    pub identification: Option<u16>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            target: Ipv4Addr::LOCALHOST,
            source: Ipv4Addr::UNSPECIFIED,
            dst_port: 80,
            fragment_size: 8,
            // The demo accepts any size and lets the fragmenter round it
            size_policy: FragmentSizePolicy::Lenient,
            http_payload: "GET /EVIL_PAYLOAD HTTP/1.1\r\nHost: target\r\nUser-Agent: NmapScan\r\n\r\n"
                .to_string(),
            overlap_benign: "AAAA".to_string(),
            overlap_evil: "GET /evil HTTP/1.1".to_string(),
            overlap_src_port: 12345,
            ttl_sweep: vec![1, 3, 64, 128, 255],
            identification: None,
        }
    }
}

impl ProbeConfig {
    /// Configuration aimed at `target` with every other field defaulted
    pub fn for_target(target: Ipv4Addr) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ProbeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.is_unspecified() {
            return Err(ConfigError::ValidationError(
                "Target address cannot be 0.0.0.0".to_string(),
            ));
        }
        if self.dst_port == 0 {
            return Err(ConfigError::ValidationError(
                "Destination port cannot be 0".to_string(),
            ));
        }
        self.size_policy
            .effective_size(self.fragment_size)
            .map_err(|e| ConfigError::ValidationError(format!("fragment_size: {}", e)))?;
        if self.http_payload.is_empty() {
            return Err(ConfigError::ValidationError(
                "HTTP payload cannot be empty".to_string(),
            ));
        }
        if self.ttl_sweep.contains(&0) {
            return Err(ConfigError::ValidationError(
                "TTL sweep values must be 1-255".to_string(),
            ));
        }
        Ok(())
    }
}
