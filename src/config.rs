//! Configuration for bins-webhook.
//!
//! Options are read from a camelCase JSON file, matching the configuration
//! object accepted by the upstream reelyActive tooling. Every option has a
//! default, so an absent file yields a working localhost configuration.

use crate::aggregator::DEFAULT_DECODINGS_THRESHOLD;
use crate::signal::DEFAULT_SIGNAL_APPEARANCE_MILLISECONDS;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration for the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Dispatch reports over HTTPS instead of HTTP
    pub use_https: bool,

    /// Hostname of the webhook target
    pub hostname: String,

    /// Port of the webhook target
    pub port: u16,

    /// Custom headers merged into each report (overriding defaults on
    /// collision)
    pub custom_headers: HashMap<String, String>,

    /// Heartbeat period between reports
    pub heartbeat_milliseconds: u64,

    /// Mixing delay forwarded to the upstream decoding source; not used by
    /// the aggregation core
    pub mixing_delay_milliseconds: u64,

    /// Minimum decoding count a bin must strictly exceed to be reported
    pub number_of_decodings_threshold: u64,

    /// Hold duration of the signal output after a new appearance
    pub signal_appearance_milliseconds: u64,

    /// Whether new-device appearances drive the signal output
    pub enable_signal_appearance: bool,

    /// UDP port on which raddec datagrams are received
    pub listen_port: u16,

    /// External executable invoked to toggle the signal output
    pub signal_command: String,

    /// Channel index passed to the signal command
    pub signal_channel: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_https: false,
            hostname: "localhost".to_string(),
            port: 3001,
            custom_headers: HashMap::new(),
            heartbeat_milliseconds: 60000,
            mixing_delay_milliseconds: 10000,
            number_of_decodings_threshold: DEFAULT_DECODINGS_THRESHOLD,
            signal_appearance_milliseconds: DEFAULT_SIGNAL_APPEARANCE_MILLISECONDS,
            enable_signal_appearance: false,
            listen_port: 50001,
            signal_command: "signal-output".to_string(),
            signal_channel: 0,
        }
    }
}

impl Config {
    /// Load configuration from the given path, or from the default location
    /// when no path is supplied. An absent file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate_headers()?;
            Ok(config)
        } else if path.is_some() {
            Err(ConfigError::IoError(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Self::default())
        }
    }

    /// Get the default path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bins-webhook")
            .join("config.json")
    }

    /// URL scheme for report dispatch.
    pub fn scheme(&self) -> &'static str {
        if self.use_https {
            "https"
        } else {
            "http"
        }
    }

    /// Validate the custom headers into a reqwest header map.
    pub fn custom_header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.custom_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ConfigError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    fn validate_headers(&self) -> Result<(), ConfigError> {
        self.custom_header_map().map(|_| ())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    InvalidHeader(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::InvalidHeader(e) => write!(f, "Invalid custom header: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
