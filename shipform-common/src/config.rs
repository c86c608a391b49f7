//! Configuration loading and server URL resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable overriding the extraction server URL
pub const SERVER_URL_ENV: &str = "SHIPFORM_SERVER_URL";

/// Extraction server used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the extraction server
    #[serde(default)]
    pub server_url: Option<String>,

    /// Per-request timeout in seconds; absent means requests never time out
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Directory where submitted CSV files are written
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Session event buffer size
    #[serde(default)]
    pub event_capacity: Option<usize>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without trailing slash
    pub server_url: String,
    pub request_timeout: Option<Duration>,
    pub output_dir: PathBuf,
    pub event_capacity: usize,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: None,
            output_dir: PathBuf::from("."),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            logging: LoggingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build configuration from an already-loaded TOML file plus overrides
    pub fn from_sources(cli_server_url: Option<&str>, toml: &TomlConfig) -> Self {
        let server_url = resolve_server_url(cli_server_url, SERVER_URL_ENV, toml);
        Self {
            server_url,
            request_timeout: toml.request_timeout_secs.map(Duration::from_secs),
            output_dir: toml
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            event_capacity: toml.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
            logging: toml.logging.clone(),
        }
    }

    /// Load the TOML file (explicit path or platform default) and resolve overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is logged.
    /// A file that exists but does not parse is a configuration error.
    pub fn load(cli_server_url: Option<&str>, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        let toml = match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file not found at {}, using defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        };

        Ok(Self::from_sources(cli_server_url, &toml))
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Default config file location: `<config_dir>/shipform/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shipform").join("config.toml"))
}

/// Resolve the server URL by priority: CLI, environment, TOML, compiled default
///
/// Blank values at any tier are skipped. The result never ends in `/`.
pub fn resolve_server_url(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml: &TomlConfig,
) -> String {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg.filter(|u| !u.trim().is_empty()) {
        return normalize_url(url);
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(env_var_name) {
        if !url.trim().is_empty() {
            return normalize_url(&url);
        }
    }

    // Priority 3: TOML config file
    if let Some(url) = toml.server_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return normalize_url(url);
    }

    // Priority 4: Compiled default
    DEFAULT_SERVER_URL.to_string()
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
