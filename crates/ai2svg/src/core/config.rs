//! Configuration loading and management.
//!
//! This module provides utilities for loading service configuration from TOML or JSON
//! files, discovering `ai2svg.toml` in the project hierarchy, and applying
//! environment variable overrides on top.

use crate::{Ai2SvgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Name of the configuration file searched for by [`ServiceConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "ai2svg.toml";

/// Main service configuration.
///
/// # Example
///
/// ```rust
/// use ai2svg::core::config::ServiceConfig;
///
/// let config = ServiceConfig::default();
/// assert_eq!(config.converter.max_pages, 100);
///
/// // let config = ServiceConfig::from_toml_file("ai2svg.toml")?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment (affects logging posture only)
    #[serde(default)]
    pub environment: Environment,

    /// Root directory for uploads and conversion workspaces
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Maximum accepted upload size in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Deadline for a whole conversion, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// External converter settings
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Per-client rate limiting on the conversion endpoint
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Allowed CORS origins (empty = allow all)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// External converter (Inkscape) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Converter executable, either a bare name resolved through `PATH` or a full path
    #[serde(default = "default_converter_binary")]
    pub binary: PathBuf,

    /// Timeout for a single converter invocation, in seconds
    #[serde(default = "default_invocation_timeout_secs")]
    pub timeout_secs: u64,

    /// Hard upper bound on the number of pages extracted from one document
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per client within one window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = Ai2SvgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(Ai2SvgError::validation(format!(
                "Unknown environment '{}', expected 'production' or 'development'",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("ai2svg")
}
fn default_max_upload_mb() -> usize {
    50
}
fn default_request_timeout_secs() -> u64 {
    300
}
fn default_converter_binary() -> PathBuf {
    PathBuf::from("inkscape")
}
fn default_invocation_timeout_secs() -> u64 {
    60
}
fn default_max_pages() -> usize {
    100
}
fn default_max_requests() -> u32 {
    100
}
fn default_window_secs() -> u64 {
    15 * 60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            temp_dir: default_temp_dir(),
            max_upload_mb: default_max_upload_mb(),
            request_timeout_secs: default_request_timeout_secs(),
            converter: ConverterConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            binary: default_converter_binary(),
            timeout_secs: default_invocation_timeout_secs(),
            max_pages: default_max_pages(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Ai2SvgError::Validation` if the file doesn't exist or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Ai2SvgError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| Ai2SvgError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Ai2SvgError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| Ai2SvgError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(Ai2SvgError::validation(format!(
                "Unsupported config file format: {} (expected .toml or .json)",
                path.display()
            ))),
        }
    }

    /// Discover `ai2svg.toml` in the current directory or any parent directory.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(Ai2SvgError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit file wins over discovery; discovery wins over defaults. Environment
    /// overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => match Self::discover()? {
                Some(config) => {
                    tracing::info!("Loaded configuration from discovered {}", CONFIG_FILE_NAME);
                    config
                }
                None => {
                    tracing::info!("No config file found, using default configuration");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `AI2SVG_*` environment variable overrides.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = env_string("AI2SVG_HOST") {
            self.host = host;
        }

        if let Some(port) = env_parsed::<u16>("AI2SVG_PORT").or_else(|| env_parsed::<u16>("PORT")) {
            self.port = port;
        }

        if let Some(environment) = env_parsed::<Environment>("AI2SVG_ENV") {
            self.environment = environment;
        }

        if let Some(binary) = env_string("AI2SVG_INKSCAPE_PATH") {
            self.converter.binary = PathBuf::from(binary);
        }

        if let Some(dir) = env_string("AI2SVG_TEMP_DIR") {
            self.temp_dir = PathBuf::from(dir);
        }

        match env_parsed::<usize>("AI2SVG_MAX_UPLOAD_SIZE_MB") {
            Some(0) => tracing::warn!("Invalid AI2SVG_MAX_UPLOAD_SIZE_MB value (must be > 0)"),
            Some(mb) => self.max_upload_mb = mb,
            None => {}
        }

        match env_parsed::<usize>("AI2SVG_MAX_PAGES") {
            Some(0) => tracing::warn!("Invalid AI2SVG_MAX_PAGES value (must be > 0)"),
            Some(pages) => self.converter.max_pages = pages,
            None => {}
        }

        if let Some(origins) = env_string("AI2SVG_CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Deadline for one whole conversion.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory uploaded files are stored in before conversion.
    pub fn uploads_dir(&self) -> PathBuf {
        self.temp_dir.join("uploads")
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let value = env_string(name)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Failed to parse {}='{}', ignoring", name, value);
            None
        }
    }
}
