//! Bootstrap configuration and credential resolution
//!
//! Configuration sources, highest priority first:
//! 1. Command-line arguments (applied by the calling binary)
//! 2. Environment variables (`FRAME_CONFIG`, `FRAME_TMDB_API_KEY`, `FRAME_TMDB_ACCESS_TOKEN`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is never fatal: defaults are used. Loading happens
//! before logging is configured, so callers report which file was used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Default metadata service endpoint (TMDB v3 API)
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FRAME_CONFIG";

/// Environment variable carrying a v3 API key
pub const API_KEY_ENV: &str = "FRAME_TMDB_API_KEY";

/// Environment variable carrying a v4 read access token
pub const ACCESS_TOKEN_ENV: &str = "FRAME_TMDB_ACCESS_TOKEN";

const CONFIG_DIR_NAME: &str = "frame";
const CONFIG_FILE_NAME: &str = "frame-verify.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Where the corrected listing is written (CLI `--output` overrides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Metadata service settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Pause policy between records
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Title comparison settings
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// v3 API key (sent as `api_key` query parameter)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// v4 read access token (sent as bearer token)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Response language requested from the service
    #[serde(default = "default_language", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            access_token: None,
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Throttle policy selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThrottleKind {
    /// Same pause after every record
    #[default]
    Fixed,
    /// Pause grows after failed lookups, resets after a clean record
    Backoff,
    /// Token bucket limited to `requests_per_second`
    TokenBucket,
}

impl FromStr for ThrottleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "backoff" | "exponential" => Ok(Self::Backoff),
            "token-bucket" | "token_bucket" => Ok(Self::TokenBucket),
            other => Err(Error::InvalidInput(format!(
                "unknown throttle policy '{}' (expected fixed, backoff or token-bucket)",
                other
            ))),
        }
    }
}

impl fmt::Display for ThrottleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fixed => "fixed",
            Self::Backoff => "backoff",
            Self::TokenBucket => "token-bucket",
        };
        f.write_str(name)
    }
}

/// Throttle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default)]
    pub policy: ThrottleKind,

    /// Fixed delay, or base delay for backoff
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Backoff ceiling
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Token bucket quota
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            policy: ThrottleKind::default(),
            delay_ms: default_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Title comparison strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Case-insensitive substring containment in either direction
    #[default]
    Containment,
    JaroWinkler,
    Levenshtein,
}

impl FromStr for MatchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "containment" | "substring" => Ok(Self::Containment),
            "jaro-winkler" | "jaro_winkler" => Ok(Self::JaroWinkler),
            "levenshtein" => Ok(Self::Levenshtein),
            other => Err(Error::InvalidInput(format!(
                "unknown match strategy '{}' (expected containment, jaro-winkler or levenshtein)",
                other
            ))),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Containment => "containment",
            Self::JaroWinkler => "jaro-winkler",
            Self::Levenshtein => "levenshtein",
        };
        f.write_str(name)
    }
}

/// Title matching configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub strategy: MatchStrategy,

    /// Similarity threshold for the fuzzy strategies (strategy default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Prefer search hits whose release year equals the listed year
    #[serde(default)]
    pub check_year: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
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

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_language() -> Option<String> {
    Some("en-US".to_string())
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_requests_per_second() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Copy of this configuration with credentials removed
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.api.api_key = None;
        config.api.access_token = None;
        config
    }
}

/// Platform default config file (`<config_dir>/frame/frame-verify.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolve config file location: CLI argument, then `FRAME_CONFIG`, then platform default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Load TOML configuration
///
/// Missing file → defaults. Unreadable or malformed file → error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write configuration atomically (temp file + rename)
///
/// On Unix the file is restricted to owner read/write (0600).
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Credentials for the metadata service
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// v3 API key, sent as query parameter
    ApiKey(String),
    /// v4 read access token, sent as bearer token
    AccessToken(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// Validate credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve service credentials
///
/// **Priority:** CLI → environment → TOML. Within a tier an access token wins over an API key.
pub fn resolve_credentials(
    cli_api_key: Option<&str>,
    cli_access_token: Option<&str>,
    api_config: &ApiConfig,
) -> Result<Credentials> {
    let env_api_key = std::env::var(API_KEY_ENV).ok();
    let env_access_token = std::env::var(ACCESS_TOKEN_ENV).ok();

    let tiers = [
        ("command line", cli_access_token, cli_api_key),
        (
            "environment",
            env_access_token.as_deref(),
            env_api_key.as_deref(),
        ),
        (
            "TOML",
            api_config.access_token.as_deref(),
            api_config.api_key.as_deref(),
        ),
    ];

    let sources: Vec<&str> = tiers
        .iter()
        .filter(|(_, token, key)| {
            token.map(is_valid_key).unwrap_or(false) || key.map(is_valid_key).unwrap_or(false)
        })
        .map(|(name, _, _)| *name)
        .collect();

    if sources.len() > 1 {
        warn!(
            "Metadata service credentials found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, token, key) in tiers {
        if let Some(token) = token.filter(|t| is_valid_key(t)) {
            info!("Access token loaded from {}", source);
            return Ok(Credentials::AccessToken(token.trim().to_string()));
        }
        if let Some(key) = key.filter(|k| is_valid_key(k)) {
            info!("API key loaded from {}", source);
            return Ok(Credentials::ApiKey(key.trim().to_string()));
        }
    }

    Err(Error::Config(format!(
        "Metadata service credentials not configured. Please configure using one of:\n\
         1. Command line: --api-key <key> or --access-token <token>\n\
         2. Environment: {}=<key> or {}=<token>\n\
         3. TOML config: [api] api_key = \"<key>\" (or access_token)",
        API_KEY_ENV, ACCESS_TOKEN_ENV
    )))
}
