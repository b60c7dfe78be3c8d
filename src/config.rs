//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$EMLSIFT_CONFIG` (environment variable)
//! 2. `~/.config/emlsift/config.toml` (Linux/macOS)
//!    `%APPDATA%\emlsift\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::parser::{ExtractOptions, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PART_SIZE};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Where and how extracted items are written.
    pub output: OutputConfig,
    /// Limits applied to untrusted input.
    pub limits: LimitsConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Output settings for `emlsift extract`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output directory.
    pub directory: PathBuf,
    /// File the primary HTML body is written to.
    pub html_body_name: String,
    /// File the primary plain-text body is written to.
    pub text_body_name: String,
    /// Overwrite existing files instead of appending a counter.
    pub overwrite: bool,
}

/// Limits applied while walking a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum decoded size of a single part in bytes (default: 64 MB).
    pub max_part_size: usize,
    /// Maximum nesting of multipart containers.
    pub max_depth: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./attachments"),
            html_body_name: "body.html".to_string(),
            text_body_name: "body.txt".to_string(),
            overwrite: false,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl LimitsConfig {
    /// Walker limits derived from this section.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_part_size: self.max_part_size,
            max_depth: self.max_depth,
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("EMLSIFT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("emlsift").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("emlsift")
}
