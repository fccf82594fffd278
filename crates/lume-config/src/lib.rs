//! Configuration management for Lume.
//!
//! Parses `lume.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every key is
//! optional:
//!
//! ```toml
//! [render]
//! gfm = true
//! math = true
//!
//! [cache]
//! enabled = true
//! capacity = 100
//!
//! [diagrams]
//! kroki_url = "${KROKI_URL:-https://kroki.io}"
//! timeout_secs = 30
//! max_concurrent = 3
//! cache_capacity = 100
//! max_width = 800
//! theme = "light"
//!
//! [scheduler]
//! settle_delay_ms = 100
//! ```
//!
//! CLI settings are applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `diagrams.kroki_url` supports `${VAR}` (error if unset) and
//! `${VAR:-default}`.

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use lume_cache::DEFAULT_CAPACITY;
use lume_diagrams::Theme;
use lume_diagrams::consts::{DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_WIDTH};
use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "lume.toml";

/// Upper bound for `diagrams.max_concurrent`.
const MAX_CONCURRENT_LIMIT: usize = 64;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override render cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override Kroki URL for diagram rendering.
    pub kroki_url: Option<String>,
    /// Override diagram theme.
    pub theme: Option<Theme>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub cache: CacheConfig,
    pub diagrams: DiagramsConfig,
    pub scheduler: SchedulerConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown conversion options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// GitHub Flavored Markdown extensions.
    pub gfm: bool,
    /// `$…$` and `$$…$$` math.
    pub math: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            math: true,
        }
    }
}

/// Converted-markup cache.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of cached documents.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Diagram rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Kroki server URL. Without it diagrams use the in-process Mermaid engine.
    pub kroki_url: Option<String>,
    /// HTTP timeout for Kroki requests.
    pub timeout_secs: u64,
    /// Diagrams rendered at the same time.
    pub max_concurrent: usize,
    /// Rendered diagrams kept in memory.
    pub cache_capacity: usize,
    /// Display width cap in pixels.
    pub max_width: u32,
    pub theme: Theme,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: None,
            timeout_secs: 30,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_width: DEFAULT_MAX_WIDTH,
            theme: Theme::default(),
        }
    }
}

impl DiagramsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Render scheduling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Pause between showing a document and starting its diagram pass.
    pub settle_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`diagrams.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn require_positive(value: usize, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `lume.toml` in current directory and parents,
    /// falling back to defaults.
    ///
    /// CLI settings are applied after loading and take precedence over config
    /// file values. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is out of range.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        tracing::debug!(
            path = ?config.config_path,
            kroki = config.diagrams.kroki_url.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache.enabled = cache_enabled;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams.kroki_url = Some(kroki_url.clone());
        }
        if let Some(theme) = settings.theme {
            self.diagrams.theme = theme;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive(self.cache.capacity, "cache.capacity")?;
        self.validate_diagrams()?;
        Ok(())
    }

    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        let diagrams = &self.diagrams;

        if let Some(ref kroki_url) = diagrams.kroki_url {
            require_http_url(kroki_url, "diagrams.kroki_url")?;
        }
        if diagrams.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "diagrams.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        require_positive(diagrams.cache_capacity, "diagrams.cache_capacity")?;
        if !(1..=MAX_CONCURRENT_LIMIT).contains(&diagrams.max_concurrent) {
            return Err(ConfigError::Validation(format!(
                "diagrams.max_concurrent must be between 1 and {MAX_CONCURRENT_LIMIT}"
            )));
        }
        if !(1..=DEFAULT_MAX_WIDTH).contains(&diagrams.max_width) {
            return Err(ConfigError::Validation(format!(
                "diagrams.max_width must be between 1 and {DEFAULT_MAX_WIDTH}"
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.diagrams.kroki_url {
            self.diagrams.kroki_url = Some(expand::expand_env(url, "diagrams.kroki_url")?);
        }
        Ok(())
    }
}
