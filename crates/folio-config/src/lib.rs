//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `library.data_dir`
//! - `library.autoadd_dir`

mod expand;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override library data directory.
    pub data_dir: Option<PathBuf>,
    /// Override (or enable) the auto-add directory.
    pub autoadd_dir: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Name prefixes reserved for synthesized feeds.
const RESERVED_PREFIXES: [&str; 2] = ["search:", "book:"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Library configuration (paths are relative strings from TOML).
    library: LibraryConfigRaw,
    /// Extra feeds created when absent.
    pub feeds: Vec<FeedConfig>,

    /// Resolved library configuration (set after loading).
    #[serde(skip)]
    pub library_resolved: LibraryConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Raw library configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct LibraryConfigRaw {
    data_dir: Option<String>,
    autoadd_dir: Option<String>,
    settle_delay_ms: Option<u64>,
    page_size: Option<usize>,
    remove_after_import: Option<bool>,
}

/// Resolved library configuration with absolute paths.
#[derive(Debug)]
pub struct LibraryConfig {
    /// Directory holding `db/` and `files/`.
    pub data_dir: PathBuf,
    /// Directory watched for new books. `None` disables the watcher.
    pub autoadd_dir: Option<PathBuf>,
    /// Wait between a file appearing and its ingestion.
    pub settle_delay: Duration,
    /// Default entries per page; 0 means unpaginated.
    pub page_size: usize,
    /// Remove files from the auto-add directory after a successful import.
    pub remove_after_import: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".folio"),
            autoadd_dir: None,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            page_size: 0,
            remove_after_import: true,
        }
    }
}

const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;

/// An administrator-defined feed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    /// Feed name used in `/catalog/{name}`.
    pub name: String,
    /// Display title.
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `navigation` or `acquisition`.
    #[serde(default = "default_feed_kind")]
    pub kind: String,
    /// `title`, `author` or `updated`.
    #[serde(default = "default_feed_sort")]
    pub sort: String,
    /// Member keys. Empty means every record.
    #[serde(default)]
    pub members: Vec<String>,
}

fn default_feed_kind() -> String {
    "acquisition".to_owned()
}

fn default_feed_sort() -> String {
    "title".to_owned()
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
        /// Config field path (e.g., "`library.data_dir`").
        field: String,
        /// Error message (e.g., "${`FOLIO_HOME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(data_dir) = &settings.data_dir {
            self.library_resolved.data_dir.clone_from(data_dir);
        }
        if let Some(autoadd_dir) = &settings.autoadd_dir {
            self.library_resolved.autoadd_dir = Some(autoadd_dir.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            library: LibraryConfigRaw::default(),
            feeds: Vec::new(),
            library_resolved: LibraryConfig {
                data_dir: base.join(".folio"),
                ..LibraryConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_feeds()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".to_owned()));
        }

        Ok(())
    }

    /// Validate administrator-defined feeds.
    fn validate_feeds(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for feed in &self.feeds {
            require_non_empty(&feed.name, "feeds.name")?;
            require_non_empty(&feed.title, &format!("feeds.{}.title", feed.name))?;

            if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| feed.name.starts_with(*p)) {
                return Err(ConfigError::Validation(format!(
                    "feed name {:?} uses the reserved prefix {prefix:?}",
                    feed.name
                )));
            }
            if !seen.insert(feed.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "feed name {:?} is defined more than once",
                    feed.name
                )));
            }
            if !matches!(feed.kind.as_str(), "navigation" | "acquisition") {
                return Err(ConfigError::Validation(format!(
                    "feeds.{}.kind must be navigation or acquisition, got {:?}",
                    feed.name, feed.kind
                )));
            }
            if !matches!(feed.sort.as_str(), "title" | "author" | "updated") {
                return Err(ConfigError::Validation(format!(
                    "feeds.{}.sort must be title, author or updated, got {:?}",
                    feed.name, feed.sort
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref dir) = self.library.data_dir {
            self.library.data_dir = Some(expand::expand_env(dir, "library.data_dir")?);
        }
        if let Some(ref dir) = self.library.autoadd_dir {
            self.library.autoadd_dir = Some(expand::expand_env(dir, "library.autoadd_dir")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.library;
        self.library_resolved = LibraryConfig {
            data_dir: config_dir.join(raw.data_dir.as_deref().unwrap_or(".folio")),
            autoadd_dir: raw.autoadd_dir.as_deref().map(|dir| config_dir.join(dir)),
            settle_delay: Duration::from_millis(
                raw.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS),
            ),
            page_size: raw.page_size.unwrap_or(0),
            remove_after_import: raw.remove_after_import.unwrap_or(true),
        };
    }
}
