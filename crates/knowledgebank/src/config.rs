//! Configuration management for knowledgebank.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "knowledgebank";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "resources.db";

/// Default uploads directory name.
const UPLOADS_DIR_NAME: &str = "uploads";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. The `PORT` environment variable (server port only)
/// 2. Environment variables (prefixed with `KNOWLEDGEBANK_`, nested with `__`)
/// 3. TOML config file at `~/.config/knowledgebank/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where resources are read from.
    pub source: SourceConfig,
    /// Backend server configuration.
    pub server: ServerConfig,
    /// User-facing texts and page options.
    pub ui: UiConfig,
}

/// Which data source adapter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A JSON document fetched once and filtered locally.
    #[default]
    Static,
    /// A backend API that filters per request.
    Api,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Api => write!(f, "api"),
        }
    }
}

/// Data source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Adapter to use.
    pub kind: SourceKind,
    /// Location of the JSON document for the static adapter (URL or file path).
    pub location: String,
    /// Base URL of the backend for the API adapter.
    pub api_base_url: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Path to the database file.
    /// Defaults to `~/.local/share/knowledgebank/resources.db`
    pub database_path: Option<PathBuf>,
    /// Directory for uploaded files.
    /// Defaults to `~/.local/share/knowledgebank/uploads`
    pub uploads_dir: Option<PathBuf>,
    /// Maximum accepted upload request size in bytes.
    pub max_upload_bytes: usize,
}

/// User-facing texts and page options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Shown when a search or filter matches nothing.
    pub no_results: String,
    /// Shown when the search button is used with an empty query.
    pub search_prompt: String,
    /// Shown when resources could not be loaded.
    pub load_error: String,
    /// Shown after a successful upload.
    pub upload_success: String,
    /// Shown after a failed upload.
    pub upload_failure: String,
    /// Shown instead of a download link when uploads are not served.
    pub download_unavailable: String,
    /// Label of the control that clears the tag filter.
    pub all_label: String,
    /// Resource types offered by the home page type selector.
    pub types: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Static,
            location: "data.json".to_string(),
            api_base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            database_path: None, // Will be resolved to default at runtime
            uploads_dir: None,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            no_results: "No resources found.".to_string(),
            search_prompt: "Please enter a search term.".to_string(),
            load_error: "Could not load resources. Please try again later.".to_string(),
            upload_success: "Resource uploaded successfully!".to_string(),
            upload_failure: "Upload failed. Please try again.".to_string(),
            download_unavailable: "Download unavailable in this deployment.".to_string(),
            all_label: "All".to_string(),
            types: default_types(),
        }
    }
}

/// Default resource types offered on the home page.
fn default_types() -> Vec<String> {
    ["article", "pdf", "video", "dataset", "tool"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Load and validate configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails, or if the
    /// loaded values are invalid.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config = Self::read_from(config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from all sources without validating it.
    ///
    /// Callers that adjust the values afterwards validate once they are done.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn read_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        // Top-level tables are config sections, not figment profiles.
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("KNOWLEDGEBANK_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()));

        Ok(figment.extract()?)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        match self.source.kind {
            SourceKind::Static if self.source.location.trim().is_empty() => {
                return Err(Error::ConfigValidation {
                    message: "source.location must be set for the static source".to_string(),
                });
            }
            SourceKind::Api if self.source.api_base_url.trim().is_empty() => {
                return Err(Error::ConfigValidation {
                    message: "source.api_base_url must be set for the api source".to_string(),
                });
            }
            _ => {}
        }

        if self.source.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(Error::ConfigValidation {
                message: "server.port must be greater than 0".to_string(),
            });
        }

        if self.server.max_upload_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "max_upload_bytes must be greater than 0".to_string(),
            });
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.server
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the uploads directory, resolving defaults if not set.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.server
            .uploads_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(UPLOADS_DIR_NAME))
    }

    /// Get the address the server listens on.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is not a valid IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip = self
            .server
            .bind
            .parse()
            .map_err(|_| Error::ConfigValidation {
                message: format!("invalid bind address: {}", self.server.bind),
            })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Get the HTTP request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }
}
