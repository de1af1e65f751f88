//! Configuration types for the order service.
//!
//! Configuration is read from a TOML file (by default `order-api.toml` in the
//! current directory) and may be overridden from the command line:
//!
//! - [`Config`] - Root configuration struct
//! - [`ServerConfig`] - HTTP listener and shutdown settings
//! - [`StoreConfig`] - Key-value store backend selection
//! - [`TracingConfig`] - Log filter and output format
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! service listening on `0.0.0.0:3000` with a redb store in `data/`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::KvStore;

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "order-api.toml";

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// order-api.toml configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds allowed for in-flight requests to drain on shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Index entries read per `GET /orders` page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            page_size: default_page_size(),
        }
    }
}

impl ServerConfig {
    /// Address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("server.host is not an IP address: '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_shutdown_grace_secs() -> u64 {
    crate::app::DEFAULT_SHUTDOWN_GRACE.as_secs()
}

fn default_page_size() -> usize {
    crate::http::DEFAULT_PAGE_SIZE
}

/// Which store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store; contents are lost on exit.
    Memory,
    /// redb database file.
    #[default]
    Redb,
}

/// Store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Database file for the redb backend.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the redb database cannot be opened or created.
    pub fn open(&self) -> Result<KvStore> {
        match self.backend {
            StoreBackend::Memory => Ok(KvStore::memory()),
            StoreBackend::Redb => KvStore::file(&self.path)
                .with_context(|| format!("Failed to open store: {}", self.path.display())),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/orders.redb")
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Tracing settings. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read (IO error)
    /// - The file contains invalid TOML syntax
    /// - Fields are unknown or have invalid types
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `path` if given, otherwise from
    /// [`DEFAULT_CONFIG_FILE`] when it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, or if the file
    /// that was found cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load_from(default)
                } else {
                    Ok(Self::default())
                }
            },
        }
    }

    /// Validate configuration with comprehensive checks.
    ///
    /// Returns a `ValidationResult` containing any non-fatal warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails with one or more errors:
    /// - Host that is not an IP address, or port 0
    /// - Zero shutdown grace period or page size
    /// - Empty store path for the redb backend
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // 1. Listener
        let server = &self.server;
        if server.host.parse::<IpAddr>().is_err() {
            errors.push(format!(
                "server.host must be an IP address (got: '{}')\n  \
                 Use 0.0.0.0 to listen on all interfaces or 127.0.0.1 for local only",
                server.host
            ));
        }

        if server.port == 0 {
            errors.push(
                "Server port cannot be 0. Use a valid port number (1-65535)\n  \
                 Common ports: 3000 (default), 8080, 8000"
                    .to_string(),
            );
        }

        if server.port < 1024 && server.port > 0 {
            warnings.push(format!(
                "Server port {} is a system/privileged port (< 1024)\n  \
                 Recommendation: Use ports >= 1024 (e.g., 3000, 8080, 8000) to avoid permission issues",
                server.port
            ));
        }

        // 2. Shutdown and paging
        if server.shutdown_grace_secs == 0 {
            errors.push(
                "server.shutdown_grace_secs cannot be 0. In-flight requests need time to drain\n  \
                 Recommended: 10 (default)"
                    .to_string(),
            );
        }

        if server.page_size == 0 {
            errors.push("server.page_size cannot be 0 (default: 50)".to_string());
        }

        if server.page_size > 1000 {
            warnings.push(format!(
                "server.page_size {} is very high (> 1000)\n  \
                 Large pages load every listed record into memory at once",
                server.page_size
            ));
        }

        // 3. Store
        match self.store.backend {
            StoreBackend::Redb => {
                if self.store.path.as_os_str().is_empty() {
                    errors.push("store.path cannot be empty for the redb backend".to_string());
                } else if self.store.path.is_dir() {
                    errors.push(format!(
                        "store.path is a directory: {}\n  \
                         Expected a database file path such as data/orders.redb",
                        self.store.path.display()
                    ));
                }
            },
            StoreBackend::Memory => {
                warnings.push(
                    "store.backend is 'memory': orders are lost when the process exits"
                        .to_string(),
                );
            },
        }

        // Return errors if any
        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
