//! Application configuration loaded via OrthoConfig.
//!
//! Every knob can come from CLI flags, `VALIDATOR_*` environment variables,
//! or a configuration file; absent values fall back to the accessors'
//! defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Default bind address for the HTTP server.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
/// Default data directory for the file backend.
const DEFAULT_DATA_DIR: &str = "./data";
/// Default record-log flush interval for the file backend.
const DEFAULT_FLUSH_EVERY: usize = 400;

/// Configuration errors surfaced at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The bind address did not parse.
    #[error("invalid bind address {value}: {detail}")]
    BindAddr {
        /// Rejected input.
        value: String,
        /// Parser detail.
        detail: String,
    },
    /// The storage backend name is outside the known set.
    #[error("unknown storage backend {value}; expected \"file\" or \"postgres\"")]
    UnknownBackend {
        /// Rejected input.
        value: String,
    },
    /// The PostgreSQL backend needs a database URL.
    #[error("storage backend \"postgres\" requires a database URL")]
    MissingDatabaseUrl,
}

/// Which storage backend serves the domain ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// JSON documents under a local data directory.
    File,
    /// PostgreSQL via Diesel.
    Postgres,
}

/// Configuration values controlling the server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "VALIDATOR")]
pub struct AppSettings {
    /// Address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Storage backend: `file` (default) or `postgres`.
    pub storage: Option<String>,
    /// PostgreSQL connection URL; required for the `postgres` backend.
    pub database_url: Option<String>,
    /// Data directory for the `file` backend.
    pub data_dir: Option<PathBuf>,
    /// Flush the file-backed record log every N appends.
    pub flush_every: Option<usize>,
    /// File holding the session key; an ephemeral key is generated in debug
    /// builds when absent.
    pub session_key_file: Option<PathBuf>,
    /// Whether the session cookie requires HTTPS.
    pub cookie_secure: Option<bool>,
}

impl AppSettings {
    /// Resolved bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| {
            ConfigError::BindAddr {
                value: raw.to_owned(),
                detail: err.to_string(),
            }
        })
    }

    /// Resolved storage backend selection.
    pub fn storage_backend(&self) -> Result<StorageBackend, ConfigError> {
        match self.storage.as_deref().unwrap_or("file") {
            "file" => Ok(StorageBackend::File),
            "postgres" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::UnknownBackend {
                value: other.to_owned(),
            }),
        }
    }

    /// Database URL, required when the backend is PostgreSQL.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    /// Resolved data directory for the file backend.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Resolved flush interval for the file backend.
    pub fn flush_every(&self) -> usize {
        self.flush_every.unwrap_or(DEFAULT_FLUSH_EVERY)
    }

    /// Resolved cookie-secure flag.
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }
}
