//! Configuration Management
//!
//! This module loads the database connection configuration.
//!
//! # Configuration Locations
//! - Explicit: `--config <PATH>` (highest priority, must exist)
//! - Local: `./dbconfig.json` (working directory)
//! - Global: `~/.config/workforce/dbconfig.json` (per-user)
//!
//! # File Formats
//! A file holds either a single connection, using the libpq keyword set:
//! ```json
//! { "host": "localhost", "user": "bd", "password": "bd", "dbname": "empresa" }
//! ```
//! or a registry of named connections with a default pointer:
//! ```json
//! {
//!   "connections": {
//!     "local": { "engine": "sqlite", "file": "empresa.db" },
//!     "prod": { "host": "db.example", "user": "bd", "password_env": "BD_PASSWORD", "dbname": "empresa", "readonly": true }
//!   },
//!   "default": "local"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::ConnectionConfig;
use crate::error::{Result, WorkforceError};

/// File name searched for in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "dbconfig.json";

/// Name given to the connection of a single-connection file
pub const SINGLE_CONNECTION_NAME: &str = "default";

/// Named connections with a default pointer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionRegistry {
    /// Named connections
    pub connections: HashMap<String, StoredConnection>,

    /// Name of the default connection (must exist in connections map)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Stored connection configuration
///
/// Similar to `ConnectionConfig` but supports environment variable references
/// for the password and a read-only switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConnection {
    /// Connection configuration
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Whether this connection refuses mutating menu operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
}

/// A connection ready to be opened
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    /// Name the connection was selected by
    pub name: String,
    /// Connection parameters with the password resolved
    pub config: ConnectionConfig,
    /// Mutating operations are refused when set
    pub readonly: bool,
}

impl StoredConnection {
    /// Resolve environment variables into a `ResolvedConnection`
    pub fn resolve(&self, name: impl Into<String>) -> Result<ResolvedConnection> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            let password = std::env::var(env_var).map_err(|_| {
                WorkforceError::config_error(format!(
                    "Environment variable {env_var} not found for password"
                ))
            })?;
            config.password = Some(password);
        }

        Ok(ResolvedConnection {
            name: name.into(),
            config,
            readonly: self.readonly.unwrap_or(false),
        })
    }
}

/// Parsed contents of a configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigFile {
    /// `{ "connections": {...}, "default": "..." }`
    Registry(ConnectionRegistry),
    /// A bare connection object
    Single(StoredConnection),
}

impl ConfigFile {
    /// Pick a connection by name, or the default one when no name is given
    pub fn select(&self, name: Option<&str>) -> Result<ResolvedConnection> {
        match self {
            Self::Single(stored) => match name {
                None | Some(SINGLE_CONNECTION_NAME) => stored.resolve(SINGLE_CONNECTION_NAME),
                Some(other) => Err(WorkforceError::config_error(format!(
                    "Connection '{other}' not found: the configuration file defines a single connection"
                ))),
            },
            Self::Registry(registry) => {
                let conn_name = match name {
                    Some(n) => n,
                    None => registry.default.as_deref().ok_or_else(|| {
                        WorkforceError::config_error(format!(
                            "No default connection set. Available connections: {:?}. \
                             Specify one with --connection or set a default in the config.",
                            sorted_names(registry)
                        ))
                    })?,
                };

                let stored = registry.connections.get(conn_name).ok_or_else(|| {
                    let default_info = match &registry.default {
                        Some(d) => format!(" (default: '{d}')"),
                        None => String::new(),
                    };
                    WorkforceError::config_error(format!(
                        "Connection '{conn_name}' not found. Available connections: {:?}{default_info}",
                        sorted_names(registry)
                    ))
                })?;

                stored.resolve(conn_name)
            }
        }
    }
}

fn sorted_names(registry: &ConnectionRegistry) -> Vec<&str> {
    let mut names: Vec<&str> = registry.connections.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

/// Get path to local config file (`./dbconfig.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        WorkforceError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(CONFIG_FILE_NAME))
}

/// Get path to global config file (`~/.config/workforce/dbconfig.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| WorkforceError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("workforce").join(CONFIG_FILE_NAME))
}

/// Locate the configuration file (local first, then global)
pub fn find_config_file() -> Result<PathBuf> {
    let candidates = [local_config_path()?, global_config_path()?];

    for candidate in &candidates {
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "Found configuration file");
            return Ok(candidate.clone());
        }
    }

    Err(WorkforceError::config_error(format!(
        "No configuration file found. Searched: {}, {}",
        candidates[0].display(),
        candidates[1].display()
    )))
}

/// Load and parse a configuration file
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path).map_err(|e| {
        WorkforceError::config_error(format!("Could not read config file {}: {e}", path.display()))
    })?;

    serde_json::from_str::<ConfigFile>(&contents)
        .map_err(|e| WorkforceError::config_error(format!("Invalid config file format: {e}")))
}

/// Resolve the connection to open
///
/// # Parameters
/// - `path`: Optional configuration file. If None, searches the default locations.
/// - `name`: Optional connection name. If None, uses the file's default connection.
pub fn resolve_connection(path: Option<&Path>, name: Option<&str>) -> Result<ResolvedConnection> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => find_config_file()?,
    };

    let resolved = load_config(&path)?.select(name)?;
    tracing::debug!(
        connection = %resolved.name,
        engine = %resolved.config.engine,
        readonly = resolved.readonly,
        "Resolved connection"
    );
    Ok(resolved)
}
