//! Builder for creating and configuring SQLite gateways.

use std::path::{Path, PathBuf};

use tokio::task;

use super::{Database, SqliteGateway};
use crate::error::{GatewayError, GatewayResult};

/// Owner used when none is configured.
pub const DEFAULT_OWNER: &str = "local";

/// Builder for creating and configuring [`SqliteGateway`] instances.
#[derive(Debug, Clone)]
pub struct SqliteGatewayBuilder {
    database_path: Option<PathBuf>,
    owner: String,
}

impl SqliteGatewayBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            owner: DEFAULT_OWNER.to_string(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/waymark/waymark.db` or `~/.local/share/waymark/waymark.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the owner every call acts for.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Builds the configured gateway, creating the file and schema if needed.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::FileSystem` if the database directory cannot be created
    /// Returns `GatewayError::Storage` if database initialization fails
    pub async fn build(self) -> GatewayResult<SqliteGateway> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| GatewayError::FileSystem {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), GatewayError>(())
        })
        .await
        .map_err(|e| GatewayError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        Ok(SqliteGateway::new(db_path, self.owner))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> GatewayResult<PathBuf> {
        xdg::BaseDirectories::with_prefix("waymark")
            .place_data_file("waymark.db")
            .map_err(|e| GatewayError::XdgDirectory(e.to_string()))
    }
}

impl Default for SqliteGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
