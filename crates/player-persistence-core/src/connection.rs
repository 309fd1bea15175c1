use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use player_persistence_config::DatabaseRuntimeConfig;
use rusqlite::Connection;

use crate::error::CoreError;

const MEMORY_URLS: [&str; 2] = ["sqlite::memory:", ":memory:"];
const PATH_PREFIXES: [&str; 3] = ["sqlite://", "sqlite:", "file:"];
const SYNCHRONOUS_MODES: [&str; 4] = ["OFF", "NORMAL", "FULL", "EXTRA"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Accepts `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>`,
    /// `file:<path>` or a bare filesystem path.
    pub fn parse(url: &str) -> Result<Self, CoreError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Configuration(
                "database url must not be empty".to_owned(),
            ));
        }
        if MEMORY_URLS.contains(&trimmed) {
            return Ok(Self::Memory);
        }

        let path = PATH_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);
        if path.contains("://") || path.starts_with("jdbc:") {
            return Err(CoreError::Configuration(format!(
                "unsupported database url '{trimmed}'; expected a sqlite path"
            )));
        }
        if path.is_empty() {
            return Err(CoreError::Configuration(format!(
                "database url '{trimmed}' has no path"
            )));
        }

        Ok(Self::File(PathBuf::from(path)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub location: DatabaseLocation,
    /// Recorded in the open log line only. SQLite has no authentication.
    pub username: String,
    /// Accepted so `DB_PASS` configurations load unchanged; never sent anywhere.
    pub password: String,
    pub busy_timeout: Duration,
    pub wal_enabled: bool,
    pub synchronous: String,
}

impl DatabaseSettings {
    pub fn from_runtime(config: &DatabaseRuntimeConfig) -> Result<Self, CoreError> {
        let synchronous = config.synchronous.trim().to_ascii_uppercase();
        if !SYNCHRONOUS_MODES.contains(&synchronous.as_str()) {
            return Err(CoreError::Configuration(format!(
                "unsupported synchronous mode '{}'",
                config.synchronous
            )));
        }

        Ok(Self {
            location: DatabaseLocation::parse(&config.url)?,
            username: config.username.clone(),
            password: config.password.clone(),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            wal_enabled: config.wal_enabled,
            synchronous,
        })
    }

    pub fn in_memory() -> Self {
        Self::with_location(DatabaseLocation::Memory)
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::with_location(DatabaseLocation::File(path.as_ref().to_path_buf()))
    }

    fn with_location(location: DatabaseLocation) -> Self {
        Self {
            location,
            username: String::new(),
            password: String::new(),
            busy_timeout: Duration::from_millis(5000),
            wal_enabled: true,
            synchronous: "NORMAL".to_owned(),
        }
    }
}

/// Owns the single database connection.
///
/// The connection is opened on first use and every caller borrows it through
/// [`ConnectionProvider::with_connection`], which holds the mutex for the
/// duration of the closure. Callbacks arriving from several host threads are
/// therefore serialized rather than interleaved on one connection.
pub struct ConnectionProvider {
    settings: DatabaseSettings,
    conn: Mutex<Option<Connection>>,
}

impl ConnectionProvider {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings,
            conn: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.conn
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn with_connection<T>(
        &self,
        run: impl FnOnce(&mut Connection) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| CoreError::Connection("database connection lock poisoned".to_owned()))?;

        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        let Some(conn) = guard.as_mut() else {
            return Err(CoreError::Connection(
                "database connection unavailable".to_owned(),
            ));
        };

        run(conn)
    }

    fn open(&self) -> Result<Connection, CoreError> {
        let conn = match &self.settings.location {
            DatabaseLocation::Memory => Connection::open_in_memory(),
            DatabaseLocation::File(path) => Connection::open(path),
        }
        .map_err(|err| CoreError::Connection(err.to_string()))?;

        conn.busy_timeout(self.settings.busy_timeout)
            .map_err(|err| CoreError::Connection(err.to_string()))?;
        if self.settings.wal_enabled && matches!(self.settings.location, DatabaseLocation::File(_))
        {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })
            .map_err(|err| CoreError::Connection(err.to_string()))?;
        }
        conn.pragma_update(None, "synchronous", self.settings.synchronous.as_str())
            .map_err(|err| CoreError::Connection(err.to_string()))?;

        tracing::info!(
            location = ?self.settings.location,
            username = self.settings.username.as_str(),
            "opened player persistence database"
        );
        Ok(conn)
    }
}
