//! Opening SQLite handles for Branch
//!
//! Every connection returned here has foreign key enforcement turned on.
//! SQLite leaves it off by default and the setting is per connection, so
//! nothing else in the crate opens connections directly.
//!
//! Columns are read by name (`row.get("title")`), which rusqlite supports
//! on every row without further setup.

use super::schema::apply_schema;
use crate::config::StorageConfig;
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::PathBuf;

/// Where a store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// Private, ephemeral database that disappears with its connection
    InMemory,
    /// Database file on disk
    File(PathBuf),
}

impl StorageLocation {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StorageLocation::File(path.into())
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLocation::InMemory => write!(f, ":memory:"),
            StorageLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl std::str::FromStr for StorageLocation {
    type Err = Error;

    /// Accepts `:memory:`, `sqlite::memory:`, `sqlite:///relative/path`,
    /// `sqlite:////absolute/path`, `sqlite://path`, or a bare path.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Config("storage location is empty".to_string()));
        }

        if matches!(s, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
            return Ok(StorageLocation::InMemory);
        }

        let path = s
            .strip_prefix("sqlite:///")
            .or_else(|| s.strip_prefix("sqlite://"))
            .unwrap_or(s);

        if path.is_empty() {
            return Err(Error::Config(format!("no path in storage URL {:?}", s)));
        }

        Ok(StorageLocation::File(PathBuf::from(path)))
    }
}

/// Open a connection with foreign key enforcement enabled.
///
/// Fails with [`Error::Open`] if the location cannot be opened or is not a
/// SQLite database. There is no retry.
pub fn connect(location: &StorageLocation) -> Result<Connection> {
    let open_err = |source: rusqlite::Error| Error::Open {
        location: location.to_string(),
        source: source.into(),
    };

    let conn = match location {
        StorageLocation::InMemory => Connection::open_in_memory().map_err(open_err)?,
        StorageLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| Error::Open {
                    location: location.to_string(),
                    source: source.into(),
                })?;
            }
            let conn = Connection::open(path).map_err(open_err)?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                ",
            )
            .map_err(open_err)?;
            conn
        }
    };

    conn.execute_batch("PRAGMA foreign_keys = ON")
        .map_err(open_err)?;

    // SQLite opens lazily; touch the schema so unreadable files fail here
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |r| {
        r.get::<_, i64>(0)
    })
    .map_err(open_err)?;

    tracing::debug!(location = %location, "Opened storage connection");
    Ok(conn)
}

/// Connect and make sure the current schema exists
pub fn initialize(location: &StorageLocation) -> Result<Connection> {
    let conn = connect(location)?;
    apply_schema(&conn)?;
    tracing::info!(location = %location, "Storage initialized");
    Ok(conn)
}

/// [`initialize`] at the location named by the storage configuration
pub fn initialize_from_config(config: &StorageConfig) -> Result<Connection> {
    initialize(&config.location()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{get_schema_version, SCHEMA_VERSION};

    #[test]
    fn test_parse_locations() {
        assert_eq!(
            ":memory:".parse::<StorageLocation>().unwrap(),
            StorageLocation::InMemory
        );
        assert_eq!(
            "sqlite::memory:".parse::<StorageLocation>().unwrap(),
            StorageLocation::InMemory
        );
        assert_eq!(
            "sqlite:///./data/branch.db".parse::<StorageLocation>().unwrap(),
            StorageLocation::file("./data/branch.db")
        );
        assert_eq!(
            "sqlite:////var/lib/branch.db"
                .parse::<StorageLocation>()
                .unwrap(),
            StorageLocation::file("/var/lib/branch.db")
        );
        assert_eq!(
            "/tmp/branch.db".parse::<StorageLocation>().unwrap(),
            StorageLocation::file("/tmp/branch.db")
        );
        assert!("".parse::<StorageLocation>().is_err());
        assert!("sqlite:///".parse::<StorageLocation>().is_err());
    }

    #[test]
    fn test_connect_enables_foreign_keys() {
        let conn = connect(&StorageLocation::InMemory).unwrap();
        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_initialize_applies_schema() {
        let conn = initialize(&StorageLocation::InMemory).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let title: String = conn
            .query_row(
                "INSERT INTO documents (id, title) VALUES ('d1', 'Paper') RETURNING title",
                [],
                |row| row.get("title"),
            )
            .unwrap();
        assert_eq!(title, "Paper");
    }

    #[test]
    fn test_initialize_file_creates_parent_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("branch.db");

        let conn = initialize(&StorageLocation::file(&path)).unwrap();
        drop(conn);
        assert!(path.exists());

        // Re-opening an initialized store is fine
        let conn = initialize(&StorageLocation::file(&path)).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_connect_rejects_corrupt_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corrupt.db");
        std::fs::write(&path, vec![0x42u8; 4096]).unwrap();

        let err = connect(&StorageLocation::file(&path)).unwrap_err();
        assert!(matches!(err, Error::Open { .. }), "got {:?}", err);
    }

    #[test]
    fn test_connect_rejects_directory() {
        let dir = tempfile::TempDir::new().unwrap();

        let err = connect(&StorageLocation::file(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Open { .. }), "got {:?}", err);
    }

    #[test]
    fn test_connect_rejects_unwritable_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("plain-file");
        std::fs::write(&blocker, "").unwrap();

        let location = StorageLocation::file(blocker.join("sub").join("branch.db"));
        let err = connect(&location).unwrap_err();
        assert!(matches!(err, Error::Open { .. }), "got {:?}", err);
        assert!(!blocker.join("sub").exists());
    }
}
