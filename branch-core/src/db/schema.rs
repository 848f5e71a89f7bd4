//! Database schema
//!
//! Uses SQLite with the schema version tracked via PRAGMA user_version.
//! Every statement is `IF NOT EXISTS`, so applying the schema to a store
//! that already has it changes nothing.

use crate::error::{Error, Result};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Table DDL, parents before children
pub const CREATE_TABLE_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id               TEXT PRIMARY KEY,
        title            TEXT NOT NULL,
        file_path        TEXT,
        url              TEXT,
        document_type    TEXT NOT NULL DEFAULT 'pdf'
            CHECK (document_type IN ('pdf', 'text', 'markdown', 'html')),
        page_count       INTEGER CHECK (page_count IS NULL OR page_count >= 0),
        author           TEXT,
        added_at         TEXT NOT NULL DEFAULT (CURRENT_TIMESTAMP),
        last_opened_at   TEXT,
        last_page        INTEGER NOT NULL DEFAULT 1 CHECK (last_page >= 1),
        read_percentage  REAL NOT NULL DEFAULT 0.0
            CHECK (read_percentage >= 0.0 AND read_percentage <= 100.0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id                 TEXT PRIMARY KEY,
        document_id        TEXT NOT NULL
            REFERENCES documents(id) ON DELETE CASCADE ON UPDATE CASCADE,
        started_at         TEXT NOT NULL DEFAULT (CURRENT_TIMESTAMP),
        ended_at           TEXT,
        start_page         INTEGER NOT NULL DEFAULT 1 CHECK (start_page >= 1),
        end_page           INTEGER CHECK (end_page IS NULL OR end_page >= 1),
        fragments_captured INTEGER NOT NULL DEFAULT 0 CHECK (fragments_captured >= 0),
        dive_deeps         INTEGER NOT NULL DEFAULT 0 CHECK (dive_deeps >= 0),
        notes              TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS idea_fragments (
        id                    TEXT PRIMARY KEY,
        content               TEXT NOT NULL,

        -- TextAnchor, flattened
        anchor_page_number    INTEGER,
        anchor_start_position INTEGER,
        anchor_end_position   INTEGER,
        anchor_selected_text  TEXT,

        -- Parents are optional: removing one clears the reference
        document_id           TEXT
            REFERENCES documents(id) ON DELETE SET NULL ON UPDATE CASCADE,
        session_id            TEXT
            REFERENCES sessions(id) ON DELETE SET NULL ON UPDATE CASCADE,

        captured_at           TEXT NOT NULL DEFAULT (CURRENT_TIMESTAMP),
        updated_at            TEXT,
        status                TEXT NOT NULL DEFAULT 'captured'
            CHECK (status IN ('captured', 'reviewed', 'developed', 'archived', 'discarded')),
        capture_type          TEXT NOT NULL DEFAULT 'text',
        resolution_note       TEXT
    )
    "#,
];

/// Secondary index DDL
pub const CREATE_INDEX_STATEMENTS: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_sessions_document_id ON sessions(document_id)",
    "CREATE INDEX IF NOT EXISTS idx_fragments_document_id ON idea_fragments(document_id)",
    "CREATE INDEX IF NOT EXISTS idx_fragments_session_id ON idea_fragments(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_fragments_status ON idea_fragments(status)",
];

/// Static view of the schema, for debugging and documentation tooling
#[derive(Debug, Clone, Copy)]
pub struct SchemaObjects {
    pub tables: &'static [&'static str],
    pub indexes: &'static [&'static str],
    pub version: i32,
}

/// Returns the DDL for every table and index plus the schema version
pub fn current_schema_objects() -> SchemaObjects {
    SchemaObjects {
        tables: CREATE_TABLE_STATEMENTS,
        indexes: CREATE_INDEX_STATEMENTS,
        version: SCHEMA_VERSION,
    }
}

/// Create all tables and indexes for the current schema version.
///
/// Also turns on foreign key enforcement for `conn` and records
/// `SCHEMA_VERSION` in `user_version`. Safe to run any number of times.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Applying database schema"
    );

    if current_version > SCHEMA_VERSION {
        return Err(Error::Schema(format!(
            "store is at schema version {}, newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    conn.execute_batch("PRAGMA foreign_keys = ON")?;

    let tx = conn.unchecked_transaction()?;
    for statement in CREATE_TABLE_STATEMENTS
        .iter()
        .chain(CREATE_INDEX_STATEMENTS.iter())
    {
        tx.execute_batch(statement)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Schema applied"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
