//! Database repository layer
//!
//! [`Repository`] is the storage contract every backend satisfies.
//! [`Database`] implements it on SQLite.

use super::connection::{connect, StorageLocation};
use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Read/write operations over documents, sessions and idea fragments.
///
/// Lookups return `Ok(None)` when nothing matches; absence is never an
/// error. Check, primary key and foreign key violations come back as an
/// error for which [`Error::is_constraint_violation`] is true. List
/// operations make no ordering promise.
pub trait Repository {
    /// Insert a document, or replace every field of the stored row
    fn upsert_document(&self, document: &Document) -> Result<()>;

    fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    /// Delete a document. Its sessions go with it; fragments that referred
    /// to it (directly or through a deleted session) keep their content and
    /// lose the reference. Returns false if there was no such document.
    fn delete_document(&self, id: Uuid) -> Result<bool>;

    /// Insert or replace a session. The document must exist.
    fn upsert_session(&self, session: &ReadingSession) -> Result<()>;

    fn get_session(&self, id: Uuid) -> Result<Option<ReadingSession>>;

    /// Delete a session, clearing `session_id` on its fragments
    fn delete_session(&self, id: Uuid) -> Result<bool>;

    fn list_sessions_for_document(&self, document_id: Uuid) -> Result<Vec<ReadingSession>>;

    /// Insert or replace a fragment. Any document or session it names must exist.
    fn upsert_fragment(&self, fragment: &IdeaFragment) -> Result<()>;

    fn get_fragment(&self, id: Uuid) -> Result<Option<IdeaFragment>>;

    /// Every fragment that references the document, in no particular order.
    ///
    /// Returned as a finished `Vec` rather than a lazy cursor, so no lock or
    /// statement is held while the caller iterates and the result can be
    /// walked any number of times. The other `list_*` methods do the same.
    fn list_fragments_for_document(&self, document_id: Uuid) -> Result<Vec<IdeaFragment>>;

    fn list_fragments_for_session(&self, session_id: Uuid) -> Result<Vec<IdeaFragment>>;

    fn list_fragments_by_status(&self, status: FragmentStatus) -> Result<Vec<IdeaFragment>>;
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given location
    pub fn open(location: &StorageLocation) -> Result<Self> {
        Ok(Self::from_connection(connect(location)?))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StorageLocation::InMemory)
    }

    /// Open the configured location and apply the schema
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let db = Self::open(&config.location()?)?;
        db.migrate()?;
        Ok(db)
    }

    /// Wrap a connection that already has foreign keys enabled
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Apply the current schema to this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection();
        super::schema::apply_schema(&conn)
    }

    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.connection();
        super::schema::get_schema_version(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        // Statements leave no partial state behind, so a poisoned lock is safe to reuse
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
        let document_type: String = row.get("document_type")?;
        let file_path: Option<String> = row.get("file_path")?;

        Ok(Document {
            id: get_uuid(row, "id")?,
            title: row.get("title")?,
            file_path: file_path.map(PathBuf::from),
            url: row.get("url")?,
            document_type: parse_column(row, "document_type", &document_type)?,
            page_count: row.get("page_count")?,
            author: row.get("author")?,
            added_at: get_timestamp(row, "added_at")?,
            last_opened_at: get_opt_timestamp(row, "last_opened_at")?,
            last_page: row.get("last_page")?,
            read_percentage: row.get("read_percentage")?,
        })
    }

    fn row_to_session(row: &Row) -> rusqlite::Result<ReadingSession> {
        Ok(ReadingSession {
            id: get_uuid(row, "id")?,
            document_id: get_uuid(row, "document_id")?,
            started_at: get_timestamp(row, "started_at")?,
            ended_at: get_opt_timestamp(row, "ended_at")?,
            start_page: row.get("start_page")?,
            end_page: row.get("end_page")?,
            fragments_captured: row.get("fragments_captured")?,
            dive_deeps: row.get("dive_deeps")?,
            notes: row.get("notes")?,
        })
    }

    fn row_to_fragment(row: &Row) -> rusqlite::Result<IdeaFragment> {
        let status: String = row.get("status")?;
        let anchor = TextAnchor {
            page_number: row.get("anchor_page_number")?,
            start_position: row.get("anchor_start_position")?,
            end_position: row.get("anchor_end_position")?,
            selected_text: row.get("anchor_selected_text")?,
        };

        Ok(IdeaFragment {
            id: get_uuid(row, "id")?,
            content: row.get("content")?,
            anchor: (!anchor.is_empty()).then_some(anchor),
            document_id: get_opt_uuid(row, "document_id")?,
            session_id: get_opt_uuid(row, "session_id")?,
            captured_at: get_timestamp(row, "captured_at")?,
            updated_at: get_opt_timestamp(row, "updated_at")?,
            status: parse_column(row, "status", &status)?,
            capture_type: row.get("capture_type")?,
            resolution_note: row.get("resolution_note")?,
        })
    }

    fn query_fragments(&self, sql: &str, key: &str) -> Result<Vec<IdeaFragment>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(sql)?;
        let fragments = stmt
            .query_map([key], Self::row_to_fragment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(fragments)
    }
}

impl Repository for Database {
    // ============================================
    // Document operations
    // ============================================

    fn upsert_document(&self, document: &Document) -> Result<()> {
        let conn = self.connection();
        // ON CONFLICT keeps the row in place; REPLACE would delete it and fire the cascades
        conn.execute(
            r#"
            INSERT INTO documents (id, title, file_path, url, document_type, page_count, author,
                                   added_at, last_opened_at, last_page, read_percentage)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                file_path = excluded.file_path,
                url = excluded.url,
                document_type = excluded.document_type,
                page_count = excluded.page_count,
                author = excluded.author,
                added_at = excluded.added_at,
                last_opened_at = excluded.last_opened_at,
                last_page = excluded.last_page,
                read_percentage = excluded.read_percentage
            "#,
            params![
                document.id.to_string(),
                document.title,
                document
                    .file_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                document.url,
                document.document_type.as_str(),
                document.page_count,
                document.author,
                document.added_at.to_rfc3339(),
                document.last_opened_at.map(|t| t.to_rfc3339()),
                document.last_page,
                document.read_percentage,
            ],
        )?;
        tracing::debug!(document_id = %document.id, "Upserted document");
        Ok(())
    }

    fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM documents WHERE id = ?",
            [id.to_string()],
            Self::row_to_document,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_document(&self, id: Uuid) -> Result<bool> {
        let conn = self.connection();
        let removed = conn.execute("DELETE FROM documents WHERE id = ?", [id.to_string()])?;
        tracing::info!(document_id = %id, removed, "Deleted document");
        Ok(removed > 0)
    }

    // ============================================
    // Session operations
    // ============================================

    fn upsert_session(&self, session: &ReadingSession) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO sessions (id, document_id, started_at, ended_at, start_page, end_page,
                                  fragments_captured, dive_deeps, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                document_id = excluded.document_id,
                started_at = excluded.started_at,
                ended_at = excluded.ended_at,
                start_page = excluded.start_page,
                end_page = excluded.end_page,
                fragments_captured = excluded.fragments_captured,
                dive_deeps = excluded.dive_deeps,
                notes = excluded.notes
            "#,
            params![
                session.id.to_string(),
                session.document_id.to_string(),
                session.started_at.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
                session.start_page,
                session.end_page,
                session.fragments_captured,
                session.dive_deeps,
                session.notes,
            ],
        )?;
        tracing::debug!(session_id = %session.id, document_id = %session.document_id, "Upserted session");
        Ok(())
    }

    fn get_session(&self, id: Uuid) -> Result<Option<ReadingSession>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM sessions WHERE id = ?",
            [id.to_string()],
            Self::row_to_session,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: Uuid) -> Result<bool> {
        let conn = self.connection();
        let removed = conn.execute("DELETE FROM sessions WHERE id = ?", [id.to_string()])?;
        tracing::info!(session_id = %id, removed, "Deleted session");
        Ok(removed > 0)
    }

    fn list_sessions_for_document(&self, document_id: Uuid) -> Result<Vec<ReadingSession>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT * FROM sessions WHERE document_id = ?")?;
        let sessions = stmt
            .query_map([document_id.to_string()], Self::row_to_session)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    // ============================================
    // IdeaFragment operations
    // ============================================

    fn upsert_fragment(&self, fragment: &IdeaFragment) -> Result<()> {
        let conn = self.connection();
        let anchor = fragment.anchor.clone().unwrap_or_default();
        conn.execute(
            r#"
            INSERT INTO idea_fragments (id, content, anchor_page_number, anchor_start_position,
                                        anchor_end_position, anchor_selected_text, document_id,
                                        session_id, captured_at, updated_at, status,
                                        capture_type, resolution_note)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                anchor_page_number = excluded.anchor_page_number,
                anchor_start_position = excluded.anchor_start_position,
                anchor_end_position = excluded.anchor_end_position,
                anchor_selected_text = excluded.anchor_selected_text,
                document_id = excluded.document_id,
                session_id = excluded.session_id,
                captured_at = excluded.captured_at,
                updated_at = excluded.updated_at,
                status = excluded.status,
                capture_type = excluded.capture_type,
                resolution_note = excluded.resolution_note
            "#,
            params![
                fragment.id.to_string(),
                fragment.content,
                anchor.page_number,
                anchor.start_position,
                anchor.end_position,
                anchor.selected_text,
                fragment.document_id.map(|id| id.to_string()),
                fragment.session_id.map(|id| id.to_string()),
                fragment.captured_at.to_rfc3339(),
                fragment.updated_at.map(|t| t.to_rfc3339()),
                fragment.status.as_str(),
                fragment.capture_type,
                fragment.resolution_note,
            ],
        )?;
        tracing::debug!(fragment_id = %fragment.id, status = %fragment.status, "Upserted fragment");
        Ok(())
    }

    fn get_fragment(&self, id: Uuid) -> Result<Option<IdeaFragment>> {
        let conn = self.connection();
        conn.query_row(
            "SELECT * FROM idea_fragments WHERE id = ?",
            [id.to_string()],
            Self::row_to_fragment,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_fragments_for_document(&self, document_id: Uuid) -> Result<Vec<IdeaFragment>> {
        self.query_fragments(
            "SELECT * FROM idea_fragments WHERE document_id = ?",
            &document_id.to_string(),
        )
    }

    fn list_fragments_for_session(&self, session_id: Uuid) -> Result<Vec<IdeaFragment>> {
        self.query_fragments(
            "SELECT * FROM idea_fragments WHERE session_id = ?",
            &session_id.to_string(),
        )
    }

    fn list_fragments_by_status(&self, status: FragmentStatus) -> Result<Vec<IdeaFragment>> {
        self.query_fragments(
            "SELECT * FROM idea_fragments WHERE status = ?",
            status.as_str(),
        )
    }
}

// ============================================
// Column decoding
// ============================================

fn conversion_failure<E>(row: &Row, column: &str, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}

fn parse_column<T>(row: &Row, column: &str, value: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e: String| conversion_failure(row, column, e))
}

fn parse_uuid(row: &Row, column: &str, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| conversion_failure(row, column, e))
}

fn get_uuid(row: &Row, column: &str) -> rusqlite::Result<Uuid> {
    let value: String = row.get(column)?;
    parse_uuid(row, column, &value)
}

fn get_opt_uuid(row: &Row, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let value: Option<String> = row.get(column)?;
    value.map(|v| parse_uuid(row, column, &v)).transpose()
}

/// Accepts RFC 3339 (what we write) and SQLite's `CURRENT_TIMESTAMP` format
/// (what the column defaults produce).
fn parse_timestamp(row: &Row, column: &str, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .map_err(|e| conversion_failure(row, column, e))
}

fn get_timestamp(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(column)?;
    parse_timestamp(row, column, &value)
}

fn get_opt_timestamp(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let value: Option<String> = row.get(column)?;
    value.map(|v| parse_timestamp(row, column, &v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn create_test_document() -> Document {
        let mut doc = Document::new("Research Paper").with_page_count(100);
        doc.file_path = Some(PathBuf::from("/papers/research.pdf"));
        doc.url = Some("https://example.org/research.pdf".to_string());
        doc.author = Some("A. Reader".to_string());
        doc.update_progress(33);
        doc
    }

    #[test]
    fn test_document_round_trip() {
        let db = test_db();
        let doc = create_test_document();

        db.upsert_document(&doc).unwrap();
        let retrieved = db.get_document(doc.id).unwrap().unwrap();
        assert_eq!(retrieved, doc);

        let minimal = Document::new("Untitled");
        db.upsert_document(&minimal).unwrap();
        assert_eq!(db.get_document(minimal.id).unwrap().unwrap(), minimal);
    }

    #[test]
    fn test_upsert_document_replaces_all_fields() {
        let db = test_db();
        let mut doc = create_test_document();
        db.upsert_document(&doc).unwrap();

        doc.title = "Renamed".to_string();
        doc.author = None;
        doc.document_type = DocumentType::Markdown;
        doc.update_progress(50);
        db.upsert_document(&doc).unwrap();

        let retrieved = db.get_document(doc.id).unwrap().unwrap();
        assert_eq!(retrieved, doc);
        assert_eq!(retrieved.author, None);
        assert_eq!(retrieved.read_percentage, 50.0);
    }

    #[test]
    fn test_upsert_document_keeps_children() {
        let db = test_db();
        let mut doc = create_test_document();
        db.upsert_document(&doc).unwrap();
        let session = ReadingSession::new(doc.id);
        db.upsert_session(&session).unwrap();

        doc.update_progress(60);
        db.upsert_document(&doc).unwrap();

        assert!(db.get_session(session.id).unwrap().is_some());
    }

    #[test]
    fn test_missing_rows_are_none() {
        let db = test_db();
        assert!(db.get_document(Uuid::new_v4()).unwrap().is_none());
        assert!(db.get_session(Uuid::new_v4()).unwrap().is_none());
        assert!(db.get_fragment(Uuid::new_v4()).unwrap().is_none());
        assert!(!db.delete_document(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_percentage_over_100_rejected() {
        let db = test_db();
        let mut doc = Document::new("Short").with_page_count(10);
        doc.update_progress(11);

        let err = db.upsert_document(&doc).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(db.get_document(doc.id).unwrap().is_none());
    }

    #[test]
    fn test_session_requires_document() {
        let db = test_db();
        let session = ReadingSession::new(Uuid::new_v4());

        let err = db.upsert_session(&session).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(db.get_session(session.id).unwrap().is_none());
    }

    #[test]
    fn test_fragment_with_dangling_reference_rejected() {
        let db = test_db();
        let fragment = IdeaFragment::new("orphan").with_session(Uuid::new_v4());

        let err = db.upsert_fragment(&fragment).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(db.get_fragment(fragment.id).unwrap().is_none());
    }

    #[test]
    fn test_fragment_round_trip_with_anchor() {
        let db = test_db();
        let doc = create_test_document();
        db.upsert_document(&doc).unwrap();

        let mut fragment = IdeaFragment::new("This contradicts chapter 2")
            .with_document(doc.id)
            .with_capture_type("voice")
            .with_anchor(TextAnchor {
                page_number: Some(12),
                start_position: None,
                end_position: Some(240),
                selected_text: Some("the key claim".to_string()),
            });
        fragment.resolve_lightly("Check the appendix");
        fragment.develop();

        db.upsert_fragment(&fragment).unwrap();
        assert_eq!(db.get_fragment(fragment.id).unwrap().unwrap(), fragment);
    }

    #[test]
    fn test_empty_anchor_reads_back_as_none() {
        let db = test_db();
        let fragment = IdeaFragment::new("loose thought").with_anchor(TextAnchor::default());
        db.upsert_fragment(&fragment).unwrap();

        let retrieved = db.get_fragment(fragment.id).unwrap().unwrap();
        assert!(retrieved.anchor.is_none());
    }

    #[test]
    fn test_list_fragments() {
        let db = test_db();
        let doc = create_test_document();
        let other = Document::new("Other");
        db.upsert_document(&doc).unwrap();
        db.upsert_document(&other).unwrap();
        let session = ReadingSession::new(doc.id);
        db.upsert_session(&session).unwrap();

        let a = IdeaFragment::new("a").with_document(doc.id).with_session(session.id);
        let mut b = IdeaFragment::new("b").with_document(doc.id);
        b.archive();
        let c = IdeaFragment::new("c").with_document(other.id);
        for fragment in [&a, &b, &c] {
            db.upsert_fragment(fragment).unwrap();
        }

        let mut ids: Vec<Uuid> = db
            .list_fragments_for_document(doc.id)
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        ids.sort();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(ids, expected);

        let in_session = db.list_fragments_for_session(session.id).unwrap();
        assert_eq!(in_session.len(), 1);
        assert_eq!(in_session[0].id, a.id);

        let archived = db.list_fragments_by_status(FragmentStatus::Archived).unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, b.id);

        assert!(db.list_fragments_for_document(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_delete_document_cascades() {
        let db = test_db();
        let doc = create_test_document();
        db.upsert_document(&doc).unwrap();
        let session = ReadingSession::new(doc.id);
        db.upsert_session(&session).unwrap();
        let mut fragment = IdeaFragment::new("insight")
            .with_document(doc.id)
            .with_session(session.id);
        fragment.mark_reviewed();
        db.upsert_fragment(&fragment).unwrap();

        assert!(db.delete_document(doc.id).unwrap());

        assert!(db.get_document(doc.id).unwrap().is_none());
        assert!(db.get_session(session.id).unwrap().is_none());
        assert!(db.list_sessions_for_document(doc.id).unwrap().is_empty());

        let kept = db.get_fragment(fragment.id).unwrap().unwrap();
        assert_eq!(kept.document_id, None);
        assert_eq!(kept.session_id, None);
        assert_eq!(kept.content, "insight");
        assert_eq!(kept.status, FragmentStatus::Reviewed);
    }

    #[test]
    fn test_delete_session_clears_fragment_reference() {
        let db = test_db();
        let doc = create_test_document();
        db.upsert_document(&doc).unwrap();
        let session = ReadingSession::new(doc.id);
        db.upsert_session(&session).unwrap();
        let fragment = IdeaFragment::new("insight")
            .with_document(doc.id)
            .with_session(session.id);
        db.upsert_fragment(&fragment).unwrap();

        assert!(db.delete_session(session.id).unwrap());
        assert!(!db.delete_session(session.id).unwrap());

        let kept = db.get_fragment(fragment.id).unwrap().unwrap();
        assert_eq!(kept.document_id, Some(doc.id));
        assert_eq!(kept.session_id, None);
    }

    #[test]
    fn test_document_id_change_cascades_on_update() {
        let db = test_db();
        let doc = create_test_document();
        db.upsert_document(&doc).unwrap();
        let session = ReadingSession::new(doc.id);
        db.upsert_session(&session).unwrap();
        let fragment = IdeaFragment::new("insight").with_document(doc.id);
        db.upsert_fragment(&fragment).unwrap();

        let new_id = Uuid::new_v4();
        db.connection()
            .execute(
                "UPDATE documents SET id = ?1 WHERE id = ?2",
                [new_id.to_string(), doc.id.to_string()],
            )
            .unwrap();

        assert_eq!(
            db.get_session(session.id).unwrap().unwrap().document_id,
            new_id
        );
        assert_eq!(
            db.get_fragment(fragment.id).unwrap().unwrap().document_id,
            Some(new_id)
        );
    }

    #[test]
    fn test_rows_written_with_defaults_decode() {
        let db = test_db();
        let id = Uuid::new_v4();
        db.connection()
            .execute(
                "INSERT INTO documents (id, title) VALUES (?1, 'Raw insert')",
                [id.to_string()],
            )
            .unwrap();

        let doc = db.get_document(id).unwrap().unwrap();
        assert_eq!(doc.title, "Raw insert");
        assert_eq!(doc.document_type, DocumentType::Pdf);
        assert_eq!(doc.last_page, 1);
        assert_eq!(doc.read_percentage, 0.0);
    }

    #[test]
    fn test_malformed_id_is_an_error() {
        let db = test_db();
        let doc = create_test_document();
        db.upsert_document(&doc).unwrap();
        db.connection()
            .execute(
                "INSERT INTO idea_fragments (id, content, document_id) VALUES ('not-a-uuid', 'x', ?1)",
                [doc.id.to_string()],
            )
            .unwrap();

        let err = db.list_fragments_for_document(doc.id).unwrap_err();
        assert!(matches!(
            err,
            Error::Database(rusqlite::Error::FromSqlConversionFailure(..))
        ));
        assert!(!err.is_constraint_violation());
    }
}
