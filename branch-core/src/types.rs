//! Core domain types for Branch
//!
//! These types are the unit of exchange between callers and any
//! [`Repository`](crate::db::Repository) backend. They hold data plus a few
//! in-memory lifecycle mutators; none of them touch storage.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Document** | A readable work (PDF, text, markdown, HTML) |
//! | **ReadingSession** | A bounded period of reading activity against one Document |
//! | **IdeaFragment** | A short, possibly incomplete thought captured mid-reading |
//! | **TextAnchor** | Optional locator tying a fragment to a position in a document |
//!
//! Documents and sessions are parents: deleting a document removes its
//! sessions, while fragments only lose their references. A captured idea is
//! never deleted as a side effect of removing something else.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================
// Documents
// ============================================

/// Supported document formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Pdf,
    Text,
    Markdown,
    Html,
}

impl DocumentType {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Text => "text",
            DocumentType::Markdown => "markdown",
            DocumentType::Html => "html",
        }
    }

    /// Infer the type from a file extension. Unknown extensions read as text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => DocumentType::Pdf,
            "md" => DocumentType::Markdown,
            "html" | "htm" => DocumentType::Html,
            _ => DocumentType::Text,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(DocumentType::Pdf),
            "text" => Ok(DocumentType::Text),
            "markdown" => Ok(DocumentType::Markdown),
            "html" => Ok(DocumentType::Html),
            _ => Err(format!("unknown document type: {}", s)),
        }
    }
}

/// A document that can be read in Branch.
///
/// Documents are the context for reading sessions and the anchors for
/// idea fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, generated at creation
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Local file, if the document lives on disk
    pub file_path: Option<PathBuf>,
    /// Remote location, if any
    pub url: Option<String>,
    pub document_type: DocumentType,
    /// Total pages, when known
    pub page_count: Option<u32>,
    pub author: Option<String>,
    /// When the document was added to the library
    pub added_at: DateTime<Utc>,
    /// Last time progress was recorded
    pub last_opened_at: Option<DateTime<Utc>>,
    /// Current page (1-based)
    pub last_page: u32,
    /// Percentage read, derived from `last_page / page_count`
    pub read_percentage: f64,
}

impl Document {
    /// Create a new document with defaults for every optional field
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            file_path: None,
            url: None,
            document_type: DocumentType::default(),
            page_count: None,
            author: None,
            added_at: Utc::now(),
            last_opened_at: None,
            last_page: 1,
            read_percentage: 0.0,
        }
    }

    /// Create a document for a local file, titled after the file stem
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let document_type = path
            .extension()
            .map(|ext| DocumentType::from_extension(&ext.to_string_lossy()))
            .unwrap_or(DocumentType::Text);

        Self {
            file_path: Some(path.to_path_buf()),
            document_type,
            ..Self::new(title)
        }
    }

    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = Some(page_count);
        self
    }

    /// Record the page the reader is on.
    ///
    /// The percentage is recomputed only when the page count is known and
    /// non-zero. It is not clamped: a page past the end yields more than 100%.
    pub fn update_progress(&mut self, current_page: u32) {
        self.last_page = current_page;
        self.last_opened_at = Some(Utc::now());
        if let Some(count) = self.page_count.filter(|&c| c > 0) {
            self.read_percentage = 100.0 * f64::from(current_page) / f64::from(count);
        }
    }
}

// ============================================
// Reading Sessions
// ============================================

/// A reading session groups the fragments captured during one sitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub id: Uuid,
    /// FK to documents table
    pub document_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// None while the session is active
    pub ended_at: Option<DateTime<Utc>>,
    pub start_page: u32,
    pub end_page: Option<u32>,
    /// Number of fragments captured during this session
    pub fragments_captured: u32,
    /// How many times "Dive Deep" was used
    pub dive_deeps: u32,
    pub notes: Option<String>,
}

impl ReadingSession {
    /// Start a new session on a document, from page 1
    pub fn new(document_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            started_at: Utc::now(),
            ended_at: None,
            start_page: 1,
            end_page: None,
            fragments_captured: 0,
            dive_deeps: 0,
            notes: None,
        }
    }

    pub fn starting_at_page(mut self, page: u32) -> Self {
        self.start_page = page;
        self
    }

    /// End the session, optionally recording the page the reader stopped on
    /// Close the session. A missing or zero `end_page` keeps the current one.
    pub fn end(&mut self, end_page: Option<u32>) {
        self.ended_at = Some(Utc::now());
        if let Some(page) = end_page.filter(|&p| p > 0) {
            self.end_page = Some(page);
        }
    }

    pub fn record_capture(&mut self) {
        self.fragments_captured += 1;
    }

    pub fn record_dive_deep(&mut self) {
        self.dive_deeps += 1;
    }

    /// Elapsed time, or None while the session is still running
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    /// Elapsed time in fractional minutes
    pub fn duration_minutes(&self) -> Option<f64> {
        self.duration()
            .map(|d| d.num_milliseconds() as f64 / 60_000.0)
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ============================================
// Idea Fragments
// ============================================

/// Capture modality used when none is given
pub const DEFAULT_CAPTURE_TYPE: &str = "text";

/// Where a fragment sits in the Branch Buffer.
///
/// Transitions are not guarded: any status may be set from any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentStatus {
    /// Just captured, unprocessed
    #[default]
    Captured,
    /// Looked at during a review pass
    Reviewed,
    /// Expanded into fuller notes
    Developed,
    /// Kept but not active
    Archived,
    /// Marked for removal
    Discarded,
}

impl FragmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentStatus::Captured => "captured",
            FragmentStatus::Reviewed => "reviewed",
            FragmentStatus::Developed => "developed",
            FragmentStatus::Archived => "archived",
            FragmentStatus::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for FragmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FragmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "captured" => Ok(FragmentStatus::Captured),
            "reviewed" => Ok(FragmentStatus::Reviewed),
            "developed" => Ok(FragmentStatus::Developed),
            "archived" => Ok(FragmentStatus::Archived),
            "discarded" => Ok(FragmentStatus::Discarded),
            _ => Err(format!("unknown fragment status: {}", s)),
        }
    }
}

/// Anchor point within a document. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnchor {
    pub page_number: Option<u32>,
    /// Character offset where the selection starts
    pub start_position: Option<u32>,
    pub end_position: Option<u32>,
    /// The highlighted text
    pub selected_text: Option<String>,
}

impl TextAnchor {
    /// Anchor to a page with no selection
    pub fn page(page_number: u32) -> Self {
        Self {
            page_number: Some(page_number),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.page_number.is_none()
            && self.start_position.is_none()
            && self.end_position.is_none()
            && self.selected_text.is_none()
    }
}

/// A spontaneous idea captured during reading.
///
/// Fragments are captured quickly without forced organization. The
/// document and session references are optional and are cleared, never
/// cascaded, when the parent goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaFragment {
    pub id: Uuid,
    /// Free text; may be short or incomplete
    pub content: String,
    pub anchor: Option<TextAnchor>,
    /// FK to documents table (SET NULL on delete)
    pub document_id: Option<Uuid>,
    /// FK to sessions table (SET NULL on delete)
    pub session_id: Option<Uuid>,
    pub captured_at: DateTime<Utc>,
    /// Stamped by every lifecycle mutator
    pub updated_at: Option<DateTime<Utc>>,
    pub status: FragmentStatus,
    /// Capture modality: "text", "voice", "stylus", ...
    pub capture_type: String,
    /// Note left by "Resolve Lightly"
    pub resolution_note: Option<String>,
}

impl IdeaFragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            anchor: None,
            document_id: None,
            session_id: None,
            captured_at: Utc::now(),
            updated_at: None,
            status: FragmentStatus::default(),
            capture_type: DEFAULT_CAPTURE_TYPE.to_string(),
            resolution_note: None,
        }
    }

    pub fn with_anchor(mut self, anchor: TextAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_document(mut self, document_id: Uuid) -> Self {
        self.document_id = Some(document_id);
        self
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_capture_type(mut self, capture_type: impl Into<String>) -> Self {
        self.capture_type = capture_type.into();
        self
    }

    /// Attach a light resolution note without changing status
    pub fn resolve_lightly(&mut self, note: impl Into<String>) {
        self.resolution_note = Some(note.into());
        self.touch();
    }

    pub fn mark_reviewed(&mut self) {
        self.set_status(FragmentStatus::Reviewed);
    }

    pub fn develop(&mut self) {
        self.set_status(FragmentStatus::Developed);
    }

    pub fn archive(&mut self) {
        self.set_status(FragmentStatus::Archived);
    }

    pub fn discard(&mut self) {
        self.set_status(FragmentStatus::Discarded);
    }

    fn set_status(&mut self, status: FragmentStatus) {
        self.status = status;
        self.touch();
    }

    fn touch(&mut self) {
        // Never stamp earlier than capture, even if the clock stepped back.
        self.updated_at = Some(Utc::now().max(self.captured_at));
    }
}
