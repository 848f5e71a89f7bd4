//! In-memory repository backend
//!
//! Holds everything in hash maps and enforces the same rules the SQLite
//! schema does: check constraints, foreign keys, cascade delete of sessions
//! and set-null of fragment references. Useful for tests and for callers
//! that want a scratch store with no file behind it.

use super::repo::Repository;
use crate::error::{Error, Result};
use crate::types::{Document, FragmentStatus, IdeaFragment, ReadingSession};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    documents: HashMap<Uuid, Document>,
    sessions: HashMap<Uuid, ReadingSession>,
    fragments: HashMap<Uuid, IdeaFragment>,
}

/// [`Repository`] backed by process memory
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn filter_fragments<F>(&self, predicate: F) -> Vec<IdeaFragment>
    where
        F: Fn(&IdeaFragment) -> bool,
    {
        self.state()
            .fragments
            .values()
            .filter(|f| predicate(f))
            .cloned()
            .collect()
    }
}

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Constraint(message()))
    }
}

fn check_document(document: &Document) -> Result<()> {
    check(document.last_page >= 1, || {
        format!("documents.last_page must be >= 1, got {}", document.last_page)
    })?;
    check((0.0..=100.0).contains(&document.read_percentage), || {
        format!(
            "documents.read_percentage must be within 0..=100, got {}",
            document.read_percentage
        )
    })
}

fn check_session(state: &State, session: &ReadingSession) -> Result<()> {
    check(state.documents.contains_key(&session.document_id), || {
        format!(
            "sessions.document_id references missing document {}",
            session.document_id
        )
    })?;
    check(session.start_page >= 1, || {
        format!("sessions.start_page must be >= 1, got {}", session.start_page)
    })?;
    check(session.end_page.map_or(true, |p| p >= 1), || {
        "sessions.end_page must be >= 1".to_string()
    })
}

fn check_fragment(state: &State, fragment: &IdeaFragment) -> Result<()> {
    if let Some(document_id) = fragment.document_id {
        check(state.documents.contains_key(&document_id), || {
            format!("idea_fragments.document_id references missing document {}", document_id)
        })?;
    }
    if let Some(session_id) = fragment.session_id {
        check(state.sessions.contains_key(&session_id), || {
            format!("idea_fragments.session_id references missing session {}", session_id)
        })?;
    }
    Ok(())
}

impl Repository for MemoryRepository {
    fn upsert_document(&self, document: &Document) -> Result<()> {
        check_document(document)?;
        self.state()
            .documents
            .insert(document.id, document.clone());
        tracing::debug!(document_id = %document.id, "Upserted document");
        Ok(())
    }

    fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.state().documents.get(&id).cloned())
    }

    fn delete_document(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state();
        if state.documents.remove(&id).is_none() {
            return Ok(false);
        }

        let mut removed_sessions = HashSet::new();
        state.sessions.retain(|session_id, session| {
            let keep = session.document_id != id;
            if !keep {
                removed_sessions.insert(*session_id);
            }
            keep
        });

        for fragment in state.fragments.values_mut() {
            if fragment.document_id == Some(id) {
                fragment.document_id = None;
            }
            if fragment
                .session_id
                .is_some_and(|s| removed_sessions.contains(&s))
            {
                fragment.session_id = None;
            }
        }

        tracing::info!(
            document_id = %id,
            sessions_removed = removed_sessions.len(),
            "Deleted document"
        );
        Ok(true)
    }

    fn upsert_session(&self, session: &ReadingSession) -> Result<()> {
        let mut state = self.state();
        check_session(&state, session)?;
        state.sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, document_id = %session.document_id, "Upserted session");
        Ok(())
    }

    fn get_session(&self, id: Uuid) -> Result<Option<ReadingSession>> {
        Ok(self.state().sessions.get(&id).cloned())
    }

    fn delete_session(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state();
        if state.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        for fragment in state.fragments.values_mut() {
            if fragment.session_id == Some(id) {
                fragment.session_id = None;
            }
        }
        tracing::info!(session_id = %id, "Deleted session");
        Ok(true)
    }

    fn list_sessions_for_document(&self, document_id: Uuid) -> Result<Vec<ReadingSession>> {
        Ok(self
            .state()
            .sessions
            .values()
            .filter(|s| s.document_id == document_id)
            .cloned()
            .collect())
    }

    fn upsert_fragment(&self, fragment: &IdeaFragment) -> Result<()> {
        let mut state = self.state();
        check_fragment(&state, fragment)?;
        let mut stored = fragment.clone();
        stored.anchor = stored.anchor.filter(|a| !a.is_empty());
        state.fragments.insert(fragment.id, stored);
        tracing::debug!(fragment_id = %fragment.id, status = %fragment.status, "Upserted fragment");
        Ok(())
    }

    fn get_fragment(&self, id: Uuid) -> Result<Option<IdeaFragment>> {
        Ok(self.state().fragments.get(&id).cloned())
    }

    fn list_fragments_for_document(&self, document_id: Uuid) -> Result<Vec<IdeaFragment>> {
        Ok(self.filter_fragments(|f| f.document_id == Some(document_id)))
    }

    fn list_fragments_for_session(&self, session_id: Uuid) -> Result<Vec<IdeaFragment>> {
        Ok(self.filter_fragments(|f| f.session_id == Some(session_id)))
    }

    fn list_fragments_by_status(&self, status: FragmentStatus) -> Result<Vec<IdeaFragment>> {
        Ok(self.filter_fragments(|f| f.status == status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_values() {
        let repo = MemoryRepository::new();

        let mut doc = Document::new("Short").with_page_count(4);
        doc.update_progress(5);
        assert!(repo.upsert_document(&doc).unwrap_err().is_constraint_violation());

        let mut doc = Document::new("Paper");
        doc.last_page = 0;
        assert!(repo.upsert_document(&doc).unwrap_err().is_constraint_violation());

        let doc = Document::new("Paper");
        repo.upsert_document(&doc).unwrap();
        let mut session = ReadingSession::new(doc.id);
        session.end_page = Some(0);
        assert!(repo.upsert_session(&session).unwrap_err().is_constraint_violation());
        assert!(repo.get_session(session.id).unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces() {
        let repo = MemoryRepository::new();
        let mut doc = Document::new("Draft");
        repo.upsert_document(&doc).unwrap();

        doc.title = "Final".to_string();
        repo.upsert_document(&doc).unwrap();
        assert_eq!(repo.get_document(doc.id).unwrap().unwrap().title, "Final");
    }
}
