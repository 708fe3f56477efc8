//! In-process note repository.
//!
//! Behaves like [`crate::PgNoteRepository`] (sequential ids starting at 1,
//! server-side timestamps, newest-updated-first listing) without a database.
//! Used by `NOTEX_STORAGE=memory` and by the HTTP integration tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use notex_core::{Error, NewNote, Note, NoteChanges, NoteRepository, Result};

#[derive(Default)]
struct State {
    next_id: i64,
    notes: BTreeMap<i64, Note>,
}

/// Note repository backed by a map in process memory.
#[derive(Default)]
pub struct MemoryNoteRepository {
    state: RwLock<State>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn insert(&self, note: NewNote) -> Result<Note> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let now = Utc::now();
        let note = Note {
            id: state.next_id,
            name: note.name,
            description: note.description,
            bg_color: note.bg_color,
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn list(&self) -> Result<Vec<Note>> {
        let state = self.state.read().await;
        // Map iteration is id-ascending; reverse so ties fall back to id DESC.
        let mut notes: Vec<Note> = state.notes.values().rev().cloned().collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn fetch(&self, id: i64) -> Result<Note> {
        let state = self.state.read().await;
        state.notes.get(&id).cloned().ok_or(Error::NoteNotFound(id))
    }

    async fn update(&self, id: i64, changes: NoteChanges) -> Result<Note> {
        let mut state = self.state.write().await;
        let note = state.notes.get_mut(&id).ok_or(Error::NoteNotFound(id))?;
        changes.apply_to(note);
        note.updated_at = Some(Utc::now());
        Ok(note.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .notes
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NoteNotFound(id))
    }
}
