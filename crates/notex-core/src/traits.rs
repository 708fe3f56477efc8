//! Core traits for notex abstractions.
//!
//! The persistence collaborator is a trait so the server can run against
//! PostgreSQL in production and an in-process store in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewNote, Note, NoteChanges};

/// Repository for note CRUD operations.
///
/// Operations that target a missing id return [`crate::Error::NoteNotFound`]
/// and must leave storage untouched.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note, assigning id and both timestamps.
    async fn insert(&self, note: NewNote) -> Result<Note>;

    /// All notes, most recently updated first.
    async fn list(&self) -> Result<Vec<Note>>;

    /// Fetch a single note.
    async fn fetch(&self, id: i64) -> Result<Note>;

    /// Merge `changes` into the stored note and refresh `updated_at`.
    async fn update(&self, id: i64, changes: NoteChanges) -> Result<Note>;

    /// Delete a note.
    async fn delete(&self, id: i64) -> Result<()>;
}
