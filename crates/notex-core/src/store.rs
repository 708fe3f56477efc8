//! Client-side note list and change reconciliation.
//!
//! A client holds one ordered list of notes, populated by a bulk fetch and
//! then kept current from two sources: its own successful mutations (applied
//! optimistically) and the change events pushed by the server, which include
//! echoes of those same mutations. [`apply_change`] merges either source by
//! note id, so both paths converge on a single copy of every note.

use crate::events::ChangeEvent;
use crate::models::Note;

/// Sort notes by effective timestamp, newest first.
///
/// The sort is stable: notes with equal (or missing) timestamps keep their
/// relative order.
pub fn sort_by_latest(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.effective_timestamp().cmp(&a.effective_timestamp()));
}

/// Apply one change event to `current`, returning the new list.
///
/// - `created`: ignored if the id is already present, otherwise appended.
/// - `updated`: replaces the entry with the same id in place, or appends it
///   if unknown.
/// - `deleted`: removes the matching entry; survivors keep their order.
///
/// After `created` and `updated` the whole list is re-sorted with
/// [`sort_by_latest`].
pub fn apply_change(current: &[Note], event: &ChangeEvent) -> Vec<Note> {
    match event {
        ChangeEvent::Created { note, .. } => {
            let mut next = current.to_vec();
            if !next.iter().any(|n| n.id == note.id) {
                next.push(note.clone());
            }
            sort_by_latest(&mut next);
            next
        }
        ChangeEvent::Updated { note, .. } => {
            let mut next = current.to_vec();
            match next.iter_mut().find(|n| n.id == note.id) {
                Some(existing) => *existing = note.clone(),
                None => next.push(note.clone()),
            }
            sort_by_latest(&mut next);
            next
        }
        ChangeEvent::Deleted { note, .. } => {
            current.iter().filter(|n| n.id != note.id).cloned().collect()
        }
    }
}

/// In-memory note list owned by one client.
#[derive(Debug, Clone, Default)]
pub struct ClientStore {
    notes: Vec<Note>,
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a fresh bulk fetch.
    pub fn load(&mut self, mut notes: Vec<Note>) {
        sort_by_latest(&mut notes);
        self.notes = notes;
    }

    /// Reconcile one change event into the list.
    pub fn apply(&mut self, event: &ChangeEvent) {
        self.notes = apply_change(&self.notes, event);
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
