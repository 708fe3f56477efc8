//! Core data models for notex.
//!
//! These types are shared by the server, the persistence layer, and the
//! client, so they serialize to exactly the JSON the HTTP surface speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A persisted note.
///
/// Timestamps are optional on the wire so that partially-known records (for
/// example a locally constructed draft) can still live in a client list; the
/// server always fills both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_bg_color() -> String {
    defaults::BG_COLOR.to_string()
}

impl Note {
    /// Timestamp used for display ordering: `updated_at`, else `created_at`,
    /// else the Unix epoch.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.updated_at
            .or(self.created_at)
            .unwrap_or_default()
    }
}

/// Id-only stub carried by `deleted` change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: i64,
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Body of `POST /notes`.
///
/// Every field is optional at the serde level so that a missing `name` is
/// reported as a validation failure rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
}

impl CreateNoteRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn bg_color(mut self, bg_color: impl Into<String>) -> Self {
        self.bg_color = Some(bg_color.into());
        self
    }

    /// Validate and apply defaults.
    pub fn validate(self) -> Result<NewNote> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(Error::InvalidInput("Name is required".to_string())),
        };
        let bg_color = match self.bg_color {
            Some(color) => validate_bg_color(color)?,
            None => defaults::BG_COLOR.to_string(),
        };
        Ok(NewNote {
            name,
            description: self
                .description
                .unwrap_or_else(|| defaults::DESCRIPTION.to_string()),
            bg_color,
        })
    }
}

/// Body of `PUT /notes/:id`. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
}

impl UpdateNoteRequest {
    pub fn validate(self) -> Result<NoteChanges> {
        let name = match self.name {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(Error::InvalidInput("Name cannot be blank".to_string()));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        let bg_color = self.bg_color.map(validate_bg_color).transpose()?;
        Ok(NoteChanges {
            name,
            description: self.description,
            bg_color,
        })
    }
}

impl From<&Note> for UpdateNoteRequest {
    fn from(note: &Note) -> Self {
        Self {
            name: Some(note.name.clone()),
            description: Some(note.description.clone()),
            bg_color: Some(note.bg_color.clone()),
        }
    }
}

/// A validated note ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub name: String,
    pub description: String,
    pub bg_color: String,
}

/// A validated partial update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub bg_color: Option<String>,
}

impl NoteChanges {
    /// Merge these changes onto an existing note (timestamps untouched).
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(name) = &self.name {
            note.name = name.clone();
        }
        if let Some(description) = &self.description {
            note.description = description.clone();
        }
        if let Some(bg_color) = &self.bg_color {
            note.bg_color = bg_color.clone();
        }
    }
}

/// Accepts `#rgb` and `#rrggbb`, returned lowercased.
fn validate_bg_color(color: String) -> Result<String> {
    let trimmed = color.trim();
    let valid = trimmed
        .strip_prefix('#')
        .map(|hex| (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);
    if !valid {
        return Err(Error::InvalidInput(format!(
            "bg_color must be a hex color like #ffffff, got '{}'",
            color
        )));
    }
    Ok(trimmed.to_ascii_lowercase())
}
