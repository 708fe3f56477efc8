//! Note CRUD handlers.
//!
//! Every mutation goes through [`notex_core::NoteService`], which publishes a
//! change event only after the write has committed.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::{ApiError, AppState};
use notex_core::{CreateNoteRequest, Note, UpdateNoteRequest};

/// Body returned by a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

/// List all notes, most recently updated first.
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state
        .service
        .list()
        .await
        .map_err(|e| ApiError::context(e, "Internal server error"))?;
    Ok(Json(notes))
}

/// Get a note by id.
///
/// # Returns
/// - 200 OK with the note
/// - 400 Bad Request for a non-numeric id
/// - 404 Not Found if the note doesn't exist
pub async fn get_note(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Note>, ApiError> {
    let Path(id) = id?;
    let note = state
        .service
        .get(id)
        .await
        .map_err(|e| ApiError::context(e, "Failed to get note"))?;
    Ok(Json(note))
}

/// Create a note.
///
/// # Returns
/// - 201 Created with the stored note
/// - 400 Bad Request if `name` is missing or blank, or `bg_color` is malformed
/// - 500 with `details` if the insert fails
pub async fn create_note(
    State(state): State<AppState>,
    body: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(req) = body?;
    let note = state
        .service
        .create(req)
        .await
        .map_err(|e| ApiError::context_with_details(e, "Failed to create note"))?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Merge the supplied fields into an existing note.
///
/// Omitted fields keep their stored values; `updated_at` is always refreshed.
pub async fn update_note(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let Path(id) = id?;
    let Json(req) = body?;
    let note = state
        .service
        .update(id, req)
        .await
        .map_err(|e| ApiError::context(e, "Failed to update note"))?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(id) = id?;
    state
        .service
        .delete(id)
        .await
        .map_err(|e| ApiError::context(e, "Failed to delete note"))?;
    Ok(Json(DeleteResponse {
        message: "Note deleted",
    }))
}
