//! Typed HTTP client for the notes API and its live event stream.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::Response;
use serde_json::Value;

use notex_core::{ChangeEvent, ClientStore, CreateNoteRequest, Note, NoteRef, UpdateNoteRequest};

use crate::error::{ClientError, Result};
use crate::sse::{change_events, ChangeStream};

#[derive(Debug, Clone)]
pub struct NotesClient {
    http: reqwest::Client,
    base: String,
}

impl NotesClient {
    /// Client for the API rooted at `base`, e.g. `http://localhost:8080`.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let resp = self.http.get(self.url("/notes")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn get_note(&self, id: i64) -> Result<Note> {
        let resp = self.http.get(self.url(&format!("/notes/{id}"))).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn create_note(&self, req: &CreateNoteRequest) -> Result<Note> {
        let resp = self.http.post(self.url("/notes")).json(req).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn update_note(&self, id: i64, req: &UpdateNoteRequest) -> Result<Note> {
        let resp = self
            .http
            .put(self.url(&format!("/notes/{id}")))
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    /// Delete a note, returning the server's confirmation message.
    pub async fn delete_note(&self, id: i64) -> Result<String> {
        let resp = self
            .http
            .delete(self.url(&format!("/notes/{id}")))
            .send()
            .await?;
        let body: Value = check(resp).await?.json().await?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Open the live event stream.
    ///
    /// Resolves once the server has accepted the subscription, so events
    /// published after this returns are delivered. See [`change_events`] for
    /// what the stream yields; it ends when the server closes the connection.
    pub async fn subscribe(&self) -> Result<ChangeStream> {
        let resp = self
            .http
            .get(self.url("/notes/events"))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resp = check(resp).await?;
        Ok(change_events(resp.bytes_stream()))
    }
}

/// Map a non-2xx response to [`ClientError::Http`].
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Http {
        status: status.as_u16(),
        body,
    })
}

/// A [`ClientStore`] kept in sync with the server.
///
/// Mutations go to the server first; only a successful response is applied
/// locally, as the same change event the server will push back. The echoed
/// event is then absorbed by the store's merge-by-id rules.
#[derive(Debug)]
pub struct LiveNotes {
    client: NotesClient,
    store: ClientStore,
}

impl LiveNotes {
    pub fn new(client: NotesClient) -> Self {
        Self {
            client,
            store: ClientStore::new(),
        }
    }

    /// Replace the local list with the server's.
    pub async fn load(&mut self) -> Result<()> {
        let notes = self.client.list_notes().await?;
        self.store.load(notes);
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        self.store.notes()
    }

    pub fn store(&self) -> &ClientStore {
        &self.store
    }

    pub fn client(&self) -> &NotesClient {
        &self.client
    }

    /// Reconcile an event received from [`NotesClient::subscribe`].
    pub fn apply(&mut self, event: &ChangeEvent) {
        self.store.apply(event);
    }

    pub async fn create(&mut self, req: &CreateNoteRequest) -> Result<Note> {
        let note = self.client.create_note(req).await?;
        self.store.apply(&ChangeEvent::Created {
            note: note.clone(),
            timestamp: Utc::now().timestamp_millis(),
        });
        Ok(note)
    }

    pub async fn update(&mut self, id: i64, req: &UpdateNoteRequest) -> Result<Note> {
        let note = self.client.update_note(id, req).await?;
        self.store.apply(&ChangeEvent::Updated {
            note: note.clone(),
            timestamp: Utc::now().timestamp_millis(),
        });
        Ok(note)
    }

    pub async fn delete(&mut self, id: i64) -> Result<()> {
        self.client.delete_note(id).await?;
        self.store.apply(&ChangeEvent::Deleted {
            note: NoteRef { id },
            timestamp: Utc::now().timestamp_millis(),
        });
        Ok(())
    }
}
