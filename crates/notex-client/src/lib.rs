//! # notex-client
//!
//! Client side of notex: a typed HTTP client, change-event decoding for the
//! live SSE stream, and [`LiveNotes`], which keeps a
//! [`notex_core::ClientStore`] reconciled with the server.
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use notex_client::{LiveNotes, NotesClient};
//!
//! let client = NotesClient::new("http://localhost:8080");
//! let mut live = LiveNotes::new(client.clone());
//! live.load().await?;
//!
//! let mut events = client.subscribe().await?;
//! while let Some(event) = events.next().await {
//!     live.apply(&event?);
//! }
//! ```

pub mod client;
pub mod error;
pub mod sse;

pub use client::{LiveNotes, NotesClient};
pub use error::{ClientError, Result};
pub use sse::{change_events, ChangeStream};
