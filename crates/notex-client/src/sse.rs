//! Change events decoded from the live SSE stream.
//!
//! Framing (line endings, comments, multi-line `data:`) is handled by
//! `eventsource-stream`; this module only decides which events carry a
//! [`ChangeEvent`] and decodes their payload.

use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::stream::{BoxStream, Stream, StreamExt};

use notex_core::defaults::CHANGE_EVENT_NAME;
use notex_core::ChangeEvent;

use crate::error::{ClientError, Result};

/// Stream of change events pushed by the server.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent>>;

/// Whether an SSE event of type `name` is expected to carry a change.
///
/// Unnamed events arrive as `message`.
pub fn is_change(name: &str) -> bool {
    name == CHANGE_EVENT_NAME || name == "message" || name.is_empty()
}

/// Decode an SSE event as a [`ChangeEvent`]. `None` for other event types.
pub fn decode_change(event: &Event) -> Option<Result<ChangeEvent>> {
    if !is_change(&event.event) {
        return None;
    }
    Some(serde_json::from_str(&event.data).map_err(ClientError::from))
}

/// Turn a raw SSE body into a stream of change events.
///
/// Events of other types are ignored and undecodable payloads are logged and
/// skipped. Transport and framing failures are yielded as errors.
pub fn change_events<S, B, E>(body: S) -> ChangeStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ClientError> + std::fmt::Display + Send + 'static,
{
    body.eventsource()
        .filter_map(|item| async move {
            let event = match item {
                Ok(event) => event,
                Err(EventStreamError::Transport(e)) => return Some(Err(e.into())),
                Err(e) => return Some(Err(ClientError::Decode(e.to_string()))),
            };
            match decode_change(&event) {
                Some(Ok(change)) => Some(Ok(change)),
                Some(Err(e)) => {
                    tracing::warn!(
                        subsystem = "client",
                        component = "events",
                        error = %e,
                        "Skipping undecodable change event"
                    );
                    None
                }
                None => {
                    tracing::debug!(
                        subsystem = "client",
                        component = "events",
                        event = %event.event,
                        "Ignoring SSE event"
                    );
                    None
                }
            }
        })
        .boxed()
}
