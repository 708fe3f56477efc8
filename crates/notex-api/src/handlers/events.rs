//! Subscription endpoint: live change events over Server-Sent Events.
//!
//! Each connection registers one subscriber with the [`BroadcastRegistry`].
//! The response stream owns the [`Subscription`], so when the client goes
//! away axum drops the stream and the subscriber is unregistered exactly once.
//! A subscriber evicted by the registry sees its stream end, which closes the
//! connection from our side.
//!
//! Keep-alive comments run on their own fixed interval, interleaved with
//! change events rather than reset by them.
//!
//! [`BroadcastRegistry`]: notex_core::BroadcastRegistry
//! [`Subscription`]: notex_core::Subscription

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::AppState;
use notex_core::defaults::{CHANGE_EVENT_NAME, SSE_CONNECTED_COMMENT, SSE_KEEPALIVE_COMMENT};
use notex_core::Subscription;

/// `GET /notes/events`
pub async fn note_events(State(state): State<AppState>) -> impl IntoResponse {
    // Register before the acknowledgement is sent, so a client that has seen
    // `: connected` is guaranteed to receive every later publish.
    let subscription = state.registry.register();

    tracing::info!(
        subsystem = "api",
        component = "events",
        op = "connect",
        subscriber_id = subscription.id(),
        subscriber_count = state.registry.subscriber_count(),
        "SSE client connected"
    );

    let acknowledgement =
        stream::once(async { Ok::<_, Infallible>(Event::default().comment(SSE_CONNECTED_COMMENT)) });

    let sse = Sse::new(acknowledgement.chain(live_events(subscription, state.keepalive)));

    ([(header::CACHE_CONTROL, "no-cache")], sse)
}

/// Forward queued payloads as `noteChange` events, with a keep-alive comment
/// every `keepalive`, until the subscriber is evicted.
fn live_events(
    subscription: Subscription,
    keepalive: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let mut ticker = interval_at(Instant::now() + keepalive, keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    stream::unfold(
        (subscription, ticker),
        |(mut subscription, mut ticker)| async move {
            let event = tokio::select! {
                payload = subscription.recv() => {
                    let payload = payload?;
                    tracing::trace!(
                        subsystem = "api",
                        component = "events",
                        subscriber_id = subscription.id(),
                        "Forwarding change event"
                    );
                    Event::default().event(CHANGE_EVENT_NAME).data(&*payload)
                }
                _ = ticker.tick() => Event::default().comment(SSE_KEEPALIVE_COMMENT),
            };
            Some((Ok(event), (subscription, ticker)))
        },
    )
}
