//! Long-lived SSE endpoint delivering change events to browser tabs.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::extract::State;
use axum::http::header;
use axum::response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
};
use tracing::{debug, warn};

use crate::application::stream::RegistrationGuard;
use crate::infra::http::state::ApiState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `GET /api/stream`. Headers flush as soon as the response starts, so the
/// browser treats the connection as open before any event arrives. There is
/// no backfill: `Last-Event-ID` is ignored and reconnecting clients are
/// expected to re-fetch current state.
pub async fn stream(State(state): State<ApiState>) -> impl IntoResponse {
    let (handle, mut rx) = state.hub.register();
    let guard = RegistrationGuard::new(state.hub.clone(), handle);
    debug!(
        target = "alexpetro::stream",
        clients = state.hub.client_count(),
        "sse client connected"
    );

    let events = stream! {
        // Dropping the guard on stream teardown deregisters the client; that
        // is the close-signal cleanup, no polling involved.
        let _guard = guard;
        while let Some(change) = rx.recv().await {
            match Event::default()
                .event(change.event_name())
                .json_data(&change.payload)
            {
                Ok(event) => yield Ok::<Event, Infallible>(event),
                Err(err) => {
                    warn!(
                        target = "alexpetro::stream",
                        error = %err,
                        "failed to frame change event, skipping"
                    );
                }
            }
        }
    };

    let sse = Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("ping"),
    );

    ([(header::CACHE_CONTROL, "no-cache")], sse)
}
