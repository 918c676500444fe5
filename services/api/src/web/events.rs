//! services/api/src/web/events.rs
//!
//! Streams the core's change notifications to the presentation layer as Server-Sent
//! Events, so it knows when to re-render.

use crate::web::{rest::SessionResponse, state::AppState};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use scripture_core::CoreEvent;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use utoipa::ToSchema;

/// One change notification. The SSE event name matches `type`.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventView {
    SessionChanged { session: SessionResponse },
    ReadToggled { id: String, read: bool },
    Restarted,
    /// Some notifications were missed; refetch everything.
    Resync,
}

impl EventView {
    fn name(&self) -> &'static str {
        match self {
            EventView::SessionChanged { .. } => "session_changed",
            EventView::ReadToggled { .. } => "read_toggled",
            EventView::Restarted => "restarted",
            EventView::Resync => "resync",
        }
    }

    fn into_sse(self) -> Result<Event, axum::Error> {
        Event::default().event(self.name()).json_data(&self)
    }
}

impl From<CoreEvent> for EventView {
    fn from(event: CoreEvent) -> Self {
        match event {
            CoreEvent::SessionChanged(session) => EventView::SessionChanged {
                session: SessionResponse::from(&session),
            },
            CoreEvent::ReadToggled { id, read } => EventView::ReadToggled { id, read },
            CoreEvent::Restarted => EventView::Restarted,
        }
    }
}

/// GET /events - Change notifications as they happen
#[utoipa::path(
    get,
    path = "/events",
    responses(
        (status = 200, description = "Server-Sent Events stream", body = EventView, content_type = "text/event-stream")
    )
)]
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut events = state.sessions.subscribe();
    let shutdown = state.shutdown.clone();
    let stream = async_stream::stream! {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => received,
            };
            match received {
                Ok(event) => yield EventView::from(event).into_sse(),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event subscriber lagged; asking client to resync");
                    yield EventView::Resync.into_sse();
                }
                Err(RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}
