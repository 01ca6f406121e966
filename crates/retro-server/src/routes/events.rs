use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

/// GET /api/events: SSE stream of every retro event. The SSE event name is
/// the team id; the data is the JSON frame a participant would receive.
pub async fn sse_events(State(app): State<AppState>) -> impl axum::response::IntoResponse {
    let rx = app.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        let msg = msg.ok()?;
        let data = serde_json::to_string(&msg.event).ok()?;
        Some(Ok::<Event, Infallible>(
            Event::default().event(msg.team_id).data(data),
        ))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
