//! Server-Sent Events support

use crate::llm::Message;
use crate::session::SessionEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Stream the current messages, then every session event after that.
/// `thinking` marks a turn already in flight when the client connects.
pub fn sse_stream(
    messages: Vec<Message>,
    thinking: bool,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(Event::default()
            .event("init")
            .data(init_payload(&messages, thinking).to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_axum(&event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_payload(messages: &[Message], thinking: bool) -> serde_json::Value {
    json!({ "type": "init", "messages": messages, "thinking": thinking })
}

fn session_event_to_axum(event: &SessionEvent) -> Event {
    let (event_type, data) = session_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn session_event_payload(event: &SessionEvent) -> (&'static str, serde_json::Value) {
    match event {
        SessionEvent::Thinking => ("thinking", json!({ "type": "thinking" })),
        SessionEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SessionEvent::Done => ("done", json!({ "type": "done" })),
    }
}
