//! WebSocket endpoint
//!
//! Carries a single event type, `paymentCreated`. The connection is a
//! hint channel: a subscriber that reconnects re-derives current state
//! through the read endpoints rather than trusting event payloads.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};

use crate::notifier::EventHub;

use super::AppState;

/// Upgrade handler. The access guard has already verified the caller by
/// the time this runs.
pub async fn events_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.events))
}

async fn handle_socket(socket: WebSocket, hub: EventHub) {
    let (mut sender, mut receiver) = socket.split();

    let (subscriber_id, mut rx) = hub.subscribe().await;

    // Forward hub events to the socket until either side goes away.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Subscribers don't speak; drain the incoming side for close frames.
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("websocket error for {}: {}", subscriber_id, e);
                break;
            }
        }
    }

    hub.unsubscribe(&subscriber_id).await;
    send_task.abort();
}
