use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::handlers::{dispatch_text, ConnState};
use crate::state::AppState;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/realtime", get(ws_handler))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection_loop(state, socket))
}

async fn connection_loop(state: AppState, socket: WebSocket) {
    let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = ConnState::new(conn_id, tx.clone());

    debug!(conn_id, "realtime connection opened");

    // Topic fan-out: filter the process-wide event stream down to this
    // connection's subscriptions. Lagged events are dropped, not replayed.
    let forwarder = {
        let topics = conn.topics.clone();
        let tx = tx.clone();
        let mut events = BroadcastStream::new(state.dispatcher.subscribe());
        tokio::spawn(async move {
            while let Some(item) = events.next().await {
                let Ok(envelope) = item else { continue };
                let subscribed = topics.read().unwrap().contains(&envelope.topic);
                if subscribed && tx.send(envelope.event).is_err() {
                    break;
                }
            }
        })
    };

    // Outbound writer: everything addressed to this connection, direct
    // replies and filtered broadcasts alike, leaves through one queue.
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else { continue };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => dispatch_text(&state, &conn, text.as_str()).await,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    // Disconnect: drop the search slot and stop event delivery. Registry
    // entries are only removed by ride:end or the staleness sweep.
    state.sessions.clear(conn_id).await;
    forwarder.abort();
    writer.abort();
    debug!(conn_id, "realtime connection closed");
}
