//! WebSocket transport: turns an upgraded socket into an actor subscriber.
//!
//! The socket is split on upgrade. Outbound frames flow through an
//! unbounded channel drained by a writer task, so the actor's broadcast
//! pass never blocks on a slow socket — a send either queues instantly or
//! fails because the writer is gone, which is the pruning signal.
//!
//! Auth never rejects here: an invalid or absent token subscribes as guest.

use crate::auth;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use rollcall_core::{ClientMessage, PartitionKey, Role};
use rollcall_runtime::{Connection, ConnectionId, SendError};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// `?acara=<id|all>` on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Partition to subscribe to.
    pub acara: Option<String>,
}

/// `GET /ws` — upgrade and hand the socket to the partition's actor.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] if the `acara` parameter is missing or
/// names neither `all` nor a decimal event id.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let raw = query
        .acara
        .ok_or_else(|| AppError::BadRequest("missing acara parameter".to_string()))?;
    let partition = PartitionKey::parse(&raw)
        .ok_or_else(|| AppError::BadRequest(format!("invalid partition: {raw}")))?;
    let role = auth::resolve_role(&state.config.auth, &headers);
    Ok(ws.on_upgrade(move |socket| serve_socket(state, socket, partition, role)))
}

/// The actor-facing half of one socket: frames queue onto the writer task.
struct WsConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<String>,
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: &str) -> Result<(), SendError> {
        self.tx.send(frame.to_string()).map_err(|_| SendError)
    }
}

async fn serve_socket(state: AppState, socket: WebSocket, partition: PartitionKey, role: Role) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer drains until every sender (here and in the actor) is gone.
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let connection = Arc::new(WsConnection {
        id: ConnectionId::new(),
        tx,
    });
    let connection_id = connection.id();

    let handle = state.registry.resolve(partition).await;
    if let Err(source) = handle.subscribe(partition, connection.clone(), role).await {
        warn!(%partition, error = %source, "subscription refused");
        return;
    }
    info!(%partition, connection = %connection_id, %role, "dashboard connected");

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(request) => {
                    if handle
                        .query(partition, connection_id, request.into())
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(_) => {
                    debug!(connection = %connection_id, "unparseable frame ignored");
                }
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    handle.unsubscribe(connection_id).await;
    info!(%partition, connection = %connection_id, "dashboard disconnected");
}
