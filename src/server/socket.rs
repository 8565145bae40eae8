//! WebSocket event surface.
//!
//! Every text frame is a JSON envelope `{"event": name, "data": payload}` in
//! both directions. Replies go to the requesting connection only; record and
//! lock snapshots from the fanout go to every connection.

use super::{AppState, blocking};
use crate::error::CasebookError;
use crate::fanout::Broadcast;
use crate::locks::{Lock, LockTable, Owner};
use crate::records::{CaseView, Record};
use crate::service::CaseService;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "records:response")]
    RecordsResponse(Vec<CaseView>),

    #[serde(rename = "records:updated")]
    RecordsUpdated(Vec<Record>),

    #[serde(rename = "lock:updated")]
    LockUpdated(LockTable),

    #[serde(rename = "lock:granted")]
    LockGranted {
        #[serde(rename = "caseId")]
        case_id: String,
        lock: Lock,
    },

    #[serde(rename = "lock:denied")]
    LockDenied {
        #[serde(rename = "caseId")]
        case_id: String,
        lock: Lock,
    },

    #[serde(rename = "lock:released")]
    LockReleased {
        #[serde(rename = "caseId")]
        case_id: String,
    },

    #[serde(rename = "lock:error")]
    LockError { error: String },

    #[serde(rename = "heartbeat:ok")]
    HeartbeatOk {
        #[serde(rename = "caseId")]
        case_id: String,
        lock: Lock,
    },

    #[serde(rename = "heartbeat:error")]
    HeartbeatError { error: String },

    /// Reply to a frame that could not be understood at all.
    #[serde(rename = "error")]
    Error { error: String },
}

impl From<Broadcast> for ServerEvent {
    fn from(snapshot: Broadcast) -> Self {
        match snapshot {
            Broadcast::RecordsUpdated(records) => ServerEvent::RecordsUpdated(records),
            Broadcast::LocksUpdated(table) => ServerEvent::LockUpdated(table),
        }
    }
}

/// Incoming frame, before the event name is known.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Payload of `lock:request`, `lock:release`, and `heartbeat`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockPayload {
    #[serde(default)]
    case_id: Option<String>,
    #[serde(default)]
    owner: Option<Owner>,
}

impl LockPayload {
    fn parse(data: Value) -> Option<(String, Owner)> {
        let payload: LockPayload = serde_json::from_value(data).ok()?;
        let case_id = payload.case_id.filter(|c| !c.trim().is_empty())?;
        let owner = payload.owner.filter(|o| !o.id.trim().is_empty())?;
        Some((case_id, owner))
    }
}

const INVALID_PAYLOAD: &str = "caseId and owner.id are required";

/// Handle one client frame and produce the reply for the sender.
///
/// Any resulting broadcast goes out through the service's fanout as a side
/// effect; only the direct reply is returned.
pub fn handle_frame(service: &CaseService, frame: &str) -> ServerEvent {
    let envelope: Envelope = match serde_json::from_str(frame) {
        Ok(envelope) => envelope,
        Err(e) => {
            return ServerEvent::Error {
                error: format!("invalid frame: {}", e),
            };
        }
    };

    match envelope.event.as_str() {
        "records:request" => match service.list_cases() {
            Ok(views) => ServerEvent::RecordsResponse(views),
            Err(e) => ServerEvent::Error {
                error: e.to_string(),
            },
        },
        "lock:request" => {
            let Some((case_id, owner)) = LockPayload::parse(envelope.data) else {
                return ServerEvent::LockError {
                    error: INVALID_PAYLOAD.to_string(),
                };
            };
            match service.acquire(&case_id, owner) {
                Ok(lock) => ServerEvent::LockGranted { case_id, lock },
                Err(CasebookError::Conflict { lock }) => ServerEvent::LockDenied {
                    case_id,
                    lock: *lock,
                },
                Err(e) => ServerEvent::LockError {
                    error: e.to_string(),
                },
            }
        }
        "lock:release" => {
            let Some((case_id, owner)) = LockPayload::parse(envelope.data) else {
                return ServerEvent::LockError {
                    error: INVALID_PAYLOAD.to_string(),
                };
            };
            match service.release(&case_id, &owner.id) {
                Ok(()) => ServerEvent::LockReleased { case_id },
                Err(e) => ServerEvent::LockError {
                    error: e.to_string(),
                },
            }
        }
        "heartbeat" => {
            let Some((case_id, owner)) = LockPayload::parse(envelope.data) else {
                return ServerEvent::HeartbeatError {
                    error: INVALID_PAYLOAD.to_string(),
                };
            };
            match service.renew(&case_id, &owner.id) {
                Ok(lock) => ServerEvent::HeartbeatOk { case_id, lock },
                Err(e) => ServerEvent::HeartbeatError {
                    error: e.to_string(),
                },
            }
        }
        other => ServerEvent::Error {
            error: format!("unknown event '{}'", other),
        },
    }
}

pub(super) async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

async fn run_connection(mut socket: WebSocket, state: AppState) {
    let connection = NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed);
    let mut updates = state.fanout.subscribe();
    info!(connection, "client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = blocking(&state.service, move |s| handle_frame(s, &text))
                        .await
                        .unwrap_or_else(|e| ServerEvent::Error { error: e.to_string() });
                    if send(&mut socket, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(connection, error = %e, "receive failed");
                    break;
                }
            },
            update = updates.recv() => match update {
                Ok(snapshot) => {
                    if send(&mut socket, &ServerEvent::from(snapshot)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(connection, skipped, "client fell behind, skipping to newer snapshots");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(connection, "client disconnected");
}

async fn send(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "failed to encode event");
            return Ok(());
        }
    };
    socket.send(Message::Text(text)).await
}
