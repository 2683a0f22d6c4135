//! WebSocket connection handlers.
//!
//! One upgraded connection drives two tasks: a receive loop that broadcasts
//! every inbound text frame to the client's room, and a pusher loop that
//! drains the client's outbound queue into the socket. Whichever ends first
//! ends the session; the client then leaves its room before the socket closes.
//!
//! With an idle deadline configured the pusher loop also pings the client at
//! half that interval. The pong counts as inbound traffic, so a client that
//! only listens stays connected as long as its socket is alive.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, Interval, MissedTickBehavior},
};

use crate::{
    domain::{ClientSession, DisplayName, RoomName},
    infrastructure::message_sink::outbound_channel,
    ui::state::AppState,
};

/// Body of the 400 response for a connect request without usable parameters
pub const MISSING_PARAMS_MESSAGE: &str = "room and user query parameters are required";

/// How long the pusher loop may keep flushing after the client has left its room
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Shortest keepalive ping period
const MIN_PING_INTERVAL: Duration = Duration::from_millis(10);

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub room: Option<String>,
    pub user: Option<String>,
}

impl ConnectQuery {
    /// Validate both parameters into domain values.
    ///
    /// Returns `None` when either is missing, empty or otherwise invalid.
    pub fn validate(self) -> Option<(RoomName, DisplayName)> {
        let room = RoomName::try_from(self.room?).ok()?;
        let user = DisplayName::try_from(self.user?).ok()?;
        Some((room, user))
    }
}

pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    // Reject bad parameters before touching any hub state
    let Some((room_name, display_name)) = query.validate() else {
        tracing::warn!("Rejecting connection: missing or invalid room/user parameters");
        return (StatusCode::BAD_REQUEST, MISSING_PARAMS_MESSAGE).into_response();
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!("Rejecting non-WebSocket request to /ws: {}", rejection);
            return rejection.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, room_name, display_name))
}

/// Keepalive ping period for a given idle deadline
fn ping_interval(idle_timeout: Duration) -> Duration {
    (idle_timeout / 2).max(MIN_PING_INTERVAL)
}

/// Waits for the next keepalive tick, or forever when keepalive is off
async fn next_ping(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The loop ends when every producer is gone (the client left its room) or when
/// writing to the socket fails. On a clean end it sends a Close frame.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    ping_every: Option<Duration>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = ping_every.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if let Err(e) = sender.send(Message::Text(msg.into())).await {
                        tracing::debug!("Failed to write message to socket: {}", e);
                        return;
                    }
                }
                _ = next_ping(&mut ticker) => {
                    if let Err(e) = sender.send(Message::Ping(Bytes::new())).await {
                        tracing::debug!("Failed to send keepalive ping: {}", e);
                        return;
                    }
                }
            }
        }

        if let Err(e) = sender.send(Message::Close(None)).await {
            tracing::debug!("Failed to send close frame: {}", e);
        }
    })
}

/// Broadcasts one inbound chat message to the session's room
async fn relay(state: &AppState, session: &ClientSession, text: &str) {
    tracing::info!(
        "Received message from '{}' in room '{}': {}",
        session.display_name(),
        session.room_name(),
        text
    );
    state.send_message_usecase.execute(session, text).await;
}

/// Reads frames until the connection closes, errors or idles out.
///
/// Every text frame (and every binary frame holding valid UTF-8) is broadcast
/// to the session's room as-is.
async fn receive_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    session: Arc<ClientSession>,
) {
    loop {
        let next = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::info!(
                        "'{}' in room '{}' idle for {:?}, disconnecting",
                        session.display_name(),
                        session.room_name(),
                        limit
                    );
                    break;
                }
            },
            None => receiver.next().await,
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::error!("WebSocket error from '{}': {}", session.display_name(), e);
                break;
            }
            None => {
                tracing::info!("Connection of '{}' ended", session.display_name());
                break;
            }
        };

        match msg {
            Message::Text(text) => relay(&state, &session, text.as_str()).await,
            Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                Ok(text) => relay(&state, &session, text).await,
                Err(_) => tracing::warn!(
                    "Ignoring non UTF-8 binary frame from '{}'",
                    session.display_name()
                ),
            },
            Message::Ping(_) | Message::Pong(_) => {
                // Ping/pong is answered by the WebSocket protocol layer
                tracing::debug!("Received ping/pong from '{}'", session.display_name());
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", session.display_name());
                break;
            }
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_name: RoomName,
    display_name: DisplayName,
) {
    let (sender, receiver) = socket.split();

    // Join the room with this connection's outbound queue
    let (sink, rx) = outbound_channel(state.outbound_buffer);
    let session = match state
        .connect_participant_usecase
        .execute(room_name, display_name, Arc::new(sink))
        .await
    {
        Ok(session) => Arc::new(session),
        Err(e) => {
            tracing::warn!("Failed to join room: {}", e);
            return;
        }
    };

    let mut recv_task = tokio::spawn(receive_loop(receiver, state.clone(), session.clone()));
    let mut send_task = pusher_loop(rx, sender, state.idle_timeout.map(ping_interval));

    // Whichever side ends first ends the session
    let send_finished = tokio::select! {
        result = &mut recv_task => {
            if let Err(e) = result {
                tracing::error!(
                    "Receive loop of '{}' terminated abnormally: {}",
                    session.display_name(),
                    e
                );
            }
            false
        }
        _ = &mut send_task => {
            recv_task.abort();
            let _ = (&mut recv_task).await;
            true
        }
    };

    // Both loops are settled here, so this is the only remaining handle
    match Arc::try_unwrap(session) {
        Ok(session) => {
            state.disconnect_participant_usecase.execute(session).await;
        }
        Err(session) => {
            tracing::error!(
                "Session of '{}' still shared after shutdown, leaving room directly",
                session.display_name()
            );
            session.room().leave(&session.connection_id()).await;
        }
    }

    // Close the connection after leaving: let the pusher flush and send Close
    if !send_finished && tokio::time::timeout(CLOSE_GRACE_PERIOD, &mut send_task).await.is_err() {
        send_task.abort();
    }
}
