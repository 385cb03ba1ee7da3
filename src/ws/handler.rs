//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::entity::PlayerId;
use crate::game::{JoinAck, MatchHandle};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Display name; validated by the match
    #[serde(default)]
    pub name: String,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let connection = Uuid::new_v4();
    debug!(connection = %connection, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, connection, query.name, state.game))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, connection: Uuid, name: String, game: MatchHandle) {
    let (mut ws_sink, ws_stream) = socket.split();

    // Subscribe before joining so the first lobby update is not missed
    let updates = game.subscribe();

    let ack = match game.join(connection, name).await {
        Ok(ack) => ack,
        Err(e) => {
            let reject = ServerMsg::Error {
                message: e.to_string(),
            };
            if let Err(e) = send_msg(&mut ws_sink, &reject).await {
                debug!(connection = %connection, error = %e, "Failed to send rejection");
            }
            let _ = ws_sink.send(Message::Close(None)).await;
            return;
        }
    };

    let player_id = ack.player_id;
    info!(connection = %connection, player_id = %player_id, "New WebSocket session");

    if let Err(e) = send_msg(&mut ws_sink, &joined_msg(&ack)).await {
        error!(player_id = %player_id, error = %e, "Failed to send joined");
        game.leave(player_id).await;
        return;
    }

    run_session(player_id, &game, ws_sink, ws_stream, updates).await;

    game.leave(player_id).await;
    info!(player_id = %player_id, "WebSocket connection closed");
}

fn joined_msg(ack: &JoinAck) -> ServerMsg {
    ServerMsg::Joined {
        player_id: ack.player_id,
        color: ack.color,
        avatar: ack.avatar,
        arena: ack.arena,
    }
}

/// Run the WebSocket session with read/write split
async fn run_session(
    player_id: PlayerId,
    game: &MatchHandle,
    mut ws_sink: WsSink,
    mut ws_stream: WsStream,
    mut updates: broadcast::Receiver<ServerMsg>,
) {
    let rate_limiter = ConnectionRateLimiter::new();

    // Writer task: lobby/state broadcasts -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(player_id = %player_id, lagged_count = n, "Client lagged, skipping updates");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(player_id = %player_id, "Update channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> match queue
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(ClientMsg::Input { thrust_x, thrust_y }) => {
                        if !game.input(player_id, thrust_x, thrust_y) {
                            warn!(player_id = %player_id, "Match queue full, input dropped");
                        }
                    }
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                debug!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut WsSink, msg: &ServerMsg) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
