use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::messages::{
    JoinRoomPayload, JoinedPayload, MessageType, PlayCardPayload, PlayersRemovedPayload,
    ReconnectPayload, WebSocketMessage,
};
use super::socket::SocketWrapper;
use crate::game::cards::Card;
use crate::room::models::{RoomModel, RoomStatus};
use crate::room::registry::{
    AdvanceRoundResult, JoinRoomResult, PlayCardResult, StartGameResult,
};
use crate::shared::AppState;
use crate::websockets::ConnectionManager;

/// Upgrades an HTTP request to the game WebSocket connection.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

#[instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, "Player connected");
    run_connection(socket, state, connection_id).await;
}

/// Drives one connection until it closes: outbound messages from the
/// connection manager are pushed to the socket, inbound messages are
/// dispatched against the room registry.
async fn run_connection<S: SocketWrapper>(mut socket: S, state: AppState, connection_id: String) {
    let mut outbound = state.connections.register(&connection_id).await;
    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            queued = outbound.recv() => {
                match queued {
                    Some(text) => {
                        if socket.send_message(text).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.receive_message() => {
                match incoming {
                    Ok(Some(text)) => {
                        handle_message(&state, &connection_id, &mut current_room, &text).await;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(connection_id = %connection_id, error = %e, "Socket error");
                        break;
                    }
                }
            }
        }
    }

    state.connections.unregister(&connection_id).await;
    handle_disconnect(&state, &connection_id, current_room).await;
}

async fn handle_message(
    state: &AppState,
    connection_id: &str,
    current_room: &mut Option<String>,
    text: &str,
) {
    let message: WebSocketMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(connection_id = %connection_id, error = %e, "Unparseable message");
            send_error(state, connection_id, "Invalid message").await;
            return;
        }
    };

    match message.message_type {
        MessageType::JoinRoom => {
            handle_join_room(state, connection_id, current_room, message.payload).await;
        }
        MessageType::Reconnect => {
            handle_reconnect(state, connection_id, current_room, message.payload).await;
        }
        MessageType::StartGame => handle_start_game(state, connection_id, current_room).await,
        MessageType::PlayCard => {
            handle_play_card(state, connection_id, current_room, message.payload).await;
        }
        MessageType::NextRound => handle_next_round(state, connection_id, current_room).await,
        other => {
            debug!(connection_id = %connection_id, message_type = ?other, "Unexpected message type");
            send_error(state, connection_id, "Unexpected message type").await;
        }
    }
}

async fn handle_join_room(
    state: &AppState,
    connection_id: &str,
    current_room: &mut Option<String>,
    payload: serde_json::Value,
) {
    let Ok(payload) = serde_json::from_value::<JoinRoomPayload>(payload) else {
        send_error(state, connection_id, "Invalid join request").await;
        return;
    };

    let room = match payload.room_code {
        Some(code) => match state
            .registry
            .join_room(&code, connection_id, &payload.name)
            .await
        {
            JoinRoomResult::Joined(room) => room,
            JoinRoomResult::RoomNotFound | JoinRoomResult::GameAlreadyStarted => {
                send_error(
                    state,
                    connection_id,
                    "Room not found or game already started",
                )
                .await;
                return;
            }
            JoinRoomResult::RoomFull => {
                send_error(state, connection_id, "Room is full").await;
                return;
            }
        },
        None => state.registry.create_room(connection_id, &payload.name).await,
    };

    *current_room = Some(room.code.clone());
    send_joined(state, connection_id, &room.code).await;
    push_room_state(&state.connections, &room).await;
}

async fn handle_reconnect(
    state: &AppState,
    connection_id: &str,
    current_room: &mut Option<String>,
    payload: serde_json::Value,
) {
    let Ok(payload) = serde_json::from_value::<ReconnectPayload>(payload) else {
        send_error(state, connection_id, "Invalid reconnect request").await;
        return;
    };

    match state
        .registry
        .reconnect_player(&payload.room_code, &payload.previous_player_id, connection_id)
        .await
    {
        Some(room) => {
            *current_room = Some(room.code.clone());
            send_joined(state, connection_id, &room.code).await;
            push_room_state(&state.connections, &room).await;
        }
        None => {
            send_error(state, connection_id, "Room not found or game already started").await;
        }
    }
}

async fn handle_start_game(state: &AppState, connection_id: &str, current_room: &Option<String>) {
    let Some(room_code) = current_room else {
        send_error(state, connection_id, "Not in a room").await;
        return;
    };

    // Only the host may start the game
    match state.registry.get_room(room_code).await {
        Some(room) if room.host_id != connection_id => {
            send_error(state, connection_id, "Only the host can start the game").await;
            return;
        }
        Some(_) => {}
        None => {
            send_error(state, connection_id, "Room not found").await;
            return;
        }
    }

    match state.registry.start_game(room_code).await {
        StartGameResult::Started(room) => {
            push_room_state(&state.connections, &room).await;
        }
        StartGameResult::WrongPlayerCount(_) => {
            send_error(state, connection_id, "Cannot start game (need 3-4 players)").await;
        }
        StartGameResult::AlreadyStarted => {
            send_error(state, connection_id, "Game already started").await;
        }
        StartGameResult::RoomNotFound => {
            send_error(state, connection_id, "Room not found").await;
        }
    }
}

async fn handle_play_card(
    state: &AppState,
    connection_id: &str,
    current_room: &Option<String>,
    payload: serde_json::Value,
) {
    let Some(room_code) = current_room else {
        send_error(state, connection_id, "Not in a room").await;
        return;
    };

    let Ok(payload) = serde_json::from_value::<PlayCardPayload>(payload) else {
        send_error(state, connection_id, "Invalid play request").await;
        return;
    };
    let card = match Card::from_string(&payload.card) {
        Ok(card) => card,
        Err(_) => {
            send_error(state, connection_id, "Invalid card").await;
            return;
        }
    };

    match state.registry.play_card(room_code, connection_id, card).await {
        PlayCardResult::Played(room) => {
            push_room_state(&state.connections, &room).await;
        }
        PlayCardResult::Rejected(e) => {
            send_error(state, connection_id, &e.to_string()).await;
        }
        PlayCardResult::RoomNotFound => {
            send_error(state, connection_id, "Room not found").await;
        }
    }
}

async fn handle_next_round(state: &AppState, connection_id: &str, current_room: &Option<String>) {
    let Some(room_code) = current_room else {
        send_error(state, connection_id, "Not in a room").await;
        return;
    };

    match state.registry.advance_round(room_code).await {
        AdvanceRoundResult::Dealt(room) => {
            push_room_state(&state.connections, &room).await;
        }
        AdvanceRoundResult::GameFinished(room) => {
            push_game_over(&state.connections, &room).await;
            push_room_state(&state.connections, &room).await;
        }
        AdvanceRoundResult::RoundNotOver => {
            send_error(state, connection_id, "Round has not ended").await;
        }
        AdvanceRoundResult::RoomNotFound => {
            send_error(state, connection_id, "Room not found").await;
        }
    }
}

/// Marks the player disconnected, notifies the room, and schedules the
/// grace-period check that removes them for good if they never return.
async fn handle_disconnect(state: &AppState, connection_id: &str, current_room: Option<String>) {
    info!(connection_id = %connection_id, "Player disconnected");

    let Some(room_code) = current_room else {
        return;
    };

    state
        .registry
        .update_connection(&room_code, connection_id, false)
        .await;
    if let Some(room) = state.registry.get_room(&room_code).await {
        push_room_state(&state.connections, &room).await;
    }

    let registry = Arc::clone(&state.registry);
    let connections = Arc::clone(&state.connections);
    let grace = state.disconnect_grace;
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;

        let removed = registry.expire_disconnected(&room_code, grace).await;
        if removed.is_empty() {
            return;
        }
        warn!(
            room_code = %room_code,
            removed = removed.len(),
            "Players removed after disconnect grace period"
        );

        if let Some(room) = registry.get_room(&room_code).await {
            let notice = WebSocketMessage::new(
                MessageType::PlayersRemoved,
                &PlayersRemovedPayload {
                    count: removed.len(),
                    player_ids: removed,
                },
            );
            for player in &room.players {
                connections.send_to(&player.id, &notice).await;
            }
            if room.status == RoomStatus::Finished {
                push_game_over(&connections, &room).await;
            }
            push_room_state(&connections, &room).await;
        }
    });
}

/// Pushes each seated player their own filtered view of the room.
async fn push_room_state(connections: &ConnectionManager, room: &RoomModel) {
    for player in &room.players {
        let projection = crate::game::view::client_state(room, &player.id);
        let message = WebSocketMessage::new(MessageType::GameState, &projection);
        connections.send_to(&player.id, &message).await;
    }
}

async fn push_game_over(connections: &ConnectionManager, room: &RoomModel) {
    let Some(payload) = crate::game::view::game_over_state(room) else {
        return;
    };
    let message = WebSocketMessage::new(MessageType::GameOver, &payload);
    for player in &room.players {
        connections.send_to(&player.id, &message).await;
    }
}

async fn send_joined(state: &AppState, connection_id: &str, room_code: &str) {
    let message = WebSocketMessage::new(
        MessageType::Joined,
        &JoinedPayload {
            room_code: room_code.to_string(),
            player_id: connection_id.to_string(),
        },
    );
    state.connections.send_to(connection_id, &message).await;
}

async fn send_error(state: &AppState, connection_id: &str, message: &str) {
    state
        .connections
        .send_to(connection_id, &WebSocketMessage::error(message))
        .await;
}
