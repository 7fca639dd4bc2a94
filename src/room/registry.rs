use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::codes::{generate_room_code, normalize_room_code};
use super::models::{PlayerModel, RoomModel, RoomStatus, MAX_PLAYERS, MIN_PLAYERS};
use crate::game::cards::Card;
use crate::game::logic::{self, PlayError};
use crate::game::rounds::RoundInfo;
use crate::game::rules;
use crate::game::view::{self, ClientGameState, GameOverPayload};

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Joined (or was already seated), returns the updated room
    Joined(RoomModel),
    RoomNotFound,
    /// Room is no longer accepting players
    GameAlreadyStarted,
    /// Room is at capacity (4 players)
    RoomFull,
}

/// Result of attempting to start a game
#[derive(Debug, Clone)]
pub enum StartGameResult {
    Started(RoomModel),
    RoomNotFound,
    AlreadyStarted,
    /// Starting requires 3 or 4 seated players
    WrongPlayerCount(usize),
}

/// Result of attempting to advance to the next round
#[derive(Debug, Clone)]
pub enum AdvanceRoundResult {
    /// Next round dealt, room back in PLAYING
    Dealt(RoomModel),
    /// All six rounds complete, room is now FINISHED
    GameFinished(RoomModel),
    RoomNotFound,
    RoundNotOver,
}

/// Result of attempting to play a card
#[derive(Debug, Clone)]
pub enum PlayCardResult {
    Played(RoomModel),
    RoomNotFound,
    /// The play was invalid; the room is unchanged
    Rejected(PlayError),
}

/// Owns every in-progress room, keyed by room code. All mutating
/// operations hold the write lock for their full duration, so each room
/// sees a single serialized stream of updates and no partial state is
/// ever observable.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomModel>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a WAITING room hosted by the given player, generating a
    /// fresh room code (regenerating on the off chance of a collision).
    pub async fn create_room(&self, host_id: &str, host_name: &str) -> RoomModel {
        let mut rooms = self.rooms.write().await;

        let mut code = generate_room_code();
        while rooms.contains_key(&code) {
            debug!(room_code = %code, "Room code collision, regenerating");
            code = generate_room_code();
        }

        let room = RoomModel::new(code.clone(), host_id.to_string(), host_name.to_string());
        rooms.insert(code.clone(), room.clone());

        info!(room_code = %code, host_id = %host_id, "Room created");
        room
    }

    /// Adds a player to a WAITING room. Rejoining with an id already
    /// seated is idempotent and returns the room unchanged.
    pub async fn join_room(
        &self,
        room_code: &str,
        player_id: &str,
        player_name: &str,
    ) -> JoinRoomResult {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&code) {
            Some(room) => room,
            None => {
                debug!(room_code = %code, "Join failed: room not found");
                return JoinRoomResult::RoomNotFound;
            }
        };

        if room.has_player(player_id) {
            debug!(room_code = %code, player_id = %player_id, "Player already seated");
            return JoinRoomResult::Joined(room.clone());
        }
        if room.status != RoomStatus::Waiting {
            debug!(room_code = %code, "Join failed: game already started");
            return JoinRoomResult::GameAlreadyStarted;
        }
        if room.is_full() {
            debug!(room_code = %code, "Join failed: room full");
            return JoinRoomResult::RoomFull;
        }

        room.players.push(PlayerModel::new(
            player_id.to_string(),
            player_name.to_string(),
        ));
        room.touch();

        info!(
            room_code = %code,
            player_id = %player_id,
            player_count = room.player_count(),
            "Player joined room"
        );
        JoinRoomResult::Joined(room.clone())
    }

    /// Deals round 1 and moves the room to PLAYING. Requires 3 or 4
    /// seated players.
    pub async fn start_game(&self, room_code: &str) -> StartGameResult {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&code) {
            Some(room) => room,
            None => return StartGameResult::RoomNotFound,
        };

        if room.status != RoomStatus::Waiting {
            return StartGameResult::AlreadyStarted;
        }
        let count = room.player_count();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return StartGameResult::WrongPlayerCount(count);
        }

        for player in &mut room.players {
            player.score = 0;
        }
        deal_round(room, RoundInfo::first());

        info!(
            room_code = %code,
            player_count = count,
            total_tricks = room.total_tricks,
            "Game started"
        );
        StartGameResult::Started(room.clone())
    }

    /// Deals the next round, or finalizes the game after round 6. Only
    /// valid from ROUND_END.
    pub async fn advance_round(&self, room_code: &str) -> AdvanceRoundResult {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&code) {
            Some(room) => room,
            None => return AdvanceRoundResult::RoomNotFound,
        };

        if room.status != RoomStatus::RoundEnd {
            return AdvanceRoundResult::RoundNotOver;
        }

        let next_round = room.round.round_number + 1;
        match RoundInfo::for_round(next_round) {
            None => {
                // Past round 6: scores stand, nothing more is dealt.
                room.status = RoomStatus::Finished;
                room.touch();
                info!(room_code = %code, "All rounds complete, game finished");
                AdvanceRoundResult::GameFinished(room.clone())
            }
            Some(round) => {
                deal_round(room, round);
                info!(
                    room_code = %code,
                    round = next_round,
                    rule = %room.round.rule,
                    "Advanced to next round"
                );
                AdvanceRoundResult::Dealt(room.clone())
            }
        }
    }

    /// Applies a play-card action through the game state machine.
    pub async fn play_card(&self, room_code: &str, player_id: &str, card: Card) -> PlayCardResult {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&code) {
            Some(room) => room,
            None => return PlayCardResult::RoomNotFound,
        };

        match logic::play_card(room, player_id, card) {
            Ok(()) => PlayCardResult::Played(room.clone()),
            Err(e) => {
                debug!(
                    room_code = %code,
                    player_id = %player_id,
                    reason = %e,
                    "Play rejected"
                );
                PlayCardResult::Rejected(e)
            }
        }
    }

    /// Updates a player's connection flag and last-seen timestamp. Never
    /// removes the player; removal happens via `expire_disconnected`.
    pub async fn update_connection(&self, room_code: &str, player_id: &str, connected: bool) {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        if let Some(room) = rooms.get_mut(&code) {
            if let Some(player) = room.player_mut(player_id) {
                player.connected = connected;
                player.last_seen = Utc::now();
                debug!(
                    room_code = %code,
                    player_id = %player_id,
                    connected = connected,
                    "Connection state changed"
                );
            }
        }
    }

    /// Re-keys a seated player to a new connection id, preserving all
    /// game state. The seat index is unchanged, so the turn pointer
    /// follows automatically; the host pointer is re-keyed too.
    pub async fn reconnect_player(
        &self,
        room_code: &str,
        old_id: &str,
        new_id: &str,
    ) -> Option<RoomModel> {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        let room = rooms.get_mut(&code)?;
        let player = room.player_mut(old_id)?;

        player.id = new_id.to_string();
        player.connected = true;
        player.last_seen = Utc::now();

        if room.host_id == old_id {
            room.host_id = new_id.to_string();
        }
        for trick_card in &mut room.current_trick {
            if trick_card.player_id == old_id {
                trick_card.player_id = new_id.to_string();
            }
        }
        room.touch();

        info!(
            room_code = %code,
            old_id = %old_id,
            new_id = %new_id,
            "Player reconnected"
        );
        Some(room.clone())
    }

    /// Removes players disconnected for longer than the grace period.
    /// Returns the removed ids; dropping a PLAYING room below 3 players
    /// forces it to FINISHED.
    pub async fn expire_disconnected(&self, room_code: &str, grace: Duration) -> Vec<String> {
        let code = normalize_room_code(room_code);
        let mut rooms = self.rooms.write().await;

        let room = match rooms.get_mut(&code) {
            Some(room) => room,
            None => return Vec::new(),
        };

        let now = Utc::now();
        let mut removed = Vec::new();
        room.players.retain(|player| {
            let overdue = !player.connected
                && now
                    .signed_duration_since(player.last_seen)
                    .to_std()
                    .unwrap_or_default()
                    > grace;
            if overdue {
                removed.push(player.id.clone());
            }
            !overdue
        });

        if removed.is_empty() {
            return removed;
        }

        if room.status == RoomStatus::Playing {
            if room.player_count() < MIN_PLAYERS {
                room.status = RoomStatus::Finished;
                info!(
                    room_code = %code,
                    remaining = room.player_count(),
                    "Too few players left, game finished"
                );
            } else if room.active_player_index >= room.player_count() {
                // Keep the turn pointer inside the shrunken seat list.
                room.active_player_index = 0;
            }
        }

        warn!(
            room_code = %code,
            removed = removed.len(),
            "Removed players past the disconnect grace period"
        );
        removed
    }

    /// Deletes rooms idle for longer than the threshold, regardless of
    /// status. Returns the deleted room codes.
    pub async fn sweep_expired_rooms(&self, threshold: Duration) -> Vec<String> {
        let mut rooms = self.rooms.write().await;
        let now = Utc::now();

        let expired: Vec<String> = rooms
            .values()
            .filter(|room| {
                now.signed_duration_since(room.last_activity_at)
                    .to_std()
                    .unwrap_or_default()
                    > threshold
            })
            .map(|room| room.code.clone())
            .collect();

        for code in &expired {
            rooms.remove(code);
            info!(room_code = %code, "Cleaned up expired room");
        }
        expired
    }

    pub async fn delete_room(&self, room_code: &str) -> bool {
        let code = normalize_room_code(room_code);
        let removed = self.rooms.write().await.remove(&code).is_some();
        if removed {
            info!(room_code = %code, "Room deleted");
        }
        removed
    }

    pub async fn get_room(&self, room_code: &str) -> Option<RoomModel> {
        let code = normalize_room_code(room_code);
        self.rooms.read().await.get(&code).cloned()
    }

    /// Consistent copy of every room, for snapshots.
    pub async fn list_rooms(&self) -> Vec<RoomModel> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Per-player filtered projection; `None` if the room is unknown.
    pub async fn client_state(&self, room_code: &str, player_id: &str) -> Option<ClientGameState> {
        let code = normalize_room_code(room_code);
        let rooms = self.rooms.read().await;
        rooms.get(&code).map(|room| view::client_state(room, player_id))
    }

    /// Final standings; `None` if the room is unknown or empty.
    pub async fn game_over_state(&self, room_code: &str) -> Option<GameOverPayload> {
        let code = normalize_room_code(room_code);
        let rooms = self.rooms.read().await;
        rooms.get(&code).and_then(view::game_over_state)
    }
}

/// Deals a round into the room: fresh sorted hands, per-round player
/// state cleared, trick and turn state reset, cumulative scores kept.
fn deal_round(room: &mut RoomModel, round: RoundInfo) {
    let hands = match rules::deal(room.player_count()) {
        Ok(hands) => hands,
        Err(e) => {
            // Caller validated the player count; bail without touching state.
            warn!(room_code = %room.code, error = %e, "Deal failed");
            return;
        }
    };

    let hand_size = hands[0].len() as u32;
    for (player, hand) in room.players.iter_mut().zip(hands) {
        player.hand = rules::sort_hand(&hand);
        player.round_score = 0;
        player.tricks_taken.clear();
    }

    room.round = round;
    room.status = RoomStatus::Playing;
    room.active_player_index = 0;
    room.current_trick.clear();
    room.lead_suit = None;
    room.trick_number = 1;
    room.total_tricks = hand_size;
    room.touch();
}
