use serde::{Deserialize, Serialize};

use crate::game::cards::{Card, Suit};
use crate::game::rules;
use crate::room::models::{PlayerModel, RoomModel, RoomStatus, TrickCard};

/// Public view of one seat: no hand contents, only the count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientPlayer {
    pub id: String,
    pub name: String,
    pub hand_count: usize,
    pub score: u32,
    pub round_score: u32,
    pub trick_count: usize,
    pub connected: bool,
}

impl ClientPlayer {
    fn from_player(player: &PlayerModel) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            hand_count: player.hand_count(),
            score: player.score,
            round_score: player.round_score,
            trick_count: player.tricks_taken.len(),
            connected: player.connected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_number: u8,
    pub rule_name: String,
    pub description: String,
}

/// Everything one player is allowed to see. This projection is the only
/// room state that ever leaves the server, so opponent hands appear here
/// as counts and nowhere as cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientGameState {
    pub room_code: String,
    pub status: RoomStatus,
    pub round: RoundSummary,
    pub players: Vec<ClientPlayer>,
    pub current_trick: Vec<TrickCard>,
    pub active_player_index: usize,
    pub lead_suit: Option<Suit>,
    pub my_player_id: String,
    pub my_hand: Vec<Card>,
    pub trick_number: u32,
    pub total_tricks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverPayload {
    pub winner: ClientPlayer,
    pub final_scores: Vec<ClientPlayer>,
}

/// Projects room state for one player: their own hand sorted for display,
/// every other hand reduced to a count.
pub fn client_state(room: &RoomModel, player_id: &str) -> ClientGameState {
    let my_hand = room
        .player(player_id)
        .map(|p| rules::sort_hand(&p.hand))
        .unwrap_or_default();

    ClientGameState {
        room_code: room.code.clone(),
        status: room.status,
        round: RoundSummary {
            round_number: room.round.round_number,
            rule_name: room.round.rule.to_string(),
            description: room.round.rule.description().to_string(),
        },
        players: room.players.iter().map(ClientPlayer::from_player).collect(),
        current_trick: room.current_trick.clone(),
        active_player_index: room.active_player_index,
        lead_suit: room.lead_suit,
        my_player_id: player_id.to_string(),
        my_hand,
        trick_number: room.trick_number,
        total_tricks: room.total_tricks,
    }
}

/// Final standings, ascending by cumulative score. Penalty scoring: the
/// lowest total wins. `None` only for a room with no seats left.
pub fn game_over_state(room: &RoomModel) -> Option<GameOverPayload> {
    let mut standings: Vec<ClientPlayer> =
        room.players.iter().map(ClientPlayer::from_player).collect();
    standings.sort_by_key(|p| p.score);

    let winner = standings.first()?.clone();
    Some(GameOverPayload {
        winner,
        final_scores: standings,
    })
}
