use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::cards::{Card, Suit};
use crate::game::rounds::RoundInfo;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 4;

/// Room lifecycle. WAITING accepts joins; PLAYING runs tricks in place;
/// ROUND_END waits for an explicit advance; FINISHED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    Playing,
    RoundEnd,
    Finished,
}

/// One seat in a room. The id is the current connection id; `hand` is
/// visible only through the owning player's projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerModel {
    pub id: String,
    pub name: String,
    pub hand: Vec<Card>,
    pub score: u32,
    pub round_score: u32,
    pub tricks_taken: Vec<Vec<Card>>,
    pub connected: bool,
    pub last_seen: DateTime<Utc>,
}

impl PlayerModel {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            hand: Vec::new(),
            score: 0,
            round_score: 0,
            tricks_taken: Vec::new(),
            connected: true,
            last_seen: Utc::now(),
        }
    }

    pub fn hand_count(&self) -> usize {
        self.hand.len()
    }
}

/// One card played into the current trick. Order matters for display;
/// winner determination only looks at the cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrickCard {
    pub player_id: String,
    pub card: Card,
}

/// The aggregate root: all state of one game room. Seat order is turn
/// order, seat 0 is the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub code: String,
    pub status: RoomStatus,
    pub round: RoundInfo,
    pub players: Vec<PlayerModel>,
    pub current_trick: Vec<TrickCard>,
    pub active_player_index: usize,
    pub lead_suit: Option<Suit>,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub trick_number: u32,
    pub total_tricks: u32,
}

impl RoomModel {
    /// Creates a fresh WAITING room containing only the host.
    pub fn new(code: String, host_id: String, host_name: String) -> Self {
        let now = Utc::now();
        Self {
            code,
            status: RoomStatus::Waiting,
            round: RoundInfo::first(),
            players: vec![PlayerModel::new(host_id.clone(), host_name)],
            current_trick: Vec::new(),
            active_player_index: 0,
            lead_suit: None,
            host_id,
            created_at: now,
            last_activity_at: now,
            trick_number: 0,
            total_tricks: 0,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerModel> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerModel> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    /// Records activity on the room, for the staleness sweep.
    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}
