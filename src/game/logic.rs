use tracing::{debug, warn};

use crate::game::cards::Card;
use crate::game::rules;
use crate::room::models::{RoomModel, RoomStatus, TrickCard};

/// Why a play was rejected. Messages are surfaced to the player verbatim.
/// A rejected play leaves the room untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayError {
    #[error("Game is not in progress")]
    NotInProgress,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("You do not have that card")]
    CardNotHeld,
    #[error("You must follow suit")]
    MustFollowSuit,
}

/// Applies one play-card action to a room: validates turn, ownership and
/// suit-following, appends to the trick, and resolves the trick once every
/// seat has played. Round end folds round scores into cumulative scores
/// and parks the room in ROUND_END for an explicit advance.
pub fn play_card(room: &mut RoomModel, player_id: &str, card: Card) -> Result<(), PlayError> {
    if room.status != RoomStatus::Playing {
        return Err(PlayError::NotInProgress);
    }

    let active = room
        .players
        .get(room.active_player_index)
        .ok_or(PlayError::NotYourTurn)?;
    if active.id != player_id {
        return Err(PlayError::NotYourTurn);
    }
    if !active.hand.contains(&card) {
        return Err(PlayError::CardNotHeld);
    }
    if !rules::can_play_card(card, &active.hand, room.lead_suit) {
        return Err(PlayError::MustFollowSuit);
    }

    // All checks passed; from here on the play always completes.
    let active = &mut room.players[room.active_player_index];
    active.hand.retain(|c| *c != card);

    room.current_trick.push(TrickCard {
        player_id: player_id.to_string(),
        card,
    });
    if room.current_trick.len() == 1 {
        room.lead_suit = Some(card.suit);
    }

    if room.current_trick.len() == room.players.len() {
        resolve_trick(room);
    } else {
        room.active_player_index = (room.active_player_index + 1) % room.players.len();
    }

    room.touch();
    Ok(())
}

/// Resolves a completed trick: the winner captures the cards and the
/// penalty points, then leads the next trick or the round ends.
fn resolve_trick(room: &mut RoomModel) {
    let Some(lead_suit) = room.lead_suit else {
        warn!(room_code = %room.code, "Trick resolved without a lead suit");
        return;
    };

    let cards: Vec<Card> = room.current_trick.iter().map(|tc| tc.card).collect();
    let winner_entry = rules::trick_winner(&cards, lead_suit);
    let winner_id = room.current_trick[winner_entry].player_id.clone();
    let winner_index = room.player_index(&winner_id).unwrap_or(0);

    let is_last_trick = room.trick_number == room.total_tricks;
    let points = room.round.rule.score_trick(&cards, is_last_trick);

    debug!(
        room_code = %room.code,
        winner = %winner_id,
        points = points,
        trick_number = room.trick_number,
        "Trick resolved"
    );

    let winner = &mut room.players[winner_index];
    winner.tricks_taken.push(cards);
    winner.round_score += points;

    let round_over = room.players.iter().all(|p| p.hand.is_empty());
    if round_over {
        end_round(room);
    } else {
        room.current_trick.clear();
        room.lead_suit = None;
        room.active_player_index = winner_index;
        room.trick_number += 1;
    }
}

fn end_round(room: &mut RoomModel) {
    for player in &mut room.players {
        player.score += player.round_score;
    }
    room.current_trick.clear();
    room.lead_suit = None;
    room.status = RoomStatus::RoundEnd;

    debug!(
        room_code = %room.code,
        round = room.round.round_number,
        "Round complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{Rank, Suit};
    use crate::game::rounds::RoundInfo;
    use crate::room::models::PlayerModel;

    fn card(s: &str) -> Card {
        Card::from_string(s).unwrap()
    }

    fn cards(symbols: &[&str]) -> Vec<Card> {
        symbols.iter().map(|s| card(s)).collect()
    }

    /// A PLAYING room mid-round with explicit hands, seat 0 to act.
    fn playing_room(hands: &[&[&str]]) -> RoomModel {
        let mut room = RoomModel::new(
            "TEST".to_string(),
            "p0".to_string(),
            "Player 0".to_string(),
        );
        room.players.clear();
        for (i, hand) in hands.iter().enumerate() {
            let mut player = PlayerModel::new(format!("p{}", i), format!("Player {}", i));
            player.hand = cards(hand);
            room.players.push(player);
        }
        room.host_id = "p0".to_string();
        room.status = RoomStatus::Playing;
        room.round = RoundInfo::for_round(1).unwrap();
        room.active_player_index = 0;
        room.trick_number = 1;
        room.total_tricks = hands[0].len() as u32;
        room
    }

    #[test]
    fn test_rejects_play_out_of_turn() {
        let mut room = playing_room(&[&["C2"], &["C5"], &["C9"]]);
        let before = room.clone();

        let result = play_card(&mut room, "p1", card("C5"));
        assert_eq!(result, Err(PlayError::NotYourTurn));

        // Nothing changed
        assert_eq!(room.players[1].hand, before.players[1].hand);
        assert!(room.current_trick.is_empty());
        assert_eq!(room.active_player_index, 0);
    }

    #[test]
    fn test_rejects_card_not_held() {
        let mut room = playing_room(&[&["C2"], &["C5"], &["C9"]]);
        let result = play_card(&mut room, "p0", card("SA"));
        assert_eq!(result, Err(PlayError::CardNotHeld));
        assert_eq!(room.players[0].hand, cards(&["C2"]));
    }

    #[test]
    fn test_rejects_breaking_suit_when_able_to_follow() {
        let mut room = playing_room(&[&["C2", "H4"], &["C5", "C9"], &["C7", "H9"]]);

        play_card(&mut room, "p0", card("C2")).unwrap();

        let result = play_card(&mut room, "p1", card("C9"));
        assert!(result.is_ok());

        // p2 holds a club and tries the heart instead
        let result = play_card(&mut room, "p2", card("H9"));
        assert_eq!(result, Err(PlayError::MustFollowSuit));
        assert_eq!(room.current_trick.len(), 2);
        assert_eq!(room.players[2].hand.len(), 2);
    }

    #[test]
    fn test_rejects_play_when_not_playing() {
        let mut room = playing_room(&[&["C2"], &["C5"], &["C9"]]);
        room.status = RoomStatus::Waiting;
        assert_eq!(
            play_card(&mut room, "p0", card("C2")),
            Err(PlayError::NotInProgress)
        );
    }

    #[test]
    fn test_first_card_sets_lead_suit_and_turn_advances() {
        let mut room = playing_room(&[&["H4", "C2"], &["C5", "H9"], &["C7", "H2"]]);

        play_card(&mut room, "p0", card("H4")).unwrap();

        assert_eq!(room.lead_suit, Some(Suit::Hearts));
        assert_eq!(room.current_trick.len(), 1);
        assert_eq!(room.active_player_index, 1);
        assert!(!room.players[0].hand.contains(&card("H4")));
    }

    #[test]
    fn test_trick_resolution_awards_cards_and_points() {
        // Round 1 is No Tricks: 10 points per captured card.
        let mut room = playing_room(&[&["H4", "C2"], &["H9", "C5"], &["H2", "C7"]]);

        play_card(&mut room, "p0", card("H4")).unwrap();
        play_card(&mut room, "p1", card("H9")).unwrap();
        play_card(&mut room, "p2", card("H2")).unwrap();

        // p1 took the trick with the highest heart
        assert_eq!(room.players[1].tricks_taken.len(), 1);
        assert_eq!(room.players[1].round_score, 30);
        assert_eq!(room.players[1].tricks_taken[0], cards(&["H4", "H9", "H2"]));

        // Winner leads the next trick
        assert_eq!(room.active_player_index, 1);
        assert!(room.current_trick.is_empty());
        assert!(room.lead_suit.is_none());
        assert_eq!(room.trick_number, 2);
        assert_eq!(room.status, RoomStatus::Playing);
    }

    #[test]
    fn test_off_suit_dump_never_wins() {
        let mut room = playing_room(&[&["D4", "C2"], &["SA", "C5"], &["D9", "C7"]]);

        play_card(&mut room, "p0", card("D4")).unwrap();
        // p1 is void in diamonds, dumps the ace of spades
        play_card(&mut room, "p1", card("SA")).unwrap();
        play_card(&mut room, "p2", card("D9")).unwrap();

        assert_eq!(room.players[2].tricks_taken.len(), 1);
        assert_eq!(room.active_player_index, 2);
    }

    #[test]
    fn test_round_ends_when_hands_empty() {
        let mut room = playing_room(&[&["H4"], &["H9"], &["H2"]]);
        room.players[0].round_score = 0;

        play_card(&mut room, "p0", card("H4")).unwrap();
        play_card(&mut room, "p1", card("H9")).unwrap();
        play_card(&mut room, "p2", card("H2")).unwrap();

        assert_eq!(room.status, RoomStatus::RoundEnd);
        // Last-trick scoring applied (round 1: 10 per card) and folded into totals
        assert_eq!(room.players[1].round_score, 30);
        assert_eq!(room.players[1].score, 30);
        assert_eq!(room.players[0].score, 0);
        assert!(room.current_trick.is_empty());
        assert!(room.lead_suit.is_none());
    }

    #[test]
    fn test_last_trick_flag_reaches_scoring() {
        // Round 5 is Last Trick: 100 points only on the final trick.
        let mut room = playing_room(&[&["H4", "C2"], &["H9", "C5"], &["H2", "C7"]]);
        room.round = RoundInfo::for_round(5).unwrap();

        play_card(&mut room, "p0", card("H4")).unwrap();
        play_card(&mut room, "p1", card("H9")).unwrap();
        play_card(&mut room, "p2", card("H2")).unwrap();
        assert_eq!(room.players[1].round_score, 0); // trick 1 of 2

        play_card(&mut room, "p1", card("C5")).unwrap();
        play_card(&mut room, "p2", card("C7")).unwrap();
        play_card(&mut room, "p0", card("C2")).unwrap();

        assert_eq!(room.status, RoomStatus::RoundEnd);
        assert_eq!(room.players[2].round_score, 100);
        assert_eq!(room.players[2].score, 100);
    }

    #[test]
    fn test_hand_plus_captured_matches_dealt_cards() {
        let mut room = playing_room(&[&["H4", "C2"], &["H9", "C5"], &["H2", "C7"]]);
        let dealt: usize = room.players.iter().map(|p| p.hand.len()).sum();

        play_card(&mut room, "p0", card("H4")).unwrap();
        play_card(&mut room, "p1", card("H9")).unwrap();

        let in_hands: usize = room.players.iter().map(|p| p.hand.len()).sum();
        let captured: usize = room
            .players
            .iter()
            .flat_map(|p| &p.tricks_taken)
            .map(|t| t.len())
            .sum();
        assert_eq!(in_hands + captured + room.current_trick.len(), dealt);

        play_card(&mut room, "p2", card("H2")).unwrap();

        let in_hands: usize = room.players.iter().map(|p| p.hand.len()).sum();
        let captured: usize = room
            .players
            .iter()
            .flat_map(|p| &p.tricks_taken)
            .map(|t| t.len())
            .sum();
        assert_eq!(in_hands + captured, dealt);
    }

    #[test]
    fn test_queen_of_spades_playable_any_time_in_queens_round() {
        // No special restrictions beyond follow-suit in any round.
        let mut room = playing_room(&[&["C2", "SQ"], &["C5", "C9"], &["C7", "S2"]]);
        room.round = RoundInfo::for_round(3).unwrap();

        play_card(&mut room, "p0", card("C2")).unwrap();
        play_card(&mut room, "p1", card("C9")).unwrap();
        play_card(&mut room, "p2", card("C7")).unwrap();

        // p1 won and leads; p0 follows with the queen when void
        play_card(&mut room, "p1", card("C5")).unwrap();
        play_card(&mut room, "p2", card("S2")).unwrap();
        play_card(&mut room, "p0", card("SQ")).unwrap();

        assert_eq!(room.status, RoomStatus::RoundEnd);
        // p1 captured the queen in the last trick: 25 points
        assert_eq!(room.players[1].round_score, 25);
    }
}
