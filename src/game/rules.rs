use rand::seq::SliceRandom;
use tracing::warn;

use crate::game::cards::{Card, Rank, Suit};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DealError {
    #[error("Cannot deal to {0} players (need 3 or 4)")]
    UnsupportedPlayerCount(usize),
}

/// Deals hands for a new round. Four players split the full deck 13 each;
/// three players play without the two of diamonds, 17 each. Hands are
/// contiguous slices of the shuffled deck, not round-robin.
pub fn deal(player_count: usize) -> Result<Vec<Vec<Card>>, DealError> {
    if !(3..=4).contains(&player_count) {
        return Err(DealError::UnsupportedPlayerCount(player_count));
    }

    let mut deck = Card::all_cards();
    if player_count == 3 {
        deck.retain(|c| *c != Card::new(Suit::Diamonds, Rank::Two));
    }
    deck.shuffle(&mut rand::rng());

    let cards_per_player = deck.len() / player_count;
    let hands = (0..player_count)
        .map(|_| deck.drain(0..cards_per_player).collect())
        .collect();

    Ok(hands)
}

/// Follow suit if able: a card is playable iff it is held and either no
/// suit has been led, it matches the lead suit, or the hand is void in it.
pub fn can_play_card(card: Card, hand: &[Card], lead_suit: Option<Suit>) -> bool {
    if !hand.contains(&card) {
        return false;
    }

    match lead_suit {
        None => true,
        Some(lead) => card.suit == lead || !hand.iter().any(|c| c.suit == lead),
    }
}

/// The playable subset of a hand, for client-side hinting only; the
/// authoritative check is `can_play_card` at play time.
pub fn valid_cards(hand: &[Card], lead_suit: Option<Suit>) -> Vec<Card> {
    if let Some(lead) = lead_suit {
        let matching: Vec<Card> = hand.iter().copied().filter(|c| c.suit == lead).collect();
        if !matching.is_empty() {
            return matching;
        }
    }
    hand.to_vec()
}

/// Index of the winning card: highest rank among cards of the lead suit.
/// Off-suit cards never win. A trick with no lead-suit card cannot happen
/// under follow-suit rules; if it does, the first card wins.
pub fn trick_winner(cards: &[Card], lead_suit: Suit) -> usize {
    let mut winner = None;

    for (index, card) in cards.iter().enumerate() {
        if card.suit != lead_suit {
            continue;
        }
        match winner {
            Some((_, best_rank)) if card.rank <= best_rank => {}
            _ => winner = Some((index, card.rank)),
        }
    }

    match winner {
        Some((index, _)) => index,
        None => {
            warn!(lead_suit = %lead_suit, "Trick contains no card of the lead suit");
            0
        }
    }
}

/// Sorts a hand for display: suit (clubs, diamonds, hearts, spades) then
/// rank ascending. Never affects game logic.
pub fn sort_hand(hand: &[Card]) -> Vec<Card> {
    let mut sorted = hand.to_vec();
    sorted.sort();
    sorted
}
