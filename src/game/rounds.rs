use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::game::cards::{Card, Rank, Suit};

/// The six penalty rules, played in this order. Each is a pure scoring
/// function over the cards of one trick. The Salad is not an independent
/// rule: it is the sum of the other five applied to the same trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum RoundRule {
    #[serde(rename = "No Tricks")]
    NoTricks,
    #[serde(rename = "No Hearts")]
    NoHearts,
    #[serde(rename = "No Queens")]
    NoQueens,
    #[serde(rename = "No King of Spades")]
    NoKingOfSpades,
    #[serde(rename = "Last Trick")]
    LastTrick,
    #[serde(rename = "The Salad")]
    TheSalad,
}

impl fmt::Display for RoundRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RoundRule::NoTricks => "No Tricks",
                RoundRule::NoHearts => "No Hearts",
                RoundRule::NoQueens => "No Queens",
                RoundRule::NoKingOfSpades => "No King of Spades",
                RoundRule::LastTrick => "Last Trick",
                RoundRule::TheSalad => "The Salad",
            }
        )
    }
}

impl RoundRule {
    /// Penalty points the trick's winner collects under this rule.
    ///
    /// Trick size equals player count, so No Tricks pays 10 per captured
    /// card, not a flat 10 per trick.
    pub fn score_trick(&self, cards: &[Card], is_last_trick: bool) -> u32 {
        match self {
            RoundRule::NoTricks => 10 * cards.len() as u32,
            RoundRule::NoHearts => {
                10 * cards.iter().filter(|c| c.suit == Suit::Hearts).count() as u32
            }
            RoundRule::NoQueens => {
                25 * cards.iter().filter(|c| c.rank == Rank::Queen).count() as u32
            }
            RoundRule::NoKingOfSpades => {
                if cards.contains(&Card::new(Suit::Spades, Rank::King)) {
                    100
                } else {
                    0
                }
            }
            RoundRule::LastTrick => {
                if is_last_trick {
                    100
                } else {
                    0
                }
            }
            RoundRule::TheSalad => RoundRule::iter()
                .filter(|rule| *rule != RoundRule::TheSalad)
                .map(|rule| rule.score_trick(cards, is_last_trick))
                .sum(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RoundRule::NoTricks => "10 points per card taken",
            RoundRule::NoHearts => "10 points per Heart taken",
            RoundRule::NoQueens => "25 points per Queen taken",
            RoundRule::NoKingOfSpades => "100 points for taking the King of Spades",
            RoundRule::LastTrick => "100 points for taking the last trick",
            RoundRule::TheSalad => "All previous rules combined!",
        }
    }
}

/// One entry of the fixed six-round schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    pub round_number: u8,
    pub rule: RoundRule,
}

pub const TOTAL_ROUNDS: u8 = 6;

const SCHEDULE: [RoundRule; TOTAL_ROUNDS as usize] = [
    RoundRule::NoTricks,
    RoundRule::NoHearts,
    RoundRule::NoQueens,
    RoundRule::NoKingOfSpades,
    RoundRule::LastTrick,
    RoundRule::TheSalad,
];

impl RoundInfo {
    /// Descriptor for a round number in 1..=6.
    pub fn for_round(round_number: u8) -> Option<RoundInfo> {
        if round_number == 0 || round_number > TOTAL_ROUNDS {
            return None;
        }
        Some(RoundInfo {
            round_number,
            rule: SCHEDULE[(round_number - 1) as usize],
        })
    }

    pub fn first() -> RoundInfo {
        RoundInfo {
            round_number: 1,
            rule: SCHEDULE[0],
        }
    }
}
