pub mod basic;

pub use basic::{Card, CardParseError, Rank, Suit};
