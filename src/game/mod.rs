// Public API
pub use cards::{Card, CardParseError, Rank, Suit};
pub use logic::{play_card, PlayError};
pub use rounds::{RoundInfo, RoundRule, TOTAL_ROUNDS};
pub use view::{client_state, game_over_state, ClientGameState, ClientPlayer, GameOverPayload};

// Internal modules
pub mod cards;
pub mod logic;
pub mod rounds;
pub mod rules;
pub mod view;
