//! Compact value types shared by the game engine and the search.

mod card;
mod moves;
mod pile;

pub use card::{Card, ParseCardError, Rank, Suit, ACE, KING};
pub use moves::{make_xmoves, move_count, MoveSequence, MoveSpec, XMove, SEQUENCE_CAPACITY};
pub use pile::{Pile, PileId};

/// Number of ranks per suit.
pub const CARDS_PER_SUIT: usize = 13;
/// Number of suits per deck.
pub const SUITS_PER_DECK: usize = 4;
/// Number of cards in a full deck.
pub const CARDS_PER_DECK: usize = CARDS_PER_SUIT * SUITS_PER_DECK;
/// Number of tableau piles.
pub const TABLEAU_SIZE: usize = 7;
/// Number of foundation piles.
pub const FOUNDATION_SIZE: usize = 4;
