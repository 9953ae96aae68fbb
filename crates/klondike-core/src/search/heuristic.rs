//! Lower bound on the number of moves left to win.

use crate::game::Game;
use crate::types::Card;

/// How many cards sit above a lower-ranked card of the same suit. The lower
/// one must reach the foundation first, but it is buried.
fn misorder_count<'a>(cards: impl Iterator<Item = &'a Card>) -> u32 {
    let mut min_ranks = [14u8; 4];
    let mut result = 0;
    for card in cards {
        let rank = card.rank();
        let suit = card.suit().index();
        if rank < min_ranks[suit] {
            min_ranks[suit] = rank;
        } else {
            result += 1;
        }
    }
    result
}

/// A lower bound on the moves required to finish the game.
///
/// The result never decreases by more than one across any single user move,
/// so the bound plus the move count made so far never decreases: the
/// consistency the A* cutoffs rely on. If it could, the search might stop
/// too soon.
///
/// Counted: every talon card must be played (1 each), every remaining stock
/// card must first be drawn (in batches of the draw setting), and every
/// tableau card must be played, plus the out-of-order penalties that force
/// extra trips. The waste misorder term is sound only under draw 1; with a
/// larger draw setting undrawing can reorder the waste and break
/// consistency, so it is skipped.
pub fn minimum_moves_left(game: &Game) -> u32 {
    let draw = game.draw_setting();
    let stock_size = game.stock().len() as u32;
    let talon_count = game.waste().len() as u32 + stock_size;

    let mut result = talon_count + stock_size.div_ceil(draw);

    if draw == 1 {
        result += misorder_count(game.waste().cards().iter());
    }

    for pile in game.tableau() {
        if !pile.is_empty() {
            let down_count = pile.len() - pile.up_count();
            result += pile.len() as u32 + misorder_count(pile.cards()[..down_count + 1].iter());
        }
    }
    result
}
