//! Pruning of moves that cannot appear in a minimum solution.
//!
//! Consider a move at time T0 from pile X to pile Y, and a later candidate
//! that moves from Y to Z. If no intervening move changed Y or Z and both
//! moves carry the same cards, the candidate's effect was already available
//! at T0 as a direct X-to-Z move, so the candidate does in two moves what
//! another sequence does in one, and can be dropped. Since nothing says X
//! cannot equal Z, the test also catches moves that exactly reverse a
//! previous move.

use smallvec::{Array, SmallVec};

use crate::types::{MoveSequence, MoveSpec, PileId};

enum Verdict {
    Skippable,
    Distinct,
    KeepLooking,
}

fn pair_test(prev: MoveSpec, trial: MoveSpec) -> Verdict {
    // We are looking back from the trial move (Y -> Z) for a T0 move
    // (X -> Y). A candidate T0 move is one that moved onto our from-pile.
    let y = trial.from();
    let z = trial.to();
    if prev.to() == y {
        if prev.from() == z && prev.flips_top_card() {
            // X == Z and the X-to-Y move turned a tableau card face up,
            // so pile Z changed since T0.
            return Verdict::Distinct;
        }
        return if prev.n_cards() == trial.n_cards() {
            Verdict::Skippable
        } else {
            Verdict::Distinct
        };
    }
    // An intervening move that touched Y or Z breaks the equivalence.
    if prev.to() == z || prev.from() == z || prev.from() == y {
        return Verdict::Distinct;
    }
    Verdict::KeepLooking
}

/// True if `trial`, combined with some earlier move in `history`, does in
/// two moves what another sequence does in one.
pub fn skippable_move(trial: MoveSpec, history: &MoveSequence) -> bool {
    let y = trial.from();
    if y == PileId::Stock || y == PileId::Waste {
        return false;
    }
    for prev in history.iter().rev() {
        if prev.is_ladder_move() {
            // A ladder move counts as two prior moves: first the implied
            // move to the foundation, then the tableau-to-tableau move.
            let foundation_leg = MoveSpec::non_stock_move(
                prev.from(),
                prev.ladder_pile(),
                1,
                prev.from_up_count() - prev.n_cards(),
            )
            .with_flips_top_card(prev.flips_top_card());
            match pair_test(foundation_leg, trial) {
                Verdict::Skippable => return true,
                Verdict::Distinct => return false,
                Verdict::KeepLooking => {}
            }
            // The flip belongs to the foundation leg, not the tableau leg.
            match pair_test(prev.with_flips_top_card(false), trial) {
                Verdict::Skippable => return true,
                Verdict::Distinct => return false,
                Verdict::KeepLooking => {}
            }
        } else {
            match pair_test(prev, trial) {
                Verdict::Skippable => return true,
                Verdict::Distinct => return false,
                Verdict::KeepLooking => {}
            }
        }
    }
    false
}

/// Drop every candidate the pair test proves non-optimal.
pub(crate) fn filter_skippable<A>(moves: &mut SmallVec<A>, history: &MoveSequence)
where
    A: Array<Item = MoveSpec>,
{
    moves.retain(|mv| !skippable_move(*mv, history));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(moves: &[MoveSpec]) -> MoveSequence {
        let mut s = MoveSequence::new();
        for &mv in moves {
            s.push_back(mv);
        }
        s
    }

    #[test]
    fn exact_reversal_is_skippable() {
        let forward = MoveSpec::non_stock_move(PileId::Tableau1, PileId::Tableau2, 2, 3);
        let reverse = MoveSpec::non_stock_move(PileId::Tableau2, PileId::Tableau1, 2, 3);
        assert!(skippable_move(reverse, &seq(&[forward])));
    }

    #[test]
    fn chained_move_with_same_cards_is_skippable() {
        let first = MoveSpec::non_stock_move(PileId::Tableau1, PileId::Tableau2, 2, 3);
        let second = MoveSpec::non_stock_move(PileId::Tableau2, PileId::Tableau3, 2, 5);
        assert!(skippable_move(second, &seq(&[first])));
    }

    #[test]
    fn different_card_count_is_distinct() {
        let first = MoveSpec::non_stock_move(PileId::Tableau1, PileId::Tableau2, 2, 3);
        let second = MoveSpec::non_stock_move(PileId::Tableau2, PileId::Tableau3, 3, 5);
        assert!(!skippable_move(second, &seq(&[first])));
    }

    #[test]
    fn intervening_change_to_target_is_distinct() {
        let first = MoveSpec::non_stock_move(PileId::Tableau1, PileId::Tableau2, 2, 3);
        let touches_z = MoveSpec::non_stock_move(PileId::Waste, PileId::Tableau3, 1, 0);
        let second = MoveSpec::non_stock_move(PileId::Tableau2, PileId::Tableau3, 2, 5);
        assert!(!skippable_move(second, &seq(&[first, touches_z])));
    }

    #[test]
    fn flip_on_reversal_target_is_distinct() {
        // Moving back would land on the newly revealed card, a different
        // position from T0.
        let forward = MoveSpec::non_stock_move(PileId::Tableau1, PileId::Tableau2, 2, 3)
            .with_flips_top_card(true);
        let reverse = MoveSpec::non_stock_move(PileId::Tableau2, PileId::Tableau1, 2, 3);
        assert!(!skippable_move(reverse, &seq(&[forward])));
    }

    #[test]
    fn moves_from_talon_are_never_skippable() {
        let prev = MoveSpec::non_stock_move(PileId::Tableau1, PileId::Waste, 1, 1);
        let trial = MoveSpec::non_stock_move(PileId::Waste, PileId::Tableau2, 1, 0);
        assert!(!skippable_move(trial, &seq(&[prev])));
    }
}
