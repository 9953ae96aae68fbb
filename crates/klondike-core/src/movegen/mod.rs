//! Pruned legal-move enumeration.
//!
//! [`Game::available_moves`] returns at most a handful of next moves. Moves
//! that put a card on a short foundation pile are *dominant*: if the game
//! can be won from here, some minimum solution starts with one of them, so
//! they are generated together, cached, and returned one at a time; the
//! worker extends its stem deterministically before it ever branches.
//! Everything else is generated in one batch and pruned hard: tableau moves
//! must flip a card, free a needed column, or expose a foundation-ready
//! card; talon moves are emitted per reachable waste top rather than per
//! draw; foundation-to-tableau moves only when their reversal would not be
//! dominant.

mod filter;

pub use filter::skippable_move;

use smallvec::SmallVec;

use crate::game::{DominantCache, Game};
use crate::types::{Card, MoveSequence, MoveSpec, PileId, Suit, CARDS_PER_SUIT, KING};

/// Generation buffer, sized so the worst observed fan-out stays inline.
pub type MoveList = SmallVec<[MoveSpec; 64]>;

/// A playable talon card: the draws needed to surface it and whether the
/// path crosses a recycle.
struct TalonFuture {
    card: Card,
    n_moves: u32,
    draw_count: i32,
    recycle: bool,
}

/// Simulates draws and recycles against the real waste and stock without
/// touching them; exposes the card a given talon position would put on top
/// of the waste.
struct TalonSim<'a> {
    waste: &'a [Card],
    stock: &'a [Card],
    waste_size: usize,
    stock_size: usize,
}

impl<'a> TalonSim<'a> {
    fn new(game: &'a Game) -> TalonSim<'a> {
        TalonSim {
            waste: game.waste().cards(),
            stock: game.stock().cards(),
            waste_size: game.waste().len(),
            stock_size: game.stock().len(),
        }
    }

    fn cycle(&mut self) {
        self.stock_size += self.waste_size;
        self.waste_size = 0;
    }

    fn draw(&mut self, n: usize) {
        let n = n.min(self.stock_size);
        self.waste_size += n;
        self.stock_size -= n;
    }

    fn top_card(&self) -> Card {
        if self.waste_size <= self.waste.len() {
            self.waste[self.waste_size - 1]
        } else {
            self.stock[self.stock.len() - (self.waste_size - self.waste.len())]
        }
    }
}

/// Every card playable from the talon, with the move count and (possibly
/// negative) draw count needed to surface it. Honors the recycle limit; at
/// most one recycle is explored per generation pass.
fn talon_cards(game: &Game) -> SmallVec<[TalonFuture; 24]> {
    let mut result = SmallVec::new();
    if game.waste().is_empty() && game.stock().is_empty() {
        return result;
    }

    let mut talon = TalonSim::new(game);
    let original_waste_size = talon.waste_size;
    let draw_setting = game.draw_setting() as usize;
    let mut n_moves = 0u32;
    let mut n_recycles = 0u32;
    let max_recycles = game.recycle_limit().saturating_sub(game.recycle_count()).min(1);

    loop {
        if talon.waste_size > 0 {
            result.push(TalonFuture {
                card: talon.top_card(),
                n_moves,
                draw_count: talon.waste_size as i32 - original_waste_size as i32,
                recycle: n_recycles > 0,
            });
        }
        if talon.stock_size > 0 {
            n_moves += 1;
            talon.draw(draw_setting);
        } else {
            n_recycles += 1;
            talon.cycle();
        }
        if talon.waste_size == original_waste_size || n_recycles > max_recycles {
            break;
        }
    }
    result
}

impl Game {
    /// The available moves that survive pruning. Dominant moves come back
    /// one at a time; others, all at once.
    pub fn available_moves(&mut self, history: &MoveSequence) -> MoveList {
        let mut avail = MoveList::new();
        let min_foundation = self.min_foundation_size();
        if min_foundation == CARDS_PER_SUIT {
            return avail; // game won
        }

        if self.dominant_cache.is_empty() {
            let mut cache = std::mem::take(&mut self.dominant_cache);
            self.dominant_available_moves(&mut cache, min_foundation);
            filter::filter_skippable(&mut cache, history);
            self.dominant_cache = cache;
        }
        if let Some(mv) = self.dominant_cache.pop() {
            avail.push(mv);
            return avail;
        }

        self.moves_from_tableau(&mut avail);
        self.moves_from_talon(&mut avail, min_foundation);
        self.moves_from_foundation(&mut avail, min_foundation);
        filter::filter_skippable(&mut avail, history);
        avail
    }

    /// Moves from waste, tableau, or the top of the stock to a short
    /// foundation pile, one no more than one card taller than the
    /// shortest. If the game can be won from this position, no sequence
    /// that skips such a move beats the shortest sequence that makes it.
    fn dominant_available_moves(&self, moves: &mut DominantCache, min_foundation_size: usize) {
        let waste_and_tableau = std::iter::once((PileId::Waste, self.waste())).chain(
            self.tableau()
                .iter()
                .enumerate()
                .map(|(i, pile)| (PileId::tableau(i), pile)),
        );
        for (from_id, pile) in waste_and_tableau {
            if pile.is_empty() {
                continue;
            }
            let card = pile.back();
            if card.rank() as usize <= min_foundation_size + 1 && self.can_move_to_foundation(card) {
                let to = PileId::foundation(card.suit());
                let up = if from_id == PileId::Waste { 0 } else { pile.up_count() };
                moves.push(
                    MoveSpec::non_stock_move(from_id, to, 1, up)
                        .with_flips_top_card(from_id.is_tableau() && up == 1 && pile.len() > 1),
                );
            }
        }
        if self.draw_setting() == 1 && !self.stock().is_empty() {
            let card = self.stock().back();
            if card.rank() as usize <= min_foundation_size + 1 && self.can_move_to_foundation(card) {
                // Draw one card, then play it: two moves.
                moves.push(MoveSpec::stock_move(PileId::foundation(card.suit()), 2, 1, false));
            }
        }
    }

    fn moves_from_tableau(&self, moves: &mut MoveList) {
        for (fi, from_pile) in self.tableau().iter().enumerate() {
            if from_pile.is_empty() {
                continue;
            }
            let from_id = PileId::tableau(fi);
            let from_tip = from_pile.back();
            let from_base = from_pile.up_base();
            let up_count = from_pile.up_count();

            if self.can_move_to_foundation(from_tip) {
                let to = PileId::foundation(from_tip.suit());
                moves.push(
                    MoveSpec::non_stock_move(from_id, to, 1, up_count)
                        .with_flips_top_card(up_count == 1 && from_pile.len() > 1),
                );
            }

            // Moves between tableau piles may carry multiple cards. We move
            // from one tableau pile to another only to (a) move all the
            // face-up cards in order to flip a face-down card or make a
            // useful empty column, or (b) uncover a face-up card that can go
            // to a foundation pile.
            let mut king_moved = false; // one king to empties per from-pile
            for (ti, to_pile) in self.tableau().iter().enumerate() {
                if ti == fi {
                    continue;
                }
                let to_id = PileId::tableau(ti);
                if to_pile.is_empty() {
                    if !king_moved && from_base.rank() == KING && from_pile.len() > up_count {
                        // A king heads this pile's face-up run and covers at
                        // least one face-down card.
                        moves.push(
                            MoveSpec::non_stock_move(from_id, to_id, up_count, up_count)
                                .with_flips_top_card(true),
                        );
                        king_moved = true;
                    }
                } else {
                    let card_to_cover = to_pile.back();
                    let to_rank = card_to_cover.rank() as usize;
                    if (from_tip.rank() as usize) < to_rank
                        && to_rank <= from_base.rank() as usize + 1
                        && from_tip.odd_red() == card_to_cover.odd_red()
                    {
                        // Some face-up card in the from-pile covers the top
                        // card of the to-pile.
                        let move_count = to_rank - from_tip.rank() as usize;
                        debug_assert!(move_count <= up_count);
                        if move_count == up_count
                            && (up_count < from_pile.len() || self.need_king_space())
                        {
                            debug_assert!(from_base.covers(card_to_cover));
                            moves.push(
                                MoveSpec::non_stock_move(from_id, to_id, up_count, up_count)
                                    .with_flips_top_card(up_count < from_pile.len()),
                            );
                        } else if move_count < up_count || up_count < from_pile.len() {
                            let uncovered = from_pile.cards()[from_pile.len() - move_count - 1];
                            if self.can_move_to_foundation(uncovered) {
                                debug_assert!(
                                    from_pile.cards()[from_pile.len() - move_count]
                                        .covers(card_to_cover)
                                );
                                moves.push(
                                    MoveSpec::ladder_move(
                                        from_id,
                                        to_id,
                                        move_count,
                                        up_count,
                                        uncovered,
                                    )
                                    .with_flips_top_card(up_count == move_count + 1),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    /// Moves from the talon to tableau or foundation, including moves that
    /// become available only after one or more draws. Rather than emit
    /// individual draws, each generated move carries its whole draw count.
    fn moves_from_talon(&self, moves: &mut MoveList, min_foundation_size: usize) {
        for future in talon_cards(self) {
            if self.can_move_to_foundation(future.card) {
                let pile = PileId::foundation(future.card.suit());
                moves.push(MoveSpec::stock_move(
                    pile,
                    future.n_moves + 1,
                    future.draw_count,
                    future.recycle,
                ));
                if future.card.rank() as usize <= min_foundation_size + 1 {
                    if self.draw_setting() == 1 {
                        // Best next move among the remaining talon cards.
                        break;
                    } else {
                        // Best move for this card; a later card might still
                        // offer a better one.
                        continue;
                    }
                }
            }

            for (ti, t_pile) in self.tableau().iter().enumerate() {
                if !t_pile.is_empty() {
                    if future.card.covers(t_pile.back()) {
                        moves.push(MoveSpec::stock_move(
                            PileId::tableau(ti),
                            future.n_moves + 1,
                            future.draw_count,
                            future.recycle,
                        ));
                    }
                } else if future.card.rank() == KING {
                    moves.push(MoveSpec::stock_move(
                        PileId::tableau(ti),
                        future.n_moves + 1,
                        future.draw_count,
                        future.recycle,
                    ));
                    break; // a king goes to just one empty pile
                }
            }
        }
    }

    fn moves_from_foundation(&self, moves: &mut MoveList, min_foundation_size: usize) {
        for (si, f_pile) in self.foundation().iter().enumerate() {
            // Skip piles whose reversal back to the foundation would be
            // dominant.
            if f_pile.len() <= min_foundation_size + 2 {
                continue;
            }
            let top = f_pile.back();
            let from = PileId::foundation(Suit::from_u8(si as u8));
            for (ti, t_pile) in self.tableau().iter().enumerate() {
                if !t_pile.is_empty() {
                    if top.covers(t_pile.back()) {
                        moves.push(MoveSpec::non_stock_move(from, PileId::tableau(ti), 1, 0));
                    }
                } else if top.rank() == KING {
                    moves.push(MoveSpec::non_stock_move(from, PileId::tableau(ti), 1, 0));
                    break; // don't move the same king to another empty pile
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::numbered_deal;

    fn game(seed: u32, draw: u32) -> Game {
        Game::new(numbered_deal(seed), draw, u32::MAX)
    }

    #[test]
    fn generated_moves_are_valid() {
        for seed in [1u32, 2, 19, 100] {
            let mut g = game(seed, 1);
            let mut history = MoveSequence::new();
            for _ in 0..80 {
                let moves = g.available_moves(&history);
                if moves.is_empty() {
                    break;
                }
                for &mv in moves.iter() {
                    assert!(g.is_valid(mv), "invalid generated move {mv} (seed {seed})");
                }
                g.make_move(moves[0]);
                history.push_back(moves[0]);
            }
        }
    }

    #[test]
    fn dominant_moves_come_one_at_a_time() {
        let mut g = game(1, 1);
        let mut history = MoveSequence::new();
        let mut saw_dominant = false;
        for _ in 0..120 {
            let moves = g.available_moves(&history);
            if moves.is_empty() {
                break;
            }
            let mv = moves[0];
            // A returned short-foundation move is dominant and must have
            // come back alone.
            if !mv.is_stock_move()
                && mv.to().is_foundation()
                && !mv.is_ladder_move()
                && (g.pile(mv.from()).back().rank() as usize) <= g.min_foundation_size() + 1
            {
                assert_eq!(moves.len(), 1, "dominant move must come alone: {mv}");
                saw_dominant = true;
            }
            g.make_move(mv);
            history.push_back(mv);
        }
        assert!(saw_dominant, "walk never saw a dominant move");
    }

    #[test]
    fn talon_futures_respect_draw_setting() {
        let g1 = game(1, 1);
        let futures = talon_cards(&g1);
        // Under draw 1 with a full stock every stock card is reachable.
        assert_eq!(futures.len(), 24);
        for (i, f) in futures.iter().enumerate() {
            assert_eq!(f.n_moves, i as u32 + 1);
            assert_eq!(f.draw_count, i as i32 + 1);
            assert!(!f.recycle);
        }

        let g3 = game(1, 3);
        let futures = talon_cards(&g3);
        // Under draw 3 only every third card surfaces on the first pass.
        assert_eq!(futures.len(), 8);
        for (i, f) in futures.iter().enumerate() {
            assert_eq!(f.n_moves, i as u32 + 1);
            assert_eq!(f.draw_count, (i as i32 + 1) * 3);
        }
    }

    #[test]
    fn talon_simulation_recycles_at_most_once() {
        // After a few real draws the simulation wraps around the recycle
        // and revisits earlier cards, flagged as recycled.
        let mut g = game(7, 3);
        let mut history = MoveSequence::new();
        loop {
            let moves = g.available_moves(&history);
            let Some(&mv) = moves.iter().find(|m| m.is_stock_move()) else {
                match moves.first() {
                    Some(&mv) => {
                        g.make_move(mv);
                        history.push_back(mv);
                        continue;
                    }
                    None => return,
                }
            };
            g.make_move(mv);
            history.push_back(mv);
            if !g.waste().is_empty() {
                break;
            }
        }
        let futures = talon_cards(&g);
        let recycled = futures.iter().filter(|f| f.recycle).count();
        let fresh = futures.len() - recycled;
        // Fresh futures cover at most the rest of this pass; recycled ones
        // stop before the waste rebuilds to its current size.
        assert!(fresh as usize <= g.stock().len() + 1);
        assert!(recycled as usize <= g.waste().len() + g.stock().len());
        // Recycled futures must carry negative or smaller draw counts than
        // a plain draw would.
        for f in futures.iter().filter(|f| f.recycle) {
            assert!(f.draw_count < g.stock().len() as i32 + 1);
        }
    }
}
