//! Move directions, packed into four bytes.

use std::collections::VecDeque;
use std::fmt;

use super::card::{Card, Suit};
use super::pile::PileId;

/// Directions for one move, produced by move generation.
///
/// Three variants share one 32-bit word:
///
/// - *Stock move*: draw `draw_count` cards (negative = undraw) from the
///   stock to the waste, then move the waste top to `to`. Only stock moves
///   touch the stock pile. `recycle` marks a move whose draw sequence
///   crosses a waste-to-stock refill.
/// - *Non-stock move*: move `n_cards` from `from` to `to`. The from-pile's
///   face-up count *before* the move rides along, because unmaking a move
///   cannot infer it once a flip has happened.
/// - *Ladder move*: a tableau-to-tableau move that uncovers a
///   foundation-ready card and moves it to the foundation named by
///   `ladder_suit`. Counts as two moves. The tactic of dislodging a buried
///   card with a chain of these is known as climbing the ladder, hence the
///   name. For a ladder move `flips_top_card` refers to the foundation leg,
///   not the tableau leg.
///
/// A sum type would be cleaner but doubles the footprint of the move tree
/// and the fringe, so the variants are packed and checked at run time, with
/// `debug_assert` on the accessors.
///
/// Bit layout: `from:4 | to:4 | flips:1 | n_moves:5 | ladder_suit:2 |
/// recycle:1 | payload:8`, where the payload is the signed draw count for
/// stock moves and `{n_cards:4, from_up_count:4}` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MoveSpec(u32);

const TO_SHIFT: u32 = 4;
const FLIPS_FLAG: u32 = 1 << 8;
const NMOVES_SHIFT: u32 = 9;
const NMOVES_MASK: u32 = 0x1F;
const LADDER_SHIFT: u32 = 14;
const RECYCLE_FLAG: u32 = 1 << 16;
const PAYLOAD_SHIFT: u32 = 17;
const UP_SHIFT: u32 = 4;

impl MoveSpec {
    /// The sentinel used for tree roots; not a legal move.
    pub const DEFAULT: MoveSpec = MoveSpec(0);

    /// A stock move: draw `draw` cards (possibly negative), then play the
    /// waste top to `to`, for `n_moves` user moves in total.
    #[inline]
    pub fn stock_move(to: PileId, n_moves: u32, draw: i32, recycle: bool) -> MoveSpec {
        debug_assert!(n_moves <= NMOVES_MASK);
        debug_assert!((-24..=24).contains(&draw));
        let mut word = PileId::Stock as u32
            | (to as u32) << TO_SHIFT
            | n_moves << NMOVES_SHIFT
            | ((draw as i8 as u8) as u32) << PAYLOAD_SHIFT;
        if recycle {
            word |= RECYCLE_FLAG;
        }
        MoveSpec(word)
    }

    /// A single move of `n_cards` from `from` to `to`.
    #[inline]
    pub fn non_stock_move(from: PileId, to: PileId, n_cards: usize, from_up_count: usize) -> MoveSpec {
        debug_assert!(from != PileId::Stock);
        debug_assert!((1..=13).contains(&n_cards));
        debug_assert!(from_up_count <= 15);
        MoveSpec(
            from as u32
                | (to as u32) << TO_SHIFT
                | 1 << NMOVES_SHIFT
                | ((n_cards as u32) | (from_up_count as u32) << UP_SHIFT) << PAYLOAD_SHIFT,
        )
    }

    /// A ladder move: `n_cards` from `from` to `to`, then the newly exposed
    /// top of `from` (`ladder_card`) to its foundation. Two user moves.
    #[inline]
    pub fn ladder_move(
        from: PileId,
        to: PileId,
        n_cards: usize,
        from_up_count: usize,
        ladder_card: Card,
    ) -> MoveSpec {
        let base = MoveSpec::non_stock_move(from, to, n_cards, from_up_count);
        MoveSpec(
            (base.0 & !(NMOVES_MASK << NMOVES_SHIFT))
                | (2 << NMOVES_SHIFT)
                | ((ladder_card.suit() as u32) << LADDER_SHIFT),
        )
    }

    #[inline]
    pub fn is_default(self) -> bool {
        self.from() == self.to()
    }

    #[inline]
    pub fn from(self) -> PileId {
        PileId::from_u8((self.0 & 0xF) as u8)
    }

    #[inline]
    pub fn to(self) -> PileId {
        PileId::from_u8((self.0 >> TO_SHIFT & 0xF) as u8)
    }

    #[inline]
    pub fn is_stock_move(self) -> bool {
        self.from() == PileId::Stock
    }

    /// Number of cards moved from pile to pile (stock moves play one).
    #[inline]
    pub fn n_cards(self) -> usize {
        if self.is_stock_move() {
            1
        } else {
            (self.0 >> PAYLOAD_SHIFT & 0xF) as usize
        }
    }

    /// The from-pile's face-up count before the move. Non-stock moves only.
    #[inline]
    pub fn from_up_count(self) -> usize {
        debug_assert!(!self.is_stock_move());
        (self.0 >> (PAYLOAD_SHIFT + UP_SHIFT) & 0xF) as usize
    }

    /// Signed number of cards drawn from stock to waste. Stock moves only.
    #[inline]
    pub fn draw_count(self) -> i32 {
        debug_assert!(self.is_stock_move());
        (self.0 >> PAYLOAD_SHIFT & 0xFF) as u8 as i8 as i32
    }

    /// Number of user moves this `MoveSpec` stands for.
    #[inline]
    pub fn n_moves(self) -> u32 {
        self.0 >> NMOVES_SHIFT & NMOVES_MASK
    }

    #[inline]
    pub fn ladder_suit(self) -> Suit {
        Suit::from_u8((self.0 >> LADDER_SHIFT & 3) as u8)
    }

    #[inline]
    pub fn ladder_pile(self) -> PileId {
        PileId::foundation(self.ladder_suit())
    }

    #[inline]
    pub fn is_ladder_move(self) -> bool {
        self.from().is_tableau() && self.n_moves() == 2
    }

    #[inline]
    pub fn recycle(self) -> bool {
        self.0 & RECYCLE_FLAG != 0
    }

    /// Does this move reveal a new face-up card on the from-pile?
    #[inline]
    pub fn flips_top_card(self) -> bool {
        self.0 & FLIPS_FLAG != 0
    }

    #[inline]
    pub fn with_flips_top_card(self, flips: bool) -> MoveSpec {
        if flips {
            MoveSpec(self.0 | FLIPS_FLAG)
        } else {
            MoveSpec(self.0 & !FLIPS_FLAG)
        }
    }
}

const PILE_NAMES: [&str; 13] =
    ["wa", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "st", "cb", "di", "sp", "ht"];

impl fmt::Display for MoveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stock_move() {
            write!(f, "+{}d{}", self.n_moves(), self.draw_count())?;
            if self.recycle() {
                write!(f, "c")?;
            }
            write!(f, ">{}", PILE_NAMES[self.to().index()])
        } else {
            write!(f, "{}>{}", PILE_NAMES[self.from().index()], PILE_NAMES[self.to().index()])?;
            if self.n_cards() != 1 {
                write!(f, "x{}", self.n_cards())?;
            }
            if self.from_up_count() != 0 {
                write!(f, "u{}", self.from_up_count())?;
            }
            Ok(())
        }
    }
}

/// Total user moves implied by a sequence of `MoveSpec`s.
pub fn move_count(moves: &[MoveSpec]) -> u32 {
    moves.iter().map(|m| m.n_moves()).sum()
}

/// Longest move sequence a worker will ever hold. Overflow means the move
/// filter admitted a cyclic extension, which is a bug.
pub const SEQUENCE_CAPACITY: usize = 500;

/// An ordered move sequence that keeps a running user-move count.
///
/// Workers rebuild one of these from the shared tree for every leaf they
/// expand, push stem moves on the back, and read it from the front when
/// replaying onto a fresh deal.
#[derive(Debug, Clone, Default)]
pub struct MoveSequence {
    moves: VecDeque<MoveSpec>,
    n_moves: u32,
}

impl MoveSequence {
    pub fn new() -> MoveSequence {
        MoveSequence {
            moves: VecDeque::with_capacity(SEQUENCE_CAPACITY),
            n_moves: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Running total of user moves (`n_moves` summed).
    #[inline]
    pub fn move_count(&self) -> u32 {
        self.n_moves
    }

    pub fn clear(&mut self) {
        self.moves.clear();
        self.n_moves = 0;
    }

    pub fn push_back(&mut self, mv: MoveSpec) {
        self.n_moves += mv.n_moves();
        self.moves.push_back(mv);
    }

    pub fn push_front(&mut self, mv: MoveSpec) {
        self.n_moves += mv.n_moves();
        self.moves.push_front(mv);
    }

    pub fn pop_back(&mut self) -> Option<MoveSpec> {
        let mv = self.moves.pop_back()?;
        self.n_moves -= mv.n_moves();
        Some(mv)
    }

    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = MoveSpec> + '_ {
        self.moves.iter().copied()
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, mv) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{mv}")?;
        }
        write!(f, ")")
    }
}

/// One user-level move of a solution listing.
///
/// Moves are numbered from 1. Numbers are often not consecutive, because
/// drawing several cards from the stock collapses into a single `XMove`.
/// Tableau flips are not numbered moves; they are flagged on the move that
/// reveals them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XMove {
    pub move_num: u32,
    pub from: PileId,
    pub to: PileId,
    pub n_cards: usize,
    pub flip: bool,
}

/// Expand a solver solution into a numbered user-level listing.
pub fn make_xmoves(solution: &[MoveSpec], draw: u32) -> Vec<XMove> {
    let mut stock_size: u32 = 24;
    let mut waste_size: u32 = 0;
    let mut move_num: u32 = 0;
    let mut result = Vec::new();

    for &mv in solution {
        let from = mv.from();
        let to = mv.to();
        if !mv.is_stock_move() {
            let n = mv.n_cards();
            move_num += 1;
            result.push(XMove {
                move_num,
                from,
                to,
                n_cards: n,
                flip: mv.flips_top_card() && !mv.is_ladder_move(),
            });
            if from == PileId::Waste {
                debug_assert!(waste_size >= 1);
                waste_size -= 1;
            }
            if mv.is_ladder_move() {
                move_num += 1;
                result.push(XMove {
                    move_num,
                    from,
                    to: mv.ladder_pile(),
                    n_cards: 1,
                    flip: mv.flips_top_card(),
                });
            }
        } else {
            debug_assert!(stock_size + waste_size > 0);
            let mut n_talon_moves = mv.n_moves() - 1;
            let stock_moves_left = stock_size.div_ceil(draw);
            if n_talon_moves > stock_moves_left && stock_size > 0 {
                // Draw all remaining cards from stock in one listed move.
                move_num += 1;
                result.push(XMove {
                    move_num,
                    from: PileId::Stock,
                    to: PileId::Waste,
                    n_cards: stock_size as usize,
                    flip: false,
                });
                move_num += stock_moves_left - 1;
                waste_size += stock_size;
                stock_size = 0;
                n_talon_moves -= stock_moves_left;
            }
            if n_talon_moves > 0 {
                move_num += 1;
                if stock_size == 0 {
                    // Recycle the waste pile.
                    result.push(XMove {
                        move_num,
                        from: PileId::Waste,
                        to: PileId::Stock,
                        n_cards: waste_size as usize,
                        flip: false,
                    });
                    stock_size = waste_size;
                    waste_size = 0;
                }
                let n_moved = stock_size.min(n_talon_moves * draw);
                result.push(XMove {
                    move_num,
                    from: PileId::Stock,
                    to: PileId::Waste,
                    n_cards: n_moved as usize,
                    flip: false,
                });
                debug_assert!(stock_size >= n_moved && waste_size + n_moved <= 24);
                stock_size -= n_moved;
                waste_size += n_moved;
                move_num += n_talon_moves - 1;
            }
            move_num += 1;
            result.push(XMove {
                move_num,
                from: PileId::Waste,
                to,
                n_cards: 1,
                flip: false,
            });
            debug_assert!(waste_size >= 1);
            waste_size -= 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_spec_is_four_bytes() {
        assert_eq!(std::mem::size_of::<MoveSpec>(), 4);
    }

    #[test]
    fn stock_move_fields() {
        let mv = MoveSpec::stock_move(PileId::FoundationH, 3, -5, true);
        assert!(mv.is_stock_move());
        assert!(!mv.is_default());
        assert_eq!(mv.from(), PileId::Stock);
        assert_eq!(mv.to(), PileId::FoundationH);
        assert_eq!(mv.n_moves(), 3);
        assert_eq!(mv.draw_count(), -5);
        assert_eq!(mv.n_cards(), 1);
        assert!(mv.recycle());
        assert!(!mv.is_ladder_move());
    }

    #[test]
    fn non_stock_move_fields() {
        let mv = MoveSpec::non_stock_move(PileId::Tableau3, PileId::Tableau5, 4, 6);
        assert!(!mv.is_stock_move());
        assert_eq!(mv.n_cards(), 4);
        assert_eq!(mv.from_up_count(), 6);
        assert_eq!(mv.n_moves(), 1);
        assert!(!mv.flips_top_card());
        let flipped = mv.with_flips_top_card(true);
        assert!(flipped.flips_top_card());
        assert_eq!(flipped.with_flips_top_card(false), mv);
    }

    #[test]
    fn ladder_move_fields() {
        let card = Card::new(Suit::Spades, 7);
        let mv = MoveSpec::ladder_move(PileId::Tableau1, PileId::Tableau2, 2, 5, card);
        assert!(mv.is_ladder_move());
        assert_eq!(mv.n_moves(), 2);
        assert_eq!(mv.ladder_suit(), Suit::Spades);
        assert_eq!(mv.ladder_pile(), PileId::FoundationS);
        assert_eq!(mv.n_cards(), 2);
        assert_eq!(mv.from_up_count(), 5);
    }

    #[test]
    fn default_move_is_recognizable() {
        assert!(MoveSpec::DEFAULT.is_default());
        assert!(!MoveSpec::non_stock_move(PileId::Waste, PileId::Tableau1, 1, 0).is_default());
    }

    #[test]
    fn sequence_counts_user_moves() {
        let mut seq = MoveSequence::new();
        seq.push_back(MoveSpec::non_stock_move(PileId::Tableau1, PileId::FoundationC, 1, 1));
        seq.push_back(MoveSpec::stock_move(PileId::Tableau2, 4, 3, false));
        assert_eq!(seq.move_count(), 5);
        assert_eq!(seq.len(), 2);
        seq.pop_back();
        assert_eq!(seq.move_count(), 1);
        seq.clear();
        assert_eq!(seq.move_count(), 0);
    }

    #[test]
    fn xmoves_collapse_draws() {
        // Draw three single cards (4 user moves) then play the waste top
        // to a foundation: listed as one 3-card draw plus the play.
        let solution = [MoveSpec::stock_move(PileId::FoundationC, 4, 3, false)];
        let listing = make_xmoves(&solution, 1);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].from, PileId::Stock);
        assert_eq!(listing[0].to, PileId::Waste);
        assert_eq!(listing[0].n_cards, 3);
        assert_eq!(listing[0].move_num, 1);
        assert_eq!(listing[1].from, PileId::Waste);
        assert_eq!(listing[1].to, PileId::FoundationC);
        assert_eq!(listing[1].move_num, 4);
    }

    #[test]
    fn xmoves_number_ladder_legs_separately() {
        let card = Card::new(Suit::Diamonds, 3);
        let solution = [
            MoveSpec::ladder_move(PileId::Tableau2, PileId::Tableau4, 2, 3, card)
                .with_flips_top_card(true),
        ];
        let listing = make_xmoves(&solution, 1);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].move_num, 1);
        assert_eq!(listing[0].to, PileId::Tableau4);
        assert!(!listing[0].flip);
        assert_eq!(listing[1].move_num, 2);
        assert_eq!(listing[1].to, PileId::FoundationD);
        assert_eq!(listing[1].n_cards, 1);
        assert!(listing[1].flip);
    }
}
