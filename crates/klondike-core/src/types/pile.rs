//! Piles of cards and their position codes.

use smallvec::SmallVec;

use super::card::{Card, Suit};
use super::TABLEAU_SIZE;

/// Position of a pile within a game.
///
/// The numeric codes are fixed: `Waste = 0`, `Tableau1..7 = 1..=7`,
/// `Stock = 8`, foundations in suit order `9..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PileId {
    Waste = 0,
    Tableau1 = 1,
    Tableau2 = 2,
    Tableau3 = 3,
    Tableau4 = 4,
    Tableau5 = 5,
    Tableau6 = 6,
    Tableau7 = 7,
    Stock = 8,
    FoundationC = 9,
    FoundationD = 10,
    FoundationS = 11,
    FoundationH = 12,
}

/// Number of distinct pile codes.
pub const PILE_COUNT: u8 = 13;

const TABLEAU_BASE: u8 = PileId::Tableau1 as u8;
const FOUNDATION_BASE: u8 = PileId::FoundationC as u8;

impl PileId {
    /// Pile from its code.
    ///
    /// # Panics
    /// Panics in debug builds if `n >= 13`.
    #[inline]
    pub const fn from_u8(n: u8) -> PileId {
        debug_assert!(n < PILE_COUNT);
        // SAFETY: discriminants cover 0..13 contiguously
        unsafe { std::mem::transmute(n % PILE_COUNT) }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_tableau(self) -> bool {
        let n = self as u8;
        TABLEAU_BASE <= n && n < TABLEAU_BASE + TABLEAU_SIZE as u8
    }

    #[inline]
    pub const fn is_foundation(self) -> bool {
        self as u8 >= FOUNDATION_BASE
    }

    /// The `i`-th tableau pile, `i` in `0..7`.
    #[inline]
    pub const fn tableau(i: usize) -> PileId {
        debug_assert!(i < TABLEAU_SIZE);
        PileId::from_u8(TABLEAU_BASE + i as u8)
    }

    /// The foundation pile for `suit`.
    #[inline]
    pub const fn foundation(suit: Suit) -> PileId {
        PileId::from_u8(FOUNDATION_BASE + suit as u8)
    }

    /// Index into a tableau array, if this is a tableau pile.
    #[inline]
    pub const fn tableau_index(self) -> Option<usize> {
        if self.is_tableau() {
            Some(self as usize - TABLEAU_BASE as usize)
        } else {
            None
        }
    }

    /// The suit whose foundation this is, if this is a foundation pile.
    #[inline]
    pub const fn foundation_suit(self) -> Option<Suit> {
        if self.is_foundation() {
            Some(Suit::from_u8(self as u8 - FOUNDATION_BASE))
        } else {
            None
        }
    }
}

/// An ordered pile of cards plus a face-up suffix length.
///
/// No pile ever holds more than 24 cards after the deal, so the card buffer
/// is inline. `up_count` counts face-up cards and is meaningful only for
/// tableau piles; for the others it is maintained blindly by the move
/// arithmetic and never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pile {
    cards: SmallVec<[Card; 24]>,
    up_count: u8,
}

impl Pile {
    #[inline]
    pub fn new() -> Pile {
        Pile::default()
    }

    #[inline]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[inline]
    pub fn up_count(&self) -> usize {
        self.up_count as usize
    }

    #[inline]
    pub fn set_up_count(&mut self, up: usize) {
        self.up_count = up as u8;
    }

    /// Adjust the face-up count by a signed delta. Wraps for the piles where
    /// the count carries no meaning.
    #[inline]
    pub fn incr_up_count(&mut self, delta: i32) {
        self.up_count = self.up_count.wrapping_add_signed(delta as i8);
    }

    /// Top card of the pile (the one a player could pick up).
    #[inline]
    pub fn back(&self) -> Card {
        debug_assert!(!self.is_empty());
        self.cards[self.cards.len() - 1]
    }

    /// Bottom card of the face-up run. Tableau piles only.
    #[inline]
    pub fn up_base(&self) -> Card {
        debug_assert!(self.up_count() >= 1 && self.up_count() <= self.len());
        self.cards[self.cards.len() - self.up_count()]
    }

    #[inline]
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[inline]
    pub fn pop(&mut self) -> Card {
        debug_assert!(!self.is_empty());
        self.cards.pop().expect("pop from empty pile")
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.up_count = 0;
    }

    /// Move the last `n` cards of `donor` onto this pile, preserving order.
    pub fn take(&mut self, donor: &mut Pile, n: usize) {
        debug_assert!(n <= donor.len());
        let at = donor.len() - n;
        self.cards.extend_from_slice(&donor.cards[at..]);
        donor.cards.truncate(at);
    }

    /// If `n > 0`, move the last `n` cards of `other` here one at a time,
    /// reversing their order. If `n < 0`, do the reverse.
    pub fn draw(&mut self, other: &mut Pile, n: i32) {
        if n < 0 {
            for _ in 0..-n {
                other.cards.push(self.pop());
            }
        } else {
            for _ in 0..n {
                self.cards.push(other.pop());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(v: u8) -> Card {
        Card::from_value(v).expect("in range")
    }

    #[test]
    fn pile_codes() {
        assert_eq!(PileId::Waste.index(), 0);
        assert_eq!(PileId::tableau(0), PileId::Tableau1);
        assert_eq!(PileId::tableau(6), PileId::Tableau7);
        assert_eq!(PileId::Stock.index(), 8);
        assert_eq!(PileId::foundation(Suit::Clubs), PileId::FoundationC);
        assert_eq!(PileId::foundation(Suit::Hearts), PileId::FoundationH);
        assert!(PileId::Tableau4.is_tableau());
        assert!(!PileId::Stock.is_tableau());
        assert!(!PileId::Waste.is_foundation());
        assert!(PileId::FoundationS.is_foundation());
        assert_eq!(PileId::Tableau3.tableau_index(), Some(2));
        assert_eq!(PileId::FoundationD.foundation_suit(), Some(Suit::Diamonds));
        assert_eq!(PileId::Stock.foundation_suit(), None);
    }

    #[test]
    fn take_preserves_order() {
        let mut a = Pile::new();
        let mut b = Pile::new();
        for v in 0..5 {
            a.push(card(v));
        }
        b.take(&mut a, 3);
        assert_eq!(a.cards(), &[card(0), card(1)]);
        assert_eq!(b.cards(), &[card(2), card(3), card(4)]);
    }

    #[test]
    fn draw_reverses_and_undoes() {
        let mut stock = Pile::new();
        let mut waste = Pile::new();
        for v in 0..4 {
            stock.push(card(v));
        }
        waste.draw(&mut stock, 3);
        assert_eq!(waste.cards(), &[card(3), card(2), card(1)]);
        assert_eq!(stock.cards(), &[card(0)]);
        waste.draw(&mut stock, -3);
        assert_eq!(stock.cards(), &[card(0), card(1), card(2), card(3)]);
        assert!(waste.is_empty());
    }
}
