//! Reproducible deck construction.
//!
//! The numbered-deal sequence is an external contract: two implementations
//! given the same seed must produce the same deck. That pins both the PRNG
//! (the standard 32-bit Mersenne Twister) and the way raw outputs are
//! reduced to a bounded range (scale-and-reject, the reduction the
//! reference deals were generated with), so both live here rather than
//! behind a pluggable RNG crate.

use std::fmt;

use crate::types::{Card, CARDS_PER_DECK};

/// MT19937, the standard 32-bit Mersenne Twister.
pub struct Mt19937 {
    state: [u32; 624],
    index: usize,
}

impl Mt19937 {
    pub fn new(seed: u32) -> Mt19937 {
        let mut state = [0u32; 624];
        state[0] = seed;
        for i in 1..624 {
            state[i] = 1_812_433_253u32
                .wrapping_mul(state[i - 1] ^ (state[i - 1] >> 30))
                .wrapping_add(i as u32);
        }
        Mt19937 { state, index: 624 }
    }

    fn twist(&mut self) {
        for i in 0..624 {
            let y = (self.state[i] & 0x8000_0000) | (self.state[(i + 1) % 624] & 0x7FFF_FFFF);
            let mut next = self.state[(i + 397) % 624] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= 0x9908_B0DF;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }

    pub fn next_u32(&mut self) -> u32 {
        if self.index >= 624 {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;
        y ^= y >> 11;
        y ^= (y << 7) & 0x9D2C_5680;
        y ^= (y << 15) & 0xEFC6_0000;
        y ^ (y >> 18)
    }

    /// Uniform draw from the inclusive range `[lo, hi]` by downscaling with
    /// rejection. `hi - lo` must be smaller than the generator range.
    pub fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(lo <= hi);
        let erange = (hi - lo) as u64 + 1;
        let grange = u32::MAX as u64;
        let scaling = grange / erange;
        let past = erange * scaling;
        loop {
            let raw = self.next_u32() as u64;
            if raw < past {
                return lo + (raw / scaling) as u32;
            }
        }
    }
}

/// Shuffle a (possibly partial) deck reproducibly: swap each position with a
/// uniformly chosen later one.
pub fn shuffle(cards: &mut [Card], seed: u32) {
    let n = cards.len();
    if n < 2 {
        return;
    }
    let mut rng = Mt19937::new(seed);
    for i in 0..n - 2 {
        let j = rng.next_in_range(i as u32, n as u32 - 1) as usize;
        cards.swap(i, j);
    }
}

/// Deck validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckError {
    /// A deck must hold exactly 52 cards.
    WrongSize(usize),
    /// The same card appeared twice.
    DuplicateCard(Card),
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckError::WrongSize(n) => write!(f, "deck has {n} cards, expected 52"),
            DeckError::DuplicateCard(c) => write!(f, "duplicate card in deck: {c}"),
        }
    }
}

impl std::error::Error for DeckError {}

/// A validated 52-card deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: [Card; CARDS_PER_DECK],
}

impl Deck {
    /// Validate a card sequence as a full deck.
    pub fn new(cards: &[Card]) -> Result<Deck, DeckError> {
        if cards.len() != CARDS_PER_DECK {
            return Err(DeckError::WrongSize(cards.len()));
        }
        let mut seen = [false; CARDS_PER_DECK];
        for &card in cards {
            let v = card.value() as usize;
            if seen[v] {
                return Err(DeckError::DuplicateCard(card));
            }
            seen[v] = true;
        }
        let mut deck = [Card::from_value(0).expect("valid"); CARDS_PER_DECK];
        deck.copy_from_slice(cards);
        Ok(Deck { cards: deck })
    }

    #[inline]
    pub fn cards(&self) -> &[Card; CARDS_PER_DECK] {
        &self.cards
    }
}

/// Produce the shuffled deck for a 32-bit seed.
pub fn numbered_deal(seed: u32) -> Deck {
    let mut cards: Vec<Card> = (0..CARDS_PER_DECK as u8)
        .map(|v| Card::from_value(v).expect("in range"))
        .collect();
    shuffle(&mut cards, seed);
    Deck::new(&cards).expect("a shuffled full deck is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mt19937_known_vectors() {
        // First output for the mt19937 reference default seed.
        let mut rng = Mt19937::new(5489);
        assert_eq!(rng.next_u32(), 3_499_211_612);
        // The 10000th output of the default-seeded generator.
        let mut rng = Mt19937::new(5489);
        let ten_thousandth = (0..10_000).map(|_| rng.next_u32()).last().expect("some");
        assert_eq!(ten_thousandth, 4_123_659_995);
        // First output for seed 1.
        let mut rng = Mt19937::new(1);
        assert_eq!(rng.next_u32(), 1_791_095_845);
    }

    #[test]
    fn range_draws_stay_in_bounds() {
        let mut rng = Mt19937::new(7);
        for lo in 0..5u32 {
            for _ in 0..200 {
                let x = rng.next_in_range(lo, 51);
                assert!((lo..=51).contains(&x));
            }
        }
    }

    #[test]
    fn numbered_deal_is_a_permutation_and_reproducible() {
        let a = numbered_deal(1);
        let b = numbered_deal(1);
        assert_eq!(a, b);
        let c = numbered_deal(2);
        assert_ne!(a, c);
        let mut seen = [false; 52];
        for card in a.cards() {
            assert!(!seen[card.value() as usize]);
            seen[card.value() as usize] = true;
        }
    }

    #[test]
    fn short_inputs_are_left_alone() {
        let mut one = [Card::from_value(0).expect("valid")];
        shuffle(&mut one, 99);
        assert_eq!(one[0].value(), 0);
    }

    #[test]
    fn deck_validation() {
        let cards: Vec<Card> = (0..52).map(|v| Card::from_value(v).expect("valid")).collect();
        assert!(Deck::new(&cards).is_ok());
        assert_eq!(Deck::new(&cards[..51]), Err(DeckError::WrongSize(51)));
        let mut dup = cards.clone();
        dup[51] = dup[0];
        assert_eq!(Deck::new(&dup), Err(DeckError::DuplicateCard(dup[0])));
    }
}
