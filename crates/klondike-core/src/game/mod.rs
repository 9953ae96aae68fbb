//! Klondike game state: the deal, move application, and its exact reverse.
//!
//! A `Game` is mutated only by [`Game::make_move`] and [`Game::unmake_move`];
//! applying a move and then unmaking it restores every observable byte of
//! the state. Move application has no failure mode; [`Game::is_valid`] is
//! the external validator, and generation only produces valid moves.

use smallvec::SmallVec;

use crate::deal::Deck;
use crate::types::{
    Card, MoveSpec, Pile, PileId, XMove, CARDS_PER_SUIT, KING, SUITS_PER_DECK, TABLEAU_SIZE,
};

/// Cards dealt to the tableau; the rest go to the stock.
const TABLEAU_CARDS: usize = 28;

const PILE_COUNT: usize = 13;
const WASTE: usize = PileId::Waste as usize;
const STOCK: usize = PileId::Stock as usize;
const TABLEAU_BASE: usize = PileId::Tableau1 as usize;
const FOUNDATION_BASE: usize = PileId::FoundationC as usize;

pub(crate) type DominantCache = SmallVec<[MoveSpec; 9]>;

/// A game of Klondike Solitaire.
#[derive(Debug)]
pub struct Game {
    /// All piles, indexed by [`PileId`] code: waste, the seven tableau
    /// piles, stock, the four foundations.
    piles: [Pile; PILE_COUNT],
    draw_setting: u8,
    recycle_limit: u8,
    recycle_count: u8,
    /// Empty columns plus columns with a king on the bottom.
    king_spaces: u8,
    deck: Deck,
    pub(crate) dominant_cache: DominantCache,
}

impl Game {
    /// Build a game from a full deck, a draw setting (1 or 3 for standard
    /// Klondike) and a recycle limit (`u32::MAX` for unlimited). The game
    /// comes up already dealt.
    pub fn new(deck: Deck, draw: u32, recycle_limit: u32) -> Game {
        debug_assert!(draw >= 1);
        let mut game = Game {
            piles: Default::default(),
            draw_setting: draw.min(24) as u8,
            recycle_limit: recycle_limit.min(u8::MAX as u32) as u8,
            recycle_count: 0,
            king_spaces: 0,
            deck,
            dominant_cache: DominantCache::new(),
        };
        game.deal();
        game
    }

    #[inline]
    pub fn waste(&self) -> &Pile {
        &self.piles[WASTE]
    }

    #[inline]
    pub fn stock(&self) -> &Pile {
        &self.piles[STOCK]
    }

    /// The seven tableau piles, in order.
    #[inline]
    pub fn tableau(&self) -> &[Pile] {
        &self.piles[TABLEAU_BASE..TABLEAU_BASE + TABLEAU_SIZE]
    }

    /// The four foundation piles, in suit order.
    #[inline]
    pub fn foundation(&self) -> &[Pile] {
        &self.piles[FOUNDATION_BASE..FOUNDATION_BASE + SUITS_PER_DECK]
    }

    #[inline]
    pub fn draw_setting(&self) -> u32 {
        self.draw_setting as u32
    }

    #[inline]
    pub fn recycle_limit(&self) -> u32 {
        self.recycle_limit as u32
    }

    #[inline]
    pub fn recycle_count(&self) -> u32 {
        self.recycle_count as u32
    }

    #[inline]
    pub fn pile(&self, id: PileId) -> &Pile {
        &self.piles[id.index()]
    }

    /// Mutable access to two distinct piles at once.
    #[inline]
    fn pile_pair_mut(&mut self, a: PileId, b: PileId) -> (&mut Pile, &mut Pile) {
        let [pa, pb] = self
            .piles
            .get_disjoint_mut([a.index(), b.index()])
            .expect("a move never names the same pile twice");
        (pa, pb)
    }

    /// Can `card` go to its foundation pile right now?
    #[inline]
    pub fn can_move_to_foundation(&self, card: Card) -> bool {
        card.rank() as usize == self.piles[FOUNDATION_BASE + card.suit().index()].len()
    }

    /// Height of the shortest foundation pile.
    pub fn min_foundation_size(&self) -> usize {
        self.foundation().iter().map(Pile::len).min().expect("four piles")
    }

    /// All 52 cards on the foundations?
    pub fn game_over(&self) -> bool {
        self.foundation().iter().all(|pile| pile.len() == CARDS_PER_SUIT)
    }

    /// Are more empty columns needed for kings?
    #[inline]
    pub(crate) fn need_king_space(&self) -> bool {
        (self.king_spaces as usize) < SUITS_PER_DECK
    }

    /// Reset to the freshly dealt position: 28 cards to the tableau with the
    /// top of each pile face-up, the remaining 24 to the stock in reverse
    /// deck order.
    pub fn deal(&mut self) {
        self.king_spaces = 0;
        self.recycle_count = 0;
        self.dominant_cache.clear();
        for pile in self.piles.iter_mut() {
            pile.clear();
        }

        let cards = *self.deck.cards();
        let mut next = 0;
        for pile in 0..TABLEAU_SIZE {
            for target in pile..TABLEAU_SIZE {
                self.piles[TABLEAU_BASE + target].push(cards[next]);
                next += 1;
            }
            self.piles[TABLEAU_BASE + pile].set_up_count(1);
            if self.piles[TABLEAU_BASE + pile].cards()[0].rank() == KING {
                self.king_spaces += 1;
            }
        }
        debug_assert_eq!(next, TABLEAU_CARDS);
        for &card in cards[TABLEAU_CARDS..].iter().rev() {
            self.piles[STOCK].push(card);
        }
    }

    /// Apply a move.
    pub fn make_move(&mut self, mv: MoveSpec) {
        let to = mv.to();
        if mv.is_stock_move() {
            {
                let (waste, stock) = self.pile_pair_mut(PileId::Waste, PileId::Stock);
                waste.draw(stock, mv.draw_count());
            }
            let (waste, to_pile) = self.pile_pair_mut(PileId::Waste, to);
            let card = waste.pop();
            to_pile.push(card);
            to_pile.incr_up_count(1);
            self.recycle_count += mv.recycle() as u8;
        } else {
            let from = mv.from();
            let n = mv.n_cards();
            let is_ladder = mv.is_ladder_move();
            {
                let (from_pile, to_pile) = self.pile_pair_mut(from, to);
                to_pile.take(from_pile, n);
                debug_assert!(!(from.is_tableau() && from_pile.up_count() != mv.from_up_count()));
                to_pile.incr_up_count(n as i32);
            }
            if is_ladder {
                let (from_pile, fnd) = self.pile_pair_mut(from, mv.ladder_pile());
                fnd.draw(from_pile, 1);
            }
            let from_is_tableau = from.is_tableau();
            let from_pile = &mut self.piles[from.index()];
            if from_pile.is_empty() {
                from_pile.set_up_count(0);
                self.king_spaces += from_is_tableau as u8;
            } else {
                // Face-up counts matter on tableau piles only; elsewhere the
                // arithmetic runs blind.
                from_pile
                    .incr_up_count(mv.flips_top_card() as i32 - (n + is_ladder as usize) as i32);
            }
        }
    }

    /// Reverse a move made by [`Game::make_move`]. Restores the state
    /// bit-for-bit.
    pub fn unmake_move(&mut self, mv: MoveSpec) {
        let to = mv.to();
        if mv.is_stock_move() {
            {
                let (waste, to_pile) = self.pile_pair_mut(PileId::Waste, to);
                to_pile.incr_up_count(-1);
                let card = to_pile.pop();
                waste.push(card);
            }
            let (stock, waste) = self.pile_pair_mut(PileId::Stock, PileId::Waste);
            stock.draw(waste, mv.draw_count());
            self.recycle_count -= mv.recycle() as u8;
        } else {
            let from = mv.from();
            let n = mv.n_cards();
            if mv.is_ladder_move() {
                let (from_pile, fnd) = self.pile_pair_mut(from, mv.ladder_pile());
                let from_pile_empty = from_pile.is_empty();
                from_pile.draw(fnd, 1);
                self.king_spaces -= from_pile_empty as u8;
            }
            if from.is_tableau() {
                let empty = self.piles[from.index()].is_empty();
                self.king_spaces -= empty as u8;
                self.piles[from.index()].set_up_count(mv.from_up_count());
            }
            let (from_pile, to_pile) = self.pile_pair_mut(from, to);
            from_pile.take(to_pile, n);
            to_pile.incr_up_count(-(n as i32));
        }
    }

    /// Apply one user-level listed move.
    pub fn make_xmove(&mut self, xmv: &XMove) {
        let n = xmv.n_cards;
        let from_empty;
        {
            let (from_pile, to_pile) = self.pile_pair_mut(xmv.from, xmv.to);
            if xmv.from == PileId::Stock || xmv.to == PileId::Stock {
                to_pile.draw(from_pile, n as i32);
            } else {
                to_pile.take(from_pile, n);
            }
            from_empty = from_pile.is_empty();
            to_pile.incr_up_count(n as i32);
            from_pile.incr_up_count(-(n as i32));
        }
        if from_empty && xmv.from.is_tableau() {
            self.king_spaces += 1;
        }
        if xmv.flip {
            self.piles[xmv.from.index()].set_up_count(1);
        }
    }

    fn valid_transfer(&self, from: PileId, to: PileId, n_cards: usize) -> bool {
        if n_cards == 0 || n_cards > 24 {
            return false;
        }
        let from_pile = self.pile(from);
        let to_pile = self.pile(to);
        if n_cards > from_pile.len() {
            return false;
        }
        let cover_card = from_pile.cards()[from_pile.len() - n_cards];
        if to.is_tableau() {
            if to_pile.is_empty() {
                cover_card.rank() == KING
            } else {
                cover_card.covers(to_pile.back())
            }
        } else if let Some(suit) = to.foundation_suit() {
            cover_card.suit() == suit && cover_card.rank() as usize == to_pile.len()
        } else {
            true
        }
    }

    /// Does `mv` obey the rules in the current state?
    pub fn is_valid(&self, mv: MoveSpec) -> bool {
        if mv.is_stock_move() {
            let draw = mv.draw_count();
            if draw > 0 {
                self.valid_transfer(PileId::Stock, mv.to(), draw as usize)
            } else {
                self.valid_transfer(PileId::Waste, mv.to(), (-draw) as usize + 1)
            }
        } else {
            self.valid_transfer(mv.from(), mv.to(), mv.n_cards())
        }
    }

    /// Does the listed move obey the rules in the current state?
    pub fn is_valid_xmove(&self, xmv: &XMove) -> bool {
        self.valid_transfer(xmv.from, xmv.to, xmv.n_cards)
    }

    #[cfg(test)]
    pub(crate) fn swap_tableau_piles(&mut self, a: usize, b: usize) {
        self.piles.swap(TABLEAU_BASE + a, TABLEAU_BASE + b);
    }
}

impl Clone for Game {
    fn clone(&self) -> Game {
        Game {
            piles: self.piles.clone(),
            draw_setting: self.draw_setting,
            recycle_limit: self.recycle_limit,
            recycle_count: self.recycle_count,
            king_spaces: self.king_spaces,
            deck: self.deck.clone(),
            dominant_cache: DominantCache::new(),
        }
    }
}

/// State equality for round-trip checks; the move cache is scratch and does
/// not participate.
impl PartialEq for Game {
    fn eq(&self, other: &Game) -> bool {
        self.piles == other.piles
            && self.draw_setting == other.draw_setting
            && self.recycle_limit == other.recycle_limit
            && self.recycle_count == other.recycle_count
            && self.king_spaces == other.king_spaces
    }
}

impl Eq for Game {}
