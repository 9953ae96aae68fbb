//! The shortest complete solution found so far.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::types::{MoveSequence, MoveSpec};

const NO_SOLUTION: u32 = u32::MAX;

/// Best solution shared by all workers. Readers check the move count
/// without locking; writers double-check under the lock before replacing.
pub struct CandidateSolution {
    moves: Mutex<Vec<MoveSpec>>,
    move_count: AtomicU32,
}

impl Default for CandidateSolution {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSolution {
    pub fn new() -> CandidateSolution {
        CandidateSolution {
            moves: Mutex::new(Vec::new()),
            move_count: AtomicU32::new(NO_SOLUTION),
        }
    }

    /// User-move count of the best solution, or `u32::MAX` when none has
    /// been found yet, which makes it directly usable as a pruning bound.
    #[inline]
    pub fn move_count(&self) -> u32 {
        self.move_count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.move_count() == NO_SOLUTION
    }

    /// Install `sequence` as the best solution if it is strictly shorter
    /// than the current one.
    pub fn replace_if_shorter(&self, sequence: &MoveSequence, count: u32) {
        if count < self.move_count() {
            let mut moves = self.moves.lock();
            if count < self.move_count() {
                moves.clear();
                moves.extend(sequence.iter());
                self.move_count.store(count, Ordering::Release);
            }
        }
    }

    /// Clone out the winning moves.
    pub fn moves(&self) -> Vec<MoveSpec> {
        self.moves.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PileId;

    fn sequence(n: usize) -> MoveSequence {
        let mut seq = MoveSequence::new();
        for _ in 0..n {
            seq.push_back(MoveSpec::non_stock_move(PileId::Tableau1, PileId::FoundationC, 1, 1));
        }
        seq
    }

    #[test]
    fn keeps_the_shortest() {
        let best = CandidateSolution::new();
        assert!(best.is_empty());
        assert_eq!(best.move_count(), u32::MAX);

        best.replace_if_shorter(&sequence(10), 10);
        assert_eq!(best.move_count(), 10);
        assert_eq!(best.moves().len(), 10);

        best.replace_if_shorter(&sequence(12), 12);
        assert_eq!(best.move_count(), 10, "longer solution must not replace");

        best.replace_if_shorter(&sequence(7), 7);
        assert_eq!(best.move_count(), 7);
        assert_eq!(best.moves().len(), 7);
    }

    #[test]
    fn racing_replacements_keep_a_consistent_pair() {
        use std::sync::Arc;
        let best = Arc::new(CandidateSolution::new());
        let mut handles = Vec::new();
        for count in [30u32, 20, 25, 15, 40] {
            let best = Arc::clone(&best);
            handles.push(std::thread::spawn(move || {
                best.replace_if_shorter(&sequence(count as usize), count);
            }));
        }
        for h in handles {
            h.join().expect("no panic");
        }
        assert_eq!(best.move_count(), 15);
        assert_eq!(best.moves().len(), 15);
    }
}
