//! The A* worker loop.

use std::sync::Arc;

use log::trace;

use super::heuristic::minimum_moves_left;
use super::move_tree::{MoveStorage, SharedMoveStorage};
use super::solution::CandidateSolution;
use super::state_memory::GameStateMemory;
use crate::game::Game;
use crate::movegen::MoveList;

/// Everything one worker owns or shares.
pub(crate) struct Worker {
    game: Game,
    storage: MoveStorage,
    closed_list: Arc<GameStateMemory>,
    best_solution: Arc<CandidateSolution>,
}

impl Worker {
    pub fn new(
        game: Game,
        shared_storage: Arc<SharedMoveStorage>,
        closed_list: Arc<GameStateMemory>,
        best_solution: Arc<CandidateSolution>,
    ) -> Worker {
        Worker {
            game,
            storage: MoveStorage::new(shared_storage),
            closed_list,
            best_solution,
        }
    }

    /// Make available moves until a branching node or a childless one is
    /// reached. While exactly one move is available (a dominant move, or
    /// the lone survivor of pruning), making it costs nothing in search
    /// breadth, so it goes straight onto the stem.
    fn make_auto_moves(&mut self) -> MoveList {
        loop {
            let available = self.game.available_moves(self.storage.sequence());
            if available.len() != 1 {
                return available;
            }
            self.storage.push_stem(available[0]);
            self.game.make_move(available[0]);
        }
    }

    /// Expand fringe leaves until the search is exhausted, cut off, or over
    /// its memory limit.
    pub fn run(&mut self) {
        loop {
            if self.storage.shared().over_limit() {
                trace!("worker stopping: move tree over limit");
                break;
            }
            let Some(min_moves) = self.storage.pop_next_move_sequence() else {
                trace!("worker stopping: fringe exhausted");
                break;
            };
            if min_moves >= self.best_solution.move_count() {
                trace!("worker stopping: remaining leaves cannot beat the best solution");
                break;
            }

            // Restore the game to the state this sequence was enqueued in.
            self.game.deal();
            self.storage.load_move_sequence();
            self.storage.make_sequence_moves(&mut self.game);

            let available = self.make_auto_moves();
            let moves_made = self.storage.sequence().move_count();

            if available.is_empty() {
                // A dead end or a win.
                if self.game.game_over() {
                    self.best_solution.replace_if_shorter(self.storage.sequence(), moves_made);
                }
                continue;
            }

            for &mv in available.iter() {
                self.game.make_move(mv);
                let made = moves_made + mv.n_moves();
                // Both the bound and the closed-set upsert are expensive,
                // the upsert more so. With a solution in hand the bound can
                // run first and sometimes skip the upsert; without one, the
                // upsert runs first and sometimes skips the bound.
                let mut min_remaining = None;
                let mut pass = true;
                if !self.best_solution.is_empty() {
                    let remaining = minimum_moves_left(&self.game);
                    pass = made + remaining < self.best_solution.move_count();
                    min_remaining = Some(remaining);
                }
                if pass && self.closed_list.is_short_path_to_state(&self.game, made) {
                    let remaining =
                        min_remaining.unwrap_or_else(|| minimum_moves_left(&self.game));
                    let min_total = made + remaining;
                    // Consistency of the bound. Never remove this.
                    debug_assert!(
                        min_moves <= min_total,
                        "bound regressed across {mv}: {min_moves} > {min_total}",
                    );
                    self.storage.push_branch(mv, min_total);
                }
                self.game.unmake_move(mv);
            }
            self.storage.share_moves();
        }
    }
}
