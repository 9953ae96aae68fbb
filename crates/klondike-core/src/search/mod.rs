//! Parallel A* search for a minimum-move solution.
//!
//! Workers pop frontier leaves from a shared fringe, rebuild and replay the
//! move prefix each leaf stands for, extend it with forced moves, and stage
//! every surviving branch back into the shared tree and fringe. A shared
//! candidate solution holds the shortest win found so far; the consistent
//! lower bound guarantees that the first solution no remaining leaf can
//! beat is minimal.

mod fringe;
mod heuristic;
mod move_tree;
mod solution;
mod state_memory;
mod worker;

pub use heuristic::minimum_moves_left;
pub use state_memory::{GameKey, GameStateMemory};

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::debug;

use move_tree::SharedMoveStorage;
use solution::CandidateSolution;
use worker::Worker;

use crate::game::Game;
use crate::types::{move_count, MoveSpec};

/// Search limits. `threads == 0` means one worker per hardware thread.
#[derive(Debug, Clone)]
pub struct SolverLimits {
    /// Give up once the shared move tree outgrows this many nodes.
    pub move_tree_limit: usize,
    pub threads: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        SolverLimits {
            move_tree_limit: 12_000_000,
            threads: 0,
        }
    }
}

/// How a solve run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A minimum solution was found.
    SolvedMinimal,
    /// A solution was found, but the tree-size limit was reached; a shorter
    /// one may exist.
    Solved,
    /// The whole reachable graph was searched; there is no solution.
    Impossible,
    /// No solution was found before the tree-size limit was reached.
    GaveUp,
}

/// Result of [`solve`].
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub outcome: SolveOutcome,
    /// The winning sequence, empty unless solved.
    pub moves: Vec<MoveSpec>,
    /// Distinct game states visited.
    pub branch_count: usize,
    pub move_tree_size: usize,
    /// Leaves still queued when the search stopped.
    pub fringe_size: usize,
}

impl SolveResult {
    /// User-move count of the solution.
    pub fn move_count(&self) -> u32 {
        move_count(&self.moves)
    }
}

/// One worker per hardware thread.
pub fn default_threads() -> usize {
    thread::available_parallelism().map(usize::from).unwrap_or(1)
}

/// Solve for minimum moves if possible.
///
/// Memory use is unpredictable from the deal alone; `move_tree_limit`
/// bounds it. There are no timeouts; a caller wanting one should lower
/// the limit instead.
pub fn solve(game: &Game, limits: &SolverLimits) -> SolveResult {
    let mut master = game.clone();
    master.deal();
    if master.game_over() {
        // Degenerate: nothing to do.
        return SolveResult {
            outcome: SolveOutcome::SolvedMinimal,
            moves: Vec::new(),
            branch_count: 0,
            move_tree_size: 0,
            fringe_size: 0,
        };
    }

    let initial_min_moves = minimum_moves_left(&master);
    let n_threads = match limits.threads {
        0 => default_threads(),
        n => n,
    };
    debug!(
        "solve: lower bound {initial_min_moves}, {n_threads} threads, tree limit {}",
        limits.move_tree_limit
    );

    let shared_storage = Arc::new(SharedMoveStorage::new(limits.move_tree_limit, initial_min_moves));
    let closed_list = Arc::new(GameStateMemory::new());
    let best_solution = Arc::new(CandidateSolution::new());

    let spawn_worker = |id: usize| {
        let mut worker = Worker::new(
            master.clone(),
            Arc::clone(&shared_storage),
            Arc::clone(&closed_list),
            Arc::clone(&best_solution),
        );
        thread::Builder::new()
            .name(format!("solver-worker-{id}"))
            .spawn(move || worker.run())
            .expect("spawn solver worker")
    };

    let mut handles = Vec::with_capacity(n_threads - 1);
    for t in 0..n_threads - 1 {
        handles.push(spawn_worker(t + 1));
        if t == 0 {
            // Give the first worker a head start to populate the fringe;
            // until it publishes a branch, late starters see an empty queue
            // and retire immediately.
            thread::sleep(Duration::from_millis(3));
        }
    }
    // The caller's thread is worker 0.
    Worker::new(
        master,
        Arc::clone(&shared_storage),
        Arc::clone(&closed_list),
        Arc::clone(&best_solution),
    )
    .run();
    for handle in handles {
        handle.join().expect("solver worker panicked");
    }

    let outcome = match (!best_solution.is_empty(), shared_storage.over_limit()) {
        (true, false) => SolveOutcome::SolvedMinimal,
        (true, true) => SolveOutcome::Solved,
        (false, false) => SolveOutcome::Impossible,
        (false, true) => SolveOutcome::GaveUp,
    };
    let result = SolveResult {
        outcome,
        moves: best_solution.moves(),
        branch_count: closed_list.len(),
        move_tree_size: shared_storage.move_tree_size(),
        fringe_size: shared_storage.fringe_size(),
    };
    debug!(
        "solve: {:?}, {} moves, {} states, tree {}, fringe {}",
        result.outcome,
        result.move_count(),
        result.branch_count,
        result.move_tree_size,
        result.fringe_size
    );
    result
}
