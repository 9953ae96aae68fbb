//! Shared move tree and the per-worker storage that feeds it.
//!
//! The tree is an append-only arena of `(move, parent index)` nodes; a leaf
//! in the fringe names its parent node, and following parent links
//! reconstructs the whole move prefix. Parent indices are always strictly
//! smaller than the child's, so cycles are impossible by construction.
//! Appends happen under one writer lock; readers walking parent links see
//! the nodes they need because a leaf is published to the fringe only after
//! the tree write that created its parent completed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::fringe::IndexedPriorityQueue;
use crate::game::Game;
use crate::types::{MoveSequence, MoveSpec, SEQUENCE_CAPACITY};

/// Parent index of root nodes.
const NO_PARENT: u32 = u32::MAX;

/// One node of the shared move tree; doubles as a fringe leaf.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MoveNode {
    pub mv: MoveSpec,
    pub parent: u32,
}

impl Default for MoveNode {
    fn default() -> Self {
        MoveNode {
            mv: MoveSpec::DEFAULT,
            parent: NO_PARENT,
        }
    }
}

/// Move storage shared by all workers: the explored prefix of the move
/// graph plus the fringe of leaves waiting to grow branches.
pub struct SharedMoveStorage {
    tree_size_limit: usize,
    tree: RwLock<Vec<MoveNode>>,
    /// Size mirror; the limit check runs every worker iteration and must
    /// not take the tree lock.
    tree_len: AtomicUsize,
    fringe: IndexedPriorityQueue<MoveNode>,
    /// Lower bound of the freshly dealt game; fringe keys are offsets from
    /// it.
    initial_min_moves: u32,
    /// The first pop drives the first worker to the root instead.
    first_time: AtomicBool,
}

impl SharedMoveStorage {
    pub fn new(tree_size_limit: usize, initial_min_moves: u32) -> SharedMoveStorage {
        let mut tree = Vec::new();
        tree.reserve(tree_size_limit + 1000);
        SharedMoveStorage {
            tree_size_limit,
            tree: RwLock::new(tree),
            tree_len: AtomicUsize::new(0),
            fringe: IndexedPriorityQueue::new(),
            initial_min_moves,
            first_time: AtomicBool::new(true),
        }
    }

    pub fn move_tree_size(&self) -> usize {
        self.tree_len.load(Ordering::Acquire)
    }

    pub fn fringe_size(&self) -> usize {
        self.fringe.len()
    }

    pub fn over_limit(&self) -> bool {
        self.move_tree_size() > self.tree_size_limit
    }
}

struct BranchEntry {
    mv: MoveSpec,
    /// Heuristic total minus the initial lower bound: the fringe key.
    offset: u32,
}

/// One worker's private view of the shared storage: the move sequence it is
/// currently working on, the leaf that sequence came from, and the branches
/// staged for publication.
pub struct MoveStorage {
    shared: Arc<SharedMoveStorage>,
    current_sequence: MoveSequence,
    /// The leaf popped from the fringe; its move is the sequence's last.
    leaf: MoveNode,
    /// Prefix length already present in the shared tree.
    start_size: usize,
    branches: SmallVec<[BranchEntry; 32]>,
}

impl MoveStorage {
    pub fn new(shared: Arc<SharedMoveStorage>) -> MoveStorage {
        MoveStorage {
            shared,
            current_sequence: MoveSequence::new(),
            leaf: MoveNode::default(),
            start_size: 0,
            branches: SmallVec::new(),
        }
    }

    #[inline]
    pub fn shared(&self) -> &SharedMoveStorage {
        &self.shared
    }

    #[inline]
    pub fn sequence(&self) -> &MoveSequence {
        &self.current_sequence
    }

    /// Append a no-choice move to the current stem.
    pub fn push_stem(&mut self, mv: MoveSpec) {
        // This is where the solver lands if the redundant-move filter ever
        // lets a cyclic extension through.
        assert!(
            self.current_sequence.len() < SEQUENCE_CAPACITY,
            "move sequence overflow, cyclic extension not filtered: {}",
            self.current_sequence,
        );
        self.current_sequence.push_back(mv);
    }

    /// Stage the first move of a branch off the current stem together with
    /// its minimum total move count.
    pub fn push_branch(&mut self, mv: MoveSpec, min_moves: u32) {
        debug_assert!(self.shared.initial_min_moves <= min_moves);
        self.branches.push(BranchEntry {
            mv,
            offset: min_moves - self.shared.initial_min_moves,
        });
    }

    /// Publish this expansion: append the stem to the shared tree, then
    /// push every staged branch into the fringe. With no surviving branch
    /// the stem leads nowhere and is not stored at all.
    pub fn share_moves(&mut self) {
        if self.branches.is_empty() {
            return;
        }
        let stem_end = self.update_move_tree();
        self.update_fringe(stem_end);
        self.branches.clear();
    }

    /// Append stem moves to the tree, each pointing at the one before.
    /// Returns the index of the last stem node.
    fn update_move_tree(&mut self) -> u32 {
        let mut stem_end = self.leaf.parent;
        let mut tree = self.shared.tree.write();
        for mv in self.current_sequence.iter().skip(self.start_size) {
            tree.push(MoveNode {
                mv,
                parent: stem_end,
            });
            stem_end = (tree.len() - 1) as u32;
        }
        self.shared.tree_len.store(tree.len(), Ordering::Release);
        stem_end
    }

    fn update_fringe(&mut self, stem_end: u32) {
        // Highest offset first: stacks are LIFO, so within a bucket the
        // most promising branch of this expansion pops first.
        self.branches.sort_by(|a, b| b.offset.cmp(&a.offset));
        for branch in &self.branches {
            self.shared.fringe.push(
                branch.offset as usize,
                MoveNode {
                    mv: branch.mv,
                    parent: stem_end,
                },
            );
        }
    }

    /// Take the most promising waiting sequence and make it current.
    /// Returns its minimum total move count, or `None` when the fringe
    /// stays empty. The very first call returns the root sequence.
    pub fn pop_next_move_sequence(&mut self) -> Option<u32> {
        if self.shared.first_time.swap(false, Ordering::AcqRel) {
            self.leaf = MoveNode::default();
            return Some(self.shared.initial_min_moves);
        }
        let (offset, leaf) = self.shared.fringe.pop()?;
        self.leaf = leaf;
        Some(offset as u32 + self.shared.initial_min_moves)
    }

    /// Rebuild the current sequence from the tree by following parent
    /// links back to a root.
    pub fn load_move_sequence(&mut self) {
        self.current_sequence.clear();
        {
            let tree = self.shared.tree.read();
            let mut node = self.leaf.parent;
            while node != NO_PARENT {
                let entry = tree[node as usize];
                self.current_sequence.push_front(entry.mv);
                node = entry.parent;
            }
        }
        self.start_size = self.current_sequence.len();
        if !self.leaf.mv.is_default() {
            self.current_sequence.push_back(self.leaf.mv);
        }
    }

    /// Replay the current sequence onto a freshly dealt game.
    pub fn make_sequence_moves(&self, game: &mut Game) {
        for mv in self.current_sequence.iter() {
            game.make_move(mv);
        }
    }
}
