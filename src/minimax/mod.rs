//! Minimax over a persistent game tree.
//!
//! Unlike [`crate::expectimax`], the tile spawn is modelled adversarially:
//! each computer turn has exactly one reply, the placement that maximizes
//! `islands - smoothness` over every empty cell and both tile values. The tree
//! survives between calls; when the observed board is already in it, the
//! matching subtree becomes the new root and only its frontier is grown.
//!
//! ```
//! use auto_2048::engine::Board;
//! use auto_2048::minimax::{Minimax, MinimaxConfig};
//! use auto_2048::player::Strategy;
//!
//! let mut mm = Minimax::new(MinimaxConfig::default()).unwrap();
//! let b = Board::EMPTY.with_tile(0, 0, 2).with_tile(1, 0, 2);
//! assert!(mm.search(b, None, 2).is_some());
//! assert!(mm.tree_depth() >= 3);
//! ```

mod evaluator;
mod tree;

pub use evaluator::{empty_score, islands, max_rank, monotonicity, smoothness, EvalWeights, Evaluator};
pub use tree::{GameTree, Node, Turn};

use crate::engine::{Board, Move};
use crate::error::ConfigError;
use crate::player::Strategy;
use crate::pool::{Handle, PoolError};

const TILE_CHOICES: [u32; 2] = [2, 4];

#[derive(Debug, Clone, Default)]
pub struct MinimaxConfig {
    pub weights: EvalWeights,
    /// Upper bound on live tree nodes. Expansion stops when it is reached.
    pub node_limit: Option<usize>,
}

impl MinimaxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_limit == Some(0) {
            return Err(ConfigError::Zero { name: "node_limit" });
        }
        self.weights.validate()
    }
}

/// Counters from the last [`Minimax::search`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimaxStats {
    /// Nodes visited by the value pass.
    pub positions: u64,
    /// Sibling loops cut short by alpha-beta.
    pub cutoffs: u64,
    /// Nodes added while growing the tree.
    pub grown: u64,
    /// True when the tree reused a subtree from the previous call.
    pub reused: bool,
}

pub struct Minimax {
    tree: GameTree,
    evaluator: Evaluator,
    stats: MinimaxStats,
    exhausted: bool,
}

impl Minimax {
    pub fn new(cfg: MinimaxConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let tree = match cfg.node_limit {
            Some(limit) => GameTree::with_node_limit(limit),
            None => GameTree::new(),
        };
        Ok(Self { tree, evaluator: Evaluator::new(cfg.weights), stats: MinimaxStats::default(), exhausted: false })
    }

    /// Best direction looking `depth` plies ahead, None when `depth` is 0 or no move is legal.
    pub fn search(&mut self, board: Board, last_move: Option<Move>, depth: u32) -> Option<Move> {
        if depth == 0 {
            return None;
        }
        self.stats = MinimaxStats::default();
        let root = match self.change_root(board, last_move) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!(%err, "could not seed minimax tree");
                return None;
            }
        };
        self.grow(depth);

        let mut best = f64::NEG_INFINITY;
        let mut best_dir = None;
        let mut i = 0;
        while let Some(child) = self.tree.child(root, i) {
            let v = self.value(child, depth - 1, best, f64::INFINITY);
            if v > best {
                best = v;
                best_dir = self.tree.node(child).and_then(|n| n.dir);
            }
            i += 1;
        }
        if let Some(node) = self.tree.node_mut(root) {
            node.value = best;
        }
        tracing::debug!(
            value = best,
            dir = ?best_dir,
            positions = self.stats.positions,
            cutoffs = self.stats.cutoffs,
            nodes = self.tree.len(),
            "minimax search"
        );
        best_dir
    }

    /// Live nodes in the persistent tree.
    #[inline]
    pub fn tree_len(&self) -> usize { self.tree.len() }

    /// Levels in the persistent tree (a lone root is 1).
    #[inline]
    pub fn tree_depth(&self) -> u32 { self.tree.depth() }

    #[inline]
    pub fn last_stats(&self) -> MinimaxStats { self.stats }

    #[inline]
    pub fn evaluator(&self) -> &Evaluator { &self.evaluator }

    /// Point the root at `board`: reuse a matching player-turn node, else start fresh.
    fn change_root(&mut self, board: Board, last_move: Option<Move>) -> Result<Handle, PoolError> {
        let found = self.tree.find(|n| n.board == board && n.turn == Some(Turn::Player));
        match (self.tree.root(), found) {
            (Some(root), Some(node)) => {
                if node != root {
                    tracing::trace!(?last_move, kept = self.tree.len(), "re-rooting minimax tree");
                    self.tree.reroot(node);
                }
                self.stats.reused = true;
                Ok(node)
            }
            (had_root, _) => {
                if had_root.is_some() {
                    tracing::trace!(?last_move, "board not in tree; reseeding");
                }
                self.exhausted = false;
                self.tree.seed(board)
            }
        }
    }

    fn grow(&mut self, depth: u32) {
        while self.tree.depth() <= depth {
            let before = self.tree.len();
            for leaf in self.tree.leaves() {
                self.expand(leaf);
            }
            if self.tree.len() == before {
                break;
            }
            self.stats.grown += (self.tree.len() - before) as u64;
        }
    }

    fn expand(&mut self, leaf: Handle) {
        let Some(node) = self.tree.node(leaf) else { return };
        let (board, dir, turn) = (node.board, node.dir, node.turn);
        let result = match turn {
            Some(Turn::Player) => Move::ALL.into_iter().try_for_each(|d| {
                let next = board.shift(d);
                if next == board {
                    return Ok(());
                }
                self.tree.insert(leaf, Node::new(next, Some(d), Turn::Computer)).map(drop)
            }),
            Some(Turn::Computer) => match worst_placement(board) {
                Some(next) => self.tree.insert(leaf, Node::new(next, dir, Turn::Player)).map(drop),
                None => Ok(()),
            },
            None => Ok(()),
        };
        if let Err(err) = result {
            if !self.exhausted {
                tracing::warn!(%err, nodes = self.tree.len(), "minimax tree cannot grow further");
                self.exhausted = true;
            }
        }
    }

    /// Alpha-beta value of the subtree at `h`, searched `depth` more plies.
    fn value(&mut self, h: Handle, depth: u32, mut alpha: f64, mut beta: f64) -> f64 {
        self.stats.positions += 1;
        let Some(node) = self.tree.node(h) else { return 0.0 };
        let (board, turn, leaf) = (node.board, node.turn, node.is_leaf());

        let v = if depth == 0 || leaf {
            self.evaluator.value(board)
        } else {
            let maximizing = turn == Some(Turn::Player);
            let mut best = if maximizing { f64::NEG_INFINITY } else { f64::INFINITY };
            let mut i = 0;
            while let Some(child) = self.tree.child(h, i) {
                let score = self.value(child, depth - 1, alpha, beta);
                if maximizing {
                    best = best.max(score);
                    alpha = alpha.max(best);
                } else {
                    best = best.min(score);
                    beta = beta.min(best);
                }
                if alpha >= beta {
                    self.stats.cutoffs += 1;
                    break;
                }
                i += 1;
            }
            best
        };
        if let Some(node) = self.tree.node_mut(h) {
            node.value = v;
        }
        v
    }
}

/// The tile placement the adversary picks: first maximizer of
/// `islands - smoothness` over every empty cell and tile value.
fn worst_placement(board: Board) -> Option<Board> {
    let mut worst: Option<(i32, Board)> = None;
    for (x, y) in board.empty_cells() {
        for value in TILE_CHOICES {
            let candidate = board.with_tile(x, y, value);
            let score = evaluator::adversarial_score(candidate);
            if worst.map_or(true, |(s, _)| score > s) {
                worst = Some((score, candidate));
            }
        }
    }
    worst.map(|(_, b)| b)
}

impl Strategy for Minimax {
    fn search(&mut self, board: Board, last_move: Option<Move>, depth: u32) -> Option<Move> {
        Minimax::search(self, board, last_move, depth)
    }

    fn name(&self) -> &'static str { "minimax" }
}
