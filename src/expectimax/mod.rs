//! Expectimax search policy for 2048.
//!
//! - [`Search`]: the single-threaded recursion for one root direction, with its
//!   own [`TranspositionCache`].
//! - [`Dispatcher`]: fans the four root directions out to a fixed worker pool.
//! - [`Expectimax`]: the strategy object tying both together.
//!
//! Notes
//! - The engine's move tables and the heuristic table are initialized lazily;
//!   constructors warm them for you.
//! - Expectimax is deterministic; randomness only occurs when applying moves
//!   with `Board::make_move`. The parallel and sequential paths return
//!   bit-identical scores.
//!
//! Quick start
//! ```
//! use auto_2048::engine::Board;
//! use auto_2048::expectimax::Expectimax;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = Board::initial(&mut rng);
//!
//! let mut ex = Expectimax::new().unwrap();
//! let m = ex.best_move(b0, 2);
//! assert!(m.is_some());
//! ```

use crate::engine::{self, Board, Move};
use crate::error::ConfigError;
use crate::player::Strategy;

mod cache;
mod dispatch;
mod heuristic;
mod search;

pub use cache::TranspositionCache;
pub use dispatch::{best_branch, Dispatcher, RootEvaluation};
pub use search::{Search, TIE_EPSILON};

/// Configurable knobs for Expectimax.
///
/// - `prob_cutoff`: prune chance branches when cumulative probability falls below this value.
/// - `depth_ceiling`: hard cap on the effective depth of one search.
/// - `cache_enabled`: enable/disable transposition table usage.
/// - `cache_depth_ceiling`: only chance nodes shallower than this ply are cached.
/// - `two_tile_prob`: weight of the 2-tile hypothesis at chance nodes.
/// - `workers`: worker threads for root dispatch (None = hardware concurrency + 1).
#[derive(Debug, Clone)]
pub struct ExpectimaxConfig {
    /// Probability cutoff for chance-node pruning.
    pub prob_cutoff: f32,
    /// Effective depth never exceeds this many plies.
    pub depth_ceiling: u32,
    /// Enable/disable transposition caching.
    pub cache_enabled: bool,
    /// Chance nodes at plies `< cache_depth_ceiling` are memoized.
    pub cache_depth_ceiling: u32,
    /// Probability that a spawned tile is a 2. Must match the game's spawner.
    pub two_tile_prob: f32,
    /// Size of the root dispatch pool.
    pub workers: Option<usize>,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            prob_cutoff: 1e-4,
            depth_ceiling: 15,
            cache_enabled: true,
            cache_depth_ceiling: 4,
            two_tile_prob: engine::TWO_TILE_PROB as f32,
            workers: None,
        }
    }
}

impl ExpectimaxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("prob_cutoff", self.prob_cutoff), ("two_tile_prob", self.two_tile_prob)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.depth_ceiling == 0 {
            return Err(ConfigError::Zero { name: "depth_ceiling" });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Zero { name: "workers" });
        }
        Ok(())
    }
}

/// Per-branch expected value at the root (no normalization).
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

impl BranchEval {
    pub(crate) fn illegal(dir: Move) -> Self { BranchEval { dir, ev: 0.0, legal: false } }
}

/// Search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Moves evaluated.
    pub nodes: u64,
    /// Most nodes spent on a single root direction.
    pub peak_nodes: u64,
    pub cache_hits: u64,
    pub cache_entries: u64,
    /// Deepest ply that reached a leaf.
    pub max_depth: u32,
    /// Effective depth limit that was searched.
    pub depth_limit: u32,
}

impl SearchStats {
    /// Fold another job's stats into this one.
    pub fn absorb(&mut self, other: SearchStats) {
        self.nodes += other.nodes;
        self.peak_nodes = self.peak_nodes.max(other.peak_nodes);
        self.cache_hits += other.cache_hits;
        self.cache_entries += other.cache_entries;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.depth_limit = self.depth_limit.max(other.depth_limit);
    }
}

/// Threaded expectimax strategy: one independent search per root direction.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    dispatcher: Dispatcher,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Result<Self, ConfigError> { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        warm_engine_and_heuristics();
        let workers = cfg.workers.unwrap_or_else(Dispatcher::default_workers);
        let dispatcher = Dispatcher::new(workers)?;
        Ok(Self { cfg, dispatcher, stats: SearchStats::default() })
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    /// Compute the best move at `depth` requested plies; None when no move is legal.
    #[inline]
    pub fn best_move(&mut self, board: Board, depth: u32) -> Option<Move> {
        best_branch(&self.branch_evals(board, depth))
    }

    /// Compute EV for each direction in parallel.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board, depth: u32) -> [BranchEval; 4] {
        let RootEvaluation { branches, stats } = self.dispatcher.evaluate(board, depth, &self.cfg);
        self.stats = stats;
        branches
    }

    /// Statistics collected from the last call to [`Self::best_move`] or [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    /// Worker threads in the dispatch pool.
    #[inline]
    pub fn workers(&self) -> usize { self.dispatcher.workers() }
}

impl Strategy for Expectimax {
    fn search(&mut self, board: Board, _last_move: Option<Move>, depth: u32) -> Option<Move> {
        if depth == 0 {
            return None;
        }
        self.best_move(board, depth)
    }

    fn effective_depth(&self, board: Board, depth: u32) -> u32 {
        Search::effective_depth(&self.cfg, board, depth)
    }

    fn name(&self) -> &'static str { "expectimax" }
}

/// Common helper for constructors to ensure tables are initialized.
fn warm_engine_and_heuristics() {
    // Safe to call multiple times.
    engine::new();
    heuristic::warm();
}

/// Raw heuristic value for a board (sum of the row and column line scores).
#[inline]
pub fn heuristic_value(board: Board) -> f64 { heuristic::get_heuristic_score(board) }
