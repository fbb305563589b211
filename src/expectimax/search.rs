use crate::engine::{Board, Move};

use super::cache::TranspositionCache;
use super::heuristic::get_heuristic_score;
use super::{ExpectimaxConfig, SearchStats};

/// Added to every legal root score so a legal move always beats an illegal one
/// (scored 0) and exact ties resolve toward the earlier direction.
pub const TIE_EPSILON: f64 = 1e-6;

/// Single-threaded expectimax recursion for one root direction.
///
/// Owns its transposition cache; nothing here is shared between threads.
pub struct Search<'a> {
    cfg: &'a ExpectimaxConfig,
    cache: TranspositionCache,
    depth_limit: u32,
    cur_depth: u32,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    pub fn new(cfg: &'a ExpectimaxConfig) -> Self {
        super::warm_engine_and_heuristics();
        Self { cfg, cache: TranspositionCache::new(), depth_limit: 0, cur_depth: 0, stats: SearchStats::default() }
    }

    /// Depth actually searched for `board` when `requested` plies are asked for.
    ///
    /// Boards with many distinct ranks are closer to a decisive state and get
    /// searched deeper; the configured ceiling bounds worst-case latency.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// use auto_2048::expectimax::{ExpectimaxConfig, Search};
    /// let cfg = ExpectimaxConfig::default();
    /// let b = Board::from_raw(0x1234_5678_0000_0000);
    /// assert_eq!(Search::effective_depth(&cfg, b, 3), 6);
    /// assert_eq!(Search::effective_depth(&cfg, b, 40), cfg.depth_ceiling);
    /// ```
    pub fn effective_depth(cfg: &ExpectimaxConfig, board: Board, requested: u32) -> u32 {
        requested.max(board.count_distinct_tiles().saturating_sub(2)).min(cfg.depth_ceiling)
    }

    /// Expected value of playing `dir` from `board`, 0 when `dir` is illegal.
    ///
    /// The cache is scoped to this call and cleared on entry.
    pub fn score_toplevel(&mut self, board: Board, dir: Move, depth: u32) -> f64 {
        self.depth_limit = Self::effective_depth(self.cfg, board, depth);
        self.cur_depth = 0;
        self.stats = SearchStats { depth_limit: self.depth_limit, ..SearchStats::default() };
        self.cache.clear();

        let new_board = board.shift(dir);
        let score = if new_board == board {
            0.0
        } else {
            self.score_tilechoose_node(new_board, 1.0) + TIE_EPSILON
        };

        self.stats.cache_hits = self.cache.hits();
        self.stats.cache_entries = self.cache.len() as u64;
        self.stats.peak_nodes = self.stats.nodes;
        tracing::debug!(
            dir = %dir,
            score,
            nodes = self.stats.nodes,
            cache_hits = self.stats.cache_hits,
            cache_entries = self.stats.cache_entries,
            max_depth = self.stats.max_depth,
            depth_limit = self.depth_limit,
            "scored root move"
        );
        score
    }

    /// Statistics of the last [`Self::score_toplevel`] call.
    #[inline]
    pub fn stats(&self) -> SearchStats { self.stats }

    fn score_tilechoose_node(&mut self, board: Board, cprob: f32) -> f64 {
        if cprob < self.cfg.prob_cutoff || self.cur_depth >= self.depth_limit {
            self.stats.max_depth = self.stats.max_depth.max(self.cur_depth);
            return get_heuristic_score(board);
        }
        let cacheable = self.cfg.cache_enabled && self.cur_depth < self.cfg.cache_depth_ceiling;
        if cacheable {
            if let Some(score) = self.cache.lookup(board, self.cur_depth) {
                return score;
            }
        }

        let num_open = board.count_empty();
        if num_open == 0 {
            return get_heuristic_score(board);
        }
        let p2 = self.cfg.two_tile_prob;
        let p4 = 1.0 - p2;
        let base_prob = cprob / num_open as f32;
        let mut score = 0.0;
        let mut tmp = board.raw();
        let mut tile_2 = 1u64;
        while tile_2 != 0 {
            if (tmp & 0xf) == 0 {
                let with_2 = Board::from_raw(board.raw() | tile_2);
                score += self.score_move_node(with_2, base_prob * p2) * p2 as f64;
                if p4 > 0.0 {
                    let with_4 = Board::from_raw(board.raw() | (tile_2 << 1));
                    score += self.score_move_node(with_4, base_prob * p4) * p4 as f64;
                }
            }
            tmp >>= 4;
            tile_2 <<= 4;
        }
        score /= num_open as f64;

        if cacheable {
            self.cache.store(board, self.cur_depth, score);
        }
        score
    }

    fn score_move_node(&mut self, board: Board, cprob: f32) -> f64 {
        self.cur_depth += 1;
        let mut best = 0.0f64;
        for dir in Move::ALL {
            let new_board = board.shift(dir);
            self.stats.nodes += 1;
            if new_board != board {
                best = best.max(self.score_tilechoose_node(new_board, cprob));
            }
        }
        self.cur_depth -= 1;
        best
    }
}
