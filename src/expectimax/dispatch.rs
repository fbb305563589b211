use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::engine::{Board, Move};
use crate::error::ConfigError;

use super::search::Search;
use super::{BranchEval, ExpectimaxConfig, SearchStats};

const ALL_DONE: u8 = 0b1111;

/// Root scores for the four directions plus the combined search stats.
#[derive(Debug, Clone, Copy)]
pub struct RootEvaluation {
    pub branches: [BranchEval; 4],
    pub stats: SearchStats,
}

/// Shared between the dispatching thread and the four jobs. Nothing else
/// crosses threads: every job builds its own `Search` and cache.
struct Completion {
    state: Mutex<JobSlots>,
    done: Condvar,
}

#[derive(Default)]
struct JobSlots {
    mask: u8,
    scores: [f64; 4],
    stats: [SearchStats; 4],
}

/// Fixed-size worker pool evaluating the four root directions concurrently.
pub struct Dispatcher {
    pool: ThreadPool,
    workers: usize,
}

impl Dispatcher {
    /// Build a pool of `workers` threads.
    pub fn new(workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::Zero { name: "workers" });
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("expectimax-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Hardware concurrency plus one.
    pub fn default_workers() -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) + 1
    }

    #[inline]
    pub fn workers(&self) -> usize { self.workers }

    /// Score every root direction on the pool and block until all four report back.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// use auto_2048::expectimax::{best_branch, Dispatcher, ExpectimaxConfig};
    /// let dispatcher = Dispatcher::new(2).unwrap();
    /// let b = Board::from_raw(0x1100_0000_0000_0001);
    /// let eval = dispatcher.evaluate(b, 2, &ExpectimaxConfig::default());
    /// assert!(best_branch(&eval.branches).is_some());
    /// ```
    pub fn evaluate(&self, board: Board, depth: u32, cfg: &ExpectimaxConfig) -> RootEvaluation {
        if board == Board::EMPTY {
            tracing::warn!("asked to search an empty board; returning neutral scores");
            return neutral();
        }
        let completion = Arc::new(Completion { state: Mutex::new(JobSlots::default()), done: Condvar::new() });
        for (i, dir) in Move::ALL.into_iter().enumerate() {
            let completion = Arc::clone(&completion);
            let cfg = cfg.clone();
            self.pool.spawn(move || {
                let mut search = Search::new(&cfg);
                let score = search.score_toplevel(board, dir, depth);
                let stats = search.stats();
                let mut slots = completion.state.lock();
                slots.scores[i] = score;
                slots.stats[i] = stats;
                slots.mask |= 1 << i;
                completion.done.notify_all();
            });
        }

        let mut slots = completion.state.lock();
        while slots.mask != ALL_DONE {
            completion.done.wait(&mut slots);
        }
        collect(board, &slots.scores, &slots.stats)
    }

    /// Same four searches run one after another on the calling thread.
    pub fn evaluate_sequential(board: Board, depth: u32, cfg: &ExpectimaxConfig) -> RootEvaluation {
        if board == Board::EMPTY {
            return neutral();
        }
        let mut scores = [0.0; 4];
        let mut stats = [SearchStats::default(); 4];
        for (i, dir) in Move::ALL.into_iter().enumerate() {
            let mut search = Search::new(cfg);
            scores[i] = search.score_toplevel(board, dir, depth);
            stats[i] = search.stats();
        }
        collect(board, &scores, &stats)
    }
}

fn neutral() -> RootEvaluation {
    RootEvaluation { branches: Move::ALL.map(BranchEval::illegal), stats: SearchStats::default() }
}

fn collect(board: Board, scores: &[f64; 4], stats: &[SearchStats; 4]) -> RootEvaluation {
    let mut total = SearchStats::default();
    for s in stats {
        total.absorb(*s);
    }
    let branches = Move::ALL.map(|dir| {
        if board.shift(dir) == board {
            BranchEval::illegal(dir)
        } else {
            BranchEval { dir, ev: scores[dir.index()], legal: true }
        }
    });
    RootEvaluation { branches, stats: total }
}

/// Highest-scoring legal direction. A later direction must strictly beat the
/// running best, so ties go to the earlier entry of [`Move::ALL`].
///
/// ```
/// use auto_2048::engine::Move;
/// use auto_2048::expectimax::{best_branch, BranchEval};
/// let evs = [
///     BranchEval { dir: Move::Up, ev: 0.0, legal: false },
///     BranchEval { dir: Move::Down, ev: 5.0, legal: true },
///     BranchEval { dir: Move::Left, ev: 5.0, legal: true },
///     BranchEval { dir: Move::Right, ev: 1.0, legal: true },
/// ];
/// assert_eq!(best_branch(&evs), Some(Move::Down));
/// ```
pub fn best_branch(branches: &[BranchEval; 4]) -> Option<Move> {
    let mut best = 0.0;
    let mut best_dir = None;
    for branch in branches.iter().filter(|b| b.legal) {
        if branch.ev > best {
            best = branch.ev;
            best_dir = Some(branch.dir);
        }
    }
    best_dir
}
