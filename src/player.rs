//! Move selection under a depth or wall-clock budget.
//!
//! A [`Player`] wraps any [`Strategy`]. With [`Budget::Depth`] it runs one
//! search; with [`Budget::Time`] it deepens iteratively, checking the clock
//! only between depths since a search in flight always runs to completion.

use std::time::{Duration, Instant};

use crate::engine::{Board, Move};

/// Shallowest depth tried under a time budget.
pub const MIN_SEARCH_DEPTH: u32 = 3;
/// Deepest depth tried under a time budget.
pub const MAX_SEARCH_DEPTH: u32 = 15;

/// A search policy that picks a direction for a board.
pub trait Strategy {
    /// Best direction looking `depth` plies ahead; None when nothing is legal
    /// (or `depth` is 0).
    fn search(&mut self, board: Board, last_move: Option<Move>, depth: u32) -> Option<Move>;

    /// Depth a search asked for `depth` plies actually covers. Iterative
    /// deepening continues from one past this.
    fn effective_depth(&self, _board: Board, depth: u32) -> u32 { depth }

    fn name(&self) -> &'static str;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn search(&mut self, board: Board, last_move: Option<Move>, depth: u32) -> Option<Move> {
        (**self).search(board, last_move, depth)
    }

    fn effective_depth(&self, board: Board, depth: u32) -> u32 { (**self).effective_depth(board, depth) }

    fn name(&self) -> &'static str { (**self).name() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// One search at exactly this depth.
    Depth(u32),
    /// Iterative deepening until the duration is spent.
    Time(Duration),
}

impl Default for Budget {
    fn default() -> Self { Budget::Depth(MIN_SEARCH_DEPTH) }
}

/// What the last [`Player::choose`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decision {
    pub dir: Option<Move>,
    /// Effective depth of the search whose answer was used.
    pub depth: u32,
    /// Searches run, including a discarded late one.
    pub iterations: u32,
    pub elapsed: Duration,
}

pub struct Player<S> {
    strategy: S,
    budget: Budget,
    last_move: Option<Move>,
    last: Decision,
}

impl<S: Strategy> Player<S> {
    pub fn new(strategy: S, budget: Budget) -> Self {
        Self { strategy, budget, last_move: None, last: Decision::default() }
    }

    #[inline]
    pub fn budget(&self) -> Budget { self.budget }

    #[inline]
    pub fn strategy(&self) -> &S { &self.strategy }

    #[inline]
    pub fn strategy_mut(&mut self) -> &mut S { &mut self.strategy }

    #[inline]
    pub fn last_decision(&self) -> Decision { self.last }

    /// Pick a direction for `board` within the budget.
    pub fn choose(&mut self, board: Board) -> Option<Move> {
        let start = Instant::now();
        let decision = match self.budget {
            Budget::Depth(depth) => {
                let dir = self.strategy.search(board, self.last_move, depth);
                Decision {
                    dir,
                    depth: self.strategy.effective_depth(board, depth),
                    iterations: 1,
                    elapsed: start.elapsed(),
                }
            }
            Budget::Time(limit) => self.deepen(board, start, limit),
        };
        tracing::debug!(
            strategy = self.strategy.name(),
            dir = ?decision.dir,
            depth = decision.depth,
            iterations = decision.iterations,
            elapsed_ms = decision.elapsed.as_millis() as u64,
            "chose move"
        );
        self.last = decision;
        self.last_move = decision.dir;
        decision.dir
    }

    fn deepen(&mut self, board: Board, start: Instant, limit: Duration) -> Decision {
        let mut decision = Decision::default();
        let mut depth = MIN_SEARCH_DEPTH;
        while depth <= MAX_SEARCH_DEPTH {
            let found = self.strategy.search(board, self.last_move, depth);
            decision.iterations += 1;
            let Some(dir) = found else { break };
            let late = start.elapsed() > limit;
            if late && decision.dir.is_some() {
                tracing::trace!(depth, "deeper result arrived after the deadline; discarded");
                break;
            }
            let reached = self.strategy.effective_depth(board, depth);
            decision.dir = Some(dir);
            decision.depth = reached;
            if late {
                break;
            }
            depth = reached + 1;
        }
        decision.elapsed = start.elapsed();
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Answers `Left` at even depths and `Right` at odd ones, sleeping `cost * depth`.
    struct Scripted {
        cost: Duration,
        calls: Vec<u32>,
        skip: u32,
        stuck: bool,
    }

    impl Scripted {
        fn new(cost: Duration) -> Self { Self { cost, calls: Vec::new(), skip: 0, stuck: false } }
    }

    impl Strategy for Scripted {
        fn search(&mut self, _board: Board, _last: Option<Move>, depth: u32) -> Option<Move> {
            self.calls.push(depth);
            thread::sleep(self.cost * depth);
            if self.stuck {
                return None;
            }
            Some(if depth % 2 == 0 { Move::Left } else { Move::Right })
        }

        fn effective_depth(&self, _board: Board, depth: u32) -> u32 { depth + self.skip }

        fn name(&self) -> &'static str { "scripted" }
    }

    #[test]
    fn depth_budget_runs_one_search() {
        let mut p = Player::new(Scripted::new(Duration::ZERO), Budget::Depth(4));
        assert_eq!(p.choose(Board::EMPTY), Some(Move::Left));
        assert_eq!(p.strategy().calls, vec![4]);
        assert_eq!(p.last_decision().depth, 4);
    }

    #[test]
    fn generous_time_budget_reaches_max_depth() {
        let mut p = Player::new(Scripted::new(Duration::ZERO), Budget::Time(Duration::from_secs(60)));
        assert_eq!(p.choose(Board::EMPTY), Some(Move::Right));
        let calls = &p.strategy().calls;
        assert_eq!(calls.first(), Some(&MIN_SEARCH_DEPTH));
        assert_eq!(calls.last(), Some(&MAX_SEARCH_DEPTH));
        assert_eq!(p.last_decision().depth, MAX_SEARCH_DEPTH);
    }

    #[test]
    fn late_deeper_result_is_discarded() {
        // depth 3 finishes at 60ms, inside the budget; depth 4 ends at 140ms.
        let mut p = Player::new(Scripted::new(Duration::from_millis(20)), Budget::Time(Duration::from_millis(100)));
        assert_eq!(p.choose(Board::EMPTY), Some(Move::Right));
        assert_eq!(p.strategy().calls, vec![3, 4]);
        assert_eq!(p.last_decision().depth, 3);
        assert_eq!(p.last_decision().iterations, 2);
    }

    #[test]
    fn first_result_is_kept_even_if_late() {
        let mut p = Player::new(Scripted::new(Duration::from_millis(5)), Budget::Time(Duration::from_millis(1)));
        assert_eq!(p.choose(Board::EMPTY), Some(Move::Right));
        assert_eq!(p.strategy().calls, vec![3]);
    }

    #[test]
    fn deepening_skips_past_the_effective_depth() {
        let mut s = Scripted::new(Duration::ZERO);
        s.skip = 4;
        let mut p = Player::new(s, Budget::Time(Duration::from_secs(60)));
        p.choose(Board::EMPTY);
        assert_eq!(p.strategy().calls, vec![3, 8, 13]);
        assert_eq!(p.last_decision().depth, 17);
    }

    #[test]
    fn none_stops_deepening() {
        let mut s = Scripted::new(Duration::ZERO);
        s.stuck = true;
        let mut p = Player::new(s, Budget::Time(Duration::from_secs(60)));
        assert_eq!(p.choose(Board::EMPTY), None);
        assert_eq!(p.strategy().calls, vec![3]);
    }

    #[test]
    fn boxed_strategies_delegate() {
        let boxed: Box<dyn Strategy> = Box::new(Scripted::new(Duration::ZERO));
        let mut p = Player::new(boxed, Budget::Depth(2));
        assert_eq!(p.choose(Board::EMPTY), Some(Move::Left));
        assert_eq!(p.strategy().name(), "scripted");
    }
}
