use std::collections::HashMap;

use ahash::RandomState as AHasher;

use crate::engine::Board;

#[derive(Debug, Clone, Copy)]
struct TranspositionEntry { score: f64, depth: u32 }

/// Chance-node memo for one top-level search.
///
/// Depths are plies from the search root. An entry computed at ply `d` had
/// `limit - d` plies of lookahead, so it is only reused by a node at ply `>= d`
/// (one that needs no more lookahead than the entry already had).
#[derive(Debug, Default)]
pub struct TranspositionCache {
    map: HashMap<u64, TranspositionEntry, AHasher>,
    hits: u64,
    degraded: bool,
}

impl TranspositionCache {
    pub fn new() -> Self { Self::default() }

    /// Cached score for `board` if it was computed at a ply `<= depth`.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// use auto_2048::expectimax::TranspositionCache;
    /// let mut cache = TranspositionCache::new();
    /// let b = Board::from_raw(0x1200);
    /// cache.store(b, 1, 42.0);
    /// assert_eq!(cache.lookup(b, 2), Some(42.0));
    /// assert_eq!(cache.lookup(b, 0), None);
    /// ```
    #[inline]
    pub fn lookup(&mut self, board: Board, depth: u32) -> Option<f64> {
        match self.map.get(&board.raw()) {
            Some(entry) if entry.depth <= depth => {
                self.hits += 1;
                Some(entry.score)
            }
            _ => None,
        }
    }

    /// Record `score` for `board` evaluated at ply `depth`, replacing any older entry.
    ///
    /// If the table cannot grow, the entry is dropped and the search carries on uncached.
    pub fn store(&mut self, board: Board, depth: u32, score: f64) {
        if let Err(err) = self.map.try_reserve(1) {
            if !self.degraded {
                tracing::warn!(%err, entries = self.map.len(), "transposition cache full; continuing uncached");
                self.degraded = true;
            }
            return;
        }
        self.map.insert(board.raw(), TranspositionEntry { score, depth });
    }

    /// Number of stored boards.
    #[inline]
    pub fn len(&self) -> usize { self.map.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    /// Lookups that returned a cached score.
    #[inline]
    pub fn hits(&self) -> u64 { self.hits }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = (Board, u32, f64)> + '_ {
        self.map.iter().map(|(&raw, e)| (Board::from_raw(raw), e.depth, e.score))
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.degraded = false;
    }
}
