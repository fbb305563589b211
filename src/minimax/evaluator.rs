use crate::engine::Board;
use crate::error::ConfigError;

/// Relative weight of each evaluator term in [`Evaluator::value`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalWeights {
    pub smoothness: f64,
    pub monotonicity: f64,
    pub empty: f64,
    pub max_tile: f64,
}

impl Default for EvalWeights {
    fn default() -> Self { Self { smoothness: 0.1, monotonicity: 1.0, empty: 2.7, max_tile: 1.0 } }
}

impl EvalWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let terms = [
            ("smoothness", self.smoothness),
            ("monotonicity", self.monotonicity),
            ("empty", self.empty),
            ("max_tile", self.max_tile),
        ];
        match terms.into_iter().find(|(_, w)| !w.is_finite()) {
            Some((name, _)) => Err(ConfigError::Weight { name }),
            None => Ok(()),
        }
    }
}

/// Board scoring used by the minimax tree. Works on ranks (log2 of tile values).
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    weights: EvalWeights,
}

impl Evaluator {
    pub fn new(weights: EvalWeights) -> Self { Self { weights } }

    #[inline]
    pub fn weights(&self) -> &EvalWeights { &self.weights }

    /// Weighted sum of smoothness, monotonicity, empty-cell and max-tile terms.
    pub fn value(&self, board: Board) -> f64 {
        let w = &self.weights;
        smoothness(board) as f64 * w.smoothness
            + monotonicity(board) as f64 * w.monotonicity
            + empty_score(board) * w.empty
            + max_rank(board) as f64 * w.max_tile
    }
}

/// Minus the total rank gap between each tile and the nearest tile to its
/// right and below. Zero for perfectly smooth boards, negative otherwise.
///
/// ```
/// use auto_2048::engine::Board;
/// use auto_2048::minimax::smoothness;
/// // 2 _ _ 8 : the 2 looks past the gap to the 8.
/// let b = Board::EMPTY.with_tile(0, 0, 2).with_tile(3, 0, 8);
/// assert_eq!(smoothness(b), -2);
/// ```
pub fn smoothness(board: Board) -> i32 {
    let mut total = 0;
    for y in 0..4 {
        for x in 0..4 {
            let r = board.rank(x, y) as i32;
            if r == 0 {
                continue;
            }
            if let Some(right) = (x + 1..4).map(|tx| board.rank(tx, y)).find(|&t| t != 0) {
                total -= (r - right as i32).abs();
            }
            if let Some(down) = (y + 1..4).map(|ty| board.rank(x, ty)).find(|&t| t != 0) {
                total -= (r - down as i32).abs();
            }
        }
    }
    total
}

/// How consistently ranks rise or fall along rows and columns.
///
/// Per axis the increases and decreases between consecutive non-empty tiles
/// are totalled as penalties and the better direction is kept, so the result
/// is 0 for fully monotone boards and negative otherwise.
pub fn monotonicity(board: Board) -> i32 {
    // [decreasing, increasing] penalties per axis
    let mut rows = [0i32; 2];
    let mut cols = [0i32; 2];
    for i in 0..4 {
        line_penalties(|k| board.rank(k, i), &mut rows);
        line_penalties(|k| board.rank(i, k), &mut cols);
    }
    rows[0].max(rows[1]) + cols[0].max(cols[1])
}

fn line_penalties(rank_at: impl Fn(usize) -> u8, totals: &mut [i32; 2]) {
    let mut current = 0;
    let mut next = 1;
    while next < 4 {
        while next < 3 && rank_at(next) == 0 {
            next += 1;
        }
        let cur = rank_at(current) as i32;
        let nxt = rank_at(next) as i32;
        if cur > nxt {
            totals[0] += nxt - cur;
        } else if nxt > cur {
            totals[1] += cur - nxt;
        }
        current = next;
        next += 1;
    }
}

/// Number of 4-connected groups of equal, non-empty tiles.
pub fn islands(board: Board) -> u32 {
    let mut seen = [[false; 4]; 4];
    let mut count = 0;
    for y in 0..4 {
        for x in 0..4 {
            let r = board.rank(x, y);
            if r == 0 || seen[y][x] {
                continue;
            }
            count += 1;
            let mut stack = vec![(x, y)];
            seen[y][x] = true;
            while let Some((cx, cy)) = stack.pop() {
                let neighbours = [
                    (cx.wrapping_sub(1), cy),
                    (cx + 1, cy),
                    (cx, cy.wrapping_sub(1)),
                    (cx, cy + 1),
                ];
                for (nx, ny) in neighbours {
                    if nx < 4 && ny < 4 && !seen[ny][nx] && board.rank(nx, ny) == r {
                        seen[ny][nx] = true;
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }
    count
}

/// Natural log of the empty-cell count, 0 on a full board.
pub fn empty_score(board: Board) -> f64 {
    match board.count_empty() {
        0 => 0.0,
        n => (n as f64).ln(),
    }
}

/// Rank of the highest tile, 0 on an empty board.
pub fn max_rank(board: Board) -> u32 {
    (0..16).map(|i| board.rank(i % 4, i / 4) as u32).max().unwrap_or(0)
}

/// Score the tile-placing side maximizes when picking its reply.
#[inline]
pub(crate) fn adversarial_score(board: Board) -> i32 { islands(board) as i32 - smoothness(board) }
