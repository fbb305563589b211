use std::sync::OnceLock;

use crate::engine::{self as GameEngine, Board};

static HEURISTIC_SCORES: OnceLock<Box<[f64]>> = OnceLock::new();

const LOST_PENALTY: f64 = 200_000.0;
const MONOTONICITY_POWER: f64 = 4.0;
const MONOTONICITY_WEIGHT: f64 = 47.0;
const SUM_POWER: f64 = 3.5;
const SUM_WEIGHT: f64 = 11.0;
const MERGES_WEIGHT: f64 = 700.0;
const EMPTY_WEIGHT: f64 = 270.0;

pub(crate) fn warm() {
    let _ = heuristic_scores();
}

fn heuristic_scores() -> &'static [f64] {
    HEURISTIC_SCORES
        .get_or_init(|| {
            let mut v = vec![0.0f64; 0x1_0000];
            for (i, slot) in v.iter_mut().enumerate() {
                *slot = line_heuristic(i as u64);
            }
            v.into_boxed_slice()
        })
        .as_ref()
}

/// Heuristic value of a board: the line table summed over the four rows and,
/// via transpose, the four columns.
#[inline]
pub(crate) fn get_heuristic_score(board: Board) -> f64 {
    let scores = heuristic_scores();
    let transpose_board = GameEngine::transpose(board.raw());
    (0..4).fold(0., |score, line_idx| {
        let row_val = GameEngine::extract_line(board.raw(), line_idx);
        let col_val = GameEngine::extract_line(transpose_board, line_idx);
        score + scores[row_val as usize] + scores[col_val as usize]
    })
}

// Credit to Nneonneo for heuristic structure
/// Score a single 16-bit line directly (what the table caches).
pub(crate) fn line_heuristic(line: u64) -> f64 {
    let tiles = GameEngine::line_to_ranks(line);
    LOST_PENALTY + calc_empty(&tiles) + calc_merges(&tiles) - calc_monotonicity(&tiles) - calc_sum(&tiles)
}

fn calc_sum(line: &[u8; 4]) -> f64 {
    line.iter().fold(0., |acc, &rank| acc + (rank as f64).powf(SUM_POWER)) * SUM_WEIGHT
}

fn calc_empty(line: &[u8; 4]) -> f64 {
    line.iter().filter(|&&rank| rank == 0).count() as f64 * EMPTY_WEIGHT
}

/// Empty cells are transparent: `2 _ 2` still counts as a pending merge.
fn calc_merges(line: &[u8; 4]) -> f64 {
    let mut prev = 0;
    let mut counter = 0;
    let mut merges = 0;
    for &rank in line.iter().filter(|&&r| r != 0) {
        if prev == rank {
            counter += 1;
        } else if counter > 0 {
            merges += 1 + counter;
            counter = 0;
        }
        prev = rank;
    }
    if counter > 0 {
        merges += 1 + counter;
    }
    merges as f64 * MERGES_WEIGHT
}

fn calc_monotonicity(line: &[u8; 4]) -> f64 {
    let mut monotonicity_left = 0.;
    let mut monotonicity_right = 0.;
    for i in 1..4 {
        let tile1 = (line[i - 1] as f64).powf(MONOTONICITY_POWER);
        let tile2 = (line[i] as f64).powf(MONOTONICITY_POWER);
        if line[i - 1] > line[i] {
            monotonicity_left += tile1 - tile2;
        } else {
            monotonicity_right += tile2 - tile1;
        }
    }
    monotonicity_left.min(monotonicity_right) * MONOTONICITY_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_direct_evaluation_for_every_line() {
        let table = heuristic_scores();
        for line in 0..0x1_0000u64 {
            assert_eq!(table[line as usize].to_bits(), line_heuristic(line).to_bits(), "line {line:#06x}");
        }
    }

    #[test]
    fn empty_line_scores_penalty_plus_empties() {
        assert_eq!(line_heuristic(0x0000), LOST_PENALTY + 4.0 * EMPTY_WEIGHT);
    }

    #[test]
    fn merges_skip_empty_cells() {
        assert_eq!(calc_merges(&[1, 0, 1, 0]), 2.0 * MERGES_WEIGHT);
        assert_eq!(calc_merges(&[1, 1, 1, 0]), 3.0 * MERGES_WEIGHT);
        assert_eq!(calc_merges(&[1, 2, 1, 2]), 0.0);
        assert_eq!(calc_merges(&[3, 3, 2, 2]), 4.0 * MERGES_WEIGHT);
    }

    #[test]
    fn monotonic_lines_have_no_penalty() {
        assert_eq!(calc_monotonicity(&[4, 3, 2, 1]), 0.0);
        assert_eq!(calc_monotonicity(&[1, 2, 3, 4]), 0.0);
        assert!(calc_monotonicity(&[1, 4, 1, 4]) > 0.0);
    }

    #[test]
    fn board_score_is_row_plus_column_sum() {
        let board = Board::from_raw(0x1234_0000_0000_0000);
        let expected = line_heuristic(0x1234)
            + 3.0 * line_heuristic(0x0000)
            + line_heuristic(0x1000)
            + line_heuristic(0x2000)
            + line_heuristic(0x3000)
            + line_heuristic(0x4000);
        assert!((get_heuristic_score(board) - expected).abs() < 1e-6);
    }

    #[test]
    fn reversed_lines_score_the_same() {
        for line in [0x1234u64, 0x0102, 0x3300, 0xf1e2] {
            let r = GameEngine::line_to_ranks(line);
            let rev = (r[3] as u64) << 12 | (r[2] as u64) << 8 | (r[1] as u64) << 4 | r[0] as u64;
            assert!((line_heuristic(line) - line_heuristic(rev)).abs() < 1e-6);
        }
    }
}
