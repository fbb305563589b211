//! Turn-by-turn game state: apply a player move, spawn a tile, keep score.

use rand::Rng;

use crate::engine::{Board, Move};

/// Outcome of one [`Game::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The board changed and a tile was spawned.
    Moved { dir: Move, score_delta: u64 },
    /// The direction did not change the board; nothing happened.
    Illegal,
    /// No direction was given.
    Aborted,
    /// No move is possible any more.
    GameOver,
}

#[derive(Debug, Clone)]
pub struct Game<R> {
    board: Board,
    score: u64,
    moves: u32,
    rng: R,
}

impl<R: Rng> Game<R> {
    /// Fresh game on [`Board::initial`].
    pub fn new(mut rng: R) -> Self {
        let board = Board::initial(&mut rng);
        Self::from_board(board, rng)
    }

    /// Continue from an arbitrary position with a zero score.
    pub fn from_board(board: Board, rng: R) -> Self { Self { board, score: 0, moves: 0, rng } }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    /// Merge points earned so far.
    #[inline]
    pub fn score(&self) -> u64 { self.score }

    /// Moves that changed the board.
    #[inline]
    pub fn moves(&self) -> u32 { self.moves }

    #[inline]
    pub fn is_over(&self) -> bool { self.board.is_game_over() }

    /// Play `input` and spawn the next tile.
    ///
    /// ```
    /// use auto_2048::engine::{Board, Move};
    /// use auto_2048::game::{Game, Step};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let start = Board::EMPTY.with_tile(0, 0, 2).with_tile(1, 0, 2);
    /// let mut game = Game::from_board(start, StdRng::seed_from_u64(1));
    /// assert_eq!(game.step(Some(Move::Up)), Step::Illegal);
    /// assert_eq!(game.step(Some(Move::Left)), Step::Moved { dir: Move::Left, score_delta: 4 });
    /// assert_eq!(game.board().count_occupied(), 2);
    /// assert_eq!(game.step(None), Step::Aborted);
    /// ```
    pub fn step(&mut self, input: Option<Move>) -> Step {
        if self.board.is_game_over() {
            return Step::GameOver;
        }
        let Some(dir) = input else { return Step::Aborted };
        let result = self.board.apply(dir);
        if !result.moved {
            return Step::Illegal;
        }
        self.board = result.board.with_random_tile(&mut self.rng);
        self.score += result.score_delta;
        self.moves += 1;
        tracing::trace!(%dir, score = self.score, board = %self.board, "move applied");
        if self.board.is_game_over() {
            Step::GameOver
        } else {
            Step::Moved { dir, score_delta: result.score_delta }
        }
    }
}
