//! auto-2048: a 2048 game engine with expectimax and minimax players
//!
//! This crate provides:
//! - A compact `Board` type with ergonomic methods (`shift`, `apply`, `make_move`, `score`, ...)
//! - An Expectimax AI (`expectimax` module) that scores the four root moves on a worker pool
//! - A Minimax AI (`minimax` module) over a persistent game tree backed by a typed object `pool`
//! - Depth or wall-clock budgeting (`player` module) and a turn-by-turn `game` driver
//!
//! Quick start:
//! ```
//! use auto_2048::engine::{self as GameEngine, Board, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // One-time table init
//! GameEngine::new();
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = Board::initial(&mut rng);
//! let b1 = b0.shift(Move::Left);
//! assert!(b1.score() >= b0.score());
//! ```
//!
//! Playing a game with a time budget:
//! ```no_run
//! use std::time::Duration;
//! use auto_2048::expectimax::Expectimax;
//! use auto_2048::game::{Game, Step};
//! use auto_2048::player::{Budget, Player};
//!
//! let mut player = Player::new(Expectimax::new()?, Budget::Time(Duration::from_millis(50)));
//! let mut game = Game::new(rand::thread_rng());
//! while let Step::Moved { .. } | Step::Illegal = game.step(player.choose(game.board())) {}
//! println!("score {}", game.score());
//! # Ok::<(), auto_2048::error::ConfigError>(())
//! ```
pub mod engine;
pub mod error;
pub mod expectimax;
pub mod game;
pub mod minimax;
pub mod player;
pub mod pool;
