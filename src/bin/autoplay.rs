use std::time::{Duration, Instant};

use anyhow::Context;
use auto_2048::engine as GameEngine;
use auto_2048::expectimax::{Expectimax, ExpectimaxConfig};
use auto_2048::game::{Game, Step};
use auto_2048::minimax::{Minimax, MinimaxConfig};
use auto_2048::player::{Budget, Player, Strategy};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Expectimax,
    Minimax,
}

#[derive(Debug, Parser)]
#[command(name = "autoplay", about = "Play 2048 automatically with a search strategy")]
struct Args {
    /// Search strategy
    #[arg(long, value_enum, default_value_t = Kind::Expectimax)]
    strategy: Kind,

    /// Fixed search depth (ignored when --time-ms is given)
    #[arg(long, default_value_t = 3)]
    depth: u32,

    /// Think for this many milliseconds per move, deepening iteratively
    #[arg(long)]
    time_ms: Option<u64>,

    /// Worker threads for expectimax (default: hardware threads + 1)
    #[arg(long)]
    workers: Option<usize>,

    /// Seed for tile spawns; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many moves
    #[arg(long)]
    steps: Option<u32>,

    /// Suppress the status line and the final board
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    GameEngine::new();

    let strategy: Box<dyn Strategy> = match args.strategy {
        Kind::Expectimax => {
            let cfg = ExpectimaxConfig { workers: args.workers, ..Default::default() };
            Box::new(Expectimax::with_config(cfg).context("invalid expectimax settings")?)
        }
        Kind::Minimax => Box::new(Minimax::new(MinimaxConfig::default()).context("invalid minimax settings")?),
    };
    let budget = match args.time_ms {
        Some(ms) => Budget::Time(Duration::from_millis(ms)),
        None => Budget::Depth(args.depth),
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    tracing::info!(strategy = strategy.name(), ?budget, seed = ?args.seed, "starting game");

    let mut player = Player::new(strategy, budget);
    let mut game = Game::new(rng);
    let start = Instant::now();

    let pb = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}") {
            pb.set_style(style.tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"));
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    loop {
        if args.steps.is_some_and(|limit| game.moves() >= limit) {
            break;
        }
        let dir = player.choose(game.board());
        match game.step(dir) {
            Step::Moved { .. } => {}
            Step::Illegal => {
                tracing::warn!(?dir, "strategy picked an illegal move");
                break;
            }
            Step::Aborted | Step::GameOver => break,
        }
        if let Some(pb) = &pb {
            let rate = game.moves() as f64 / start.elapsed().as_secs_f64().max(1e-6);
            pb.set_message(format!(
                "{} | moves/sec: {:.1} | score: {} | depth: {}",
                game.moves(),
                rate,
                game.score(),
                player.last_decision().depth
            ));
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    if !args.quiet {
        println!("{}", game.board());
    }
    println!(
        "Moves: {} | moves/sec: {:.1} | score: {} | highest tile: {}{}",
        game.moves(),
        game.moves() as f64 / elapsed,
        game.score(),
        game.board().highest_tile(),
        if game.is_over() { " | game over" } else { "" }
    );
    Ok(())
}
