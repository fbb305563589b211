use auto_2048::engine as GameEngine;
use auto_2048::expectimax::Expectimax;
use auto_2048::game::{Game, Step};
use auto_2048::player::{Budget, Player, Strategy};
use rand::Rng;
use tracing_subscriber::EnvFilter;

/// Run `game` to its end, calling `on_move` after every applied move.
///
/// An illegal answer stops the game: asking again about the same board would
/// get the same answer.
fn play<S: Strategy, R: Rng>(
    player: &mut Player<S>,
    game: &mut Game<R>,
    mut on_move: impl FnMut(&Player<S>, &Game<R>),
) {
    loop {
        let dir = player.choose(game.board());
        match game.step(dir) {
            Step::Moved { .. } => on_move(player, game),
            Step::Illegal => {
                tracing::warn!(?dir, board = %game.board(), "strategy picked an illegal move");
                break;
            }
            Step::Aborted | Step::GameOver => break,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    GameEngine::new();
    let mut player = Player::new(Expectimax::new()?, Budget::Depth(3));
    let mut game = Game::new(rand::thread_rng());
    println!("{}", game.board());
    let mut nodes = 0u64;
    let mut peak = 0u64;
    play(&mut player, &mut game, |player, game| {
        let stats = player.strategy().last_stats();
        nodes += stats.nodes;
        peak = peak.max(stats.nodes);
        println!("{}", game.board());
    });
    println!(
        "Moves made: {}, Score: {}, States considered: {}, Max states considered for a move: {}",
        game.moves(),
        game.score(),
        nodes,
        peak
    );
    Ok(())
}
