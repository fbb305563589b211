use auto_2048::engine::{self as GameEngine, Board, Move};
use auto_2048::expectimax::{Dispatcher, Expectimax, ExpectimaxConfig};
use auto_2048::minimax::{Minimax, MinimaxConfig};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn warm() { GameEngine::new(); }

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(7777);
    let mut boards = Vec::new();
    let mut b = Board::initial(&mut rng);
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..64 {
        let nb = b.shift(seq[i % seq.len()]);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_par_vs_seq(c: &mut Criterion) {
    warm();
    let boards = corpus();
    // Pin a small pool for stability
    let cfg = ExpectimaxConfig { workers: Some(4), depth_ceiling: 5, ..Default::default() };
    let dispatcher = Dispatcher::new(4).unwrap();

    c.bench_function("expectimax_par/dispatch", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                for be in dispatcher.evaluate(bd, 2, &cfg).branches {
                    if be.legal { acc += be.ev; }
                }
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax_seq/dispatch", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                for be in Dispatcher::evaluate_sequential(bd, 2, &cfg).branches {
                    if be.legal { acc += be.ev; }
                }
            }
            black_box(acc)
        })
    });
}

fn bench_e2e(c: &mut Criterion) {
    warm();
    let cfg = ExpectimaxConfig { workers: Some(4), depth_ceiling: 5, ..Default::default() };
    let mut ex = Expectimax::with_config(cfg).unwrap();
    c.bench_function("e2e_par/64_moves", |bch| {
        bch.iter(|| {
            let mut rng = StdRng::seed_from_u64(13);
            let mut b = Board::initial(&mut rng);
            let mut steps = 0;
            while steps < 64 && !b.is_game_over() {
                if let Some(dir) = ex.best_move(b, 2) { b = b.make_move(dir, &mut rng); } else { break; }
                steps += 1;
            }
            black_box((b.raw(), steps))
        })
    });

    c.bench_function("e2e_minimax/64_moves", |bch| {
        bch.iter(|| {
            let mut mm = Minimax::new(MinimaxConfig::default()).unwrap();
            let mut rng = StdRng::seed_from_u64(13);
            let mut b = Board::initial(&mut rng);
            let mut last = None;
            let mut steps = 0;
            while steps < 64 && !b.is_game_over() {
                let Some(dir) = mm.search(b, last, 4) else { break };
                b = b.make_move(dir, &mut rng);
                last = Some(dir);
                steps += 1;
            }
            black_box((b.raw(), steps))
        })
    });
}

criterion_group!(expectimax_par, bench_par_vs_seq, bench_e2e);
criterion_main!(expectimax_par);
