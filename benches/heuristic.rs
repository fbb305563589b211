use auto_2048::engine::{self as GameEngine, Board, Move};
use auto_2048::expectimax;
use auto_2048::minimax::Evaluator;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn warm() { GameEngine::new(); }

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(1337);
    let mut boards = vec![Board::EMPTY];
    let mut b = Board::initial(&mut rng);
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..24 {
        let nb = b.shift(seq[i % seq.len()]);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_heuristic(c: &mut Criterion) {
    warm();
    let boards = corpus();
    c.bench_function("heuristic/table_value", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for &bd in &boards {
                acc = acc.mul_add(1.000_000_1, expectimax::heuristic_value(bd));
            }
            black_box(acc)
        })
    });
    let ev = Evaluator::default();
    c.bench_function("heuristic/minimax_evaluator", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for &bd in &boards { acc += ev.value(bd); }
            black_box(acc)
        })
    });
}

criterion_group!(heuristic, bench_heuristic);
criterion_main!(heuristic);
