use auto_2048::engine::{self as GameEngine, count_empty, get_score, Board, Move};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn warm() { GameEngine::new(); }

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut boards = vec![Board::EMPTY];
    let mut b = Board::initial(&mut rng);
    boards.push(b);
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..20 {
        let nb = b.shift(seq[i % seq.len()]);
        if nb != b { b = nb.with_random_tile(&mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_shift(c: &mut Criterion) {
    warm();
    let boards = corpus();
    for dir in Move::ALL {
        c.bench_function(&format!("shift/{dir}"), |bch| {
            bch.iter(|| {
                let mut acc = 0u64;
                for &bd in &boards { acc ^= bd.shift(dir).raw(); }
                black_box(acc)
            })
        });
    }
    c.bench_function("apply/all_dirs", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards {
                for dir in Move::ALL { acc = acc.wrapping_add(bd.apply(dir).score_delta); }
            }
            black_box(acc)
        })
    });
}

fn bench_make_move_and_insert(c: &mut Criterion) {
    warm();
    c.bench_function("board/with_random_tile", |bch| {
        bch.iter_batched(
            || (Board::EMPTY, StdRng::seed_from_u64(7)),
            |(mut bd, mut rng)| {
                for _ in 0..16 { bd = bd.with_random_tile(&mut rng); }
                black_box(bd)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("board/make_move_left", |bch| {
        bch.iter_batched(
            || {
                let mut rng = StdRng::seed_from_u64(9);
                (Board::initial(&mut rng), rng)
            },
            |(mut bd, mut rng)| {
                for _ in 0..64 { bd = bd.make_move(Move::Left, &mut rng); }
                black_box(bd)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_score_and_queries(c: &mut Criterion) {
    warm();
    let boards = corpus();
    c.bench_function("score/get_score", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards { acc = acc.wrapping_add(get_score(bd)); }
            black_box(acc)
        })
    });
    c.bench_function("query/count_empty", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards { acc ^= count_empty(bd); }
            black_box(acc)
        })
    });
    c.bench_function("query/is_game_over", |bch| {
        bch.iter(|| black_box(boards.iter().filter(|bd| bd.is_game_over()).count()))
    });
}

criterion_group!(engine_ops, bench_shift, bench_make_move_and_insert, bench_score_and_queries);
criterion_main!(engine_ops);
