//! Playout benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p playout-mcts`
//!
//! These benchmarks measure:
//! - A single playout per strategy on a multi-player race
//! - Statistics backpropagation with and without n-grams
//! - Full searches with learnt playouts on tic-tac-toe

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use playout_core::{Context, Game};
use playout_mcts::games::{Race, TicTacToe};
use playout_mcts::{BackpropFlags, Mcts, PlayoutStrategy, SearchConfig, Session, Strategy};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STRATEGIES: [&str; 6] = ["random", "mast", "nst", "greedy", "softmax", "heuristicsampling"];

fn race() -> Race {
    Race::new(4, 30).with_bonus_squares([5, 12, 20])
}

/// Session filled by a few hundred playouts, so MAST and NST hit warm tables.
fn warm_session(game: &Race) -> Session<<Race as Game>::Move> {
    let session = Session::new(3);
    let strategy: Strategy<Race> = Strategy::from_tokens(&["random"]).unwrap();
    let context = Context::new(game);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let flags = BackpropFlags::SINGLE_MOVE_STATS | BackpropFlags::NGRAM_STATS;
    for _ in 0..300 {
        let trial = strategy.run_playout(&session, game, &context, &mut rng);
        session.backpropagate(&trial, 0, &trial.utilities(game.num_players()), flags);
    }
    session
}

// =============================================================================
// Single Playout Benchmarks
// =============================================================================

fn bench_playout_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("playout_race");
    let game = race();
    let context = Context::new(&game);
    let session = warm_session(&game);

    for name in STRATEGIES {
        let strategy: Strategy<Race> = Strategy::from_tokens(&[name]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &strategy, |b, strategy| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(strategy.run_playout(&session, &game, &context, &mut rng)));
        });
    }

    group.finish();
}

// =============================================================================
// Backpropagation Benchmarks
// =============================================================================

fn bench_backpropagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("backpropagate");
    let game = race();
    let strategy: Strategy<Race> = Strategy::from_tokens(&["random"]).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let trial = strategy.run_playout(&Session::default(), &game, &Context::new(&game), &mut rng);
    let utilities = trial.utilities(game.num_players());
    group.throughput(Throughput::Elements(trial.num_moves() as u64));

    let cases = [
        ("single", BackpropFlags::SINGLE_MOVE_STATS),
        ("single_and_ngrams", BackpropFlags::all()),
    ];
    for (label, flags) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(label), &flags, |b, &flags| {
            let session = Session::new(3);
            b.iter(|| session.backpropagate(black_box(&trial), 0, &utilities, flags));
        });
    }

    group.finish();
}

// =============================================================================
// Search Benchmarks
// =============================================================================

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_tictactoe");
    let game = TicTacToe;
    let context = Context::new(&game);

    for sims in [100, 400, 1600] {
        group.throughput(Throughput::Elements(sims as u64));
        for name in ["random", "mast", "nst"] {
            let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&[name]).unwrap();
            group.bench_with_input(BenchmarkId::new(name, sims), &sims, |b, &sims| {
                let mut mcts = Mcts::new(SearchConfig::with_simulations(sims));
                b.iter(|| {
                    let session = Session::default();
                    let mut rng = ChaCha8Rng::seed_from_u64(42);
                    black_box(
                        mcts.search(&game, &context, &strategy, &session, &mut rng)
                            .unwrap(),
                    )
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_playout_strategies, bench_backpropagate, bench_search);
criterion_main!(benches);
