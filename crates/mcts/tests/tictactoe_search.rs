//! Tests verifying the search plays tic-tac-toe soundly with learnt playouts.

use playout_core::{Context, Game, Status};
use playout_mcts::games::{Mark, TicTacToe, TicTacToeMove};
use playout_mcts::{root_parallel_search, Mcts, SearchConfig, Session, Strategy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn mark(cell: u8, mark: Mark) -> TicTacToeMove {
    TicTacToeMove { cell, mark }
}

fn play(context: &mut Context<TicTacToe>, cells: &[u8]) {
    let game = TicTacToe;
    for &cell in cells {
        let mv = game
            .legal_moves(context.state())
            .into_iter()
            .find(|mv| mv.cell == cell)
            .expect("cell is free");
        context.apply(&game, mv);
    }
}

fn best_move(strategy: &str, context: &Context<TicTacToe>, seed: u64) -> TicTacToeMove {
    let game = TicTacToe;
    let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&[strategy]).unwrap();
    let session = Session::default();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut mcts = Mcts::new(SearchConfig::with_simulations(1000));
    mcts.search(&game, context, &strategy, &session, &mut rng)
        .unwrap()
        .best_move
}

/// Test that the search never loses as X against a random opponent.
#[test]
fn test_mast_search_never_loses_as_x() {
    let game = TicTacToe;
    let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&["mast"]).unwrap();

    for seed in 0..20 {
        let mut mcts = Mcts::new(SearchConfig::with_simulations(1000));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut opponent = ChaCha8Rng::seed_from_u64(seed + 1000);
        let mut context = Context::new(&game);

        while !context.is_over() {
            let mv = if context.mover(&game) == Mark::X.player() {
                // Statistics only describe the position they were learnt from.
                let session = Session::default();
                mcts.search(&game, &context, &strategy, &session, &mut rng)
                    .unwrap()
                    .best_move
            } else {
                let moves = game.legal_moves(context.state());
                moves[opponent.gen_range(0..moves.len())]
            };
            context.apply(&game, mv);
        }

        assert_ne!(
            context.status(),
            Some(Status::Win(Mark::O.player())),
            "search (X) lost game with seed {}. Final state:\n{}",
            seed,
            context.state()
        );
    }
}

#[test]
fn test_search_finds_winning_move() {
    // X _ X
    // O O _
    // _ _ _
    let mut context = Context::new(&TicTacToe);
    play(&mut context, &[0, 3, 2, 4]);

    for strategy in ["random", "mast", "nst"] {
        assert_eq!(best_move(strategy, &context, 42), mark(1, Mark::X), "{strategy}");
    }
}

#[test]
fn test_search_blocks_winning_move() {
    // X X _
    // O _ _
    // _ _ _
    let mut context = Context::new(&TicTacToe);
    play(&mut context, &[0, 3, 1]);

    for strategy in ["random", "mast", "nst"] {
        assert_eq!(best_move(strategy, &context, 42), mark(2, Mark::O), "{strategy}");
    }
}

/// Same seed produces identical games.
#[test]
fn test_search_deterministic() {
    let game = TicTacToe;
    let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&["nst"]).unwrap();

    let play_game = |seed: u64| -> Vec<TicTacToeMove> {
        let mut mcts = Mcts::new(SearchConfig::with_simulations(100));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut context = Context::new(&game);
        while !context.is_over() {
            let session = Session::default();
            let result = mcts
                .search(&game, &context, &strategy, &session, &mut rng)
                .unwrap();
            context.apply(&game, result.best_move);
        }
        context.trial().moves().to_vec()
    };

    assert_eq!(play_game(12345), play_game(12345));
}

#[test]
fn test_root_parallel_search_finds_winning_move() {
    let game = TicTacToe;
    let mut context = Context::new(&game);
    play(&mut context, &[0, 3, 2, 4]);

    let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&["mast"]).unwrap();
    let config = SearchConfig::with_simulations(300);
    let result = root_parallel_search(&game, &context, &strategy, &config, 4, 7).unwrap();

    assert_eq!(result.best_move, mark(1, Mark::X));
    assert_eq!(result.simulations, 1200);
    let total: u32 = result.visit_counts.iter().map(|(_, count)| count).sum();
    assert_eq!(total, 1200);
}

#[test]
fn test_starting_position_value() {
    let game = TicTacToe;
    let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&["mast"]).unwrap();
    let session = Session::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut mcts = Mcts::new(SearchConfig::with_simulations(1000));

    let result = mcts
        .search(&game, &Context::new(&game), &strategy, &session, &mut rng)
        .unwrap();

    // First player can force at least a draw.
    assert!(
        result.root_value >= -0.3,
        "starting position value should be a draw or better, got {}",
        result.root_value
    );
    assert!(session.num_single_move_entries() > 0);
}
