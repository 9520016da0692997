//! Playout strategies and shared move statistics for Monte Carlo Tree Search.
//!
//! This crate provides the simulation half of an MCTS engine for any game
//! implementing the `playout_core::Game` trait: several playout policies,
//! the statistics tables they learn from, and a UCT driver that ties them
//! together.
//!
//! # Features
//!
//! - **Random, MAST and NST playouts**: uniform moves, or epsilon-greedy moves
//!   scored by the average outcome of single moves and move sequences
//! - **Heuristic playouts**: greedy or softmax one-ply lookahead, and heuristic
//!   sampling with paranoid multi-player scoring and same-turn continuation
//! - **Shared statistics**: lock-free per-entry accumulation, safe to share
//!   between any number of worker threads
//! - **String configuration**: strategies built from tokens such as
//!   `["mast", "epsilon=0.05", "playoutturnlimit=200"]`
//!
//! # Example
//!
//! ```
//! use playout_core::Context;
//! use playout_mcts::{games::TicTacToe, Mcts, SearchConfig, Session, Strategy};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let game = TicTacToe;
//! let context = Context::new(&game);
//!
//! let strategy: Strategy<TicTacToe> = Strategy::from_tokens(&["mast", "epsilon=0.1"]).unwrap();
//! let session = Session::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//!
//! let mut mcts = Mcts::new(SearchConfig::with_simulations(200));
//! let result = mcts.search(&game, &context, &strategy, &session, &mut rng).unwrap();
//! println!("Best move: {:?}", result.best_move);
//! println!("Root value: {}", result.root_value);
//! ```

pub mod config;
pub mod epsilon;
pub mod games;
pub mod heuristic_playout;
pub mod heuristic_sampling;
pub mod heuristics;
pub mod keys;
pub mod mast;
mod node;
pub mod nst;
pub mod random;
pub mod search;
pub mod selector;
pub mod session;
pub mod stats;
pub mod strategy;
mod tree;

pub use config::{PlayoutConfig, SearchConfig};
pub use epsilon::EpsilonGreedy;
pub use heuristic_playout::{HeuristicPlayout, Selection};
pub use heuristic_sampling::{HeuristicSampling, ScoredMove};
pub use heuristics::{Heuristic, HeuristicError, Heuristics};
pub use keys::{MoveKey, NGramMoveKey};
pub use mast::Mast;
pub use nst::Nst;
pub use random::RandomPlayout;
pub use search::{root_parallel_search, Mcts, SearchError, SearchResult};
pub use selector::MoveSelector;
pub use session::Session;
pub use stats::ActionStatistics;
pub use strategy::{BackpropFlags, PlayoutStrategy, Strategy};
