//! Built-in games for validating the playout strategies.
//!
//! Each game covers different rule shapes: two-player alternation,
//! multi-player races with extra moves and teams, and a deduction puzzle.

pub mod lights;
pub mod race;
pub mod tictactoe;

pub use lights::{Lights, LightsState, Toggle};
pub use race::{Race, RaceMove, RaceState};
pub use tictactoe::{Mark, TicTacToe, TicTacToeMove, TicTacToeState};
