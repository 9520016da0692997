//! Playout Core - Game abstractions and common types
//!
//! This crate provides the `Game` trait that the playout strategies and the
//! search driver consume, together with the bookkeeping every simulation
//! carries around.
//!
//! # Types
//!
//! - [`Game`] - Trait for turn-based games with any number of players
//! - [`GameMove`] - Moves that know who played them
//! - [`Status`] - Terminal outcome of a game (winner or draw)
//! - [`Trial`] - Append-only log of the moves applied so far
//! - [`Context`] - A game state paired with its trial

mod context;
mod error;
mod game;
mod trial;

pub use context::Context;
pub use error::{PlayoutError, Result};
pub use game::{Game, GameMove, Player, TeamId};
pub use trial::{Status, Trial};
