//! Uniformly random playouts.

use playout_core::{Context, Game, Result, Trial};
use rand::RngCore;

use crate::config::{apply_options, PlayoutConfig};
use crate::session::Session;
use crate::strategy::{play_out, BackpropFlags, PlayoutStrategy};

/// Picks every move uniformly among the legal candidates.
///
/// The baseline strategy; it neither reads nor writes shared statistics.
#[derive(Clone, Debug, Default)]
pub struct RandomPlayout {
    config: PlayoutConfig,
}

impl RandomPlayout {
    /// Create an uncapped random playout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a random playout capped at `turn_limit` moves.
    pub fn with_turn_limit(turn_limit: usize) -> Self {
        Self {
            config: PlayoutConfig::with_turn_limit(turn_limit),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &PlayoutConfig {
        &self.config
    }
}

impl<G: Game> PlayoutStrategy<G> for RandomPlayout {
    fn run_playout(
        &self,
        _session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move> {
        play_out(game, context, None, &self.config, rng)
    }

    fn supports_game(&self, game: &G) -> bool {
        self.config.supports_game(game)
    }

    fn backprop_flags(&self) -> BackpropFlags {
        BackpropFlags::empty()
    }

    fn customise(&mut self, tokens: &[&str]) -> Result<()> {
        apply_options(tokens, |key, value| match key {
            "playoutturnlimit" => self.config.set_option(key, value),
            _ => Ok(false),
        })
    }
}
