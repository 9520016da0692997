//! Move-Average Sampling Technique.
//!
//! MAST scores each candidate by the average outcome of every earlier
//! simulation that played the same move at the same ply, and plays the best
//! one (epsilon-greedy). The averages live in the search session and are
//! updated by the search after each simulation.

use playout_core::{Context, Game, GameMove, Player, Result, Trial};
use rand::RngCore;

use crate::config::{apply_options, PlayoutConfig};
use crate::epsilon::EpsilonGreedy;
use crate::keys::MoveKey;
use crate::selector::{select_greedy, MoveSelector};
use crate::session::Session;
use crate::strategy::{play_out, BackpropFlags, PlayoutStrategy};

/// Score of a move that was never played at this ply. Optimistic, so
/// unseen moves get tried.
pub const UNVISITED_SCORE: f64 = 1.0;

/// MAST score of `mv` played at `ply`.
///
/// Looks up the entry with get-or-create semantics, so scoring a move also
/// registers it in the table.
pub fn mast_score<M: GameMove>(session: &Session<M>, mv: &M, ply: usize) -> f64 {
    session
        .get_or_create_single_move_stats(&MoveKey::new(mv.clone(), ply))
        .mean()
        .unwrap_or(UNVISITED_SCORE)
}

/// Greedy MAST selector bound to one session for one playout.
pub struct MastSelector<'a, M: GameMove> {
    session: &'a Session<M>,
}

impl<'a, M: GameMove> MastSelector<'a, M> {
    /// Bind a selector to `session`.
    pub fn new(session: &'a Session<M>) -> Self {
        Self { session }
    }
}

impl<G: Game> MoveSelector<G> for MastSelector<'_, G::Move> {
    fn select_move(
        &self,
        _game: &G,
        context: &Context<G>,
        candidates: &[G::Move],
        _mover: Player,
        is_really_legal: &dyn Fn(&G::Move) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move> {
        let ply = context.trial().num_moves();
        let scores: Vec<f64> = candidates
            .iter()
            .map(|mv| mast_score(self.session, mv, ply))
            .collect();
        select_greedy(candidates, &scores, is_really_legal, rng)
    }
}

/// MAST playout strategy.
#[derive(Clone, Debug, Default)]
pub struct Mast {
    config: PlayoutConfig,
}

impl Mast {
    /// Create a MAST playout with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MAST playout with the given settings.
    pub fn with_config(config: PlayoutConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    pub fn config(&self) -> &PlayoutConfig {
        &self.config
    }
}

impl<G: Game> PlayoutStrategy<G> for Mast {
    fn run_playout(
        &self,
        session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move> {
        // The selector only lives for this playout, so every worker gets its own.
        let selector = EpsilonGreedy::new(MastSelector::new(session), self.config.epsilon);
        play_out(game, context, Some(&selector), &self.config, rng)
    }

    fn supports_game(&self, game: &G) -> bool {
        self.config.supports_game(game)
    }

    fn backprop_flags(&self) -> BackpropFlags {
        BackpropFlags::SINGLE_MOVE_STATS
    }

    fn customise(&mut self, tokens: &[&str]) -> Result<()> {
        apply_options(tokens, |key, value| self.config.set_option(key, value))
    }
}
