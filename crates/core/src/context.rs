use std::fmt;

use crate::game::{Game, Player};
use crate::trial::{Status, Trial};

/// A game state together with the trial that led to it.
///
/// Playouts clone the context they are given and only ever mutate their own
/// copy, so concurrent simulations never observe each other's moves.
pub struct Context<G: Game> {
    state: G::State,
    trial: Trial<G::Move>,
}

impl<G: Game> Context<G> {
    /// Create a context at the initial state of the game.
    pub fn new(game: &G) -> Self {
        Self::from_state(game, game.initial_state())
    }

    /// Create a context from an arbitrary state with an empty trial.
    pub fn from_state(game: &G, state: G::State) -> Self {
        let mut context = Self {
            state,
            trial: Trial::new(),
        };
        context.record_outcome(game);
        context
    }

    /// Apply a move made during play.
    pub fn apply(&mut self, game: &G, mv: G::Move) {
        self.state = game.apply(&self.state, &mv);
        self.trial.push(mv);
        self.record_outcome(game);
    }

    /// Apply a setup move (initial placement and similar).
    pub fn apply_setup(&mut self, game: &G, mv: G::Move) {
        self.state = game.apply(&self.state, &mv);
        self.trial.push_setup(mv);
        self.record_outcome(game);
    }

    fn record_outcome(&mut self, game: &G) {
        let status = game.status(&self.state);
        let utilities = match status {
            Some(_) => game.utilities(&self.state),
            None => Vec::new(),
        };
        self.trial.set_outcome(status, utilities);
    }

    /// Get the current game state.
    pub fn state(&self) -> &G::State {
        &self.state
    }

    /// Get the trial recorded so far.
    pub fn trial(&self) -> &Trial<G::Move> {
        &self.trial
    }

    /// Consume the context, keeping only the trial.
    pub fn into_trial(self) -> Trial<G::Move> {
        self.trial
    }

    /// Player to move.
    pub fn mover(&self, game: &G) -> Player {
        game.mover(&self.state)
    }

    /// Terminal status, if the game is over.
    pub fn status(&self) -> Option<Status> {
        self.trial.status()
    }

    /// Whether the game is over.
    pub fn is_over(&self) -> bool {
        self.trial.is_over()
    }
}

impl<G: Game> Clone for Context<G> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            trial: self.trial.clone(),
        }
    }
}

impl<G: Game> fmt::Debug for Context<G>
where
    G::State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("state", &self.state)
            .field("trial", &self.trial)
            .finish()
    }
}
