//! Epsilon-greedy decorator for move selectors.

use playout_core::{Context, Game, Player};
use rand::{Rng, RngCore};

use crate::selector::{select_uniform, MoveSelector};

/// Wraps a greedy selector: with probability `epsilon` the move is drawn
/// uniformly among the legal candidates instead.
///
/// Both branches apply the same legality check, so the decorator never
/// returns a move the wrapped selector would have rejected, and it only
/// returns `None` when no candidate is legal at all.
#[derive(Clone, Debug)]
pub struct EpsilonGreedy<S> {
    inner: S,
    epsilon: f64,
}

impl<S> EpsilonGreedy<S> {
    /// Wrap `inner`, exploring with probability `epsilon`.
    pub fn new(inner: S, epsilon: f64) -> Self {
        Self {
            inner,
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    /// Exploration probability.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The wrapped selector.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<G: Game, S: MoveSelector<G>> MoveSelector<G> for EpsilonGreedy<S> {
    fn select_move(
        &self,
        game: &G,
        context: &Context<G>,
        candidates: &[G::Move],
        mover: Player,
        is_really_legal: &dyn Fn(&G::Move) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move> {
        // With epsilon == 0 the random source is left untouched.
        if self.epsilon > 0.0 && rng.gen::<f64>() < self.epsilon {
            select_uniform(candidates, is_really_legal, rng)
        } else {
            self.inner
                .select_move(game, context, candidates, mover, is_really_legal, rng)
        }
    }
}
