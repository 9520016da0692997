//! State evaluation for the heuristic playout strategies.
//!
//! A heuristic is a weighted sum of terms read from the game (material,
//! mobility). Strategies resolve theirs lazily through a
//! [`HeuristicBinding`]: an injected heuristic, a description file, the
//! game's own description, or the default terms, in that order.

mod binding;
mod loader;

use playout_core::{Game, Player};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use binding::HeuristicBinding;
pub use loader::{from_description, load, HeuristicError};

/// Terms whose absolute weight is below this are skipped during playouts.
pub const ABS_HEURISTIC_WEIGHT_THRESHOLD: f32 = 0.01;

/// Evaluates a state from one player's point of view.
pub trait Heuristic<G: Game>: Send + Sync {
    /// Prepare for evaluating states of `game`.
    fn init(&mut self, game: &G) {
        let _ = game;
    }

    /// Value of `state` for `player`, ignoring terms whose absolute weight
    /// is below `abs_weight_threshold`.
    fn compute_value(
        &self,
        game: &G,
        state: &G::State,
        player: Player,
        abs_weight_threshold: f32,
    ) -> f32;
}

/// Heuristic term kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    /// The game's material count for the player.
    Material,
    /// The number of moves available to the player.
    Mobility,
}

fn default_weight() -> f32 {
    1.0
}

/// One term of a heuristic with its weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightedTerm {
    pub kind: TermKind,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

impl WeightedTerm {
    /// Create a term contributing `weight` times the raw `kind` value.
    pub fn new(kind: TermKind, weight: f32) -> Self {
        Self { kind, weight }
    }
}

/// Weighted sum of heuristic terms.
#[derive(Clone, Debug, PartialEq)]
pub struct Heuristics {
    terms: Vec<WeightedTerm>,
}

impl Heuristics {
    /// Create a heuristic from weighted terms, summed in order.
    pub fn new(terms: Vec<WeightedTerm>) -> Self {
        Self { terms }
    }

    /// Material with weight 1.0 plus a light mobility term.
    pub fn default_terms() -> Self {
        Self::new(vec![
            WeightedTerm::new(TermKind::Material, 1.0),
            WeightedTerm::new(TermKind::Mobility, 0.001),
        ])
    }

    /// Get the weighted terms.
    pub fn terms(&self) -> &[WeightedTerm] {
        &self.terms
    }
}

impl Default for Heuristics {
    fn default() -> Self {
        Self::default_terms()
    }
}

impl<G: Game> Heuristic<G> for Heuristics {
    fn init(&mut self, _game: &G) {
        self.terms.retain(|term| term.weight != 0.0);
        debug!(terms = self.terms.len(), "initialised heuristic");
    }

    fn compute_value(
        &self,
        game: &G,
        state: &G::State,
        player: Player,
        abs_weight_threshold: f32,
    ) -> f32 {
        self.terms
            .iter()
            .filter(|term| term.weight.abs() >= abs_weight_threshold)
            .map(|term| {
                let value = match term.kind {
                    TermKind::Material => game.material(state, player),
                    TermKind::Mobility => game.mobility(state, player),
                };
                term.weight * value
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Race, TicTacToe};

    #[test]
    fn test_material_and_mobility() {
        let game = Race::new(2, 10);
        let state = game.state_from_positions(&[4, 1], 0);
        let heuristics = Heuristics::new(vec![
            WeightedTerm::new(TermKind::Material, 1.0),
            WeightedTerm::new(TermKind::Mobility, 0.5),
        ]);

        // Player 0: position 4 plus half of its three step options.
        assert_eq!(heuristics.compute_value(&game, &state, 0, 0.0), 5.5);
        // Player 1 is not to move, so it has no mobility.
        assert_eq!(heuristics.compute_value(&game, &state, 1, 0.0), 1.0);
    }

    #[test]
    fn test_threshold_skips_light_terms() {
        let game = TicTacToe;
        let state = game.initial_state();
        let heuristics = Heuristics::default_terms();

        // Eight open lines, nine moves.
        let full = heuristics.compute_value(&game, &state, 0, 0.0);
        assert!((full - 8.009).abs() < 1e-5);
        let coarse =
            heuristics.compute_value(&game, &state, 0, ABS_HEURISTIC_WEIGHT_THRESHOLD);
        assert_eq!(coarse, 8.0);
    }

    #[test]
    fn test_init_drops_zero_weights() {
        let mut heuristics = Heuristics::new(vec![
            WeightedTerm::new(TermKind::Material, 0.0),
            WeightedTerm::new(TermKind::Mobility, 2.0),
        ]);
        Heuristic::<TicTacToe>::init(&mut heuristics, &TicTacToe);
        assert_eq!(heuristics.terms(), &[WeightedTerm::new(TermKind::Mobility, 2.0)]);
    }
}
