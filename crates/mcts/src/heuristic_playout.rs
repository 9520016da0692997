//! One-ply lookahead playouts guided by a heuristic.

use std::sync::Arc;

use playout_core::{Context, Game, Player, Result, Trial};
use rand::RngCore;

use crate::config::{apply_options, invalid, parse_value, PlayoutConfig};
use crate::heuristic_sampling::opponents;
use crate::heuristics::{Heuristic, HeuristicBinding, ABS_HEURISTIC_WEIGHT_THRESHOLD};
use crate::selector::{select_greedy, select_softmax, MoveSelector};
use crate::session::Session;
use crate::strategy::{play_out, BackpropFlags, PlayoutStrategy};

/// How a heuristic playout turns move scores into a choice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Selection {
    /// Always the best-scoring move, ties broken at random.
    Greedy,
    /// Sample with probability proportional to `exp(score / temperature)`.
    Softmax { temperature: f64 },
}

impl Selection {
    /// Softmax with temperature 1.
    pub fn softmax() -> Self {
        Self::Softmax { temperature: 1.0 }
    }
}

/// Value of `state` for `player` relative to the player's opponents.
pub(crate) fn relative_value<G: Game>(
    heuristic: &dyn Heuristic<G>,
    game: &G,
    state: &G::State,
    player: Player,
) -> f32 {
    let own = heuristic.compute_value(game, state, player, ABS_HEURISTIC_WEIGHT_THRESHOLD);
    opponents(game, state, player)
        .into_iter()
        .filter(|&opponent| game.is_active(state, opponent))
        .fold(own, |value, opponent| {
            value
                - heuristic.compute_value(game, state, opponent, ABS_HEURISTIC_WEIGHT_THRESHOLD)
        })
}

/// Scores each candidate by the heuristic value of the state it leads to.
pub struct HeuristicSelector<'a, G: Game> {
    heuristic: &'a dyn Heuristic<G>,
    selection: Selection,
}

impl<'a, G: Game> HeuristicSelector<'a, G> {
    /// Create a selector scoring moves with `heuristic`.
    pub fn new(heuristic: &'a dyn Heuristic<G>, selection: Selection) -> Self {
        Self {
            heuristic,
            selection,
        }
    }
}

impl<G: Game> MoveSelector<G> for HeuristicSelector<'_, G> {
    fn select_move(
        &self,
        game: &G,
        context: &Context<G>,
        candidates: &[G::Move],
        mover: Player,
        is_really_legal: &dyn Fn(&G::Move) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move> {
        let state = context.state();
        let scores: Vec<f64> = candidates
            .iter()
            .map(|mv| {
                let next = game.apply(state, mv);
                f64::from(relative_value(self.heuristic, game, &next, mover))
            })
            .collect();

        match self.selection {
            Selection::Greedy => select_greedy(candidates, &scores, is_really_legal, rng),
            Selection::Softmax { temperature } => {
                select_softmax(candidates, &scores, temperature, is_really_legal, rng)
            }
        }
    }
}

/// Heuristic playout strategy.
///
/// Without a usable heuristic (a configured file failed to load) moves are
/// picked uniformly at random.
pub struct HeuristicPlayout<G: Game> {
    config: PlayoutConfig,
    heuristics: HeuristicBinding<G>,
    selection: Selection,
}

impl<G: Game> HeuristicPlayout<G> {
    /// Create a playout that picks moves with the given selection rule.
    pub fn new(selection: Selection) -> Self {
        Self {
            config: PlayoutConfig::default(),
            heuristics: HeuristicBinding::new(),
            selection,
        }
    }

    /// Greedy heuristic playout.
    pub fn greedy() -> Self {
        Self::new(Selection::Greedy)
    }

    /// Use `heuristic` instead of resolving one from descriptions.
    pub fn with_heuristic(mut self, heuristic: Arc<dyn Heuristic<G>>) -> Self {
        self.heuristics.inject(heuristic);
        self
    }

    /// Replace the shared playout options.
    pub fn with_config(mut self, config: PlayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the selection rule.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Get the playout options.
    pub fn config(&self) -> &PlayoutConfig {
        &self.config
    }

    /// Get the heuristic binding.
    pub fn heuristics(&self) -> &HeuristicBinding<G> {
        &self.heuristics
    }
}

impl<G: Game> Clone for HeuristicPlayout<G> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            heuristics: self.heuristics.clone(),
            selection: self.selection,
        }
    }
}

impl<G: Game> PlayoutStrategy<G> for HeuristicPlayout<G> {
    fn run_playout(
        &self,
        _session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move> {
        match self.heuristics.resolve(game) {
            Some(heuristic) => {
                let selector = HeuristicSelector::new(heuristic.as_ref(), self.selection);
                play_out(game, context, Some(&selector), &self.config, rng)
            }
            None => play_out(game, context, None, &self.config, rng),
        }
    }

    fn supports_game(&self, game: &G) -> bool {
        self.config.supports_game(game)
    }

    fn backprop_flags(&self) -> BackpropFlags {
        BackpropFlags::empty()
    }

    fn customise(&mut self, tokens: &[&str]) -> Result<()> {
        apply_options(tokens, |key, value| match (key, &mut self.selection) {
            ("playoutturnlimit", _) => self.config.set_option(key, value),
            ("heuristics", _) => {
                self.heuristics.set_path(value);
                Ok(true)
            }
            ("temperature", Selection::Softmax { temperature }) => {
                let parsed: f64 = parse_value(key, value)?;
                if parsed <= 0.0 {
                    return Err(invalid(key, value));
                }
                *temperature = parsed;
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    fn init(&mut self, game: &G) {
        self.heuristics.resolve(game);
    }
}
