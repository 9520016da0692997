//! Playout strategy abstraction and construction from string tokens.

use bitflags::bitflags;
use playout_core::{Context, Game, PlayoutError, Result, Trial};
use rand::RngCore;
use tracing::{debug, trace, warn};

use crate::config::PlayoutConfig;
use crate::heuristic_playout::{HeuristicPlayout, Selection};
use crate::heuristic_sampling::HeuristicSampling;
use crate::mast::Mast;
use crate::nst::Nst;
use crate::random::RandomPlayout;
use crate::selector::{select_uniform, MoveSelector};
use crate::session::Session;

bitflags! {
    /// Shared statistics a strategy needs written back after each simulation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BackpropFlags: u8 {
        /// Per-move statistics keyed by [`MoveKey`](crate::keys::MoveKey).
        const SINGLE_MOVE_STATS = 1;
        /// Move-sequence statistics keyed by [`NGramMoveKey`](crate::keys::NGramMoveKey).
        const NGRAM_STATS = 1 << 1;
    }
}

/// A policy for simulating a game to its end.
///
/// One strategy object is shared by every worker of a search, so playouts
/// take `&self`; any per-playout scratch state lives in the selector built
/// for that playout.
pub trait PlayoutStrategy<G: Game>: Send + Sync {
    /// Simulate from `context` until the game ends, the turn cap is reached
    /// or no legal move remains. The caller's context is left untouched; the
    /// returned trial extends the context's trial with the playout's moves.
    fn run_playout(
        &self,
        session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move>;

    /// Whether the strategy can be used for `game`.
    fn supports_game(&self, game: &G) -> bool;

    /// Statistics the search must maintain for this strategy.
    fn backprop_flags(&self) -> BackpropFlags;

    /// Override defaults from `key=value` tokens.
    ///
    /// Unknown keys are ignored; a malformed value for a known key is an
    /// error.
    fn customise(&mut self, tokens: &[&str]) -> Result<()>;

    /// Prepare for playouts in `game`. Strategies that resolve resources
    /// lazily also do so on first use.
    fn init(&mut self, game: &G) {
        let _ = game;
    }
}

/// Run one playout, asking `selector` for each move.
///
/// Without a selector, moves are drawn uniformly among the legal
/// candidates. Stops when the game is over, the configured turn cap is
/// reached, or no move can be selected.
pub fn play_out<G: Game>(
    game: &G,
    context: &Context<G>,
    selector: Option<&dyn MoveSelector<G>>,
    config: &PlayoutConfig,
    rng: &mut dyn RngCore,
) -> Trial<G::Move> {
    let mut context = context.clone();
    let mut applied = 0;

    while !context.is_over() && !config.limit_reached(applied) {
        let candidates = game.legal_moves(context.state());
        let mover = context.mover(game);

        let chosen = {
            let state = context.state();
            let is_really_legal = |mv: &G::Move| game.is_move_really_legal(state, mv);
            match selector {
                Some(selector) => {
                    selector.select_move(game, &context, &candidates, mover, &is_really_legal, rng)
                }
                None => select_uniform(&candidates, &is_really_legal, rng),
            }
        };

        let Some(mv) = chosen else {
            trace!(mover, candidates = candidates.len(), "playout stuck");
            break;
        };
        context.apply(game, mv);
        applied += 1;
    }

    context.into_trial()
}

/// All built-in playout strategies.
pub enum Strategy<G: Game> {
    Random(RandomPlayout),
    Mast(Mast),
    Nst(Nst),
    Heuristic(HeuristicPlayout<G>),
    HeuristicSampling(HeuristicSampling<G>),
}

impl<G: Game> Strategy<G> {
    /// Build a strategy from a token list such as
    /// `["mast", "playoutturnlimit=200", "epsilon=0.05"]`.
    ///
    /// The first token names the strategy (optionally as `playout=<name>`)
    /// and is matched by suffix, case-insensitively. The remaining tokens
    /// customise it.
    ///
    /// # Errors
    /// `MissingStrategy` for an empty list, `UnknownStrategy` if no variant
    /// matches, and `InvalidValue` for malformed option values.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let tokens: Vec<&str> = tokens.iter().map(|token| token.as_ref()).collect();
        let Some((first, options)) = tokens.split_first() else {
            return Err(PlayoutError::MissingStrategy);
        };

        let name = first
            .split_once('=')
            .map_or(*first, |(_, value)| value)
            .trim()
            .to_ascii_lowercase();
        if name.is_empty() {
            return Err(PlayoutError::MissingStrategy);
        }

        let mut strategy = if name.ends_with("heuristicsampling") || name.ends_with("hs") {
            Self::HeuristicSampling(HeuristicSampling::new())
        } else if name.ends_with("softmax") {
            Self::Heuristic(HeuristicPlayout::new(Selection::softmax()))
        } else if name.ends_with("greedy") || name.ends_with("heuristic") {
            Self::Heuristic(HeuristicPlayout::new(Selection::Greedy))
        } else if name.ends_with("nst") {
            Self::Nst(Nst::new())
        } else if name.ends_with("mast") {
            Self::Mast(Mast::new())
        } else if name.ends_with("random") || name.ends_with("randomplayout") {
            Self::Random(RandomPlayout::new())
        } else {
            warn!(name = %first, "unknown playout strategy");
            return Err(PlayoutError::UnknownStrategy(first.to_string()));
        };

        strategy.customise(options)?;
        debug!(strategy = strategy.name(), "constructed playout strategy");
        Ok(strategy)
    }

    /// Short name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Random(_) => "random",
            Self::Mast(_) => "mast",
            Self::Nst(_) => "nst",
            Self::Heuristic(playout) => match playout.selection() {
                Selection::Greedy => "greedy",
                Selection::Softmax { .. } => "softmax",
            },
            Self::HeuristicSampling(_) => "heuristicsampling",
        }
    }

    fn inner(&self) -> &dyn PlayoutStrategy<G> {
        match self {
            Self::Random(strategy) => strategy,
            Self::Mast(strategy) => strategy,
            Self::Nst(strategy) => strategy,
            Self::Heuristic(strategy) => strategy,
            Self::HeuristicSampling(strategy) => strategy,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PlayoutStrategy<G> {
        match self {
            Self::Random(strategy) => strategy,
            Self::Mast(strategy) => strategy,
            Self::Nst(strategy) => strategy,
            Self::Heuristic(strategy) => strategy,
            Self::HeuristicSampling(strategy) => strategy,
        }
    }
}

impl<G: Game> PlayoutStrategy<G> for Strategy<G> {
    fn run_playout(
        &self,
        session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move> {
        self.inner().run_playout(session, game, context, rng)
    }

    fn supports_game(&self, game: &G) -> bool {
        self.inner().supports_game(game)
    }

    fn backprop_flags(&self) -> BackpropFlags {
        self.inner().backprop_flags()
    }

    fn customise(&mut self, tokens: &[&str]) -> Result<()> {
        self.inner_mut().customise(tokens)
    }

    fn init(&mut self, game: &G) {
        self.inner_mut().init(game)
    }
}
