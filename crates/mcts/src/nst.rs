//! N-gram Selection Technique.
//!
//! NST extends MAST with statistics of short move sequences. A candidate's
//! score averages its MAST score with the averages of the n-grams formed by
//! the candidate and the moves played right before it, for increasing `n`,
//! stopping at the first n-gram that was never visited.

use playout_core::{Context, Game, GameMove, Player, Result, Trial};
use rand::RngCore;

use crate::config::{apply_options, parse_value, PlayoutConfig};
use crate::epsilon::EpsilonGreedy;
use crate::keys::NGramMoveKey;
use crate::mast::mast_score;
use crate::selector::{select_greedy, MoveSelector};
use crate::session::Session;
use crate::strategy::{play_out, BackpropFlags, PlayoutStrategy};

/// NST score of `mv` played at `ply`.
///
/// `recent` holds the moves already played, most recent first, and must
/// contain at least `max_n - 1` of them.
pub fn nst_score<M: GameMove>(
    session: &Session<M>,
    recent: &[M],
    mv: &M,
    ply: usize,
    max_n: usize,
) -> f64 {
    let mut total = mast_score(session, mv, ply);
    let mut orders: u32 = 1;

    for n in 2..=max_n {
        let mut moves: Vec<M> = recent[..n - 1].iter().rev().cloned().collect();
        moves.push(mv.clone());
        let key = NGramMoveKey::new(moves, ply + 1 - n);

        match session.ngram_stats(&key).and_then(|stats| stats.mean()) {
            Some(mean) => {
                total += mean;
                orders += 1;
            }
            None => break,
        }
    }

    total / f64::from(orders)
}

/// Greedy NST selector bound to one session for one playout.
pub struct NstSelector<'a, M: GameMove> {
    session: &'a Session<M>,
    max_ngram_length: usize,
}

impl<'a, M: GameMove> NstSelector<'a, M> {
    /// Bind a selector to `session`, consulting n-grams up to
    /// `max_ngram_length` moves.
    pub fn new(session: &'a Session<M>, max_ngram_length: usize) -> Self {
        Self {
            session,
            max_ngram_length: max_ngram_length.max(1),
        }
    }
}

impl<G: Game> MoveSelector<G> for NstSelector<'_, G::Move> {
    fn select_move(
        &self,
        _game: &G,
        context: &Context<G>,
        candidates: &[G::Move],
        _mover: Player,
        is_really_legal: &dyn Fn(&G::Move) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move> {
        let trial = context.trial();
        let ply = trial.num_moves();
        let max_n = self.max_ngram_length.min(trial.num_real_moves() + 1);
        let recent: Vec<G::Move> = trial.reverse_moves().take(max_n - 1).cloned().collect();

        let scores: Vec<f64> = candidates
            .iter()
            .map(|mv| nst_score(self.session, &recent, mv, ply, max_n))
            .collect();
        select_greedy(candidates, &scores, is_really_legal, rng)
    }
}

/// NST playout strategy.
#[derive(Clone, Debug, Default)]
pub struct Nst {
    config: PlayoutConfig,
    /// Longest n-gram consulted; `None` uses the session's limit.
    max_ngram_length: Option<usize>,
}

impl Nst {
    /// Create an NST playout with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an NST playout with the given settings.
    pub fn with_config(config: PlayoutConfig) -> Self {
        Self {
            config,
            max_ngram_length: None,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &PlayoutConfig {
        &self.config
    }

    /// Configured n-gram limit, if any.
    pub fn max_ngram_length(&self) -> Option<usize> {
        self.max_ngram_length
    }
}

impl<G: Game> PlayoutStrategy<G> for Nst {
    fn run_playout(
        &self,
        session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move> {
        let max_n = self
            .max_ngram_length
            .unwrap_or_else(|| session.max_ngram_length());
        let selector = EpsilonGreedy::new(NstSelector::new(session, max_n), self.config.epsilon);
        play_out(game, context, Some(&selector), &self.config, rng)
    }

    fn supports_game(&self, game: &G) -> bool {
        self.config.supports_game(game)
    }

    fn backprop_flags(&self) -> BackpropFlags {
        BackpropFlags::SINGLE_MOVE_STATS | BackpropFlags::NGRAM_STATS
    }

    fn customise(&mut self, tokens: &[&str]) -> Result<()> {
        apply_options(tokens, |key, value| match key {
            "maxngramlength" => {
                let length: usize = parse_value(key, value)?;
                self.max_ngram_length = Some(length.max(1));
                Ok(true)
            }
            _ => self.config.set_option(key, value),
        })
    }
}
