//! Heuristic sampling: one-ply lookahead over a random subset of moves.
//!
//! Each step evaluates a random fraction of the legal moves. A move that
//! wins for the mover is played at once; a move that hands the win to
//! someone else is discarded; a move after which the same player moves
//! again is scored by recursing into that follow-up decision. Everything
//! else is scored paranoidly: the mover's heuristic value minus the values
//! of all active opponents, where an opponent who already won counts as a
//! large penalty.

use std::sync::Arc;

use playout_core::{Context, Game, Player, Result, Trial};
use rand::{Rng, RngCore};
use tracing::trace;

use crate::config::{apply_options, invalid, parse_value, PlayoutConfig};
use crate::heuristics::{Heuristic, HeuristicBinding, ABS_HEURISTIC_WEIGHT_THRESHOLD};
use crate::selector::MoveSelector;
use crate::session::Session;
use crate::strategy::{play_out, BackpropFlags, PlayoutStrategy};

/// Score of a move that wins for the mover.
pub const WIN_SCORE: f32 = 10_000.0;

/// Penalty for each opponent that has already won.
pub const PARANOID_OPP_WIN_SCORE: f32 = 10_000.0;

/// Deepest chain of same-player follow-up moves that is explored.
pub const MAX_CONTINUATION_DEPTH: usize = 10;

/// One in `fraction` moves is evaluated (at least two).
pub const DEFAULT_FRACTION: usize = 2;

/// A move with its evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredMove<M> {
    pub mv: M,
    pub score: f32,
}

/// Players opposing `player`: everyone outside its team, or everyone else
/// if the game has no teams. Increasing player order.
pub fn opponents<G: Game>(game: &G, state: &G::State, player: Player) -> Vec<Player> {
    let team = game.team(state, player);
    (0..game.num_players())
        .filter(|&other| other != player)
        .filter(|&other| team.is_none() || game.team(state, other) != team)
        .collect()
}

/// Draw the candidate pool from `moves`.
///
/// The pool holds `max(2, (n + 1) / fraction)` moves drawn uniformly
/// without replacement. When that would leave out at most one move, the
/// whole list is kept in its original order.
pub fn select_moves<M: Clone>(moves: &[M], fraction: usize, rng: &mut dyn RngCore) -> Vec<M> {
    let target = ((moves.len() + 1) / fraction.max(1)).max(2);
    if target + 1 >= moves.len() {
        return moves.to_vec();
    }

    let mut remaining = moves.to_vec();
    let mut pool = Vec::with_capacity(target);
    while pool.len() < target {
        let index = rng.gen_range(0..remaining.len());
        pool.push(remaining.swap_remove(index));
    }
    pool
}

/// Heuristic sampling playout strategy, also usable as a standalone agent.
pub struct HeuristicSampling<G: Game> {
    config: PlayoutConfig,
    heuristics: HeuristicBinding<G>,
    fraction: usize,
    continuation: bool,
}

impl<G: Game> HeuristicSampling<G> {
    /// Create a strategy with the default fraction and continuation enabled.
    pub fn new() -> Self {
        Self {
            config: PlayoutConfig::default(),
            heuristics: HeuristicBinding::new(),
            fraction: DEFAULT_FRACTION,
            continuation: true,
        }
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

    /// Evaluate one in `fraction` moves per step (clamped to at least 1).
    pub fn with_fraction(mut self, fraction: usize) -> Self {
        self.fraction = fraction.max(1);
        self
    }

    /// Whether to keep searching while the same player moves again.
    pub fn with_continuation(mut self, continuation: bool) -> Self {
        self.continuation = continuation;
        self
    }

    /// Get the playout options.
    pub fn config(&self) -> &PlayoutConfig {
        &self.config
    }

    /// Get the sampling fraction.
    pub fn fraction(&self) -> usize {
        self.fraction
    }

    /// Whether continuation is enabled.
    pub fn continuation(&self) -> bool {
        self.continuation
    }

    /// Get the heuristic binding.
    pub fn heuristics(&self) -> &HeuristicBinding<G> {
        &self.heuristics
    }

    /// Best move found for the player to move, with its score.
    ///
    /// `None` only if no legal move exists.
    pub fn evaluate(
        &self,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Option<ScoredMove<G::Move>> {
        let heuristic = self.heuristics.resolve(game);
        let state = context.state();
        let moves = really_legal_moves(game, state);
        self.evaluate_moves(game, heuristic.as_deref(), state, &moves, 0, rng)
    }

    /// Move to play in `context`.
    pub fn select_action(
        &self,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move> {
        self.evaluate(game, context, rng).map(|scored| scored.mv)
    }

    fn evaluate_moves(
        &self,
        game: &G,
        heuristic: Option<&dyn Heuristic<G>>,
        state: &G::State,
        moves: &[G::Move],
        depth: usize,
        rng: &mut dyn RngCore,
    ) -> Option<ScoredMove<G::Move>> {
        let pool = select_moves(moves, self.fraction, rng);
        let mover = game.mover(state);
        let mut best: Option<ScoredMove<G::Move>> = None;

        for mv in &pool {
            let next = game.apply(state, mv);
            let over = game.status(&next).is_some();

            if over || !game.is_active(&next, mover) {
                let winners = game.winners(&next);
                if winners.contains(&mover) {
                    return Some(ScoredMove {
                        mv: mv.clone(),
                        score: WIN_SCORE,
                    });
                }
                if !winners.is_empty() {
                    continue;
                }
            }

            let continued = if self.continuation
                && !over
                && depth < MAX_CONTINUATION_DEPTH
                && game.mover(&next) == mover
            {
                let follow_ups = really_legal_moves(game, &next);
                self.evaluate_moves(game, heuristic, &next, &follow_ups, depth + 1, rng)
            } else {
                None
            };

            let score = match continued {
                Some(follow_up) => follow_up.score,
                None => paranoid_score(game, heuristic, &next, mover, rng),
            };

            if best.as_ref().map_or(true, |best| score > best.score) {
                best = Some(ScoredMove {
                    mv: mv.clone(),
                    score,
                });
            }
        }

        best.or_else(|| {
            // Every candidate lost. The first one is returned without any
            // further check.
            pool.first().map(|mv| ScoredMove {
                mv: mv.clone(),
                score: f32::NEG_INFINITY,
            })
        })
    }
}

fn really_legal_moves<G: Game>(game: &G, state: &G::State) -> Vec<G::Move> {
    game.legal_moves(state)
        .into_iter()
        .filter(|mv| game.is_move_really_legal(state, mv))
        .collect()
}

/// Mover's value minus every opponent's, plus tie-breaking jitter.
fn paranoid_score<G: Game>(
    game: &G,
    heuristic: Option<&dyn Heuristic<G>>,
    state: &G::State,
    mover: Player,
    rng: &mut dyn RngCore,
) -> f32 {
    let value = |player| {
        heuristic.map_or(0.0, |h| {
            h.compute_value(game, state, player, ABS_HEURISTIC_WEIGHT_THRESHOLD)
        })
    };

    let mut score = value(mover);
    let mut winners = None;
    for opponent in opponents(game, state, mover) {
        if game.is_active(state, opponent) {
            score -= value(opponent);
        } else if winners
            .get_or_insert_with(|| game.winners(state))
            .contains(&opponent)
        {
            score -= PARANOID_OPP_WIN_SCORE;
        }
    }

    score + rng.gen_range(0..1000u32) as f32 / 1_000_000.0
}

impl<G: Game> Default for HeuristicSampling<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Clone for HeuristicSampling<G> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            heuristics: self.heuristics.clone(),
            fraction: self.fraction,
            continuation: self.continuation,
        }
    }
}

/// Plays the heuristic sampling choice among the really legal candidates.
struct SamplingSelector<'a, G: Game> {
    playout: &'a HeuristicSampling<G>,
    heuristic: Option<&'a dyn Heuristic<G>>,
}

impl<G: Game> MoveSelector<G> for SamplingSelector<'_, G> {
    fn select_move(
        &self,
        game: &G,
        context: &Context<G>,
        candidates: &[G::Move],
        _mover: Player,
        is_really_legal: &dyn Fn(&G::Move) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move> {
        let moves: Vec<G::Move> = candidates
            .iter()
            .filter(|mv| is_really_legal(*mv))
            .cloned()
            .collect();
        let scored = self.playout.evaluate_moves(
            game,
            self.heuristic,
            context.state(),
            &moves,
            0,
            rng,
        )?;
        trace!(score = scored.score, "heuristic sampling move");
        Some(scored.mv)
    }
}

impl<G: Game> PlayoutStrategy<G> for HeuristicSampling<G> {
    fn run_playout(
        &self,
        _session: &Session<G::Move>,
        game: &G,
        context: &Context<G>,
        rng: &mut dyn RngCore,
    ) -> Trial<G::Move> {
        let heuristic = self.heuristics.resolve(game);
        let selector = SamplingSelector {
            playout: self,
            heuristic: heuristic.as_deref(),
        };
        play_out(game, context, Some(&selector), &self.config, rng)
    }

    fn supports_game(&self, game: &G) -> bool {
        self.config.supports_game(game)
    }

    fn backprop_flags(&self) -> BackpropFlags {
        BackpropFlags::empty()
    }

    fn customise(&mut self, tokens: &[&str]) -> Result<()> {
        apply_options(tokens, |key, value| {
            match key {
                "playoutturnlimit" => return self.config.set_option(key, value),
                "heuristics" => self.heuristics.set_path(value),
                "fraction" => {
                    let fraction: usize = parse_value(key, value)?;
                    if fraction == 0 {
                        return Err(invalid(key, value));
                    }
                    self.fraction = fraction;
                }
                "continuation" => self.continuation = parse_value(key, value)?,
                _ => return Ok(false),
            }
            Ok(true)
        })
    }

    fn init(&mut self, game: &G) {
        self.heuristics.resolve(game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Race, TicTacToe};
    use playout_core::{GameMove, Status};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Material-only heuristic that counts its evaluations.
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl<G: Game> Heuristic<G> for Counting {
        fn compute_value(&self, game: &G, state: &G::State, player: Player, _: f32) -> f32 {
            self.calls.fetch_add(1, Ordering::Relaxed);
            game.material(state, player)
        }
    }

    fn tictactoe_after(cells: &[u8]) -> Context<TicTacToe> {
        let game = TicTacToe;
        let mut context = Context::new(&game);
        for &cell in cells {
            let mv = *game
                .legal_moves(context.state())
                .iter()
                .find(|mv| mv.cell == cell)
                .unwrap();
            context.apply(&game, mv);
        }
        context
    }

    #[test]
    fn test_pool_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let moves: Vec<u32> = (0..10).collect();

        let pool = select_moves(&moves, 2, &mut rng);
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.iter().collect::<HashSet<_>>().len(), 5);

        assert_eq!(select_moves(&[7, 8, 9], 2, &mut rng), vec![7, 8, 9]);
        assert_eq!(select_moves(&[7, 8], 5, &mut rng), vec![7, 8]);
        assert_eq!(select_moves(&moves, 1, &mut rng), moves);
        assert!(select_moves::<u32>(&[], 2, &mut rng).is_empty());
    }

    #[test]
    fn test_opponents_with_and_without_teams() {
        let solo = Race::new(4, 10);
        assert_eq!(opponents(&solo, &solo.initial_state(), 2), vec![0, 1, 3]);

        let teams = Race::new(4, 10).with_teams();
        assert_eq!(opponents(&teams, &teams.initial_state(), 2), vec![1, 3]);
    }

    #[test]
    fn test_immediate_win_skips_the_heuristic() {
        let game = TicTacToe;
        let context = tictactoe_after(&[0, 3, 1, 4]);
        let counting = Arc::new(Counting::default());
        let sampling: HeuristicSampling<TicTacToe> = HeuristicSampling::new()
            .with_fraction(1)
            .with_heuristic(counting.clone());
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let best = sampling.evaluate(&game, &context, &mut rng).unwrap();
        assert_eq!(best.mv.cell, 2);
        assert_eq!(best.score, WIN_SCORE);
        assert_eq!(counting.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_side_branch_winner_is_a_penalty() {
        // Player 1 already finished; the race goes on for 0 and 2.
        let game = Race::new(3, 10);
        let state = game.state_from_positions(&[5, 10, 4], 0);
        let context = Context::from_state(&game, state);
        let sampling = HeuristicSampling::new().with_fraction(1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let best = sampling.evaluate(&game, &context, &mut rng).unwrap();
        assert_eq!(best.mv.steps, 3);
        // 8 - 4 - 10000, plus jitter.
        assert!((best.score + 9996.0).abs() < 0.01, "{}", best.score);
    }

    #[test]
    fn test_continuation_scores_the_follow_up() {
        let game = Race::new(2, 20).with_bonus_squares([3]);
        let context = Context::new(&game);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        // Landing on the bonus square lets the mover advance three more.
        let with = HeuristicSampling::new().with_fraction(1);
        let best = with.evaluate(&game, &context, &mut rng).unwrap();
        assert_eq!(best.mv.steps, 3);
        assert!((best.score - 6.0).abs() < 0.01, "{}", best.score);

        let without = HeuristicSampling::new()
            .with_fraction(1)
            .with_continuation(false);
        let best = without.evaluate(&game, &context, &mut rng).unwrap();
        assert!((best.score - 3.0).abs() < 0.01, "{}", best.score);
    }

    #[test]
    fn test_continuation_depth_is_bounded() {
        // Every square grants another move.
        let game = Race::new(2, 40).with_bonus_squares(1..40);
        let context = Context::new(&game);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let best = HeuristicSampling::new()
            .with_fraction(1)
            .evaluate(&game, &context, &mut rng)
            .unwrap();
        // Eleven moves of three squares at most.
        assert!(best.score <= 33.01, "{}", best.score);
    }

    /// Two players; on each turn the mover may pass or concede.
    struct Duel;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum DuelMove {
        Concede(Player),
        Pass(Player),
    }

    impl GameMove for DuelMove {
        fn mover(&self) -> Player {
            match *self {
                DuelMove::Concede(player) | DuelMove::Pass(player) => player,
            }
        }
    }

    #[derive(Clone, Debug)]
    struct DuelState {
        mover: Player,
        passes: u8,
        status: Option<Status>,
    }

    impl Game for Duel {
        type State = DuelState;
        type Move = DuelMove;

        fn num_players(&self) -> usize {
            2
        }

        fn initial_state(&self) -> DuelState {
            DuelState {
                mover: 0,
                passes: 0,
                status: None,
            }
        }

        fn legal_moves(&self, state: &DuelState) -> Vec<DuelMove> {
            if state.status.is_some() {
                return Vec::new();
            }
            let mut moves = vec![DuelMove::Concede(state.mover)];
            if state.passes < 2 {
                moves.push(DuelMove::Pass(state.mover));
            }
            moves
        }

        fn apply(&self, state: &DuelState, mv: &DuelMove) -> DuelState {
            let mut next = state.clone();
            match *mv {
                DuelMove::Concede(player) => next.status = Some(Status::Win(1 - player)),
                DuelMove::Pass(_) => next.passes += 1,
            }
            next.mover = 1 - state.mover;
            next
        }

        fn status(&self, state: &DuelState) -> Option<Status> {
            state.status
        }

        fn mover(&self, state: &DuelState) -> Player {
            state.mover
        }
    }

    #[test]
    fn test_losing_moves_are_discarded() {
        let game = Duel;
        let context = Context::new(&game);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let best = HeuristicSampling::new()
            .evaluate(&game, &context, &mut rng)
            .unwrap();
        assert_eq!(best.mv, DuelMove::Pass(0));
        assert!(best.score.is_finite());
    }

    #[test]
    fn test_all_losing_falls_back_to_first_candidate() {
        // Only conceding is left. The fallback hands back the losing move.
        let game = Duel;
        let state = DuelState {
            mover: 0,
            passes: 2,
            status: None,
        };
        let context = Context::from_state(&game, state);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let best = HeuristicSampling::new()
            .evaluate(&game, &context, &mut rng)
            .unwrap();
        assert_eq!(best.mv, DuelMove::Concede(0));
        assert_eq!(best.score, f32::NEG_INFINITY);
    }

    #[test]
    fn test_playout_reaches_the_end() {
        let game = Race::new(3, 15).with_bonus_squares([5, 10]);
        let context = Context::new(&game);
        let sampling = HeuristicSampling::new();
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let trial = sampling.run_playout(&Session::default(), &game, &context, &mut rng);
        assert!(trial.is_over());
        for mv in trial.moves() {
            assert!((1..=3).contains(&mv.steps));
        }
    }

    #[test]
    fn test_customise() {
        let mut sampling: HeuristicSampling<TicTacToe> = HeuristicSampling::new();
        sampling
            .customise(&["fraction=4", "continuation=false", "playoutturnlimit=30"])
            .unwrap();
        assert_eq!(sampling.fraction(), 4);
        assert!(!sampling.continuation());
        assert_eq!(sampling.config().turn_limit, Some(30));

        assert!(sampling.customise(&["fraction=0"]).is_err());
        assert!(sampling.customise(&["continuation=maybe"]).is_err());
    }
}
