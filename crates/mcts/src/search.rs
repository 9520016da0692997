//! UCT tree search driven by a playout strategy.
//!
//! Every simulation descends the tree with UCT, expands one leaf, finishes
//! the game with the playout strategy and backs the utilities up the path.
//! The finished trial is then folded into the session's move statistics as
//! requested by the strategy's backpropagation flags, so MAST and NST learn
//! from each simulation.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use playout_core::{Context, Game, GameMove};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::node::NodeId;
use crate::session::Session;
use crate::strategy::PlayoutStrategy;
use crate::tree::Tree;

/// Errors that can occur when starting a search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Game is already over")]
    GameOver,

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Playout strategy does not support this game")]
    UnsupportedGame,
}

/// Result of a search.
#[derive(Clone, Debug)]
pub struct SearchResult<M> {
    /// Visit count for each move at root.
    pub visit_counts: Vec<(M, u32)>,

    /// Best move (highest visit count).
    pub best_move: M,

    /// Mean utility of the player to move at the root.
    pub root_value: f64,

    /// Number of simulations that were run.
    pub simulations: usize,
}

impl<M: Clone> SearchResult<M> {
    /// Select a move using temperature-based sampling.
    ///
    /// - temperature = 0: always return best move (greedy)
    /// - temperature = 1: sample proportional to visit counts
    ///
    /// Formula: P(a) ∝ N(a)^(1/τ) where τ is temperature
    pub fn select_move<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> M {
        if temperature <= 0.0 || self.visit_counts.len() <= 1 {
            return self.best_move.clone();
        }

        let inv_temp = 1.0 / temperature;
        let adjusted: Vec<f64> = self
            .visit_counts
            .iter()
            .map(|(_, count)| f64::from(*count).powf(inv_temp))
            .collect();

        let sum: f64 = adjusted.iter().sum();
        if sum == 0.0 {
            return self.best_move.clone();
        }

        let threshold: f64 = rng.gen::<f64>() * sum;
        let mut cumulative = 0.0;
        for (i, &weight) in adjusted.iter().enumerate() {
            cumulative += weight;
            if cumulative >= threshold {
                return self.visit_counts[i].0.clone();
            }
        }

        self.best_move.clone()
    }
}

/// UCT search over one tree.
pub struct Mcts<G: Game> {
    config: SearchConfig,
    tree: Tree<G::Move>,
}

impl<G: Game> Mcts<G> {
    /// Create a new search instance.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            tree: Tree::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a search from `context`.
    ///
    /// The session is shared with any concurrent searches and is not
    /// cleared here; use a fresh (or cleared) session per decision.
    ///
    /// # Errors
    /// Fails before any simulation if the game is over, has no legal move,
    /// or is not supported by the strategy.
    pub fn search<S>(
        &mut self,
        game: &G,
        context: &Context<G>,
        strategy: &S,
        session: &Session<G::Move>,
        rng: &mut dyn RngCore,
    ) -> Result<SearchResult<G::Move>, SearchError>
    where
        S: PlayoutStrategy<G> + ?Sized,
    {
        if !strategy.supports_game(game) {
            return Err(SearchError::UnsupportedGame);
        }
        if context.is_over() {
            return Err(SearchError::GameOver);
        }

        self.tree.reset();
        self.expand(game, context, NodeId::ROOT);
        if self.tree.root().children.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }

        let started = Instant::now();
        let mut simulations = 0;
        while simulations < self.config.num_simulations {
            if self
                .config
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit)
            {
                break;
            }
            self.simulate(game, context, strategy, session, rng);
            simulations += 1;
        }

        let result = self.extract_results(game, context, simulations);
        debug!(
            simulations,
            nodes = self.tree.len(),
            root_value = result.root_value,
            "search finished"
        );
        Ok(result)
    }

    /// Run a single simulation: select -> expand -> playout -> backpropagate.
    fn simulate<S>(
        &mut self,
        game: &G,
        root: &Context<G>,
        strategy: &S,
        session: &Session<G::Move>,
        rng: &mut dyn RngCore,
    ) where
        S: PlayoutStrategy<G> + ?Sized,
    {
        let mut path = vec![NodeId::ROOT];
        let mut context = root.clone();
        let mut current_id = NodeId::ROOT;

        // SELECT: descend with UCT until an unexpanded or terminal node.
        while self.tree.get(current_id).expanded && !context.is_over() {
            let Some((mv, child_id)) = self.select_child(current_id) else {
                break;
            };
            context.apply(game, mv);
            path.push(child_id);
            current_id = child_id;
        }

        // EXPAND
        if !context.is_over() && !self.tree.get(current_id).expanded {
            self.expand(game, &context, current_id);
        }

        // PLAYOUT
        let trial = strategy.run_playout(session, game, &context, rng);
        let utilities = trial.utilities(game.num_players());
        trace!(
            depth = path.len() - 1,
            moves = trial.num_moves(),
            status = ?trial.status(),
            "simulation finished"
        );

        self.backpropagate(&path, &utilities);

        let flags = strategy.backprop_flags();
        if !flags.is_empty() {
            session.backpropagate(&trial, root.trial().num_moves(), &utilities, flags);
        }
    }

    /// Add a child for every really legal move.
    fn expand(&mut self, game: &G, context: &Context<G>, node_id: NodeId) {
        let state = context.state();
        for mv in game.legal_moves(state) {
            if !game.is_move_really_legal(state, &mv) {
                continue;
            }
            self.tree.add_child(node_id, mv);
        }
        self.tree.get_mut(node_id).expanded = true;
    }

    /// Child with the highest UCT score, first unvisited child first.
    fn select_child(&self, node_id: NodeId) -> Option<(G::Move, NodeId)> {
        let node = self.tree.get(node_id);
        let parent_visits = node.stats.visit_count;

        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        for (mv, child_id) in &node.children {
            let score = self
                .tree
                .get(*child_id)
                .stats
                .uct(parent_visits, self.config.exploration);
            if best.is_none() || score > best_score {
                best = Some((mv.clone(), *child_id));
                best_score = score;
            }
        }
        best
    }

    /// Credit every node on the path with the utility of the player who
    /// made the move into it.
    fn backpropagate(&mut self, path: &[NodeId], utilities: &[f64]) {
        for &node_id in path {
            let node = self.tree.get_mut(node_id);
            node.stats.visit_count += 1;
            if let Some(mv) = &node.mv {
                node.stats.value_sum += utilities[mv.mover()];
            }
        }
    }

    /// Extract search results from root node.
    fn extract_results(
        &self,
        game: &G,
        context: &Context<G>,
        simulations: usize,
    ) -> SearchResult<G::Move> {
        let root = self.tree.root();
        let visit_counts: Vec<(G::Move, u32)> = root
            .children
            .iter()
            .map(|(mv, id)| (mv.clone(), self.tree.get(*id).stats.visit_count))
            .collect();

        // INVARIANT: search() rejects roots without children.
        let best_move = visit_counts
            .iter()
            .max_by_key(|(_, count)| *count)
            .map(|(mv, _)| mv.clone())
            .expect("BUG: extract_results called but root has no children");

        // Root mover's mean utility over the children it could have played.
        let mover = context.mover(game);
        let (weighted, visits) = root
            .children
            .iter()
            .map(|(mv, id)| (mv, &self.tree.get(*id).stats))
            .filter(|(mv, _)| mv.mover() == mover)
            .fold((0.0, 0u32), |(sum, visits), (_, stats)| {
                (sum + stats.value_sum, visits + stats.visit_count)
            });
        let root_value = if visits > 0 {
            weighted / f64::from(visits)
        } else {
            0.0
        };

        SearchResult {
            visit_counts,
            best_move,
            root_value,
            simulations,
        }
    }
}

/// Run `num_trees` independent searches on rayon workers and merge their
/// root visit counts.
///
/// All trees share one fresh session, so statistics learnt by one tree's
/// playouts guide the others. Tree `i` uses a generator seeded with
/// `seed + i`.
///
/// # Errors
/// See [`Mcts::search`].
pub fn root_parallel_search<G, S>(
    game: &G,
    context: &Context<G>,
    strategy: &S,
    config: &SearchConfig,
    num_trees: usize,
    seed: u64,
) -> Result<SearchResult<G::Move>, SearchError>
where
    G: Game,
    G::State: Sync,
    S: PlayoutStrategy<G> + ?Sized,
{
    let session = Session::new(config.max_ngram_length);
    let results: Vec<SearchResult<G::Move>> = (0..num_trees.max(1) as u64)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i));
            Mcts::new(config.clone()).search(game, context, strategy, &session, &mut rng)
        })
        .collect::<Result<_, _>>()?;

    debug!(
        trees = results.len(),
        single = session.num_single_move_entries(),
        ngrams = session.num_ngram_entries(),
        "root-parallel search finished"
    );
    Ok(merge_results(results))
}

fn merge_results<M: Clone + Eq + Hash>(results: Vec<SearchResult<M>>) -> SearchResult<M> {
    let mut totals: HashMap<M, u32> = HashMap::new();
    let mut order: Vec<M> = Vec::new();
    let mut value_sum = 0.0;
    let mut simulations = 0;

    for result in &results {
        for (mv, count) in &result.visit_counts {
            let total = totals.entry(mv.clone()).or_insert_with(|| {
                order.push(mv.clone());
                0
            });
            *total += count;
        }
        value_sum += result.root_value * result.simulations as f64;
        simulations += result.simulations;
    }

    let visit_counts: Vec<(M, u32)> = order
        .into_iter()
        .map(|mv| {
            let count = totals[&mv];
            (mv, count)
        })
        .collect();

    // INVARIANT: every tree had at least one root child.
    let best_move = visit_counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(mv, _)| mv.clone())
        .expect("BUG: merging searches without root children");

    SearchResult {
        visit_counts,
        best_move,
        root_value: if simulations > 0 {
            value_sum / simulations as f64
        } else {
            0.0
        },
        simulations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Lights, Race, TicTacToe};
    use crate::mast::Mast;
    use crate::random::RandomPlayout;
    use crate::strategy::Strategy;

    #[test]
    fn test_search_basic() {
        let game = Race::new(2, 8);
        let context = Context::new(&game);
        let session = Session::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mut mcts = Mcts::new(SearchConfig::with_simulations(200));
        let result = mcts
            .search(&game, &context, &RandomPlayout::new(), &session, &mut rng)
            .unwrap();

        assert_eq!(result.simulations, 200);
        let total: u32 = result.visit_counts.iter().map(|(_, c)| *c).sum();
        assert_eq!(total, 200);
        // Racing, the longest step is best.
        assert_eq!(result.best_move.steps, 3);
    }

    #[test]
    fn test_search_deterministic() {
        let run = |seed: u64| {
            let game = TicTacToe;
            let context = Context::new(&game);
            let session = Session::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            Mcts::new(SearchConfig::with_simulations(100))
                .search(&game, &context, &Mast::new(), &session, &mut rng)
                .unwrap()
        };

        let first = run(12345);
        let second = run(12345);
        assert_eq!(first.best_move, second.best_move);
        assert_eq!(first.visit_counts, second.visit_counts);
    }

    #[test]
    fn test_search_feeds_the_session() {
        let game = TicTacToe;
        let context = Context::new(&game);
        let session = Session::new(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let nst: Strategy<TicTacToe> = Strategy::from_tokens(&["nst"]).unwrap();

        Mcts::new(SearchConfig::with_simulations(50))
            .search(&game, &context, &nst, &session, &mut rng)
            .unwrap();
        assert!(session.num_single_move_entries() > 0);
        assert!(session.num_ngram_entries() > 0);

        // Random playouts ask for no statistics.
        let untouched = Session::new(2);
        Mcts::new(SearchConfig::with_simulations(50))
            .search(&game, &context, &RandomPlayout::new(), &untouched, &mut rng)
            .unwrap();
        assert_eq!(untouched.num_single_move_entries(), 0);
    }

    #[test]
    fn test_search_errors() {
        let puzzle = Lights::new(3);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = Mcts::new(SearchConfig::with_simulations(10))
            .search(
                &puzzle,
                &Context::new(&puzzle),
                &RandomPlayout::new(),
                &Session::default(),
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(err, SearchError::UnsupportedGame);

        let game = TicTacToe;
        let mut context = Context::new(&game);
        for cell in [0u8, 3, 1, 4, 2] {
            let mv = *game
                .legal_moves(context.state())
                .iter()
                .find(|mv| mv.cell == cell)
                .unwrap();
            context.apply(&game, mv);
        }
        let err = Mcts::new(SearchConfig::with_simulations(10))
            .search(&game, &context, &RandomPlayout::new(), &Session::default(), &mut rng)
            .unwrap_err();
        assert_eq!(err, SearchError::GameOver);
    }

    #[test]
    fn test_time_limit_stops_early() {
        let game = TicTacToe;
        let context = Context::new(&game);
        let config = SearchConfig {
            num_simulations: usize::MAX,
            time_limit: Some(std::time::Duration::from_millis(20)),
            ..SearchConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = Mcts::new(config)
            .search(&game, &context, &RandomPlayout::new(), &Session::default(), &mut rng)
            .unwrap();
        assert!(result.simulations > 0);
    }

    #[test]
    fn test_root_parallel_merges_visits() {
        let game = TicTacToe;
        let context = Context::new(&game);
        let config = SearchConfig::with_simulations(100);

        let result =
            root_parallel_search(&game, &context, &Mast::new(), &config, 4, 7).unwrap();
        assert_eq!(result.simulations, 400);
        let total: u32 = result.visit_counts.iter().map(|(_, c)| *c).sum();
        assert_eq!(total, 400);
        assert_eq!(result.visit_counts.len(), 9);
    }

    #[test]
    fn test_select_move_with_temperature() {
        let result = SearchResult {
            visit_counts: vec![('a', 90), ('b', 10)],
            best_move: 'a',
            root_value: 0.0,
            simulations: 100,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(result.select_move(0.0, &mut rng), 'a');

        let picks_b = (0..1000)
            .filter(|_| result.select_move(1.0, &mut rng) == 'b')
            .count();
        assert!((50..150).contains(&picks_b), "{picks_b}");
    }
}
