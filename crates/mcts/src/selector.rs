//! Playout move selection.
//!
//! A selector picks one move from the candidate list of the current state.
//! Candidates may be a cheap superset of the legal moves, so selectors
//! confirm their pick with the `is_really_legal` check and fall back to the
//! next best candidate when it fails.

use playout_core::{Context, Game, Player};
use rand::{Rng, RngCore};

/// Picks the next move of a playout.
pub trait MoveSelector<G: Game> {
    /// Select a move for `mover` among `candidates`.
    ///
    /// Returns `None` only if every candidate fails `is_really_legal`.
    fn select_move(
        &self,
        game: &G,
        context: &Context<G>,
        candidates: &[G::Move],
        mover: Player,
        is_really_legal: &dyn Fn(&G::Move) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<G::Move>;
}

/// Position in `remaining` of a maximum score, ties broken uniformly.
fn argmax_rand(scores: &[f64], remaining: &[usize], rng: &mut dyn RngCore) -> Option<usize> {
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    let mut ties: u32 = 0;

    for (position, &index) in remaining.iter().enumerate() {
        let score = scores[index];
        if best.is_none() || score > best_score {
            best = Some(position);
            best_score = score;
            ties = 1;
        } else if score == best_score {
            // Reservoir sampling keeps each tied candidate with equal odds.
            ties += 1;
            if rng.gen_range(0..ties) == 0 {
                best = Some(position);
            }
        }
    }
    best
}

/// Highest-scoring candidate that passes `is_really_legal`.
///
/// A rejected candidate is never considered again, so this gives up after
/// at most `candidates.len()` legality checks.
///
/// # Panics
/// Panics if `scores` and `candidates` differ in length.
pub fn select_greedy<M: Clone>(
    candidates: &[M],
    scores: &[f64],
    is_really_legal: &dyn Fn(&M) -> bool,
    rng: &mut dyn RngCore,
) -> Option<M> {
    assert_eq!(candidates.len(), scores.len());
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while let Some(position) = argmax_rand(scores, &remaining, rng) {
        let index = remaining.swap_remove(position);
        if is_really_legal(&candidates[index]) {
            return Some(candidates[index].clone());
        }
    }
    None
}

/// Candidate sampled with probability proportional to `exp(score / T)`,
/// retrying without the rejected candidates.
///
/// # Panics
/// Panics if `scores` and `candidates` differ in length.
pub fn select_softmax<M: Clone>(
    candidates: &[M],
    scores: &[f64],
    temperature: f64,
    is_really_legal: &dyn Fn(&M) -> bool,
    rng: &mut dyn RngCore,
) -> Option<M> {
    assert_eq!(candidates.len(), scores.len());
    let temperature = temperature.max(f64::EPSILON);
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while !remaining.is_empty() {
        let max = remaining
            .iter()
            .map(|&i| scores[i])
            .fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = remaining
            .iter()
            .map(|&i| ((scores[i] - max) / temperature).exp())
            .collect();
        let sum: f64 = weights.iter().sum();

        let threshold = rng.gen::<f64>() * sum;
        let mut cumulative = 0.0;
        let mut position = remaining.len() - 1;
        for (i, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if cumulative >= threshold {
                position = i;
                break;
            }
        }

        let index = remaining.swap_remove(position);
        if is_really_legal(&candidates[index]) {
            return Some(candidates[index].clone());
        }
    }
    None
}

/// Uniformly random candidate that passes `is_really_legal`.
///
/// Candidates are drawn without replacement, so this gives up after at most
/// `candidates.len()` legality checks.
pub fn select_uniform<M: Clone>(
    candidates: &[M],
    is_really_legal: &dyn Fn(&M) -> bool,
    rng: &mut dyn RngCore,
) -> Option<M> {
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while !remaining.is_empty() {
        let index = remaining.swap_remove(rng.gen_range(0..remaining.len()));
        if is_really_legal(&candidates[index]) {
            return Some(candidates[index].clone());
        }
    }
    None
}
