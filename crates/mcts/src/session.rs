//! Search session: the statistics shared by all simulations of one search.

use std::sync::Arc;

use playout_core::{GameMove, Trial};
use tracing::trace;

use crate::keys::{MoveKey, NGramMoveKey};
use crate::stats::{ActionStatistics, StatsTable};
use crate::strategy::BackpropFlags;

/// Statistics shared by every simulation of a search.
///
/// A session is created (or cleared) at the start of a search and handed by
/// reference to each playout; all methods take `&self` so any number of
/// worker threads can use the same session at once.
#[derive(Debug)]
pub struct Session<M: GameMove> {
    single_moves: StatsTable<MoveKey<M>>,
    ngrams: StatsTable<NGramMoveKey<M>>,
    max_ngram_length: usize,
}

impl<M: GameMove> Session<M> {
    /// Create an empty session tracking n-grams up to `max_ngram_length`.
    pub fn new(max_ngram_length: usize) -> Self {
        Self {
            single_moves: StatsTable::new(),
            ngrams: StatsTable::new(),
            max_ngram_length: max_ngram_length.max(1),
        }
    }

    /// Longest n-gram recorded and consulted.
    pub fn max_ngram_length(&self) -> usize {
        self.max_ngram_length
    }

    /// Single-move statistics for `key`, created on first access.
    pub fn get_or_create_single_move_stats(&self, key: &MoveKey<M>) -> Arc<ActionStatistics> {
        self.single_moves.get_or_create(key)
    }

    /// N-gram statistics for `key`, created on first access.
    pub fn get_or_create_ngram_stats(&self, key: &NGramMoveKey<M>) -> Arc<ActionStatistics> {
        self.ngrams.get_or_create(key)
    }

    /// N-gram statistics for `key`, if any were ever recorded.
    pub fn ngram_stats(&self, key: &NGramMoveKey<M>) -> Option<Arc<ActionStatistics>> {
        self.ngrams.get(key)
    }

    /// Number of single-move entries.
    pub fn num_single_move_entries(&self) -> usize {
        self.single_moves.len()
    }

    /// Number of n-gram entries.
    pub fn num_ngram_entries(&self) -> usize {
        self.ngrams.len()
    }

    /// Forget everything; called at the start of a new search.
    pub fn clear(&self) {
        self.single_moves.clear();
        self.ngrams.clear();
    }

    /// Fold a finished trial into the tables requested by `flags`.
    ///
    /// Only moves at ply `from_ply` or later are recorded (moves before it
    /// were already recorded by earlier simulations or precede the search).
    /// Each single move scores the utility of its mover; each n-gram scores
    /// the utility of the mover of its last move. N-grams never reach back
    /// into setup moves.
    ///
    /// # Panics
    /// Panics if a mover has no entry in `utilities`.
    pub fn backpropagate(
        &self,
        trial: &Trial<M>,
        from_ply: usize,
        utilities: &[f64],
        flags: BackpropFlags,
    ) {
        let moves = trial.moves();
        let first_real = trial.num_moves() - trial.num_real_moves();

        for end in from_ply.max(first_real)..moves.len() {
            let mv = &moves[end];

            if flags.contains(BackpropFlags::SINGLE_MOVE_STATS) {
                self.single_moves
                    .get_or_create(&MoveKey::new(mv.clone(), end))
                    .record(utilities[mv.mover()]);
            }

            if flags.contains(BackpropFlags::NGRAM_STATS) {
                for n in 2..=self.max_ngram_length {
                    if end + 1 < first_real + n {
                        break;
                    }
                    let start = end + 1 - n;
                    let key = NGramMoveKey::new(moves[start..=end].to_vec(), start);
                    self.ngrams.get_or_create(&key).record(utilities[mv.mover()]);
                }
            }
        }

        trace!(
            moves = moves.len(),
            from_ply,
            single = self.single_moves.len(),
            ngrams = self.ngrams.len(),
            "backpropagated trial"
        );
    }
}

impl<M: GameMove> Default for Session<M> {
    fn default() -> Self {
        Self::new(3)
    }
}
