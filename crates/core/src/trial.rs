//! Game outcomes and move logs.

use std::iter::Rev;
use std::slice::Iter;

use crate::game::{GameMove, Player};

/// Terminal outcome of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The game ended with a single winner.
    Win(Player),
    /// The game ended without a winner.
    Draw,
}

impl Status {
    /// Get the winner, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            Self::Win(winner) => Some(winner),
            Self::Draw => None,
        }
    }
}

/// Ordered, append-only log of the moves applied in a game.
///
/// Setup moves (initial placement and similar) are counted separately so
/// that [`Trial::num_real_moves`] only reflects moves made during play.
#[derive(Clone, Debug, PartialEq)]
pub struct Trial<M> {
    moves: Vec<M>,
    num_setup_moves: usize,
    status: Option<Status>,
    utilities: Vec<f64>,
}

impl<M> Trial<M> {
    /// Create an empty trial.
    pub fn new() -> Self {
        Self {
            moves: Vec::new(),
            num_setup_moves: 0,
            status: None,
            utilities: Vec::new(),
        }
    }

    /// Append a move made during play.
    pub fn push(&mut self, mv: M) {
        self.moves.push(mv);
    }

    /// Append a setup move.
    ///
    /// # Panics
    /// Panics if a regular move has already been recorded.
    pub fn push_setup(&mut self, mv: M) {
        assert_eq!(
            self.moves.len(),
            self.num_setup_moves,
            "setup moves must precede regular moves"
        );
        self.moves.push(mv);
        self.num_setup_moves += 1;
    }

    /// All moves, oldest first.
    pub fn moves(&self) -> &[M] {
        &self.moves
    }

    /// Moves from the most recent to the oldest.
    pub fn reverse_moves(&self) -> Rev<Iter<'_, M>> {
        self.moves.iter().rev()
    }

    /// The most recently applied move.
    pub fn last_move(&self) -> Option<&M> {
        self.moves.last()
    }

    /// Total number of moves, setup moves included.
    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }

    /// Number of moves made during play.
    pub fn num_real_moves(&self) -> usize {
        self.moves.len() - self.num_setup_moves
    }

    /// Terminal status, if the game is over.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Record the terminal status and the utilities it awards.
    ///
    /// `utilities` is ignored while `status` is `None`.
    pub fn set_outcome(&mut self, status: Option<Status>, utilities: Vec<f64>) {
        self.status = status;
        self.utilities = if status.is_some() { utilities } else { Vec::new() };
    }

    /// Whether the game recorded in this trial is over.
    pub fn is_over(&self) -> bool {
        self.status.is_some()
    }

    /// Utilities of the recorded outcome for every player.
    ///
    /// Unfinished trials count as a draw.
    pub fn utilities(&self, num_players: usize) -> Vec<f64> {
        if self.utilities.is_empty() {
            vec![0.0; num_players]
        } else {
            self.utilities.clone()
        }
    }
}

impl<M: GameMove> Trial<M> {
    /// Number of moves made during play that were real decisions.
    pub fn num_decisions(&self) -> usize {
        self.moves[self.num_setup_moves..]
            .iter()
            .filter(|mv| mv.is_decision())
            .count()
    }
}

impl<M> Default for Trial<M> {
    fn default() -> Self {
        Self::new()
    }
}
