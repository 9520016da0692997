use std::fmt::Debug;
use std::hash::Hash;

use crate::trial::Status;

/// Player index, starting at 0.
pub type Player = usize;

/// Team identifier for games played in teams.
pub type TeamId = usize;

/// A single action in a game.
///
/// Moves are produced fresh for every state but must compare equal across
/// states when they describe the same action, since the statistics tables
/// bucket them by value.
pub trait GameMove: Clone + Eq + Hash + Debug + Send + Sync {
    /// The player performing this move.
    fn mover(&self) -> Player;

    /// Whether this move is a real decision, as opposed to a forced or
    /// bookkeeping move the rules apply on the player's behalf.
    ///
    /// Counted by [`crate::Trial::num_decisions`].
    fn is_decision(&self) -> bool {
        true
    }
}

/// A turn-based game abstraction for playouts.
///
/// This trait defines what the playout strategies need from a rules engine.
/// It supports any number of players, optional teams, rules that grant the
/// same player several moves in a row, and deduction puzzles.
pub trait Game: Send + Sync {
    /// The game state (e.g., board position and side to move).
    type State: Clone + Send;

    /// A game move.
    type Move: GameMove;

    /// Number of players in the game.
    fn num_players(&self) -> usize;

    /// Returns the initial game state.
    fn initial_state(&self) -> Self::State;

    /// Returns the candidate moves from the given state.
    ///
    /// The list may be a cheap superset of the truly legal moves; callers
    /// confirm their choice with [`Game::is_move_really_legal`].
    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move>;

    /// Exact legality check for a move produced by [`Game::legal_moves`].
    fn is_move_really_legal(&self, state: &Self::State, mv: &Self::Move) -> bool {
        let _ = (state, mv);
        true
    }

    /// Applies a move, returning a new state (immutable operation).
    fn apply(&self, state: &Self::State, mv: &Self::Move) -> Self::State;

    /// Returns the outcome if the game is over, `None` otherwise.
    fn status(&self, state: &Self::State) -> Option<Status>;

    /// Returns the player to move.
    fn mover(&self, state: &Self::State) -> Player;

    /// Whether the player still takes part in the game.
    ///
    /// A player can become inactive before the game ends, e.g. after
    /// finishing a race that continues for the others.
    fn is_active(&self, state: &Self::State, player: Player) -> bool {
        let _ = player;
        self.status(state).is_none()
    }

    /// Players that have won so far, including those that won in a side
    /// branch while the game continues for the others.
    fn winners(&self, state: &Self::State) -> Vec<Player> {
        match self.status(state) {
            Some(Status::Win(winner)) => vec![winner],
            _ => Vec::new(),
        }
    }

    /// Utility of a finished game for every player.
    ///
    /// The winner and its teammates get `1.0`, everybody else `-1.0`. A draw
    /// is `0.0` for all, as is a game that is not over.
    fn utilities(&self, state: &Self::State) -> Vec<f64> {
        let num_players = self.num_players();
        let Some(Status::Win(winner)) = self.status(state) else {
            return vec![0.0; num_players];
        };
        let winning_team = self.team(state, winner);
        (0..num_players)
            .map(|p| {
                let teammate = winning_team.is_some() && self.team(state, p) == winning_team;
                if p == winner || teammate {
                    1.0
                } else {
                    -1.0
                }
            })
            .collect()
    }

    /// Team of the given player, or `None` if the game has no teams.
    fn team(&self, state: &Self::State, player: Player) -> Option<TeamId> {
        let _ = (state, player);
        None
    }

    /// Deduction puzzles can loop forever without a forced draw.
    fn is_deduction_puzzle(&self) -> bool {
        false
    }

    /// Heuristic description shipped with the game, if any.
    fn heuristics_description(&self) -> Option<&str> {
        None
    }

    /// Material owned by the player, used by the material heuristic term.
    fn material(&self, state: &Self::State, player: Player) -> f32 {
        let _ = (state, player);
        0.0
    }

    /// Mobility of the player, used by the mobility heuristic term.
    ///
    /// Defaults to the number of candidate moves when the player is to move
    /// and zero otherwise.
    fn mobility(&self, state: &Self::State, player: Player) -> f32 {
        if self.mover(state) == player {
            self.legal_moves(state).len() as f32
        } else {
            0.0
        }
    }
}
