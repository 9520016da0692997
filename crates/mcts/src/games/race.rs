//! Multi-player race for exercising the less common rule shapes.
//!
//! Every player owns a pawn at the start of a track and advances it by one to
//! three squares per move. The race covers what tic-tac-toe cannot:
//! - Any number of players, optionally split into two teams
//! - Bonus squares that grant the same player another move
//! - Players finishing (and winning) while the race continues for the others
//! - A candidate list that is only "maybe legal": overshooting the goal is
//!   rejected by [`Game::is_move_really_legal`]

use playout_core::{Game, GameMove, Player, Status, TeamId};
use std::fmt;

/// Largest number of squares a pawn can advance in one move.
pub const MAX_STEPS: u8 = 3;

/// Race move: advance the mover's pawn by `steps` squares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RaceMove {
    pub player: Player,
    pub steps: u8,
}

impl GameMove for RaceMove {
    fn mover(&self) -> Player {
        self.player
    }
}

impl fmt::Display for RaceMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}+{}", self.player, self.steps)
    }
}

/// Race state.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct RaceState {
    positions: Vec<u8>,
    /// Players in the order they reached the goal.
    finished: Vec<Player>,
    mover: Player,
    status: Option<Status>,
}

impl RaceState {
    /// Position of the player's pawn.
    pub fn position(&self, player: Player) -> u8 {
        self.positions[player]
    }

    /// Players that reached the goal, in order.
    pub fn finished(&self) -> &[Player] {
        &self.finished
    }

    fn has_finished(&self, player: Player) -> bool {
        self.finished.contains(&player)
    }
}

/// Race game implementation.
#[derive(Clone, Debug)]
pub struct Race {
    num_players: usize,
    track_length: u8,
    bonus_squares: Vec<u8>,
    teams: bool,
}

impl Race {
    /// Create a race without bonus squares or teams.
    ///
    /// # Panics
    /// Panics with fewer than two players or an empty track.
    pub fn new(num_players: usize, track_length: u8) -> Self {
        assert!(num_players >= 2, "a race needs at least two players");
        assert!(track_length > 0, "the track must not be empty");
        Self {
            num_players,
            track_length,
            bonus_squares: Vec::new(),
            teams: false,
        }
    }

    /// Landing on any of these squares grants another move.
    pub fn with_bonus_squares(mut self, squares: impl IntoIterator<Item = u8>) -> Self {
        self.bonus_squares = squares.into_iter().collect();
        self
    }

    /// Split players into two teams by parity of their index.
    pub fn with_teams(mut self) -> Self {
        self.teams = true;
        self
    }

    /// Length of the track; reaching it exactly finishes the race.
    pub fn track_length(&self) -> u8 {
        self.track_length
    }

    /// Build a state directly from pawn positions, with `mover` to play.
    ///
    /// Pawns already at the goal count as finished in index order.
    pub fn state_from_positions(&self, positions: &[u8], mover: Player) -> RaceState {
        assert_eq!(positions.len(), self.num_players);
        let finished: Vec<Player> = (0..self.num_players)
            .filter(|&p| positions[p] >= self.track_length)
            .collect();
        let mut state = RaceState {
            positions: positions.to_vec(),
            finished,
            mover,
            status: None,
        };
        state.status = self.compute_status(&state);
        state
    }

    fn compute_status(&self, state: &RaceState) -> Option<Status> {
        let first = *state.finished.first()?;
        if self.teams {
            return Some(Status::Win(first));
        }
        let remaining = self.num_players - state.finished.len();
        if remaining <= 1 {
            Some(Status::Win(first))
        } else {
            None
        }
    }

    fn next_player(&self, state: &RaceState, after: Player) -> Player {
        (1..=self.num_players)
            .map(|offset| (after + offset) % self.num_players)
            .find(|&p| !state.has_finished(p))
            .unwrap_or(after)
    }
}

impl Game for Race {
    type State = RaceState;
    type Move = RaceMove;

    fn num_players(&self) -> usize {
        self.num_players
    }

    fn initial_state(&self) -> Self::State {
        RaceState {
            positions: vec![0; self.num_players],
            finished: Vec::new(),
            mover: 0,
            status: None,
        }
    }

    /// Offers every step size, including ones that overshoot the goal.
    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move> {
        if state.status.is_some() {
            return Vec::new();
        }
        (1..=MAX_STEPS)
            .map(|steps| RaceMove {
                player: state.mover,
                steps,
            })
            .collect()
    }

    fn is_move_really_legal(&self, state: &Self::State, mv: &Self::Move) -> bool {
        mv.player == state.mover
            && state.status.is_none()
            && state.positions[mv.player].saturating_add(mv.steps) <= self.track_length
    }

    fn apply(&self, state: &Self::State, mv: &Self::Move) -> Self::State {
        let mut next = state.clone();
        let position = state.positions[mv.player]
            .saturating_add(mv.steps)
            .min(self.track_length);
        next.positions[mv.player] = position;

        if position == self.track_length {
            next.finished.push(mv.player);
            next.status = self.compute_status(&next);
            next.mover = self.next_player(&next, mv.player);
        } else if self.bonus_squares.contains(&position) {
            next.mover = mv.player;
        } else {
            next.mover = self.next_player(&next, mv.player);
        }
        next
    }

    fn status(&self, state: &Self::State) -> Option<Status> {
        state.status
    }

    fn mover(&self, state: &Self::State) -> Player {
        state.mover
    }

    fn is_active(&self, state: &Self::State, player: Player) -> bool {
        state.status.is_none() && !state.has_finished(player)
    }

    fn winners(&self, state: &Self::State) -> Vec<Player> {
        match (self.teams, state.finished.first()) {
            (true, Some(&first)) => (0..self.num_players)
                .filter(|&p| p % 2 == first % 2)
                .collect(),
            _ => state.finished.clone(),
        }
    }

    fn team(&self, _state: &Self::State, player: Player) -> Option<TeamId> {
        self.teams.then_some(player % 2)
    }

    fn heuristics_description(&self) -> Option<&str> {
        Some(
            r#"
[[term]]
kind = "material"
weight = 1.0
"#,
        )
    }

    /// Progress along the track.
    fn material(&self, state: &Self::State, player: Player) -> f32 {
        f32::from(state.positions[player])
    }
}
