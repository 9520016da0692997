//! Single-player deduction puzzle: switch every light on.
//!
//! Each move toggles one light. Nothing forces the puzzle to end, so a
//! playout without a turn cap can wander forever.

use playout_core::{Game, GameMove, Player, Status};

/// Toggle the light at `index`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Toggle(pub u8);

impl GameMove for Toggle {
    fn mover(&self) -> Player {
        0
    }
}

/// Lights puzzle state: one bit per light.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct LightsState(u32);

impl LightsState {
    /// Whether the light at `index` is on.
    pub fn is_on(self, index: u8) -> bool {
        self.0 & (1 << index) != 0
    }
}

/// Lights puzzle with up to 32 lights.
#[derive(Clone, Debug)]
pub struct Lights {
    size: u8,
}

impl Lights {
    /// Create a puzzle with `size` lights, all off.
    ///
    /// # Panics
    /// Panics if `size` is zero or larger than 32.
    pub fn new(size: u8) -> Self {
        assert!((1..=32).contains(&size), "between 1 and 32 lights");
        Self { size }
    }

    fn solved(&self) -> u32 {
        u32::MAX >> (32 - u32::from(self.size))
    }
}

impl Game for Lights {
    type State = LightsState;
    type Move = Toggle;

    fn num_players(&self) -> usize {
        1
    }

    fn initial_state(&self) -> Self::State {
        LightsState(0)
    }

    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move> {
        if self.status(state).is_some() {
            return Vec::new();
        }
        (0..self.size).map(Toggle).collect()
    }

    fn apply(&self, state: &Self::State, mv: &Self::Move) -> Self::State {
        LightsState(state.0 ^ (1 << mv.0))
    }

    fn status(&self, state: &Self::State) -> Option<Status> {
        (state.0 == self.solved()).then_some(Status::Win(0))
    }

    fn mover(&self, _state: &Self::State) -> Player {
        0
    }

    fn is_deduction_puzzle(&self) -> bool {
        true
    }

    fn material(&self, state: &Self::State, _player: Player) -> f32 {
        state.0.count_ones() as f32
    }
}
