//! Tic-tac-toe implementation for playout validation.
//!
//! Tic-tac-toe is a solved game where perfect play always results in a draw,
//! and it is small enough that whole playouts are cheap. That makes it the
//! baseline game for the strategy tests.

use playout_core::{Game, GameMove, Player, Status};
use std::fmt;

/// Rows, columns and diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // top row
    [3, 4, 5], // middle row
    [6, 7, 8], // bottom row
    [0, 3, 6], // left column
    [1, 4, 7], // center column
    [2, 5, 8], // right column
    [0, 4, 8], // main diagonal
    [2, 4, 6], // anti-diagonal
];

/// Tic-tac-toe mark.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Get the opposing mark.
    pub fn opposite(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Player index owning this mark (X moves first).
    pub fn player(self) -> Player {
        match self {
            Mark::X => 0,
            Mark::O => 1,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Tic-tac-toe board state.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct TicTacToeState {
    /// Board: 9 cells, indexed 0-8 (row-major).
    /// ```text
    /// 0 | 1 | 2
    /// ---------
    /// 3 | 4 | 5
    /// ---------
    /// 6 | 7 | 8
    /// ```
    board: [Option<Mark>; 9],

    /// Current mark to move.
    current: Mark,

    /// Cached winner (if any).
    winner: Option<Mark>,
}

impl TicTacToeState {
    /// Create a new empty board with X to move.
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            current: Mark::X,
            winner: None,
        }
    }

    /// Get the current mark to move.
    pub fn current(&self) -> Mark {
        self.current
    }

    /// Get the winner, if any.
    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    /// Get the mark at a cell, if any.
    pub fn get(&self, cell: usize) -> Option<Mark> {
        self.board.get(cell).copied().flatten()
    }

    /// Check for a winner on the current board.
    fn check_winner(&self) -> Option<Mark> {
        for line in LINES {
            if let Some(mark) = self.board[line[0]] {
                if self.board[line[1]] == Some(mark) && self.board[line[2]] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }

    /// Check if the board is full (draw if no winner).
    fn is_full(&self) -> bool {
        self.board.iter().all(|c| c.is_some())
    }

    /// Number of lines still open for the mark (no opposing mark on them).
    fn open_lines(&self, mark: Mark) -> usize {
        LINES
            .iter()
            .filter(|line| {
                line.iter()
                    .all(|&cell| self.board[cell] != Some(mark.opposite()))
            })
            .count()
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            if row > 0 {
                writeln!(f, "-----------")?;
            }
            for col in 0..3 {
                if col > 0 {
                    write!(f, " | ")?;
                }
                match self.board[row * 3 + col] {
                    Some(mark) => write!(f, " {mark} ")?,
                    None => write!(f, "   ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Tic-tac-toe move: a mark placed on a cell (0-8).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicTacToeMove {
    pub cell: u8,
    pub mark: Mark,
}

impl TicTacToeMove {
    /// Get the row (0-2).
    pub fn row(self) -> u8 {
        self.cell / 3
    }

    /// Get the column (0-2).
    pub fn col(self) -> u8 {
        self.cell % 3
    }
}

impl GameMove for TicTacToeMove {
    fn mover(&self) -> Player {
        self.mark.player()
    }
}

impl fmt::Display for TicTacToeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.mark, self.row(), self.col())
    }
}

/// Tic-tac-toe game implementation.
#[derive(Clone, Debug)]
pub struct TicTacToe;

impl Game for TicTacToe {
    type State = TicTacToeState;
    type Move = TicTacToeMove;

    fn num_players(&self) -> usize {
        2
    }

    fn initial_state(&self) -> Self::State {
        TicTacToeState::new()
    }

    fn legal_moves(&self, state: &Self::State) -> Vec<Self::Move> {
        if self.status(state).is_some() {
            return Vec::new();
        }
        state
            .board
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(i, _)| TicTacToeMove {
                cell: i as u8,
                mark: state.current,
            })
            .collect()
    }

    fn apply(&self, state: &Self::State, mv: &Self::Move) -> Self::State {
        let mut new_state = state.clone();
        new_state.board[mv.cell as usize] = Some(state.current);
        new_state.current = state.current.opposite();
        new_state.winner = new_state.check_winner();
        new_state
    }

    fn status(&self, state: &Self::State) -> Option<Status> {
        if let Some(winner) = state.winner {
            Some(Status::Win(winner.player()))
        } else if state.is_full() {
            Some(Status::Draw)
        } else {
            None
        }
    }

    fn mover(&self, state: &Self::State) -> Player {
        state.current.player()
    }

    /// Open lines stand in for material: lines the opponent has not blocked.
    fn material(&self, state: &Self::State, player: Player) -> f32 {
        let mark = if player == 0 { Mark::X } else { Mark::O };
        state.open_lines(mark) as f32
    }
}
