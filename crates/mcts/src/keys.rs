//! Keys for the shared statistics tables.
//!
//! Both keys include the ply at which the move (or the first move of the
//! sequence) was played, so the same move can carry different values in
//! different phases of a game.

/// A single move at a given ply.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MoveKey<M> {
    pub mv: M,
    pub ply: usize,
}

impl<M> MoveKey<M> {
    /// Create a key for `mv` played at `ply`.
    pub fn new(mv: M, ply: usize) -> Self {
        Self { mv, ply }
    }
}

/// A sequence of consecutive moves, oldest first, starting at `start_ply`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NGramMoveKey<M> {
    pub moves: Box<[M]>,
    pub start_ply: usize,
}

impl<M> NGramMoveKey<M> {
    /// Create a key for `moves` whose first move was played at `start_ply`.
    pub fn new(moves: impl Into<Box<[M]>>, start_ply: usize) -> Self {
        Self {
            moves: moves.into(),
            start_ply,
        }
    }

    /// Number of moves in the sequence.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_move_key_equality_needs_both_fields() {
        assert_eq!(MoveKey::new('a', 3), MoveKey::new('a', 3));
        assert_ne!(MoveKey::new('a', 3), MoveKey::new('a', 4));
        assert_ne!(MoveKey::new('a', 3), MoveKey::new('b', 3));
    }

    #[test]
    fn test_ngram_key_order_matters() {
        let mut keys = HashSet::new();
        assert!(keys.insert(NGramMoveKey::new(vec![1, 2], 0)));
        assert!(keys.insert(NGramMoveKey::new(vec![2, 1], 0)));
        assert!(keys.insert(NGramMoveKey::new(vec![1, 2], 1)));
        assert!(!keys.insert(NGramMoveKey::new(vec![1, 2], 0)));
        assert_eq!(NGramMoveKey::new(vec![1, 2, 3], 5).len(), 3);
    }
}
