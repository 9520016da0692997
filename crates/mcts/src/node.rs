//! Search tree node types.
//!
//! Uses arena allocation with indices for cache locality and simpler memory management.

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Statistics for a single node.
///
/// Values are utilities of the player who made the move leading to the node.
#[derive(Clone, Debug, Default)]
pub struct NodeStats {
    /// Number of times this node was visited during search.
    pub visit_count: u32,

    /// Sum of utilities from all visits.
    pub value_sum: f64,
}

impl NodeStats {
    /// Mean utility; 0.0 if the node has never been visited.
    pub fn mean_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / f64::from(self.visit_count)
        }
    }

    /// UCT score as seen from the parent.
    ///
    /// Unvisited nodes score infinity so every child is tried once.
    pub fn uct(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visit_count == 0 {
            return f64::INFINITY;
        }
        let parent = f64::from(parent_visits.max(1));
        self.mean_value() + exploration * (parent.ln() / f64::from(self.visit_count)).sqrt()
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct Node<M> {
    /// Move that led to this node (None for root).
    pub mv: Option<M>,

    /// Node statistics.
    pub stats: NodeStats,

    /// Children: (move, node_id) pairs.
    pub children: Vec<(M, NodeId)>,

    /// Whether this node has been expanded (children generated).
    pub expanded: bool,
}

impl<M> Node<M> {
    /// Create a new unexpanded node.
    pub fn new(mv: Option<M>) -> Self {
        Self {
            mv,
            stats: NodeStats::default(),
            children: Vec::new(),
            expanded: false,
        }
    }

    /// Create the root node.
    pub fn root() -> Self {
        Self::new(None)
    }
}
