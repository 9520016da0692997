//! Search tree stored as a flat arena.
//!
//! Nodes refer to their children by index, so the whole tree is one `Vec`
//! that is reset, not freed, between searches.

use crate::node::{Node, NodeId};

#[derive(Debug)]
pub struct Tree<M> {
    nodes: Vec<Node<M>>,
}

impl<M: Clone> Tree<M> {
    /// A tree holding only an unexpanded root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::root()],
        }
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn get(&self, id: NodeId) -> &Node<M> {
        &self.nodes[id.0]
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<M> {
        &mut self.nodes[id.0]
    }

    /// Append a child reached by `mv` under `parent`.
    pub fn add_child(&mut self, parent: NodeId, mv: M) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Some(mv.clone())));
        self.nodes[parent.0].children.push((mv, id));
        id
    }

    /// Drop every node but a fresh root, keeping the allocation.
    pub fn reset(&mut self) {
        self.nodes.truncate(0);
        self.nodes.push(Node::root());
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> &Node<M> {
        self.get(NodeId::ROOT)
    }
}

impl<M: Clone> Default for Tree<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_child_links_parent() {
        let mut tree: Tree<char> = Tree::new();
        let a = tree.add_child(NodeId::ROOT, 'a');
        let b = tree.add_child(a, 'b');

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root().children, vec![('a', a)]);
        assert_eq!(tree.get(a).children, vec![('b', b)]);
        assert_eq!(tree.get(b).mv, Some('b'));
    }

    #[test]
    fn test_reset_keeps_only_a_fresh_root() {
        let mut tree: Tree<char> = Tree::new();
        tree.add_child(NodeId::ROOT, 'a');
        tree.get_mut(NodeId::ROOT).expanded = true;

        tree.reset();
        assert_eq!(tree.len(), 1);
        assert!(!tree.root().expanded);
        assert!(tree.root().children.is_empty());
    }
}
