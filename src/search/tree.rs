//! Arena-based search tree.
//!
//! A flat growable `Vec` of nodes addressed by `NodeId`. One arena is
//! built per search invocation and discarded with it.

use super::node::{NodeId, SearchNode};

pub struct SearchTree {
    nodes: Vec<SearchNode>,
    root: NodeId,
}

impl SearchTree {
    /// Create a tree seeded with its root node.
    #[must_use]
    pub fn new(root: SearchNode) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(1024),
            root: NodeId::new(0),
        };
        tree.nodes.push(root);
        tree
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a node, returning its ID.
    pub fn alloc(&mut self, node: SearchNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Among `id`'s children, the one maximizing UCB1.
    #[must_use]
    pub fn best_child_ucb1(&self, id: NodeId, temperature: f64) -> Option<NodeId> {
        let node = self.get(id);
        node.children
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let sa = self.get(a).ucb1(node.visits, temperature);
                let sb = self.get(b).ucb1(node.visits, temperature);
                sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Among `id`'s children, the most visited.
    #[must_use]
    pub fn most_visited_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .max_by_key(|&c| self.get(c).visits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Player;
    use crate::rules::Coord;
    use smallvec::smallvec;

    fn child(tree: &mut SearchTree, parent: NodeId, coord: Coord, visits: u32, wins: f64) -> NodeId {
        let mut node = SearchNode::new(parent, coord, Player::Two, 1, smallvec![], None);
        node.visits = visits;
        node.wins = wins;
        let id = tree.alloc(node);
        tree.get_mut(parent).children.push(id);
        id
    }

    #[test]
    fn test_alloc_and_get() {
        let mut tree = SearchTree::new(SearchNode::root(Player::One, smallvec![]));
        assert_eq!(tree.len(), 1);

        let root = tree.root();
        let id = child(&mut tree, root, Coord::new(0, 0), 3, 1.5);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(id).mv, Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_most_visited_child() {
        let mut tree = SearchTree::new(SearchNode::root(Player::One, smallvec![]));
        let root = tree.root();
        tree.get_mut(root).visits = 30;

        child(&mut tree, root, Coord::new(0, 0), 10, 2.0);
        let busy = child(&mut tree, root, Coord::new(1, 1), 20, 4.0);

        assert_eq!(tree.most_visited_child(root), Some(busy));
    }

    #[test]
    fn test_best_child_ucb1_greedy_at_zero_temperature() {
        let mut tree = SearchTree::new(SearchNode::root(Player::One, smallvec![]));
        let root = tree.root();
        tree.get_mut(root).visits = 30;

        let strong = child(&mut tree, root, Coord::new(0, 0), 10, 9.0);
        child(&mut tree, root, Coord::new(1, 1), 20, 4.0);

        assert_eq!(tree.best_child_ucb1(root, 0.0), Some(strong));
    }

    #[test]
    fn test_best_child_prefers_unvisited() {
        let mut tree = SearchTree::new(SearchNode::root(Player::One, smallvec![]));
        let root = tree.root();
        tree.get_mut(root).visits = 30;

        child(&mut tree, root, Coord::new(0, 0), 10, 9.0);
        let fresh = child(&mut tree, root, Coord::new(1, 1), 0, 0.0);

        assert_eq!(tree.best_child_ucb1(root, 1.0), Some(fresh));
    }
}
