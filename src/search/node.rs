//! Search tree nodes.
//!
//! Nodes live in a flat arena and reference each other by index, so
//! the parent-linked tree shape needs no reference counting and the
//! whole arena is dropped at the end of the search call.

use smallvec::SmallVec;

use crate::core::{Outcome, Player};
use crate::rules::Coord;

/// Index into the search arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no node" (the root's parent).
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// One node of the search tree.
///
/// `wins` accumulates result values in {1, 0.5, 0} from the
/// perspective of `mover`, the player whose move led here. Since a
/// node's children are all moved into by the side to move at that
/// node, a parent comparing its children's means is always reading
/// values from its own mover's opponent, which is exactly the
/// perspective flip backpropagation needs.
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub parent: NodeId,
    /// Move that led to this node; `None` only at the root.
    pub mv: Option<Coord>,
    /// Player who made `mv`. For the root: the opponent of the side
    /// to move, so the perspective convention holds uniformly.
    pub mover: Player,
    pub wins: f64,
    pub visits: u32,
    pub depth: u16,
    pub children: SmallVec<[NodeId; 8]>,
    /// Legal moves not yet expanded into children.
    pub untried: SmallVec<[Coord; 8]>,
    /// Terminal outcome, when this node ends the match.
    pub terminal: Option<Outcome>,
}

impl SearchNode {
    pub fn new(
        parent: NodeId,
        mv: Coord,
        mover: Player,
        depth: u16,
        untried: SmallVec<[Coord; 8]>,
        terminal: Option<Outcome>,
    ) -> Self {
        Self {
            parent,
            mv: Some(mv),
            mover,
            wins: 0.0,
            visits: 0,
            depth,
            children: SmallVec::new(),
            untried,
            terminal,
        }
    }

    /// Root node for a search where `to_move` is about to act.
    pub fn root(to_move: Player, untried: SmallVec<[Coord; 8]>) -> Self {
        Self {
            parent: NodeId::NONE,
            mv: None,
            mover: to_move.other(),
            wins: 0.0,
            visits: 0,
            depth: 0,
            children: SmallVec::new(),
            untried,
            terminal: None,
        }
    }

    /// Mean result value from `mover`'s perspective.
    #[must_use]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / f64::from(self.visits)
        }
    }

    /// UCB1 score seen from the parent choosing this child.
    ///
    /// exploitation = wins/visits, exploration =
    /// sqrt(2 ln(parent) / visits) scaled by the temperature.
    #[must_use]
    pub fn ucb1(&self, parent_visits: u32, temperature: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let exploitation = self.mean_value();
        let exploration = (2.0 * f64::from(parent_visits.max(1)).ln() / f64::from(self.visits))
            .sqrt()
            * temperature;
        exploitation + exploration
    }
}
