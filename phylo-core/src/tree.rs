use glam::DVec3;

use crate::types::{NodeId, NodeRole};

#[derive(Clone, Debug)]
pub struct Node {
    pub pos: DVec3,
    pub vel: DVec3,
    pub depth: u32,
    pub role: NodeRole,
    /// Undirected neighbours; parent and children are recorded on both ends.
    pub edges: Vec<NodeId>,
}

/// Node graph shared between the builder, the simulator and the renderer.
///
/// Topology is fixed once built; only `pos` and `vel` change afterwards.
#[derive(Clone, Debug)]
pub struct Tree {
    pub nodes: Vec<Node>,
    /// Sphere samples the leaves were placed on, reused when a collapsed
    /// leaf has to be re-seeded.
    pub leaf_anchors: Vec<DVec3>,
}

impl Node {
    pub fn new_root() -> Self {
        Self::new(DVec3::ZERO, 0, NodeRole::Root)
    }

    pub fn new(pos: DVec3, depth: u32, role: NodeRole) -> Self {
        Self {
            pos,
            vel: DVec3::ZERO,
            depth,
            role,
            edges: Vec::with_capacity(3),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.role == NodeRole::Root
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.role == NodeRole::Leaf
    }

    /// A leaf, or a root without edges (the whole tree is one tip).
    #[inline]
    pub fn is_tip(&self) -> bool {
        self.is_leaf() || (self.is_root() && self.edges.is_empty())
    }
}

impl Tree {
    /// A tree holding only the root at the origin.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new_root()],
            leaf_anchors: Vec::new(),
        }
    }

    pub fn add_node(&mut self, pos: DVec3, depth: u32, role: NodeRole) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(pos, depth, role));
        id
    }

    /// Records a reciprocal edge between `a` and `b`.
    pub fn connect(&mut self, a: NodeId, b: NodeId) {
        self.nodes[a].edges.push(b);
        self.nodes[b].edges.push(a);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Tips of the tree; a lone root counts as the single tip.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_tip())
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Every undirected edge exactly once, as `(i, j)` with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.iter().enumerate().flat_map(|(i, n)| {
            n.edges
                .iter()
                .copied()
                .filter(move |&j| j > i)
                .map(move |j| (i, j))
        })
    }

    /// Endpoint positions of every edge, one line segment per edge.
    pub fn segments(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        self.edges()
            .map(|(i, j)| (self.nodes[i].pos, self.nodes[j].pos))
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.nodes.iter().map(|n| n.pos)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
