//! Construction of the initial node graph.
//!
//! Leaves start on a Fibonacci lattice over the sphere, internal nodes at
//! a radius proportional to their depth in a random direction. Both
//! children of a node are created before either subtree is grown, and
//! leaves take lattice points in that creation order, so sibling leaves
//! are not necessarily neighbours on the sphere.

use std::f64::consts::{PI, TAU};

use glam::DVec3;
use log::debug;
use rand::Rng;

use crate::{
    config::{LayoutConfig, MAX_SUPPORTED_DEPTH, validate_radius},
    error::{ConfigError, Result},
    sphere::lattice_points,
    topology::TopologyNode,
    tree::Tree,
    types::{NodeId, NodeRole},
};

#[derive(Clone, Copy, Debug)]
pub struct TreeBuilder {
    max_depth: u32,
    sphere_radius: f64,
    jitter: f64,
}

impl TreeBuilder {
    pub fn new(max_depth: u32, sphere_radius: f64) -> std::result::Result<Self, ConfigError> {
        if max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::MaxDepth {
                got: max_depth,
                max: MAX_SUPPORTED_DEPTH,
            });
        }
        validate_radius(sphere_radius)?;
        Ok(Self {
            max_depth,
            sphere_radius,
            jitter: LayoutConfig::default().jitter,
        })
    }

    pub fn from_config(cfg: &LayoutConfig) -> std::result::Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            max_depth: cfg.max_depth,
            sphere_radius: cfg.sphere_radius,
            jitter: cfg.jitter,
        })
    }

    /// Per-axis offset range for internal nodes; negative or NaN means none.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    /// Builds a full binary tree of `2^(D+1) - 1` nodes and `2^D` leaves.
    ///
    /// Depth `0` yields a lone root without edges.
    pub fn build(&self, rng: &mut impl Rng) -> Tree {
        let mut tree = Tree::new();
        if self.max_depth == 0 {
            return tree;
        }

        tree.nodes.reserve((1usize << (self.max_depth + 1)) - 2);
        tree.leaf_anchors = lattice_points(1usize << self.max_depth, self.sphere_radius);

        let mut next_leaf = 0;
        self.grow_binary(&mut tree, 0, 1, &mut next_leaf, rng);

        debug!(
            "built binary tree: depth {}, {} nodes, {} leaves",
            self.max_depth,
            tree.len(),
            next_leaf
        );
        tree
    }

    /// Builds a tree with the shape of `topology`, ignoring the configured
    /// depth in favour of the topology's own.
    pub fn build_from_topology(&self, topology: &TopologyNode, rng: &mut impl Rng) -> Result<Tree> {
        topology.check_size()?;

        let mut tree = Tree::new();
        if topology.is_leaf() {
            return Ok(tree);
        }

        let max_depth = topology.max_depth();
        tree.nodes.reserve(topology.node_count() - 1);
        tree.leaf_anchors = lattice_points(topology.leaf_count(), self.sphere_radius);

        let mut next_leaf = 0;
        self.grow_topology(&mut tree, 0, topology, 1, max_depth, &mut next_leaf, rng);

        debug!(
            "built tree from topology: depth {}, {} nodes, {} leaves",
            max_depth,
            tree.len(),
            next_leaf
        );
        Ok(tree)
    }

    fn grow_binary(
        &self,
        tree: &mut Tree,
        parent: NodeId,
        depth: u32,
        next_leaf: &mut usize,
        rng: &mut impl Rng,
    ) {
        let is_leaf = depth == self.max_depth;
        let left = self.spawn(tree, depth, self.max_depth, is_leaf, next_leaf, rng);
        let right = self.spawn(tree, depth, self.max_depth, is_leaf, next_leaf, rng);
        tree.connect(parent, left);
        tree.connect(parent, right);

        if !is_leaf {
            self.grow_binary(tree, left, depth + 1, next_leaf, rng);
            self.grow_binary(tree, right, depth + 1, next_leaf, rng);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn grow_topology(
        &self,
        tree: &mut Tree,
        parent: NodeId,
        node: &TopologyNode,
        depth: u32,
        max_depth: u32,
        next_leaf: &mut usize,
        rng: &mut impl Rng,
    ) {
        let ids: Vec<NodeId> = node
            .children
            .iter()
            .map(|child| {
                let id = self.spawn(tree, depth, max_depth, child.is_leaf(), next_leaf, rng);
                tree.connect(parent, id);
                id
            })
            .collect();

        for (child, id) in node.children.iter().zip(ids) {
            if !child.is_leaf() {
                self.grow_topology(tree, id, child, depth + 1, max_depth, next_leaf, rng);
            }
        }
    }

    fn spawn(
        &self,
        tree: &mut Tree,
        depth: u32,
        max_depth: u32,
        is_leaf: bool,
        next_leaf: &mut usize,
        rng: &mut impl Rng,
    ) -> NodeId {
        if is_leaf {
            let pos = tree.leaf_anchors[*next_leaf];
            *next_leaf += 1;
            tree.add_node(pos, depth, NodeRole::Leaf)
        } else {
            let pos = self.internal_position(depth, max_depth, rng);
            tree.add_node(pos, depth, NodeRole::Internal)
        }
    }

    fn internal_position(&self, depth: u32, max_depth: u32, rng: &mut impl Rng) -> DVec3 {
        let r = depth as f64 / max_depth as f64 * self.sphere_radius;
        let theta = rng.random_range(0.0..TAU);
        let phi = rng.random_range(0.0..PI);
        let mut pos = DVec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        );

        if self.jitter > 0.0 {
            let j = self.jitter;
            pos += DVec3::new(
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
            );
        }

        let len = pos.length();
        if len > self.sphere_radius {
            pos *= self.sphere_radius / len;
        }
        pos
    }
}
