//! Externally supplied tree shapes and the static wedge layout.
//!
//! A [`TopologyNode`] is the already-parsed form of a phylogeny
//! description; it can either seed the force-directed layout through
//! [`crate::builder::TreeBuilder::build_from_topology`] or be placed
//! directly on the sphere with [`wedge_layout`].

use std::{
    f64::consts::{PI, TAU},
    path::Path,
};

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{
    config::validate_radius,
    error::{Error, Result},
    types::NodeId,
};

/// Smallest azimuthal wedge a child subtree is given.
pub const MIN_WEDGE: f64 = 3.0 * PI / 180.0;

/// Largest topology accepted, in nodes; the size of a full binary tree at
/// [`MAX_SUPPORTED_DEPTH`](crate::config::MAX_SUPPORTED_DEPTH).
pub const MAX_TOPOLOGY_NODES: usize = (1 << 11) - 1;

/// One clade of a rooted tree with arbitrary fan-out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Branch length to the parent; carried through, unused by the layouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TopologyNode>,
}

impl TopologyNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_children(children: Vec<TopologyNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of tips below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(n) = stack.pop() {
            if n.is_leaf() {
                count += 1;
            } else {
                stack.extend(n.children.iter());
            }
        }
        count
    }

    /// Number of edges on the longest root-to-tip path.
    pub fn max_depth(&self) -> u32 {
        let mut best = 0;
        let mut stack = vec![(self, 0u32)];
        while let Some((n, d)) = stack.pop() {
            best = best.max(d);
            stack.extend(n.children.iter().map(|c| (c, d + 1)));
        }
        best
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(n) = stack.pop() {
            count += 1;
            stack.extend(n.children.iter());
        }
        count
    }

    /// Rejects topologies too large to simulate.
    pub fn check_size(&self) -> Result<()> {
        let nodes = self.node_count();
        if nodes > MAX_TOPOLOGY_NODES {
            return Err(Error::Topology(format!(
                "{nodes} nodes exceeds the supported maximum of {MAX_TOPOLOGY_NODES}"
            )));
        }
        Ok(())
    }
}

/// Spherical angles assigned to a node by [`wedge_layout`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WedgeAngles {
    /// Polar angle, proportional to depth (root at the north pole).
    pub theta: f64,
    /// Azimuth, the midpoint of the node's wedge.
    pub phi: f64,
}

/// Static sphere placement of a topology, in pre-order.
#[derive(Clone, Debug, Default)]
pub struct WedgeLayout {
    pub angles: Vec<WedgeAngles>,
    pub positions: Vec<DVec3>,
    /// Parent/child pairs, parent first.
    pub edges: Vec<(NodeId, NodeId)>,
}

impl WedgeLayout {
    pub fn segments(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        self.edges
            .iter()
            .map(|&(a, b)| (self.positions[a], self.positions[b]))
    }
}

/// Places every node of `root` on a sphere of `radius`.
///
/// Depth maps linearly onto the polar angle `[0, π]`. Each child receives
/// an azimuthal wedge proportional to its leaf count, never narrower than
/// [`MIN_WEDGE`]; when the minimums overflow the parent's wedge all child
/// wedges are scaled down by the same factor.
pub fn wedge_layout(root: &TopologyNode, radius: f64) -> Result<WedgeLayout> {
    validate_radius(radius)?;
    root.check_size()?;

    let max_depth = root.max_depth();
    let mut layout = WedgeLayout::default();

    // (node, parent id, wedge start, wedge end, depth)
    let mut stack: Vec<(&TopologyNode, Option<NodeId>, f64, f64, u32)> =
        vec![(root, None, 0.0, TAU, 0)];

    while let Some((node, parent, start, end, depth)) = stack.pop() {
        let id = layout.angles.len();
        let theta = if max_depth == 0 {
            0.0
        } else {
            depth as f64 / max_depth as f64 * PI
        };
        let phi = 0.5 * (start + end);

        layout.angles.push(WedgeAngles { theta, phi });
        layout.positions.push(spherical_to_cartesian(radius, theta, phi));
        if let Some(p) = parent {
            layout.edges.push((p, id));
        }

        let wedges = child_wedges(node, end - start);
        let mut children = Vec::with_capacity(node.children.len());
        let mut cursor = start;
        for (child, w) in node.children.iter().zip(wedges) {
            children.push((child, Some(id), cursor, cursor + w, depth + 1));
            cursor += w;
        }
        // Reversed so the first child is popped (and numbered) first.
        stack.extend(children.into_iter().rev());
    }

    Ok(layout)
}

fn child_wedges(node: &TopologyNode, available: f64) -> Vec<f64> {
    let total = node.leaf_count().max(1) as f64;
    let mut wedges: Vec<f64> = node
        .children
        .iter()
        .map(|c| (c.leaf_count().max(1) as f64 / total * available).max(MIN_WEDGE))
        .collect();

    let sum: f64 = wedges.iter().sum();
    if sum > available {
        let scale = available / sum;
        for w in &mut wedges {
            *w *= scale;
        }
    }
    wedges
}

/// `y` is the polar axis.
pub fn spherical_to_cartesian(radius: f64, theta: f64, phi: f64) -> DVec3 {
    let sin_theta = theta.sin();
    DVec3::new(
        radius * sin_theta * phi.cos(),
        radius * theta.cos(),
        radius * sin_theta * phi.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced() -> TopologyNode {
        // ((a,b),(c,(d,e)))
        TopologyNode::with_children(vec![
            TopologyNode::with_children(vec![TopologyNode::leaf("a"), TopologyNode::leaf("b")]),
            TopologyNode::with_children(vec![
                TopologyNode::leaf("c"),
                TopologyNode::with_children(vec![
                    TopologyNode::leaf("d"),
                    TopologyNode::leaf("e"),
                ]),
            ]),
        ])
    }

    #[test]
    fn counts_leaves_depth_and_nodes() {
        let t = balanced();
        assert_eq!(t.leaf_count(), 5);
        assert_eq!(t.max_depth(), 3);
        assert_eq!(t.node_count(), 9);

        let lone = TopologyNode::leaf("x");
        assert_eq!(lone.leaf_count(), 1);
        assert_eq!(lone.max_depth(), 0);
    }

    #[test]
    fn parses_json_with_optional_fields() {
        let json = r#"{ "children": [ { "name": "a", "length": 0.5 }, { "name": "b" } ] }"#;
        let t = TopologyNode::from_json_str(json).unwrap();
        assert_eq!(t.children.len(), 2);
        assert_eq!(t.children[0].name.as_deref(), Some("a"));
        assert_eq!(t.children[0].length, Some(0.5));
        assert!(t.children[1].is_leaf());
    }

    #[test]
    fn wedge_layout_places_root_at_pole_and_numbers_preorder() {
        let layout = wedge_layout(&balanced(), 300.0).unwrap();
        assert_eq!(layout.positions.len(), 9);
        assert_eq!(layout.edges.len(), 8);

        let root = layout.positions[0];
        assert!((root - DVec3::new(0.0, 300.0, 0.0)).length() < 1e-9);

        // Pre-order: root, (a,b) clade, a, b, then the second clade.
        assert_eq!(layout.edges[0], (0, 1));
        assert_eq!(layout.edges[1], (1, 2));
        assert_eq!(layout.edges[2], (1, 3));
        assert_eq!(layout.edges[3], (0, 4));

        for p in &layout.positions {
            assert!((p.length() - 300.0).abs() < 1e-9);
        }
    }

    #[test]
    fn wedges_are_proportional_to_leaf_counts() {
        let layout = wedge_layout(&balanced(), 1.0).unwrap();
        // First clade holds 2 of 5 leaves: wedge [0, 0.4 * TAU).
        let first = layout.angles[1];
        assert!((first.phi - 0.2 * TAU).abs() < 1e-12);
        // Second clade: [0.4 * TAU, TAU).
        let second = layout.angles[4];
        assert!((second.phi - 0.7 * TAU).abs() < 1e-12);
        // Deepest tips sit at the south pole angle.
        assert!((layout.angles[8].theta - PI).abs() < 1e-12);
    }

    #[test]
    fn minimum_wedges_are_scaled_to_fit() {
        // 200 tips under one node: 200 * 3° overflow 360°.
        let star = TopologyNode::with_children(
            (0..200).map(|i| TopologyNode::leaf(format!("t{i}"))).collect(),
        );
        let wedges = child_wedges(&star, TAU);
        let sum: f64 = wedges.iter().sum();
        assert!((sum - TAU).abs() < 1e-9);
        assert!(wedges.iter().all(|w| (w - TAU / 200.0).abs() < 1e-12));

        // A tiny clade next to a huge one is widened to the minimum.
        let lopsided = TopologyNode::with_children(vec![star.clone(), TopologyNode::leaf("x")]);
        let wedges = child_wedges(&lopsided, TAU);
        let scale = TAU / (200.0 / 201.0 * TAU + MIN_WEDGE);
        assert!((wedges[1] - MIN_WEDGE * scale).abs() < 1e-12);
    }

    #[test]
    fn single_node_layout_has_no_edges() {
        let layout = wedge_layout(&TopologyNode::leaf("x"), 10.0).unwrap();
        assert_eq!(layout.positions.len(), 1);
        assert_eq!(layout.angles[0].theta, 0.0);
        assert!(layout.edges.is_empty());
        assert_eq!(layout.segments().count(), 0);
    }

    #[test]
    fn rejects_topologies_past_the_node_limit() {
        // A star with one more node than the limit allows.
        let star = |tips: usize| {
            let children = (0..tips).map(|i| TopologyNode::leaf(format!("t{i}")));
            TopologyNode::with_children(children.collect())
        };
        assert!(star(MAX_TOPOLOGY_NODES - 1).check_size().is_ok());

        let too_big = star(MAX_TOPOLOGY_NODES);
        assert!(matches!(too_big.check_size(), Err(Error::Topology(_))));
        assert!(matches!(wedge_layout(&too_big, 1.0), Err(Error::Topology(_))));
    }

    #[test]
    fn load_reads_a_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(&path, serde_json::to_string(&balanced()).unwrap()).unwrap();

        let loaded = TopologyNode::load(&path).unwrap();
        assert_eq!(loaded, balanced());
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(TopologyNode::load(&missing), Err(Error::Io(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ \"children\": [").unwrap();
        assert!(matches!(TopologyNode::load(&broken), Err(Error::Json(_))));
    }

    #[test]
    fn rejects_bad_radius() {
        assert!(matches!(
            wedge_layout(&balanced(), 0.0),
            Err(Error::Config(_))
        ));
    }
}
