//! The four phases of one layout step.
//!
//! A step runs, in order:
//! 1. [`repulsion_phase`] — every pair of nodes pushes apart with an
//!    inverse-square force, accumulated in a [`ForceBuffer`].
//! 2. [`spring_phase`] — every edge acts as a linear spring around
//!    `spring_rest_len`.
//! 3. [`integration_phase`] — damped semi-implicit Euler; the root is
//!    pinned at the origin.
//! 4. [`constraint_phase`] — leaves are projected onto the sphere and
//!    internal nodes are kept inside it.
//!
//! Forces must be fully accumulated before integration, and integration
//! must finish before constraints run.

use glam::DVec3;
use log::debug;
use rand::Rng;

use crate::{
    config::LayoutConfig,
    force_buffer::ForceBuffer,
    tree::{Node, Tree},
    types::NodeRole,
};

/// Added to squared distances before dividing.
pub const REPULSION_EPS: f64 = 1e-4;
/// Added to edge lengths before dividing.
pub const SPRING_EPS: f64 = 1e-5;
/// Leaves closer than this to the origin are re-seeded.
pub const COLLAPSE_EPS: f64 = 1e-4;

/// Accumulates pairwise repulsion over all unordered node pairs.
///
/// For the pair `(i, j)` with `d = pos_j - pos_i`, the magnitude is
/// `repulsion_strength / (|d|² + ε)`, applied to `i` along `-d` and to
/// `j` along `+d`.
///
/// The buffer is resized (and cleared) to `tree.len()` first, so this
/// phase always runs before [`spring_phase`].
pub fn repulsion_phase(tree: &Tree, cfg: &LayoutConfig, acc: &mut ForceBuffer) {
    acc.ensure_len(tree.len());

    let nodes = &tree.nodes;
    for (i, a) in nodes.iter().enumerate() {
        for (j, b) in nodes.iter().enumerate().skip(i + 1) {
            let d = b.pos - a.pos;
            let dist_sq = d.length_squared() + REPULSION_EPS;
            let rep = cfg.repulsion_strength / dist_sq;
            acc.add_pair(i, j, d * (rep / dist_sq.sqrt()));
        }
    }
}

/// Accumulates one Hookean spring per edge.
///
/// The signed force `spring_strength * (|d| - spring_rest_len)` pulls the
/// endpoints together when stretched and pushes them apart when
/// compressed.
pub fn spring_phase(tree: &Tree, cfg: &LayoutConfig, acc: &mut ForceBuffer) {
    for (i, j) in tree.edges() {
        let d = tree.nodes[j].pos - tree.nodes[i].pos;
        let dist = d.length() + SPRING_EPS;
        let force = cfg.spring_strength * (dist - cfg.spring_rest_len);
        let f = d * (force / dist);
        acc.add(i, f);
        acc.add(j, -f);
    }
}

/// Advances velocities and positions by one `time_step`.
///
/// `vel += force * dt`, then `vel *= damping`, then `pos += vel * dt`.
/// The root ignores its force and is reset to the origin at rest.
pub fn integration_phase(tree: &mut Tree, acc: &ForceBuffer, cfg: &LayoutConfig) {
    let dt = cfg.time_step;
    for (i, node) in tree.nodes.iter_mut().enumerate() {
        if node.is_root() {
            node.pos = DVec3::ZERO;
            node.vel = DVec3::ZERO;
            continue;
        }

        node.vel += acc.get(i) * dt;
        node.vel *= cfg.damping;
        node.pos += node.vel * dt;
    }
}

/// Applies the geometric constraints after integration.
///
/// - Leaves are rescaled onto the sphere and lose their radial velocity,
///   so they only slide tangentially. A leaf that collapsed onto the
///   origin is moved to a random leaf anchor and stopped.
/// - Internal nodes outside the sphere are pulled back onto it and lose
///   their radial velocity; inside the sphere they are left alone.
///
/// ### Returns
/// The number of collapsed leaves that were re-seeded.
pub fn constraint_phase(tree: &mut Tree, cfg: &LayoutConfig, rng: &mut impl Rng) -> usize {
    let radius = cfg.sphere_radius;
    let Tree {
        nodes,
        leaf_anchors,
    } = tree;

    let mut reseeded = 0;
    for node in nodes.iter_mut() {
        match node.role {
            NodeRole::Root => {}
            NodeRole::Leaf => {
                let r = node.pos.length();
                if r < COLLAPSE_EPS {
                    let anchor = if leaf_anchors.is_empty() {
                        DVec3::Y
                    } else {
                        leaf_anchors[rng.random_range(0..leaf_anchors.len())]
                    };
                    node.pos = anchor.normalize_or(DVec3::Y) * radius;
                    node.vel = DVec3::ZERO;
                    reseeded += 1;
                } else {
                    project_onto_sphere(node, r, radius);
                }
            }
            NodeRole::Internal => {
                let r2 = node.pos.length_squared();
                if r2 > radius * radius {
                    project_onto_sphere(node, r2.sqrt(), radius);
                }
            }
        }
    }

    if reseeded > 0 {
        debug!("re-seeded {reseeded} collapsed leaves");
    }
    reseeded
}

/// Rescales `node` from distance `r` to exactly `radius` and removes the
/// radial component of its velocity.
#[inline]
fn project_onto_sphere(node: &mut Node, r: f64, radius: f64) {
    node.pos *= radius / r;
    let n = node.pos / radius;
    node.vel -= n * node.vel.dot(n);
}
