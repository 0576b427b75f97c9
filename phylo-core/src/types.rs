/// Identifier for a node in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::nodes`, and is only meaningful within
/// the lifetime of a given `Tree` instance. Index `0` is always the root.
pub type NodeId = usize;

/// Structural role of a node, fixed when the node is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Pinned at the origin.
    Root,
    /// Bifurcation inside the sphere.
    Internal,
    /// Tip living on the sphere surface.
    Leaf,
}
