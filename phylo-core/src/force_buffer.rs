use crate::types::NodeId;
use glam::DVec3;

/// A scratch buffer that accumulates the net force on each node.
///
/// Slot `i` corresponds to node `i` of the tree being simulated. The
/// buffer is cleared at the start of every step and filled by the
/// repulsion and spring phases before integration reads it.
#[derive(Debug, Default)]
pub struct ForceBuffer {
    force: Vec<DVec3>,
}

impl ForceBuffer {
    /// Creates a zeroed buffer for `len` nodes.
    pub fn with_len(len: usize) -> Self {
        Self {
            force: vec![DVec3::ZERO; len],
        }
    }

    /// Resizes the buffer to `len` slots and zeroes every slot.
    pub fn ensure_len(&mut self, len: usize) {
        if self.force.len() != len {
            self.force.resize(len, DVec3::ZERO);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.force.fill(DVec3::ZERO);
    }

    pub fn len(&self) -> usize {
        self.force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    /// Adds `f` to the force on `id`.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: NodeId, f: DVec3) {
        self.force[id] += f;
    }

    /// Applies an equal and opposite pair: `-f` on `i`, `+f` on `j`.
    #[inline]
    pub fn add_pair(&mut self, i: NodeId, j: NodeId, f: DVec3) {
        self.force[i] -= f;
        self.force[j] += f;
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> DVec3 {
        self.force[id]
    }

    /// Sum over all slots; zero whenever only pairs were added.
    #[cfg(test)]
    pub(crate) fn net(&self) -> DVec3 {
        self.force.iter().copied().sum()
    }
}
