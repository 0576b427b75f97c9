//! Force-directed layout of a tree on and inside a sphere.

use log::{debug, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    builder::TreeBuilder,
    config::LayoutConfig,
    error::{ConfigError, Result},
    force_buffer::ForceBuffer,
    phases,
    topology::TopologyNode,
    tree::Tree,
};

/// Owns a [`Tree`] and relaxes it one step at a time.
///
/// The random source is only consulted while building the tree and when a
/// collapsed leaf has to be re-seeded, so with a fixed seed every run is
/// reproducible.
#[derive(Debug)]
pub struct LayoutSimulator<R: Rng = StdRng> {
    tree: Tree,
    cfg: LayoutConfig,
    acc: ForceBuffer,
    rng: R,
    steps: u64,
}

impl LayoutSimulator<StdRng> {
    /// Builds a full binary tree with an OS-seeded random source.
    pub fn new(cfg: LayoutConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_rng(cfg, StdRng::from_os_rng())
    }

    pub fn with_seed(cfg: LayoutConfig, seed: u64) -> std::result::Result<Self, ConfigError> {
        Self::with_rng(cfg, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LayoutSimulator<R> {
    pub fn with_rng(cfg: LayoutConfig, mut rng: R) -> std::result::Result<Self, ConfigError> {
        let tree = TreeBuilder::from_config(&cfg)?.build(&mut rng);
        Self::from_tree(tree, cfg, rng)
    }

    /// Builds the tree from an externally supplied topology.
    pub fn from_topology(cfg: LayoutConfig, topology: &TopologyNode, mut rng: R) -> Result<Self> {
        let tree = TreeBuilder::from_config(&cfg)?.build_from_topology(topology, &mut rng)?;
        Ok(Self::from_tree(tree, cfg, rng)?)
    }

    /// Takes over an existing tree as-is.
    pub fn from_tree(
        tree: Tree,
        cfg: LayoutConfig,
        rng: R,
    ) -> std::result::Result<Self, ConfigError> {
        cfg.validate()?;
        let acc = ForceBuffer::with_len(tree.len());
        Ok(Self {
            tree,
            cfg,
            acc,
            rng,
            steps: 0,
        })
    }

    /// Advances the layout by one time step.
    pub fn step(&mut self) {
        phases::repulsion_phase(&self.tree, &self.cfg, &mut self.acc);
        phases::spring_phase(&self.tree, &self.cfg, &mut self.acc);
        phases::integration_phase(&mut self.tree, &self.acc, &self.cfg);
        phases::constraint_phase(&mut self.tree, &self.cfg, &mut self.rng);

        self.steps += 1;
        trace!(
            "step {}: kinetic energy {:.6}",
            self.steps,
            self.kinetic_energy()
        );
    }

    /// Runs `n` steps back to back.
    pub fn run(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Runs the configured number of warm-up steps.
    pub fn warm_up(&mut self) {
        self.run(self.cfg.warmup_steps);
        debug!(
            "warm-up finished after {} steps, kinetic energy {:.6}",
            self.cfg.warmup_steps,
            self.kinetic_energy()
        );
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Sum of `½|v|²` over all nodes, for diagnostics.
    pub fn kinetic_energy(&self) -> f64 {
        self.tree
            .nodes
            .iter()
            .map(|n| 0.5 * n.vel.length_squared())
            .sum()
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }
}
