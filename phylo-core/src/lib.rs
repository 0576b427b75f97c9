//! Force-directed 3-D layout of bifurcating trees on a sphere.
//!
//! Main components:
//! - [`sphere`] — Fibonacci-lattice sampling of the sphere surface.
//! - [`builder`] — construction of the initial node graph.
//! - [`tree`] — nodes, edges and read access for renderers.
//! - [`simulator`] — the layout engine stepping the tree.
//! - [`phases`] — the individual force and constraint phases of a step.
//! - [`force_buffer`] — per-node force accumulation.
//! - [`topology`] — externally supplied tree shapes and the wedge layout.
//! - [`config`] — layout parameters and their validation.
//! - [`error`] — error types.
//! - [`types`] — shared ids and node roles.

pub mod builder;
pub mod config;
pub mod error;
pub mod force_buffer;
pub mod phases;
pub mod simulator;
pub mod sphere;
pub mod topology;
pub mod tree;
pub mod types;

pub use config::LayoutConfig;
pub use error::{ConfigError, Error};
pub use simulator::LayoutSimulator;
