//! Application entry point for the phylogenetic sphere viewer.
//!
//! This binary parses the command line, sets up logging and eframe/egui,
//! and delegates simulation and drawing to [`Viewer`].

mod logging;
mod viewer;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use log::info;
use phylo_core::{LayoutConfig, topology::TopologyNode};

use viewer::{LayoutMode, Viewer};

/// Force-directed bifurcating tree on a sphere.
#[derive(Debug, Parser)]
#[command(name = "phylo-view", version, about)]
struct Args {
    /// JSON file with layout parameters; missing keys take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON tree topology to lay out instead of a full binary tree.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Seed for the random placement of internal nodes.
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides `max_depth` of the layout parameters.
    #[arg(long)]
    depth: Option<u32>,

    /// Start from the wider background preset instead of the default.
    #[arg(long, conflicts_with = "config")]
    expansion: bool,

    /// Draw the topology with the static wedge layout instead of simulating.
    #[arg(long, requires = "topology")]
    wedge: bool,
}

impl Args {
    fn layout_config(&self) -> anyhow::Result<LayoutConfig> {
        let mut cfg = match &self.config {
            Some(path) => LayoutConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None if self.expansion => LayoutConfig::expansion(),
            None => LayoutConfig::default(),
        };
        if let Some(depth) = self.depth {
            cfg.max_depth = depth;
        }
        cfg.validate().context("invalid layout parameters")?;
        Ok(cfg)
    }

    fn mode(&self) -> LayoutMode {
        if self.wedge {
            LayoutMode::Wedge
        } else {
            LayoutMode::Force
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();
    let cfg = args.layout_config()?;
    let topology = args
        .topology
        .as_ref()
        .map(|path| {
            TopologyNode::load(path)
                .with_context(|| format!("failed to load topology {}", path.display()))
        })
        .transpose()?;
    let seed = args.seed.unwrap_or_else(rand::random::<u64>);

    info!("starting viewer: {cfg:?}, seed {seed}");
    let viewer =
        Viewer::new(cfg, topology, args.mode(), seed).context("failed to build the layout")?;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Phylo Sphere",
        options,
        Box::new(|_cc| Ok(Box::new(viewer))),
    )
    .map_err(|e| anyhow!("viewer exited with an error: {e}"))
}
