//! Interactive viewer for the sphere tree layout built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the current [`Scene`] and
//! implements [`eframe::App`]: every frame it advances the force layout by
//! one step (the wedge layout is static), rotates the tree slowly and draws
//! one line segment per edge.

use eframe::App;
use glam::{DMat3, DVec3};
use log::{info, warn};
use phylo_core::{
    Error, LayoutConfig, LayoutSimulator,
    config::MAX_SUPPORTED_DEPTH,
    error::Result,
    topology::{TopologyNode, WedgeLayout, wedge_layout},
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Rotation about the y-axis per frame, in radians.
const YAW_PER_FRAME: f64 = 0.003;
/// Rotation about the x-axis per frame, in radians.
const PITCH_PER_FRAME: f64 = 0.001;
/// Distance of the camera from the origin along +z.
const CAMERA_DISTANCE: f64 = 900.0;
/// Points closer to the camera plane than this are not drawn.
const NEAR_PLANE: f64 = 1.0;

const EDGE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 215, 0);

/// How node positions are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutMode {
    /// Force-directed simulation, stepped every frame.
    #[default]
    Force,
    /// Static wedge placement of the topology.
    Wedge,
}

/// What is currently drawn.
pub enum Scene {
    Force(LayoutSimulator),
    Wedge(WedgeLayout),
}

impl Scene {
    fn segments(&self) -> Box<dyn Iterator<Item = (DVec3, DVec3)> + '_> {
        match self {
            Scene::Force(sim) => Box::new(sim.tree().segments()),
            Scene::Wedge(layout) => Box::new(layout.segments()),
        }
    }
}

/// Main application state for the viewer.
///
/// ### Fields
/// - `scene` - The running simulation or the static wedge layout.
/// - `cfg` - Parameters edited in the side panel; applied on rebuild.
/// - `topology` - Optional tree shape used instead of a full binary tree.
/// - `mode` - Which layout `scene` is rebuilt with.
/// - `seed` - Seed of the current simulation.
///
/// - `running` - Whether the layout advances every frame.
/// - `frame` - Frames stepped since the last rebuild, drives the rotation.
/// - `zoom` - Extra scale applied after perspective projection.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `last_error` - Why the last rebuild was rejected, if it was.
pub struct Viewer {
    scene: Scene,
    cfg: LayoutConfig,
    topology: Option<TopologyNode>,
    mode: LayoutMode,
    seed: u64,

    running: bool,
    frame: u64,
    zoom: f32,
    pan: egui::Vec2,

    last_error: Option<String>,
}

impl Viewer {
    /// Builds and warms up the layout, ready to be shown.
    pub fn new(
        cfg: LayoutConfig,
        topology: Option<TopologyNode>,
        mode: LayoutMode,
        seed: u64,
    ) -> Result<Self> {
        let scene = build_scene(cfg, topology.as_ref(), mode, seed)?;
        Ok(Self {
            scene,
            cfg,
            topology,
            mode,
            seed,
            running: true,
            frame: 0,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            last_error: None,
        })
    }

    /// Replaces the scene with a fresh one built from `cfg`.
    ///
    /// An invalid configuration keeps the current scene and records the
    /// error for display.
    fn rebuild(&mut self) {
        match build_scene(self.cfg, self.topology.as_ref(), self.mode, self.seed) {
            Ok(scene) => {
                self.scene = scene;
                self.frame = 0;
                self.last_error = None;
            }
            Err(e) => {
                warn!("rebuild rejected: {e}");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Advances the rotation by one frame and the simulation, if any, by
    /// one step.
    fn step_once(&mut self) {
        if let Scene::Force(sim) = &mut self.scene {
            sim.step();
        }
        self.frame += 1;
    }

    /// Rigid rotation applied to the whole tree at the current frame.
    fn rotation(&self) -> DMat3 {
        let f = self.frame as f64;
        DMat3::from_rotation_y(f * YAW_PER_FRAME) * DMat3::from_rotation_x(f * PITCH_PER_FRAME)
    }

    /// Projects a rotated world-space point onto the screen.
    ///
    /// The camera sits at `(0, 0, CAMERA_DISTANCE)` looking at the origin
    /// with screen y pointing down. Returns `None` for points behind the
    /// near plane.
    fn project(&self, rot: &DMat3, p: DVec3, rect: egui::Rect) -> Option<egui::Pos2> {
        let q = *rot * p;
        let depth = CAMERA_DISTANCE - q.z;
        if depth < NEAR_PLANE {
            return None;
        }
        let scale = self.zoom as f64 * CAMERA_DISTANCE / depth;
        let center = rect.center();
        Some(egui::pos2(
            center.x + (q.x * scale) as f32 + self.pan.x,
            center.y + (q.y * scale) as f32 + self.pan.y,
        ))
    }

    /// Helper to draw a labeled [`egui::DragValue`].
    fn labeled_drag<N: egui::emath::Numeric>(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut N,
        range: std::ops::RangeInclusive<N>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, rebuild, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Rebuild").clicked() {
                    self.rebuild();
                }

                if ui.button("Reseed").clicked() {
                    self.seed = rand::random();
                    info!("reseeding with {}", self.seed);
                    self.rebuild();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=5.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match &self.scene {
                    Scene::Force(sim) => {
                        ui.label(format!("seed = {}", self.seed));
                        ui.label(format!("kinetic = {:.4}", sim.kinetic_energy()));
                        ui.label(format!("steps = {}", sim.steps()));
                        ui.separator();
                        let tree = sim.tree();
                        ui.label(format!("leaves = {}", tree.leaf_count()));
                        ui.label(format!("nodes = {}", tree.len()));
                    }
                    Scene::Wedge(layout) => {
                        ui.label("static wedge layout");
                        ui.separator();
                        ui.label(format!("edges = {}", layout.edges.len()));
                        ui.label(format!("nodes = {}", layout.positions.len()));
                    }
                }
            });
        });
    }

    /// Builds the right-hand panel for layout parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Layout");

                ui.separator();
                ui.label("Tree");
                if self.topology.is_some() {
                    ui.label("max_depth: from topology");
                } else {
                    Self::labeled_drag(
                        ui,
                        "max_depth:",
                        &mut self.cfg.max_depth,
                        0..=MAX_SUPPORTED_DEPTH,
                        0.1,
                    );
                }
                Self::labeled_drag(
                    ui,
                    "sphere_radius:",
                    &mut self.cfg.sphere_radius,
                    1.0..=400.0,
                    1.0,
                );
                Self::labeled_drag(ui, "jitter:", &mut self.cfg.jitter, 0.0..=50.0, 0.5);

                ui.separator();
                ui.label("Forces");
                Self::labeled_drag(
                    ui,
                    "spring_rest_len:",
                    &mut self.cfg.spring_rest_len,
                    0.0..=200.0,
                    0.5,
                );
                Self::labeled_drag(
                    ui,
                    "spring_strength:",
                    &mut self.cfg.spring_strength,
                    0.0..=1.0,
                    0.001,
                );
                Self::labeled_drag(
                    ui,
                    "repulsion:",
                    &mut self.cfg.repulsion_strength,
                    0.0..=50_000.0,
                    10.0,
                );

                ui.separator();
                ui.label("Integration");
                Self::labeled_drag(ui, "damping:", &mut self.cfg.damping, 0.01..=0.99, 0.005);
                Self::labeled_drag(ui, "time_step:", &mut self.cfg.time_step, 0.01..=1.0, 0.005);
                Self::labeled_drag(
                    ui,
                    "warmup_steps:",
                    &mut self.cfg.warmup_steps,
                    0..=2000,
                    1.0,
                );

                ui.separator();
                if ui.button("Apply (rebuild)").clicked() {
                    self.rebuild();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = LayoutConfig::default();
                }
                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
    }

    /// Builds the central panel where the tree is drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
                let rect = response.rect;
                let painter = ui.painter_at(rect);

                if response.dragged() {
                    self.pan += response.drag_delta();
                }

                if self.running {
                    self.step_once();
                    ctx.request_repaint();
                }

                let rot = self.rotation();
                let stroke = egui::Stroke::new(1.5, EDGE_COLOR);
                for (a, b) in self.scene.segments() {
                    if let (Some(a), Some(b)) =
                        (self.project(&rot, a, rect), self.project(&rot, b, rect))
                    {
                        painter.line_segment([a, b], stroke);
                    }
                }
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

/// Builds the scene for `mode`; the force layout is warmed up first.
fn build_scene(
    cfg: LayoutConfig,
    topology: Option<&TopologyNode>,
    mode: LayoutMode,
    seed: u64,
) -> Result<Scene> {
    match (mode, topology) {
        (LayoutMode::Force, _) => Ok(Scene::Force(build_simulator(cfg, topology, seed)?)),
        (LayoutMode::Wedge, Some(t)) => {
            cfg.validate()?;
            let layout = wedge_layout(t, cfg.sphere_radius)?;
            info!("wedge layout ready: {} nodes", layout.positions.len());
            Ok(Scene::Wedge(layout))
        }
        (LayoutMode::Wedge, None) => {
            Err(Error::Topology("the wedge layout needs a topology".into()))
        }
    }
}

/// Builds a simulator for `cfg` and runs its warm-up.
fn build_simulator(
    cfg: LayoutConfig,
    topology: Option<&TopologyNode>,
    seed: u64,
) -> Result<LayoutSimulator> {
    let rng = StdRng::seed_from_u64(seed);
    let mut sim = match topology {
        Some(t) => LayoutSimulator::from_topology(cfg, t, rng)?,
        None => LayoutSimulator::with_rng(cfg, rng)?,
    };
    sim.warm_up();
    info!(
        "layout ready: {} nodes after {} warm-up steps",
        sim.tree().len(),
        sim.steps()
    );
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn sim(viewer: &Viewer) -> &LayoutSimulator {
        match &viewer.scene {
            Scene::Force(sim) => sim,
            Scene::Wedge(_) => panic!("expected a force layout"),
        }
    }

    fn three_tips() -> TopologyNode {
        TopologyNode::with_children(vec![
            TopologyNode::leaf("a"),
            TopologyNode::leaf("b"),
            TopologyNode::leaf("c"),
        ])
    }

    fn quick_cfg(depth: u32) -> LayoutConfig {
        LayoutConfig {
            max_depth: depth,
            warmup_steps: 10,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn new_runs_warm_up() {
        let viewer = Viewer::new(quick_cfg(3), None, LayoutMode::Force, 1).unwrap();
        assert_eq!(sim(&viewer).steps(), 10);
        assert_eq!(sim(&viewer).tree().len(), 15);
        assert_eq!(viewer.frame, 0);
    }

    #[test]
    fn origin_projects_to_center() {
        let viewer = Viewer::new(quick_cfg(1), None, LayoutMode::Force, 1).unwrap();
        let rect = test_rect();
        let p = viewer
            .project(&viewer.rotation(), DVec3::ZERO, rect)
            .unwrap();
        assert_eq!(p, rect.center());
    }

    #[test]
    fn nearer_points_project_larger() {
        let viewer = Viewer::new(quick_cfg(1), None, LayoutMode::Force, 1).unwrap();
        let rect = test_rect();
        let rot = DMat3::IDENTITY;
        let far = viewer.project(&rot, DVec3::new(100.0, 0.0, -300.0), rect).unwrap();
        let near = viewer.project(&rot, DVec3::new(100.0, 0.0, 300.0), rect).unwrap();
        assert!(near.x - rect.center().x > far.x - rect.center().x);
        let behind = DVec3::new(0.0, 0.0, 950.0);
        assert!(viewer.project(&rot, behind, rect).is_none());
    }

    #[test]
    fn rotation_starts_at_identity_and_advances() {
        let mut viewer = Viewer::new(quick_cfg(2), None, LayoutMode::Force, 4).unwrap();
        assert!(viewer.rotation().abs_diff_eq(DMat3::IDENTITY, 1e-12));

        viewer.step_once();
        let x = viewer.rotation() * DVec3::X;
        // The yaw turns +x away from itself about the y-axis.
        assert!((x.z + YAW_PER_FRAME.sin()).abs() < 1e-12);
        assert_eq!(viewer.frame, 1);
        assert_eq!(sim(&viewer).steps(), 11);
    }

    #[test]
    fn rebuild_applies_valid_config() {
        let mut viewer = Viewer::new(quick_cfg(2), None, LayoutMode::Force, 9).unwrap();
        viewer.step_once();
        viewer.cfg.max_depth = 3;
        viewer.rebuild();
        assert_eq!(sim(&viewer).tree().len(), 15);
        assert_eq!(viewer.frame, 0);
        assert!(viewer.last_error.is_none());
    }

    #[test]
    fn rebuild_rejects_invalid_config_and_keeps_simulation() {
        let mut viewer = Viewer::new(quick_cfg(2), None, LayoutMode::Force, 9).unwrap();
        viewer.cfg.damping = 1.5;
        viewer.rebuild();
        assert_eq!(sim(&viewer).tree().len(), 7);
        assert!(viewer.last_error.as_deref().unwrap().contains("damping"));
    }

    #[test]
    fn topology_replaces_binary_tree() {
        let viewer = Viewer::new(quick_cfg(5), Some(three_tips()), LayoutMode::Force, 2).unwrap();
        assert_eq!(sim(&viewer).tree().len(), 4);
        assert_eq!(sim(&viewer).tree().nodes[0].edges.len(), 3);
    }

    #[test]
    fn wedge_mode_draws_the_static_layout() {
        let cfg = quick_cfg(5);
        let mut viewer = Viewer::new(cfg, Some(three_tips()), LayoutMode::Wedge, 2).unwrap();
        let Scene::Wedge(layout) = &viewer.scene else {
            panic!("expected a wedge layout");
        };
        assert_eq!(layout.positions.len(), 4);
        let south = DVec3::new(0.0, -cfg.sphere_radius, 0.0);
        assert!(layout.positions[1..].iter().all(|p| (*p - south).length() < 1e-9));
        let before: Vec<_> = viewer.scene.segments().collect();
        assert_eq!(before.len(), 3);
        // The root sits at the north pole; depth 1 of 1 is the south pole.
        let pole = DVec3::new(0.0, cfg.sphere_radius, 0.0);
        assert!((before[0].0 - pole).length() < 1e-9);

        // Stepping only turns the view; the layout itself does not move.
        viewer.step_once();
        assert_eq!(viewer.frame, 1);
        assert!(viewer.scene.segments().eq(before.iter().copied()));

        let rect = test_rect();
        let rot = viewer.rotation();
        for (a, b) in viewer.scene.segments() {
            assert!(viewer.project(&rot, a, rect).is_some());
            assert!(viewer.project(&rot, b, rect).is_some());
        }
    }

    #[test]
    fn wedge_mode_rebuild_follows_the_radius() {
        let mut viewer =
            Viewer::new(quick_cfg(5), Some(three_tips()), LayoutMode::Wedge, 2).unwrap();
        viewer.cfg.sphere_radius = 50.0;
        viewer.rebuild();
        assert!(viewer.last_error.is_none());
        let on_sphere = |p: DVec3| (p.length() - 50.0).abs() < 1e-9;
        assert!(viewer.scene.segments().all(|(a, b)| on_sphere(a) && on_sphere(b)));
    }

    #[test]
    fn wedge_mode_requires_a_topology() {
        let err = Viewer::new(quick_cfg(2), None, LayoutMode::Wedge, 1).err().unwrap();
        assert!(matches!(err, Error::Topology(_)));
    }
}
