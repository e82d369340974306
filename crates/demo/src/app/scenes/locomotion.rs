use std::path::{Path, PathBuf};

use glam::Vec3;
use stage::app::{
    Aabb, Actor, Camera, ClipKind, CollisionWorld, Deferred, DeferredState, Frame, Ground,
    InputSnapshot, LocomotionBridge, MenuMode, MotionMode, Rgba, RigidBody, Scene, SceneCommand,
    TickOutcome, TickReport, Viewport, DEFAULT_GRAVITY,
};
use stage::content::{load_actor_model, Heightmap, PickupDef, SceneDef, TerrainOptions};
use tracing::{info, warn};

use super::draw::{
    draw_button, draw_centered_text, fill_world_box, fill_world_circle, screen_to_ground, shade,
    world_line, ScreenRect, HIGHLIGHT_COLOR, PANEL_COLOR, TEXT_COLOR, TEXT_DIM_COLOR,
};
use super::menu_shortcut;

const FLAT_GROUND_COLOR: Rgba = [72, 100, 64, 255];
const TERRAIN_LOW_COLOR: Rgba = [60, 84, 52, 255];
const TERRAIN_CELL_PX: i32 = 8;
const ACTOR_IDLE_COLOR: Rgba = [230, 230, 240, 255];
const ACTOR_WALK_COLOR: Rgba = [120, 200, 250, 255];
const ACTOR_RUN_COLOR: Rgba = [250, 170, 80, 255];
const RESTART_KEY: &str = "r";
const RESTART_BUTTON_WIDTH: i32 = 180;
const RESTART_BUTTON_HEIGHT: i32 = 36;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pickup {
    def: PickupDef,
    collected: bool,
}

/// A scene built from a `SceneDef`: ground or terrain, static boxes, loose
/// props, pickups and one keyboard-driven actor.
pub(crate) struct LocomotionScene {
    def: SceneDef,
    index: usize,
    assets_dir: PathBuf,
    menu_mode: MenuMode,
    world: CollisionWorld,
    bridge: LocomotionBridge,
    actor: Option<Deferred<Actor>>,
    actor_announced: bool,
    props: Vec<RigidBody>,
    pickups: Vec<Pickup>,
    collected: usize,
    camera: Camera,
    viewport: Viewport,
    last_report: Option<TickReport>,
    game_over: bool,
}

impl LocomotionScene {
    /// Builds the static collision world. A heightmap that cannot be loaded
    /// falls back to flat ground of the same extent.
    pub(crate) fn build(def: SceneDef, assets_dir: &Path, index: usize, menu_mode: MenuMode) -> Self {
        let ground = build_ground(&def, assets_dir);
        let mut world = CollisionWorld::new().with_ground(ground);
        for solid in &def.boxes {
            world.add_box(Aabb::from_center_half_extents(solid.position, solid.size * 0.5));
        }
        let bridge = LocomotionBridge::new(def.locomotion.clone());
        info!(
            scene = %def.name,
            index,
            boxes = def.boxes.len(),
            props = def.props.len(),
            pickups = def.pickups.len(),
            "scene_built"
        );
        Self {
            def,
            index,
            assets_dir: assets_dir.to_path_buf(),
            menu_mode,
            world,
            bridge,
            actor: None,
            actor_announced: false,
            props: Vec::new(),
            pickups: Vec::new(),
            collected: 0,
            camera: Camera::default(),
            viewport: Viewport {
                width: 0,
                height: 0,
            },
            last_report: None,
            game_over: false,
        }
    }

    fn gravity(&self) -> Vec3 {
        match self.def.locomotion.mode {
            MotionMode::Direct => DEFAULT_GRAVITY,
            MotionMode::Collide { gravity } | MotionMode::Physics { gravity } => gravity,
        }
    }

    fn restart_button(&self) -> ScreenRect {
        ScreenRect::centered(self.viewport, RESTART_BUTTON_WIDTH, RESTART_BUTTON_HEIGHT, 40)
    }

    fn restart_requested(&self, input: &InputSnapshot) -> bool {
        if input.keys().was_pressed(RESTART_KEY) {
            return true;
        }
        input.pointer_released()
            && input
                .cursor_position_px()
                .is_some_and(|(x, y)| self.restart_button().contains(x, y))
    }

    fn step_props(&mut self, dt: f32) {
        let gravity = self.gravity();
        self.world
            .set_movable_boxes(self.props.iter().map(RigidBody::aabb));
        for prop in &mut self.props {
            prop.step(dt, gravity, &self.world);
        }
    }

    fn collect_pickups(&mut self, actor_box: Aabb) {
        let total = self.pickups.len();
        for (pickup_index, pickup) in self.pickups.iter_mut().enumerate() {
            if pickup.collected {
                continue;
            }
            let closest = pickup.def.position.clamp(actor_box.min, actor_box.max);
            if closest.distance(pickup.def.position) <= pickup.def.radius {
                pickup.collected = true;
                self.collected += 1;
                info!(
                    scene = %self.def.name,
                    pickup = pickup_index,
                    collected = self.collected,
                    total,
                    "pickup_collected"
                );
            }
        }
    }

    fn draw_ground(&self, frame: &mut Frame<'_>) {
        match self.world.ground() {
            Some(Ground::Flat { height: _, size }) => {
                let half = Vec3::new(size * 0.5, 0.0, size * 0.5);
                fill_world_box(frame, &self.camera, Vec3::ZERO, half, FLAT_GROUND_COLOR);
            }
            Some(Ground::Terrain(heightmap)) => self.draw_terrain(frame, heightmap),
            None => {}
        }
    }

    fn draw_terrain(&self, frame: &mut Frame<'_>, heightmap: &Heightmap) {
        let viewport = frame.viewport();
        let options = heightmap.options();
        let span = (options.max_height - options.min_height).max(f32::EPSILON);
        let mut y = 0;
        while y < viewport.height as i32 {
            let mut x = 0;
            while x < viewport.width as i32 {
                let center_x = (x + TERRAIN_CELL_PX / 2) as f32;
                let center_y = (y + TERRAIN_CELL_PX / 2) as f32;
                let (world_x, world_z) = screen_to_ground(center_x, center_y, &self.camera, viewport);
                if let Some(height) = heightmap.height_at(world_x, world_z) {
                    let level = ((height - options.base_y - options.min_height) / span).clamp(0.0, 1.0);
                    let color = shade(TERRAIN_LOW_COLOR, 1.0 + level * 1.5);
                    frame.fill_rect(x, y, TERRAIN_CELL_PX, TERRAIN_CELL_PX, color);
                }
                x += TERRAIN_CELL_PX;
            }
            y += TERRAIN_CELL_PX;
        }
    }

    fn draw_actor(&self, frame: &mut Frame<'_>, actor: &Actor) {
        let color = match actor.motion.clip {
            ClipKind::Idle => ACTOR_IDLE_COLOR,
            ClipKind::Walk => ACTOR_WALK_COLOR,
            ClipKind::Run => ACTOR_RUN_COLOR,
        };
        let center = actor.body.center();
        fill_world_box(frame, &self.camera, center, actor.body.half_extents(), color);
        let facing = actor.motion.facing;
        let forward = Vec3::new(facing.sin(), 0.0, facing.cos());
        let reach = actor.body.half_extents().x.max(actor.body.half_extents().z) * 1.8;
        world_line(frame, &self.camera, center, center + forward * reach, shade(color, 0.4));
    }

    fn draw_game_over(&self, frame: &mut Frame<'_>) {
        let viewport = frame.viewport();
        let panel = ScreenRect::centered(viewport, 320, 160, 0);
        frame.fill_rect(panel.x, panel.y, panel.width, panel.height, PANEL_COLOR);
        draw_centered_text(frame, panel.y + 24, "GAME OVER", 4, TEXT_COLOR);
        draw_button(frame, self.restart_button(), "RESTART (R)", HIGHLIGHT_COLOR);
    }
}

fn mode_label(mode: MotionMode) -> &'static str {
    match mode {
        MotionMode::Direct => "DIRECT",
        MotionMode::Collide { .. } => "COLLIDE",
        MotionMode::Physics { .. } => "PHYSICS",
    }
}

fn build_ground(def: &SceneDef, assets_dir: &Path) -> Ground {
    let ground = &def.ground;
    let Some(relative) = ground.heightmap.as_deref() else {
        return Ground::Flat {
            height: ground.height,
            size: ground.size,
        };
    };
    let options = TerrainOptions {
        width: ground.terrain_size,
        depth: ground.terrain_size,
        max_height: ground.max_height,
        base_y: ground.height + TerrainOptions::default().base_y,
        ..TerrainOptions::default()
    };
    let path = assets_dir.join(relative);
    match Heightmap::load(&path, options) {
        Ok(heightmap) => Ground::Terrain(heightmap),
        Err(error) => {
            warn!(
                scene = %def.name,
                path = %path.display(),
                error = %error,
                "terrain_fallback_to_flat"
            );
            Ground::Flat {
                height: ground.height,
                size: ground.terrain_size,
            }
        }
    }
}

impl Scene for LocomotionScene {
    fn load(&mut self) {
        self.game_over = false;
        self.last_report = None;
        self.actor_announced = false;
        self.collected = 0;
        self.props = self
            .def
            .props
            .iter()
            .map(|prop| {
                RigidBody::new(prop.position, prop.size * 0.5, prop.mass).with_friction(prop.friction)
            })
            .collect();
        self.pickups = self
            .def
            .pickups
            .iter()
            .map(|def| Pickup {
                def: *def,
                collected: false,
            })
            .collect();

        let spawn = self.def.actor.as_ref().map_or(Vec3::ZERO, |actor| actor.spawn);
        self.camera = Camera::looking_at(spawn);
        self.actor = self.def.actor.as_ref().map(|actor_def| {
            let path = self.assets_dir.join(&actor_def.model);
            let config = self.def.locomotion.clone();
            let spawn = actor_def.spawn;
            Deferred::spawn(format!("actor:{}", self.def.name), move || {
                load_actor_model(&path).map(|model| Actor::from_model(&model, spawn, &config))
            })
        });
        info!(scene = %self.def.name, index = self.index, "scene_loaded");
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        let (width, height) = input.window_size();
        self.viewport = Viewport { width, height };

        if self.game_over {
            if self.restart_requested(input) {
                info!(scene = %self.def.name, index = self.index, "restart_requested");
                return SceneCommand::HardResetTo(self.index);
            }
            return menu_shortcut(self.menu_mode, input);
        }

        self.camera.apply_zoom_steps(input.zoom_delta_steps());
        self.step_props(fixed_dt_seconds);

        let Some(actor) = self.actor.as_mut() else {
            return menu_shortcut(self.menu_mode, input);
        };
        match self
            .bridge
            .tick(input.keys(), actor, &self.world, fixed_dt_seconds)
        {
            TickOutcome::NotReady => {}
            TickOutcome::Ticked(report) => {
                if !self.actor_announced {
                    info!(scene = %self.def.name, position = ?report.position, "actor_ready");
                    self.actor_announced = true;
                }
                self.camera.target = report.position;
                self.last_report = Some(report);
                let actor_box = actor.get().map(|actor| {
                    Aabb::from_center_half_extents(actor.body.center(), actor.body.half_extents())
                });
                if let Some(actor_box) = actor_box {
                    self.collect_pickups(actor_box);
                }
                let kill_height = self
                    .def
                    .actor
                    .as_ref()
                    .map_or(f32::NEG_INFINITY, |actor| actor.kill_height);
                if report.position.y < kill_height {
                    self.game_over = true;
                    info!(
                        scene = %self.def.name,
                        height = report.position.y,
                        kill_height,
                        "actor_fell"
                    );
                }
            }
        }
        menu_shortcut(self.menu_mode, input)
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        self.viewport = frame.viewport();
        self.draw_ground(frame);
        for solid in &self.def.boxes {
            fill_world_box(frame, &self.camera, solid.position, solid.size * 0.5, solid.color);
        }
        for (prop, def) in self.props.iter().zip(&self.def.props) {
            fill_world_box(frame, &self.camera, prop.position, prop.half_extents, def.color);
        }
        for pickup in self.pickups.iter().filter(|pickup| !pickup.collected) {
            fill_world_circle(
                frame,
                &self.camera,
                pickup.def.position,
                pickup.def.radius,
                pickup.def.color,
            );
        }

        match self.actor.as_ref() {
            Some(deferred) => match deferred.get() {
                Some(actor) => self.draw_actor(frame, actor),
                None if deferred.state() == DeferredState::Failed => {
                    draw_centered_text(frame, 60, "ACTOR FAILED TO LOAD", 2, TEXT_COLOR);
                }
                None => draw_centered_text(frame, 60, "LOADING ACTOR", 2, TEXT_DIM_COLOR),
            },
            None => {}
        }

        let hint_y = frame.height() as i32 - 60;
        frame.draw_text(8, hint_y, "WASD/ARROWS MOVE  SHIFT RUN  SPACE JUMP", 2, TEXT_DIM_COLOR);
        if !self.pickups.is_empty() {
            let text = format!("PICKUPS {}/{}", self.collected, self.pickups.len());
            frame.draw_text(8, hint_y - 20, &text, 2, TEXT_COLOR);
        }
        if self.game_over {
            self.draw_game_over(frame);
        }
    }

    fn unload(&mut self) {
        self.actor = None;
        self.props.clear();
        self.pickups.clear();
        self.last_report = None;
        self.world.set_movable_boxes(Vec::new());
        info!(scene = %self.def.name, index = self.index, "scene_unloaded");
    }

    fn clear_color(&self) -> Rgba {
        self.def.clear_color
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!("Stage | {}", self.def.name))
    }

    fn debug_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("MODE {}", mode_label(self.def.locomotion.mode))];
        match &self.last_report {
            Some(report) => {
                let p = report.position;
                lines.push(format!("POS {:.1} {:.1} {:.1}", p.x, p.y, p.z));
                lines.push(format!(
                    "MOVE {:.1} {:.1} {:.1}",
                    report.intent.vector.x, report.intent.vector.y, report.intent.vector.z
                ));
                if let Some(actor) = self.actor.as_ref().and_then(Deferred::get) {
                    lines.push(format!(
                        "CLIP {:?} GROUNDED {}",
                        actor.motion.clip, actor.motion.is_grounded
                    ));
                }
            }
            None => lines.push("ACTOR PENDING".to_string()),
        }
        lines
    }
}
