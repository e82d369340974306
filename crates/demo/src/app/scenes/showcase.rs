use glam::Vec3;
use stage::app::{
    world_extent_to_px, world_to_screen, Camera, Frame, InputSnapshot, MenuMode, Rgba, Scene,
    SceneCommand,
};
use tracing::info;

use super::draw::{fill_world_box, fill_world_circle, shade, TEXT_DIM_COLOR};
use super::menu_shortcut;

const GROUND_SIZE: f32 = 6.0;
const GROUND_COLOR: Rgba = [70, 96, 70, 255];
const SPHERE_COLOR: Rgba = [200, 90, 80, 255];
const BOX_COLOR: Rgba = [90, 130, 210, 255];
const CYLINDER_COLOR: Rgba = [220, 190, 90, 255];
const CONE_COLOR: Rgba = [150, 100, 200, 255];
const SHOWCASE_RADIUS: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Primitive {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Cylinder { radius: f32 },
    Cone { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Placed {
    primitive: Primitive,
    position: Vec3,
    color: Rgba,
}

/// A handful of static primitives on a small ground plane.
pub(crate) struct ShowcaseScene {
    menu_mode: MenuMode,
    camera: Camera,
    shapes: Vec<Placed>,
    elapsed: f32,
}

impl ShowcaseScene {
    pub(crate) fn new(menu_mode: MenuMode) -> Self {
        Self {
            menu_mode,
            camera: Camera::default(),
            shapes: Vec::new(),
            elapsed: 0.0,
        }
    }

    fn draw_shape(&self, frame: &mut Frame<'_>, shape: &Placed) {
        match shape.primitive {
            Primitive::Sphere { radius } => {
                let pulse = 1.0 + 0.08 * (self.elapsed * 2.0).sin();
                fill_world_circle(frame, &self.camera, shape.position, radius * pulse, shape.color);
            }
            Primitive::Box { half_extents } => {
                fill_world_box(frame, &self.camera, shape.position, half_extents, shape.color);
            }
            Primitive::Cylinder { radius } => {
                fill_world_circle(frame, &self.camera, shape.position, radius, shape.color);
                let (x, y) = world_to_screen(shape.position, &self.camera, frame.viewport());
                let inner = world_extent_to_px(radius * 0.6, &self.camera);
                frame.fill_circle(x, y, inner, shade(shape.color, 0.8));
            }
            Primitive::Cone { radius } => {
                fill_world_circle(frame, &self.camera, shape.position, radius, shape.color);
                let (x, y) = world_to_screen(shape.position, &self.camera, frame.viewport());
                frame.fill_circle(x, y, 2, shade(shape.color, 0.5));
            }
        }
    }
}

impl Scene for ShowcaseScene {
    fn load(&mut self) {
        self.camera = Camera::default();
        self.camera.set_radius_clamped(SHOWCASE_RADIUS);
        self.elapsed = 0.0;
        self.shapes = vec![
            Placed {
                primitive: Primitive::Sphere { radius: 1.0 },
                position: Vec3::new(-1.5, 1.0, 1.5),
                color: SPHERE_COLOR,
            },
            Placed {
                primitive: Primitive::Box {
                    half_extents: Vec3::splat(0.75),
                },
                position: Vec3::new(1.5, 0.75, 1.5),
                color: BOX_COLOR,
            },
            Placed {
                primitive: Primitive::Cylinder { radius: 0.8 },
                position: Vec3::new(-1.5, 1.0, -1.5),
                color: CYLINDER_COLOR,
            },
            Placed {
                primitive: Primitive::Cone { radius: 0.9 },
                position: Vec3::new(1.5, 1.0, -1.5),
                color: CONE_COLOR,
            },
        ];
        info!(scene = "showcase", shapes = self.shapes.len(), "scene_loaded");
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.elapsed += fixed_dt_seconds;
        self.camera.apply_zoom_steps(input.zoom_delta_steps());
        menu_shortcut(self.menu_mode, input)
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        fill_world_box(
            frame,
            &self.camera,
            Vec3::ZERO,
            Vec3::new(GROUND_SIZE * 0.5, 0.0, GROUND_SIZE * 0.5),
            GROUND_COLOR,
        );
        for shape in &self.shapes {
            self.draw_shape(frame, shape);
        }
        let y = frame.height() as i32 - 60;
        frame.draw_text(8, y, "SPHERE BOX CYLINDER CONE", 2, TEXT_DIM_COLOR);
    }

    fn unload(&mut self) {
        self.shapes.clear();
        info!(scene = "showcase", "scene_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        Some("Stage | showcase".to_string())
    }

    fn debug_lines(&self) -> Vec<String> {
        vec![
            format!("SHAPES {}", self.shapes.len()),
            format!("ZOOM {:.1}", self.camera.effective_radius()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_places_four_primitives_and_unload_clears_them() {
        let mut scene = ShowcaseScene::new(MenuMode::Overlay);
        scene.load();
        assert_eq!(scene.shapes.len(), 4);
        scene.unload();
        assert!(scene.shapes.is_empty());
    }

    #[test]
    fn wheel_zoom_stays_within_camera_limits() {
        let mut scene = ShowcaseScene::new(MenuMode::Overlay);
        scene.load();
        let zoom_in = InputSnapshot::empty().with_zoom_delta_steps(50);
        scene.update(1.0 / 60.0, &zoom_in);
        assert_eq!(
            scene.camera.effective_radius(),
            scene.camera.lower_radius_limit
        );
    }

    #[test]
    fn render_draws_ground_at_viewport_center() {
        let mut scene = ShowcaseScene::new(MenuMode::Overlay);
        scene.load();
        let mut pixels = vec![0u8; 320 * 240 * 4];
        let mut frame = Frame::new(&mut pixels, 320, 240);
        scene.render(&mut frame);
        assert_eq!(frame.pixel(160, 120), Some(GROUND_COLOR));
    }
}
