use glam::Vec3;
use stage::app::{
    pixels_per_unit, text_width, world_extent_to_px, world_to_screen, Camera, Frame, Rgba,
    Viewport,
};

pub(crate) const TEXT_COLOR: Rgba = [240, 244, 250, 255];
pub(crate) const TEXT_DIM_COLOR: Rgba = [150, 160, 176, 255];
pub(crate) const PANEL_COLOR: Rgba = [16, 18, 24, 220];
pub(crate) const BORDER_COLOR: Rgba = [96, 110, 132, 255];
pub(crate) const HIGHLIGHT_COLOR: Rgba = [70, 120, 200, 255];

/// Screen-space rectangle used for clickable buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScreenRect {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl ScreenRect {
    pub(crate) fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x as f32
            && px < (self.x + self.width) as f32
            && py >= self.y as f32
            && py < (self.y + self.height) as f32
    }

    pub(crate) fn centered(viewport: Viewport, width: i32, height: i32, y_offset: i32) -> Self {
        Self {
            x: (viewport.width as i32 - width) / 2,
            y: (viewport.height as i32 - height) / 2 + y_offset,
            width,
            height,
        }
    }
}

pub(crate) fn draw_button(frame: &mut Frame<'_>, rect: ScreenRect, label: &str, fill: Rgba) {
    frame.fill_rect(rect.x, rect.y, rect.width, rect.height, fill);
    frame.outline_rect(rect.x, rect.y, rect.width, rect.height, BORDER_COLOR);
    let scale = 2;
    let text_x = rect.x + (rect.width - text_width(label, scale)) / 2;
    let text_y = rect.y + (rect.height - 5 * scale) / 2;
    frame.draw_text(text_x, text_y, label, scale, TEXT_COLOR);
}

pub(crate) fn draw_centered_text(frame: &mut Frame<'_>, y: i32, text: &str, scale: i32, color: Rgba) {
    let x = (frame.width() as i32 - text_width(text, scale)) / 2;
    frame.draw_text(x, y, text, scale, color);
}

/// Axis-aligned footprint of a box on the ground plane.
pub(crate) fn fill_world_box(
    frame: &mut Frame<'_>,
    camera: &Camera,
    center: Vec3,
    half_extents: Vec3,
    color: Rgba,
) {
    let viewport = frame.viewport();
    let corner = Vec3::new(center.x - half_extents.x, 0.0, center.z + half_extents.z);
    let (x, y) = world_to_screen(corner, camera, viewport);
    let width = world_extent_to_px(half_extents.x * 2.0, camera);
    let height = world_extent_to_px(half_extents.z * 2.0, camera);
    frame.fill_rect(x, y, width, height, color);
    frame.outline_rect(x, y, width, height, shade(color, 0.6));
}

pub(crate) fn fill_world_circle(
    frame: &mut Frame<'_>,
    camera: &Camera,
    center: Vec3,
    radius: f32,
    color: Rgba,
) {
    let (x, y) = world_to_screen(center, camera, frame.viewport());
    frame.fill_circle(x, y, world_extent_to_px(radius, camera), color);
}

pub(crate) fn world_line(frame: &mut Frame<'_>, camera: &Camera, from: Vec3, to: Vec3, color: Rgba) {
    let viewport = frame.viewport();
    let (x0, y0) = world_to_screen(from, camera, viewport);
    let (x1, y1) = world_to_screen(to, camera, viewport);
    frame.line(x0, y0, x1, y1, color);
}

/// Inverse of the ground-plane projection; returns world X and Z.
pub(crate) fn screen_to_ground(px: f32, py: f32, camera: &Camera, viewport: Viewport) -> (f32, f32) {
    let scale = pixels_per_unit(camera);
    let x = (px - viewport.width as f32 * 0.5) / scale + camera.target.x;
    let z = (viewport.height as f32 * 0.5 - py) / scale + camera.target.z;
    (x, z)
}

pub(crate) fn shade(color: Rgba, factor: f32) -> Rgba {
    let channel = |value: u8| (value as f32 * factor).round().clamp(0.0, 255.0) as u8;
    [channel(color[0]), channel(color[1]), channel(color[2]), color[3]]
}
