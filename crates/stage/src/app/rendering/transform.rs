use glam::Vec3;

use crate::app::Camera;

pub const PIXELS_PER_UNIT_AT_DEFAULT_RADIUS: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

pub fn pixels_per_unit(camera: &Camera) -> f32 {
    PIXELS_PER_UNIT_AT_DEFAULT_RADIUS * crate::app::CAMERA_RADIUS_DEFAULT
        / camera.effective_radius()
}

/// Projects onto the XZ ground plane: +X to the right, +Z up the screen.
pub fn world_to_screen(world: Vec3, camera: &Camera, viewport: Viewport) -> (i32, i32) {
    let scale = pixels_per_unit(camera);
    let x = (world.x - camera.target.x) * scale + viewport.width as f32 * 0.5;
    let y = viewport.height as f32 * 0.5 - (world.z - camera.target.z) * scale;
    (x.round() as i32, y.round() as i32)
}

pub fn world_extent_to_px(extent: f32, camera: &Camera) -> i32 {
    (extent * pixels_per_unit(camera)).round().max(1.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn target_maps_to_viewport_center() {
        let camera = Camera::looking_at(Vec3::new(3.0, 1.0, -2.0));
        assert_eq!(
            world_to_screen(Vec3::new(3.0, 5.0, -2.0), &camera, VIEWPORT),
            (400, 300)
        );
    }

    #[test]
    fn positive_z_moves_up_the_screen() {
        let camera = Camera::default();
        let (x, y) = world_to_screen(Vec3::new(1.0, 0.0, 1.0), &camera, VIEWPORT);
        assert_eq!(x, 400 + PIXELS_PER_UNIT_AT_DEFAULT_RADIUS as i32);
        assert_eq!(y, 300 - PIXELS_PER_UNIT_AT_DEFAULT_RADIUS as i32);
    }

    #[test]
    fn smaller_radius_magnifies() {
        let near = Camera {
            radius: 12.5,
            ..Camera::default()
        };
        assert_eq!(
            world_extent_to_px(1.0, &near),
            (PIXELS_PER_UNIT_AT_DEFAULT_RADIUS * 2.0) as i32
        );
    }
}
