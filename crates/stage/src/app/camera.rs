use glam::Vec3;

pub const CAMERA_RADIUS_DEFAULT: f32 = 25.0;
pub const CAMERA_RADIUS_LOWER_LIMIT: f32 = 9.0;
pub const CAMERA_RADIUS_UPPER_LIMIT: f32 = 28.0;
pub const CAMERA_RADIUS_STEP: f32 = 1.5;

/// Top-down camera looking at `target` from `radius` units away.
///
/// The radius plays the part of an orbit camera's distance: smaller radius
/// means more pixels per world unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub target: Vec3,
    pub radius: f32,
    pub lower_radius_limit: f32,
    pub upper_radius_limit: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: CAMERA_RADIUS_DEFAULT,
            lower_radius_limit: CAMERA_RADIUS_LOWER_LIMIT,
            upper_radius_limit: CAMERA_RADIUS_UPPER_LIMIT,
        }
    }
}

impl Camera {
    pub fn looking_at(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn effective_radius(&self) -> f32 {
        clamp_radius(self.radius, self.lower_radius_limit, self.upper_radius_limit)
    }

    pub fn set_radius_clamped(&mut self, radius: f32) {
        self.radius = clamp_radius(radius, self.lower_radius_limit, self.upper_radius_limit);
    }

    /// Positive steps zoom in (wheel up), negative steps zoom out.
    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target_radius = self.radius - steps as f32 * CAMERA_RADIUS_STEP;
        self.set_radius_clamped(target_radius);
    }
}

fn clamp_radius(radius: f32, lower: f32, upper: f32) -> f32 {
    if !radius.is_finite() {
        return CAMERA_RADIUS_DEFAULT.clamp(lower, upper);
    }
    radius.clamp(lower, upper)
}
