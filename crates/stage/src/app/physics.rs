use glam::Vec3;

use crate::content::Heightmap;

/// Overlap tolerance; faces that merely touch do not collide.
const CONTACT_EPSILON: f32 = 1e-4;
/// Distance below which a resting body counts as standing on a surface.
const GROUND_SNAP: f32 = 1e-3;
/// Horizontal velocity lost per second per unit of friction while grounded.
const FRICTION_DECAY_PER_SECOND: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

fn overlaps_on(a: &Aabb, b: &Aabb, axis: usize) -> bool {
    a.min[axis] < b.max[axis] - CONTACT_EPSILON && a.max[axis] > b.min[axis] + CONTACT_EPSILON
}

#[derive(Debug, Clone)]
pub enum Ground {
    /// Square plane of side `size` centred on the origin at `height`.
    Flat { height: f32, size: f32 },
    Terrain(Heightmap),
}

impl Ground {
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        match self {
            Ground::Flat { height, size } => {
                let half = size * 0.5;
                (x.abs() <= half && z.abs() <= half).then_some(*height)
            }
            Ground::Terrain(heightmap) => heightmap.height_at(x, z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    pub position: Vec3,
    pub grounded: bool,
    pub blocked_x: bool,
    pub blocked_y: bool,
    pub blocked_z: bool,
}

/// Static collision geometry of one scene.
#[derive(Debug, Clone, Default)]
pub struct CollisionWorld {
    boxes: Vec<Aabb>,
    /// Boxes of moving bodies, replaced wholesale every tick.
    movable: Vec<Aabb>,
    ground: Option<Ground>,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(mut self, ground: Ground) -> Self {
        self.ground = Some(ground);
        self
    }

    pub fn add_box(&mut self, aabb: Aabb) {
        self.boxes.push(aabb);
    }

    pub fn set_movable_boxes(&mut self, boxes: impl IntoIterator<Item = Aabb>) {
        self.movable.clear();
        self.movable.extend(boxes);
    }

    fn solids(&self) -> impl Iterator<Item = &Aabb> {
        self.boxes.iter().chain(&self.movable)
    }

    pub fn ground(&self) -> Option<&Ground> {
        self.ground.as_ref()
    }

    pub fn ground_height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.ground.as_ref().and_then(|ground| ground.height_at(x, z))
    }

    /// Moves a box-shaped body by `displacement`, one axis at a time (X, Z,
    /// then Y), stopping flush against static boxes so the remaining axes
    /// slide. The ground pushes the body up and never lets it sink below.
    pub fn move_with_collisions(
        &self,
        center: Vec3,
        half_extents: Vec3,
        displacement: Vec3,
    ) -> MoveResult {
        let half = half_extents.abs();
        let mut position = center;
        let blocked_x = self.sweep_axis(&mut position, half, 0, displacement.x);
        let blocked_z = self.sweep_axis(&mut position, half, 2, displacement.z);
        let mut blocked_y = self.sweep_axis(&mut position, half, 1, displacement.y);

        let mut grounded = blocked_y && displacement.y < 0.0;
        if let Some(support) = self.support_height(position, half) {
            let bottom = position.y - half.y;
            if bottom < support {
                position.y = support + half.y;
                blocked_y |= displacement.y < 0.0;
            }
            if position.y - half.y - support <= GROUND_SNAP {
                grounded = true;
            }
        }

        MoveResult {
            position,
            grounded,
            blocked_x,
            blocked_y,
            blocked_z,
        }
    }

    fn sweep_axis(&self, position: &mut Vec3, half: Vec3, axis: usize, delta: f32) -> bool {
        if delta == 0.0 || !delta.is_finite() {
            return false;
        }
        let start = Aabb::from_center_half_extents(*position, half);
        let mut allowed = delta;
        for aabb in self.solids() {
            let other_axes_overlap = (0..3)
                .filter(|other| *other != axis)
                .all(|other| overlaps_on(&start, aabb, other));
            if !other_axes_overlap {
                continue;
            }
            if delta > 0.0 && start.max[axis] <= aabb.min[axis] + CONTACT_EPSILON {
                allowed = allowed.min(aabb.min[axis] - start.max[axis]);
            } else if delta < 0.0 && start.min[axis] >= aabb.max[axis] - CONTACT_EPSILON {
                allowed = allowed.max(aabb.max[axis] - start.min[axis]);
            }
        }
        position[axis] += allowed;
        allowed != delta
    }

    /// Highest ground or box top directly under the body's footprint.
    fn support_height(&self, position: Vec3, half: Vec3) -> Option<f32> {
        let body = Aabb::from_center_half_extents(position, half);
        let bottom = body.min.y;
        let ground = self.ground_height_at(position.x, position.z);
        self.solids()
            .filter(|aabb| overlaps_on(&body, aabb, 0) && overlaps_on(&body, aabb, 2))
            .map(|aabb| aabb.max.y)
            .filter(|top| *top <= bottom + GROUND_SNAP)
            .chain(ground)
            .reduce(f32::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub half_extents: Vec3,
    pub mass: f32,
    pub friction: f32,
    grounded: bool,
}

impl RigidBody {
    pub fn new(position: Vec3, half_extents: Vec3, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            half_extents,
            mass: if mass.is_finite() && mass > 0.0 { mass } else { 1.0 },
            friction: 0.0,
            grounded: false,
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse / self.mass;
    }

    pub fn in_contact(&self) -> bool {
        self.grounded
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.position, self.half_extents)
    }

    pub fn step(&mut self, dt: f32, gravity: Vec3, world: &CollisionWorld) -> MoveResult {
        self.velocity += gravity * dt;
        let result = world.move_with_collisions(self.position, self.half_extents, self.velocity * dt);
        if result.blocked_x {
            self.velocity.x = 0.0;
        }
        if result.blocked_y {
            self.velocity.y = 0.0;
        }
        if result.blocked_z {
            self.velocity.z = 0.0;
        }
        if result.grounded && self.friction > 0.0 {
            let keep = (1.0 - self.friction * FRICTION_DECAY_PER_SECOND * dt).max(0.0);
            self.velocity.x *= keep;
            self.velocity.z *= keep;
        }
        self.position = result.position;
        self.grounded = result.grounded;
        result
    }
}
