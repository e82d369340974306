use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;
use tracing::{debug, info};

use crate::content::ActorModel;

use super::animation::{AnimationController, ClipKind, ClipNames, Skeleton};
use super::deferred::Deferred;
use super::input::{KeyState, KEY_SHIFT, KEY_SPACE};
use super::physics::{CollisionWorld, RigidBody};

pub const DEFAULT_BASE_SPEED: f32 = 2.0;
pub const DEFAULT_BOOST_SPEED: f32 = 5.0;
pub const DEFAULT_JUMP_IMPULSE: f32 = 5.0;
pub const DEFAULT_GROUNDED_THRESHOLD: f32 = 0.05;
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Keys that push the actor along one axis and the facing they imply.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionBinding {
    pub keys: Vec<String>,
    pub direction: Vec3,
    /// Yaw in radians, applied as-is rather than derived from `direction`.
    pub facing: f32,
}

impl DirectionBinding {
    pub fn new<S: Into<String>>(
        keys: impl IntoIterator<Item = S>,
        direction: Vec3,
        facing: f32,
    ) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            direction: direction.normalize_or_zero(),
            facing,
        }
    }
}

/// How simultaneously held bindings combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OppositeKeyPolicy {
    /// The last held binding in declaration order replaces the others.
    #[default]
    LastWins,
    /// Held bindings add up per axis; opposite keys cancel.
    Accumulate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionMode {
    Direct,
    Collide { gravity: Vec3 },
    /// Intent drives a rigid body's horizontal velocity; jumps are impulses.
    Physics { gravity: Vec3 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocomotionConfig {
    pub bindings: Vec<DirectionBinding>,
    pub base_speed: f32,
    pub boost_speed: f32,
    pub boost_key: Option<String>,
    pub jump_key: Option<String>,
    pub jump_impulse: f32,
    pub grounded_threshold: f32,
    pub opposite_keys: OppositeKeyPolicy,
    pub mode: MotionMode,
    pub clips: ClipNames,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
            base_speed: DEFAULT_BASE_SPEED,
            boost_speed: DEFAULT_BOOST_SPEED,
            boost_key: Some(KEY_SHIFT.to_string()),
            jump_key: Some(KEY_SPACE.to_string()),
            jump_impulse: DEFAULT_JUMP_IMPULSE,
            grounded_threshold: DEFAULT_GROUNDED_THRESHOLD,
            opposite_keys: OppositeKeyPolicy::LastWins,
            mode: MotionMode::Collide {
                gravity: DEFAULT_GRAVITY,
            },
            clips: ClipNames::default(),
        }
    }
}

pub fn default_bindings() -> Vec<DirectionBinding> {
    vec![
        DirectionBinding::new(["w", "ArrowUp"], Vec3::NEG_X, 3.0 * FRAC_PI_2),
        DirectionBinding::new(["a", "ArrowLeft"], Vec3::NEG_Z, PI),
        DirectionBinding::new(["s", "ArrowDown"], Vec3::X, FRAC_PI_2),
        DirectionBinding::new(["d", "ArrowRight"], Vec3::Z, 0.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    pub vector: Vec3,
    pub facing: Option<f32>,
    pub boosted: bool,
    pub jump: bool,
}

impl MovementIntent {
    pub fn is_moving(&self) -> bool {
        self.vector != Vec3::ZERO
    }
}

pub fn compute_intent(keys: &KeyState, config: &LocomotionConfig) -> MovementIntent {
    let boosted = config
        .boost_key
        .as_deref()
        .is_some_and(|key| keys.is_held(key));
    let jump = config
        .jump_key
        .as_deref()
        .is_some_and(|key| keys.is_held(key));
    let speed = if boosted {
        config.boost_speed
    } else {
        config.base_speed
    };

    let mut vector = Vec3::ZERO;
    let mut facing = None;
    for binding in config
        .bindings
        .iter()
        .filter(|binding| keys.any_held(&binding.keys))
    {
        let contribution = binding.direction * speed;
        vector = match config.opposite_keys {
            OppositeKeyPolicy::LastWins => contribution,
            OppositeKeyPolicy::Accumulate => vector + contribution,
        };
        facing = Some(binding.facing);
    }

    MovementIntent {
        vector,
        facing,
        boosted,
        jump,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorMotionState {
    pub movement: Vec3,
    pub facing: f32,
    pub is_moving: bool,
    pub clip: ClipKind,
    pub is_grounded: bool,
}

impl Default for ActorMotionState {
    fn default() -> Self {
        Self {
            movement: Vec3::ZERO,
            facing: 0.0,
            is_moving: false,
            clip: ClipKind::Idle,
            is_grounded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActorBody {
    /// Moved by displacement only; `center` is the collision box centre.
    Kinematic { center: Vec3, half_extents: Vec3 },
    Dynamic(RigidBody),
}

impl ActorBody {
    pub fn center(&self) -> Vec3 {
        match self {
            ActorBody::Kinematic { center, .. } => *center,
            ActorBody::Dynamic(body) => body.position,
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        match self {
            ActorBody::Kinematic { half_extents, .. } => *half_extents,
            ActorBody::Dynamic(body) => body.half_extents,
        }
    }
}

/// A controllable character: collision body, optional skeleton and the
/// per-tick motion state derived from input.
#[derive(Debug, Clone)]
pub struct Actor {
    pub name: String,
    pub body: ActorBody,
    /// Actor origin (feet) relative to the collision box centre.
    pub body_offset: Vec3,
    pub skeleton: Option<Skeleton>,
    pub animation: AnimationController,
    pub motion: ActorMotionState,
}

impl Actor {
    pub fn from_model(model: &ActorModel, spawn: Vec3, config: &LocomotionConfig) -> Self {
        let half_extents = Vec3::from_array(model.ellipsoid);
        let body_offset = Vec3::from_array(model.ellipsoid_offset);
        let center = spawn + body_offset;
        let body = match config.mode {
            MotionMode::Physics { .. } => {
                ActorBody::Dynamic(RigidBody::new(center, half_extents, model.mass))
            }
            MotionMode::Direct | MotionMode::Collide { .. } => ActorBody::Kinematic {
                center,
                half_extents,
            },
        };
        let skeleton = model.skeleton.as_ref().map(Skeleton::from_def);
        let animation =
            AnimationController::bind(config.clips.clone(), skeleton.as_ref(), &model.name);
        Self {
            name: model.name.clone(),
            body,
            body_offset,
            skeleton,
            animation,
            motion: ActorMotionState::default(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.body.center() - self.body_offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub intent: MovementIntent,
    pub clip_started: Option<ClipKind>,
    pub jumped: bool,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    NotReady,
    Ticked(TickReport),
}

#[derive(Debug, Clone, Default)]
pub struct LocomotionBridge {
    config: LocomotionConfig,
}

impl LocomotionBridge {
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn tick(
        &self,
        keys: &KeyState,
        actor: &mut Deferred<Actor>,
        world: &CollisionWorld,
        dt: f32,
    ) -> TickOutcome {
        match actor.poll() {
            Some(actor) => TickOutcome::Ticked(self.tick_actor(keys, actor, world, dt)),
            None => TickOutcome::NotReady,
        }
    }

    pub fn tick_actor(
        &self,
        keys: &KeyState,
        actor: &mut Actor,
        world: &CollisionWorld,
        dt: f32,
    ) -> TickReport {
        let intent = compute_intent(keys, &self.config);
        let jumped = match (&mut actor.body, self.config.mode) {
            (ActorBody::Kinematic { center, half_extents }, MotionMode::Direct) => {
                let result = world.move_with_collisions(*center, *half_extents, intent.vector * dt);
                *center = result.position;
                actor.motion.is_grounded = result.grounded;
                false
            }
            (
                ActorBody::Kinematic { center, half_extents },
                MotionMode::Collide { gravity } | MotionMode::Physics { gravity },
            ) => {
                let displacement = (intent.vector + gravity) * dt;
                let result = world.move_with_collisions(*center, *half_extents, displacement);
                *center = result.position;
                actor.motion.is_grounded = result.grounded;
                false
            }
            (ActorBody::Dynamic(body), mode) => {
                let gravity = match mode {
                    MotionMode::Direct => Vec3::ZERO,
                    MotionMode::Collide { gravity } | MotionMode::Physics { gravity } => gravity,
                };
                step_dynamic(&self.config, &intent, body, &mut actor.motion, world, gravity, dt)
            }
        };
        if jumped {
            debug!(actor = %actor.name, "actor_jumped");
        }

        actor.motion.movement = intent.vector;
        actor.motion.is_moving = intent.is_moving();
        if let Some(facing) = intent.facing {
            actor.motion.facing = facing;
        }

        let clip_started = match actor.skeleton.as_mut() {
            Some(skeleton) => {
                let started = actor
                    .animation
                    .update(actor.motion.is_moving, intent.boosted, skeleton);
                skeleton.advance(dt);
                started
            }
            None => None,
        };
        if let Some(clip) = clip_started {
            info!(actor = %actor.name, clip = ?clip, "actor_clip_changed");
        }
        actor.motion.clip = actor.animation.current();

        TickReport {
            intent,
            clip_started,
            jumped,
            position: actor.position(),
        }
    }
}

/// Returns true when a jump impulse was applied this tick.
fn step_dynamic(
    config: &LocomotionConfig,
    intent: &MovementIntent,
    body: &mut RigidBody,
    motion: &mut ActorMotionState,
    world: &CollisionWorld,
    gravity: Vec3,
    dt: f32,
) -> bool {
    let vertical = body.linear_velocity().y;
    body.set_linear_velocity(Vec3::new(intent.vector.x, vertical, intent.vector.z));

    let jumped = intent.jump && motion.is_grounded;
    if jumped {
        body.apply_impulse(Vec3::Y * config.jump_impulse);
        motion.is_grounded = false;
    }

    body.step(dt, gravity, world);

    if !jumped && !motion.is_grounded && body.linear_velocity().y.abs() < config.grounded_threshold
    {
        motion.is_grounded = true;
    }
    jumped
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::app::physics::Ground;
    use crate::content::{AnimationRangeDef, SkeletonDef};

    const DT: f32 = 1.0 / 60.0;

    fn ybot_model() -> ActorModel {
        ActorModel {
            name: "ybot".to_string(),
            ellipsoid: [0.5, 1.0, 0.5],
            ellipsoid_offset: [0.0, 1.0, 0.0],
            mass: 1.0,
            skeleton: Some(SkeletonDef {
                name: "YBot".to_string(),
                ranges: ["YBot_Idle", "YBot_Walk", "YBot_Run"]
                    .iter()
                    .enumerate()
                    .map(|(index, name)| AnimationRangeDef {
                        name: name.to_string(),
                        from: index as f32 * 40.0,
                        to: index as f32 * 40.0 + 30.0,
                    })
                    .collect(),
            }),
        }
    }

    fn flat_world() -> CollisionWorld {
        CollisionWorld::new().with_ground(Ground::Flat {
            height: 0.0,
            size: 24.0,
        })
    }

    fn physics_config() -> LocomotionConfig {
        LocomotionConfig {
            mode: MotionMode::Physics {
                gravity: DEFAULT_GRAVITY,
            },
            ..LocomotionConfig::default()
        }
    }

    #[test]
    fn no_direction_key_means_zero_vector() {
        let keys = KeyState::new().with_key_down(KEY_SHIFT, true);
        let intent = compute_intent(&keys, &LocomotionConfig::default());
        assert_eq!(intent.vector, Vec3::ZERO);
        assert_eq!(intent.facing, None);
        assert!(!intent.is_moving());
    }

    #[test]
    fn forward_key_moves_along_negative_x() {
        let keys = KeyState::new().with_key_down("w", true);
        let intent = compute_intent(&keys, &LocomotionConfig::default());
        assert_eq!(intent.vector, Vec3::new(-DEFAULT_BASE_SPEED, 0.0, 0.0));
        assert_eq!(intent.facing, Some(3.0 * FRAC_PI_2));
        assert!(intent.is_moving());
    }

    #[test]
    fn every_single_binding_has_base_speed_and_its_facing() {
        let config = LocomotionConfig::default();
        for binding in &config.bindings {
            for key in &binding.keys {
                let keys = KeyState::new().with_key_down(key, true);
                let intent = compute_intent(&keys, &config);
                assert!((intent.vector.length() - DEFAULT_BASE_SPEED).abs() < 1e-6);
                assert_eq!(intent.facing, Some(binding.facing));
            }
        }
    }

    #[test]
    fn boost_key_raises_magnitude() {
        let keys = KeyState::new()
            .with_key_down("w", true)
            .with_key_down(KEY_SHIFT, true);
        let intent = compute_intent(&keys, &LocomotionConfig::default());
        assert!((intent.vector.length() - DEFAULT_BOOST_SPEED).abs() < 1e-6);
        assert!(intent.boosted);
    }

    #[test]
    fn last_wins_takes_later_binding() {
        let keys = KeyState::new()
            .with_key_down("w", true)
            .with_key_down("s", true);
        let intent = compute_intent(&keys, &LocomotionConfig::default());
        assert_eq!(intent.vector, Vec3::new(DEFAULT_BASE_SPEED, 0.0, 0.0));
        assert_eq!(intent.facing, Some(FRAC_PI_2));
    }

    #[test]
    fn accumulate_cancels_opposite_keys_and_sums_diagonals() {
        let config = LocomotionConfig {
            opposite_keys: OppositeKeyPolicy::Accumulate,
            ..LocomotionConfig::default()
        };
        let opposite = KeyState::new()
            .with_key_down("w", true)
            .with_key_down("s", true);
        assert_eq!(compute_intent(&opposite, &config).vector, Vec3::ZERO);

        let diagonal = KeyState::new()
            .with_key_down("w", true)
            .with_key_down("d", true);
        let intent = compute_intent(&diagonal, &config);
        assert_eq!(
            intent.vector,
            Vec3::new(-DEFAULT_BASE_SPEED, 0.0, DEFAULT_BASE_SPEED)
        );
        assert_eq!(intent.facing, Some(0.0));
    }

    #[test]
    fn pending_actor_is_not_ticked() {
        let (_sender, receiver) = mpsc::channel::<Result<Actor, String>>();
        let mut pending = Deferred::from_receiver("actor", receiver);
        let bridge = LocomotionBridge::default();
        let keys = KeyState::new().with_key_down("w", true);

        let outcome = bridge.tick(&keys, &mut pending, &flat_world(), DT);
        assert_eq!(outcome, TickOutcome::NotReady);
        assert!(pending.get().is_none());
    }

    #[test]
    fn ready_actor_moves_and_faces_binding() {
        let config = LocomotionConfig {
            mode: MotionMode::Direct,
            ..LocomotionConfig::default()
        };
        let bridge = LocomotionBridge::new(config.clone());
        let mut actor = Deferred::ready("actor", Actor::from_model(&ybot_model(), Vec3::ZERO, &config));
        let keys = KeyState::new().with_key_down("d", true);

        let TickOutcome::Ticked(report) = bridge.tick(&keys, &mut actor, &flat_world(), 0.5) else {
            panic!("actor should be ready");
        };
        assert!((report.position.z - 1.0).abs() < 1e-5);
        assert_eq!(report.position.y, 0.0);
        let actor = actor.get().expect("ready");
        assert!(actor.motion.is_moving);
        assert_eq!(actor.motion.facing, 0.0);
    }

    #[test]
    fn clip_starts_once_per_moving_change() {
        let config = LocomotionConfig::default();
        let bridge = LocomotionBridge::new(config.clone());
        let mut actor = Actor::from_model(&ybot_model(), Vec3::ZERO, &config);
        let world = flat_world();
        let walking = KeyState::new().with_key_down("a", true);
        let idle = KeyState::new();

        let started = (0..5)
            .map(|_| bridge.tick_actor(&walking, &mut actor, &world, DT).clip_started)
            .collect::<Vec<_>>();
        assert_eq!(started[0], Some(ClipKind::Walk));
        assert!(started[1..].iter().all(Option::is_none));

        let stopped = bridge.tick_actor(&idle, &mut actor, &world, DT);
        assert_eq!(stopped.clip_started, Some(ClipKind::Idle));
        assert_eq!(bridge.tick_actor(&idle, &mut actor, &world, DT).clip_started, None);

        let skeleton = actor.skeleton.as_ref().expect("skeleton");
        assert_eq!(skeleton.begin_count(), 2);
        assert_eq!(actor.motion.clip, ClipKind::Idle);
    }

    #[test]
    fn collide_mode_applies_gravity_until_grounded() {
        let config = LocomotionConfig::default();
        let bridge = LocomotionBridge::new(config.clone());
        let mut actor = Actor::from_model(&ybot_model(), Vec3::new(0.0, 0.5, 0.0), &config);
        let world = flat_world();
        for _ in 0..30 {
            bridge.tick_actor(&KeyState::new(), &mut actor, &world, DT);
        }
        assert!(actor.position().y.abs() < 1e-4);
        assert!(actor.motion.is_grounded);
    }

    #[test]
    fn jump_applies_one_impulse_and_regrounds_later() {
        let config = physics_config();
        let bridge = LocomotionBridge::new(config.clone());
        let mut actor = Actor::from_model(&ybot_model(), Vec3::ZERO, &config);
        let world = flat_world();

        let settle = bridge.tick_actor(&KeyState::new(), &mut actor, &world, DT);
        assert!(!settle.jumped);
        assert!(actor.motion.is_grounded);

        let jump = KeyState::new().with_key_down(KEY_SPACE, true);
        let first = bridge.tick_actor(&jump, &mut actor, &world, DT);
        assert!(first.jumped);
        assert!(!actor.motion.is_grounded);
        assert!(actor.position().y > 0.0);

        let held = bridge.tick_actor(&jump, &mut actor, &world, DT);
        assert!(!held.jumped);
        assert!(!actor.motion.is_grounded);

        let mut ticks = 0;
        while !actor.motion.is_grounded && ticks < 300 {
            let report = bridge.tick_actor(&jump, &mut actor, &world, DT);
            assert!(!report.jumped);
            ticks += 1;
        }
        assert!(actor.motion.is_grounded);
        let ActorBody::Dynamic(body) = &actor.body else {
            panic!("physics actor should be dynamic");
        };
        assert!(body.linear_velocity().y.abs() < DEFAULT_GROUNDED_THRESHOLD);
    }

    #[test]
    fn physics_mode_keeps_vertical_velocity_while_steering() {
        let config = physics_config();
        let bridge = LocomotionBridge::new(config.clone());
        let mut actor = Actor::from_model(&ybot_model(), Vec3::new(0.0, 5.0, 0.0), &config);
        let world = flat_world();
        let keys = KeyState::new().with_key_down("s", true);

        bridge.tick_actor(&keys, &mut actor, &world, DT);
        bridge.tick_actor(&keys, &mut actor, &world, DT);
        let ActorBody::Dynamic(body) = &actor.body else {
            panic!("physics actor should be dynamic");
        };
        assert_eq!(body.linear_velocity().x, DEFAULT_BASE_SPEED);
        assert!(body.linear_velocity().y < -0.2);
    }

    #[test]
    fn actor_without_skeleton_still_moves() {
        let config = LocomotionConfig {
            mode: MotionMode::Direct,
            ..LocomotionConfig::default()
        };
        let model = ActorModel {
            skeleton: None,
            ..ybot_model()
        };
        let bridge = LocomotionBridge::new(config.clone());
        let mut actor = Actor::from_model(&model, Vec3::ZERO, &config);
        let report = bridge.tick_actor(
            &KeyState::new().with_key_down("w", true),
            &mut actor,
            &flat_world(),
            1.0,
        );
        assert_eq!(report.clip_started, None);
        assert!(!actor.animation.is_enabled());
        assert!((report.position.x + DEFAULT_BASE_SPEED).abs() < 1e-5);
    }
}
