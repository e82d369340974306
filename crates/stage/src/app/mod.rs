mod animation;
mod camera;
mod deferred;
mod input;
mod locomotion;
mod loop_runner;
mod metrics;
mod physics;
mod rendering;
mod scene;

pub use animation::{
    AnimationController, AnimationRange, ClipKind, ClipNames, PlayingAnimation, Skeleton,
    ANIMATION_FRAME_RATE, DEFAULT_BLENDING_SPEED,
};
pub use camera::{
    Camera, CAMERA_RADIUS_DEFAULT, CAMERA_RADIUS_LOWER_LIMIT, CAMERA_RADIUS_STEP,
    CAMERA_RADIUS_UPPER_LIMIT,
};
pub use deferred::{Deferred, DeferredState};
pub use input::{KeyState, KEY_SHIFT, KEY_SPACE};
pub use locomotion::{
    compute_intent, default_bindings, Actor, ActorBody, ActorMotionState, DirectionBinding,
    LocomotionBridge, LocomotionConfig, MotionMode, MovementIntent, OppositeKeyPolicy,
    TickOutcome, TickReport, DEFAULT_BASE_SPEED, DEFAULT_BOOST_SPEED, DEFAULT_GRAVITY,
    DEFAULT_GROUNDED_THRESHOLD, DEFAULT_JUMP_IMPULSE,
};
pub use loop_runner::{key_name, run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use physics::{Aabb, CollisionWorld, Ground, MoveResult, RigidBody};
pub use rendering::{
    draw_hud, line_advance, pixels_per_unit, text_width, world_extent_to_px, world_to_screen,
    Frame, HudData, Renderer, Rgba, Viewport, PIXELS_PER_UNIT_AT_DEFAULT_RADIUS,
};
pub use scene::{
    EntryStatus, InputSnapshot, MenuMode, RegistryStatus, RenderOutcome, Scene, SceneCommand,
    SceneRegistry, SceneTarget, DEFAULT_CLEAR_COLOR,
};
