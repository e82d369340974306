mod actor_model;
mod heightmap;
mod scene_def;

pub use actor_model::{
    load_actor_model, parse_actor_model, ActorModel, AnimationRangeDef, ModelError, SkeletonDef,
};
pub use heightmap::{Heightmap, HeightmapError, TerrainOptions};
pub use scene_def::{
    load_scene_defs, parse_hex_color, parse_scene_def, ActorDef, BoxDef, ContentError,
    ContentErrorCode, GroundDef, PickupDef, PropDef, SceneDef, SourceLocation,
    DEFAULT_KILL_HEIGHT,
};
