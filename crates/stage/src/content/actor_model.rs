use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ActorModel {
    pub name: String,
    /// Collision ellipsoid radii; the mover treats it as a box of these half extents.
    #[serde(default = "default_ellipsoid")]
    pub ellipsoid: [f32; 3],
    /// Offset from the actor origin (feet) to the ellipsoid centre.
    #[serde(default = "default_ellipsoid_offset")]
    pub ellipsoid_offset: [f32; 3],
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub skeleton: Option<SkeletonDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkeletonDef {
    pub name: String,
    #[serde(default)]
    pub ranges: Vec<AnimationRangeDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationRangeDef {
    pub name: String,
    pub from: f32,
    pub to: f32,
}

fn default_ellipsoid() -> [f32; 3] {
    [0.5, 1.0, 0.5]
}

fn default_ellipsoid_offset() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_mass() -> f32 {
    1.0
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read actor model {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse actor model {path}{}: {message}", at_field(.field_path))]
    Parse {
        path: PathBuf,
        field_path: String,
        message: String,
    },
    #[error("invalid animation range '{range}' in {path}: {reason}")]
    InvalidRange {
        path: PathBuf,
        range: String,
        reason: String,
    },
    #[error("invalid actor model {path} at {field}: {reason}")]
    InvalidValue {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

fn at_field(field_path: &str) -> String {
    if field_path.is_empty() || field_path == "." {
        String::new()
    } else {
        format!(" at {field_path}")
    }
}

pub fn load_actor_model(path: &Path) -> Result<ActorModel, ModelError> {
    let raw = fs::read_to_string(path).map_err(|source| ModelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_actor_model(&raw, path)
}

pub fn parse_actor_model(raw: &str, path: &Path) -> Result<ActorModel, ModelError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let model = match serde_path_to_error::deserialize::<_, ActorModel>(&mut deserializer) {
        Ok(model) => model,
        Err(error) => {
            let field_path = error.path().to_string();
            let source = error.into_inner();
            return Err(ModelError::Parse {
                path: path.to_path_buf(),
                field_path,
                message: source.to_string(),
            });
        }
    };
    validate_actor_model(&model, path)?;
    Ok(model)
}

fn validate_actor_model(model: &ActorModel, path: &Path) -> Result<(), ModelError> {
    let invalid = |field: &'static str, reason: &str| ModelError::InvalidValue {
        path: path.to_path_buf(),
        field,
        reason: reason.to_string(),
    };

    if model.name.trim().is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    if !model
        .ellipsoid
        .iter()
        .all(|radius| radius.is_finite() && *radius > 0.0)
    {
        return Err(invalid("ellipsoid", "radii must be finite and > 0"));
    }
    if !model.ellipsoid_offset.iter().all(|value| value.is_finite()) {
        return Err(invalid("ellipsoidOffset", "must be finite"));
    }
    if !model.mass.is_finite() || model.mass <= 0.0 {
        return Err(invalid("mass", "must be finite and > 0"));
    }

    let Some(skeleton) = &model.skeleton else {
        return Ok(());
    };
    let mut seen = HashSet::<&str>::new();
    for range in &skeleton.ranges {
        let range_error = |reason: &str| ModelError::InvalidRange {
            path: path.to_path_buf(),
            range: range.name.clone(),
            reason: reason.to_string(),
        };
        if !seen.insert(range.name.as_str()) {
            return Err(range_error("duplicate range name"));
        }
        if !range.from.is_finite() || !range.to.is_finite() || range.from < 0.0 {
            return Err(range_error("frames must be finite and >= 0"));
        }
        if range.to < range.from {
            return Err(range_error("'to' must not precede 'from'"));
        }
    }
    Ok(())
}
