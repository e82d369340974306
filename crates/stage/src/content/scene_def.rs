use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use roxmltree::{Document, Node};

use crate::app::{
    ClipNames, DirectionBinding, LocomotionConfig, MotionMode, OppositeKeyPolicy, Rgba,
    DEFAULT_CLEAR_COLOR, DEFAULT_GRAVITY,
};

pub const DEFAULT_GROUND_SIZE: f32 = 24.0;
pub const DEFAULT_TERRAIN_SIZE: f32 = 150.0;
pub const DEFAULT_TERRAIN_MAX_HEIGHT: f32 = 10.0;
pub const DEFAULT_KILL_HEIGHT: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadDir,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateScene,
}

#[derive(Debug, Clone)]
pub struct ContentError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentError {}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundDef {
    /// Side length of the flat ground square.
    pub size: f32,
    pub height: f32,
    /// Asset-relative PNG path; replaces the flat square when present.
    pub heightmap: Option<String>,
    pub terrain_size: f32,
    pub max_height: f32,
}

impl Default for GroundDef {
    fn default() -> Self {
        Self {
            size: DEFAULT_GROUND_SIZE,
            height: 0.0,
            heightmap: None,
            terrain_size: DEFAULT_TERRAIN_SIZE,
            max_height: DEFAULT_TERRAIN_MAX_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorDef {
    pub model: String,
    pub spawn: Vec3,
    /// Falling below this height ends the run.
    pub kill_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDef {
    pub position: Vec3,
    pub size: Vec3,
    pub color: Rgba,
}

/// Loose box driven by gravity and friction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropDef {
    pub position: Vec3,
    pub size: Vec3,
    pub mass: f32,
    pub friction: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupDef {
    pub position: Vec3,
    pub radius: f32,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDef {
    pub name: String,
    pub clear_color: Rgba,
    /// Build the scene on a worker thread instead of at startup.
    pub deferred: bool,
    pub ground: GroundDef,
    pub actor: Option<ActorDef>,
    pub locomotion: LocomotionConfig,
    pub boxes: Vec<BoxDef>,
    pub props: Vec<PropDef>,
    pub pickups: Vec<PickupDef>,
    pub source_path: PathBuf,
}

/// Loads every `*.xml` directly under `dir`, ordered by file name.
pub fn load_scene_defs(dir: &Path) -> Result<Vec<SceneDef>, ContentError> {
    let read_dir_error = |source: std::io::Error| ContentError {
        code: ContentErrorCode::ReadDir,
        message: format!("failed to list scene directory: {source}"),
        file_path: dir.to_path_buf(),
        location: None,
    };
    let mut files = Vec::<PathBuf>::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        let is_xml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if path.is_file() && is_xml {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut names = HashSet::<String>::new();
    let mut defs = Vec::with_capacity(files.len());
    for file in files {
        let raw = fs::read_to_string(&file).map_err(|source| ContentError {
            code: ContentErrorCode::ReadFile,
            message: format!("failed to read XML file: {source}"),
            file_path: file.clone(),
            location: None,
        })?;
        let def = parse_scene_def(&raw, &file)?;
        if !names.insert(def.name.clone()) {
            return Err(ContentError {
                code: ContentErrorCode::DuplicateScene,
                message: format!(
                    "duplicate scene name '{}'; every SceneDef needs a unique <name>",
                    def.name
                ),
                file_path: file,
                location: None,
            });
        }
        defs.push(def);
    }
    Ok(defs)
}

pub fn parse_scene_def(raw: &str, file_path: &Path) -> Result<SceneDef, ContentError> {
    let doc = Document::parse(raw).map_err(|error| ContentError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let parser = DefParser {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "SceneDef" {
        return Err(parser.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <SceneDef>".to_string(),
            root,
        ));
    }
    parser.scene_def(root)
}

struct DefParser<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DefParser<'_, '_> {
    fn scene_def(&self, node: Node<'_, '_>) -> Result<SceneDef, ContentError> {
        let mut seen = FieldTracker::new("SceneDef");
        let mut name: Option<String> = None;
        let mut clear_color = DEFAULT_CLEAR_COLOR;
        let mut deferred = false;
        let mut ground = GroundDef::default();
        let mut actor: Option<ActorDef> = None;
        let mut locomotion = LocomotionConfig::default();
        let mut boxes = Vec::new();
        let mut props = Vec::new();
        let mut pickups = Vec::new();

        for field in elements(node) {
            let field_name = field.tag_name().name();
            match field_name {
                "box" => boxes.push(self.box_def(field)?),
                "prop" => props.push(self.prop_def(field)?),
                "pickup" => pickups.push(self.pickup_def(field)?),
                _ => {
                    seen.insert(self, field)?;
                    match field_name {
                        "name" => name = Some(self.required_text(field)?),
                        "clearColor" => {
                            let value = self.required_text(field)?;
                            clear_color = self.color(field, &value)?;
                        }
                        "deferred" => deferred = self.bool_text(field)?,
                        "ground" => ground = self.ground_def(field)?,
                        "actor" => actor = Some(self.actor_def(field)?),
                        "locomotion" => locomotion = self.locomotion(field)?,
                        _ => return Err(self.unknown_field(field, "SceneDef")),
                    }
                }
            }
        }

        let Some(name) = name else {
            return Err(self.missing_field(node, "name", "SceneDef"));
        };
        Ok(SceneDef {
            name,
            clear_color,
            deferred,
            ground,
            actor,
            locomotion,
            boxes,
            props,
            pickups,
            source_path: self.file_path.to_path_buf(),
        })
    }

    fn ground_def(&self, node: Node<'_, '_>) -> Result<GroundDef, ContentError> {
        let mut seen = FieldTracker::new("ground");
        let mut ground = GroundDef::default();
        for field in elements(node) {
            seen.insert(self, field)?;
            match field.tag_name().name() {
                "size" => ground.size = self.positive_text(field)?,
                "height" => ground.height = self.f32_text(field)?,
                "heightmap" => ground.heightmap = Some(self.required_text(field)?),
                "terrainSize" => ground.terrain_size = self.positive_text(field)?,
                "maxHeight" => ground.max_height = self.f32_text(field)?,
                _ => return Err(self.unknown_field(field, "ground")),
            }
        }
        Ok(ground)
    }

    fn actor_def(&self, node: Node<'_, '_>) -> Result<ActorDef, ContentError> {
        let mut seen = FieldTracker::new("actor");
        let mut model: Option<String> = None;
        let mut spawn = Vec3::ZERO;
        let mut kill_height = DEFAULT_KILL_HEIGHT;
        for field in elements(node) {
            seen.insert(self, field)?;
            match field.tag_name().name() {
                "model" => model = Some(self.required_text(field)?),
                "spawn" => {
                    let value = self.required_text(field)?;
                    spawn = self.vec3(field, &value)?;
                }
                "killHeight" => kill_height = self.f32_text(field)?,
                _ => return Err(self.unknown_field(field, "actor")),
            }
        }
        let Some(model) = model else {
            return Err(self.missing_field(node, "model", "actor"));
        };
        Ok(ActorDef {
            model,
            spawn,
            kill_height,
        })
    }

    fn locomotion(&self, node: Node<'_, '_>) -> Result<LocomotionConfig, ContentError> {
        let mut seen = FieldTracker::new("locomotion");
        let mut config = LocomotionConfig::default();
        let mut bindings = Vec::<DirectionBinding>::new();
        let mut mode_name = "collide".to_string();
        let mut mode_node = node;
        let mut gravity = DEFAULT_GRAVITY;

        for field in elements(node) {
            if field.tag_name().name() == "bind" {
                bindings.push(self.binding(field)?);
                continue;
            }
            seen.insert(self, field)?;
            match field.tag_name().name() {
                "mode" => {
                    mode_name = self.required_text(field)?;
                    mode_node = field;
                }
                "oppositeKeys" => {
                    let value = self.required_text(field)?;
                    config.opposite_keys = match value.as_str() {
                        "lastWins" => OppositeKeyPolicy::LastWins,
                        "accumulate" => OppositeKeyPolicy::Accumulate,
                        _ => {
                            return Err(self.invalid_value(
                                field,
                                format!(
                                    "invalid oppositeKeys '{value}'; allowed values: lastWins, accumulate"
                                ),
                            ))
                        }
                    };
                }
                "baseSpeed" => config.base_speed = self.non_negative_text(field)?,
                "boostSpeed" => config.boost_speed = self.non_negative_text(field)?,
                "boostKey" => config.boost_key = self.optional_key(field)?,
                "jumpKey" => config.jump_key = self.optional_key(field)?,
                "jumpImpulse" => config.jump_impulse = self.non_negative_text(field)?,
                "groundedThreshold" => config.grounded_threshold = self.positive_text(field)?,
                "gravity" => {
                    let value = self.required_text(field)?;
                    gravity = self.vec3(field, &value)?;
                }
                "clips" => config.clips = self.clips(field)?,
                _ => return Err(self.unknown_field(field, "locomotion")),
            }
        }

        config.mode = match mode_name.as_str() {
            "direct" => MotionMode::Direct,
            "collide" => MotionMode::Collide { gravity },
            "physics" => MotionMode::Physics { gravity },
            _ => {
                return Err(self.invalid_value(
                    mode_node,
                    format!("invalid mode '{mode_name}'; allowed values: direct, collide, physics"),
                ))
            }
        };
        if !bindings.is_empty() {
            config.bindings = bindings;
        }
        Ok(config)
    }

    fn binding(&self, node: Node<'_, '_>) -> Result<DirectionBinding, ContentError> {
        self.check_attributes(node, &["keys", "direction", "facing"])?;
        let keys = self
            .required_attribute(node, "keys")?
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if keys.is_empty() {
            return Err(self.invalid_value(node, "bind keys must list at least one key".to_string()));
        }
        let direction = self.vec3(node, self.required_attribute(node, "direction")?)?;
        if direction == Vec3::ZERO {
            return Err(self.invalid_value(node, "bind direction must be non-zero".to_string()));
        }
        let facing_degrees = self.f32_value(node, self.required_attribute(node, "facing")?)?;
        Ok(DirectionBinding::new(
            keys,
            direction,
            facing_degrees.to_radians(),
        ))
    }

    fn clips(&self, node: Node<'_, '_>) -> Result<ClipNames, ContentError> {
        self.check_attributes(node, &["idle", "walk", "run"])?;
        let mut clips = ClipNames::default();
        for (attribute, slot) in [
            ("idle", &mut clips.idle),
            ("walk", &mut clips.walk),
            ("run", &mut clips.run),
        ] {
            if let Some(value) = node.attribute(attribute) {
                let value = value.trim();
                if value.is_empty() {
                    return Err(self.invalid_value(
                        node,
                        format!("clip attribute '{attribute}' must not be empty"),
                    ));
                }
                *slot = value.to_string();
            }
        }
        Ok(clips)
    }

    fn box_def(&self, node: Node<'_, '_>) -> Result<BoxDef, ContentError> {
        self.check_attributes(node, &["position", "size", "color"])?;
        Ok(BoxDef {
            position: self.vec3(node, self.required_attribute(node, "position")?)?,
            size: self.size(node)?,
            color: self.color_attribute(node, [140, 110, 80, 255])?,
        })
    }

    fn prop_def(&self, node: Node<'_, '_>) -> Result<PropDef, ContentError> {
        self.check_attributes(node, &["position", "size", "mass", "friction", "color"])?;
        let mass = match node.attribute("mass") {
            Some(value) => self.f32_value(node, value)?,
            None => 1.0,
        };
        if mass <= 0.0 {
            return Err(self.invalid_value(node, "prop mass must be > 0".to_string()));
        }
        let friction = match node.attribute("friction") {
            Some(value) => self.f32_value(node, value)?,
            None => 0.5,
        };
        if friction < 0.0 {
            return Err(self.invalid_value(node, "prop friction must be >= 0".to_string()));
        }
        Ok(PropDef {
            position: self.vec3(node, self.required_attribute(node, "position")?)?,
            size: self.size(node)?,
            mass,
            friction,
            color: self.color_attribute(node, [200, 160, 60, 255])?,
        })
    }

    fn pickup_def(&self, node: Node<'_, '_>) -> Result<PickupDef, ContentError> {
        self.check_attributes(node, &["position", "radius", "color"])?;
        let radius = match node.attribute("radius") {
            Some(value) => self.f32_value(node, value)?,
            None => 0.5,
        };
        if radius <= 0.0 {
            return Err(self.invalid_value(node, "pickup radius must be > 0".to_string()));
        }
        Ok(PickupDef {
            position: self.vec3(node, self.required_attribute(node, "position")?)?,
            radius,
            color: self.color_attribute(node, [250, 220, 40, 255])?,
        })
    }

    fn size(&self, node: Node<'_, '_>) -> Result<Vec3, ContentError> {
        let size = self.vec3(node, self.required_attribute(node, "size")?)?;
        if !size.cmpgt(Vec3::ZERO).all() {
            return Err(self.invalid_value(node, "size components must be > 0".to_string()));
        }
        Ok(size)
    }

    fn color_attribute(&self, node: Node<'_, '_>, fallback: Rgba) -> Result<Rgba, ContentError> {
        match node.attribute("color") {
            Some(value) => self.color(node, value),
            None => Ok(fallback),
        }
    }

    fn optional_key(&self, node: Node<'_, '_>) -> Result<Option<String>, ContentError> {
        let value = self.required_text(node)?;
        Ok((value != "none").then_some(value))
    }

    fn required_text(&self, node: Node<'_, '_>) -> Result<String, ContentError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", node.tag_name().name()),
                node,
            ));
        }
        Ok(value)
    }

    fn required_attribute<'n>(
        &self,
        node: Node<'n, '_>,
        attribute: &str,
    ) -> Result<&'n str, ContentError> {
        node.attribute(attribute).ok_or_else(|| {
            self.error_at(
                ContentErrorCode::MissingField,
                format!(
                    "missing required attribute '{attribute}' on <{}>",
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    fn check_attributes(&self, node: Node<'_, '_>, allowed: &[&str]) -> Result<(), ContentError> {
        if let Some(child) = elements(node).next() {
            return Err(self.unknown_field(child, node.tag_name().name()));
        }
        match node
            .attributes()
            .find(|attribute| !allowed.contains(&attribute.name()))
        {
            Some(unknown) => Err(self.error_at(
                ContentErrorCode::UnknownField,
                format!(
                    "unknown attribute '{}' on <{}>",
                    unknown.name(),
                    node.tag_name().name()
                ),
                node,
            )),
            None => Ok(()),
        }
    }

    fn bool_text(&self, node: Node<'_, '_>) -> Result<bool, ContentError> {
        let value = self.required_text(node)?;
        match value.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(self.invalid_value(
                node,
                format!("'{value}' is not a boolean; allowed values: true, false"),
            )),
        }
    }

    fn f32_text(&self, node: Node<'_, '_>) -> Result<f32, ContentError> {
        let value = self.required_text(node)?;
        self.f32_value(node, &value)
    }

    fn positive_text(&self, node: Node<'_, '_>) -> Result<f32, ContentError> {
        let value = self.f32_text(node)?;
        if value <= 0.0 {
            return Err(self.invalid_value(
                node,
                format!("<{}> must be > 0", node.tag_name().name()),
            ));
        }
        Ok(value)
    }

    fn non_negative_text(&self, node: Node<'_, '_>) -> Result<f32, ContentError> {
        let value = self.f32_text(node)?;
        if value < 0.0 {
            return Err(self.invalid_value(
                node,
                format!("<{}> must be >= 0", node.tag_name().name()),
            ));
        }
        Ok(value)
    }

    fn f32_value(&self, node: Node<'_, '_>, value: &str) -> Result<f32, ContentError> {
        match value.trim().parse::<f32>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ => Err(self.invalid_value(node, format!("'{value}' is not a valid finite number"))),
        }
    }

    fn vec3(&self, node: Node<'_, '_>, value: &str) -> Result<Vec3, ContentError> {
        let parts = value
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| self.f32_value(node, part))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(self.invalid_value(
                node,
                format!("'{value}' must contain exactly three numbers"),
            )),
        }
    }

    fn color(&self, node: Node<'_, '_>, value: &str) -> Result<Rgba, ContentError> {
        parse_hex_color(value).ok_or_else(|| {
            self.invalid_value(
                node,
                format!("'{value}' is not a colour; expected #rrggbb or #rrggbbaa"),
            )
        })
    }

    fn unknown_field(&self, node: Node<'_, '_>, parent: &str) -> ContentError {
        self.error_at(
            ContentErrorCode::UnknownField,
            format!("unknown field <{}> in <{parent}>", node.tag_name().name()),
            node,
        )
    }

    fn missing_field(&self, node: Node<'_, '_>, field: &str, parent: &str) -> ContentError {
        self.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{field}> in <{parent}>"),
            node,
        )
    }

    fn invalid_value(&self, node: Node<'_, '_>, message: String) -> ContentError {
        self.error_at(ContentErrorCode::InvalidValue, message, node)
    }

    fn error_at(&self, code: ContentErrorCode, message: String, node: Node<'_, '_>) -> ContentError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

struct FieldTracker {
    parent: &'static str,
    seen: HashSet<String>,
}

impl FieldTracker {
    fn new(parent: &'static str) -> Self {
        Self {
            parent,
            seen: HashSet::new(),
        }
    }

    fn insert(&mut self, parser: &DefParser<'_, '_>, field: Node<'_, '_>) -> Result<(), ContentError> {
        let name = field.tag_name().name();
        if self.seen.insert(name.to_string()) {
            return Ok(());
        }
        Err(parser.error_at(
            ContentErrorCode::DuplicateField,
            format!("duplicate field <{name}> in <{}>", self.parent),
            field,
        ))
    }
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

pub fn parse_hex_color(value: &str) -> Option<Rgba> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }
    let channel = |index: usize| u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16).ok();
    let alpha = if hex.len() == 8 { channel(3)? } else { 255 };
    Some([channel(0)?, channel(1)?, channel(2)?, alpha])
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use tempfile::TempDir;

    use super::*;

    fn parse(raw: &str) -> Result<SceneDef, ContentError> {
        parse_scene_def(raw, Path::new("scenes/test.xml"))
    }

    #[test]
    fn minimal_def_gets_defaults() {
        let def = parse("<SceneDef><name>empty</name></SceneDef>").expect("parse");
        assert_eq!(def.name, "empty");
        assert_eq!(def.clear_color, DEFAULT_CLEAR_COLOR);
        assert!(!def.deferred);
        assert_eq!(def.ground, GroundDef::default());
        assert!(def.actor.is_none());
        assert_eq!(def.locomotion, LocomotionConfig::default());
    }

    #[test]
    fn full_def_parses_every_section() {
        let def = parse(
            r##"<SceneDef>
                <name>village</name>
                <clearColor>#102030</clearColor>
                <deferred>true</deferred>
                <ground>
                    <size>30</size>
                    <heightmap>heightmaps/village.png</heightmap>
                    <maxHeight>4</maxHeight>
                </ground>
                <actor>
                    <model>models/ybot.json</model>
                    <spawn>1, 2, 3</spawn>
                    <killHeight>-5</killHeight>
                </actor>
                <locomotion>
                    <mode>physics</mode>
                    <oppositeKeys>accumulate</oppositeKeys>
                    <boostSpeed>8</boostSpeed>
                    <jumpKey>none</jumpKey>
                    <gravity>0 -20 0</gravity>
                    <bind keys="w, ArrowUp" direction="0 0 -1" facing="180"/>
                    <clips run="Sprint"/>
                </locomotion>
                <box position="0 1 5" size="2 2 2" color="#ff0000"/>
                <box position="4 1 5" size="1 2 1"/>
                <prop position="0 3 0" size="1 1 1" mass="2" friction="0.8"/>
                <pickup position="3 0.5 3" radius="0.4"/>
            </SceneDef>"##,
        )
        .expect("parse");

        assert_eq!(def.clear_color, [0x10, 0x20, 0x30, 255]);
        assert!(def.deferred);
        assert_eq!(def.ground.size, 30.0);
        assert_eq!(def.ground.heightmap.as_deref(), Some("heightmaps/village.png"));
        assert_eq!(def.ground.terrain_size, DEFAULT_TERRAIN_SIZE);
        let actor = def.actor.expect("actor");
        assert_eq!(actor.spawn, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(actor.kill_height, -5.0);

        let locomotion = &def.locomotion;
        assert_eq!(
            locomotion.mode,
            MotionMode::Physics {
                gravity: Vec3::new(0.0, -20.0, 0.0)
            }
        );
        assert_eq!(locomotion.opposite_keys, OppositeKeyPolicy::Accumulate);
        assert_eq!(locomotion.boost_speed, 8.0);
        assert_eq!(locomotion.jump_key, None);
        assert_eq!(locomotion.bindings.len(), 1);
        assert_eq!(locomotion.bindings[0].keys, vec!["w", "ArrowUp"]);
        assert!((locomotion.bindings[0].facing - PI).abs() < 1e-6);
        assert_eq!(locomotion.clips.run, "Sprint");
        assert_eq!(locomotion.clips.walk, "YBot_Walk");

        assert_eq!(def.boxes.len(), 2);
        assert_eq!(def.boxes[0].color, [255, 0, 0, 255]);
        assert_eq!(def.props[0].mass, 2.0);
        assert_eq!(def.pickups[0].radius, 0.4);
    }

    #[test]
    fn missing_name_reports_location() {
        let err = parse("<SceneDef><deferred>false</deferred></SceneDef>").expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert_eq!(err.location, Some(SourceLocation { line: 1, column: 1 }));
        assert!(err.to_string().contains("scenes/test.xml"));
    }

    #[test]
    fn wrong_root_is_rejected() {
        let err = parse("<Defs/>").expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidRoot);
    }

    #[test]
    fn duplicate_field_errors() {
        let err = parse("<SceneDef><name>a</name><name>b</name></SceneDef>").expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateField);
    }

    #[test]
    fn unknown_field_and_attribute_error() {
        let err = parse("<SceneDef><name>a</name><weather>rain</weather></SceneDef>")
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);

        let err = parse(r#"<SceneDef><name>a</name><box position="0 0 0" size="1 1 1" spin="1"/></SceneDef>"#)
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);
    }

    #[test]
    fn invalid_values_error() {
        for raw in [
            "<SceneDef><name>a</name><locomotion><mode>teleport</mode></locomotion></SceneDef>",
            "<SceneDef><name>a</name><locomotion><baseSpeed>-1</baseSpeed></locomotion></SceneDef>",
            "<SceneDef><name>a</name><ground><size>abc</size></ground></SceneDef>",
            "<SceneDef><name>a</name><clearColor>blue</clearColor></SceneDef>",
            r#"<SceneDef><name>a</name><pickup position="0 0" /></SceneDef>"#,
            r#"<SceneDef><name>a</name><box position="0 0 0" size="1 0 1"/></SceneDef>"#,
            r#"<SceneDef><name>a</name><locomotion><bind keys="w" direction="0 0 0" facing="0"/></locomotion></SceneDef>"#,
        ] {
            let err = parse(raw).expect_err(raw);
            assert_eq!(err.code, ContentErrorCode::InvalidValue, "{raw}");
        }
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = parse("<SceneDef><name>a</SceneDef>").expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn hex_colours_parse_with_optional_alpha() {
        assert_eq!(parse_hex_color("#0a0b0c"), Some([10, 11, 12, 255]));
        assert_eq!(parse_hex_color("#0a0b0c80"), Some([10, 11, 12, 128]));
        assert_eq!(parse_hex_color("0a0b0c"), None);
        assert_eq!(parse_hex_color("#0a0b"), None);
    }

    #[test]
    fn load_scene_defs_sorts_by_file_name_and_rejects_duplicates() {
        let temp = TempDir::new().expect("temp");
        fs::write(
            temp.path().join("b.xml"),
            "<SceneDef><name>second</name></SceneDef>",
        )
        .expect("write");
        fs::write(
            temp.path().join("a.xml"),
            "<SceneDef><name>first</name></SceneDef>",
        )
        .expect("write");
        fs::write(temp.path().join("notes.txt"), "ignored").expect("write");

        let defs = load_scene_defs(temp.path()).expect("load");
        let names = defs.iter().map(|def| def.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["first", "second"]);
        assert!(defs[0].source_path.ends_with("a.xml"));

        fs::write(
            temp.path().join("c.xml"),
            "<SceneDef><name>first</name></SceneDef>",
        )
        .expect("write");
        let err = load_scene_defs(temp.path()).expect_err("duplicate");
        assert_eq!(err.code, ContentErrorCode::DuplicateScene);
    }

    #[test]
    fn missing_directory_is_a_read_error() {
        let temp = TempDir::new().expect("temp");
        let err = load_scene_defs(&temp.path().join("nope")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::ReadDir);
    }
}
