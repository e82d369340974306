use std::convert::Infallible;
use std::path::Path;

use stage::app::{AppError, Deferred, LoopConfig, MenuMode, Scene, SceneRegistry, SceneTarget};
use stage::content::{load_scene_defs, SceneDef};
use stage::resolve_app_paths;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::scenes::{LocomotionScene, MenuScene, ShowcaseScene};

const START_SCENE_ENV_VAR: &str = "STAGE_START_SCENE";
const MENU_MODE_ENV_VAR: &str = "STAGE_MENU_MODE";
const SCENES_ENV_VAR: &str = "STAGE_SCENES";
const SHOWCASE_SCENE_NAME: &str = "showcase";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) registry: SceneRegistry,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Stage Startup ===");

    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        assets_dir = %app_paths.assets_dir.display(),
        scenes_dir = %app_paths.scenes_dir.display(),
        "startup"
    );

    let menu_mode = parse_menu_mode(std::env::var(MENU_MODE_ENV_VAR).ok().as_deref());
    let filter = parse_scene_filter(std::env::var(SCENES_ENV_VAR).ok().as_deref());
    let defs = filter_scene_defs(load_scene_defs(&app_paths.scenes_dir)?, &filter);
    info!(count = defs.len(), mode = ?menu_mode, "scene_defs_loaded");

    let registry = build_registry(menu_mode, defs, &app_paths.assets_dir);
    let start_scene = resolve_start_scene(
        std::env::var(START_SCENE_ENV_VAR).ok().as_deref(),
        &registry,
    );
    let config = LoopConfig {
        menu_mode,
        start_scene,
        ..LoopConfig::default()
    };

    Ok(AppWiring { config, registry })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

/// The showcase comes first, then one entry per scene definition. Deferred
/// definitions are built on a worker thread.
fn build_registry(menu_mode: MenuMode, defs: Vec<SceneDef>, assets_dir: &Path) -> SceneRegistry {
    let mut registry = SceneRegistry::new(menu_mode).with_menu(Box::new(MenuScene::new()));
    registry.register(SHOWCASE_SCENE_NAME, Box::new(ShowcaseScene::new(menu_mode)));

    for def in defs {
        let index = registry.len();
        let name = def.name.clone();
        if def.deferred {
            let assets_dir = assets_dir.to_path_buf();
            let slot = Deferred::spawn(format!("scene:{name}"), move || {
                let scene: Box<dyn Scene> =
                    Box::new(LocomotionScene::build(def, &assets_dir, index, menu_mode));
                Ok::<_, Infallible>(scene)
            });
            registry.register_deferred(name, slot);
        } else {
            let scene = LocomotionScene::build(def, assets_dir, index, menu_mode);
            registry.register(name, Box::new(scene));
        }
    }
    registry
}

fn parse_menu_mode(raw: Option<&str>) -> MenuMode {
    match raw.map(str::trim) {
        None | Some("") => MenuMode::default(),
        Some(value) if value.eq_ignore_ascii_case("overlay") => MenuMode::Overlay,
        Some(value) if value.eq_ignore_ascii_case("exclusive") => MenuMode::Exclusive,
        Some(value) => {
            warn!(
                env_var = MENU_MODE_ENV_VAR,
                value, "unknown menu mode; falling back to overlay"
            );
            MenuMode::Overlay
        }
    }
}

fn parse_scene_filter(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}

/// An empty filter keeps every definition.
fn filter_scene_defs(defs: Vec<SceneDef>, filter: &[String]) -> Vec<SceneDef> {
    if filter.is_empty() {
        return defs;
    }
    for wanted in filter {
        if !defs.iter().any(|def| &def.name == wanted) {
            warn!(env_var = SCENES_ENV_VAR, scene = %wanted, "filtered_scene_not_found");
        }
    }
    defs.into_iter()
        .filter(|def| filter.contains(&def.name))
        .collect()
}

/// Accepts a scene name, a 1-based position, or `menu`.
fn resolve_start_scene(raw: Option<&str>, registry: &SceneRegistry) -> Option<SceneTarget> {
    let value = raw.map(str::trim).filter(|value| !value.is_empty())?;
    if value.eq_ignore_ascii_case("menu") {
        return Some(SceneTarget::Menu);
    }
    if let Some(index) = registry.index_of(value) {
        return Some(SceneTarget::Index(index));
    }
    match value.parse::<usize>() {
        Ok(position) if position >= 1 && position <= registry.len() => {
            Some(SceneTarget::Index(position - 1))
        }
        _ => {
            warn!(
                env_var = START_SCENE_ENV_VAR,
                value, "unknown start scene; using the default"
            );
            None
        }
    }
}
