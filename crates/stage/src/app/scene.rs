use tracing::{info, warn};

use super::deferred::{Deferred, DeferredState};
use super::input::KeyState;
use super::rendering::{Frame, Rgba};

pub const DEFAULT_CLEAR_COLOR: Rgba = [51, 51, 77, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneTarget {
    /// The menu scene itself; only selectable in [`MenuMode::Exclusive`].
    Menu,
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneTarget),
    HardResetTo(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuMode {
    #[default]
    Overlay,
    Exclusive,
}

#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    keys: KeyState,
    cursor_position_px: Option<(f32, f32)>,
    pointer_pressed: bool,
    pointer_released: bool,
    zoom_delta_steps: i32,
    window_width: u32,
    window_height: u32,
    audio_unlocked: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_keys(mut self, keys: KeyState) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<(f32, f32)>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_pointer_pressed(mut self, pointer_pressed: bool) -> Self {
        self.pointer_pressed = pointer_pressed;
        self
    }

    pub fn with_pointer_released(mut self, pointer_released: bool) -> Self {
        self.pointer_released = pointer_released;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn with_audio_unlocked(mut self, audio_unlocked: bool) -> Self {
        self.audio_unlocked = audio_unlocked;
        self
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    pub fn cursor_position_px(&self) -> Option<(f32, f32)> {
        self.cursor_position_px
    }

    pub fn pointer_pressed(&self) -> bool {
        self.pointer_pressed
    }

    pub fn pointer_released(&self) -> bool {
        self.pointer_released
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn audio_unlocked(&self) -> bool {
        self.audio_unlocked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub name: String,
    pub state: DeferredState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatus {
    pub mode: MenuMode,
    pub active: Option<SceneTarget>,
    pub entries: Vec<EntryStatus>,
}

pub trait Scene: Send {
    fn load(&mut self);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn render(&mut self, frame: &mut Frame<'_>);
    fn unload(&mut self);
    fn clear_color(&self) -> Rgba {
        DEFAULT_CLEAR_COLOR
    }
    fn debug_title(&self) -> Option<String> {
        None
    }
    fn debug_lines(&self) -> Vec<String> {
        Vec::new()
    }
    fn on_registry_changed(&mut self, _status: &RegistryStatus) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { overlay: bool },
    /// The active entry is still building or failed to build.
    Skipped { overlay: bool },
    NothingActive { overlay: bool },
}

struct SceneEntry {
    name: String,
    slot: Deferred<Box<dyn Scene>>,
    is_loaded: bool,
    warned_unavailable: bool,
}

struct MenuRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl MenuRuntime {
    fn loaded(&mut self) -> &mut Box<dyn Scene> {
        if !self.is_loaded {
            self.scene.load();
            self.is_loaded = true;
        }
        &mut self.scene
    }
}

/// Independently built scenes, one of which is active at a time, plus an
/// optional menu scene.
pub struct SceneRegistry {
    entries: Vec<SceneEntry>,
    menu: Option<MenuRuntime>,
    mode: MenuMode,
    active: Option<SceneTarget>,
}

impl SceneRegistry {
    pub fn new(mode: MenuMode) -> Self {
        Self {
            entries: Vec::new(),
            menu: None,
            mode,
            active: None,
        }
    }

    pub fn with_menu(mut self, menu: Box<dyn Scene>) -> Self {
        self.menu = Some(MenuRuntime {
            scene: menu,
            is_loaded: false,
        });
        self
    }

    pub fn register(&mut self, name: impl Into<String>, scene: Box<dyn Scene>) -> usize {
        let name = name.into();
        let slot = Deferred::ready(name.clone(), scene);
        self.push_entry(name, slot)
    }

    pub fn register_deferred(
        &mut self,
        name: impl Into<String>,
        slot: Deferred<Box<dyn Scene>>,
    ) -> usize {
        self.push_entry(name.into(), slot)
    }

    fn push_entry(&mut self, name: String, slot: Deferred<Box<dyn Scene>>) -> usize {
        self.entries.push(SceneEntry {
            name,
            slot,
            is_loaded: false,
            warned_unavailable: false,
        });
        self.entries.len() - 1
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_menu(&self) -> bool {
        self.menu.is_some()
    }

    pub fn active(&self) -> Option<SceneTarget> {
        self.active
    }

    pub fn entry_name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.name.as_str())
    }

    pub fn entry_state(&self, index: usize) -> Option<DeferredState> {
        self.entries.get(index).map(|entry| entry.slot.state())
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|entry| entry.is_loaded)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn status(&self) -> RegistryStatus {
        RegistryStatus {
            mode: self.mode,
            active: self.active,
            entries: self
                .entries
                .iter()
                .map(|entry| EntryStatus {
                    name: entry.name.clone(),
                    state: entry.slot.state(),
                })
                .collect(),
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        match self.active? {
            SceneTarget::Menu => Some("menu"),
            SceneTarget::Index(index) => self.entry_name(index),
        }
    }

    /// Invalid targets are rejected and leave the registry untouched.
    pub fn set_active(&mut self, target: SceneTarget) -> bool {
        if let Err(reason) = self.validate_target(target) {
            warn!(requested = ?target, count = self.entries.len(), reason, "scene_switch_rejected");
            return false;
        }
        if self.active == Some(target) {
            return true;
        }

        if self.mode == MenuMode::Overlay {
            if let Some(menu) = self.menu.as_mut() {
                menu.loaded();
            }
        }
        match target {
            SceneTarget::Menu => {
                if let Some(menu) = self.menu.as_mut() {
                    menu.loaded();
                }
            }
            SceneTarget::Index(index) => self.load_entry_if_ready(index),
        }

        let from = self.active;
        self.active = Some(target);
        info!(from = ?from, to = ?target, "scene_switched");
        self.notify_menu();
        true
    }

    fn validate_target(&self, target: SceneTarget) -> Result<(), &'static str> {
        match target {
            SceneTarget::Menu if self.mode != MenuMode::Exclusive => {
                Err("menu is only a switch target in exclusive mode")
            }
            SceneTarget::Menu if self.menu.is_none() => Err("no menu scene registered"),
            SceneTarget::Menu => Ok(()),
            SceneTarget::Index(index) if index >= self.entries.len() => {
                Err("scene index out of range")
            }
            SceneTarget::Index(_) => Ok(()),
        }
    }

    /// Checks every pending entry once; newly ready entries that are active
    /// get loaded immediately. An active entry that fails in exclusive mode
    /// hands control back to the menu.
    pub fn poll_pending(&mut self) {
        let mut changed = false;
        let mut failed_active = None;
        for index in 0..self.entries.len() {
            let entry = &mut self.entries[index];
            if entry.slot.state() != DeferredState::Pending {
                continue;
            }
            entry.slot.poll();
            let failed = match entry.slot.state() {
                DeferredState::Pending => continue,
                DeferredState::Ready => {
                    info!(scene = %entry.name, index, "scene_ready");
                    entry.warned_unavailable = false;
                    false
                }
                DeferredState::Failed => true,
            };
            changed = true;
            if self.active != Some(SceneTarget::Index(index)) {
                continue;
            }
            if failed {
                failed_active = Some(index);
            } else {
                self.load_entry_if_ready(index);
            }
        }

        match failed_active {
            Some(index) if self.mode == MenuMode::Exclusive && self.menu.is_some() => {
                warn!(index, "active_scene_failed_returning_to_menu");
                self.set_active(SceneTarget::Menu);
            }
            _ if changed => self.notify_menu(),
            _ => {}
        }
    }

    fn menu_visible(&self) -> bool {
        match self.active {
            Some(SceneTarget::Index(index)) => {
                self.mode == MenuMode::Overlay || !self.is_loaded(index)
            }
            Some(SceneTarget::Menu) | None => true,
        }
    }

    /// Returns true when the active scene changed or was reset.
    pub fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> bool {
        self.poll_pending();

        let scene_command = match self.active {
            Some(SceneTarget::Index(index)) => self
                .ready_loaded_scene(index)
                .map_or(SceneCommand::None, |scene| {
                    scene.update(fixed_dt_seconds, input)
                }),
            Some(SceneTarget::Menu) | None => SceneCommand::None,
        };
        let menu_visible = self.menu_visible();
        let menu_command = match self.menu.as_mut() {
            Some(menu) if menu_visible => menu.loaded().update(fixed_dt_seconds, input),
            _ => SceneCommand::None,
        };

        let scene_changed = self.apply_command(scene_command);
        let menu_changed = self.apply_command(menu_command);
        scene_changed || menu_changed
    }

    pub fn apply_command(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::SwitchTo(target) => {
                let before = self.active;
                self.set_active(target) && before != self.active
            }
            SceneCommand::HardResetTo(index) => self.hard_reset(index),
        }
    }

    /// Clears with the active scene's colour, renders it, then composites the
    /// overlay menu on top without clearing.
    pub fn render_frame(&mut self, frame: &mut Frame<'_>) -> RenderOutcome {
        let Some(active) = self.active else {
            frame.clear(DEFAULT_CLEAR_COLOR);
            let overlay = self.composite_menu(frame);
            return RenderOutcome::NothingActive { overlay };
        };

        let rendered = match active {
            SceneTarget::Menu => match self.menu.as_mut() {
                Some(menu) => {
                    let scene = menu.loaded();
                    frame.clear(scene.clear_color());
                    scene.render(frame);
                    return RenderOutcome::Rendered { overlay: false };
                }
                None => false,
            },
            SceneTarget::Index(index) => self.render_entry(index, frame),
        };

        let overlay = (self.mode == MenuMode::Overlay || !rendered) && self.composite_menu(frame);
        if rendered {
            RenderOutcome::Rendered { overlay }
        } else {
            RenderOutcome::Skipped { overlay }
        }
    }

    fn composite_menu(&mut self, frame: &mut Frame<'_>) -> bool {
        match self.menu.as_mut() {
            Some(menu) => {
                menu.loaded().render(frame);
                true
            }
            None => false,
        }
    }

    fn render_entry(&mut self, index: usize, frame: &mut Frame<'_>) -> bool {
        self.load_entry_if_ready(index);
        let Some(entry) = self.entries.get_mut(index) else {
            frame.clear(DEFAULT_CLEAR_COLOR);
            return false;
        };
        match entry.slot.get_mut() {
            Some(scene) if entry.is_loaded => {
                frame.clear(scene.clear_color());
                scene.render(frame);
                true
            }
            _ => {
                if !entry.warned_unavailable {
                    warn!(
                        scene = %entry.name,
                        index,
                        state = ?entry.slot.state(),
                        reason = entry.slot.failure_reason().unwrap_or("still loading"),
                        "scene_not_ready"
                    );
                    entry.warned_unavailable = true;
                }
                frame.clear(DEFAULT_CLEAR_COLOR);
                false
            }
        }
    }

    pub fn hard_reset(&mut self, index: usize) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            warn!(index, count = self.entries.len(), "scene_reset_rejected");
            return false;
        };
        let Some(scene) = entry.slot.get_mut() else {
            warn!(scene = %entry.name, index, "scene_reset_not_ready");
            return false;
        };
        if entry.is_loaded {
            scene.unload();
        }
        scene.load();
        entry.is_loaded = true;
        info!(scene = %entry.name, index, "scene_hard_reset");

        if self.active != Some(SceneTarget::Index(index)) {
            self.active = Some(SceneTarget::Index(index));
            self.notify_menu();
        }
        true
    }

    pub fn shutdown_all(&mut self) {
        for entry in &mut self.entries {
            if !entry.is_loaded {
                continue;
            }
            if let Some(scene) = entry.slot.get_mut() {
                scene.unload();
            }
            entry.is_loaded = false;
        }
        if let Some(menu) = self.menu.as_mut() {
            if menu.is_loaded {
                menu.scene.unload();
                menu.is_loaded = false;
            }
        }
        info!(count = self.entries.len(), "scenes_shut_down");
    }

    pub fn active_debug_title(&self) -> Option<String> {
        match self.active? {
            SceneTarget::Menu => self.menu.as_ref()?.scene.debug_title(),
            SceneTarget::Index(index) => self.entries.get(index)?.slot.get()?.debug_title(),
        }
    }

    pub fn active_debug_lines(&self) -> Vec<String> {
        let lines = match self.active {
            Some(SceneTarget::Menu) => self.menu.as_ref().map(|menu| menu.scene.debug_lines()),
            Some(SceneTarget::Index(index)) => self
                .entries
                .get(index)
                .and_then(|entry| entry.slot.get())
                .map(|scene| scene.debug_lines()),
            None => None,
        };
        lines.unwrap_or_default()
    }

    fn load_entry_if_ready(&mut self, index: usize) {
        let Some(entry) = self.entries.get_mut(index) else {
            return;
        };
        if entry.is_loaded {
            return;
        }
        if let Some(scene) = entry.slot.poll() {
            scene.load();
            entry.is_loaded = true;
            info!(scene = %entry.name, index, "scene_loaded");
        }
    }

    fn ready_loaded_scene(&mut self, index: usize) -> Option<&mut Box<dyn Scene>> {
        let entry = self.entries.get_mut(index)?;
        if !entry.is_loaded {
            return None;
        }
        entry.slot.get_mut()
    }

    fn notify_menu(&mut self) {
        let status = self.status();
        if let Some(menu) = self.menu.as_mut() {
            menu.scene.on_registry_changed(&status);
        }
    }
}
