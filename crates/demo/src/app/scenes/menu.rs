use stage::app::{
    DeferredState, Frame, InputSnapshot, MenuMode, RegistryStatus, Rgba, Scene, SceneCommand,
    SceneTarget, Viewport,
};
use tracing::{debug, info};

use super::draw::{
    draw_button, draw_centered_text, ScreenRect, HIGHLIGHT_COLOR, PANEL_COLOR, TEXT_COLOR,
    TEXT_DIM_COLOR,
};

const BUTTON_WIDTH: i32 = 180;
const BUTTON_HEIGHT: i32 = 32;
const BUTTON_GAP: i32 = 8;
const BAR_MARGIN: i32 = 8;
const MAX_HOTKEYS: usize = 9;
const MENU_CLEAR_COLOR: Rgba = [24, 26, 36, 255];
const PENDING_BUTTON_COLOR: Rgba = [60, 60, 70, 230];
const FAILED_BUTTON_COLOR: Rgba = [110, 40, 40, 230];

#[derive(Debug, Clone, PartialEq, Eq)]
struct MenuButton {
    label: String,
    target: SceneTarget,
    state: DeferredState,
}

/// Scene picker. Drawn as a button bar over the active scene in overlay
/// mode, or as a full screen of its own in exclusive mode.
pub(crate) struct MenuScene {
    mode: MenuMode,
    active: Option<SceneTarget>,
    buttons: Vec<MenuButton>,
    audio_unlocked: bool,
    viewport: Viewport,
}

impl MenuScene {
    pub(crate) fn new() -> Self {
        Self {
            mode: MenuMode::Overlay,
            active: None,
            buttons: Vec::new(),
            audio_unlocked: false,
            viewport: Viewport {
                width: 0,
                height: 0,
            },
        }
    }

    fn button_rect(&self, index: usize) -> ScreenRect {
        match self.mode {
            MenuMode::Overlay => ScreenRect {
                x: BAR_MARGIN + index as i32 * (BUTTON_WIDTH + BUTTON_GAP),
                y: self.viewport.height as i32 - BAR_MARGIN - BUTTON_HEIGHT,
                width: BUTTON_WIDTH,
                height: BUTTON_HEIGHT,
            },
            MenuMode::Exclusive => {
                let column_height =
                    self.buttons.len() as i32 * (BUTTON_HEIGHT + BUTTON_GAP) - BUTTON_GAP;
                ScreenRect {
                    x: (self.viewport.width as i32 - BUTTON_WIDTH) / 2,
                    y: (self.viewport.height as i32 - column_height) / 2
                        + index as i32 * (BUTTON_HEIGHT + BUTTON_GAP),
                    width: BUTTON_WIDTH,
                    height: BUTTON_HEIGHT,
                }
            }
        }
    }

    fn clicked_button(&self, input: &InputSnapshot) -> Option<&MenuButton> {
        if !input.pointer_released() {
            return None;
        }
        let (px, py) = input.cursor_position_px()?;
        self.buttons
            .iter()
            .enumerate()
            .find(|(index, _)| self.button_rect(*index).contains(px, py))
            .map(|(_, button)| button)
    }

    fn hotkey_button(&self, input: &InputSnapshot) -> Option<&MenuButton> {
        self.buttons
            .iter()
            .take(MAX_HOTKEYS)
            .enumerate()
            .find(|(index, _)| input.keys().was_pressed(&(index + 1).to_string()))
            .map(|(_, button)| button)
    }

    fn button_fill(&self, button: &MenuButton) -> Rgba {
        if Some(button.target) == self.active {
            return HIGHLIGHT_COLOR;
        }
        match button.state {
            DeferredState::Ready => PANEL_COLOR,
            DeferredState::Pending => PENDING_BUTTON_COLOR,
            DeferredState::Failed => FAILED_BUTTON_COLOR,
        }
    }
}

impl Scene for MenuScene {
    fn load(&mut self) {
        info!(buttons = self.buttons.len(), "menu_loaded");
    }

    fn update(&mut self, _fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        let (width, height) = input.window_size();
        self.viewport = Viewport { width, height };
        self.audio_unlocked = input.audio_unlocked();

        let chosen = self
            .clicked_button(input)
            .or_else(|| self.hotkey_button(input));
        match chosen {
            Some(button) => {
                debug!(target_scene = ?button.target, label = %button.label, "menu_choice");
                SceneCommand::SwitchTo(button.target)
            }
            None => SceneCommand::None,
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        self.viewport = frame.viewport();
        if self.mode == MenuMode::Exclusive {
            draw_centered_text(frame, 40, "STAGE", 4, TEXT_COLOR);
            draw_centered_text(frame, 80, "PICK A SCENE OR PRESS ITS NUMBER", 2, TEXT_DIM_COLOR);
        }
        for (index, button) in self.buttons.iter().enumerate() {
            let fill = self.button_fill(button);
            draw_button(frame, self.button_rect(index), &button.label, fill);
        }
        if !self.audio_unlocked {
            let y = match self.mode {
                MenuMode::Overlay => BAR_MARGIN,
                MenuMode::Exclusive => frame.height() as i32 - 40,
            };
            draw_centered_text(frame, y, "CLICK TO ENABLE AUDIO", 2, TEXT_COLOR);
        }
    }

    fn unload(&mut self) {
        info!("menu_unloaded");
    }

    fn clear_color(&self) -> Rgba {
        MENU_CLEAR_COLOR
    }

    fn debug_title(&self) -> Option<String> {
        (self.mode == MenuMode::Exclusive).then(|| "Stage | menu".to_string())
    }

    fn on_registry_changed(&mut self, status: &RegistryStatus) {
        self.mode = status.mode;
        self.active = status.active;
        self.buttons = status
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let suffix = match entry.state {
                    DeferredState::Ready => "",
                    DeferredState::Pending => " ...",
                    DeferredState::Failed => " !",
                };
                MenuButton {
                    label: format!("{} {}{}", index + 1, entry.name.to_uppercase(), suffix),
                    target: SceneTarget::Index(index),
                    state: entry.state,
                }
            })
            .collect();
    }
}
