mod draw;
mod locomotion;
mod menu;
mod showcase;

use stage::app::{InputSnapshot, MenuMode, SceneCommand, SceneTarget};

pub(crate) use locomotion::LocomotionScene;
pub(crate) use menu::MenuScene;
pub(crate) use showcase::ShowcaseScene;

/// `M` returns to the menu screen; only meaningful in exclusive mode.
pub(crate) fn menu_shortcut(menu_mode: MenuMode, input: &InputSnapshot) -> SceneCommand {
    if menu_mode == MenuMode::Exclusive && input.keys().was_pressed("m") {
        SceneCommand::SwitchTo(SceneTarget::Menu)
    } else {
        SceneCommand::None
    }
}
