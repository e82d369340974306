mod frame;
mod hud;
mod renderer;
mod text;
mod transform;

pub use frame::{Frame, Rgba};
pub use hud::{draw_hud, HudData};
pub use renderer::Renderer;
pub use text::{line_advance, text_width};
pub use transform::{
    pixels_per_unit, world_extent_to_px, world_to_screen, Viewport,
    PIXELS_PER_UNIT_AT_DEFAULT_RADIUS,
};
