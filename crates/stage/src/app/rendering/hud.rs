use crate::app::LoopMetricsSnapshot;

use super::text::{line_advance, text_width};
use super::{Frame, Rgba};

const HUD_TEXT_SCALE: i32 = 2;
const HUD_PADDING: i32 = 8;
const HUD_INSET: i32 = 6;
const HUD_TEXT_PRIMARY_COLOR: Rgba = [244, 248, 252, 255];
const HUD_TEXT_DIM_COLOR: Rgba = [176, 198, 220, 255];
const HUD_PANEL_BG_COLOR: Rgba = [10, 12, 16, 200];
const HUD_PANEL_BORDER_COLOR: Rgba = [92, 106, 126, 255];

#[derive(Debug, Clone, Default)]
pub struct HudData {
    pub metrics: LoopMetricsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub active_scene: String,
    pub scene_lines: Vec<String>,
}

pub fn hud_lines(data: &HudData) -> Vec<String> {
    let cap = match data.render_fps_cap {
        Some(cap) => cap.to_string(),
        None => "off".to_string(),
    };
    let mut lines = vec![
        format!(
            "FPS {:.0} (CAP {}) TPS {:.0} FRAME {:.1}MS",
            data.metrics.fps, cap, data.metrics.tps, data.metrics.frame_time_ms
        ),
        format!("SCENE {}", data.active_scene),
    ];
    lines.extend(data.scene_lines.iter().cloned());
    lines
}

/// Debug panel in the top-left corner, drawn over everything else.
pub fn draw_hud(frame: &mut Frame<'_>, data: &HudData) {
    let lines = hud_lines(data);
    let widest = lines
        .iter()
        .map(|line| text_width(line, HUD_TEXT_SCALE))
        .max()
        .unwrap_or(0);
    let panel_width = widest + HUD_INSET * 2;
    let panel_height = lines.len() as i32 * line_advance(HUD_TEXT_SCALE) + HUD_INSET * 2;
    let left = HUD_PADDING - HUD_INSET;
    let top = HUD_PADDING - HUD_INSET;
    frame.fill_rect(left, top, panel_width, panel_height, HUD_PANEL_BG_COLOR);
    frame.outline_rect(left, top, panel_width, panel_height, HUD_PANEL_BORDER_COLOR);

    let mut y = HUD_PADDING;
    for (index, line) in lines.iter().enumerate() {
        let color = if index < 2 {
            HUD_TEXT_PRIMARY_COLOR
        } else {
            HUD_TEXT_DIM_COLOR
        };
        frame.draw_text(HUD_PADDING, y, line, HUD_TEXT_SCALE, color);
        y += line_advance(HUD_TEXT_SCALE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_start_with_metrics_and_scene() {
        let data = HudData {
            metrics: LoopMetricsSnapshot {
                fps: 59.6,
                tps: 60.0,
                frame_time_ms: 16.7,
            },
            render_fps_cap: None,
            active_scene: "village".to_string(),
            scene_lines: vec!["ACTOR IDLE".to_string()],
        };
        let lines = hud_lines(&data);
        assert_eq!(lines[0], "FPS 60 (CAP off) TPS 60 FRAME 16.7MS");
        assert_eq!(lines[1], "SCENE village");
        assert_eq!(lines[2], "ACTOR IDLE");
    }

    #[test]
    fn panel_draws_inside_small_frames_without_panicking() {
        let mut pixels = vec![0u8; 20 * 10 * 4];
        let mut frame = Frame::new(&mut pixels, 20, 10);
        draw_hud(&mut frame, &HudData::default());
        assert_ne!(frame.pixel(2, 2), Some([0, 0, 0, 0]));
    }
}
