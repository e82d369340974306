use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::content::ContentError;
use crate::StartupError;

use super::input::{KeyState, KEY_SHIFT, KEY_SPACE};
use super::metrics::MetricsAccumulator;
use super::rendering::{draw_hud, HudData, Renderer};
use super::scene::{InputSnapshot, MenuMode, RenderOutcome, SceneRegistry, SceneTarget};

pub const SLOW_FRAME_ENV_VAR: &str = "STAGE_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
    pub menu_mode: MenuMode,
    /// `None` starts on the menu in exclusive mode and on the first scene
    /// otherwise.
    pub start_scene: Option<SceneTarget>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Stage".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
            menu_mode: MenuMode::Overlay,
            start_scene: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to load scene definitions: {0}")]
    Content(#[from] ContentError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut registry: SceneRegistry) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let size = window.inner_size();
    let mut input_collector = InputCollector::new(size.width, size.height);

    if registry.mode() != config.menu_mode {
        warn!(
            configured = ?config.menu_mode,
            registry = ?registry.mode(),
            "menu_mode_mismatch"
        );
    }
    if let Some(start) = resolve_start_target(&registry, config.start_scene) {
        registry.set_active(start);
    }
    info!(
        mode = ?registry.mode(),
        scene_count = registry.len(),
        active = ?registry.active(),
        "registry_started"
    );

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut hud_visible = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => {
                    input_collector.release_all_keys();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    input_collector.handle_mouse_wheel(delta);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if input_collector.take_hud_toggle_pressed() {
                        hud_visible = !hud_visible;
                        info!(hud_visible, "hud_toggled");
                    }

                    if slow_frame_delay > Duration::ZERO {
                        // Debug perturbation only, separate from the FPS cap.
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        if registry.update(fixed_dt_seconds, &input_snapshot) {
                            info!(scene = ?registry.active_name(), "active_scene_changed");
                        }
                        metrics_accumulator.record_tick();
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    // Single authoritative FPS cap sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    {
                        let mut frame = renderer.frame();
                        let outcome = registry.render_frame(&mut frame);
                        if hud_visible {
                            let hud = HudData {
                                metrics: metrics_accumulator.latest(),
                                render_fps_cap: effective_render_cap,
                                active_scene: describe_active(&registry, outcome),
                                scene_lines: registry.active_debug_lines(),
                            };
                            draw_hud(&mut frame, &hud);
                        }
                    }
                    if let Err(error) = renderer.present() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = registry.active_debug_title();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            scene = ?registry.active_name(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                registry.shutdown_all();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn resolve_start_target(
    registry: &SceneRegistry,
    requested: Option<SceneTarget>,
) -> Option<SceneTarget> {
    if requested.is_some() {
        return requested;
    }
    if registry.mode() == MenuMode::Exclusive && registry.has_menu() {
        Some(SceneTarget::Menu)
    } else if registry.is_empty() {
        None
    } else {
        Some(SceneTarget::Index(0))
    }
}

fn describe_active(registry: &SceneRegistry, outcome: RenderOutcome) -> String {
    let name = registry.active_name().unwrap_or("none").to_string();
    match outcome {
        RenderOutcome::Skipped { .. } => format!("{name} (LOADING)"),
        RenderOutcome::Rendered { .. } | RenderOutcome::NothingActive { .. } => name,
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    keys: KeyState,
    hud_toggle_is_down: bool,
    hud_toggle_pressed_edge: bool,
    zoom_in_key_is_down: bool,
    zoom_out_key_is_down: bool,
    pending_zoom_steps: i32,
    cursor_position_px: Option<(f32, f32)>,
    left_mouse_is_down: bool,
    pointer_pressed_edge: bool,
    pointer_released_edge: bool,
    audio_unlocked: bool,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &winit::event::KeyEvent) {
        let PhysicalKey::Code(code) = key_event.physical_key else {
            return;
        };
        self.handle_key_code(code, key_event.state);
    }

    fn handle_key_code(&mut self, code: KeyCode, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        if let Some(name) = key_name(code) {
            self.keys.set(name, is_pressed);
        }
        match code {
            KeyCode::Escape if is_pressed => self.mark_quit_requested(),
            KeyCode::F3 => self.handle_hud_toggle_key_state(state),
            KeyCode::Equal | KeyCode::NumpadAdd => self.handle_zoom_in_key_state(state),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.handle_zoom_out_key_state(state),
            _ => {}
        }
    }

    fn release_all_keys(&mut self) {
        self.keys.release_all();
        self.hud_toggle_is_down = false;
        self.zoom_in_key_is_down = false;
        self.zoom_out_key_is_down = false;
        self.left_mouse_is_down = false;
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::empty()
            .with_keys(self.keys.clone())
            .with_cursor_position_px(self.cursor_position_px)
            .with_pointer_pressed(self.pointer_pressed_edge)
            .with_pointer_released(self.pointer_released_edge)
            .with_zoom_delta_steps(self.pending_zoom_steps)
            .with_window_size((self.window_width, self.window_height))
            .with_audio_unlocked(self.audio_unlocked);
        self.keys.clear_pressed();
        self.pointer_pressed_edge = false;
        self.pointer_released_edge = false;
        self.pending_zoom_steps = 0;
        snapshot
    }

    fn take_hud_toggle_pressed(&mut self) -> bool {
        let was_pressed = self.hud_toggle_pressed_edge;
        self.hud_toggle_pressed_edge = false;
        was_pressed
    }

    fn handle_hud_toggle_key_state(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.hud_toggle_is_down {
                    self.hud_toggle_pressed_edge = true;
                }
                self.hud_toggle_is_down = true;
            }
            ElementState::Released => self.hud_toggle_is_down = false,
        }
    }

    fn handle_zoom_in_key_state(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.zoom_in_key_is_down {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(1);
                }
                self.zoom_in_key_is_down = true;
            }
            ElementState::Released => self.zoom_in_key_is_down = false,
        }
    }

    fn handle_zoom_out_key_state(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.zoom_out_key_is_down {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_sub(1);
                }
                self.zoom_out_key_is_down = true;
            }
            ElementState::Released => self.zoom_out_key_is_down = false,
        }
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some((x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let steps = zoom_steps_from_scroll_delta(delta);
        self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(steps);
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.pointer_pressed_edge = true;
                    self.unlock_audio();
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => {
                if self.left_mouse_is_down {
                    self.pointer_released_edge = true;
                }
                self.left_mouse_is_down = false;
            }
        }
    }

    fn unlock_audio(&mut self) {
        if self.audio_unlocked {
            return;
        }
        self.audio_unlocked = true;
        info!("audio_unlocked");
    }
}

/// Layout-independent identifier for a physical key, as stored in
/// [`KeyState`].
pub fn key_name(code: KeyCode) -> Option<&'static str> {
    let name = match code {
        KeyCode::KeyA => "a",
        KeyCode::KeyB => "b",
        KeyCode::KeyC => "c",
        KeyCode::KeyD => "d",
        KeyCode::KeyE => "e",
        KeyCode::KeyF => "f",
        KeyCode::KeyG => "g",
        KeyCode::KeyH => "h",
        KeyCode::KeyI => "i",
        KeyCode::KeyJ => "j",
        KeyCode::KeyK => "k",
        KeyCode::KeyL => "l",
        KeyCode::KeyM => "m",
        KeyCode::KeyN => "n",
        KeyCode::KeyO => "o",
        KeyCode::KeyP => "p",
        KeyCode::KeyQ => "q",
        KeyCode::KeyR => "r",
        KeyCode::KeyS => "s",
        KeyCode::KeyT => "t",
        KeyCode::KeyU => "u",
        KeyCode::KeyV => "v",
        KeyCode::KeyW => "w",
        KeyCode::KeyX => "x",
        KeyCode::KeyY => "y",
        KeyCode::KeyZ => "z",
        KeyCode::Digit0 | KeyCode::Numpad0 => "0",
        KeyCode::Digit1 | KeyCode::Numpad1 => "1",
        KeyCode::Digit2 | KeyCode::Numpad2 => "2",
        KeyCode::Digit3 | KeyCode::Numpad3 => "3",
        KeyCode::Digit4 | KeyCode::Numpad4 => "4",
        KeyCode::Digit5 | KeyCode::Numpad5 => "5",
        KeyCode::Digit6 | KeyCode::Numpad6 => "6",
        KeyCode::Digit7 | KeyCode::Numpad7 => "7",
        KeyCode::Digit8 | KeyCode::Numpad8 => "8",
        KeyCode::Digit9 | KeyCode::Numpad9 => "9",
        KeyCode::ArrowUp => "ArrowUp",
        KeyCode::ArrowDown => "ArrowDown",
        KeyCode::ArrowLeft => "ArrowLeft",
        KeyCode::ArrowRight => "ArrowRight",
        KeyCode::ShiftLeft | KeyCode::ShiftRight => KEY_SHIFT,
        KeyCode::ControlLeft | KeyCode::ControlRight => "Control",
        KeyCode::Space => KEY_SPACE,
        KeyCode::Enter | KeyCode::NumpadEnter => "Enter",
        KeyCode::Tab => "Tab",
        KeyCode::Escape => "Escape",
        KeyCode::F3 => "F3",
        _ => return None,
    };
    Some(name)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

fn zoom_steps_from_scroll_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Frame, Scene, SceneCommand};

    struct Blank;

    impl Scene for Blank {
        fn load(&mut self) {}
        fn update(&mut self, _fixed_dt_seconds: f32, _input: &InputSnapshot) -> SceneCommand {
            SceneCommand::None
        }
        fn render(&mut self, _frame: &mut Frame<'_>) {}
        fn unload(&mut self) {}
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn movement_keys_are_held_across_ticks_until_released() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_key_code(KeyCode::KeyW, ElementState::Pressed);
        input.handle_key_code(KeyCode::ShiftLeft, ElementState::Pressed);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        input.handle_key_code(KeyCode::KeyW, ElementState::Released);
        let third = input.snapshot_for_tick();

        assert!(first.keys().is_held("w"));
        assert!(first.keys().is_held(KEY_SHIFT));
        assert!(second.keys().is_held("w"));
        assert!(!third.keys().is_held("w"));
        assert!(third.keys().is_held(KEY_SHIFT));
    }

    #[test]
    fn key_press_edge_lasts_a_single_tick() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_key_code(KeyCode::Digit2, ElementState::Pressed);
        let first = input.snapshot_for_tick();
        input.handle_key_code(KeyCode::Digit2, ElementState::Pressed);
        let second = input.snapshot_for_tick();

        assert!(first.keys().was_pressed("2"));
        assert!(!second.keys().was_pressed("2"));
        assert!(second.keys().is_held("2"));
    }

    #[test]
    fn focus_loss_releases_every_held_key() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_key_code(KeyCode::KeyD, ElementState::Pressed);
        input.handle_key_code(KeyCode::Space, ElementState::Pressed);
        input.release_all_keys();

        let snapshot = input.snapshot_for_tick();
        assert_eq!(snapshot.keys().held_count(), 0);
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.handle_key_code(KeyCode::Escape, ElementState::Pressed);
        assert!(input.quit_requested);
    }

    #[test]
    fn key_names_cover_letters_arrows_and_modifiers() {
        assert_eq!(key_name(KeyCode::KeyW), Some("w"));
        assert_eq!(key_name(KeyCode::ArrowLeft), Some("ArrowLeft"));
        assert_eq!(key_name(KeyCode::ShiftRight), Some(KEY_SHIFT));
        assert_eq!(key_name(KeyCode::Numpad3), Some("3"));
        assert_eq!(key_name(KeyCode::F12), None);
    }

    #[test]
    fn f3_toggle_is_edge_triggered() {
        let mut input = InputCollector::default();

        input.handle_hud_toggle_key_state(ElementState::Pressed);
        assert!(input.take_hud_toggle_pressed());

        input.handle_hud_toggle_key_state(ElementState::Pressed);
        assert!(!input.take_hud_toggle_pressed());

        input.handle_hud_toggle_key_state(ElementState::Released);
        input.handle_hud_toggle_key_state(ElementState::Pressed);
        assert!(input.take_hud_toggle_pressed());
    }

    #[test]
    fn pointer_press_and_release_are_edge_triggered() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let pressed = input.snapshot_for_tick();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let held = input.snapshot_for_tick();
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        let released = input.snapshot_for_tick();
        let idle = input.snapshot_for_tick();

        assert!(pressed.pointer_pressed());
        assert!(!held.pointer_pressed());
        assert!(released.pointer_released());
        assert!(!idle.pointer_released());
    }

    #[test]
    fn first_pointer_press_unlocks_audio_for_good() {
        let mut input = InputCollector::new(1280, 720);
        assert!(!input.snapshot_for_tick().audio_unlocked());

        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        assert!(!input.snapshot_for_tick().audio_unlocked());

        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        assert!(input.snapshot_for_tick().audio_unlocked());
        assert!(input.snapshot_for_tick().audio_unlocked());
    }

    #[test]
    fn snapshot_carries_cursor_and_window_size() {
        let mut input = InputCollector::new(1280, 720);
        input.set_cursor_position_px(100.0, 200.0);
        let snapshot = input.snapshot_for_tick();

        assert_eq!(snapshot.window_size(), (1280, 720));
        let (x, y) = snapshot.cursor_position_px().expect("cursor");
        assert!((x - 100.0).abs() < 0.0001);
        assert!((y - 200.0).abs() < 0.0001);

        input.clear_cursor_position();
        assert_eq!(input.snapshot_for_tick().cursor_position_px(), None);
    }

    #[test]
    fn zoom_keys_are_edge_triggered_only() {
        let mut input = InputCollector::new(1280, 720);

        input.handle_key_code(KeyCode::Equal, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 1);

        input.handle_key_code(KeyCode::Equal, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 0);

        input.handle_key_code(KeyCode::Equal, ElementState::Released);
        input.handle_key_code(KeyCode::Equal, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), 1);

        input.handle_key_code(KeyCode::Minus, ElementState::Pressed);
        assert_eq!(input.snapshot_for_tick().zoom_delta_steps(), -1);
    }

    #[test]
    fn mouse_wheel_adds_zoom_steps_and_snapshot_resets_pending() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -2.0));

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert_eq!(first.zoom_delta_steps(), -1);
        assert_eq!(second.zoom_delta_steps(), 0);
    }

    #[test]
    fn pixel_wheel_delta_maps_to_single_discrete_step_direction() {
        let positive = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 3.0),
        ));
        let negative = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, -5.0),
        ));
        let none = zoom_steps_from_scroll_delta(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 0.0),
        ));

        assert_eq!(positive, 1);
        assert_eq!(negative, -1);
        assert_eq!(none, 0);
    }

    #[test]
    fn start_target_defaults_follow_menu_mode() {
        let mut overlay = SceneRegistry::new(MenuMode::Overlay).with_menu(Box::new(Blank));
        assert_eq!(resolve_start_target(&overlay, None), None);
        overlay.register("only", Box::new(Blank));
        assert_eq!(
            resolve_start_target(&overlay, None),
            Some(SceneTarget::Index(0))
        );

        let mut exclusive = SceneRegistry::new(MenuMode::Exclusive).with_menu(Box::new(Blank));
        exclusive.register("only", Box::new(Blank));
        assert_eq!(
            resolve_start_target(&exclusive, None),
            Some(SceneTarget::Menu)
        );
        assert_eq!(
            resolve_start_target(&exclusive, Some(SceneTarget::Index(0))),
            Some(SceneTarget::Index(0))
        );
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }
}
