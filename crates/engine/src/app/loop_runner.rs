use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::{
    build_or_load_def_database, resolve_app_paths, ContentPipelineError, ContentPlanRequest,
    StartupError,
};

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::scene::SceneRuntime;
use super::{
    HotkeySet, InputAction, InputSnapshot, LoopMetricsSnapshot, MetricsHandle, Renderer, Scene,
    SceneCommand, Vec2,
};

pub const SLOW_FRAME_ENV_VAR: &str = "IDLE_ANTS_SLOW_FRAME_MS";

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
    pub content_plan_request: ContentPlanRequest,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Idle Ants".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(5),
            simulated_slow_frame_ms: 0,
            max_render_fps: Some(60),
            content_plan_request: ContentPlanRequest::default(),
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
    #[error("failed to build or load content database: {0}")]
    ContentPipeline(#[from] ContentPipelineError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    run_app_with_metrics(config, scene, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let mut runtime = SceneRuntime::new(scene);
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        base_content_dir = %app_paths.base_content_dir.display(),
        mods_dir = %app_paths.mods_dir.display(),
        cache_dir = %app_paths.cache_dir.display(),
        "startup"
    );
    let def_database = build_or_load_def_database(&app_paths, &config.content_plan_request)?;

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
    let mut renderer = Renderer::new(Arc::clone(&window), app_paths.root.join("assets"))
        .map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let render_frame_target = target_frame_duration(config.max_render_fps.filter(|fps| *fps > 0));
    let size = window.inner_size();
    let mut input_collector = InputCollector::new(size.width, size.height);

    runtime.set_def_database(def_database);
    runtime.load();
    runtime.apply_pending();
    info!(entity_count = runtime.world().entity_count(), "scene_loaded");
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut hud_visible = true;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
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
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.cursor_position_px =
                        Some(Vec2::new(position.x as f32, position.y as f32));
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.cursor_position_px = None;
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if button == MouseButton::Left {
                        input_collector.left_click.update(state);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    input_collector.pending_zoom_steps = input_collector
                        .pending_zoom_steps
                        .saturating_add(zoom_steps_from_scroll_delta(delta));
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if input_collector.hud_toggle.take_edge() {
                        hud_visible = !hud_visible;
                        info!(hud_visible, "hud_toggled");
                    }

                    if slow_frame_delay > Duration::ZERO {
                        thread::sleep(slow_frame_delay);
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator =
                        accumulator.saturating_add(raw_frame_dt.min(max_frame_delta));

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        let command = runtime.update(fixed_dt_seconds, &input_snapshot);
                        runtime.apply_pending();
                        if command == SceneCommand::HardReset {
                            runtime.hard_reset();
                            runtime.apply_pending();
                            info!(entity_count = runtime.world().entity_count(), "scene_reset");
                        }
                        metrics_accumulator.record_tick();
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        metrics_accumulator.record_dropped_backlog(step_plan.dropped_backlog);
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let elapsed_since_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep = compute_cap_sleep(elapsed_since_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let hud = hud_visible
                        .then(|| runtime.hud())
                        .flatten()
                        .map(|mut hud| {
                            hud.lines.push(format_metrics_line(&metrics_handle.snapshot()));
                            hud
                        });
                    if let Err(error) = renderer.render_world(runtime.world(), hud.as_ref()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = runtime.debug_title();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(config.window_title.as_str()));
                        last_applied_title = next_title;
                    }

                    metrics_accumulator.record_frame(raw_frame_dt, runtime.world().entity_count());
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            entity_count = snapshot.entity_count,
                            dropped_backlog_ms = snapshot.dropped_backlog_ms,
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
                runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Press-edge detector: one edge per physical press, held keys don't repeat.
#[derive(Debug, Default, Clone, Copy)]
struct EdgeKey {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeKey {
    fn update(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.is_down {
                    self.pressed_edge = true;
                }
                self.is_down = true;
            }
            ElementState::Released => self.is_down = false,
        }
    }

    fn take_edge(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_click: EdgeKey,
    save_key: EdgeKey,
    load_key: EdgeKey,
    reset_key: EdgeKey,
    hud_toggle: EdgeKey,
    zoom_in_key: EdgeKey,
    zoom_out_key: EdgeKey,
    digit_keys: [EdgeKey; 10],
    pending_zoom_steps: i32,
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

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.handle_physical_key(key_event.physical_key, key_event.state);
    }

    fn handle_physical_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let is_pressed = state == ElementState::Pressed;
        if let Some(action) = pan_action_for_key(code) {
            self.actions.set(action, is_pressed);
            return;
        }
        if let Some(digit) = digit_for_key(code) {
            self.digit_keys[digit as usize].update(state);
            return;
        }
        match code {
            KeyCode::Escape => {
                self.actions.set(InputAction::Quit, is_pressed);
                if is_pressed {
                    self.quit_requested = true;
                }
            }
            KeyCode::F3 => self.hud_toggle.update(state),
            KeyCode::F5 => self.save_key.update(state),
            KeyCode::F9 => self.load_key.update(state),
            KeyCode::F12 => self.reset_key.update(state),
            KeyCode::Equal | KeyCode::NumpadAdd => {
                self.zoom_in_key.update(state);
                if self.zoom_in_key.take_edge() {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(1);
                }
            }
            KeyCode::Minus | KeyCode::NumpadSubtract => {
                self.zoom_out_key.update(state);
                if self.zoom_out_key.take_edge() {
                    self.pending_zoom_steps = self.pending_zoom_steps.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let mut hotkeys = HotkeySet::default();
        for (digit, key) in self.digit_keys.iter_mut().enumerate() {
            if key.take_edge() {
                hotkeys.insert(digit as u8);
            }
        }
        let mut snapshot = InputSnapshot::empty()
            .with_quit_requested(self.quit_requested)
            .with_cursor_position_px(self.cursor_position_px)
            .with_left_click_pressed(self.left_click.take_edge())
            .with_save_pressed(self.save_key.take_edge())
            .with_load_pressed(self.load_key.take_edge())
            .with_reset_pressed(self.reset_key.take_edge())
            .with_zoom_delta_steps(std::mem::take(&mut self.pending_zoom_steps))
            .with_hotkeys(hotkeys)
            .with_window_size((self.window_width, self.window_height));
        for action in [
            InputAction::PanUp,
            InputAction::PanDown,
            InputAction::PanLeft,
            InputAction::PanRight,
            InputAction::Quit,
        ] {
            snapshot = snapshot.with_action_down(action, self.actions.is_down(action));
        }
        snapshot
    }
}

fn pan_action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::PanUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::PanDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::PanLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::PanRight),
        _ => None,
    }
}

fn digit_for_key(code: KeyCode) -> Option<u8> {
    let digit = match code {
        KeyCode::Digit0 | KeyCode::Numpad0 => 0,
        KeyCode::Digit1 | KeyCode::Numpad1 => 1,
        KeyCode::Digit2 | KeyCode::Numpad2 => 2,
        KeyCode::Digit3 | KeyCode::Numpad3 => 3,
        KeyCode::Digit4 | KeyCode::Numpad4 => 4,
        KeyCode::Digit5 | KeyCode::Numpad5 => 5,
        KeyCode::Digit6 | KeyCode::Numpad6 => 6,
        KeyCode::Digit7 | KeyCode::Numpad7 => 7,
        KeyCode::Digit8 | KeyCode::Numpad8 => 8,
        KeyCode::Digit9 | KeyCode::Numpad9 => 9,
        _ => return None,
    };
    Some(digit)
}

fn format_metrics_line(snapshot: &LoopMetricsSnapshot) -> String {
    format!(
        "FPS {:.0}  TPS {:.0}  ENT {}",
        snapshot.fps, snapshot.tps, snapshot.entity_count
    )
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(mut accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
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

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "slow_frame_env_invalid"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(env_var = SLOW_FRAME_ENV_VAR, error = %err, "slow_frame_env_unreadable");
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
