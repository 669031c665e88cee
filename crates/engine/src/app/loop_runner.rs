use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::pacing::FramePacer;
use super::scene::SceneMachine;
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneCommand, SceneError, SceneKey};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub assets_dir: PathBuf,
    pub initial_scene: SceneKey,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Quimera".to_string(),
            window_width: 800,
            window_height: 600,
            assets_dir: PathBuf::from("assets"),
            initial_scene: SceneKey::Menu,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("scene failed: {0}")]
    Scene(#[source] SceneError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    menu: Box<dyn Scene>,
    overworld: Box<dyn Scene>,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(menu, overworld, config.initial_scene);
    scenes.load_active().map_err(AppError::Scene)?;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(
        Arc::clone(&window),
        (config.window_width, config.window_height),
        config.assets_dir.clone(),
    )
    .map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut pacer = FramePacer::new(
        config.target_tps,
        config.max_frame_delta,
        config.max_ticks_per_frame,
        config.max_render_fps,
        Instant::now(),
    );
    let mut metrics = MetricsAccumulator::new(if config.metrics_log_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.metrics_log_interval
    });
    info!(
        fixed_dt_ms = pacer.fixed_dt_seconds() * 1000.0,
        max_ticks_per_frame = pacer.max_ticks_per_frame(),
        render_fps_cap = ?pacer.render_fps_cap(),
        "loop_config"
    );

    let mut input = InputCollector::default();
    let mut shown_title: Option<String> = None;
    let mut fatal: Option<AppError> = None;
    let fatal_slot = &mut fatal;

    let run_result = event_loop.run(move |event, window_target| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => {
                info!(reason = "window_close", "shutdown_requested");
                window_target.exit();
            }
            WindowEvent::Resized(size) => {
                if let Err(error) = renderer.resize(size.width, size.height) {
                    warn!(error = %error, "renderer_resize_failed");
                    window_target.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    input.key(code, event.state == ElementState::Pressed);
                }
                if input.quit_requested {
                    info!(reason = "cancel_key", "shutdown_requested");
                    window_target.exit();
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let budget = pacer.begin_frame(now);
                for _ in 0..budget.ticks {
                    let snapshot = input.snapshot_for_tick();
                    let outcome = scenes
                        .update_active(pacer.fixed_dt_seconds(), &snapshot)
                        .and_then(|command| match command {
                            SceneCommand::SwitchTo(next) => scenes.switch_to(next).map(|_| command),
                            SceneCommand::None | SceneCommand::Quit => Ok(command),
                        });
                    metrics.record_tick();
                    match outcome {
                        Ok(SceneCommand::Quit) => {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                        Ok(_) => {}
                        Err(scene_error) => {
                            error!(
                                error = %scene_error,
                                scene = ?scenes.active_scene(),
                                "scene_update_failed"
                            );
                            *fatal_slot = Some(AppError::Scene(scene_error));
                            window_target.exit();
                            return;
                        }
                    }
                }
                if !budget.dropped.is_zero() {
                    warn!(
                        dropped_backlog_ms = budget.dropped.as_millis() as u64,
                        "sim_clamp_triggered"
                    );
                }

                let wait = pacer.present_wait(Instant::now());
                if !wait.is_zero() {
                    thread::sleep(wait);
                }
                if let Err(error) = renderer.render_with(|surface| scenes.draw_active(surface)) {
                    warn!(error = %error, "renderer_draw_failed");
                    window_target.exit();
                }
                pacer.mark_presented(Instant::now());

                let title = scenes.debug_title_active();
                if title != shown_title {
                    window.set_title(title.as_deref().unwrap_or(&config.window_title));
                    shown_title = title;
                }

                metrics.record_frame(budget.raw_frame_dt);
                if let Some(snapshot) = metrics.maybe_snapshot(now) {
                    info!(
                        fps = snapshot.fps,
                        tps = snapshot.tps,
                        frame_time_ms = snapshot.frame_time_ms,
                        scene = ?scenes.active_scene(),
                        "loop_metrics"
                    );
                }
            }
            _ => {}
        },
        Event::AboutToWait => window.request_redraw(),
        Event::LoopExiting => {
            scenes.shutdown_all();
            info!("shutdown");
        }
        _ => {}
    });

    if let Some(error) = fatal {
        return Err(error);
    }
    run_result.map_err(AppError::EventLoopRun)
}

/// Turns key events into per-tick action snapshots.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    held: HashSet<KeyCode>,
    actions: ActionStates,
}

impl InputCollector {
    /// An action stays down while any of its keys is held.
    fn key(&mut self, code: KeyCode, is_pressed: bool) {
        let Some(action) = action_for_key(code) else {
            return;
        };
        if is_pressed {
            self.held.insert(code);
        } else {
            self.held.remove(&code);
        }
        let any_held = self
            .held
            .iter()
            .any(|held| action_for_key(*held) == Some(action));
        self.actions.set(action, any_held);
        if action == InputAction::Cancel && is_pressed {
            self.quit_requested = true;
        }
    }

    /// Press edges are handed to exactly one tick.
    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(self.quit_requested, self.actions);
        self.actions.clear_pressed();
        snapshot
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(InputAction::MoveUp),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(InputAction::MoveDown),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(InputAction::MoveLeft),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(InputAction::MoveRight),
        KeyCode::KeyZ | KeyCode::Enter => Some(InputAction::Advance),
        KeyCode::Escape => Some(InputAction::Cancel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputCollector, code: KeyCode) {
        input.key(code, true);
    }

    #[test]
    fn wasd_and_arrows_share_movement_actions() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::ArrowLeft);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveDown));
    }

    #[test]
    fn releasing_one_alias_keeps_the_action_held_by_the_other() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::ArrowUp);
        input.key(KeyCode::ArrowUp, false);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.was_pressed(InputAction::MoveUp));

        press(&mut input, KeyCode::ArrowUp);
        assert!(!input.snapshot_for_tick().was_pressed(InputAction::MoveUp));

        input.key(KeyCode::KeyW, false);
        input.key(KeyCode::ArrowUp, false);
        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveUp));
    }

    #[test]
    fn released_key_is_no_longer_down() {
        let mut input = InputCollector::default();
        input.key(KeyCode::KeyD, true);
        input.key(KeyCode::KeyD, false);

        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveRight));
    }

    #[test]
    fn advance_edge_reaches_one_tick_only() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyZ);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert!(first.was_pressed(InputAction::Advance));
        assert!(!second.was_pressed(InputAction::Advance));
        assert!(second.is_down(InputAction::Advance));
    }

    #[test]
    fn key_repeat_does_not_create_new_edges() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::Enter);
        assert!(input.snapshot_for_tick().was_pressed(InputAction::Advance));

        press(&mut input, KeyCode::Enter);
        assert!(!input.snapshot_for_tick().was_pressed(InputAction::Advance));

        input.key(KeyCode::Enter, false);
        press(&mut input, KeyCode::Enter);
        assert!(input.snapshot_for_tick().was_pressed(InputAction::Advance));
    }

    #[test]
    fn escape_cancels_and_requests_quit() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::Escape);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.quit_requested());
        assert!(snapshot.was_pressed(InputAction::Cancel));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyQ);

        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.quit_requested());
        assert!(!snapshot.is_down(InputAction::Advance));
    }
}
