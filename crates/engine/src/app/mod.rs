mod input;
mod loop_runner;
mod metrics;
mod pacing;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{text_width_px, Color, Renderer, ScreenRect, Surface, LINE_HEIGHT_PX};
pub use scene::{InputSnapshot, Scene, SceneCommand, SceneError, SceneKey, Vec2};
