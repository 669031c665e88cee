mod renderer;
mod surface;
mod text;

pub use renderer::Renderer;
pub use surface::{Color, ScreenRect, Surface};
pub use text::{text_width_px, LINE_HEIGHT_PX};
