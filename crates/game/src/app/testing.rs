//! Test doubles shared by scene and dialogue tests.

use engine::{Color, ScreenRect, Surface};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCall {
    Fill(Color),
    FillRect(ScreenRect, Color),
    Image { key: String, x: i32, y: i32, scale: f32 },
    Text { text: String, x: i32, y: i32, color: Color },
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    width: u32,
    height: u32,
    pub(crate) calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub(crate) fn images(&self) -> Vec<(String, i32, i32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Image { key, x, y, .. } => Some((key.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn texts(&self) -> Vec<(String, i32, i32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn filled_rects(&self) -> Vec<(ScreenRect, Color)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillRect(rect, color) => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Color) {
        self.calls.push(DrawCall::Fill(color));
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        self.calls.push(DrawCall::FillRect(rect, color));
    }

    fn draw_image(&mut self, key: &str, x: i32, y: i32, scale: f32) {
        self.calls.push(DrawCall::Image {
            key: key.to_string(),
            x,
            y,
            scale,
        });
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            x,
            y,
            color,
        });
    }
}
