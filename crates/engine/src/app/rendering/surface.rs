#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ScreenRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// Drawing target handed to scenes. Coordinates are frame pixels with the
/// origin at the top-left corner; everything is clipped to the frame.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn fill(&mut self, color: Color);
    /// Alpha-blends `color` over the rectangle.
    fn fill_rect(&mut self, rect: ScreenRect, color: Color);
    /// Draws the image at `key` with its top-left corner at (x, y),
    /// nearest-neighbour scaled by `scale`.
    fn draw_image(&mut self, key: &str, x: i32, y: i32, scale: f32);
    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color);
}

pub(crate) fn blend_pixel(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 || color.a == 0 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let Some(pixel) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    if color.a == 255 {
        pixel.copy_from_slice(&[color.r, color.g, color.b, 255]);
        return;
    }
    let alpha = u32::from(color.a);
    let inverse = 255 - alpha;
    for (channel, source) in pixel.iter_mut().zip([color.r, color.g, color.b]) {
        *channel = ((u32::from(source) * alpha + u32::from(*channel) * inverse) / 255) as u8;
    }
    pixel[3] = 255;
}

pub(crate) fn fill_rect_blended(
    frame: &mut [u8],
    width: u32,
    height: u32,
    rect: ScreenRect,
    color: Color,
) {
    let start_x = rect.x.max(0);
    let start_y = rect.y.max(0);
    let end_x = rect.x.saturating_add(rect.w).min(width as i32);
    let end_y = rect.y.saturating_add(rect.h).min(height as i32);
    for y in start_y..end_y {
        for x in start_x..end_x {
            blend_pixel(frame, width, height, x, y, color);
        }
    }
}
