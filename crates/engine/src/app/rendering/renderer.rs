use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::assets::resolve_asset_path;

use super::surface::{blend_pixel, fill_rect_blended, Color, ScreenRect, Surface};
use super::text::draw_text_clipped;

const MISSING_SPRITE_COLOR: Color = Color::rgb(220, 0, 220);
const MISSING_SPRITE_SIZE_PX: i32 = 16;

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Decoded images keyed by asset key. Failed loads are cached as `None` and
/// warned about once.
#[derive(Default)]
struct SpriteCache {
    sprites: HashMap<String, Option<LoadedSprite>>,
    warned_missing_keys: HashSet<String>,
}

impl SpriteCache {
    fn resolve(&mut self, assets_dir: &Path, key: &str) -> Option<&LoadedSprite> {
        if !self.sprites.contains_key(key) {
            let loaded = match resolve_asset_path(assets_dir, key) {
                Ok(path) => load_sprite_rgba(&path).map_err(|reason| (Some(path), reason)),
                Err(error) => Err((None, format!("invalid_key:{error}"))),
            };
            let sprite = match loaded {
                Ok(sprite) => Some(sprite),
                Err((path, reason)) => {
                    self.warn_once(key, path.as_deref(), &reason);
                    None
                }
            };
            self.sprites.insert(key.to_string(), sprite);
        }
        self.sprites.get(key).and_then(Option::as_ref)
    }

    fn warn_once(&mut self, key: &str, resolved_path: Option<&Path>, reason: &str) {
        if !self.warned_missing_keys.insert(key.to_string()) {
            return;
        }
        let path_display = resolved_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        warn!(
            asset = key,
            path = %path_display,
            reason = reason,
            "renderer_sprite_load_failed_using_placeholder"
        );
    }
}

/// Owns the window's pixel buffer. The buffer has the fixed logical size of
/// the game and is stretched to the window surface on present.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    logical_width: u32,
    logical_height: u32,
    assets_dir: PathBuf,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        logical_size: (u32, u32),
        assets_dir: PathBuf,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            logical_size,
            (size.width.max(1), size.height.max(1)),
        )?;
        Ok(Self {
            window,
            pixels,
            logical_width: logical_size.0,
            logical_height: logical_size.1,
            assets_dir,
            sprites: SpriteCache::default(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            (self.logical_width, self.logical_height),
            (width, height),
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        logical_size: (u32, u32),
        surface_size: (u32, u32),
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_size.0, surface_size.1, window);
        Pixels::new(logical_size.0, logical_size.1, surface)
    }

    pub fn render_with(&mut self, draw: impl FnOnce(&mut dyn Surface)) -> Result<(), Error> {
        {
            let mut surface = FrameSurface {
                frame: self.pixels.frame_mut(),
                width: self.logical_width,
                height: self.logical_height,
                assets_dir: &self.assets_dir,
                sprites: &mut self.sprites,
            };
            surface.fill(Color::BLACK);
            draw(&mut surface);
        }
        self.pixels.render()
    }
}

struct FrameSurface<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    assets_dir: &'a Path,
    sprites: &'a mut SpriteCache,
}

impl Surface for FrameSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, color: Color) {
        let pixel = [color.r, color.g, color.b, 255];
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&pixel);
        }
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        fill_rect_blended(self.frame, self.width, self.height, rect, color);
    }

    fn draw_image(&mut self, key: &str, x: i32, y: i32, scale: f32) {
        match self.sprites.resolve(self.assets_dir, key) {
            Some(sprite) => {
                draw_sprite_scaled(self.frame, self.width, self.height, x, y, sprite, scale);
            }
            None => fill_rect_blended(
                self.frame,
                self.width,
                self.height,
                ScreenRect::new(x, y, MISSING_SPRITE_SIZE_PX, MISSING_SPRITE_SIZE_PX),
                MISSING_SPRITE_COLOR,
            ),
        }
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: Color) {
        draw_text_clipped(self.frame, self.width, self.height, x, y, text, color);
    }
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn normalized_sprite_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn scaled_sprite_dimensions(sprite: &LoadedSprite, scale: f32) -> (u32, u32) {
    let scale = normalized_sprite_scale(scale);
    let width = (sprite.width as f32 * scale).round().max(1.0) as u32;
    let height = (sprite.height as f32 * scale).round().max(1.0) as u32;
    (width, height)
}

fn draw_sprite_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    sprite: &LoadedSprite,
    scale: f32,
) {
    if sprite.width == 0 || sprite.height == 0 || width == 0 || height == 0 {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }

    let inv_scale = normalized_sprite_scale(scale).recip();
    let (scaled_w, scaled_h) = scaled_sprite_dimensions(sprite, scale);
    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = left.saturating_add(scaled_w as i32).min(width as i32);
    let draw_bottom = top.saturating_add(scaled_h as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let sprite_width = sprite.width as usize;
    for out_y in draw_top..draw_bottom {
        let src_y = (((out_y - top) as f32) * inv_scale).floor() as u32;
        let src_row_offset = src_y.min(sprite.height - 1) as usize * sprite_width * 4;

        for out_x in draw_left..draw_right {
            let src_x = (((out_x - left) as f32) * inv_scale).floor() as u32;
            let src_offset = src_row_offset + src_x.min(sprite.width - 1) as usize * 4;
            let color = Color {
                r: sprite.rgba[src_offset],
                g: sprite.rgba[src_offset + 1],
                b: sprite.rgba[src_offset + 2],
                a: sprite.rgba[src_offset + 3],
            };
            blend_pixel(frame, width, height, out_x, out_y, color);
        }
    }
}
