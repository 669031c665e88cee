use engine::{
    text_width_px, Color, InputAction, InputSnapshot, Scene, SceneCommand, SceneError, SceneKey,
    Surface, LINE_HEIGHT_PX,
};
use tracing::{info, warn};

use super::assets::AssetSource;

const SKY_COLOR: Color = Color::rgb(135, 206, 235);
const SELECTED_COLOR: Color = Color::rgb(255, 255, 0);
const OPTION_COLOR: Color = Color::BLACK;

const OPTION_CENTRE_X: i32 = 125;
const OPTION_BASE_Y: i32 = 225;
const OPTION_SPACING_Y: i32 = 80;
const LEVITATION_RATE: f32 = 5.0;
const LEVITATION_AMPLITUDE_PX: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    Play,
    Quit,
}

impl MenuOption {
    const ALL: [MenuOption; 2] = [MenuOption::Play, MenuOption::Quit];

    fn label(self) -> &'static str {
        match self {
            MenuOption::Play => "Jugar",
            MenuOption::Quit => "Salir",
        }
    }
}

/// How a piece of menu art is sized on screen.
#[derive(Debug, Clone, Copy)]
enum Fit {
    /// Cover the whole screen.
    Screen,
    /// Fit inside a square box of this side.
    Box(f32),
}

#[derive(Debug, Clone, Copy)]
struct ArtSlot {
    key: &'static str,
    x: i32,
    y: i32,
    fit: Fit,
}

const ART: [ArtSlot; 3] = [
    ArtSlot {
        key: "images/Cielo_fondo.png",
        x: 0,
        y: 0,
        fit: Fit::Screen,
    },
    ArtSlot {
        key: "images/Lenard.png",
        x: 250,
        y: 50,
        fit: Fit::Box(400.0),
    },
    ArtSlot {
        key: "images/Pika.png",
        x: 500,
        y: 145,
        fit: Fit::Box(300.0),
    },
];

#[derive(Debug, Clone, PartialEq)]
struct PlacedArt {
    key: &'static str,
    x: i32,
    y: i32,
    scale: f32,
}

pub(crate) struct MenuScene {
    assets: Box<dyn AssetSource>,
    screen_size: (u32, u32),
    selected: usize,
    levitation_time: f32,
    art: Vec<PlacedArt>,
}

impl MenuScene {
    pub(crate) fn new(assets: Box<dyn AssetSource>, screen_size: (u32, u32)) -> Self {
        Self {
            assets,
            screen_size,
            selected: 0,
            levitation_time: 0.0,
            art: Vec::new(),
        }
    }

    fn selected_option(&self) -> MenuOption {
        MenuOption::ALL[self.selected]
    }

    fn levitation_offset(&self) -> i32 {
        (self.levitation_time.sin() * LEVITATION_AMPLITUDE_PX).round() as i32
    }

    fn place(&mut self, slot: ArtSlot) -> Option<PlacedArt> {
        let (width, height) = match self.assets.image_size(slot.key) {
            Ok(size) => size,
            Err(err) => {
                warn!(key = slot.key, error = %err, "menu_art_missing");
                return None;
            }
        };
        if width == 0 || height == 0 {
            return None;
        }

        let scale = match slot.fit {
            Fit::Screen => (self.screen_size.0 as f32 / width as f32)
                .max(self.screen_size.1 as f32 / height as f32),
            Fit::Box(side) => (side / width as f32).min(side / height as f32),
        };
        Some(PlacedArt {
            key: slot.key,
            x: slot.x,
            y: slot.y,
            scale,
        })
    }
}

impl Scene for MenuScene {
    fn load(&mut self) -> Result<(), SceneError> {
        self.selected = 0;
        self.levitation_time = 0.0;
        let art: Vec<PlacedArt> = ART.into_iter().filter_map(|slot| self.place(slot)).collect();
        self.art = art;
        info!(art = self.art.len(), "menu_loaded");
        Ok(())
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> Result<SceneCommand, SceneError> {
        self.levitation_time += fixed_dt_seconds * LEVITATION_RATE;

        let option_count = MenuOption::ALL.len();
        if input.was_pressed(InputAction::MoveUp) {
            self.selected = (self.selected + option_count - 1) % option_count;
        }
        if input.was_pressed(InputAction::MoveDown) {
            self.selected = (self.selected + 1) % option_count;
        }

        if !input.was_pressed(InputAction::Advance) {
            return Ok(SceneCommand::None);
        }
        let option = self.selected_option();
        info!(option = option.label(), "menu_option_chosen");
        Ok(match option {
            MenuOption::Play => SceneCommand::SwitchTo(SceneKey::Overworld),
            MenuOption::Quit => SceneCommand::Quit,
        })
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.fill(SKY_COLOR);
        for art in &self.art {
            surface.draw_image(art.key, art.x, art.y, art.scale);
        }

        for (index, option) in MenuOption::ALL.into_iter().enumerate() {
            let label = option.label();
            let mut centre_y = OPTION_BASE_Y + index as i32 * OPTION_SPACING_Y;
            let color = if index == self.selected {
                centre_y += self.levitation_offset();
                SELECTED_COLOR
            } else {
                OPTION_COLOR
            };
            surface.draw_text(
                label,
                OPTION_CENTRE_X - text_width_px(label) / 2,
                centre_y - LINE_HEIGHT_PX / 2,
                color,
            );
        }
    }

    fn unload(&mut self) {
        self.art.clear();
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!("Quimera - menu ({})", self.selected_option().label()))
    }
}
