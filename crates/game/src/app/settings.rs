use std::env;

use super::assets::AssetSource;
use super::world::{
    Companion, Direction, Kinematics, Player, Rect, SpriteSet, WorldError, ANIMATION_FRAME_COUNT,
};

pub(crate) const START_MAP_ENV_VAR: &str = "QUIMERA_START_MAP";
pub(crate) const DEFAULT_START_MAP: &str = "zona1";

const PLAYER_SPRITE_DIR: &str = "images/sprites/overworld/lenard";
const COMPANION_SPRITE_DIR: &str = "images/sprites/overworld/pika";

/// Placement and art for one walking character.
#[derive(Debug, Clone)]
pub(crate) struct EntitySettings {
    pub(crate) sprite_origin: (i32, i32),
    pub(crate) hitbox_offset: (i32, i32),
    pub(crate) hitbox_size: (i32, i32),
    pub(crate) speed: f32,
    pub(crate) sprites: SpriteSet,
}

impl EntitySettings {
    /// Checks every walk frame exists and sizes the sprite from the idle-down frame.
    pub(crate) fn kinematics(&self, assets: &mut dyn AssetSource) -> Result<Kinematics, WorldError> {
        for direction in Direction::ALL {
            for frame_index in 0..ANIMATION_FRAME_COUNT {
                assets.image_size(self.sprites.frame(direction, frame_index))?;
            }
        }

        let (width, height) = assets.image_size(self.sprites.idle(Direction::Down))?;
        let scale = self.sprites.scale();
        let sprite_size = (
            (width as f32 * scale) as i32,
            (height as f32 * scale) as i32,
        );
        let hitbox = Rect::new(
            self.sprite_origin.0 + self.hitbox_offset.0,
            self.sprite_origin.1 + self.hitbox_offset.1,
            self.hitbox_size.0,
            self.hitbox_size.1,
        );
        Ok(Kinematics::new(sprite_size, hitbox))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct GameSettings {
    pub(crate) start_map: String,
    pub(crate) player: EntitySettings,
    pub(crate) companion: EntitySettings,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            start_map: DEFAULT_START_MAP.to_string(),
            player: EntitySettings {
                sprite_origin: (193, 360),
                hitbox_offset: (46, 100),
                hitbox_size: (32, 24),
                speed: 200.0,
                sprites: SpriteSet::walk_cycle(2.0, |direction, pose| {
                    let name = direction.name();
                    match pose {
                        0 => format!("{PLAYER_SPRITE_DIR}/id_{name}.png"),
                        pose => format!("{PLAYER_SPRITE_DIR}/{name}_w{pose}.png"),
                    }
                }),
            },
            companion: EntitySettings {
                sprite_origin: (160, 360),
                hitbox_offset: (46, 100),
                hitbox_size: (32, 24),
                speed: 190.0,
                sprites: SpriteSet::walk_cycle(1.6, |direction, pose| {
                    let name = direction.name();
                    match pose {
                        0 => format!("{COMPANION_SPRITE_DIR}/id_{name}_pika.png"),
                        pose => format!("{COMPANION_SPRITE_DIR}/w{pose}_{name}_pika.png"),
                    }
                }),
            },
        }
    }
}

impl GameSettings {
    pub(crate) fn from_env() -> Self {
        Self {
            start_map: start_map_from(env::var(START_MAP_ENV_VAR).ok()),
            ..Self::default()
        }
    }

    pub(crate) fn spawn_player(&self, assets: &mut dyn AssetSource) -> Result<Player, WorldError> {
        let kinematics = self.player.kinematics(assets)?;
        Ok(Player::new(
            kinematics,
            self.player.sprites.clone(),
            self.player.speed,
        ))
    }

    pub(crate) fn spawn_companion(
        &self,
        assets: &mut dyn AssetSource,
    ) -> Result<Companion, WorldError> {
        let kinematics = self.companion.kinematics(assets)?;
        Ok(Companion::new(
            kinematics,
            self.companion.sprites.clone(),
            self.companion.speed,
        ))
    }
}

fn start_map_from(raw: Option<String>) -> String {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_START_MAP.to_string())
}


#[cfg(test)]
mod tests {
    use super::fixtures::with_character_frames;
    use super::*;
    use crate::app::assets::MemoryAssets;

    #[test]
    fn start_map_falls_back_when_unset_or_blank() {
        assert_eq!(start_map_from(None), DEFAULT_START_MAP);
        assert_eq!(start_map_from(Some("   ".to_string())), DEFAULT_START_MAP);
        assert_eq!(start_map_from(Some(" zona2 ".to_string())), "zona2");
    }

    #[test]
    fn frame_keys_follow_asset_naming() {
        let settings = GameSettings::default();
        assert_eq!(
            settings.player.sprites.frame(Direction::Left, 1),
            "images/sprites/overworld/lenard/left_w1.png"
        );
        assert_eq!(
            settings.companion.sprites.frame(Direction::Up, 3),
            "images/sprites/overworld/pika/w2_up_pika.png"
        );
        assert_eq!(
            settings.companion.sprites.idle(Direction::Down),
            "images/sprites/overworld/pika/id_down_pika.png"
        );
    }

    #[test]
    fn player_spawns_at_configured_sprite_origin() {
        let mut assets = with_character_frames(MemoryAssets::default());
        let player = GameSettings::default()
            .spawn_player(&mut assets)
            .expect("player");

        assert_eq!(player.hitbox(), Rect::new(239, 460, 32, 24));
        assert_eq!(player.kinematics().sprite_size(), (124, 124));
        let origin = player.kinematics().sprite_position();
        assert_eq!((origin.x, origin.y), (193.0, 360.0));
    }

    #[test]
    fn missing_walk_frame_is_reported() {
        let mut assets = MemoryAssets::default()
            .with_image("images/sprites/overworld/lenard/id_down.png", (62, 62));
        let error = GameSettings::default()
            .spawn_player(&mut assets)
            .expect_err("frames missing");
        assert!(matches!(error, WorldError::ResourceNotFound { .. }));
    }
}
