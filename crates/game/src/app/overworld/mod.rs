//! The playable scene: one map, the player and companion, and the dialogue
//! overlay that can end the game.

use engine::{InputAction, InputSnapshot, Scene, SceneCommand, SceneError, Surface};
use tracing::{debug, info};

use super::assets::AssetSource;
use super::dialogue::{DialogueOutcome, DialogueSystem};
use super::settings::GameSettings;
use super::world::{Companion, MapManager, Player, WorldError};

include!("scene_state.rs");
include!("scene_impl.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
