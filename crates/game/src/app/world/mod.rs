//! Overworld simulation: maps, collision, player, companion and NPCs.

mod companion;
mod error;
mod geometry;
mod kinematics;
mod manager;
mod map;
mod npc;
mod player;
mod prop;

pub(crate) use companion::Companion;
pub(crate) use error::WorldError;
pub(crate) use geometry::Rect;
pub(crate) use kinematics::{Direction, Kinematics, SpriteSet, ANIMATION_FRAME_COUNT};
pub(crate) use manager::MapManager;
#[cfg(test)]
pub(crate) use npc::NpcState;
pub(crate) use npc::{Portrait, Speaker};
pub(crate) use player::Player;
