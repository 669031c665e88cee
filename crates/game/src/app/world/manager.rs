use engine::Surface;
use tracing::{info, warn};

use super::companion::Companion;
use super::error::WorldError;
use super::geometry::Rect;
use super::kinematics::Direction;
use super::map::{Background, Map};
use super::npc::Npc;
use super::player::Player;
use crate::app::assets::AssetSource;

/// Interaction reach added around an NPC hitbox (split across both sides).
pub(crate) const INTERACTION_INFLATE_PX: i32 = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TransitionCause {
    Edge(Direction),
    Teleport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MapTransition {
    pub cause: TransitionCause,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawItem {
    Prop(usize),
    Npc(usize),
    Player,
    Companion,
}

/// Owns the single loaded map and its live NPCs. Player and companion are
/// passed in on every call.
#[derive(Debug)]
pub(crate) struct MapManager {
    map: Map,
    npcs: Vec<Npc>,
}

impl MapManager {
    pub(crate) fn load(assets: &mut dyn AssetSource, map_id: &str) -> Result<Self, WorldError> {
        let map = Map::load(assets, map_id)?;
        let npcs = map.npc_specs().iter().cloned().map(Npc::new).collect();
        info!(
            map = map_id,
            name = map.name(),
            width = map.width(),
            height = map.height(),
            npcs = map.npc_specs().len(),
            props = map.props().len(),
            teleports = map.teleports().len(),
            "map_loaded"
        );
        Ok(Self { map, npcs })
    }

    /// Builds the target map completely before replacing the current one,
    /// so a failed load leaves the current map untouched.
    fn replace_with(&mut self, assets: &mut dyn AssetSource, map_id: &str) -> Result<(), WorldError> {
        let next = Self::load(assets, map_id).map_err(|error| WorldError::transition(map_id, error))?;
        *self = next;
        Ok(())
    }

    pub(crate) fn map(&self) -> &Map {
        &self.map
    }

    #[cfg(test)]
    pub(crate) fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub(crate) fn npc_mut(&mut self, index: usize) -> Option<&mut Npc> {
        self.npcs.get_mut(index)
    }

    /// First NPC whose inflated hitbox overlaps `hitbox`.
    pub(crate) fn interaction_target(&self, hitbox: Rect) -> Option<usize> {
        self.npcs.iter().position(|npc| {
            hitbox.overlaps(
                &npc.hitbox()
                    .inflate(INTERACTION_INFLATE_PX, INTERACTION_INFLATE_PX),
            )
        })
    }

    pub(crate) fn update(
        &mut self,
        dt: f32,
        assets: &mut dyn AssetSource,
        player: &mut Player,
        companion: &mut Companion,
    ) -> Result<Vec<MapTransition>, WorldError> {
        let mut transitions = Vec::new();

        if let Some(transition) = self.apply_edges(assets, player, companion)? {
            transitions.push(transition);
        }

        self.step_npcs(dt);
        self.push_out_of_props(player);

        if let Some(transition) = self.apply_teleports(assets, player, companion)? {
            transitions.push(transition);
        }

        self.step_npcs(dt);
        Ok(transitions)
    }

    fn step_npcs(&mut self, dt: f32) {
        for npc in &mut self.npcs {
            npc.update(dt);
        }
    }

    /// Only the first edge in right, left, top, bottom order is handled.
    fn apply_edges(
        &mut self,
        assets: &mut dyn AssetSource,
        player: &mut Player,
        companion: &mut Companion,
    ) -> Result<Option<MapTransition>, WorldError> {
        let hitbox = player.hitbox();
        let width = self.map.width();
        let height = self.map.height();
        let edge = if hitbox.right() >= width {
            Direction::Right
        } else if hitbox.left() <= 0 {
            Direction::Left
        } else if hitbox.top() <= 0 {
            Direction::Up
        } else if hitbox.bottom() >= height {
            Direction::Down
        } else {
            return Ok(None);
        };

        let Some(target) = self.map.connection(edge).map(str::to_string) else {
            player
                .kinematics_mut()
                .update_hitbox(|hitbox| match edge {
                    Direction::Right => hitbox.set_right(width),
                    Direction::Left => hitbox.set_left(0),
                    Direction::Up => hitbox.set_top(0),
                    Direction::Down => hitbox.set_bottom(height),
                });
            return Ok(None);
        };

        let from = self.map.id().to_string();
        self.replace_with(assets, &target)?;

        let spawn = self.map.spawn_point(edge.name());
        let (new_width, new_height) = (self.map.width(), self.map.height());
        player
            .kinematics_mut()
            .update_hitbox(|hitbox| match (spawn, edge) {
                (Some((x, y)), _) => {
                    hitbox.x = x;
                    hitbox.y = y;
                }
                (None, Direction::Right) => hitbox.set_left(0),
                // Left and up use the size of the map just entered, not the
                // one being left, so maps of different sizes line up.
                (None, Direction::Left) => hitbox.set_right(new_width),
                (None, Direction::Up) => hitbox.set_bottom(new_height),
                (None, Direction::Down) => hitbox.set_top(0),
            });
        companion.resync_to_player(player);

        info!(
            from = from.as_str(),
            to = target.as_str(),
            edge = edge.name(),
            spawn_found = spawn.is_some(),
            "map_transition"
        );
        Ok(Some(MapTransition {
            cause: TransitionCause::Edge(edge),
            from,
            to: target,
        }))
    }

    fn push_out_of_props(&self, player: &mut Player) {
        for solid in self.map.props().iter().filter_map(|prop| prop.collision()) {
            if !player.hitbox().overlaps(&solid) {
                continue;
            }
            player.kinematics_mut().update_hitbox(|hitbox| {
                if hitbox.centre_x() < solid.centre_x() {
                    hitbox.set_right(solid.left());
                } else {
                    hitbox.set_left(solid.right());
                }
                if hitbox.centre_y() < solid.centre_y() {
                    hitbox.set_bottom(solid.top());
                } else {
                    hitbox.set_top(solid.bottom());
                }
            });
        }
    }

    fn apply_teleports(
        &mut self,
        assets: &mut dyn AssetSource,
        player: &mut Player,
        companion: &mut Companion,
    ) -> Result<Option<MapTransition>, WorldError> {
        let hitbox = player.hitbox();
        let Some(target) = self
            .map
            .teleports()
            .iter()
            .find(|zone| hitbox.overlaps(&zone.trigger))
            .map(|zone| zone.target.clone())
        else {
            return Ok(None);
        };

        let from = self.map.id().to_string();
        self.replace_with(assets, &target.map)?;

        let spawn = self.map.spawn_point(&target.spawn);
        if spawn.is_none() {
            warn!(
                map = target.map.as_str(),
                spawn = target.spawn.as_str(),
                "teleport_spawn_missing_keeping_position"
            );
        }
        player.kinematics_mut().update_hitbox(|hitbox| {
            if let Some((x, y)) = spawn {
                hitbox.x = x;
                hitbox.y = y;
            }
        });
        companion.resync_to_player(player);

        info!(
            from = from.as_str(),
            to = target.map.as_str(),
            spawn = target.spawn.as_str(),
            "teleport_triggered"
        );
        Ok(Some(MapTransition {
            cause: TransitionCause::Teleport,
            from,
            to: target.map,
        }))
    }

    /// Props, NPCs, player and companion stable-sorted by rect bottom.
    pub(crate) fn draw_order(&self, player: &Player, companion: Option<&Companion>) -> Vec<DrawItem> {
        let mut items: Vec<(i32, DrawItem)> = Vec::new();
        items.extend(
            self.map
                .props()
                .iter()
                .enumerate()
                .map(|(index, prop)| (prop.rect().bottom(), DrawItem::Prop(index))),
        );
        items.extend(
            self.npcs
                .iter()
                .enumerate()
                .map(|(index, npc)| (npc.rect().bottom(), DrawItem::Npc(index))),
        );
        items.push((player.hitbox().bottom(), DrawItem::Player));
        if let Some(companion) = companion {
            items.push((companion.kinematics().hitbox().bottom(), DrawItem::Companion));
        }
        items.sort_by_key(|(bottom, _)| *bottom);
        items.into_iter().map(|(_, item)| item).collect()
    }

    pub(crate) fn draw(
        &self,
        surface: &mut dyn Surface,
        player: &Player,
        companion: Option<&Companion>,
    ) {
        match self.map.background() {
            Background::Image(key) => surface.draw_image(key, 0, 0, 1.0),
            Background::Fill(color) => surface.fill(*color),
        }

        for item in self.draw_order(player, companion) {
            match item {
                DrawItem::Prop(index) => self.map.props()[index].draw(surface),
                DrawItem::Npc(index) => self.npcs[index].draw(surface),
                DrawItem::Player => player.draw(surface),
                DrawItem::Companion => {
                    if let Some(companion) = companion {
                        companion.draw(surface);
                    }
                }
            }
        }
    }
}
