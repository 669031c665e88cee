use std::collections::HashMap;

use engine::{Color, Vec2};
use serde::Deserialize;

use super::error::WorldError;
use super::geometry::Rect;
use super::kinematics::Direction;
use super::npc::{NpcSpec, Portrait, Speaker};
use super::prop::{Prop, TeleportTarget};
use crate::app::assets::AssetSource;

pub(crate) const ENDING_NPC_NAME: &str = "muerte";
pub(crate) const ENDING_FINAL_LINE: &str = "MUERTE: \nY ustedes tambien.";

#[derive(Debug, Deserialize)]
struct MapDef {
    name: String,
    width: i32,
    height: i32,
    color: [u8; 3],
    #[serde(default)]
    background: Option<String>,
    collision: Vec<Rect>,
    connections: ConnectionsDef,
    #[serde(default)]
    spawn_points: HashMap<String, SpawnPointDef>,
    #[serde(default)]
    npcs: Vec<NpcDef>,
    #[serde(default)]
    props: Vec<PropDef>,
    #[serde(default)]
    teleports: Vec<TeleportDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConnectionsDef {
    up: Option<String>,
    down: Option<String>,
    left: Option<String>,
    right: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SpawnPointDef {
    x: i32,
    y: i32,
}

#[derive(Debug, Deserialize)]
struct NpcDef {
    name: String,
    sprite: String,
    #[serde(default = "default_scale")]
    scale: f32,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    dialogue: Vec<String>,
    #[serde(default)]
    speaker: Speaker,
    #[serde(default)]
    portrait: Option<Portrait>,
    #[serde(default)]
    walk_speed: f32,
    #[serde(default)]
    path: Vec<[f32; 2]>,
    #[serde(default)]
    ending: bool,
}

#[derive(Debug, Deserialize)]
struct PropDef {
    x: i32,
    y: i32,
    image: String,
    #[serde(default)]
    collision: bool,
    #[serde(default)]
    teleport_to: Option<TeleportTarget>,
}

#[derive(Debug, Deserialize)]
struct TeleportDef {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    to_map: String,
    spawn: String,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Background {
    Image(String),
    Fill(Color),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TeleportZone {
    pub trigger: Rect,
    pub target: TeleportTarget,
}

/// One map as loaded from its definition. Never mutated after loading;
/// moving NPCs are instantiated from `npc_specs` by the map manager.
#[derive(Debug, Clone)]
pub(crate) struct Map {
    id: String,
    name: String,
    width: i32,
    height: i32,
    background: Background,
    collision: Vec<Rect>,
    connections: ConnectionsDef,
    spawn_points: HashMap<String, (i32, i32)>,
    npc_specs: Vec<NpcSpec>,
    props: Vec<Prop>,
    teleports: Vec<TeleportZone>,
}

impl Map {
    pub(crate) fn load(assets: &mut dyn AssetSource, map_id: &str) -> Result<Self, WorldError> {
        let raw = assets.read_map(map_id)?;
        let def = parse_map_json(map_id, &raw)?;
        Self::from_definition(assets, map_id, def)
    }

    fn from_definition(
        assets: &mut dyn AssetSource,
        map_id: &str,
        def: MapDef,
    ) -> Result<Self, WorldError> {
        let origin = format!("map '{map_id}'");
        if def.width <= 0 || def.height <= 0 {
            return Err(WorldError::malformed(
                &origin,
                format!(
                    "map size must be positive, got {}x{}",
                    def.width, def.height
                ),
            ));
        }

        let background = match def.background {
            Some(key) => {
                assets.image_size(&key)?;
                Background::Image(key)
            }
            None => Background::Fill(Color::rgb(def.color[0], def.color[1], def.color[2])),
        };

        let mut npc_specs = Vec::with_capacity(def.npcs.len());
        for (index, npc) in def.npcs.into_iter().enumerate() {
            npc_specs.push(build_npc_spec(assets, &origin, index, npc)?);
        }

        let mut props = Vec::with_capacity(def.props.len());
        for prop in def.props {
            let (width, height) = assets.image_size(&prop.image)?;
            props.push(Prop::new(
                prop.image,
                Rect::new(prop.x, prop.y, width as i32, height as i32),
                prop.collision,
                prop.teleport_to,
            ));
        }

        let mut teleports: Vec<TeleportZone> = def
            .teleports
            .into_iter()
            .map(|zone| TeleportZone {
                trigger: Rect::new(zone.x, zone.y, zone.w, zone.h),
                target: TeleportTarget {
                    map: zone.to_map,
                    spawn: zone.spawn,
                },
            })
            .collect();
        teleports.extend(props.iter().filter_map(|prop| {
            prop.teleport_to().map(|target| TeleportZone {
                trigger: prop.rect(),
                target: target.clone(),
            })
        }));

        Ok(Self {
            id: map_id.to_string(),
            name: def.name,
            width: def.width,
            height: def.height,
            background,
            collision: def.collision,
            connections: def.connections,
            spawn_points: def
                .spawn_points
                .into_iter()
                .map(|(key, point)| (key, (point.x, point.y)))
                .collect(),
            npc_specs,
            props,
            teleports,
        })
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn width(&self) -> i32 {
        self.width
    }

    pub(crate) fn height(&self) -> i32 {
        self.height
    }

    pub(crate) fn background(&self) -> &Background {
        &self.background
    }

    pub(crate) fn collision(&self) -> &[Rect] {
        &self.collision
    }

    pub(crate) fn connection(&self, edge: Direction) -> Option<&str> {
        match edge {
            Direction::Up => self.connections.up.as_deref(),
            Direction::Down => self.connections.down.as_deref(),
            Direction::Left => self.connections.left.as_deref(),
            Direction::Right => self.connections.right.as_deref(),
        }
    }

    pub(crate) fn spawn_point(&self, key: &str) -> Option<(i32, i32)> {
        self.spawn_points.get(key).copied()
    }

    pub(crate) fn npc_specs(&self) -> &[NpcSpec] {
        &self.npc_specs
    }

    pub(crate) fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Explicit zones first, then prop teleports, in check order.
    pub(crate) fn teleports(&self) -> &[TeleportZone] {
        &self.teleports
    }
}

fn parse_map_json(map_id: &str, raw: &str) -> Result<MapDef, WorldError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, MapDef>(&mut deserializer) {
        Ok(def) => Ok(def),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            let origin = format!("map '{map_id}'");
            if path.is_empty() || path == "." {
                Err(WorldError::malformed(
                    &origin,
                    format!("parse map json: {source}"),
                ))
            } else {
                Err(WorldError::malformed(
                    &origin,
                    format!("parse map json at {path}: {source}"),
                ))
            }
        }
    }
}

fn build_npc_spec(
    assets: &mut dyn AssetSource,
    origin: &str,
    index: usize,
    npc: NpcDef,
) -> Result<NpcSpec, WorldError> {
    let field = format!("npcs[{index}]");
    if !npc.scale.is_finite() || npc.scale <= 0.0 {
        return Err(WorldError::malformed(
            origin,
            format!("{field}.scale must be positive, got {}", npc.scale),
        ));
    }
    if !npc.walk_speed.is_finite() || npc.walk_speed < 0.0 {
        return Err(WorldError::malformed(
            origin,
            format!("{field}.walk_speed must not be negative"),
        ));
    }

    let (width, height) = assets.image_size(&npc.sprite)?;
    if let Some(portrait) = &npc.portrait {
        assets.image_size(&portrait.path)?;
    }

    let ending = npc.ending || is_legacy_ending(&npc.name, &npc.dialogue);
    Ok(NpcSpec {
        size: (
            (width as f32 * npc.scale) as i32,
            (height as f32 * npc.scale) as i32,
        ),
        position: Vec2::new(npc.x, npc.y),
        path: npc.path.iter().map(|[x, y]| Vec2::new(*x, *y)).collect(),
        name: npc.name,
        sprite: npc.sprite,
        scale: npc.scale,
        dialogue: npc.dialogue,
        speaker: npc.speaker,
        portrait: npc.portrait,
        walk_speed: npc.walk_speed,
        ending,
    })
}

/// Older map data marks the ending NPC only by name and final line.
fn is_legacy_ending(name: &str, dialogue: &[String]) -> bool {
    name.to_lowercase() == ENDING_NPC_NAME
        && dialogue
            .last()
            .is_some_and(|line| line.trim() == ENDING_FINAL_LINE.trim())
}
