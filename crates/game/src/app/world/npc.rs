use engine::{Surface, Vec2};
use serde::Deserialize;

use super::geometry::Rect;

pub(crate) const WAYPOINT_ARRIVAL_PX: f32 = 2.0;

/// Image shown next to the dialogue box while this NPC talks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Portrait {
    pub path: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
}

fn default_scale() -> f32 {
    1.0
}

/// Whose text box frames the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Speaker {
    Player,
    #[default]
    Npc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NpcState {
    Idle,
    Interacting,
}

/// Everything needed to place an NPC; produced by map loading.
#[derive(Debug, Clone)]
pub(crate) struct NpcSpec {
    pub name: String,
    pub sprite: String,
    pub scale: f32,
    pub size: (i32, i32),
    pub position: Vec2,
    pub dialogue: Vec<String>,
    pub speaker: Speaker,
    pub portrait: Option<Portrait>,
    pub walk_speed: f32,
    pub path: Vec<Vec2>,
    pub ending: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Npc {
    spec: NpcSpec,
    position: Vec2,
    path_index: usize,
    state: NpcState,
}

impl Npc {
    pub(crate) fn new(spec: NpcSpec) -> Self {
        Self {
            position: spec.position,
            spec,
            path_index: 0,
            state: NpcState::Idle,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.spec.name
    }

    pub(crate) fn speaker(&self) -> Speaker {
        self.spec.speaker
    }

    pub(crate) fn portrait(&self) -> Option<&Portrait> {
        self.spec.portrait.as_ref()
    }

    /// True when finishing this NPC's dialogue starts the ending sequence.
    pub(crate) fn triggers_ending(&self) -> bool {
        self.spec.ending
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> NpcState {
        self.state
    }

    pub(crate) fn is_interacting(&self) -> bool {
        self.state == NpcState::Interacting
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    /// Draw rectangle; the hitbox is the same rectangle.
    pub(crate) fn rect(&self) -> Rect {
        Rect::new(
            self.position.x.round() as i32,
            self.position.y.round() as i32,
            self.spec.size.0,
            self.spec.size.1,
        )
    }

    pub(crate) fn hitbox(&self) -> Rect {
        self.rect()
    }

    pub(crate) fn interact(&mut self) -> &[String] {
        self.state = NpcState::Interacting;
        &self.spec.dialogue
    }

    pub(crate) fn end_interaction(&mut self) {
        self.state = NpcState::Idle;
    }

    pub(crate) fn update(&mut self, dt: f32) {
        if self.is_interacting() || self.spec.walk_speed <= 0.0 || self.spec.path.is_empty() {
            return;
        }

        let target = self.spec.path[self.path_index % self.spec.path.len()];
        let centre = self.position
            + Vec2::new(
                self.spec.size.0 as f32 / 2.0,
                self.spec.size.1 as f32 / 2.0,
            );
        let to_target = target - centre;
        if to_target.length() < WAYPOINT_ARRIVAL_PX {
            self.path_index = (self.path_index + 1) % self.spec.path.len();
            return;
        }
        if let Some(heading) = to_target.normalized() {
            self.position = self.position + heading.scale(self.spec.walk_speed * dt);
        }
    }

    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        let rect = self.rect();
        surface.draw_image(&self.spec.sprite, rect.x, rect.y, self.spec.scale);
    }
}
