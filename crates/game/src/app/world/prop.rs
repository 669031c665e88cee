use engine::Surface;
use serde::Deserialize;

use super::geometry::Rect;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct TeleportTarget {
    pub map: String,
    pub spawn: String,
}

/// Static decoration. With collision enabled its whole image blocks the
/// player; with a teleport target its image area acts as a teleport zone.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Prop {
    image: String,
    rect: Rect,
    collision: Option<Rect>,
    teleport_to: Option<TeleportTarget>,
}

impl Prop {
    pub(crate) fn new(
        image: String,
        rect: Rect,
        collides: bool,
        teleport_to: Option<TeleportTarget>,
    ) -> Self {
        Self {
            image,
            collision: collides.then_some(rect),
            rect,
            teleport_to,
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        self.rect
    }

    pub(crate) fn collision(&self) -> Option<Rect> {
        self.collision
    }

    pub(crate) fn teleport_to(&self) -> Option<&TeleportTarget> {
        self.teleport_to.as_ref()
    }

    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        surface.draw_image(&self.image, self.rect.x, self.rect.y, 1.0);
    }
}
