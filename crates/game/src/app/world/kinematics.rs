use engine::Vec2;

use super::geometry::Rect;

pub(crate) const ANIMATION_FRAME_COUNT: usize = 4;
pub(crate) const ANIMATION_SPEED: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    pub(crate) const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Four-frame walk cycle per facing, as asset keys, plus the draw scale.
#[derive(Debug, Clone)]
pub(crate) struct SpriteSet {
    frames: [[String; ANIMATION_FRAME_COUNT]; 4],
    scale: f32,
}

impl SpriteSet {
    /// Builds the idle/step/idle/step cycle from a key for each
    /// (direction, pose) pair. Pose 0 is idle, 1 and 2 are the steps.
    pub(crate) fn walk_cycle(scale: f32, key_for: impl Fn(Direction, usize) -> String) -> Self {
        let frames = Direction::ALL.map(|direction| {
            let idle = key_for(direction, 0);
            [idle.clone(), key_for(direction, 1), idle, key_for(direction, 2)]
        });
        Self { frames, scale }
    }

    pub(crate) fn frame(&self, direction: Direction, frame_index: usize) -> &str {
        &self.frames[direction.index()][frame_index % ANIMATION_FRAME_COUNT]
    }

    pub(crate) fn idle(&self, direction: Direction) -> &str {
        self.frame(direction, 0)
    }

    pub(crate) fn scale(&self) -> f32 {
        self.scale
    }
}

/// Shared movement state of the player and the companion. The hitbox is the
/// collision truth; the sprite position is always derived from it.
#[derive(Debug, Clone)]
pub(crate) struct Kinematics {
    sprite_position: Vec2,
    sprite_size: (i32, i32),
    hitbox: Rect,
    direction: Direction,
    animation_frame: f32,
}

impl Kinematics {
    pub(crate) fn new(sprite_size: (i32, i32), hitbox: Rect) -> Self {
        let mut kinematics = Self {
            sprite_position: Vec2::ZERO,
            sprite_size,
            hitbox,
            direction: Direction::default(),
            animation_frame: 0.0,
        };
        kinematics.resync_sprite();
        kinematics
    }

    pub(crate) fn sprite_position(&self) -> Vec2 {
        self.sprite_position
    }

    pub(crate) fn sprite_size(&self) -> (i32, i32) {
        self.sprite_size
    }

    pub(crate) fn hitbox(&self) -> Rect {
        self.hitbox
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub(crate) fn animation_frame(&self) -> f32 {
        self.animation_frame
    }

    pub(crate) fn frame_index(&self) -> usize {
        (self.animation_frame as usize).min(ANIMATION_FRAME_COUNT - 1)
    }

    /// Moves X then Y by whole pixels, clamping the leading edge against
    /// every obstacle the hitbox ends up overlapping on that axis.
    pub(crate) fn move_and_collide(&mut self, dx: f32, dy: f32, obstacles: &[Rect]) {
        self.hitbox.x += dx.round() as i32;
        for obstacle in obstacles {
            if self.hitbox.overlaps(obstacle) {
                if dx > 0.0 {
                    self.hitbox.set_right(obstacle.left());
                } else if dx < 0.0 {
                    self.hitbox.set_left(obstacle.right());
                }
            }
        }

        self.hitbox.y += dy.round() as i32;
        for obstacle in obstacles {
            if self.hitbox.overlaps(obstacle) {
                if dy > 0.0 {
                    self.hitbox.set_bottom(obstacle.top());
                } else if dy < 0.0 {
                    self.hitbox.set_top(obstacle.bottom());
                }
            }
        }

        self.resync_sprite();
    }

    /// Applies an arbitrary hitbox edit (clamp, spawn placement, push-out)
    /// and re-derives the sprite position.
    pub(crate) fn update_hitbox(&mut self, edit: impl FnOnce(&mut Rect)) {
        edit(&mut self.hitbox);
        self.resync_sprite();
    }

    pub(crate) fn resync_sprite(&mut self) {
        let (sprite_w, sprite_h) = self.sprite_size;
        self.sprite_position = Vec2::new(
            (self.hitbox.x - (sprite_w - self.hitbox.w).div_euclid(2)) as f32,
            (self.hitbox.y - (sprite_h - self.hitbox.h)) as f32,
        );
    }

    pub(crate) fn advance_animation(&mut self, moving: bool) {
        if !moving {
            self.animation_frame = 0.0;
            return;
        }
        self.animation_frame += ANIMATION_SPEED;
        if self.animation_frame >= ANIMATION_FRAME_COUNT as f32 {
            self.animation_frame = 0.0;
        }
    }
}
