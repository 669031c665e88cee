use engine::{Surface, Vec2};

use super::kinematics::{Direction, Kinematics, SpriteSet};
use super::player::Player;

pub(crate) const FOLLOW_OFFSET_PX: f32 = 50.0;
pub(crate) const FOLLOW_IDLE_DISTANCE_PX: f32 = 10.0;
/// Horizontal gap between player and companion after a map change.
pub(crate) const MAP_RESYNC_OFFSET_PX: i32 = 40;

/// Follower that trails a point behind the player. It ignores collision.
#[derive(Debug, Clone)]
pub(crate) struct Companion {
    kinematics: Kinematics,
    sprites: SpriteSet,
    follow_speed: f32,
    subpixel: Vec2,
}

impl Companion {
    pub(crate) fn new(kinematics: Kinematics, sprites: SpriteSet, follow_speed: f32) -> Self {
        Self {
            kinematics,
            sprites,
            follow_speed,
            subpixel: Vec2::ZERO,
        }
    }

    pub(crate) fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub(crate) fn follow(&mut self, player: &Player, dt: f32) {
        if !player.is_moving() {
            self.kinematics.advance_animation(false);
            return;
        }

        let player_hitbox = player.hitbox();
        let offset = match player.direction() {
            Direction::Down => Vec2::new(0.0, -FOLLOW_OFFSET_PX),
            Direction::Up => Vec2::new(0.0, FOLLOW_OFFSET_PX),
            Direction::Left => Vec2::new(FOLLOW_OFFSET_PX, 0.0),
            Direction::Right => Vec2::new(-FOLLOW_OFFSET_PX, 0.0),
        };
        let goal = Vec2::new(
            player_hitbox.centre_x() as f32,
            player_hitbox.centre_y() as f32,
        ) + offset;
        let own = self.kinematics.hitbox();
        let displacement = goal - Vec2::new(own.centre_x() as f32, own.centre_y() as f32);

        if displacement.length() <= FOLLOW_IDLE_DISTANCE_PX {
            self.kinematics.advance_animation(false);
            return;
        }
        let Some(heading) = displacement.normalized() else {
            self.kinematics.advance_animation(false);
            return;
        };

        self.subpixel = self.subpixel + heading.scale(self.follow_speed * dt);
        let step_x = self.subpixel.x.trunc();
        let step_y = self.subpixel.y.trunc();
        self.subpixel = self.subpixel - Vec2::new(step_x, step_y);
        self.kinematics.update_hitbox(|hitbox| {
            hitbox.x += step_x as i32;
            hitbox.y += step_y as i32;
        });

        let facing = if displacement.x.abs() > displacement.y.abs() {
            if displacement.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if displacement.y > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        };
        self.kinematics.set_direction(facing);
        self.kinematics.advance_animation(true);
    }

    /// Places the companion beside the player after the player was moved to
    /// a new map.
    pub(crate) fn resync_to_player(&mut self, player: &Player) {
        let player_hitbox = player.hitbox();
        self.subpixel = Vec2::ZERO;
        self.kinematics.update_hitbox(|hitbox| {
            hitbox.x = player_hitbox.x - MAP_RESYNC_OFFSET_PX;
            hitbox.y = player_hitbox.y;
        });
    }

    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        let position = self.kinematics.sprite_position();
        surface.draw_image(
            self.sprites
                .frame(self.kinematics.direction(), self.kinematics.frame_index()),
            position.x as i32,
            position.y as i32,
            self.sprites.scale(),
        );
    }
}
