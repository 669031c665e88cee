use engine::{InputAction, InputSnapshot, Surface};

use super::geometry::Rect;
use super::kinematics::{Direction, Kinematics, SpriteSet};

/// Keyboard-driven avatar. Movement is gated by `can_move`, which dialogue
/// and the ending sequence clear while they own control.
#[derive(Debug, Clone)]
pub(crate) struct Player {
    kinematics: Kinematics,
    sprites: SpriteSet,
    speed: f32,
    can_move: bool,
    is_moving: bool,
}

impl Player {
    pub(crate) fn new(kinematics: Kinematics, sprites: SpriteSet, speed: f32) -> Self {
        Self {
            kinematics,
            sprites,
            speed,
            can_move: true,
            is_moving: false,
        }
    }

    pub(crate) fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub(crate) fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    pub(crate) fn hitbox(&self) -> Rect {
        self.kinematics.hitbox()
    }

    pub(crate) fn direction(&self) -> Direction {
        self.kinematics.direction()
    }

    pub(crate) fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub(crate) fn can_move(&self) -> bool {
        self.can_move
    }

    pub(crate) fn set_can_move(&mut self, can_move: bool) {
        self.can_move = can_move;
    }

    pub(crate) fn update(&mut self, dt: f32, input: &InputSnapshot, obstacles: &[Rect]) {
        if !self.can_move {
            self.is_moving = false;
            self.kinematics.advance_animation(false);
            return;
        }

        let step = self.speed * dt;
        let mut dx = 0.0;
        let mut dy = 0.0;
        let mut facing = None;
        for (action, direction) in [
            (InputAction::MoveLeft, Direction::Left),
            (InputAction::MoveRight, Direction::Right),
            (InputAction::MoveUp, Direction::Up),
            (InputAction::MoveDown, Direction::Down),
        ] {
            if !input.is_down(action) {
                continue;
            }
            match direction {
                Direction::Left => dx -= step,
                Direction::Right => dx += step,
                Direction::Up => dy -= step,
                Direction::Down => dy += step,
            }
            facing = Some(direction);
        }

        self.is_moving = facing.is_some();
        if let Some(direction) = facing {
            self.kinematics.set_direction(direction);
            self.kinematics.move_and_collide(dx, dy, obstacles);
        }
        self.kinematics.advance_animation(self.is_moving);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        let sprites = SpriteSet::walk_cycle(2.0, |direction, pose| {
            format!("lenard/{}_{pose}.png", direction.name())
        });
        Player::new(
            Kinematics::new((124, 124), Rect::new(239, 460, 32, 24)),
            sprites,
            200.0,
        )
    }

    fn held(actions: &[InputAction]) -> InputSnapshot {
        actions
            .iter()
            .fold(InputSnapshot::empty(), |snapshot, action| {
                snapshot.with_action_down(*action, true)
            })
    }

    #[test]
    fn moves_by_speed_times_dt() {
        let mut player = player();
        player.update(0.05, &held(&[InputAction::MoveRight]), &[]);

        assert_eq!(player.hitbox().x, 249);
        assert!(player.is_moving());
        assert_eq!(player.direction(), Direction::Right);
    }

    #[test]
    fn last_evaluated_direction_wins_facing() {
        let mut player = player();
        player.update(
            0.05,
            &held(&[InputAction::MoveLeft, InputAction::MoveDown]),
            &[],
        );

        assert_eq!(player.direction(), Direction::Down);
        assert_eq!(player.hitbox().x, 229);
        assert_eq!(player.hitbox().y, 470);
    }

    #[test]
    fn no_keys_means_idle_without_movement() {
        let mut player = player();
        let before = player.hitbox();
        player.update(0.05, &InputSnapshot::empty(), &[]);

        assert!(!player.is_moving());
        assert_eq!(player.hitbox(), before);
    }

    #[test]
    fn blocked_player_stays_put_and_idles() {
        let mut player = player();
        player.update(0.05, &held(&[InputAction::MoveUp]), &[]);
        player.set_can_move(false);
        let before = player.hitbox();

        player.update(0.05, &held(&[InputAction::MoveUp]), &[]);

        assert_eq!(player.hitbox(), before);
        assert!(!player.is_moving());
        assert_eq!(player.kinematics().animation_frame(), 0.0);
    }

    #[test]
    fn walls_stop_movement() {
        let mut player = player();
        let wall = Rect::new(275, 0, 10, 800);
        player.update(0.05, &held(&[InputAction::MoveRight]), &[wall]);

        assert_eq!(player.hitbox().right(), 275);
    }
}
