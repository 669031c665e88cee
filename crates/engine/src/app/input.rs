#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Advance,
    Cancel,
}

const ACTION_COUNT: usize = 6;

/// Held state plus the press edges collected since the last snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn set_pressed(&mut self, action: InputAction, pressed: bool) {
        self.pressed[action.index()] = pressed;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn clear_pressed(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Advance => 4,
            InputAction::Cancel => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_edge_only_on_transition_to_down() {
        let mut states = ActionStates::default();
        states.set(InputAction::Advance, true);
        assert!(states.was_pressed(InputAction::Advance));

        states.clear_pressed();
        states.set(InputAction::Advance, true);
        assert!(states.is_down(InputAction::Advance));
        assert!(!states.was_pressed(InputAction::Advance));
    }

    #[test]
    fn release_keeps_edge_until_cleared() {
        let mut states = ActionStates::default();
        states.set(InputAction::MoveLeft, true);
        states.set(InputAction::MoveLeft, false);

        assert!(!states.is_down(InputAction::MoveLeft));
        assert!(states.was_pressed(InputAction::MoveLeft));
    }
}
