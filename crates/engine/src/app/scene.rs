use serde::Deserialize;
use tracing::info;

use super::input::{ActionStates, InputAction};
use super::rendering::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Menu,
    Overworld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    Quit,
}

pub type SceneError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, actions: ActionStates) -> Self {
        Self {
            quit_requested,
            actions,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self.actions.set_pressed(action, false);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set(action, true);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(self) -> Option<Self> {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return None;
        }
        Some(self.scale(length.recip()))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One screen of the game. The loop calls `update` once per fixed tick and
/// `draw` once per presented frame.
pub trait Scene {
    fn load(&mut self) -> Result<(), SceneError>;
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> Result<SceneCommand, SceneError>;
    fn draw(&self, surface: &mut dyn Surface);
    fn unload(&mut self) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

pub(crate) struct SceneMachine {
    menu: SceneRuntime,
    overworld: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(
        menu: Box<dyn Scene>,
        overworld: Box<dyn Scene>,
        active_scene: SceneKey,
    ) -> Self {
        Self {
            menu: SceneRuntime {
                scene: menu,
                is_loaded: false,
            },
            overworld: SceneRuntime {
                scene: overworld,
                is_loaded: false,
            },
            active_scene,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn load_active(&mut self) -> Result<(), SceneError> {
        self.load_scene_if_needed(self.active_scene)
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> Result<SceneCommand, SceneError> {
        self.active_runtime_mut()
            .scene
            .update(fixed_dt_seconds, input)
    }

    pub(crate) fn draw_active(&self, surface: &mut dyn Surface) {
        self.active_runtime_ref().scene.draw(surface);
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        self.active_runtime_ref().scene.debug_title()
    }

    /// Returns whether the active scene changed.
    pub(crate) fn switch_to(&mut self, next_scene: SceneKey) -> Result<bool, SceneError> {
        if self.active_scene == next_scene {
            return Ok(false);
        }

        self.load_scene_if_needed(next_scene)?;
        self.active_scene = next_scene;
        info!(scene = ?next_scene, "scene_switched");
        Ok(true)
    }

    pub(crate) fn shutdown_all(&mut self) {
        for runtime in [&mut self.menu, &mut self.overworld] {
            if runtime.is_loaded {
                runtime.scene.unload();
                runtime.is_loaded = false;
            }
        }
    }

    fn load_scene_if_needed(&mut self, key: SceneKey) -> Result<(), SceneError> {
        let runtime = self.runtime_mut(key);
        if runtime.is_loaded {
            return Ok(());
        }
        runtime.scene.load()?;
        runtime.is_loaded = true;
        info!(scene = ?key, "scene_loaded");
        Ok(())
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        self.runtime_ref(self.active_scene)
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Menu => &mut self.menu,
            SceneKey::Overworld => &mut self.overworld,
        }
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Menu => &self.menu,
            SceneKey::Overworld => &self.overworld,
        }
    }
}
