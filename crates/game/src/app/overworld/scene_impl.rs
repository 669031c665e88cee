pub(crate) struct OverworldScene {
    settings: GameSettings,
    assets: Box<dyn AssetSource>,
    state: Option<OverworldState>,
}

impl OverworldScene {
    pub(crate) fn new(settings: GameSettings, assets: Box<dyn AssetSource>) -> Self {
        Self {
            settings,
            assets,
            state: None,
        }
    }
}

impl Scene for OverworldScene {
    fn load(&mut self) -> Result<(), SceneError> {
        let state = OverworldState::build(&self.settings, self.assets.as_mut())?;
        info!(map = %self.settings.start_map, "overworld_loaded");
        self.state = Some(state);
        Ok(())
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> Result<SceneCommand, SceneError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(SceneCommand::None);
        };
        Ok(state.update(fixed_dt_seconds, input, self.assets.as_mut())?)
    }

    fn draw(&self, surface: &mut dyn Surface) {
        if let Some(state) = &self.state {
            state.draw(surface);
        }
    }

    fn unload(&mut self) {
        self.state = None;
    }

    fn debug_title(&self) -> Option<String> {
        let state = self.state.as_ref()?;
        let hitbox = state.player.hitbox();
        Some(format!(
            "Quimera - {} ({}, {})",
            state.world.map().name(),
            hitbox.x,
            hitbox.y
        ))
    }
}
