/// Everything that exists only while the overworld is loaded.
#[derive(Debug)]
struct OverworldState {
    world: MapManager,
    player: Player,
    companion: Companion,
    dialogue: DialogueSystem,
    talking_to: Option<usize>,
}

impl OverworldState {
    fn build(settings: &GameSettings, assets: &mut dyn AssetSource) -> Result<Self, WorldError> {
        let player = settings.spawn_player(assets)?;
        let companion = settings.spawn_companion(assets)?;
        let dialogue = DialogueSystem::new(assets)?;
        let world = MapManager::load(assets, &settings.start_map)?;
        Ok(Self {
            world,
            player,
            companion,
            dialogue,
            talking_to: None,
        })
    }

    fn update(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        assets: &mut dyn AssetSource,
    ) -> Result<SceneCommand, WorldError> {
        if input.was_pressed(InputAction::Advance) {
            self.advance_dialogue();
        }

        self.player.update(dt, input, self.world.map().collision());
        self.companion.follow(&self.player, dt);

        let transitions = self
            .world
            .update(dt, assets, &mut self.player, &mut self.companion)?;
        for transition in &transitions {
            debug!(
                from = %transition.from,
                to = %transition.to,
                cause = ?transition.cause,
                "overworld_map_changed"
            );
            // NPC indices belong to the map that was just replaced.
            self.talking_to = None;
        }

        self.dialogue.update(dt);
        if self.dialogue.is_finished() {
            info!("game_ended");
            return Ok(SceneCommand::Quit);
        }
        Ok(SceneCommand::None)
    }

    /// Advance key: drives an open conversation, otherwise talks to the
    /// nearest NPC in reach.
    fn advance_dialogue(&mut self) {
        if self.dialogue.is_active() {
            if self.dialogue.handle_input(&mut self.player) == DialogueOutcome::Closed {
                self.release_npc();
            }
            return;
        }

        let Some(index) = self.world.interaction_target(self.player.hitbox()) else {
            return;
        };
        let Some(npc) = self.world.npc_mut(index) else {
            return;
        };
        let speaker = npc.speaker();
        let portrait = npc.portrait().cloned();
        let leads_to_ending = npc.triggers_ending();
        let name = npc.name().to_string();
        let lines = npc.interact().to_vec();
        if lines.is_empty() {
            npc.end_interaction();
            return;
        }

        info!(npc = %name, leads_to_ending, "npc_interaction");
        self.dialogue
            .start(&lines, speaker, portrait, leads_to_ending, &mut self.player);
        self.talking_to = Some(index);
    }

    fn release_npc(&mut self) {
        if let Some(npc) = self.talking_to.take().and_then(|index| self.world.npc_mut(index)) {
            npc.end_interaction();
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        self.world
            .draw(surface, &self.player, Some(&self.companion));
        self.dialogue.draw(surface);
    }
}
