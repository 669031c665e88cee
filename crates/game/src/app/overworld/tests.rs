    use super::*;
    use crate::app::assets::MemoryAssets;
    use crate::app::dialogue::{EndingPhase, NPC_BOX_KEY, PLAYER_BOX_KEY};
    use crate::app::settings::fixtures::with_character_frames;
    use crate::app::testing::RecordingSurface;
    use crate::app::world::{NpcState, Rect};

    const STEP: f32 = 1.0 / 60.0;

    const ZONA1: &str = r#"{
        "name": "Zona 1", "width": 800, "height": 600, "color": [40, 120, 40],
        "collision": [],
        "connections": {"down": "zona2"},
        "npcs": [{"name": "Guardia", "sprite": "images/npcs/guardia.png", "x": 280, "y": 440,
                  "dialogue": ["Hola"]}]
    }"#;

    const ZONA2: &str = r#"{
        "name": "Zona 2", "width": 800, "height": 600, "color": [0, 0, 0],
        "collision": [],
        "connections": {},
        "spawn_points": {"down": {"x": 300, "y": 50}}
    }"#;

    const FINAL: &str = r#"{
        "name": "Final", "width": 800, "height": 600, "color": [0, 0, 0],
        "collision": [],
        "connections": {},
        "npcs": [{"name": "Muerte", "sprite": "images/npcs/guardia.png", "x": 280, "y": 440,
                  "dialogue": ["Llegaste."], "ending": true}]
    }"#;

    fn assets() -> MemoryAssets {
        with_character_frames(MemoryAssets::default())
            .with_image(PLAYER_BOX_KEY, (440, 180))
            .with_image(NPC_BOX_KEY, (440, 180))
            .with_image("images/npcs/guardia.png", (20, 40))
            .with_map("zona1", ZONA1)
            .with_map("zona2", ZONA2)
            .with_map("final", FINAL)
    }

    fn scene_on(start_map: &str) -> OverworldScene {
        let settings = GameSettings {
            start_map: start_map.to_string(),
            ..GameSettings::default()
        };
        let mut scene = OverworldScene::new(settings, Box::new(assets()));
        scene.load().expect("load overworld");
        scene
    }

    fn state(scene: &OverworldScene) -> &OverworldState {
        scene.state.as_ref().expect("loaded")
    }

    fn advance() -> InputSnapshot {
        InputSnapshot::empty().with_action_pressed(InputAction::Advance)
    }

    fn tick(scene: &mut OverworldScene, input: &InputSnapshot) -> SceneCommand {
        scene.update(STEP, input).expect("update")
    }

    #[test]
    fn load_places_player_at_sprite_origin_on_start_map() {
        let scene = scene_on("zona1");
        let state = state(&scene);

        assert_eq!(state.world.map().id(), "zona1");
        assert_eq!(state.player.hitbox(), Rect::new(239, 460, 32, 24));
        assert_eq!(state.companion.kinematics().hitbox(), Rect::new(206, 460, 32, 24));
        assert!(!state.dialogue.is_active());
    }

    #[test]
    fn missing_start_map_fails_load() {
        let settings = GameSettings {
            start_map: "nada".to_string(),
            ..GameSettings::default()
        };
        let mut scene = OverworldScene::new(settings, Box::new(assets()));
        assert!(scene.load().is_err());
        assert!(scene.state.is_none());
    }

    #[test]
    fn talking_locks_the_player_until_the_dialogue_closes() {
        let mut scene = scene_on("zona1");

        tick(&mut scene, &advance());
        {
            let state = state(&scene);
            assert!(state.dialogue.is_active());
            assert!(!state.player.can_move());
            assert_eq!(state.world.npcs()[0].state(), NpcState::Interacting);
            assert_eq!(state.talking_to, Some(0));
        }

        let held_right = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        tick(&mut scene, &held_right);
        assert_eq!(state(&scene).player.hitbox().x, 239);

        // First press completes the line, the second closes the box.
        tick(&mut scene, &advance());
        tick(&mut scene, &advance());
        let state = state(&scene);
        assert!(!state.dialogue.is_active());
        assert!(state.player.can_move());
        assert_eq!(state.world.npcs()[0].state(), NpcState::Idle);
        assert_eq!(state.talking_to, None);
    }

    #[test]
    fn advance_far_from_npcs_does_nothing() {
        let mut scene = scene_on("zona2");
        tick(&mut scene, &advance());
        assert!(!state(&scene).dialogue.is_active());
    }

    #[test]
    fn walking_off_the_bottom_edge_loads_the_connected_map() {
        let mut scene = scene_on("zona1");
        let held_down = InputSnapshot::empty().with_action_down(InputAction::MoveDown, true);

        for _ in 0..60 {
            tick(&mut scene, &held_down);
            if state(&scene).world.map().id() == "zona2" {
                break;
            }
        }

        let state = state(&scene);
        assert_eq!(state.world.map().id(), "zona2");
        assert_eq!((state.player.hitbox().x, state.player.hitbox().y), (300, 50));
        assert_eq!(state.companion.kinematics().hitbox().x, 260);
    }

    #[test]
    fn ending_dialogue_runs_the_sequence_and_quits() {
        let mut scene = scene_on("final");
        tick(&mut scene, &advance());
        tick(&mut scene, &advance());
        tick(&mut scene, &advance());
        assert_eq!(
            state(&scene).dialogue.ending_phase(),
            Some(EndingPhase::FadeToBlack)
        );

        // Input during the sequence is ignored.
        tick(&mut scene, &advance());

        let mut command = SceneCommand::None;
        for _ in 0..(12 * 60) {
            command = tick(&mut scene, &InputSnapshot::empty());
            if command == SceneCommand::Quit {
                break;
            }
        }
        assert_eq!(command, SceneCommand::Quit);
        assert_eq!(state(&scene).dialogue.ending_phase(), Some(EndingPhase::EndGame));
    }

    #[test]
    fn dialogue_box_draws_over_the_world() {
        let mut scene = scene_on("zona1");
        tick(&mut scene, &advance());

        let mut surface = RecordingSurface::new(800, 600);
        scene.draw(&mut surface);

        let keys: Vec<String> = surface.images().into_iter().map(|(key, _, _)| key).collect();
        let player_frame = keys
            .iter()
            .position(|key| key.starts_with("images/sprites/overworld/lenard/"))
            .expect("player drawn");
        let npc_box = keys
            .iter()
            .position(|key| key == NPC_BOX_KEY)
            .expect("box drawn");
        assert!(player_frame < npc_box);
    }

    #[test]
    fn unload_drops_the_world() {
        let mut scene = scene_on("zona1");
        assert!(scene.debug_title().is_some_and(|title| title.contains("Zona 1")));
        scene.unload();
        assert!(scene.state.is_none());
        assert_eq!(tick(&mut scene, &advance()), SceneCommand::None);
    }

    fn shipped_assets() -> crate::app::assets::DiskAssets {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let assets_dir = root.join("assets");
        crate::app::assets::DiskAssets::new(&engine::AppPaths {
            maps_dir: assets_dir.join("maps"),
            assets_dir,
            root,
        })
    }

    #[test]
    fn shipped_world_loads_from_disk() {
        let mut scene = OverworldScene::new(GameSettings::default(), Box::new(shipped_assets()));
        scene.load().expect("shipped overworld");
        assert_eq!(state(&scene).world.map().id(), "zona1");

        let mut assets = shipped_assets();
        for map_id in ["zona1", "zona2", "cueva"] {
            let world = MapManager::load(&mut assets, map_id).expect("shipped map");
            for zone in world.map().teleports() {
                MapManager::load(&mut assets, &zone.target.map).expect("teleport target");
            }
        }
    }
