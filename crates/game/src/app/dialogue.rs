//! Line-based conversations and the scripted ending that follows the last
//! line of the ending NPC.

use engine::{text_width_px, Color, ScreenRect, Surface, LINE_HEIGHT_PX};
use tracing::{debug, info};

use super::assets::AssetSource;
use super::world::{Player, Portrait, Speaker, WorldError};

pub(crate) const TEXT_REVEAL_INTERVAL_SECONDS: f32 = 0.03;
pub(crate) const FADE_ALPHA_PER_SECOND: f32 = 120.0;
pub(crate) const CAPTION_SECONDS: f32 = 2.5;
pub(crate) const FINAL_IMAGE_SECONDS: f32 = 4.0;

pub(crate) const PLAYER_BOX_KEY: &str = "ui_assets/textboxplayer.png";
pub(crate) const NPC_BOX_KEY: &str = "ui_assets/textboxnpc.png";
pub(crate) const FINAL_IMAGE_KEY: &str = "images/Elfinal.png";
pub(crate) const FIRST_CAPTION: &str = "Tu destino está escrito...";
pub(crate) const SECOND_CAPTION: &str = "Pero aún puedes cambiarlo.";

const BOX_HEIGHT_PX: f32 = 450.0;
const BOX_OFFSET_X: i32 = -140;
const BOX_OFFSET_Y: i32 = 10;
const TEXT_OFFSET_X: i32 = 220;
const TEXT_OFFSET_Y: i32 = 205;
const LINE_SPACING_PX: i32 = 28;
const TEXT_COLOR: Color = Color::WHITE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndingPhase {
    FadeToBlack,
    ShowText1,
    ShowText2,
    ShowImage,
    EndGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogueOutcome {
    Ignored,
    LineCompleted,
    NextLine,
    Closed,
    EndingStarted,
}

#[derive(Debug)]
struct Conversation {
    lines: Vec<String>,
    index: usize,
    revealed_chars: usize,
    reveal_timer: f32,
    speaker: Speaker,
    portrait: Option<Portrait>,
    leads_to_ending: bool,
}

impl Conversation {
    fn line(&self) -> &str {
        self.lines.get(self.index).map(String::as_str).unwrap_or("")
    }

    fn line_len(&self) -> usize {
        self.line().chars().count()
    }

    fn is_line_complete(&self) -> bool {
        self.revealed_chars >= self.line_len()
    }

    fn revealed_text(&self) -> &str {
        let line = self.line();
        let end = line
            .char_indices()
            .nth(self.revealed_chars)
            .map(|(offset, _)| offset)
            .unwrap_or(line.len());
        &line[..end]
    }

    fn reveal(&mut self, dt: f32) {
        if self.is_line_complete() {
            return;
        }
        self.reveal_timer += dt;
        let total = self.line_len();
        while self.reveal_timer >= TEXT_REVEAL_INTERVAL_SECONDS {
            self.reveal_timer -= TEXT_REVEAL_INTERVAL_SECONDS;
            if self.revealed_chars < total {
                self.revealed_chars += 1;
            }
        }
    }
}

#[derive(Debug)]
struct EndingSequence {
    phase: EndingPhase,
    fade_alpha: f32,
    timer: f32,
}

impl EndingSequence {
    fn new() -> Self {
        Self {
            phase: EndingPhase::FadeToBlack,
            fade_alpha: 0.0,
            timer: 0.0,
        }
    }

    fn advance(&mut self, dt: f32) {
        let next = match self.phase {
            EndingPhase::FadeToBlack => {
                self.fade_alpha += FADE_ALPHA_PER_SECOND * dt;
                if self.fade_alpha < 255.0 {
                    return;
                }
                self.fade_alpha = 255.0;
                EndingPhase::ShowText1
            }
            EndingPhase::ShowText1 | EndingPhase::ShowText2 | EndingPhase::ShowImage => {
                let duration = if self.phase == EndingPhase::ShowImage {
                    FINAL_IMAGE_SECONDS
                } else {
                    CAPTION_SECONDS
                };
                self.timer += dt;
                if self.timer < duration {
                    return;
                }
                self.timer = 0.0;
                match self.phase {
                    EndingPhase::ShowText1 => EndingPhase::ShowText2,
                    EndingPhase::ShowText2 => EndingPhase::ShowImage,
                    _ => EndingPhase::EndGame,
                }
            }
            EndingPhase::EndGame => return,
        };
        info!(from = ?self.phase, to = ?next, "ending_phase_changed");
        self.phase = next;
    }
}

#[derive(Debug)]
enum DialogueState {
    Inactive,
    Talking(Conversation),
    Ending(EndingSequence),
}

/// Pixel layout derived from the text box images.
#[derive(Debug, Clone, Copy)]
struct DialogueLayout {
    box_scale: f32,
    box_height: i32,
    final_image: Option<(i32, i32)>,
}

#[derive(Debug)]
pub(crate) struct DialogueSystem {
    state: DialogueState,
    layout: DialogueLayout,
}

impl DialogueSystem {
    pub(crate) fn new(assets: &mut dyn AssetSource) -> Result<Self, WorldError> {
        let (_, player_box_height) = assets.image_size(PLAYER_BOX_KEY)?;
        assets.image_size(NPC_BOX_KEY)?;
        let box_scale = BOX_HEIGHT_PX / player_box_height.max(1) as f32;
        let final_image = match assets.image_size(FINAL_IMAGE_KEY) {
            Ok((width, height)) => Some((width as i32, height as i32)),
            Err(error) => {
                debug!(error = %error, "final_image_unavailable");
                None
            }
        };

        Ok(Self {
            state: DialogueState::Inactive,
            layout: DialogueLayout {
                box_scale,
                box_height: BOX_HEIGHT_PX as i32,
                final_image,
            },
        })
    }

    /// True while a conversation or the ending sequence owns the screen.
    pub(crate) fn is_active(&self) -> bool {
        !matches!(self.state, DialogueState::Inactive)
    }

    pub(crate) fn ending_phase(&self) -> Option<EndingPhase> {
        match &self.state {
            DialogueState::Ending(sequence) => Some(sequence.phase),
            _ => None,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.ending_phase() == Some(EndingPhase::EndGame)
    }

    #[cfg(test)]
    pub(crate) fn line_index(&self) -> Option<usize> {
        match &self.state {
            DialogueState::Talking(conversation) => Some(conversation.index),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn revealed_text(&self) -> &str {
        match &self.state {
            DialogueState::Talking(conversation) => conversation.revealed_text(),
            _ => "",
        }
    }

    /// Starts a conversation and takes control away from the player. Empty
    /// line lists are ignored, as is any call once the ending has begun.
    pub(crate) fn start(
        &mut self,
        lines: &[String],
        speaker: Speaker,
        portrait: Option<Portrait>,
        leads_to_ending: bool,
        player: &mut Player,
    ) {
        if lines.is_empty() || matches!(self.state, DialogueState::Ending(_)) {
            return;
        }
        info!(
            lines = lines.len(),
            speaker = ?speaker,
            has_portrait = portrait.is_some(),
            leads_to_ending,
            "dialogue_started"
        );
        self.state = DialogueState::Talking(Conversation {
            lines: lines.to_vec(),
            index: 0,
            revealed_chars: 0,
            reveal_timer: 0.0,
            speaker,
            portrait,
            leads_to_ending,
        });
        player.set_can_move(false);
    }

    pub(crate) fn handle_input(&mut self, player: &mut Player) -> DialogueOutcome {
        let DialogueState::Talking(conversation) = &mut self.state else {
            return DialogueOutcome::Ignored;
        };

        if !conversation.is_line_complete() {
            conversation.revealed_chars = conversation.line_len();
            return DialogueOutcome::LineCompleted;
        }

        conversation.index += 1;
        if conversation.index < conversation.lines.len() {
            conversation.revealed_chars = 0;
            conversation.reveal_timer = 0.0;
            return DialogueOutcome::NextLine;
        }

        if conversation.leads_to_ending {
            self.state = DialogueState::Ending(EndingSequence::new());
            player.set_can_move(false);
            info!("ending_sequence_started");
            return DialogueOutcome::EndingStarted;
        }

        self.state = DialogueState::Inactive;
        player.set_can_move(true);
        info!("dialogue_closed");
        DialogueOutcome::Closed
    }

    pub(crate) fn update(&mut self, dt: f32) {
        match &mut self.state {
            DialogueState::Inactive => {}
            DialogueState::Talking(conversation) => conversation.reveal(dt),
            DialogueState::Ending(sequence) => sequence.advance(dt),
        }
    }

    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        match &self.state {
            DialogueState::Inactive => {}
            DialogueState::Talking(conversation) => self.draw_conversation(surface, conversation),
            DialogueState::Ending(sequence) => self.draw_ending(surface, sequence),
        }
    }

    fn draw_conversation(&self, surface: &mut dyn Surface, conversation: &Conversation) {
        let (_, screen_height) = surface.size();
        let box_x = BOX_OFFSET_X;
        let box_y = screen_height as i32 - self.layout.box_height + BOX_OFFSET_Y;

        if let Some(portrait) = &conversation.portrait {
            surface.draw_image(
                &portrait.path,
                box_x + portrait.offset_x,
                box_y + portrait.offset_y,
                portrait.scale,
            );
        }

        let box_key = match conversation.speaker {
            Speaker::Npc => NPC_BOX_KEY,
            Speaker::Player => PLAYER_BOX_KEY,
        };
        surface.draw_image(box_key, box_x, box_y, self.layout.box_scale);

        let text_x = box_x + TEXT_OFFSET_X;
        let mut text_y = box_y + TEXT_OFFSET_Y;
        for line in conversation.revealed_text().split('\n') {
            surface.draw_text(line, text_x, text_y, TEXT_COLOR);
            text_y += LINE_SPACING_PX;
        }
    }

    fn draw_ending(&self, surface: &mut dyn Surface, sequence: &EndingSequence) {
        let (width, height) = surface.size();
        let (width, height) = (width as i32, height as i32);
        surface.fill_rect(
            ScreenRect::new(0, 0, width, height),
            Color::BLACK.with_alpha(sequence.fade_alpha as u8),
        );

        let caption = match sequence.phase {
            EndingPhase::ShowText1 => Some(FIRST_CAPTION),
            EndingPhase::ShowText2 => Some(SECOND_CAPTION),
            _ => None,
        };
        if let Some(caption) = caption {
            surface.draw_text(
                caption,
                (width - text_width_px(caption)) / 2,
                (height - LINE_HEIGHT_PX) / 2,
                TEXT_COLOR,
            );
        }

        if sequence.phase == EndingPhase::ShowImage {
            if let Some((image_width, image_height)) = self.layout.final_image {
                surface.draw_image(
                    FINAL_IMAGE_KEY,
                    width / 2 - image_width / 2,
                    height / 2 - image_height / 2,
                    1.0,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::assets::MemoryAssets;
    use crate::app::testing::RecordingSurface;
    use crate::app::world::{Kinematics, Rect, SpriteSet};

    fn assets() -> MemoryAssets {
        MemoryAssets::default()
            .with_image(PLAYER_BOX_KEY, (440, 180))
            .with_image(NPC_BOX_KEY, (440, 180))
    }

    fn dialogue() -> DialogueSystem {
        DialogueSystem::new(&mut assets()).expect("dialogue")
    }

    fn player() -> Player {
        Player::new(
            Kinematics::new((40, 40), Rect::new(100, 100, 32, 24)),
            SpriteSet::walk_cycle(1.0, |direction, pose| {
                format!("{}_{pose}.png", direction.name())
            }),
            200.0,
        )
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn run_for(dialogue: &mut DialogueSystem, seconds: f32, dt: f32) {
        let steps = (seconds / dt).round() as usize;
        for _ in 0..steps {
            dialogue.update(dt);
        }
    }

    #[test]
    fn empty_dialogue_is_ignored() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&[], Speaker::Npc, None, false, &mut player);

        assert!(!dialogue.is_active());
        assert!(player.can_move());
    }

    #[test]
    fn start_blocks_player_movement() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&lines(&["Hola"]), Speaker::Npc, None, false, &mut player);

        assert!(dialogue.is_active());
        assert!(!player.can_move());
        assert_eq!(dialogue.line_index(), Some(0));
        assert_eq!(dialogue.revealed_text(), "");
    }

    #[test]
    fn reveal_appends_one_character_per_interval_and_never_shrinks() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&lines(&["Buenas tardes"]), Speaker::Npc, None, false, &mut player);

        let mut previous = 0;
        for _ in 0..40 {
            dialogue.update(0.01);
            let revealed = dialogue.revealed_text().chars().count();
            assert!(revealed >= previous);
            previous = revealed;
        }
        assert_eq!(previous, "Buenas tardes".len());

        let mut dialogue = self::dialogue();
        dialogue.start(&lines(&["abcdef"]), Speaker::Npc, None, false, &mut player);
        dialogue.update(0.095);
        assert_eq!(dialogue.revealed_text(), "abc");
    }

    #[test]
    fn reveal_handles_multibyte_characters() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&lines(&["¿Qué?"]), Speaker::Npc, None, false, &mut player);

        dialogue.update(0.065);
        assert_eq!(dialogue.revealed_text(), "¿Q");
    }

    #[test]
    fn input_before_completion_shows_full_line_without_advancing() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&lines(&["Primera", "Segunda"]), Speaker::Npc, None, false, &mut player);
        dialogue.update(0.05);

        assert_eq!(dialogue.handle_input(&mut player), DialogueOutcome::LineCompleted);
        assert_eq!(dialogue.revealed_text(), "Primera");
        assert_eq!(dialogue.line_index(), Some(0));

        assert_eq!(dialogue.handle_input(&mut player), DialogueOutcome::NextLine);
        assert_eq!(dialogue.line_index(), Some(1));
        assert_eq!(dialogue.revealed_text(), "");
    }

    #[test]
    fn finishing_last_line_releases_player() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&lines(&["Fin"]), Speaker::Player, None, false, &mut player);

        dialogue.handle_input(&mut player);
        assert_eq!(dialogue.handle_input(&mut player), DialogueOutcome::Closed);
        assert!(!dialogue.is_active());
        assert!(player.can_move());
        assert_eq!(dialogue.handle_input(&mut player), DialogueOutcome::Ignored);
    }

    #[test]
    fn ending_sequence_runs_through_timed_phases_and_cannot_be_cancelled() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(
            &lines(&["MUERTE: \nY ustedes tambien."]),
            Speaker::Npc,
            None,
            true,
            &mut player,
        );
        dialogue.handle_input(&mut player);
        assert_eq!(dialogue.handle_input(&mut player), DialogueOutcome::EndingStarted);
        assert_eq!(dialogue.ending_phase(), Some(EndingPhase::FadeToBlack));
        assert!(!player.can_move());

        let dt = 0.01;
        let mut fade_ticks = 0;
        while dialogue.ending_phase() == Some(EndingPhase::FadeToBlack) {
            dialogue.update(dt);
            fade_ticks += 1;
            assert_eq!(dialogue.handle_input(&mut player), DialogueOutcome::Ignored);
            dialogue.start(&lines(&["otra"]), Speaker::Npc, None, false, &mut player);
            assert!(fade_ticks < 1000);
        }
        let fade_seconds = fade_ticks as f32 * dt;
        assert!(fade_seconds >= 2.125 && fade_seconds < 2.14, "{fade_seconds}");
        assert_eq!(dialogue.ending_phase(), Some(EndingPhase::ShowText1));

        run_for(&mut dialogue, 2.45, dt);
        assert_eq!(dialogue.ending_phase(), Some(EndingPhase::ShowText1));
        run_for(&mut dialogue, 0.1, dt);
        assert_eq!(dialogue.ending_phase(), Some(EndingPhase::ShowText2));

        run_for(&mut dialogue, 2.55, dt);
        assert_eq!(dialogue.ending_phase(), Some(EndingPhase::ShowImage));
        run_for(&mut dialogue, 3.8, dt);
        assert!(!dialogue.is_finished());
        run_for(&mut dialogue, 0.2, dt);
        assert!(dialogue.is_finished());

        dialogue.update(10.0);
        assert!(dialogue.is_finished());
        assert!(!player.can_move());
    }

    #[test]
    fn conversation_draws_portrait_then_box_then_text_lines() {
        let mut dialogue = dialogue();
        let mut player = player();
        let portrait = Portrait {
            path: "images/portraits/guardia.png".to_string(),
            scale: 2.0,
            offset_x: 30,
            offset_y: -60,
        };
        dialogue.start(
            &lines(&["Uno\nDos"]),
            Speaker::Npc,
            Some(portrait),
            false,
            &mut player,
        );
        dialogue.handle_input(&mut player);

        let mut surface = RecordingSurface::new(800, 600);
        dialogue.draw(&mut surface);

        assert_eq!(
            surface.images(),
            vec![
                ("images/portraits/guardia.png".to_string(), -110, 100),
                (NPC_BOX_KEY.to_string(), -140, 160),
            ]
        );
        assert_eq!(
            surface.texts(),
            vec![("Uno".to_string(), 80, 365), ("Dos".to_string(), 80, 393)]
        );
    }

    #[test]
    fn ending_draws_overlay_and_centred_caption() {
        let mut dialogue = dialogue();
        let mut player = player();
        dialogue.start(&lines(&["x"]), Speaker::Npc, None, true, &mut player);
        dialogue.handle_input(&mut player);
        dialogue.handle_input(&mut player);
        run_for(&mut dialogue, 2.2, 0.01);

        let mut surface = RecordingSurface::new(800, 600);
        dialogue.draw(&mut surface);

        assert_eq!(surface.filled_rects()[0].1.a, 255);
        let (text, x, _) = surface.texts()[0].clone();
        assert_eq!(text, FIRST_CAPTION);
        assert_eq!(x, (800 - text_width_px(FIRST_CAPTION)) / 2);
    }
}
