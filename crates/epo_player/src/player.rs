//! Drives a presentation from a script, acting as the host page.

use epo::config::{Preferences, StaticConfig};
use epo::content::StaticContent;
use epo::input::InputEvent;
use epo::observer::EngineAdapter;
use epo::orchestrator::{NarrativeEvent, OrchestratorConfig, PresentationOrchestrator};
use epo::surface::{RecordingCanvas, RecordingCardSurface};
use tracing::{debug, info, warn};

use crate::error::PlayerError;
use crate::script::{Script, ScriptAction};

/// Scrollable height of the simulated page.
pub const PAGE_SCROLL: f32 = 10_000.0;

pub struct Player {
    show: PresentationOrchestrator,
    script: Script,
    cursor: usize,
    elapsed_ms: u64,
    scroll_y: f32,
    events: Vec<NarrativeEvent>,
}

impl Player {
    pub fn new(config: OrchestratorConfig, prefs: Preferences, script: Script) -> Result<Self, PlayerError> {
        let mut show = PresentationOrchestrator::new(
            config.clone(),
            Box::new(RecordingCanvas::new(config.viewport.width, config.viewport.height)),
            None,
            Box::new(RecordingCardSurface::new()),
            Box::new(StaticContent),
            Box::new(StaticConfig::new(prefs)),
        )?;
        show.handle_input(InputEvent::Scroll {
            y: 0.0,
            max: PAGE_SCROLL,
        });
        Ok(Self {
            show,
            script,
            cursor: 0,
            elapsed_ms: 0,
            scroll_y: 0.0,
            events: Vec::new(),
        })
    }

    pub fn show(&self) -> &PresentationOrchestrator {
        &self.show
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// True once every step has been applied.
    pub fn script_done(&self) -> bool {
        self.cursor >= self.script.steps.len()
    }

    /// Every narrative event seen so far.
    pub fn events(&self) -> &[NarrativeEvent] {
        &self.events
    }

    /// Advance by `dt` seconds: apply due steps, tick, render and honour
    /// scroll requests the way a browser would.
    pub fn frame(&mut self, dt: f32) {
        self.elapsed_ms += (dt.max(0.0) * 1000.0).round() as u64;
        while let Some(step) = self.script.steps.get(self.cursor) {
            if step.at_ms > self.elapsed_ms {
                break;
            }
            let action = step.action.clone();
            self.cursor += 1;
            self.apply(action);
        }

        self.show.tick(dt);
        self.show.render();

        if let Some(y) = self.show.take_scroll_request() {
            self.scroll_to(y);
        }
        for event in self.show.take_events() {
            log_event(&event);
            self.events.push(event);
        }
    }

    fn apply(&mut self, action: ScriptAction) {
        debug!(at_ms = self.elapsed_ms, ?action, "script step");
        match action {
            ScriptAction::Input(event) => {
                if let InputEvent::Scroll { y, .. } = event {
                    self.scroll_y = y;
                }
                self.show.handle_input(event);
            }
            ScriptAction::Progress(p) => self.scroll_to(p.clamp(0.0, 1.0) * PAGE_SCROLL),
            ScriptAction::Navigate(beat) => {
                if let Err(e) = self.show.navigate_to(&beat) {
                    warn!("script navigation failed: {e}");
                }
            }
            ScriptAction::Mode(mode) => self.show.set_mode(mode),
            ScriptAction::Snapshot => self.log_snapshot(),
        }
    }

    fn scroll_to(&mut self, y: f32) {
        self.scroll_y = y.clamp(0.0, PAGE_SCROLL);
        self.show.handle_input(InputEvent::Scroll {
            y: self.scroll_y,
            max: PAGE_SCROLL,
        });
    }

    pub fn summary(&self) -> String {
        EngineAdapter::new(&self.show).summary()
    }

    pub fn log_snapshot(&self) {
        match serde_json::to_string(&EngineAdapter::new(&self.show).snapshot()) {
            Ok(json) => info!(snapshot = %json, "engine snapshot"),
            Err(e) => warn!("snapshot failed: {e}"),
        }
    }

    pub fn finish(mut self) -> Vec<NarrativeEvent> {
        self.show.destroy();
        info!(elapsed_ms = self.elapsed_ms, events = self.events.len(), "player finished");
        self.events
    }
}

fn log_event(event: &NarrativeEvent) {
    match event {
        NarrativeEvent::BeatEntered { beat, level } => info!(beat = *beat, level = *level, "beat entered"),
        NarrativeEvent::BeatChangeDropped { requested } => debug!(requested = *requested, "beat change dropped"),
        NarrativeEvent::ModeChanged { mode } => info!(mode = mode.label(), "mode changed"),
        NarrativeEvent::DepthChanged { state } => info!(state = state.label(), "depth changed"),
        NarrativeEvent::BehaviorFailed { beat, reason } => warn!(beat = *beat, %reason, "behavior failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptStep;
    use epo::depth::DepthState;
    use epo::input::Key;
    use epo::orchestrator::PresentationMode;

    const DT: f32 = 1.0 / 60.0;

    fn run(player: &mut Player, ms: u64) {
        let frames = ms * 60 / 1000;
        for _ in 0..frames {
            player.frame(DT);
        }
    }

    fn entered(events: &[NarrativeEvent]) -> Vec<&'static str> {
        events
            .iter()
            .filter_map(|e| match e {
                NarrativeEvent::BeatEntered { beat, .. } => Some(*beat),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn walk_enters_every_beat_in_order() {
        let script = Script::walk();
        let mut player = Player::new(OrchestratorConfig::default(), Preferences::default(), script.clone())
            .expect("recording surfaces");
        run(&mut player, script.duration_ms() + 1_000);
        assert!(player.script_done());
        assert_eq!(player.show().active_beat().map(|b| b.id), Some("call-to-action"));

        let events = player.finish();
        let ids: Vec<_> = epo::beats::NarrativeBeatTable.ordered().iter().map(|b| b.id).collect();
        assert_eq!(entered(&events), ids);
    }

    #[test]
    fn keyboard_navigation_moves_the_page() {
        let script = Script {
            steps: vec![ScriptStep {
                at_ms: 0,
                action: ScriptAction::Input(InputEvent::Key(Key::ArrowDown)),
            }],
        };
        let mut player = Player::new(OrchestratorConfig::default(), Preferences::default(), script)
            .expect("recording surfaces");
        run(&mut player, 3_000);
        assert!(player.scroll_y() > 0.0);
        assert_eq!(player.show().active_beat().map(|b| b.id), Some("crisis-building"));
    }

    #[test]
    fn modes_and_bad_navigation() {
        let script = Script {
            steps: vec![
                ScriptStep {
                    at_ms: 0,
                    action: ScriptAction::Navigate("nowhere".to_string()),
                },
                ScriptStep {
                    at_ms: 100,
                    action: ScriptAction::Mode(PresentationMode::Depth),
                },
            ],
        };
        let mut player = Player::new(OrchestratorConfig::default(), Preferences::default(), script)
            .expect("recording surfaces");
        run(&mut player, 8_000);
        assert_eq!(player.show().mode(), PresentationMode::Depth);
        assert_eq!(player.show().active_beat().map(|b| b.id), Some("genesis"));
        assert!(player
            .events()
            .iter()
            .any(|e| matches!(e, NarrativeEvent::DepthChanged { state: DepthState::Depth })));
    }
}
