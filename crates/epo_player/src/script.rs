//! Input scripts: timed steps replayed against the engine.
//!
//! ```json
//! { "steps": [
//!     { "at_ms": 0,    "action": "progress", "value": 0.3 },
//!     { "at_ms": 4000, "action": "input", "value": { "type": "key", "value": "ArrowDown" } },
//!     { "at_ms": 6000, "action": "mode", "value": "emergence" },
//!     { "at_ms": 9000, "action": "snapshot" }
//! ] }
//! ```

use epo::beats::NarrativeBeatTable;
use epo::input::InputEvent;
use epo::orchestrator::PresentationMode;
use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Time the default walk spends on each beat.
pub const DEFAULT_BEAT_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ScriptAction {
    /// A raw host event.
    Input(InputEvent),
    /// Scroll to a fraction of the page.
    Progress(f32),
    /// Navigate to a beat by id.
    Navigate(String),
    Mode(PresentationMode),
    /// Log a full JSON snapshot.
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script; steps are ordered by time, keeping file order for ties.
    pub fn from_json(text: &str) -> Result<Self, PlayerError> {
        let mut script: Script = serde_json::from_str(text)?;
        script.steps.sort_by_key(|s| s.at_ms);
        Ok(script)
    }

    /// Scroll to the middle of every beat in story order, then snapshot.
    pub fn walk() -> Self {
        let beats = NarrativeBeatTable.ordered();
        let mut steps: Vec<ScriptStep> = beats
            .iter()
            .enumerate()
            .map(|(i, beat)| ScriptStep {
                at_ms: i as u64 * DEFAULT_BEAT_MS,
                action: ScriptAction::Progress((beat.lo + beat.hi) * 0.5),
            })
            .collect();
        steps.push(ScriptStep {
            at_ms: beats.len() as u64 * DEFAULT_BEAT_MS,
            action: ScriptAction::Snapshot,
        });
        Self { steps }
    }

    pub fn duration_ms(&self) -> u64 {
        self.steps.last().map_or(0, |s| s.at_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epo::input::Key;

    #[test]
    fn parses_every_action() {
        let script = Script::from_json(
            r#"{ "steps": [
                { "at_ms": 900, "action": "snapshot" },
                { "at_ms": 0, "action": "progress", "value": 0.3 },
                { "at_ms": 100, "action": "input", "value": { "type": "key", "value": "ArrowDown" } },
                { "at_ms": 100, "action": "input", "value": { "type": "wheel", "value": { "delta_y": 120.0 } } },
                { "at_ms": 200, "action": "mode", "value": "emergence" },
                { "at_ms": 300, "action": "navigate", "value": "call-to-action" }
            ] }"#,
        )
        .expect("valid script");

        let actions: Vec<_> = script.steps.iter().map(|s| s.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                ScriptAction::Progress(0.3),
                ScriptAction::Input(InputEvent::Key(Key::ArrowDown)),
                ScriptAction::Input(InputEvent::Wheel { delta_y: 120.0 }),
                ScriptAction::Mode(PresentationMode::Emergence),
                ScriptAction::Navigate("call-to-action".to_string()),
                ScriptAction::Snapshot,
            ]
        );
        assert_eq!(script.duration_ms(), 900);
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let err = Script::from_json(r#"{ "steps": [ { "at_ms": 0, "action": "teleport" } ] }"#);
        assert!(matches!(err, Err(PlayerError::Script(_))));
    }

    #[test]
    fn walk_visits_every_beat() {
        let walk = Script::walk();
        let beats = NarrativeBeatTable.ordered();
        assert_eq!(walk.steps.len(), beats.len() + 1);
        assert_eq!(walk.steps.last().map(|s| &s.action), Some(&ScriptAction::Snapshot));
        assert_eq!(walk.duration_ms(), beats.len() as u64 * DEFAULT_BEAT_MS);
    }
}
