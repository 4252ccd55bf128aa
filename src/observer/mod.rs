use crate::cards::{Card, CardLifecycleManager};
use crate::depth::{DepthState, DepthTransitionController};
use crate::forces::EpoForces;
use crate::orchestrator::{PresentationMode, PresentationOrchestrator};
use crate::renderer::{EmergenceRenderer, FrameStats, RenderPath, TransitionStyle};

#[cfg(feature = "serde")]
use serde::Serialize;

/// A read-only snapshot of what the presentation is doing.
///
/// Design intent:
/// - Observers cannot steer the engine; adapters only borrow it immutably.
/// - Snapshotting is *on-demand* and can allocate; the frame loop stays unchanged.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EngineSnapshot {
    pub beat: Option<&'static str>,
    pub beat_index: Option<usize>,
    pub beat_progress: f32,
    pub progress: f32,
    pub mode: PresentationMode,
    pub transitioning: bool,
    pub emergence: EmergenceSnapshot,
    pub depth: DepthSnapshot,
    pub cards: Vec<CardSnapshot>,
    pub running_behaviors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EmergenceSnapshot {
    pub level: usize,
    pub level_name: &'static str,
    pub transition_target: Option<usize>,
    pub transition_style: Option<TransitionStyle>,
    pub transition_progress: f32,
    pub zoom: f32,
    pub particles: usize,
    pub forces: EpoForces,
    pub render_path: RenderPath,
    pub frames: FrameStats,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DepthSnapshot {
    pub state: DepthState,
    pub section: Option<String>,
    pub camera_z: f32,
    pub tunnel_particles: usize,
    pub listening: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CardSnapshot {
    pub id: u64,
    pub section: String,
    pub geometry: &'static str,
    pub center: [f32; 2],
    pub size: [f32; 2],
    pub opacity: f32,
    pub busy: bool,
}

impl CardSnapshot {
    fn of(card: &Card) -> Self {
        Self {
            id: card.id.0,
            section: card.section.clone(),
            geometry: card.geometry,
            center: [card.rect.center.x, card.rect.center.y],
            size: [card.rect.size.width, card.rect.size.height],
            opacity: card.opacity,
            busy: card.is_busy(),
        }
    }
}

pub struct EmergenceAdapter<'a> {
    renderer: &'a EmergenceRenderer,
}

impl<'a> EmergenceAdapter<'a> {
    pub fn new(renderer: &'a EmergenceRenderer) -> Self {
        Self { renderer }
    }

    pub fn snapshot(&self) -> EmergenceSnapshot {
        let r = self.renderer;
        let transition = r.transition();
        EmergenceSnapshot {
            level: r.current_level(),
            level_name: r.current_level_name(),
            transition_target: transition.map(|t| t.target),
            transition_style: transition.map(|t| t.style),
            transition_progress: transition.map_or(0.0, |t| t.progress),
            zoom: r.zoom(),
            particles: r.particle_count(),
            forces: r.forces(),
            render_path: r.render_path(),
            frames: r.frame_stats(),
            visible: r.is_visible(),
        }
    }
}

pub struct DepthAdapter<'a> {
    depth: &'a DepthTransitionController,
}

impl<'a> DepthAdapter<'a> {
    pub fn new(depth: &'a DepthTransitionController) -> Self {
        Self { depth }
    }

    pub fn snapshot(&self) -> DepthSnapshot {
        DepthSnapshot {
            state: self.depth.state(),
            section: self.depth.section().map(str::to_string),
            camera_z: self.depth.camera().z,
            tunnel_particles: self.depth.tunnel().len(),
            listening: self.depth.is_listening(),
        }
    }
}

pub fn card_snapshots(cards: &CardLifecycleManager) -> Vec<CardSnapshot> {
    cards.cards().iter().map(CardSnapshot::of).collect()
}

pub struct EngineAdapter<'a> {
    show: &'a PresentationOrchestrator,
}

impl<'a> EngineAdapter<'a> {
    pub fn new(show: &'a PresentationOrchestrator) -> Self {
        Self { show }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let resolution = self.show.last_resolution();
        EngineSnapshot {
            beat: self.show.active_beat().map(|b| b.id),
            beat_index: resolution.map(|r| r.beat_index),
            beat_progress: resolution.map_or(0.0, |r| r.beat_progress),
            progress: self.show.progress(),
            mode: self.show.mode(),
            transitioning: self.show.is_transitioning(),
            emergence: EmergenceAdapter::new(self.show.renderer()).snapshot(),
            depth: DepthAdapter::new(self.show.depth()).snapshot(),
            cards: card_snapshots(self.show.cards()),
            running_behaviors: self
                .show
                .behaviors()
                .active()
                .into_iter()
                .map(|(_, label)| label)
                .collect(),
        }
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "beat={} p={:.3} mode={} level={} cards={} particles={} depth={} path={:?}",
            s.beat.unwrap_or("-"),
            s.progress,
            s.mode.label(),
            s.emergence.level,
            s.cards.len(),
            s.emergence.particles,
            s.depth.state.label(),
            s.emergence.render_path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::orchestrator::OrchestratorConfig;

    #[test]
    fn snapshot_follows_the_narrative() {
        let mut show = PresentationOrchestrator::headless(OrchestratorConfig::default()).expect("headless");
        let s = EngineAdapter::new(&show).snapshot();
        assert_eq!(s.beat, Some("genesis"));
        assert_eq!(s.cards.len(), 1);
        assert_eq!(s.running_behaviors, vec!["unified-origin"]);
        assert_eq!(s.depth.state, DepthState::Surface);
        assert_eq!(s.emergence.render_path, RenderPath::Canvas);

        show.handle_input(InputEvent::Scroll { y: 4000.0, max: 10_000.0 });
        show.tick(1.0 / 60.0);
        let s = EngineAdapter::new(&show).snapshot();
        assert!(s.transitioning);
        assert_eq!(s.beat, Some("genesis"));
        assert_eq!(s.beat_index, Some(5));
        assert!(s.cards.iter().all(|c| c.busy));
        assert!(EngineAdapter::new(&show).summary().starts_with("beat=genesis"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_serializes() {
        let show = PresentationOrchestrator::headless(OrchestratorConfig::default()).expect("headless");
        let json = serde_json::to_value(EngineAdapter::new(&show).snapshot()).expect("serializable");
        assert_eq!(json["beat"], "genesis");
        assert_eq!(json["mode"], "hybrid");
        assert_eq!(json["depth"]["state"], "surface");
        assert_eq!(json["emergence"]["render_path"], "canvas");
    }
}
