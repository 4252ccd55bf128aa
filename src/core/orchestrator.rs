//! Top-level coordinator.
//!
//! The orchestrator owns every component and the [`InputBus`]. Hosts call
//! [`PresentationOrchestrator::handle_input`] from their event callbacks,
//! then [`PresentationOrchestrator::tick`] and
//! [`PresentationOrchestrator::render`] once per animation frame. Input is
//! queued and consumed at the start of the next tick, so scroll handling is
//! naturally throttled to frame granularity.
//!
//! A beat change runs as: cancel running choreographies, start exit runs on
//! every live card, wait for them to settle, then create the new beat's cards,
//! start its behavior, move the emergence field and apply the beat's forces.
//! Beat changes that arrive while that is in flight are dropped; the last
//! observed scroll position is resolved once more when it settles.

use std::collections::VecDeque;

use tracing::{debug, error, info, warn};

use crate::beats::{CardCount, ExitStyle, NarrativeBeat, NarrativeBeatTable};
use crate::behaviors::{apply_beat_progress, initial_layout, BehaviorEngine, RunId};
use crate::cards::{CardId, CardLifecycleManager, CardOptions};
use crate::clock::clamp_delta;
use crate::config::{ConfigSource, Preferences, SectionVisualParams, StaticConfig};
use crate::content::{ContentSource, StaticContent};
use crate::depth::{DepthConfig, DepthState, DepthTransitionController};
use crate::error::{InitError, NavigationError};
use crate::geometry::{Size2, Vec2};
use crate::input::{Channel, InputBus, InputEvent, Key, ListenerId, Subscriber};
use crate::prng::Prng;
use crate::renderer::{EmergenceRenderer, RenderPath, RendererConfig, TransitionStyle};
use crate::scroll::{ScrollMapper, ScrollResolution};
use crate::surface::{Canvas2d, CardSurface, GpuSurface, RecordingCanvas, RecordingCardSurface};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Vertical swipe distance that counts as a navigation gesture.
pub const SWIPE_THRESHOLD_PX: f32 = 50.0;

const EMERGENCE_FOCUSED_PRIORITY: i32 = 20;
const EMERGENCE_BACKGROUND_PRIORITY: i32 = -5;
const MODES_PRIORITY: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PresentationMode {
    Cards,
    Emergence,
    #[default]
    Hybrid,
    Depth,
}

impl PresentationMode {
    pub fn all() -> &'static [PresentationMode] {
        &[
            PresentationMode::Cards,
            PresentationMode::Emergence,
            PresentationMode::Hybrid,
            PresentationMode::Depth,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            PresentationMode::Cards => "cards",
            PresentationMode::Emergence => "emergence",
            PresentationMode::Hybrid => "hybrid",
            PresentationMode::Depth => "depth",
        }
    }

    /// `h` / `e` / `c` / `f`.
    pub fn from_key(key: &Key) -> Option<PresentationMode> {
        match key {
            Key::Char('h') | Key::Char('H') => Some(PresentationMode::Hybrid),
            Key::Char('e') | Key::Char('E') => Some(PresentationMode::Emergence),
            Key::Char('c') | Key::Char('C') => Some(PresentationMode::Cards),
            Key::Char('f') | Key::Char('F') => Some(PresentationMode::Depth),
            _ => None,
        }
    }

    fn shows_cards(self) -> bool {
        !matches!(self, PresentationMode::Emergence)
    }

    fn shows_emergence(self) -> bool {
        !matches!(self, PresentationMode::Cards)
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on one tick's delta; longer gaps (a backgrounded tab) are
    /// clamped instead of replayed.
    pub max_frame_delta_secs: f32,
    pub wheel_scale: f32,
    pub seed: u64,
    /// Viewport used until the first resize event.
    pub viewport: Size2,
    pub renderer: RendererConfig,
    pub depth: DepthConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_frame_delta_secs: 0.1,
            wheel_scale: crate::scroll::WHEEL_SCALE,
            seed: 0x00E9_0C0D,
            viewport: Size2::new(1280.0, 720.0),
            renderer: RendererConfig::default(),
            depth: DepthConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.renderer = self.renderer.with_seed(seed);
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Size2::new(width, height);
        self
    }
}

/// Things worth telling an embedder about, drained with
/// [`PresentationOrchestrator::take_events`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum NarrativeEvent {
    BeatEntered { beat: &'static str, level: usize },
    BeatChangeDropped { requested: &'static str },
    ModeChanged { mode: PresentationMode },
    DepthChanged { state: DepthState },
    BehaviorFailed { beat: &'static str, reason: String },
}

struct PendingBeat {
    target: &'static NarrativeBeat,
    exits: Vec<RunId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Listeners {
    emergence_keys: Option<ListenerId>,
}

pub struct PresentationOrchestrator {
    config: OrchestratorConfig,
    prefs: Preferences,
    content: Box<dyn ContentSource>,
    config_source: Box<dyn ConfigSource>,
    mapper: ScrollMapper,
    table: NarrativeBeatTable,
    cards: CardLifecycleManager,
    behaviors: BehaviorEngine,
    renderer: EmergenceRenderer,
    depth: DepthTransitionController,
    bus: InputBus,
    listeners: Listeners,
    rng: Prng,
    viewport: Size2,
    mode: PresentationMode,
    /// Mode to restore once depth returns to the surface.
    return_mode: PresentationMode,
    /// A mode was chosen while depth was still entering.
    exit_on_arrival: bool,
    last_depth_state: DepthState,
    active: Option<&'static NarrativeBeat>,
    pending: Option<PendingBeat>,
    last_resolution: Option<ScrollResolution>,
    scroll_y: f32,
    max_scroll: f32,
    scroll_request: Option<f32>,
    touch_start: Option<f32>,
    events: VecDeque<NarrativeEvent>,
    destroyed: bool,
}

impl PresentationOrchestrator {
    /// Wire up every component. Fails only when the 2D surface is unusable;
    /// a failing GPU surface just selects the canvas path.
    pub fn new(
        config: OrchestratorConfig,
        canvas: Box<dyn Canvas2d>,
        gpu: Option<Box<dyn GpuSurface>>,
        card_surface: Box<dyn CardSurface>,
        content: Box<dyn ContentSource>,
        config_source: Box<dyn ConfigSource>,
    ) -> Result<Self, InitError> {
        let size = canvas.size();
        if !(size.width > 0.0 && size.height > 0.0) {
            error!(width = size.width, height = size.height, "no usable 2D surface");
            return Err(InitError::NoRenderSurface);
        }

        let prefs = config_source.preferences();
        let mut renderer_config = config.renderer.clone();
        renderer_config.particles = renderer_config.particles.with_cap(prefs.particle_cap());
        let mut renderer = EmergenceRenderer::new(renderer_config, canvas, gpu);
        renderer.set_duration_scale(prefs.duration_scale());

        let depth = DepthTransitionController::new(
            config.depth.with_duration_scale(prefs.duration_scale()),
            size,
        );
        let mut behaviors = BehaviorEngine::new(config.seed ^ 0xB3A7);
        behaviors.set_duration_scale(prefs.duration_scale());

        let mut bus = InputBus::new();
        bus.register(Channel::Scroll, Subscriber::Narrative, 0);
        bus.register(Channel::Wheel, Subscriber::Narrative, 0);
        bus.register(Channel::Keyboard, Subscriber::Narrative, 0);
        bus.register(Channel::Touch, Subscriber::Narrative, 0);
        bus.register(Channel::Resize, Subscriber::Narrative, 0);
        bus.register(Channel::Keyboard, Subscriber::Modes, MODES_PRIORITY);
        bus.register(Channel::Pointer, Subscriber::Emergence, 0);
        bus.register(Channel::Wheel, Subscriber::Emergence, EMERGENCE_BACKGROUND_PRIORITY);
        let emergence_keys = bus.register(Channel::Keyboard, Subscriber::Emergence, EMERGENCE_BACKGROUND_PRIORITY);

        let mut show = Self {
            rng: Prng::new(config.seed),
            viewport: size,
            config,
            prefs,
            content,
            config_source,
            mapper: ScrollMapper::default(),
            table: NarrativeBeatTable,
            cards: CardLifecycleManager::new(card_surface),
            behaviors,
            renderer,
            depth,
            bus,
            listeners: Listeners {
                emergence_keys: Some(emergence_keys),
            },
            mode: PresentationMode::Hybrid,
            return_mode: PresentationMode::Hybrid,
            exit_on_arrival: false,
            last_depth_state: DepthState::Surface,
            active: None,
            pending: None,
            last_resolution: None,
            scroll_y: 0.0,
            max_scroll: 0.0,
            scroll_request: None,
            touch_start: None,
            events: VecDeque::new(),
            destroyed: false,
        };
        info!(path = ?show.renderer.render_path(), "presentation ready");
        let opening = show.mapper.resolve_progress(0.0);
        show.observe(opening);
        Ok(show)
    }

    /// Recording surfaces and the built-in catalogs; no GPU.
    pub fn headless(config: OrchestratorConfig) -> Result<Self, InitError> {
        let canvas = RecordingCanvas::new(config.viewport.width, config.viewport.height);
        Self::new(
            config,
            Box::new(canvas),
            None,
            Box::new(RecordingCardSurface::new()),
            Box::new(StaticContent),
            Box::new(StaticConfig::default()),
        )
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn active_beat(&self) -> Option<&'static NarrativeBeat> {
        self.active
    }

    /// True while outgoing cards are still exiting.
    pub fn is_transitioning(&self) -> bool {
        self.pending.is_some()
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn progress(&self) -> f32 {
        self.last_resolution.map_or(0.0, |r| r.progress)
    }

    pub fn last_resolution(&self) -> Option<ScrollResolution> {
        self.last_resolution
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn cards(&self) -> &CardLifecycleManager {
        &self.cards
    }

    pub fn behaviors(&self) -> &BehaviorEngine {
        &self.behaviors
    }

    pub fn renderer(&self) -> &EmergenceRenderer {
        &self.renderer
    }

    pub fn depth(&self) -> &DepthTransitionController {
        &self.depth
    }

    pub fn input_bus(&self) -> &InputBus {
        &self.bus
    }

    pub fn render_path(&self) -> RenderPath {
        self.renderer.render_path()
    }

    /// Scroll offset the host should move to, if navigation asked for one.
    pub fn take_scroll_request(&mut self) -> Option<f32> {
        self.scroll_request.take()
    }

    pub fn take_events(&mut self) -> Vec<NarrativeEvent> {
        self.events.drain(..).collect()
    }

    /// The resolved configuration record for a beat.
    pub fn section_params(&self, beat: &NarrativeBeat) -> Option<SectionVisualParams> {
        self.config_source
            .section_params(beat.config_section)
            .map(|p| self.prefs.resolve(&p))
    }

    /// Swap preferences at runtime. Durations and forces follow immediately;
    /// the particle cap and depth timings are fixed at construction.
    pub fn apply_preferences(&mut self, prefs: Preferences) {
        self.prefs = prefs;
        self.behaviors.set_duration_scale(prefs.duration_scale());
        self.renderer.set_duration_scale(prefs.duration_scale());
        if let Some(beat) = self.active {
            let forces = beat.emotion.forces().scaled(prefs.effect_factor());
            self.cards.set_epo_forces(forces);
            self.renderer.set_epo_parameters(forces);
        }
        info!(
            performance = prefs.performance.label(),
            intensity = prefs.effect_intensity.label(),
            reduced_motion = prefs.accessibility.reduced_motion,
            "preferences applied"
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Frame loop
    // ═══════════════════════════════════════════════════════════════════════

    /// Queue a host event; it is handled on the next [`Self::tick`].
    pub fn handle_input(&mut self, event: InputEvent) {
        if self.destroyed {
            return;
        }
        self.bus.push(event);
    }

    /// Advance everything by `dt_secs` (clamped to the configured maximum).
    pub fn tick(&mut self, dt_secs: f32) {
        if self.destroyed {
            return;
        }
        let dt = clamp_delta(dt_secs, self.config.max_frame_delta_secs);
        let dt_ms = dt * 1000.0;

        self.dispatch_input();

        for outcome in self.behaviors.tick(dt_ms, &mut self.cards) {
            if let Err(e) = &outcome.result {
                debug!(run = %outcome.id, "{e}");
            }
        }
        self.settle_pending();

        self.renderer.update(dt_ms);
        self.depth.update(dt_ms, &mut self.bus);
        self.track_depth();

        self.cards.advance_time(dt);
        self.cards.sync();
    }

    /// Draw the emergence field, then the depth overlay on the same canvas.
    pub fn render(&mut self) {
        if self.destroyed {
            return;
        }
        self.renderer.render();
        self.depth.render(self.renderer.canvas_mut());
    }

    /// Cancel everything, remove every card, and drop every registration.
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.behaviors.cancel_all();
        self.behaviors.reap(&mut self.cards);
        self.cards.remove_all();
        self.depth.destroy(&mut self.bus);
        self.renderer.destroy();
        self.bus.clear();
        self.listeners = Listeners::default();
        self.pending = None;
        self.destroyed = true;
        info!("presentation destroyed");
    }

    fn dispatch_input(&mut self) {
        let events = self.bus.drain();
        // scroll is throttled: only the newest offset per frame is resolved
        let last_scroll = events
            .iter()
            .rposition(|e| matches!(e, InputEvent::Scroll { .. }));
        for (i, event) in events.into_iter().enumerate() {
            if matches!(event, InputEvent::Scroll { .. }) && Some(i) != last_scroll {
                continue;
            }
            let channel = event.channel();
            for subscriber in self.bus.listeners(channel) {
                if self.deliver(subscriber, &event) {
                    break;
                }
            }
        }
    }

    /// Returns true when `event` was consumed.
    fn deliver(&mut self, subscriber: Subscriber, event: &InputEvent) -> bool {
        match (subscriber, event) {
            (Subscriber::Depth, InputEvent::Key(key)) => self.depth.handle_key(key),
            (Subscriber::Modes, InputEvent::Key(key)) => match PresentationMode::from_key(key) {
                Some(mode) => {
                    self.set_mode(mode);
                    true
                }
                None => false,
            },
            (Subscriber::Emergence, InputEvent::Key(key)) => self.renderer.handle_key(key),
            (Subscriber::Emergence, InputEvent::Wheel { delta_y }) => {
                self.renderer.handle_wheel(*delta_y);
                true
            }
            (Subscriber::Emergence, InputEvent::PointerMove { x, y }) => {
                self.renderer.set_pointer(*x, *y);
                let w = self.viewport.width.max(1.0);
                let h = self.viewport.height.max(1.0);
                self.cards.set_pointer((x / w).clamp(0.0, 1.0), (y / h).clamp(0.0, 1.0));
                false
            }
            (Subscriber::Narrative, InputEvent::Scroll { y, max }) => {
                self.scroll_y = *y;
                self.max_scroll = *max;
                let resolution = self.mapper.resolve(*y, *max);
                self.observe(resolution);
                true
            }
            (Subscriber::Narrative, InputEvent::Wheel { delta_y }) => {
                let target = (self.scroll_y + delta_y * self.config.wheel_scale).clamp(0.0, self.max_scroll.max(0.0));
                self.scroll_request = Some(target);
                true
            }
            (Subscriber::Narrative, InputEvent::Key(key)) => self.handle_navigation_key(key),
            (Subscriber::Narrative, InputEvent::TouchStart { y }) => {
                self.touch_start = Some(*y);
                true
            }
            (Subscriber::Narrative, InputEvent::TouchEnd { y }) => {
                if let Some(start) = self.touch_start.take() {
                    let delta = start - y;
                    if delta > SWIPE_THRESHOLD_PX {
                        self.navigate_next();
                    } else if delta < -SWIPE_THRESHOLD_PX {
                        self.navigate_previous();
                    }
                }
                true
            }
            (Subscriber::Narrative, InputEvent::Resize { width, height }) => {
                self.resize(*width, *height);
                true
            }
            _ => false,
        }
    }

    fn handle_navigation_key(&mut self, key: &Key) -> bool {
        match key {
            Key::ArrowDown | Key::Space => self.navigate_next().is_some(),
            Key::ArrowUp => self.navigate_previous().is_some(),
            Key::Home => self.navigate_first().is_some(),
            Key::End => self.navigate_last().is_some(),
            _ => false,
        }
    }

    fn resize(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            warn!(width, height, "ignoring degenerate resize");
            return;
        }
        self.viewport = Size2::new(width, height);
        self.renderer.resize(width, height);
        self.depth.resize(width, height);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════════

    fn active_index(&self) -> usize {
        self.active
            .and_then(|b| self.table.index_of(b.id))
            .unwrap_or(0)
    }

    fn request_beat(&mut self, index: usize) -> Option<f32> {
        let target = self.mapper.target_for_beat(index, self.max_scroll)?;
        self.scroll_request = Some(target);
        Some(target)
    }

    /// Scroll target for the next beat (the last beat stays put).
    pub fn navigate_next(&mut self) -> Option<f32> {
        let last = self.table.len().saturating_sub(1);
        self.request_beat((self.active_index() + 1).min(last))
    }

    pub fn navigate_previous(&mut self) -> Option<f32> {
        self.request_beat(self.active_index().saturating_sub(1))
    }

    pub fn navigate_first(&mut self) -> Option<f32> {
        self.request_beat(0)
    }

    pub fn navigate_last(&mut self) -> Option<f32> {
        self.request_beat(self.table.len().saturating_sub(1))
    }

    /// Scroll target for a beat by id. Unknown ids leave everything as is.
    pub fn navigate_to(&mut self, beat_id: &str) -> Result<f32, NavigationError> {
        let Some(index) = self.table.index_of(beat_id) else {
            warn!(beat_id, "navigation to unknown beat");
            return Err(NavigationError::UnknownBeat(beat_id.to_string()));
        };
        self.request_beat(index)
            .ok_or_else(|| NavigationError::UnknownBeat(beat_id.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Beats
    // ═══════════════════════════════════════════════════════════════════════

    fn observe(&mut self, resolution: ScrollResolution) {
        self.last_resolution = Some(resolution);
        self.cards.set_scroll_progress(resolution.progress);

        let same = self.active.is_some_and(|b| b.id == resolution.beat.id);
        if same {
            apply_beat_progress(resolution.beat.behavior.kind, resolution.beat_progress, &mut self.cards);
            return;
        }
        if let Some(pending) = &self.pending {
            if pending.target.id != resolution.beat.id {
                debug!(
                    requested = resolution.beat.id,
                    in_flight = pending.target.id,
                    "beat change dropped while a transition is in flight"
                );
                self.events.push_back(NarrativeEvent::BeatChangeDropped {
                    requested: resolution.beat.id,
                });
            }
            return;
        }
        self.begin_transition(resolution.beat);
    }

    fn begin_transition(&mut self, target: &'static NarrativeBeat) {
        info!(
            from = self.active.map_or("-", |b| b.id),
            to = target.id,
            "beat transition"
        );
        self.behaviors.cancel_all();
        self.behaviors.reap(&mut self.cards);

        if matches!(target.behavior.card_count, CardCount::AllPrevious) {
            self.enter_beat(target);
            return;
        }

        let mut exits = Vec::new();
        for id in self.cards.ids() {
            match self.behaviors.start_exit(target.exit, id, &mut self.cards) {
                Ok(run) => exits.push(run),
                Err(e) => {
                    warn!(%id, "exit could not start ({e}); removing card");
                    self.cards.remove_card(id);
                }
            }
        }
        if exits.is_empty() {
            self.enter_beat(target);
        } else {
            self.pending = Some(PendingBeat { target, exits });
        }
    }

    fn settle_pending(&mut self) {
        let done = self
            .pending
            .as_ref()
            .is_some_and(|p| p.exits.iter().all(|id| !self.behaviors.is_running(*id)));
        if !done {
            return;
        }
        if let Some(pending) = self.pending.take() {
            self.enter_beat(pending.target);
            // catch up with scrolling that happened during the exit
            if let Some(latest) = self.last_resolution {
                if latest.beat.id != pending.target.id {
                    self.observe(latest);
                }
            }
        }
    }

    fn enter_beat(&mut self, beat: &'static NarrativeBeat) {
        let spec = &beat.behavior;
        let previous = self.cards.ids();
        let ids: Vec<CardId> = match spec.card_count {
            CardCount::Fixed(n) => {
                let layout = initial_layout(spec, n, &mut self.rng);
                layout
                    .iter()
                    .enumerate()
                    .map(|(i, rect)| {
                        let options = CardOptions::at(rect.center.x, rect.center.y)
                            .sized(rect.size.width, rect.size.height)
                            .with_text(beat.content.card_text(i));
                        self.cards.create_card(beat.section, options)
                    })
                    .collect()
            }
            CardCount::AllPrevious => {
                let layout = initial_layout(spec, 1, &mut self.rng);
                let rect = layout.first().copied().unwrap_or_default();
                let options = CardOptions::at(rect.center.x, rect.center.y)
                    .sized(rect.size.width, rect.size.height)
                    .with_text(beat.content.card_text(0));
                let synthesis = self.cards.create_card(beat.section, options);
                for id in &previous {
                    if let Some(card) = self.cards.card_mut(*id) {
                        for tag in ExitStyle::ConsciousnessAbsorption.tag_params() {
                            card.params.set(tag, 1.0);
                        }
                    }
                }
                std::iter::once(synthesis).chain(previous).collect()
            }
        };

        if let Err(e) = self.behaviors.start(spec.kind, &ids, &mut self.cards) {
            warn!(beat = beat.id, "behavior did not start: {e}");
            self.events.push_back(NarrativeEvent::BehaviorFailed {
                beat: beat.id,
                reason: e.to_string(),
            });
        }

        let params = self.section_params(beat);
        let style = params.as_ref().map_or(TransitionStyle::Smooth, |p| TransitionStyle::from_effect(p.transition.effect));
        if let Err(e) = self.renderer.transition_to_level(beat.level, style) {
            warn!(beat = beat.id, "level transition skipped: {e}");
        }

        let forces = beat.emotion.forces().scaled(self.prefs.effect_factor());
        self.cards.set_epo_forces(forces);
        self.renderer.set_epo_parameters(forces);
        if let Some(p) = params {
            self.cards.set_all("spacetime_curvature", p.spacetime_curvature);
            self.cards.set_all("quantum_coherence", p.quantum_coherence);
        }
        let mood = beat.emotion.mood();
        self.cards.set_all("narrative_tension", mood.tension);
        self.cards.set_all("narrative_revelation", mood.revelation);
        if let Some(r) = self.last_resolution.filter(|r| r.beat.id == beat.id) {
            self.cards.set_scroll_progress(r.progress);
        }

        self.active = Some(beat);
        info!(beat = beat.id, level = beat.level, cards = self.cards.len(), "beat entered");
        self.events.push_back(NarrativeEvent::BeatEntered {
            beat: beat.id,
            level: beat.level,
        });
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Modes and depth
    // ═══════════════════════════════════════════════════════════════════════

    /// Switch presentation mode. Depth mode enters depth for the active
    /// beat's section; other modes chosen while in depth take effect once the
    /// controller is back at the surface.
    pub fn set_mode(&mut self, mode: PresentationMode) {
        if mode == PresentationMode::Depth {
            self.enter_depth();
            return;
        }
        match self.depth.state() {
            DepthState::Surface => self.apply_mode(mode),
            DepthState::Depth => {
                self.return_mode = mode;
                self.depth.exit_depth();
            }
            DepthState::EnteringDepth => {
                self.return_mode = mode;
                self.exit_on_arrival = true;
            }
            DepthState::ExitingDepth => self.return_mode = mode,
        }
    }

    fn enter_depth(&mut self) {
        if self.depth.state() != DepthState::Surface {
            debug!("depth mode already active");
            return;
        }
        let section = self.active.map_or("cover", |b| b.section);
        let content = self.content.depth_content(section);
        if self.depth.enter_depth(section, content, Vec2::CENTER) {
            self.return_mode = self.mode;
            self.apply_mode(PresentationMode::Depth);
        }
    }

    fn apply_mode(&mut self, mode: PresentationMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        let shown = if mode == PresentationMode::Depth {
            self.return_mode
        } else {
            mode
        };
        self.cards.set_visible(shown.shows_cards());
        self.renderer.set_visible(shown.shows_emergence());

        let priority = if mode == PresentationMode::Emergence {
            EMERGENCE_FOCUSED_PRIORITY
        } else {
            EMERGENCE_BACKGROUND_PRIORITY
        };
        if let Some(id) = self.listeners.emergence_keys.take() {
            self.bus.unregister(id);
        }
        self.listeners.emergence_keys = Some(self.bus.register(Channel::Keyboard, Subscriber::Emergence, priority));
        let wheel: Vec<ListenerId> = self
            .bus
            .registrations()
            .iter()
            .filter(|r| r.channel == Channel::Wheel && r.subscriber == Subscriber::Emergence)
            .map(|r| r.id)
            .collect();
        for id in wheel {
            self.bus.unregister(id);
        }
        self.bus.register(Channel::Wheel, Subscriber::Emergence, priority);

        info!(mode = mode.label(), "presentation mode");
        self.events.push_back(NarrativeEvent::ModeChanged { mode });
    }

    fn track_depth(&mut self) {
        let state = self.depth.state();
        if state == self.last_depth_state {
            return;
        }
        self.last_depth_state = state;
        self.events.push_back(NarrativeEvent::DepthChanged { state });
        if state == DepthState::Depth && self.exit_on_arrival {
            self.exit_on_arrival = false;
            self.depth.exit_depth();
        }
        if state == DepthState::Surface && self.mode == PresentationMode::Depth {
            let back = self.return_mode;
            self.apply_mode(back);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectIntensity;
    use crate::surface::RecordingGpu;

    const FRAME: f32 = 1.0 / 60.0;

    fn headless() -> PresentationOrchestrator {
        PresentationOrchestrator::headless(OrchestratorConfig::default()).expect("headless")
    }

    fn run(show: &mut PresentationOrchestrator, frames: usize) {
        for _ in 0..frames {
            show.tick(FRAME);
            show.render();
        }
    }

    fn scroll_to(show: &mut PresentationOrchestrator, progress: f32) {
        show.handle_input(InputEvent::Scroll {
            y: progress * 10_000.0,
            max: 10_000.0,
        });
    }

    #[test]
    fn opens_on_genesis() {
        let show = headless();
        assert_eq!(show.active_beat().map(|b| b.id), Some("genesis"));
        assert_eq!(show.cards().len(), 1);
        assert_eq!(show.render_path(), RenderPath::Canvas);
    }

    #[test]
    fn zero_sized_canvas_is_fatal() {
        let err = PresentationOrchestrator::new(
            OrchestratorConfig::default(),
            Box::new(RecordingCanvas::new(0.0, 0.0)),
            None,
            Box::new(RecordingCardSurface::new()),
            Box::new(StaticContent),
            Box::new(StaticConfig::default()),
        )
        .err();
        assert_eq!(err, Some(InitError::NoRenderSurface));
    }

    #[test]
    fn failing_gpu_degrades_to_canvas() {
        let gpu = RecordingGpu::failing();
        let log = gpu.log();
        let mut show = PresentationOrchestrator::new(
            OrchestratorConfig::default(),
            Box::new(RecordingCanvas::new(800.0, 600.0)),
            Some(Box::new(gpu)),
            Box::new(RecordingCardSurface::new()),
            Box::new(StaticContent),
            Box::new(StaticConfig::default()),
        )
        .expect("canvas still works");
        let calls = log.borrow().total_calls();
        run(&mut show, 100);
        assert_eq!(show.render_path(), RenderPath::Canvas);
        assert_eq!(log.borrow().total_calls(), calls);
        assert_eq!(show.renderer().frame_stats().canvas_frames, 100);
    }

    #[test]
    fn beat_change_exits_then_enters() {
        let mut show = headless();
        scroll_to(&mut show, 0.13);
        show.tick(FRAME);
        assert!(show.is_transitioning());
        assert_eq!(show.active_beat().map(|b| b.id), Some("genesis"));

        // explosive-destruction exit lasts 2 s
        run(&mut show, 130);
        assert!(!show.is_transitioning());
        assert_eq!(show.active_beat().map(|b| b.id), Some("paradigm-fracture"));
        assert_eq!(show.cards().len(), 3);
        assert!(show.cards().cards().iter().all(|c| c.section == "1.1"));
        assert_eq!(show.renderer().transition().map(|t| t.target), Some(1));
        assert_eq!(show.renderer().transition().map(|t| t.style), Some(TransitionStyle::Explosive));
        let f = show.cards().forces();
        assert!((f.dispersion - 0.8).abs() < 1e-6);
    }

    #[test]
    fn changes_during_a_transition_are_dropped_then_caught_up() {
        let mut show = headless();
        scroll_to(&mut show, 0.13);
        show.tick(FRAME);
        scroll_to(&mut show, 0.3);
        show.tick(FRAME);
        let events = show.take_events();
        assert!(events.contains(&NarrativeEvent::BeatChangeDropped {
            requested: "information-axiom"
        }));

        run(&mut show, 130);
        // paradigm-fracture entered, then the stale position was re-resolved
        let entered: Vec<&str> = show
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                NarrativeEvent::BeatEntered { beat, .. } => Some(beat),
                _ => None,
            })
            .collect();
        assert_eq!(entered, vec!["paradigm-fracture"]);
        assert!(show.is_transitioning());

        run(&mut show, 120);
        assert_eq!(show.active_beat().map(|b| b.id), Some("information-axiom"));
        assert_eq!(show.cards().len(), 5);
    }

    #[test]
    fn scroll_is_throttled_to_the_latest_offset() {
        let mut show = headless();
        scroll_to(&mut show, 0.5);
        scroll_to(&mut show, 0.02);
        show.tick(FRAME);
        assert!(!show.is_transitioning());
        assert_eq!(show.active_beat().map(|b| b.id), Some("genesis"));
        assert!((show.progress() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn in_beat_progress_reaches_idle_cards() {
        let mut show = headless();
        scroll_to(&mut show, 0.06);
        run(&mut show, 70);
        assert_eq!(show.active_beat().map(|b| b.id), Some("crisis-building"));
        // let stress-accumulation finish so the card is idle
        run(&mut show, 200);
        scroll_to(&mut show, 0.085);
        show.tick(FRAME);
        let card = &show.cards().cards()[0];
        assert!((card.params.number_or("stress_level", 0.0) - 0.6).abs() < 1e-3);
        assert!((card.params.number_or("cosmic_time", 0.0) - 0.085).abs() < 1e-6);
    }

    #[test]
    fn keyboard_navigation_requests_scroll() {
        let mut show = headless();
        scroll_to(&mut show, 0.0);
        show.tick(FRAME);
        show.handle_input(InputEvent::Key(Key::ArrowDown));
        show.tick(FRAME);
        assert_eq!(show.take_scroll_request(), Some(0.05 * 10_000.0));

        show.handle_input(InputEvent::Key(Key::End));
        show.tick(FRAME);
        assert_eq!(show.take_scroll_request(), Some(0.85 * 10_000.0));

        show.handle_input(InputEvent::Key(Key::ArrowUp));
        show.tick(FRAME);
        assert_eq!(show.take_scroll_request(), Some(0.0));
        assert!(matches!(
            show.navigate_to("no-such-beat"),
            Err(NavigationError::UnknownBeat(_))
        ));
    }

    #[test]
    fn swipe_navigates_and_wheel_scrolls() {
        let mut show = headless();
        scroll_to(&mut show, 0.0);
        show.handle_input(InputEvent::TouchStart { y: 400.0 });
        show.handle_input(InputEvent::TouchEnd { y: 300.0 });
        show.tick(FRAME);
        assert_eq!(show.take_scroll_request(), Some(500.0));

        show.handle_input(InputEvent::TouchStart { y: 400.0 });
        show.handle_input(InputEvent::TouchEnd { y: 380.0 });
        show.handle_input(InputEvent::Wheel { delta_y: 100.0 });
        show.tick(FRAME);
        assert_eq!(show.take_scroll_request(), Some(50.0));
    }

    #[test]
    fn modes_hide_layers_and_route_keys() {
        let mut show = headless();
        show.handle_input(InputEvent::Key(Key::Char('e')));
        show.tick(FRAME);
        assert_eq!(show.mode(), PresentationMode::Emergence);
        assert!(!show.cards().is_visible());
        assert!(show.renderer().is_visible());

        // emergence keys win in emergence mode: 'c' jumps to level 15
        show.handle_input(InputEvent::Key(Key::Char('c')));
        show.tick(FRAME);
        assert_eq!(show.mode(), PresentationMode::Emergence);
        assert_eq!(show.renderer().transition().map(|t| t.target), Some(15));

        show.handle_input(InputEvent::Key(Key::Char('h')));
        show.tick(FRAME);
        show.handle_input(InputEvent::Key(Key::Char('c')));
        show.tick(FRAME);
        assert_eq!(show.mode(), PresentationMode::Cards);
        assert!(!show.renderer().is_visible());
        assert!(show.cards().is_visible());
    }

    #[test]
    fn depth_mode_round_trip() {
        let mut show = headless();
        show.handle_input(InputEvent::Key(Key::Char('f')));
        show.tick(FRAME);
        assert_eq!(show.mode(), PresentationMode::Depth);
        assert_eq!(show.depth().section(), Some("cover"));

        // selecting depth again does nothing
        show.set_mode(PresentationMode::Depth);
        assert_eq!(show.depth().sequences_started(), 1);

        run(&mut show, 400);
        assert_eq!(show.depth().state(), DepthState::Depth);
        assert_eq!(show.input_bus().listeners(Channel::Keyboard)[0], Subscriber::Depth);

        show.handle_input(InputEvent::Key(Key::Escape));
        run(&mut show, 400);
        assert_eq!(show.depth().state(), DepthState::Surface);
        assert_eq!(show.mode(), PresentationMode::Hybrid);
        assert!(!show
            .input_bus()
            .listeners(Channel::Keyboard)
            .contains(&Subscriber::Depth));
    }

    #[test]
    fn synthesis_absorbs_previous_cards() {
        let mut show = headless();
        scroll_to(&mut show, 0.6);
        run(&mut show, 200);
        assert_eq!(show.active_beat().map(|b| b.id), Some("bullet-cluster-evidence"));
        let before = show.cards().len();
        assert_eq!(before, 3);

        scroll_to(&mut show, 0.7);
        show.tick(FRAME);
        assert_eq!(show.active_beat().map(|b| b.id), Some("universal-integration"));
        assert_eq!(show.cards().len(), before + 1);

        run(&mut show, 200);
        assert_eq!(show.cards().len(), 1);
        let survivor = &show.cards().cards()[0];
        assert_eq!(survivor.params.number_or("synthesis_glow", 0.0), 1.0);
    }

    #[test]
    fn preferences_scale_forces() {
        let prefs = Preferences::default().with_effect_intensity(EffectIntensity::Minimal);
        let mut show = PresentationOrchestrator::new(
            OrchestratorConfig::default(),
            Box::new(RecordingCanvas::new(800.0, 600.0)),
            None,
            Box::new(RecordingCardSurface::new()),
            Box::new(StaticContent),
            Box::new(StaticConfig::new(prefs)),
        )
        .expect("headless");
        show.tick(FRAME);
        // genesis: wonder-anticipation integration .7, halved
        assert!((show.cards().forces().integration - 0.35).abs() < 1e-6);
        assert!((show.renderer().forces().integration - 0.35).abs() < 1e-6);

        show.apply_preferences(Preferences::default().with_effect_intensity(EffectIntensity::Strong));
        assert!((show.cards().forces().integration - 1.0).abs() < 1e-6);
    }

    fn with_prefs(prefs: Preferences) -> PresentationOrchestrator {
        PresentationOrchestrator::new(
            OrchestratorConfig::default(),
            Box::new(RecordingCanvas::new(800.0, 600.0)),
            None,
            Box::new(RecordingCardSurface::new()),
            Box::new(StaticContent),
            Box::new(StaticConfig::new(prefs)),
        )
        .expect("headless")
    }

    /// Enter bullet-cluster-evidence, then jump to universal-integration while
    /// its level transition is still running.
    fn jump_past_a_running_level_transition(show: &mut PresentationOrchestrator) {
        scroll_to(show, 0.6);
        for _ in 0..600 {
            run(show, 1);
            if show.active_beat().map(|b| b.id) == Some("bullet-cluster-evidence") {
                break;
            }
        }
        assert_eq!(show.active_beat().map(|b| b.id), Some("bullet-cluster-evidence"));
        run(show, 1);
        assert!(show.renderer().is_transitioning());

        scroll_to(show, 0.7);
        run(show, 600);
        let beat = show.active_beat().expect("a beat is active");
        assert_eq!(beat.id, "universal-integration");
        assert!(!show.renderer().is_transitioning());
        assert_eq!(show.renderer().current_level(), beat.level);
    }

    #[test]
    fn level_follows_the_beat_after_a_quick_jump() {
        let mut show = headless();
        jump_past_a_running_level_transition(&mut show);
        assert_eq!(show.renderer().current_level(), 15);
    }

    #[test]
    fn level_follows_the_beat_under_reduced_motion() {
        let mut show = with_prefs(Preferences::default().with_reduced_motion(true));
        assert!((show.renderer().transition_secs() - 0.5).abs() < 1e-6);
        jump_past_a_running_level_transition(&mut show);

        // a dropped beat change is caught up and the level follows it too
        scroll_to(&mut show, 0.13);
        run(&mut show, 1);
        scroll_to(&mut show, 0.3);
        run(&mut show, 600);
        let beat = show.active_beat().expect("a beat is active");
        assert_eq!(beat.id, "information-axiom");
        assert_eq!(show.renderer().current_level(), beat.level);

        show.apply_preferences(Preferences::default());
        assert!((show.renderer().transition_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn destroy_releases_everything() {
        let surface = RecordingCardSurface::new();
        let log = surface.log();
        let mut show = PresentationOrchestrator::new(
            OrchestratorConfig::default(),
            Box::new(RecordingCanvas::new(800.0, 600.0)),
            None,
            Box::new(surface),
            Box::new(StaticContent),
            Box::new(StaticConfig::default()),
        )
        .expect("headless");
        show.set_mode(PresentationMode::Depth);
        run(&mut show, 10);
        show.destroy();
        show.destroy();
        assert!(show.input_bus().is_empty());
        assert!(log.borrow().live.is_empty());
        assert_eq!(show.depth().state(), DepthState::Surface);
        show.handle_input(InputEvent::Key(Key::ArrowDown));
        show.tick(FRAME);
        assert_eq!(show.input_bus().pending(), 0);
    }
}
