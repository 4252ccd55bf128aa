//! Card choreographies.
//!
//! Every behavior is a time-parameterized function `f(t) -> visual state`
//! applied to a claimed set of cards. Runs are explicit state machines
//! advanced by [`BehaviorEngine::tick`]; nothing sleeps or spawns. Each run
//! carries a [`CancelToken`]; a cancelled run stops mutating its cards,
//! releases them (exit runs remove theirs) and reports
//! [`BehaviorError::Cancelled`].

use std::f32::consts::{PI, TAU};
use std::fmt;

use tracing::debug;

use crate::beats::{Arity, CardBehaviorKind, CardBehaviorSpec, ExitStyle, Layout, NamedLayout};
use crate::cancel::CancelToken;
use crate::cards::{CardId, CardLifecycleManager};
use crate::clock::frames_in;
use crate::easing::{ease_in_out_cubic, ease_out_cubic};
use crate::error::BehaviorError;
use crate::geometry::{Rect, Size2, Vec2};
use crate::prng::Prng;

// ═══════════════════════════════════════════════════════════════════════════
// Layouts
// ═══════════════════════════════════════════════════════════════════════════

pub const DANCE_RADIUS: f32 = 0.2;
/// Radians per 60 Hz frame.
pub const DANCE_STEP: f32 = 0.02;
pub const DANCE_TURNS: f32 = 3.0;
pub const DANCE_SIZE: Size2 = Size2::new(0.15, 0.15);
/// Distance gain in `energy = 1 / (1 + d * k)`.
pub const ENERGY_GAIN: f32 = 5.0;

pub const VOID_SLOTS: [Vec2; 5] = [
    Vec2::new(0.2, 0.3),
    Vec2::new(0.7, 0.4),
    Vec2::new(0.4, 0.7),
    Vec2::new(0.6, 0.2),
    Vec2::new(0.5, 0.5),
];
pub const VOID_SIZE: Size2 = Size2::new(0.2, 0.15);
const VOID_JITTER: f32 = 0.05;
const VOID_WALK: f32 = 0.002;

/// Hub, two secondary, three tertiary and two peripheral nodes.
pub const NEURAL_LATTICE: [Vec2; 8] = [
    Vec2::new(0.5, 0.2),
    Vec2::new(0.3, 0.4),
    Vec2::new(0.7, 0.4),
    Vec2::new(0.2, 0.6),
    Vec2::new(0.5, 0.6),
    Vec2::new(0.8, 0.6),
    Vec2::new(0.1, 0.8),
    Vec2::new(0.9, 0.8),
];
pub const NEURAL_SIZE: Size2 = Size2::new(0.12, 0.1);
pub const NEURAL_LINK_DISTANCE: f32 = 0.35;

pub const SYNTHESIS_SIZE: Size2 = Size2::new(0.8, 0.6);

const ENTRANCE_MS: f32 = 1200.0;
const ENTRANCE_STAGGER_MS: f32 = 150.0;

/// Dancer positions after the pair has turned `angle` radians.
///
/// A starts on the left and turns clockwise; B starts on the right and turns
/// the other way, so the two are mirror images through `center` whenever
/// `angle` is a multiple of π.
pub fn dance_positions(center: Vec2, radius: f32, angle: f32) -> (Vec2, Vec2) {
    let a = PI + angle;
    let b = -angle;
    (
        center + Vec2::new(a.cos(), a.sin()) * radius,
        center + Vec2::new(b.cos(), b.sin()) * radius,
    )
}

pub fn dance_energy(a: Vec2, b: Vec2) -> f32 {
    1.0 / (1.0 + a.distance(b) * ENERGY_GAIN)
}

pub fn stream_slot(index: usize, phase: f32) -> Rect {
    let i = index as f32;
    Rect::new(
        Vec2::new(0.1 + 0.2 * i, 0.3 + 0.2 * (i + phase).sin()),
        Size2::new(0.15, 0.4),
    )
}

pub fn grid_slot(index: usize) -> Rect {
    Rect::new(
        Vec2::new(
            0.1 + 0.3 * (index % 3) as f32,
            0.3 + 0.4 * (index / 3) as f32,
        ),
        Size2::new(0.25, 0.25),
    )
}

/// First card at the centre, the rest on a circle of radius .3.
pub fn circle_slot(index: usize, count: usize) -> Rect {
    if index == 0 {
        return Rect::new(Vec2::CENTER, Size2::new(0.5, 0.35));
    }
    let ring = count.saturating_sub(1).max(1) as f32;
    let a = (index - 1) as f32 / ring * TAU;
    Rect::new(
        Vec2::CENTER + Vec2::new(a.cos(), a.sin()) * 0.3,
        Size2::new(0.2, 0.15),
    )
}

pub fn lattice_point(index: usize, count: usize) -> Vec2 {
    if index < NEURAL_LATTICE.len() {
        return NEURAL_LATTICE[index];
    }
    let extra = count.saturating_sub(NEURAL_LATTICE.len()).max(1) as f32;
    let a = (index - NEURAL_LATTICE.len()) as f32 / extra * TAU;
    Vec2::CENTER + Vec2::new(a.cos(), a.sin()) * 0.42
}

/// Connection between two cards of a run, by position in the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLink {
    pub a: usize,
    pub b: usize,
    pub strength: f32,
    pub activity: f32,
}

/// Links between nodes closer than [`NEURAL_LINK_DISTANCE`].
pub fn neural_links(points: &[Vec2]) -> Vec<CardLink> {
    let mut links = Vec::new();
    for a in 0..points.len() {
        for b in (a + 1)..points.len() {
            let d = points[a].distance(points[b]);
            if d < NEURAL_LINK_DISTANCE {
                links.push(CardLink {
                    a,
                    b,
                    strength: 1.0 / (1.0 + 5.0 * d),
                    activity: 1.0,
                });
            }
        }
    }
    links
}

/// Where a beat's cards start.
pub fn initial_layout(spec: &CardBehaviorSpec, count: usize, rng: &mut Prng) -> Vec<Rect> {
    (0..count)
        .map(|i| match spec.layout {
            Layout::Explicit(slots) => slots
                .get(i)
                .map(|s| Rect::new(s.center, s.size))
                .unwrap_or_else(|| Rect::new(Vec2::CENTER, Size2::new(0.3, 0.3))),
            Layout::Named(NamedLayout::ScatteredVoid) => {
                let base = VOID_SLOTS[i % VOID_SLOTS.len()];
                let jitter = Vec2::new(rng.signed(VOID_JITTER), rng.signed(VOID_JITTER));
                Rect::new(base + jitter, VOID_SIZE)
            }
            Layout::Named(NamedLayout::FlowingStreams) => stream_slot(i, 0.0),
            Layout::Named(NamedLayout::OrbitalDance) => {
                let (a, b) = dance_positions(Vec2::CENTER, DANCE_RADIUS, 0.0);
                Rect::new(if i % 2 == 0 { a } else { b }, DANCE_SIZE)
            }
            Layout::Named(NamedLayout::ConsciousnessLattice) => {
                Rect::new(lattice_point(i, count), NEURAL_SIZE)
            }
            Layout::Named(NamedLayout::ConvergentIntegration) => {
                Rect::new(Vec2::CENTER, SYNTHESIS_SIZE)
            }
            Layout::Named(NamedLayout::ForwardProjection) => grid_slot(i),
            Layout::Named(NamedLayout::WelcomingCircle) => circle_slot(i, count),
        })
        .collect()
}

/// In-beat progress writes for cards no behavior is animating.
pub fn apply_beat_progress(kind: CardBehaviorKind, t: f32, cards: &mut CardLifecycleManager) {
    let t = t.clamp(0.0, 1.0);
    let writes: Vec<(&str, f32)> = match kind {
        CardBehaviorKind::StressAccumulation => vec![
            ("stress_level", 0.3 + 0.6 * t),
            ("crack_formation", 0.8 * t),
        ],
        CardBehaviorKind::DialecticalDance => vec![
            ("dance_intensity", t),
            ("energy_exchange", 0.5 + 0.5 * (4.0 * PI * t).sin()),
        ],
        CardBehaviorKind::NeuralNetworkFormation => vec![
            ("neural_activity", t),
            ("connection_strength", 0.9 * t),
        ],
        _ => return,
    };
    for id in cards.ids() {
        if cards.is_busy(id) {
            continue;
        }
        if let Some(card) = cards.card_mut(id) {
            for (name, value) in &writes {
                card.params.set(name, *value);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Runs
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// A finished run. `result` is `Err(Cancelled)` when its token was raised.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub id: RunId,
    pub label: &'static str,
    pub cards: Vec<CardId>,
    pub result: Result<(), BehaviorError>,
}

#[derive(Debug, Clone)]
enum Motion {
    Pulse,
    Stress,
    Split { origin: Vec2, from: Size2, slots: Vec<Rect> },
    Void { anchors: Vec<Vec2> },
    Stream,
    Dance { angle: f32 },
    Neural { links: Vec<CardLink>, phases: Vec<f32> },
    Collision,
    Synthesis { from: Vec<Rect>, opacity: Vec<f32> },
    Entrance { slots: Vec<Rect> },
    Exit { style: ExitStyle, from_opacity: f32 },
}

#[derive(Debug, Clone)]
struct Run {
    id: RunId,
    label: &'static str,
    cards: Vec<CardId>,
    elapsed_ms: f32,
    duration_ms: f32,
    token: CancelToken,
    motion: Motion,
}

impl Run {
    fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }
}

fn duration_ms(kind: CardBehaviorKind, count: usize) -> f32 {
    match kind {
        CardBehaviorKind::UnifiedOrigin => 3000.0,
        CardBehaviorKind::StressAccumulation => 2500.0,
        CardBehaviorKind::CatastrophicSplit => 2500.0,
        CardBehaviorKind::VoidDemonstration => 4000.0,
        CardBehaviorKind::DataStreamFormation => 3000.0,
        // 3 turns at 0.02 rad per 60 Hz frame.
        CardBehaviorKind::DialecticalDance => DANCE_TURNS * TAU / DANCE_STEP * 1000.0 / 60.0,
        CardBehaviorKind::NeuralNetworkFormation => 4000.0,
        CardBehaviorKind::CosmicCollision => 3000.0,
        CardBehaviorKind::UniversalSynthesis => 2000.0,
        CardBehaviorKind::FutureProjection | CardBehaviorKind::InvitationToParticipate => {
            ENTRANCE_MS + ENTRANCE_STAGGER_MS * count.saturating_sub(1) as f32
        }
    }
}

pub struct BehaviorEngine {
    runs: Vec<Run>,
    next_id: u64,
    rng: Prng,
    speed: f32,
}

impl BehaviorEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            runs: Vec::new(),
            next_id: 0,
            rng: Prng::new(seed),
            speed: 1.0,
        }
    }

    /// Duration multiplier; 0.5 halves every run.
    pub fn set_duration_scale(&mut self, scale: f32) {
        self.speed = if scale > 0.0 { 1.0 / scale } else { 1.0 };
    }

    pub fn running(&self) -> usize {
        self.runs.len()
    }

    pub fn is_idle(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn is_running(&self, id: RunId) -> bool {
        self.runs.iter().any(|r| r.id == id)
    }

    /// Runs still in flight with their labels.
    pub fn active(&self) -> Vec<(RunId, &'static str)> {
        self.runs.iter().map(|r| (r.id, r.label)).collect()
    }

    pub fn token(&self, id: RunId) -> Option<CancelToken> {
        self.runs.iter().find(|r| r.id == id).map(|r| r.token.clone())
    }

    /// Raise a run's token. Takes effect on the next `tick` or `reap`.
    pub fn cancel(&self, id: RunId) -> bool {
        match self.runs.iter().find(|r| r.id == id) {
            Some(run) => {
                run.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for run in &self.runs {
            run.token.cancel();
        }
    }

    fn allocate(&mut self) -> RunId {
        self.next_id += 1;
        RunId(self.next_id)
    }

    /// Validate arity, claim the cards and start a choreography.
    pub fn start(
        &mut self,
        kind: CardBehaviorKind,
        cards: &[CardId],
        manager: &mut CardLifecycleManager,
    ) -> Result<RunId, BehaviorError> {
        check_arity(kind.label(), kind.arity(), cards.len())?;
        manager.claim(cards)?;

        let motion = self.prepare(kind, cards, manager);
        let id = self.allocate();
        debug!(%id, behavior = kind.label(), cards = cards.len(), "behavior started");
        let mut run = Run {
            id,
            label: kind.label(),
            cards: cards.to_vec(),
            elapsed_ms: 0.0,
            duration_ms: duration_ms(kind, cards.len()),
            token: CancelToken::new(),
            motion,
        };
        apply(&mut run, manager, &mut self.rng, 0.0);
        self.runs.push(run);
        Ok(id)
    }

    /// Fade one card out with `style`; the card is removed when the run ends.
    pub fn start_exit(
        &mut self,
        style: ExitStyle,
        card: CardId,
        manager: &mut CardLifecycleManager,
    ) -> Result<RunId, BehaviorError> {
        manager.claim(&[card])?;
        let mut from_opacity = 1.0;
        if let Some(c) = manager.card_mut(card) {
            for tag in style.tag_params() {
                c.params.set(tag, 1.0);
            }
            from_opacity = c.opacity;
        }
        let id = self.allocate();
        debug!(%id, %card, style = style.label(), "exit started");
        self.runs.push(Run {
            id,
            label: style.label(),
            cards: vec![card],
            elapsed_ms: 0.0,
            duration_ms: style.duration_ms(),
            token: CancelToken::new(),
            motion: Motion::Exit { style, from_opacity },
        });
        Ok(id)
    }

    fn prepare(
        &mut self,
        kind: CardBehaviorKind,
        cards: &[CardId],
        manager: &mut CardLifecycleManager,
    ) -> Motion {
        match kind {
            CardBehaviorKind::UnifiedOrigin => {
                set_on(manager, cards[0], |c| {
                    c.params.set("cosmic_pulse", true);
                    c.params.set("information_density", 1.0);
                });
                Motion::Pulse
            }
            CardBehaviorKind::StressAccumulation => {
                set_on(manager, cards[0], |c| {
                    c.params.set("stress_level", 0.7);
                    c.params.set("paradigm_instability", 0.8);
                });
                Motion::Stress
            }
            CardBehaviorKind::CatastrophicSplit => {
                let source = rect_of(manager, cards[0]);
                let slots: Vec<Rect> = cards[1..].iter().map(|id| rect_of(manager, *id)).collect();
                set_on(manager, cards[0], |c| {
                    c.params.set("fracture_progress", 0.0);
                });
                Motion::Split {
                    origin: source.center,
                    from: source.size,
                    slots,
                }
            }
            CardBehaviorKind::VoidDemonstration => {
                let anchors = cards.iter().map(|id| rect_of(manager, *id).center).collect();
                for id in cards {
                    set_on(manager, *id, |c| {
                        c.params.set("void_float", true);
                        c.params.set("cosmic_loneliness", 0.8);
                        c.opacity = 0.6;
                    });
                }
                Motion::Void { anchors }
            }
            CardBehaviorKind::DataStreamFormation => {
                for (i, id) in cards.iter().enumerate() {
                    set_on(manager, *id, |c| {
                        c.params.set("information_flow", true);
                        c.params.set("data_velocity", 0.3 + 0.1 * i as f32);
                        c.params.set("stream_turbulence", 0.2);
                    });
                }
                Motion::Stream
            }
            CardBehaviorKind::DialecticalDance => Motion::Dance { angle: 0.0 },
            CardBehaviorKind::NeuralNetworkFormation => {
                let n = cards.len();
                let points: Vec<Vec2> = (0..n).map(|i| lattice_point(i, n)).collect();
                let mut phases = Vec::with_capacity(n);
                for (i, id) in cards.iter().enumerate() {
                    let activity = self.rng.next_f32_01();
                    phases.push(self.rng.angle());
                    set_on(manager, *id, |c| {
                        c.rect = Rect::new(points[i], NEURAL_SIZE);
                        c.params.set("neural_activity", activity);
                        c.params.set("consciousness_tier", i as f32);
                        c.params.set("synaptic_strength", 0.7);
                    });
                }
                Motion::Neural {
                    links: neural_links(&points),
                    phases,
                }
            }
            CardBehaviorKind::CosmicCollision => Motion::Collision,
            CardBehaviorKind::UniversalSynthesis => {
                let from = cards.iter().map(|id| rect_of(manager, *id)).collect();
                let opacity = cards
                    .iter()
                    .map(|id| manager.card(*id).map_or(1.0, |c| c.opacity))
                    .collect();
                Motion::Synthesis { from, opacity }
            }
            CardBehaviorKind::FutureProjection | CardBehaviorKind::InvitationToParticipate => {
                let n = cards.len();
                let slots: Vec<Rect> = (0..n)
                    .map(|i| {
                        if kind == CardBehaviorKind::FutureProjection {
                            grid_slot(i)
                        } else {
                            circle_slot(i, n)
                        }
                    })
                    .collect();
                for (i, id) in cards.iter().enumerate() {
                    set_on(manager, *id, |c| {
                        c.rect = slots[i];
                        c.opacity = 0.0;
                        c.scale = 0.0;
                        if kind == CardBehaviorKind::FutureProjection {
                            c.params.set("future_light", true);
                            c.params.set("possibility_branch", i as f32);
                            c.params.set("hope_resonance", 0.8);
                        } else {
                            c.params.set("welcoming_glow", true);
                            c.params.set("participation_portal", true);
                            c.params.set("collaborative_energy", 1.0);
                        }
                    });
                }
                Motion::Entrance { slots }
            }
        }
    }

    /// Retire cancelled runs without advancing anything else.
    pub fn reap(&mut self, manager: &mut CardLifecycleManager) -> Vec<RunOutcome> {
        let mut outcomes = Vec::new();
        let mut i = 0;
        while i < self.runs.len() {
            if self.runs[i].token.is_cancelled() {
                let run = self.runs.remove(i);
                outcomes.push(finish(run, manager, false));
            } else {
                i += 1;
            }
        }
        outcomes
    }

    /// Advance every run by `dt_ms`. Finished runs are returned in start order.
    pub fn tick(&mut self, dt_ms: f32, manager: &mut CardLifecycleManager) -> Vec<RunOutcome> {
        let mut outcomes = self.reap(manager);
        let dt = dt_ms.max(0.0) * self.speed;
        let mut i = 0;
        while i < self.runs.len() {
            let run = &mut self.runs[i];
            run.elapsed_ms += dt;
            apply(run, manager, &mut self.rng, dt);
            let done = match run.motion {
                Motion::Dance { angle } => angle >= DANCE_TURNS * TAU,
                _ => run.elapsed_ms >= run.duration_ms,
            };
            if done {
                let run = self.runs.remove(i);
                outcomes.push(finish(run, manager, true));
            } else {
                i += 1;
            }
        }
        outcomes
    }
}

fn check_arity(label: &'static str, arity: Arity, got: usize) -> Result<(), BehaviorError> {
    if arity.accepts(got) {
        Ok(())
    } else {
        Err(BehaviorError::Arity {
            behavior: label,
            expected: arity.describe(),
            got,
        })
    }
}

fn rect_of(manager: &CardLifecycleManager, id: CardId) -> Rect {
    manager.card(id).map(|c| c.rect).unwrap_or_default()
}

fn set_on(
    manager: &mut CardLifecycleManager,
    id: CardId,
    f: impl FnOnce(&mut crate::cards::Card),
) {
    if let Some(card) = manager.card_mut(id) {
        f(card);
    }
}

/// One frame of a run's choreography. Cards removed elsewhere are skipped.
fn apply(run: &mut Run, manager: &mut CardLifecycleManager, rng: &mut Prng, dt_ms: f32) {
    let t = run.progress();
    let cards = run.cards.clone();
    match &mut run.motion {
        Motion::Pulse => {
            let pulse = 1.0 + 0.05 * (TAU * t * 3.0).sin();
            set_on(manager, cards[0], |c| {
                c.scale = pulse;
                c.params.set("pulse_scale", pulse);
            });
        }
        Motion::Stress => {
            set_on(manager, cards[0], |c| {
                c.params.set("crack_formation", t);
            });
        }
        Motion::Split { origin, from, slots } => {
            let e = ease_in_out_cubic(t);
            set_on(manager, cards[0], |c| {
                c.params.set("fracture_progress", e);
                c.rect = Rect::new(*origin, from.scaled(1.0 - 0.6 * e));
                c.opacity = 1.0 - 0.8 * e;
            });
            for (k, id) in cards[1..].iter().enumerate() {
                let slot = slots[k];
                set_on(manager, *id, |c| {
                    c.rect = Rect::new(origin.lerp(slot.center, e), slot.size);
                    c.opacity = e;
                });
            }
        }
        Motion::Void { anchors } => {
            for (k, id) in cards.iter().enumerate() {
                let step = Vec2::new(rng.signed(VOID_WALK), rng.signed(VOID_WALK)) * frames_in(dt_ms / 1000.0);
                anchors[k] = (anchors[k] + step).clamp(0.05, 0.95);
                let at = anchors[k];
                set_on(manager, *id, |c| {
                    c.rect = Rect::new(at, VOID_SIZE);
                });
            }
        }
        Motion::Stream => {
            let phase = run.elapsed_ms / 1000.0;
            for (i, id) in cards.iter().enumerate() {
                set_on(manager, *id, |c| c.rect = stream_slot(i, phase));
            }
        }
        Motion::Dance { angle } => {
            *angle = (*angle + DANCE_STEP * frames_in(dt_ms / 1000.0)).min(DANCE_TURNS * TAU);
            let (a, b) = dance_positions(Vec2::CENTER, DANCE_RADIUS, *angle);
            let energy = dance_energy(a, b);
            for (id, at) in [(cards[0], a), (cards[1], b)] {
                set_on(manager, id, |c| {
                    c.rect = Rect::new(at, DANCE_SIZE);
                    c.params.set("energy_exchange", energy);
                });
            }
        }
        Motion::Neural { links, phases } => {
            let frames = frames_in(dt_ms / 1000.0);
            let activity: Vec<f32> = phases
                .iter()
                .map(|ph| 0.5 + 0.5 * (ph + TAU * 2.0 * t).sin())
                .collect();
            for link in links.iter_mut() {
                link.activity *= 0.99_f32.powf(frames);
                if activity[link.a] > 0.8 && rng.chance(0.1) {
                    link.activity = (link.activity + 0.3).min(1.0);
                }
            }
            for (i, id) in cards.iter().enumerate() {
                let (sum, n) = links
                    .iter()
                    .filter(|l| l.a == i || l.b == i)
                    .fold((0.0, 0), |(s, n), l| (s + l.activity * l.strength, n + 1));
                let strength = if n == 0 { 0.0 } else { sum / n as f32 };
                set_on(manager, *id, |c| {
                    c.params.set("neural_activity", activity[i]);
                    c.params.set("connection_strength", strength);
                });
            }
        }
        Motion::Collision => {
            let shock = if t > 0.7 { ((t - 0.7) * 3.33).min(1.0) } else { 0.0 };
            let xs = [0.2 + 0.15 * t, 0.8 - 0.15 * t];
            for (k, id) in cards.iter().take(2).enumerate() {
                set_on(manager, *id, |c| {
                    c.rect = Rect::new(Vec2::new(xs[k], 0.5), c.rect.size);
                    c.params.set("collision_shockwave", shock);
                });
            }
        }
        Motion::Synthesis { from, opacity } => {
            let e = ease_in_out_cubic(t);
            for (k, id) in cards.iter().enumerate() {
                let (r, o) = (from[k], opacity[k]);
                set_on(manager, *id, |c| {
                    c.rect = Rect::new(r.center.lerp(Vec2::CENTER, e), r.size);
                    c.opacity = o * (1.0 - e);
                });
            }
        }
        Motion::Entrance { slots } => {
            for (i, id) in cards.iter().enumerate() {
                let local = ((run.elapsed_ms - ENTRANCE_STAGGER_MS * i as f32) / ENTRANCE_MS).clamp(0.0, 1.0);
                let e = ease_out_cubic(local);
                let slot = slots[i];
                set_on(manager, *id, |c| {
                    c.rect = slot;
                    c.opacity = e;
                    c.scale = e;
                });
            }
        }
        Motion::Exit { from_opacity, .. } => {
            let o = *from_opacity * (1.0 - t);
            set_on(manager, cards[0], |c| c.opacity = o);
        }
    }
}

fn finish(run: Run, manager: &mut CardLifecycleManager, completed: bool) -> RunOutcome {
    manager.release(&run.cards);
    match (&run.motion, completed) {
        (Motion::Exit { .. }, _) => {
            manager.remove_card(run.cards[0]);
        }
        (Motion::Pulse, true) => set_on(manager, run.cards[0], |c| {
            c.scale = 1.0;
            c.params.set("pulse_scale", 1.0);
        }),
        (Motion::Split { .. }, true) => {
            set_on(manager, run.cards[0], |c| {
                c.params.set("theoretical_tension", 1.0);
            });
            for id in &run.cards[1..] {
                set_on(manager, *id, |c| {
                    c.params.set("incompatibility_field", 0.9);
                });
            }
        }
        (Motion::Synthesis { .. }, true) => {
            for id in &run.cards[1..] {
                manager.remove_card(*id);
            }
            set_on(manager, run.cards[0], |c| {
                c.rect = Rect::new(Vec2::CENTER, SYNTHESIS_SIZE);
                c.opacity = 1.0;
                c.params.set("universal_consciousness", 1.0);
                c.params.set("synthesis_glow", 1.0);
                c.params.set("transcendent_unity", 1.0);
            });
        }
        _ => {}
    }
    debug!(id = %run.id, behavior = run.label, completed, "behavior finished");
    RunOutcome {
        id: run.id,
        label: run.label,
        cards: run.cards,
        result: if completed {
            Ok(())
        } else {
            Err(BehaviorError::Cancelled(run.label))
        },
    }
}
