//! Narrative beat catalog.
//!
//! Eleven beats partition scroll progress `[0, 1]`. Each names the card
//! choreography to run, the emotion that sets the EPO forces, the emergence
//! level to show, and the exit style used on the cards of the beat it
//! replaces.

use crate::error::NavigationError;
use crate::forces::Emotion;
use crate::geometry::{Size2, Vec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named card choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CardBehaviorKind {
    UnifiedOrigin,
    StressAccumulation,
    CatastrophicSplit,
    VoidDemonstration,
    DataStreamFormation,
    DialecticalDance,
    NeuralNetworkFormation,
    CosmicCollision,
    UniversalSynthesis,
    FutureProjection,
    InvitationToParticipate,
}

impl CardBehaviorKind {
    pub fn all() -> &'static [CardBehaviorKind] {
        &[
            CardBehaviorKind::UnifiedOrigin,
            CardBehaviorKind::StressAccumulation,
            CardBehaviorKind::CatastrophicSplit,
            CardBehaviorKind::VoidDemonstration,
            CardBehaviorKind::DataStreamFormation,
            CardBehaviorKind::DialecticalDance,
            CardBehaviorKind::NeuralNetworkFormation,
            CardBehaviorKind::CosmicCollision,
            CardBehaviorKind::UniversalSynthesis,
            CardBehaviorKind::FutureProjection,
            CardBehaviorKind::InvitationToParticipate,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            CardBehaviorKind::UnifiedOrigin => "unified-origin",
            CardBehaviorKind::StressAccumulation => "stress-accumulation",
            CardBehaviorKind::CatastrophicSplit => "catastrophic-split",
            CardBehaviorKind::VoidDemonstration => "void-demonstration",
            CardBehaviorKind::DataStreamFormation => "data-stream-formation",
            CardBehaviorKind::DialecticalDance => "dialectical-dance",
            CardBehaviorKind::NeuralNetworkFormation => "neural-network-formation",
            CardBehaviorKind::CosmicCollision => "cosmic-collision",
            CardBehaviorKind::UniversalSynthesis => "universal-synthesis",
            CardBehaviorKind::FutureProjection => "future-projection",
            CardBehaviorKind::InvitationToParticipate => "invitation-to-participate",
        }
    }

    pub fn from_label(label: &str) -> Option<CardBehaviorKind> {
        CardBehaviorKind::all()
            .iter()
            .copied()
            .find(|k| k.label() == label)
    }

    /// How many cards the choreography accepts.
    ///
    /// `catastrophic-split` takes `[source, left, right]`; `cosmic-collision`
    /// takes two clusters plus an optional static evidence card.
    pub fn arity(self) -> Arity {
        match self {
            CardBehaviorKind::UnifiedOrigin | CardBehaviorKind::StressAccumulation => {
                Arity::Exactly(1)
            }
            CardBehaviorKind::CatastrophicSplit => Arity::Exactly(3),
            CardBehaviorKind::DialecticalDance => Arity::Exactly(2),
            CardBehaviorKind::NeuralNetworkFormation => Arity::AtLeast(2),
            CardBehaviorKind::CosmicCollision => Arity::Between(2, 3),
            CardBehaviorKind::VoidDemonstration
            | CardBehaviorKind::DataStreamFormation
            | CardBehaviorKind::UniversalSynthesis
            | CardBehaviorKind::FutureProjection
            | CardBehaviorKind::InvitationToParticipate => Arity::AtLeast(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == k,
            Arity::AtLeast(k) => n >= k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
        }
    }

    pub fn describe(self) -> String {
        match self {
            Arity::Exactly(k) => format!("exactly {k}"),
            Arity::AtLeast(k) => format!("at least {k}"),
            Arity::Between(lo, hi) => format!("{lo} to {hi}"),
        }
    }
}

/// Exit animation applied to outgoing cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ExitStyle {
    #[default]
    GentleFade,
    ExplosiveDestruction,
    TransformationMorph,
    InformationDissolve,
    ConsciousnessAbsorption,
}

impl ExitStyle {
    pub fn all() -> &'static [ExitStyle] {
        &[
            ExitStyle::GentleFade,
            ExitStyle::ExplosiveDestruction,
            ExitStyle::TransformationMorph,
            ExitStyle::InformationDissolve,
            ExitStyle::ConsciousnessAbsorption,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            ExitStyle::GentleFade => "gentle-fade",
            ExitStyle::ExplosiveDestruction => "explosive-destruction",
            ExitStyle::TransformationMorph => "transformation-morph",
            ExitStyle::InformationDissolve => "information-dissolve",
            ExitStyle::ConsciousnessAbsorption => "consciousness-absorption",
        }
    }

    pub fn duration_ms(self) -> f32 {
        match self {
            ExitStyle::GentleFade => 1000.0,
            ExitStyle::ExplosiveDestruction => 2000.0,
            ExitStyle::TransformationMorph => 1500.0,
            ExitStyle::InformationDissolve => 1200.0,
            ExitStyle::ConsciousnessAbsorption => 1800.0,
        }
    }

    /// Parameters raised to 1 when the exit starts.
    pub fn tag_params(self) -> &'static [&'static str] {
        match self {
            ExitStyle::GentleFade => &[],
            ExitStyle::ExplosiveDestruction => &["explosion_force", "destruction_chaos"],
            ExitStyle::TransformationMorph => &["morphing_state", "information_flux"],
            ExitStyle::InformationDissolve => &["information_dissolution", "data_scatter"],
            ExitStyle::ConsciousnessAbsorption => {
                &["consciousness_absorption", "awareness_integration"]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardCount {
    Fixed(usize),
    /// Every card alive when the beat starts, plus one consolidated card.
    AllPrevious,
}

/// One explicit card placement (normalized screen fractions).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub center: Vec2,
    pub size: Size2,
}

const fn slot(x: f32, y: f32, w: f32, h: f32) -> Slot {
    Slot {
        center: Vec2::new(x, y),
        size: Size2::new(w, h),
    }
}

/// Layout algorithms computed at run time by [`crate::behaviors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedLayout {
    ScatteredVoid,
    FlowingStreams,
    OrbitalDance,
    ConsciousnessLattice,
    ConvergentIntegration,
    ForwardProjection,
    WelcomingCircle,
}

impl NamedLayout {
    pub fn label(self) -> &'static str {
        match self {
            NamedLayout::ScatteredVoid => "scattered-void",
            NamedLayout::FlowingStreams => "flowing-streams",
            NamedLayout::OrbitalDance => "orbital-dance",
            NamedLayout::ConsciousnessLattice => "consciousness-lattice",
            NamedLayout::ConvergentIntegration => "convergent-integration",
            NamedLayout::ForwardProjection => "forward-projection",
            NamedLayout::WelcomingCircle => "welcoming-circle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    Explicit(&'static [Slot]),
    Named(NamedLayout),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBehaviorSpec {
    pub kind: CardBehaviorKind,
    pub card_count: CardCount,
    pub layout: Layout,
    pub animation: &'static str,
    pub effect_tags: &'static [&'static str],
}

/// Text payload. Only renderers read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatContent {
    pub headline: &'static str,
    /// One entry per card, in card order. Shorter lists repeat the last entry.
    pub cards: &'static [&'static str],
}

impl BeatContent {
    pub fn card_text(&self, index: usize) -> &'static str {
        self.cards
            .get(index)
            .or_else(|| self.cards.last())
            .copied()
            .unwrap_or(self.headline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrativeBeat {
    pub id: &'static str,
    pub lo: f32,
    pub hi: f32,
    pub behavior: CardBehaviorSpec,
    pub content: BeatContent,
    pub emotion: Emotion,
    pub level: usize,
    /// Style used on outgoing cards when this beat becomes active.
    pub exit: ExitStyle,
    /// Key into the configuration section table.
    pub config_section: &'static str,
    /// Content section used for card visual states and depth entry.
    pub section: &'static str,
}

impl NarrativeBeat {
    pub fn contains(&self, p: f32, is_last: bool) -> bool {
        if is_last {
            p >= self.lo && p <= self.hi
        } else {
            p >= self.lo && p < self.hi
        }
    }

    /// Progress within the beat, `[0, 1]`.
    pub fn local_progress(&self, p: f32) -> f32 {
        let span = self.hi - self.lo;
        if span <= 0.0 {
            return 0.0;
        }
        ((p - self.lo) / span).clamp(0.0, 1.0)
    }
}

const ORIGIN_SLOTS: [Slot; 1] = [slot(0.5, 0.5, 0.9, 0.7)];

const STRESS_SLOTS: [Slot; 1] = [slot(0.5, 0.5, 0.85, 0.65)];

const SPLIT_SLOTS: [Slot; 3] = [
    slot(0.5, 0.3, 0.4, 0.2),
    slot(0.25, 0.5, 0.35, 0.5),
    slot(0.75, 0.5, 0.35, 0.5),
];

const COLLISION_SLOTS: [Slot; 3] = [
    slot(0.2, 0.5, 0.25, 0.3),
    slot(0.8, 0.5, 0.25, 0.3),
    slot(0.5, 0.7, 0.4, 0.2),
];

static BEATS: [NarrativeBeat; 11] = [
    NarrativeBeat {
        id: "genesis",
        lo: 0.0,
        hi: 0.05,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::UnifiedOrigin,
            card_count: CardCount::Fixed(1),
            layout: Layout::Explicit(&ORIGIN_SLOTS),
            animation: "cosmic-pulse",
            effect_tags: &[],
        },
        content: BeatContent {
            headline: "The Entropic Principle of Organization",
            cards: &["The Entropic Principle of Organization: a framework for informational physics and emergent reality"],
        },
        emotion: Emotion::WonderAnticipation,
        level: 0,
        exit: ExitStyle::GentleFade,
        config_section: "introduction",
        section: "cover",
    },
    NarrativeBeat {
        id: "crisis-building",
        lo: 0.05,
        hi: 0.12,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::StressAccumulation,
            card_count: CardCount::Fixed(1),
            layout: Layout::Explicit(&STRESS_SLOTS),
            animation: "stress-visualization",
            effect_tags: &["subtle-cracks", "tension-lines", "instability-shimmer"],
        },
        content: BeatContent {
            headline: "Science advances through paradigm revolution",
            cards: &["Anomalies have migrated to the core"],
        },
        emotion: Emotion::GrowingUnease,
        level: 2,
        exit: ExitStyle::GentleFade,
        config_section: "crisis",
        section: "1.1",
    },
    NarrativeBeat {
        id: "paradigm-fracture",
        lo: 0.12,
        hi: 0.18,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::CatastrophicSplit,
            card_count: CardCount::Fixed(3),
            layout: Layout::Explicit(&SPLIT_SLOTS),
            animation: "violent-fracture",
            effect_tags: &["fracture-lines", "debris-particles", "energy-discharge"],
        },
        content: BeatContent {
            headline: "The incompatible divide",
            cards: &[
                "THE INCOMPATIBLE DIVIDE",
                "General Relativity: smooth, deterministic",
                "Quantum Mechanics: discrete, probabilistic",
            ],
        },
        emotion: Emotion::IntellectualCrisis,
        level: 1,
        exit: ExitStyle::ExplosiveDestruction,
        config_section: "crisis",
        section: "1.1",
    },
    NarrativeBeat {
        id: "dark-matter-void",
        lo: 0.18,
        hi: 0.25,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::VoidDemonstration,
            card_count: CardCount::Fixed(5),
            layout: Layout::Named(NamedLayout::ScatteredVoid),
            animation: "floating-in-emptiness",
            effect_tags: &["vast-emptiness", "lonely-isolation", "dark-matter-halos"],
        },
        content: BeatContent {
            headline: "95% unknown",
            cards: &[
                "Observable Matter 5%",
                "Dark Matter 27%",
                "Dark Energy 68%",
                "Unknown Physics ???",
                "ΛCDM Crisis 95%",
            ],
        },
        emotion: Emotion::HumblingRealization,
        level: 13,
        exit: ExitStyle::InformationDissolve,
        config_section: "crisis",
        section: "1.2",
    },
    NarrativeBeat {
        id: "information-axiom",
        lo: 0.25,
        hi: 0.35,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::DataStreamFormation,
            card_count: CardCount::Fixed(5),
            layout: Layout::Named(NamedLayout::FlowingStreams),
            animation: "information-flow",
            effect_tags: &["data-particles", "stream-connections", "flow-turbulence"],
        },
        content: BeatContent {
            headline: "Axiom I: the primacy of information",
            cards: &[
                "AXIOM I: The Primacy of Information",
                "Information is the fundamental substrate",
                "Matter, energy, space, time are emergent",
                "Every particle projects informational signals",
                "The universe is ceaseless informational flux",
            ],
        },
        emotion: Emotion::RevelatoryClarity,
        level: 4,
        exit: ExitStyle::TransformationMorph,
        config_section: "axioms",
        section: "2.1",
    },
    NarrativeBeat {
        id: "entropic-duality",
        lo: 0.35,
        hi: 0.45,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::DialecticalDance,
            card_count: CardCount::Fixed(2),
            layout: Layout::Named(NamedLayout::OrbitalDance),
            animation: "eternal-dialectic",
            effect_tags: &["force-field-lines", "energy-exchange", "harmonic-resonance"],
        },
        content: BeatContent {
            headline: "Entropic duality",
            cards: &["EPO-I: Integration Drive", "EPO-D: Dispersion Drive"],
        },
        emotion: Emotion::DynamicTensionResolution,
        level: 8,
        exit: ExitStyle::TransformationMorph,
        config_section: "mechanics",
        section: "2.2",
    },
    NarrativeBeat {
        id: "consciousness-hierarchy",
        lo: 0.45,
        hi: 0.55,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::NeuralNetworkFormation,
            card_count: CardCount::Fixed(8),
            layout: Layout::Named(NamedLayout::ConsciousnessLattice),
            animation: "neural-activation",
            effect_tags: &["synaptic-connections", "thought-propagation", "awareness-expansion"],
        },
        content: BeatContent {
            headline: "Consciousness as a physical hierarchy",
            cards: &[
                "Tier 1: Proto-Consciousness",
                "Tier 2: Structural Consciousness",
                "Tier 3: Biological Consciousness",
                "Universal Consciousness",
            ],
        },
        emotion: Emotion::ExpandingAwareness,
        level: 15,
        exit: ExitStyle::ConsciousnessAbsorption,
        config_section: "consciousness",
        section: "2.3",
    },
    NarrativeBeat {
        id: "bullet-cluster-evidence",
        lo: 0.55,
        hi: 0.65,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::CosmicCollision,
            card_count: CardCount::Fixed(3),
            layout: Layout::Explicit(&COLLISION_SLOTS),
            animation: "cluster-collision",
            effect_tags: &["gravitational-lensing", "matter-separation", "evidence-highlight"],
        },
        content: BeatContent {
            headline: "The Bullet Cluster",
            cards: &[
                "Hot X-ray Gas (Baryonic Matter)",
                "Galaxy Distribution (Gravitational Lensing)",
                "CLEAR OFFSET: information density ≠ matter density",
            ],
        },
        emotion: Emotion::ScientificVindication,
        level: 14,
        exit: ExitStyle::ExplosiveDestruction,
        config_section: "explanatory",
        section: "9",
    },
    NarrativeBeat {
        id: "universal-integration",
        lo: 0.65,
        hi: 0.75,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::UniversalSynthesis,
            card_count: CardCount::AllPrevious,
            layout: Layout::Named(NamedLayout::ConvergentIntegration),
            animation: "universal-unification",
            effect_tags: &["synthesis-glow", "knowledge-integration", "transcendent-unity"],
        },
        content: BeatContent {
            headline: "Universal Integration",
            cards: &["Universal Integration: the universe as a self-observing system"],
        },
        emotion: Emotion::TranscendentUnity,
        level: 15,
        exit: ExitStyle::ConsciousnessAbsorption,
        config_section: "consciousness",
        section: "11.2",
    },
    NarrativeBeat {
        id: "future-implications",
        lo: 0.75,
        hi: 0.85,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::FutureProjection,
            card_count: CardCount::Fixed(5),
            layout: Layout::Named(NamedLayout::ForwardProjection),
            animation: "possibility-expansion",
            effect_tags: &["future-light", "potential-branches", "hope-resonance"],
        },
        content: BeatContent {
            headline: "Where this leads",
            cards: &[
                "Unification of physics and consciousness",
                "Technologies based on information physics",
                "Understanding of cosmic purpose",
                "Humanity's role in universal consciousness",
                "The next phase of evolution",
            ],
        },
        emotion: Emotion::HopeDetermination,
        level: 15,
        exit: ExitStyle::TransformationMorph,
        config_section: "explanatory",
        section: "11.2",
    },
    NarrativeBeat {
        id: "call-to-action",
        lo: 0.85,
        hi: 1.0,
        behavior: CardBehaviorSpec {
            kind: CardBehaviorKind::InvitationToParticipate,
            card_count: CardCount::Fixed(4),
            layout: Layout::Named(NamedLayout::WelcomingCircle),
            animation: "invitation-gesture",
            effect_tags: &["welcoming-glow", "participation-portals", "collaborative-energy"],
        },
        content: BeatContent {
            headline: "The Information Age has reached fundamental physics",
            cards: &[
                "Join the great work of building a new science",
                "Question",
                "Test",
                "Build",
            ],
        },
        emotion: Emotion::InspiringCall,
        level: 15,
        exit: ExitStyle::GentleFade,
        config_section: "consciousness",
        section: "11.2",
    },
];

/// Read-only beat catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeBeatTable;

impl NarrativeBeatTable {
    pub fn ordered(&self) -> &'static [NarrativeBeat] {
        &BEATS
    }

    pub fn len(&self) -> usize {
        BEATS.len()
    }

    pub fn is_empty(&self) -> bool {
        BEATS.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&'static NarrativeBeat> {
        BEATS.get(index)
    }

    pub fn first(&self) -> &'static NarrativeBeat {
        &BEATS[0]
    }

    pub fn last(&self) -> &'static NarrativeBeat {
        &BEATS[BEATS.len() - 1]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        BEATS.iter().position(|b| b.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&'static NarrativeBeat, NavigationError> {
        BEATS
            .iter()
            .find(|b| b.id == id)
            .ok_or_else(|| NavigationError::UnknownBeat(id.to_string()))
    }

    /// The beat after `id`, staying on the last one.
    pub fn next(&self, id: &str) -> Result<&'static NarrativeBeat, NavigationError> {
        let i = self
            .index_of(id)
            .ok_or_else(|| NavigationError::UnknownBeat(id.to_string()))?;
        Ok(&BEATS[(i + 1).min(BEATS.len() - 1)])
    }

    /// The beat before `id`, staying on the first one.
    pub fn previous(&self, id: &str) -> Result<&'static NarrativeBeat, NavigationError> {
        let i = self
            .index_of(id)
            .ok_or_else(|| NavigationError::UnknownBeat(id.to_string()))?;
        Ok(&BEATS[i.saturating_sub(1)])
    }

    /// Check the partition: starts at 0, ends at 1, no gaps or overlaps.
    pub fn validate(beats: &[NarrativeBeat]) -> Result<(), String> {
        let first = beats.first().ok_or("empty beat table")?;
        if first.lo != 0.0 {
            return Err(format!("first beat '{}' starts at {}", first.id, first.lo));
        }
        for b in beats {
            if !(b.lo < b.hi) {
                return Err(format!("beat '{}' has empty range", b.id));
            }
            if let (CardCount::Fixed(n), Layout::Explicit(slots)) =
                (b.behavior.card_count, b.behavior.layout)
            {
                if slots.len() != n {
                    return Err(format!(
                        "beat '{}' lists {} slots for {} cards",
                        b.id,
                        slots.len(),
                        n
                    ));
                }
            }
        }
        for w in beats.windows(2) {
            if w[0].hi != w[1].lo {
                return Err(format!("gap between '{}' and '{}'", w[0].id, w[1].id));
            }
        }
        let last = beats.last().ok_or("empty beat table")?;
        if last.hi != 1.0 {
            return Err(format!("last beat '{}' ends at {}", last.id, last.hi));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::LEVEL_COUNT;

    #[test]
    fn catalog_partitions_unit_interval() {
        assert_eq!(NarrativeBeatTable::validate(NarrativeBeatTable.ordered()), Ok(()));
    }

    #[test]
    fn inventory_is_stable() {
        let ids: Vec<&str> = NarrativeBeatTable.ordered().iter().map(|b| b.id).collect();
        assert_eq!(
            ids,
            vec![
                "genesis",
                "crisis-building",
                "paradigm-fracture",
                "dark-matter-void",
                "information-axiom",
                "entropic-duality",
                "consciousness-hierarchy",
                "bullet-cluster-evidence",
                "universal-integration",
                "future-implications",
                "call-to-action",
            ]
        );
        for b in NarrativeBeatTable.ordered() {
            assert!(b.level < LEVEL_COUNT);
        }
        assert_eq!(NarrativeBeatTable.first().level, 0);
    }

    #[test]
    fn next_and_previous_clamp() {
        let t = NarrativeBeatTable;
        assert_eq!(t.next("call-to-action").map(|b| b.id), Ok("call-to-action"));
        assert_eq!(t.previous("genesis").map(|b| b.id), Ok("genesis"));
        assert_eq!(t.next("genesis").map(|b| b.id), Ok("crisis-building"));
        assert!(matches!(t.next("nope"), Err(NavigationError::UnknownBeat(_))));
    }

    #[test]
    fn validate_rejects_gaps() {
        let mut beats = BEATS.to_vec();
        beats[3].lo = 0.19;
        assert!(NarrativeBeatTable::validate(&beats).is_err());
    }

    #[test]
    fn behaviors_cover_every_kind_once() {
        let kinds: Vec<CardBehaviorKind> = NarrativeBeatTable
            .ordered()
            .iter()
            .map(|b| b.behavior.kind)
            .collect();
        assert_eq!(kinds, CardBehaviorKind::all());
        for &k in CardBehaviorKind::all() {
            assert_eq!(CardBehaviorKind::from_label(k.label()), Some(k));
        }
    }

    #[test]
    fn fixed_counts_satisfy_arity() {
        for b in NarrativeBeatTable.ordered() {
            if let CardCount::Fixed(n) = b.behavior.card_count {
                assert!(b.behavior.kind.arity().accepts(n), "{}", b.id);
            }
        }
    }

    #[test]
    fn arity_descriptions() {
        assert!(Arity::Exactly(2).accepts(2));
        assert!(!Arity::Exactly(2).accepts(3));
        assert!(Arity::Between(2, 3).accepts(3));
        assert!(!Arity::Between(2, 3).accepts(4));
        assert_eq!(Arity::Exactly(2).describe(), "exactly 2");
    }

    #[test]
    fn exit_styles_have_durations_and_unique_labels() {
        let mut seen = std::collections::HashSet::new();
        for &s in ExitStyle::all() {
            assert!(seen.insert(s.label()));
            assert!(s.duration_ms() > 0.0);
        }
        assert_eq!(ExitStyle::default(), ExitStyle::GentleFade);
    }

    #[test]
    fn card_text_repeats_last_entry() {
        let neural = NarrativeBeatTable.get("consciousness-hierarchy").map(|b| b.content);
        let Ok(content) = neural else {
            panic!("missing beat");
        };
        assert_eq!(content.card_text(7), "Universal Consciousness");
        assert_eq!(content.card_text(0), "Tier 1: Proto-Consciousness");
    }
}
