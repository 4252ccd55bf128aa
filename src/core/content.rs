//! Paper content lookups.
//!
//! The engine never parses the paper; it asks a [`ContentSource`] for a
//! section's title, its visualization tag and its three depth layers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three layers revealed in depth mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DepthLayerKind {
    Mathematical,
    Conceptual,
    Philosophical,
}

impl DepthLayerKind {
    pub fn all() -> &'static [DepthLayerKind] {
        &[
            DepthLayerKind::Mathematical,
            DepthLayerKind::Conceptual,
            DepthLayerKind::Philosophical,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            DepthLayerKind::Mathematical => "mathematical",
            DepthLayerKind::Conceptual => "conceptual",
            DepthLayerKind::Philosophical => "philosophical",
        }
    }

    /// Digit keys 1-3.
    pub fn from_digit(d: u8) -> Option<DepthLayerKind> {
        match d {
            1 => Some(DepthLayerKind::Mathematical),
            2 => Some(DepthLayerKind::Conceptual),
            3 => Some(DepthLayerKind::Philosophical),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            DepthLayerKind::Mathematical => 0,
            DepthLayerKind::Conceptual => 1,
            DepthLayerKind::Philosophical => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthContent {
    pub section: &'static str,
    pub surface: &'static str,
    /// Indexed by [`DepthLayerKind::index`].
    pub layers: [&'static str; 3],
}

impl DepthContent {
    pub fn layer(&self, kind: DepthLayerKind) -> &'static str {
        self.layers[kind.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: &'static str,
    pub visual_type: &'static str,
}

pub trait ContentSource {
    fn section(&self, id: &str) -> Option<SectionInfo>;

    /// Visualization tag, `"default"` for unknown sections.
    fn visualization_type(&self, id: &str) -> &'static str {
        self.section(id).map_or("default", |s| s.visual_type)
    }

    /// Depth layers for `id`; sections without their own fall back to the cover.
    fn depth_content(&self, id: &str) -> DepthContent;

    fn sections_in_order(&self) -> Vec<&'static str>;
}

const fn section(
    id: &'static str,
    title: &'static str,
    kind: &'static str,
    visual_type: &'static str,
) -> SectionInfo {
    SectionInfo {
        id,
        title,
        kind,
        visual_type,
    }
}

static SECTIONS: [SectionInfo; 29] = [
    section("cover", "The Entropic Principle of Organization", "cover", "big-bang-formation"),
    section("1.1", "The Limits of the Materialist-Mechanistic Paradigm", "fracturing-card", "equation-dissolution"),
    section("1.2", "The ΛCDM Crisis", "pie-chart-void", "dark-matter-visualization"),
    section("1.3", "The Unification Impasse", "repelling-cards", "gr-qm-incompatibility"),
    section("1.4", "The Process-Relational Turn", "flowing-morph", "static-to-process"),
    section("2.1", "Axiom I: The Primacy of Information", "hierarchical-tree", "information-emergence"),
    section("2.2", "Axiom II: The Principle of Entropic Duality", "dual-forces", "epo-dialectic"),
    section("2.3", "Axiom III: The Universe as Closed System", "mobius-strip", "self-reference"),
    section("3.1", "A Truly Fundamental Interaction", "force-builder", "force-visualization"),
    section("3.2", "The Entropic Potential Field", "topographical-3d", "potential-landscape"),
    section("3.3", "The Unified EPO Force Law", "equation-interactive", "force-gradients"),
    section("4.1", "Formalizing the Integrative Potential", "layered-transparent", "potential-components"),
    section("4.2", "Formalizing the Dispersive Potential", "expansion-fields", "dispersive-sources"),
    section("5.1", "Formalizing Integrative and Dispersive Energy", "energy-conservation", "energy-transmutation"),
    section("5.2", "The Nuclear Exemplar", "nuclear-binding", "mass-defect-visualization"),
    section("6.1", "Spacetime as an EPO-I Phase Transition", "genesis-sequence", "spacetime-emergence"),
    section("6.2", "Gravity as an Information Field", "information-curvature", "gravity-gradient"),
    section("6.3", "The Phillips-Planck Core", "black-hole-core", "ppc-structure"),
    section("7.1", "A Unified Arrow of Time", "timeline-dual", "time-arrow"),
    section("7.2", "Quantum Mechanics: Cascading Phase Shifts", "quantum-collapse", "wave-function-integration"),
    section("7.3", "Relativity as an Informational Limit", "speed-limit", "information-processing"),
    section("8.1", "Dark Energy: Local Triumph, Global Consequence", "void-expansion", "structure-evacuation"),
    section("8.2", "Dark Matter: The Gravitational Effect of Information", "information-halos", "complexity-gravity"),
    section("9", "The Decisive Test: The Bullet Cluster", "split-comparison", "correlation-overlay"),
    section("10", "The Universal Signature: Allometric Scaling", "scaling-patterns", "power-law-universality"),
    section("11.1", "Consciousness as a Physical Hierarchy", "consciousness-pyramid", "tier-ascension"),
    section("11.2", "Embracing Panpsychism and Cosmopsychism", "cosmic-awareness", "universal-consciousness"),
    section("12", "From Lineage to Derivation", "connection-web", "theory-synthesis"),
    section("13", "A Phased, Falsifiable Research Program", "roadmap-timeline", "research-phases"),
];

static DEPTH: [DepthContent; 4] = [
    DepthContent {
        section: "cover",
        surface: "The Entropic Principle of Organization",
        layers: [
            "F_EPO = -ζ_i∇U_i + ζ_d∇U_d",
            "Information → Structure → Consciousness",
            "Reality = Self-Observing Information System",
        ],
    },
    DepthContent {
        section: "1.1",
        surface: "Materialist-Mechanistic Crisis",
        layers: [
            "∇²φ = 4πGρ_missing",
            "95% Unknown → Information Substrate",
            "Things → Processes",
        ],
    },
    DepthContent {
        section: "2.1",
        surface: "Information Primacy",
        layers: [
            "I = -Σp_i log(p_i)",
            "Bit → It → Conscious Observer",
            "Wheeler's \"It from Bit\" Realized",
        ],
    },
    DepthContent {
        section: "2.2",
        surface: "Entropic Duality",
        layers: [
            "ΔS_universe = ΔS_integration + ΔS_dispersion = 0",
            "Order ⇌ Chaos → Dynamic Balance",
            "Cosmic Dialectic Engine",
        ],
    },
];

/// Built-in section catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticContent;

impl ContentSource for StaticContent {
    fn section(&self, id: &str) -> Option<SectionInfo> {
        SECTIONS.iter().find(|s| s.id == id).copied()
    }

    fn depth_content(&self, id: &str) -> DepthContent {
        DEPTH
            .iter()
            .find(|d| d.section == id)
            .copied()
            .unwrap_or(DEPTH[0])
    }

    fn sections_in_order(&self) -> Vec<&'static str> {
        SECTIONS.iter().map(|s| s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::NarrativeBeatTable;

    #[test]
    fn catalog_is_stable() {
        let c = StaticContent;
        let ids = c.sections_in_order();
        assert_eq!(ids.len(), 29);
        assert_eq!(ids[0], "cover");
        assert_eq!(c.visualization_type("2.2"), "epo-dialectic");
        assert_eq!(c.visualization_type("nope"), "default");
    }

    #[test]
    fn every_beat_section_resolves() {
        let c = StaticContent;
        for beat in NarrativeBeatTable.ordered() {
            assert!(c.section(beat.section).is_some(), "{}", beat.section);
        }
    }

    #[test]
    fn depth_falls_back_to_cover() {
        let c = StaticContent;
        assert_eq!(c.depth_content("2.1").layer(DepthLayerKind::Conceptual), "Bit → It → Conscious Observer");
        assert_eq!(c.depth_content("9").section, "cover");
        assert_eq!(DepthLayerKind::from_digit(3), Some(DepthLayerKind::Philosophical));
        assert_eq!(DepthLayerKind::from_digit(4), None);
    }
}
