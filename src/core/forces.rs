//! EPO force settings and the emotion tags that drive them.
//!
//! `integration`, `dispersion`, `information` and `consciousness` all live in
//! `[0, 1]`. The one signed field in the system (`spacetime_curvature`) lives
//! on section records in [`crate::config`], not here.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpoForces {
    pub integration: f32,
    pub dispersion: f32,
    pub information: f32,
    pub consciousness: f32,
}

impl Default for EpoForces {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.3, 0.1)
    }
}

impl EpoForces {
    /// Build a quad; every component is clamped to `[0, 1]`.
    pub fn new(integration: f32, dispersion: f32, information: f32, consciousness: f32) -> Self {
        Self {
            integration: unit(integration),
            dispersion: unit(dispersion),
            information: unit(information),
            consciousness: unit(consciousness),
        }
    }

    pub fn neutral() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5)
    }

    /// Scale every component by `k`, capping at 1.
    pub fn scaled(self, k: f32) -> Self {
        Self::new(
            self.integration * k,
            self.dispersion * k,
            self.information * k,
            self.consciousness * k,
        )
    }

    pub fn as_array(&self) -> [f32; 4] {
        [
            self.integration,
            self.dispersion,
            self.information,
            self.consciousness,
        ]
    }
}

#[inline]
fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Emotional tone of a narrative beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Emotion {
    WonderAnticipation,
    GrowingUnease,
    IntellectualCrisis,
    HumblingRealization,
    RevelatoryClarity,
    DynamicTensionResolution,
    ExpandingAwareness,
    ScientificVindication,
    TranscendentUnity,
    HopeDetermination,
    InspiringCall,
}

impl Emotion {
    pub fn all() -> &'static [Emotion] {
        &[
            Emotion::WonderAnticipation,
            Emotion::GrowingUnease,
            Emotion::IntellectualCrisis,
            Emotion::HumblingRealization,
            Emotion::RevelatoryClarity,
            Emotion::DynamicTensionResolution,
            Emotion::ExpandingAwareness,
            Emotion::ScientificVindication,
            Emotion::TranscendentUnity,
            Emotion::HopeDetermination,
            Emotion::InspiringCall,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::WonderAnticipation => "wonder-anticipation",
            Emotion::GrowingUnease => "growing-unease",
            Emotion::IntellectualCrisis => "intellectual-crisis",
            Emotion::HumblingRealization => "humbling-realization",
            Emotion::RevelatoryClarity => "revelatory-clarity",
            Emotion::DynamicTensionResolution => "dynamic-tension-resolution",
            Emotion::ExpandingAwareness => "expanding-awareness",
            Emotion::ScientificVindication => "scientific-vindication",
            Emotion::TranscendentUnity => "transcendent-unity",
            Emotion::HopeDetermination => "hope-determination",
            Emotion::InspiringCall => "inspiring-call",
        }
    }

    pub fn from_label(label: &str) -> Option<Emotion> {
        Emotion::all().iter().copied().find(|e| e.label() == label)
    }

    /// The force quad for this emotion. Pure lookup.
    pub fn forces(self) -> EpoForces {
        let (i, d, info, c) = match self {
            Emotion::WonderAnticipation => (0.7, 0.3, 0.8, 0.4),
            Emotion::GrowingUnease => (0.4, 0.6, 0.5, 0.3),
            Emotion::IntellectualCrisis => (0.2, 0.8, 0.3, 0.2),
            Emotion::HumblingRealization => (0.1, 0.9, 0.2, 0.1),
            Emotion::RevelatoryClarity => (0.8, 0.2, 0.9, 0.6),
            Emotion::DynamicTensionResolution => (0.6, 0.6, 0.7, 0.5),
            Emotion::ExpandingAwareness => (0.9, 0.3, 0.9, 0.8),
            Emotion::ScientificVindication => (0.7, 0.4, 0.8, 0.6),
            Emotion::TranscendentUnity => (1.0, 0.2, 1.0, 1.0),
            Emotion::HopeDetermination => (0.8, 0.4, 0.8, 0.7),
            Emotion::InspiringCall => (0.9, 0.5, 0.9, 0.8),
        };
        EpoForces::new(i, d, info, c)
    }

    pub fn tension(self) -> f32 {
        match self {
            Emotion::WonderAnticipation => 0.3,
            Emotion::GrowingUnease => 0.6,
            Emotion::IntellectualCrisis => 0.9,
            Emotion::HumblingRealization => 0.7,
            Emotion::RevelatoryClarity => 0.2,
            Emotion::DynamicTensionResolution => 0.4,
            Emotion::ExpandingAwareness => 0.1,
            Emotion::ScientificVindication => 0.2,
            Emotion::TranscendentUnity => 0.0,
            Emotion::HopeDetermination => 0.3,
            Emotion::InspiringCall => 0.4,
        }
    }

    pub fn revelation(self) -> f32 {
        match self {
            Emotion::WonderAnticipation => 0.2,
            Emotion::GrowingUnease => 0.1,
            Emotion::IntellectualCrisis => 0.0,
            Emotion::HumblingRealization => 0.6,
            Emotion::RevelatoryClarity => 0.9,
            Emotion::DynamicTensionResolution => 0.7,
            Emotion::ExpandingAwareness => 0.8,
            Emotion::ScientificVindication => 0.9,
            Emotion::TranscendentUnity => 1.0,
            Emotion::HopeDetermination => 0.8,
            Emotion::InspiringCall => 0.7,
        }
    }

    pub fn mood(self) -> NarrativeMood {
        NarrativeMood {
            tension: self.tension(),
            revelation: self.revelation(),
        }
    }
}

/// Tension and revelation of the active beat, exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NarrativeMood {
    pub tension: f32,
    pub revelation: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_mapping_is_deterministic() {
        for &e in Emotion::all() {
            let a = e.forces();
            let b = e.forces();
            assert_eq!(a, b, "{}", e.label());
            for v in a.as_array() {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn labels_round_trip_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for &e in Emotion::all() {
            assert!(seen.insert(e.label()));
            assert_eq!(Emotion::from_label(e.label()), Some(e));
        }
        assert_eq!(Emotion::all().len(), 11);
        assert_eq!(Emotion::from_label("ennui"), None);
    }

    #[test]
    fn zero_valued_moods_are_kept() {
        assert_eq!(Emotion::TranscendentUnity.tension(), 0.0);
        assert_eq!(Emotion::IntellectualCrisis.revelation(), 0.0);
    }

    #[test]
    fn forces_are_clamped() {
        let f = EpoForces::new(-1.0, 2.0, f32::NAN, 0.5);
        assert_eq!(f.as_array(), [0.0, 1.0, 0.0, 0.5]);
        let s = EpoForces::new(0.8, 0.4, 0.9, 0.2).scaled(1.5);
        assert_eq!(s.integration, 1.0);
        assert!((s.dispersion - 0.6).abs() < 1e-6);
    }
}
