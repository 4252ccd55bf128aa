//! Section visual parameters and user preference overlays.
//!
//! A [`ConfigSource`] hands the engine per-section records plus the user's
//! [`Preferences`]. The engine only consumes the *resolved* record
//! ([`Preferences::resolve`]); the persisted preference format never leaks
//! past this module.

use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::ConfigError;
use crate::particles::PARTICLE_CAP;

/// localStorage key used by the browser front end.
pub const PREFERENCES_STORAGE_KEY: &str = "epo-user-preferences";

// ═══════════════════════════════════════════════════════════════════════════
// Section records
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorScheme {
    pub primary: [f32; 3],
    pub secondary: [f32; 3],
    pub accent: [f32; 3],
    pub background: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TransitionSettings {
    pub duration_ms: f32,
    pub easing: Easing,
    /// Effect tag, e.g. `"chaos-emergence"`.
    pub effect: &'static str,
}

/// Visual parameters for one configuration section.
///
/// `spacetime_curvature` is signed (`[-1, 1]`); every other scalar is `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SectionVisualParams {
    pub section: &'static str,
    pub title: &'static str,
    pub epo_integration: f32,
    pub epo_dispersion: f32,
    pub information_density: f32,
    pub consciousness_level: f32,
    pub spacetime_curvature: f32,
    pub quantum_coherence: f32,
    pub color_scheme: ColorScheme,
    pub transition: TransitionSettings,
}

impl SectionVisualParams {
    /// Clamp every field into its documented range.
    pub fn clamped(mut self) -> Self {
        self.epo_integration = self.epo_integration.clamp(0.0, 1.0);
        self.epo_dispersion = self.epo_dispersion.clamp(0.0, 1.0);
        self.information_density = self.information_density.clamp(0.0, 1.0);
        self.consciousness_level = self.consciousness_level.clamp(0.0, 1.0);
        self.spacetime_curvature = self.spacetime_curvature.clamp(-1.0, 1.0);
        self.quantum_coherence = self.quantum_coherence.clamp(0.0, 1.0);
        self.transition.duration_ms = self.transition.duration_ms.max(0.0);
        self
    }
}

#[allow(clippy::too_many_arguments)]
const fn record(
    section: &'static str,
    title: &'static str,
    values: [f32; 6],
    color_scheme: ColorScheme,
    duration_ms: f32,
    easing: Easing,
    effect: &'static str,
) -> SectionVisualParams {
    SectionVisualParams {
        section,
        title,
        epo_integration: values[0],
        epo_dispersion: values[1],
        information_density: values[2],
        consciousness_level: values[3],
        spacetime_curvature: values[4],
        quantum_coherence: values[5],
        color_scheme,
        transition: TransitionSettings {
            duration_ms,
            easing,
            effect,
        },
    }
}

const fn scheme(primary: [f32; 3], secondary: [f32; 3], accent: [f32; 3], background: [f32; 3]) -> ColorScheme {
    ColorScheme {
        primary,
        secondary,
        accent,
        background,
    }
}

static SECTION_PARAMS: [SectionVisualParams; 7] = [
    record(
        "introduction",
        "Introduction: Cosmic Genesis",
        [0.5, 0.5, 0.6, 0.3, 0.0, 0.4],
        scheme([0.4, 0.8, 1.0], [0.6, 0.6, 1.0], [1.0, 1.0, 0.8], [0.0, 0.1, 0.2]),
        2000.0,
        Easing::OutExpo,
        "balanced-emergence",
    ),
    record(
        "crisis",
        "The Crisis in Physics",
        [0.2, 0.8, 0.3, 0.1, -0.3, 0.2],
        scheme([1.0, 0.3, 0.3], [1.0, 0.5, 0.2], [0.8, 0.8, 0.8], [0.2, 0.0, 0.0]),
        2500.0,
        Easing::EaseOut,
        "chaos-emergence",
    ),
    record(
        "axioms",
        "The Foundational Axioms",
        [0.5, 0.5, 0.7, 0.3, 0.0, 0.6],
        scheme([0.6, 0.4, 1.0], [0.4, 0.6, 1.0], [1.0, 0.8, 0.4], [0.1, 0.0, 0.2]),
        2000.0,
        Easing::EaseInOut,
        "foundation-assembly",
    ),
    record(
        "mechanics",
        "The Mechanics of EPO",
        [0.7, 0.6, 0.8, 0.4, 0.2, 0.7],
        scheme([0.3, 1.0, 0.6], [0.2, 0.8, 1.0], [1.0, 1.0, 0.6], [0.0, 0.2, 0.1]),
        2200.0,
        Easing::OutBack,
        "force-dynamics",
    ),
    record(
        "explanatory",
        "Explanatory Power",
        [0.8, 0.4, 0.9, 0.6, 0.5, 0.8],
        scheme([1.0, 0.8, 0.2], [0.8, 1.0, 0.4], [1.0, 0.6, 0.8], [0.2, 0.2, 0.0]),
        2500.0,
        Easing::EaseInOut,
        "emergence-cascade",
    ),
    record(
        "consciousness",
        "Consciousness and the Cosmos",
        [1.0, 0.2, 1.0, 1.0, 0.8, 0.9],
        scheme([1.0, 1.0, 0.4], [1.0, 0.8, 0.6], [0.8, 1.0, 1.0], [0.3, 0.3, 0.0]),
        3000.0,
        Easing::EaseOut,
        "consciousness-awakening",
    ),
    record(
        "mathematics",
        "Mathematical Appendix",
        [0.6, 0.3, 1.0, 0.5, 0.3, 0.8],
        scheme([0.8, 0.8, 1.0], [0.6, 0.8, 1.0], [1.0, 1.0, 0.8], [0.0, 0.0, 0.3]),
        1500.0,
        Easing::EaseInOut,
        "mathematical-elegance",
    ),
];

/// All built-in section records, in paper order.
pub fn section_params_table() -> &'static [SectionVisualParams] {
    &SECTION_PARAMS
}

// ═══════════════════════════════════════════════════════════════════════════
// Preferences
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PerformanceProfile {
    High,
    #[default]
    Medium,
    Low,
}

impl PerformanceProfile {
    pub fn all() -> &'static [PerformanceProfile] {
        &[
            PerformanceProfile::High,
            PerformanceProfile::Medium,
            PerformanceProfile::Low,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceProfile::High => "high",
            PerformanceProfile::Medium => "medium",
            PerformanceProfile::Low => "low",
        }
    }

    pub fn target_fps(self) -> u32 {
        match self {
            PerformanceProfile::High => 60,
            PerformanceProfile::Medium | PerformanceProfile::Low => 30,
        }
    }

    pub fn particle_budget(self) -> usize {
        match self {
            PerformanceProfile::High => 10_000,
            PerformanceProfile::Medium => 5_000,
            PerformanceProfile::Low => 2_000,
        }
    }

    /// Effective per-level particle cap.
    pub fn level_cap(self) -> usize {
        PARTICLE_CAP.min(self.particle_budget())
    }
}

impl FromStr for PerformanceProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(PerformanceProfile::High),
            "medium" => Ok(PerformanceProfile::Medium),
            "low" => Ok(PerformanceProfile::Low),
            _ => Err(ConfigError::UnknownValue {
                field: "performance",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum EffectIntensity {
    Minimal,
    #[default]
    Subtle,
    Strong,
}

impl EffectIntensity {
    pub fn all() -> &'static [EffectIntensity] {
        &[
            EffectIntensity::Minimal,
            EffectIntensity::Subtle,
            EffectIntensity::Strong,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectIntensity::Minimal => "minimal",
            EffectIntensity::Subtle => "subtle",
            EffectIntensity::Strong => "strong",
        }
    }

    pub fn factor(self) -> f32 {
        match self {
            EffectIntensity::Minimal => 0.5,
            EffectIntensity::Subtle => 1.0,
            EffectIntensity::Strong => 1.5,
        }
    }
}

impl FromStr for EffectIntensity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(EffectIntensity::Minimal),
            "subtle" => Ok(EffectIntensity::Subtle),
            "strong" => Ok(EffectIntensity::Strong),
            _ => Err(ConfigError::UnknownValue {
                field: "effect_intensity",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Accessibility {
    pub reduced_motion: bool,
    pub high_contrast: bool,
}

const REDUCED_MOTION_DURATION: f32 = 0.5;
const REDUCED_MOTION_FORCES: f32 = 0.7;

/// User preferences as persisted by the hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Preferences {
    pub performance: PerformanceProfile,
    pub effect_intensity: EffectIntensity,
    pub accessibility: Accessibility,
}

impl Preferences {
    pub fn with_performance(mut self, performance: PerformanceProfile) -> Self {
        self.performance = performance;
        self
    }

    pub fn with_effect_intensity(mut self, intensity: EffectIntensity) -> Self {
        self.effect_intensity = intensity;
        self
    }

    pub fn with_reduced_motion(mut self, on: bool) -> Self {
        self.accessibility.reduced_motion = on;
        self
    }

    pub fn with_high_contrast(mut self, on: bool) -> Self {
        self.accessibility.high_contrast = on;
        self
    }

    /// Multiplier for behavior and transition durations.
    pub fn duration_scale(&self) -> f32 {
        if self.accessibility.reduced_motion {
            REDUCED_MOTION_DURATION
        } else {
            1.0
        }
    }

    /// Factor applied to emotion-derived EPO quads.
    pub fn effect_factor(&self) -> f32 {
        self.effect_intensity.factor()
    }

    pub fn particle_cap(&self) -> usize {
        self.performance.level_cap()
    }

    /// Apply the effect-intensity and accessibility overlays to a section record.
    pub fn resolve(&self, params: &SectionVisualParams) -> SectionVisualParams {
        let k = self.effect_factor();
        let mut out = *params;
        out.epo_integration = (out.epo_integration * k).min(1.0);
        out.epo_dispersion = (out.epo_dispersion * k).min(1.0);
        out.information_density = (out.information_density * k).min(1.0);
        out.consciousness_level = (out.consciousness_level * k).min(1.0);
        out.quantum_coherence = (out.quantum_coherence * k).min(1.0);
        // signed: cap the magnitude, keep the direction
        out.spacetime_curvature = (out.spacetime_curvature * k).clamp(-1.0, 1.0);

        if self.accessibility.reduced_motion {
            out.transition.duration_ms *= REDUCED_MOTION_DURATION;
            out.epo_integration *= REDUCED_MOTION_FORCES;
            out.epo_dispersion *= REDUCED_MOTION_FORCES;
        }
        if self.accessibility.high_contrast {
            out.color_scheme.primary = [1.0, 1.0, 1.0];
            out.color_scheme.background = [0.0, 0.0, 0.0];
        }
        out.clamped()
    }

    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Source trait
// ═══════════════════════════════════════════════════════════════════════════

pub trait ConfigSource {
    /// Raw (unresolved) record for `section`.
    fn section_params(&self, section: &str) -> Option<SectionVisualParams>;

    fn preferences(&self) -> Preferences;

    /// Record with the current preferences applied.
    fn resolved(&self, section: &str) -> Option<SectionVisualParams> {
        let prefs = self.preferences();
        self.section_params(section).map(|p| prefs.resolve(&p))
    }
}

/// Built-in section table with caller-supplied preferences.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticConfig {
    prefs: Preferences,
}

impl StaticConfig {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn set_preferences(&mut self, prefs: Preferences) {
        self.prefs = prefs;
    }
}

impl ConfigSource for StaticConfig {
    fn section_params(&self, section: &str) -> Option<SectionVisualParams> {
        SECTION_PARAMS.iter().find(|p| p.section == section).copied()
    }

    fn preferences(&self) -> Preferences {
        self.prefs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::NarrativeBeatTable;

    fn crisis() -> SectionVisualParams {
        StaticConfig::default().section_params("crisis").expect("crisis exists")
    }

    #[test]
    fn table_is_stable_and_in_range() {
        let table = section_params_table();
        assert_eq!(table.len(), 7);
        for p in table {
            assert_eq!(*p, p.clamped(), "{} out of range", p.section);
        }
        assert_eq!(crisis().spacetime_curvature, -0.3);
        assert_eq!(crisis().transition.effect, "chaos-emergence");
    }

    #[test]
    fn every_beat_names_a_known_section() {
        let cfg = StaticConfig::default();
        for beat in NarrativeBeatTable.ordered() {
            assert!(cfg.section_params(beat.config_section).is_some(), "{}", beat.id);
        }
    }

    #[test]
    fn strong_intensity_caps_and_keeps_curvature_sign() {
        let prefs = Preferences::default().with_effect_intensity(EffectIntensity::Strong);
        let r = prefs.resolve(&crisis());
        assert!((r.epo_dispersion - 1.0).abs() < 1e-6);
        assert!((r.epo_integration - 0.3).abs() < 1e-6);
        assert!((r.spacetime_curvature + 0.45).abs() < 1e-6);

        let consciousness = StaticConfig::default().section_params("consciousness").expect("exists");
        let r = prefs.resolve(&consciousness);
        assert_eq!(r.consciousness_level, 1.0);
        assert!(r.spacetime_curvature <= 1.0);
    }

    #[test]
    fn minimal_halves_parameters() {
        let prefs = Preferences::default().with_effect_intensity(EffectIntensity::Minimal);
        let r = prefs.resolve(&crisis());
        assert!((r.epo_dispersion - 0.4).abs() < 1e-6);
        assert!((r.spacetime_curvature + 0.15).abs() < 1e-6);
    }

    #[test]
    fn accessibility_overlays() {
        let prefs = Preferences::default()
            .with_reduced_motion(true)
            .with_high_contrast(true);
        let r = prefs.resolve(&crisis());
        assert_eq!(r.transition.duration_ms, 1250.0);
        assert!((r.epo_dispersion - 0.56).abs() < 1e-6);
        assert_eq!(r.color_scheme.primary, [1.0, 1.0, 1.0]);
        assert_eq!(r.color_scheme.background, [0.0, 0.0, 0.0]);
        assert_eq!(r.color_scheme.accent, crisis().color_scheme.accent);
        assert_eq!(prefs.duration_scale(), 0.5);
    }

    #[test]
    fn performance_profiles() {
        assert_eq!(PerformanceProfile::High.target_fps(), 60);
        assert_eq!(PerformanceProfile::High.level_cap(), 2000);
        assert_eq!(PerformanceProfile::Low.level_cap(), 2000);
        assert_eq!("LOW".parse::<PerformanceProfile>().ok(), Some(PerformanceProfile::Low));
        assert!(matches!(
            "turbo".parse::<PerformanceProfile>(),
            Err(ConfigError::UnknownValue { field: "performance", .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn preferences_json_fills_defaults() {
        let prefs = Preferences::from_json(r#"{"effect_intensity":"strong"}"#).expect("valid json");
        assert_eq!(prefs.effect_intensity, EffectIntensity::Strong);
        assert_eq!(prefs.performance, PerformanceProfile::Medium);
        assert!(!prefs.accessibility.reduced_motion);

        let text = prefs.to_json().expect("serializes");
        assert_eq!(Preferences::from_json(&text).expect("round trip"), prefs);
        assert!(matches!(Preferences::from_json("{"), Err(ConfigError::Json(_))));
    }
}
