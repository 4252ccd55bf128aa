//! Error taxonomy.
//!
//! Only [`InitError::NoRenderSurface`] is meant to cross the orchestrator
//! boundary. Everything else is logged by the component that hit it and
//! turned into a no-op.

use thiserror::Error;

use crate::cards::CardId;

/// Card behavior invocation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviorError {
    #[error("behavior '{behavior}' expects {expected} card(s), got {got}")]
    Arity {
        behavior: &'static str,
        expected: String,
        got: usize,
    },
    #[error("card {0} is already running a behavior")]
    CardBusy(CardId),
    #[error("card {0} does not exist")]
    UnknownCard(CardId),
    #[error("the same card was passed twice: {0}")]
    DuplicateCard(CardId),
    #[error("behavior '{0}' was cancelled")]
    Cancelled(&'static str),
}

/// Initialization failures for a component or a rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("no 2D render surface available")]
    NoRenderSurface,
    #[error("GPU surface unavailable: {0}")]
    GpuUnavailable(String),
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("required container '{0}' is missing")]
    MissingContainer(String),
}

/// Invalid navigation targets. Always non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("unknown beat '{0}'")]
    UnknownBeat(String),
    #[error("unknown section '{0}'")]
    UnknownSection(String),
    #[error("emergence level {0} is out of range (0..{max})", max = crate::levels::LEVEL_COUNT)]
    LevelOutOfRange(usize),
}

/// Preference / configuration decoding failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid preferences JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown {field} value '{value}'")]
    UnknownValue { field: &'static str, value: String },
}

/// A GPU draw that failed after a successful init (context lost and the like).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("GPU draw failed: {0}")]
pub struct RenderError(pub String);

/// Umbrella error for embedders that want a single type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Behavior(#[from] BehaviorError),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_message_names_behavior_and_counts() {
        let err = BehaviorError::Arity {
            behavior: "dialectical-dance",
            expected: "exactly 2".to_string(),
            got: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("dialectical-dance"));
        assert!(msg.contains("exactly 2"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn level_out_of_range_reports_bound() {
        let msg = NavigationError::LevelOutOfRange(42).to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("0..16"));
    }

    #[test]
    fn engine_error_wraps_components() {
        let e: EngineError = InitError::NoRenderSurface.into();
        assert!(matches!(e, EngineError::Init(InitError::NoRenderSurface)));
    }
}
