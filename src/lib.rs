//! # epo
//!
//! The visualization engine behind "The Entropic Principle of Organization":
//! a scroll-driven narrative that moves morphing cards, a 16-level emergence
//! particle field and a depth-mode tunnel through discrete story beats.
//!
//! The engine is host-agnostic. Rendering, DOM cards and input arrive through
//! the traits in [`surface`] and the registrations in [`input`], so every
//! component runs (and is tested) without a browser.
//!
//! ## Quick Start
//!
//! ```
//! use epo::prelude::*;
//!
//! let mut show = PresentationOrchestrator::headless(OrchestratorConfig::default())
//!     .expect("recording surfaces always initialize");
//!
//! show.handle_input(InputEvent::Scroll { y: 1200.0, max: 10_000.0 });
//! for _ in 0..600 {
//!     show.tick(1.0 / 60.0);
//!     show.render();
//! }
//!
//! assert_eq!(show.active_beat().map(|b| b.id), Some("paradigm-fracture"));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of preferences and snapshots
//! - `parallel`: compute particle forces on the rayon pool
//! - `gpu`: offscreen emergence shader rendering via wgpu
//!
//! ## Modules
//!
//! - [`orchestrator`]: top-level coordinator
//! - [`beats`] / [`scroll`]: narrative catalog and scroll resolution
//! - [`cards`] / [`behaviors`]: card lifecycle and choreographies
//! - [`renderer`] / [`particles`] / [`levels`]: the emergence field
//! - [`depth`]: surface/depth transitions
//! - [`observer`]: read-only snapshot adapters

#[path = "core/error.rs"]
pub mod error;

#[path = "core/params.rs"]
pub mod params;

#[path = "core/geometry.rs"]
pub mod geometry;

#[path = "core/easing.rs"]
pub mod easing;

#[path = "core/clock.rs"]
pub mod clock;

#[path = "core/cancel.rs"]
pub mod cancel;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/forces.rs"]
pub mod forces;

#[path = "core/levels.rs"]
pub mod levels;

#[path = "core/beats.rs"]
pub mod beats;

#[path = "core/scroll.rs"]
pub mod scroll;

#[path = "core/particles.rs"]
pub mod particles;

#[path = "core/level_behavior.rs"]
pub mod level_behavior;

#[path = "core/shader.rs"]
pub mod shader;

#[path = "core/surface.rs"]
pub mod surface;

#[path = "core/renderer.rs"]
pub mod renderer;

#[cfg(feature = "gpu")]
#[path = "core/gpu.rs"]
pub mod gpu;

#[path = "core/input.rs"]
pub mod input;

#[path = "core/content.rs"]
pub mod content;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/cards.rs"]
pub mod cards;

#[path = "core/behaviors.rs"]
pub mod behaviors;

#[path = "core/depth.rs"]
pub mod depth;

#[path = "core/orchestrator.rs"]
pub mod orchestrator;

pub mod observer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::beats::{CardBehaviorKind, ExitStyle, NarrativeBeat, NarrativeBeatTable};
    pub use crate::cards::{CardId, CardLifecycleManager, CardOptions};
    pub use crate::config::{ConfigSource, Preferences, StaticConfig};
    pub use crate::content::{ContentSource, StaticContent};
    pub use crate::depth::{DepthState, DepthTransitionController};
    pub use crate::error::{BehaviorError, EngineError, InitError, NavigationError};
    pub use crate::forces::{Emotion, EpoForces};
    pub use crate::geometry::{Rect, Size2, Vec2};
    pub use crate::input::{InputEvent, Key};
    pub use crate::levels::EmergenceLevelTable;
    pub use crate::orchestrator::{NarrativeEvent, OrchestratorConfig, PresentationMode, PresentationOrchestrator};
    pub use crate::params::{ParamValue, ParameterBag};
    pub use crate::renderer::{EmergenceRenderer, RenderPath, TransitionStyle};
    pub use crate::scroll::{ScrollMapper, ScrollResolution};
}
