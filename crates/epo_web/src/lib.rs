//! Browser host for the EPO presentation: a Canvas 2D emergence layer, an
//! optional WebGL shader layer and DOM cards, all driven from one
//! `requestAnimationFrame` loop.
//!
//! Card layout math and preference encoding live in [`layout`] and [`prefs`]
//! and build on every target. The DOM-facing app needs `--features web` on
//! wasm32; anywhere else the crate is just those helpers.

pub mod layout;
pub mod prefs;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::start;
