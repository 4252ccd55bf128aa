//! Rendering seams.
//!
//! The engine never touches a browser API. It draws through [`Canvas2d`],
//! pushes uniforms through [`GpuSurface`] and mirrors cards through
//! [`CardSurface`]. The web crate implements them over Canvas 2D, WebGL and
//! the DOM; the `Recording*` types here implement them in memory for tests
//! and for the headless player.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::cards::{Card, CardId};
use crate::error::{InitError, RenderError};
use crate::geometry::{Rect, Size2, Vec2};
use crate::shader::{EmergenceUniforms, ShaderDialect, ShaderSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(c: [f32; 3], a: f32) -> Self {
        Self::new(c[0], c[1], c[2], a)
    }

    /// Colors given as 0..255 bytes.
    pub fn bytes(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// CSS `rgba(...)` string.
    pub fn css(&self) -> String {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({}, {}, {}, {:.3})",
            to_byte(self.r),
            to_byte(self.g),
            to_byte(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Immediate-mode 2D drawing in pixel coordinates.
pub trait Canvas2d {
    /// Drawable size in pixels.
    fn size(&self) -> Size2;

    fn resize(&mut self, width: f32, height: f32);

    fn begin_frame(&mut self) {}

    fn clear(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Rgba);

    fn stroke_circle(&mut self, x: f32, y: f32, radius: f32, width: f32, color: Rgba);

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size_px: f32, color: Rgba, align: TextAlign);
}

/// A fullscreen-quad shader target.
///
/// `init` runs once. A surface whose `init` failed is never used again.
pub trait GpuSurface {
    fn dialect(&self) -> ShaderDialect {
        ShaderDialect::WebGl1
    }

    fn init(&mut self, source: &ShaderSource) -> Result<(), InitError>;

    fn set_uniforms(&mut self, uniforms: &EmergenceUniforms);

    fn draw_fullscreen(&mut self) -> Result<(), RenderError>;

    fn resize(&mut self, width: f32, height: f32);

    /// Release programs and buffers. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Host-side mirror of live cards (DOM nodes in the browser).
///
/// `unmount` of an unknown id is a no-op.
pub trait CardSurface {
    fn mount(&mut self, card: &Card);

    fn sync(&mut self, card: &Card);

    fn unmount(&mut self, id: CardId);

    /// Show or hide the whole card layer without unmounting anything.
    fn set_visible(&mut self, _visible: bool) {}
}

// ═══════════════════════════════════════════════════════════════════════════
// Recording doubles
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct CanvasLog {
    pub frames: u64,
    pub clears: u64,
    pub rects: u64,
    pub circles: u64,
    pub rings: u64,
    pub lines: u64,
    pub polygons: u64,
    /// Text drawn since the last `begin_frame`.
    pub texts: Vec<String>,
}

impl CanvasLog {
    pub fn draw_calls(&self) -> u64 {
        self.rects + self.circles + self.rings + self.lines + self.polygons
    }
}

/// In-memory [`Canvas2d`]. Clones share one log.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    size: Size2,
    log: Rc<RefCell<CanvasLog>>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size2::new(width, height),
            log: Rc::new(RefCell::new(CanvasLog::default())),
        }
    }

    pub fn log(&self) -> Rc<RefCell<CanvasLog>> {
        Rc::clone(&self.log)
    }

    pub fn snapshot(&self) -> CanvasLog {
        self.log.borrow().clone()
    }
}

impl Canvas2d for RecordingCanvas {
    fn size(&self) -> Size2 {
        self.size
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.size = Size2::new(width.max(1.0), height.max(1.0));
    }

    fn begin_frame(&mut self) {
        let mut log = self.log.borrow_mut();
        log.frames += 1;
        log.texts.clear();
    }

    fn clear(&mut self) {
        self.log.borrow_mut().clears += 1;
    }

    fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _color: Rgba) {
        self.log.borrow_mut().rects += 1;
    }

    fn fill_circle(&mut self, _x: f32, _y: f32, _radius: f32, _color: Rgba) {
        self.log.borrow_mut().circles += 1;
    }

    fn stroke_circle(&mut self, _x: f32, _y: f32, _radius: f32, _width: f32, _color: Rgba) {
        self.log.borrow_mut().rings += 1;
    }

    fn line(&mut self, _from: Vec2, _to: Vec2, _width: f32, _color: Rgba) {
        self.log.borrow_mut().lines += 1;
    }

    fn fill_polygon(&mut self, _points: &[Vec2], _color: Rgba) {
        self.log.borrow_mut().polygons += 1;
    }

    fn fill_text(&mut self, text: &str, _x: f32, _y: f32, _size: f32, _color: Rgba, _align: TextAlign) {
        self.log.borrow_mut().texts.push(text.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct GpuLog {
    pub init_calls: u64,
    pub uniform_uploads: u64,
    pub draws: u64,
    pub releases: u64,
    pub last_uniforms: Option<EmergenceUniforms>,
}

impl GpuLog {
    /// Every call that reached the surface after construction.
    pub fn total_calls(&self) -> u64 {
        self.init_calls + self.uniform_uploads + self.draws
    }
}

/// In-memory [`GpuSurface`] that can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingGpu {
    log: Rc<RefCell<GpuLog>>,
    fail_init: bool,
    fail_draws_after: Option<u64>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose `init` always fails.
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Draws succeed `n` times, then report a lost context.
    pub fn losing_context_after(n: u64) -> Self {
        Self {
            fail_draws_after: Some(n),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Rc<RefCell<GpuLog>> {
        Rc::clone(&self.log)
    }
}

impl GpuSurface for RecordingGpu {
    fn init(&mut self, source: &ShaderSource) -> Result<(), InitError> {
        self.log.borrow_mut().init_calls += 1;
        if self.fail_init {
            return Err(InitError::GpuUnavailable(
                "recording surface configured to fail".to_string(),
            ));
        }
        if source.fragment.trim().is_empty() {
            return Err(InitError::ShaderCompile("empty fragment shader".to_string()));
        }
        Ok(())
    }

    fn set_uniforms(&mut self, uniforms: &EmergenceUniforms) {
        let mut log = self.log.borrow_mut();
        log.uniform_uploads += 1;
        log.last_uniforms = Some(*uniforms);
    }

    fn draw_fullscreen(&mut self) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if let Some(limit) = self.fail_draws_after {
            if log.draws >= limit {
                return Err(RenderError("context lost".to_string()));
            }
        }
        log.draws += 1;
        Ok(())
    }

    fn resize(&mut self, _width: f32, _height: f32) {}

    fn release(&mut self) {
        self.log.borrow_mut().releases += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardLog {
    pub mounts: u64,
    pub syncs: u64,
    pub unmounts: u64,
    pub live: HashMap<CardId, Rect>,
    pub opacity: HashMap<CardId, f32>,
    pub hidden: bool,
}

/// In-memory [`CardSurface`] tracking which cards are mounted.
#[derive(Debug, Clone, Default)]
pub struct RecordingCardSurface {
    log: Rc<RefCell<CardLog>>,
}

impl RecordingCardSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<CardLog>> {
        Rc::clone(&self.log)
    }

    pub fn live_count(&self) -> usize {
        self.log.borrow().live.len()
    }
}

impl CardSurface for RecordingCardSurface {
    fn mount(&mut self, card: &Card) {
        let mut log = self.log.borrow_mut();
        log.mounts += 1;
        log.live.insert(card.id, card.rect);
        log.opacity.insert(card.id, card.opacity);
    }

    fn sync(&mut self, card: &Card) {
        let mut log = self.log.borrow_mut();
        if let Some(rect) = log.live.get_mut(&card.id) {
            *rect = card.rect;
            log.syncs += 1;
            log.opacity.insert(card.id, card.opacity);
        }
    }

    fn unmount(&mut self, id: CardId) {
        let mut log = self.log.borrow_mut();
        if log.live.remove(&id).is_some() {
            log.unmounts += 1;
            log.opacity.remove(&id);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.log.borrow_mut().hidden = !visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{compose, ShaderDialect};

    #[test]
    fn css_strings_clamp_and_round() {
        assert_eq!(Rgba::new(1.0, 0.5, 0.0, 0.1).css(), "rgba(255, 128, 0, 0.100)");
        assert_eq!(Rgba::new(2.0, -1.0, 0.0, 3.0).css(), "rgba(255, 0, 0, 1.000)");
        assert_eq!(Rgba::bytes(0, 179, 255, 0.8).with_alpha(0.5).a, 0.5);
    }

    #[test]
    fn recording_canvas_counts_and_resets_text() {
        let mut c = RecordingCanvas::new(800.0, 600.0);
        let shared = c.log();
        c.begin_frame();
        c.fill_circle(1.0, 1.0, 2.0, Rgba::WHITE);
        c.fill_text("Level 1", 0.0, 0.0, 24.0, Rgba::WHITE, TextAlign::Left);
        assert_eq!(shared.borrow().texts, vec!["Level 1".to_string()]);
        c.begin_frame();
        assert!(shared.borrow().texts.is_empty());
        assert_eq!(shared.borrow().circles, 1);
        assert_eq!(shared.borrow().frames, 2);
    }

    #[test]
    fn failing_gpu_reports_unavailable() {
        let mut g = RecordingGpu::failing();
        let src = compose(ShaderDialect::WebGl1);
        assert!(matches!(g.init(&src), Err(InitError::GpuUnavailable(_))));
        assert_eq!(g.log().borrow().init_calls, 1);
    }

    #[test]
    fn lost_context_after_limit() {
        let mut g = RecordingGpu::losing_context_after(2);
        assert!(g.draw_fullscreen().is_ok());
        assert!(g.draw_fullscreen().is_ok());
        assert!(g.draw_fullscreen().is_err());
    }
}
