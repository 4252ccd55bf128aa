//! The emergence field: sixteen level particle systems, level transitions,
//! and the GPU / Canvas 2D render paths.
//!
//! The render path is chosen once. If the GPU surface fails to initialize,
//! or later fails a draw, the renderer switches to the canvas path for good
//! and never calls the GPU surface again.

use std::f32::consts::{PI, TAU};

use tracing::{debug, error, info, warn};

use crate::easing::{ease_in_out_cubic, Easing, Tween};
use crate::error::NavigationError;
use crate::forces::EpoForces;
use crate::geometry::{Vec2, Vec3};
use crate::input::Key;
use crate::level_behavior::behavior_for_level;
use crate::levels::{EmergenceLevelTable, LEVEL_COUNT};
use crate::particles::{ParticleConfig, ParticleSystem, Projection, SortOrder, DT_PER_MS};
use crate::prng::Prng;
use crate::shader::{compose, EmergenceUniforms};
use crate::surface::{Canvas2d, GpuSurface, Rgba, TextAlign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TransitionStyle {
    #[default]
    Smooth,
    Explosive,
    Collapse,
    PhaseShift,
}

impl TransitionStyle {
    pub fn all() -> &'static [TransitionStyle] {
        &[
            TransitionStyle::Smooth,
            TransitionStyle::Explosive,
            TransitionStyle::Collapse,
            TransitionStyle::PhaseShift,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            TransitionStyle::Smooth => "smooth",
            TransitionStyle::Explosive => "explosive",
            TransitionStyle::Collapse => "collapse",
            TransitionStyle::PhaseShift => "phase_shift",
        }
    }

    /// Style for a section's transition effect tag.
    pub fn from_effect(effect: &str) -> TransitionStyle {
        match effect {
            "chaos-emergence" => TransitionStyle::Explosive,
            "consciousness-awakening" => TransitionStyle::Collapse,
            "force-dynamics" => TransitionStyle::PhaseShift,
            _ => TransitionStyle::Smooth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RenderPath {
    Gpu,
    Canvas,
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub transition_secs: f32,
    pub consciousness_expansion_ms: f32,
    pub particles: ParticleConfig,
    pub seed: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            zoom_min: 0.1,
            zoom_max: 10.0,
            transition_secs: 1.0,
            consciousness_expansion_ms: 3000.0,
            particles: ParticleConfig::default(),
            seed: 0xE9E9_0001,
        }
    }
}

impl RendererConfig {
    pub fn with_particles(mut self, particles: ParticleConfig) -> Self {
        self.particles = particles;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Frames rendered per path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameStats {
    pub gpu_frames: u64,
    pub canvas_frames: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelTransition {
    pub from: usize,
    pub target: usize,
    pub style: TransitionStyle,
    /// Linear progress, `[0, 1]`.
    pub progress: f32,
}

const SHORTCUTS: [&str; 5] = [
    "↑/↓ - Change emergence level",
    "Space - Toggle consciousness",
    "C - Jump to universal consciousness",
    "R - Reset to quantum level",
    "Mouse wheel - Zoom",
];

const EXPLOSION_IMPULSE: f32 = 20.0;
const EXPLOSION_FRAMES: u32 = 60;
const COLLAPSE_IMPULSE: f32 = 5.0;

pub struct EmergenceRenderer {
    config: RendererConfig,
    canvas: Box<dyn Canvas2d>,
    gpu: Option<Box<dyn GpuSurface>>,
    path: RenderPath,
    systems: Vec<Option<ParticleSystem>>,
    current: usize,
    transition: Option<LevelTransition>,
    /// Latest request made while a transition ran; started when it completes.
    queued: Option<(usize, TransitionStyle)>,
    duration_scale: f32,
    forces: EpoForces,
    consciousness_tween: Option<Tween>,
    zoom: f32,
    mouse: Vec2,
    time: f32,
    rng: Prng,
    stats: FrameStats,
    visible: bool,
}

impl EmergenceRenderer {
    /// Build a renderer. A GPU surface that fails `init` is released and
    /// dropped; the canvas path is used from then on.
    pub fn new(
        config: RendererConfig,
        canvas: Box<dyn Canvas2d>,
        gpu: Option<Box<dyn GpuSurface>>,
    ) -> Self {
        let mut gpu = gpu;
        let mut path = RenderPath::Canvas;
        if let Some(surface) = gpu.as_mut() {
            let source = compose(surface.dialect());
            match surface.init(&source) {
                Ok(()) => {
                    info!("emergence renderer: GPU path");
                    path = RenderPath::Gpu;
                }
                Err(e) => {
                    error!("emergence renderer: GPU init failed ({e}); using Canvas 2D");
                    surface.release();
                    gpu = None;
                }
            }
        }
        let size = canvas.size();
        let mut config = config;
        config.particles = config.particles.with_bounds(size.width, size.height);
        let rng = Prng::new(config.seed);
        let mut r = Self {
            config,
            canvas,
            gpu,
            path,
            systems: (0..LEVEL_COUNT).map(|_| None).collect(),
            current: 0,
            transition: None,
            queued: None,
            duration_scale: 1.0,
            forces: EpoForces::default(),
            consciousness_tween: None,
            zoom: 1.0,
            mouse: Vec2::CENTER,
            time: 0.0,
            rng,
            stats: FrameStats::default(),
            visible: true,
        };
        r.ensure_system(0);
        r
    }

    pub fn render_path(&self) -> RenderPath {
        self.path
    }

    /// The 2D surface, shared with overlays drawn after [`Self::render`].
    pub fn canvas_mut(&mut self) -> &mut dyn Canvas2d {
        self.canvas.as_mut()
    }

    /// Hidden renderers still clear the canvas each frame but draw nothing.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn current_level_name(&self) -> &'static str {
        EmergenceLevelTable
            .get(self.current)
            .map(|l| l.name)
            .unwrap_or("")
    }

    pub fn transition(&self) -> Option<LevelTransition> {
        self.transition
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Scale level transition length (reduced motion uses 0.5). A running
    /// transition keeps its progress and finishes at the new pace.
    pub fn set_duration_scale(&mut self, k: f32) {
        if k.is_finite() {
            self.duration_scale = k.max(0.0);
        }
    }

    /// Effective level transition length in seconds.
    pub fn transition_secs(&self) -> f32 {
        (self.config.transition_secs * self.duration_scale).max(1e-3)
    }

    /// Level waiting for the running transition to finish.
    pub fn queued_target(&self) -> Option<usize> {
        self.queued.map(|(level, _)| level)
    }

    pub fn forces(&self) -> EpoForces {
        self.forces
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn grid_density(&self) -> f32 {
        8.0 + 5.0 * (self.zoom - 1.0)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Current level's particle system, if populated.
    pub fn system(&self, level: usize) -> Option<&ParticleSystem> {
        self.systems.get(level).and_then(|s| s.as_ref())
    }

    pub fn particle_count(&self) -> usize {
        self.system(self.current).map_or(0, |s| s.len())
    }

    /// Populated level systems.
    pub fn resident_levels(&self) -> Vec<usize> {
        (0..LEVEL_COUNT).filter(|&i| self.systems[i].is_some()).collect()
    }

    fn ensure_system(&mut self, level: usize) {
        if self.systems[level].is_some() {
            return;
        }
        let mut rng = self.rng.fork(level as u64 + 1);
        let mut sys = ParticleSystem::new(self.config.particles.clone());
        behavior_for_level(level).populate(&mut sys, level, &mut rng);
        debug!(level, particles = sys.len(), "populated level system");
        self.systems[level] = Some(sys);
    }

    fn check_level(level: usize) -> Result<(), NavigationError> {
        if level >= LEVEL_COUNT {
            warn!(level, "emergence level out of range");
            return Err(NavigationError::LevelOutOfRange(level));
        }
        Ok(())
    }

    /// Jump to `level`, abandoning any running transition.
    pub fn set_level(&mut self, level: usize) -> Result<(), NavigationError> {
        Self::check_level(level)?;
        self.queued = None;
        if self.transition.is_some() {
            self.finish_transition(false);
        }
        self.ensure_system(level);
        self.current = level;
        info!(level, name = self.current_level_name(), "emergence level set");
        Ok(())
    }

    /// Start a transition. A request while one is running replaces any
    /// earlier queued one and starts when the running transition completes.
    /// A request for the level already shown does nothing.
    pub fn transition_to_level(
        &mut self,
        target: usize,
        style: TransitionStyle,
    ) -> Result<(), NavigationError> {
        Self::check_level(target)?;
        if let Some(t) = self.transition {
            if target == t.target {
                self.queued = None;
            } else {
                debug!(target, running = t.target, "level transition queued behind the running one");
                self.queued = Some((target, style));
            }
            return Ok(());
        }
        if target == self.current {
            return Ok(());
        }
        self.ensure_system(target);
        self.ensure_system(self.current);
        let center = self.center();
        let rng = &mut self.rng;
        if let Some(sys) = self.systems[self.current].as_mut() {
            start_effect(sys, style, center, rng);
        }
        self.transition = Some(LevelTransition {
            from: self.current,
            target,
            style,
            progress: 0.0,
        });
        info!(
            from = self.current,
            target,
            style = style.label(),
            "emergence transition started"
        );
        Ok(())
    }

    fn center(&self) -> Vec2 {
        let s = self.canvas.size();
        Vec2::new(s.width * 0.5, s.height * 0.5)
    }

    /// Advance one frame of `dt_ms` milliseconds.
    pub fn update(&mut self, dt_ms: f32) {
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

        if let Some(tween) = self.consciousness_tween.as_mut() {
            self.forces.consciousness = tween.advance(dt_ms).clamp(0.0, 1.0);
            if tween.is_done() {
                self.consciousness_tween = None;
            }
        }

        if let Some(mut t) = self.transition {
            let secs = self.transition_secs();
            t.progress = (t.progress + dt_ms / 1000.0 / secs).min(1.0);
            self.transition = Some(t);
            self.blend(t);
            if t.progress >= 1.0 {
                self.finish_transition(true);
            }
        }

        let level = self.current;
        if let Some(sys) = self.systems[level].as_mut() {
            sys.step(dt_ms * DT_PER_MS, behavior_for_level(level), &mut self.rng);
        }
    }

    fn blend(&mut self, t: LevelTransition) {
        let ease = ease_in_out_cubic(t.progress);
        let (cur, tgt) = pair_mut(&mut self.systems, t.from, t.target);
        let (Some(cur), Some(tgt)) = (cur, tgt) else {
            return;
        };
        for (i, p) in cur.particles.iter_mut().enumerate() {
            if t.style == TransitionStyle::Smooth {
                if let Some(target) = tgt.particles.get(i) {
                    p.pos = p.pos.lerp(target.pos, ease * 0.1);
                    p.size += (target.size - p.size) * ease * 0.05;
                }
            }
            if let Some((orig, offset)) = p.phase_shift {
                p.opacity = orig * (0.5 + 0.5 * (offset + t.progress * 4.0 * PI).sin());
            }
            if p.explosion_frames > 0 {
                p.explosion_frames -= 1;
                p.vel = p.vel * 0.95;
            }
        }
    }

    fn finish_transition(&mut self, completed: bool) {
        let Some(t) = self.transition.take() else {
            return;
        };
        if let Some(sys) = self.systems[t.from].as_mut() {
            for p in &mut sys.particles {
                if let Some((orig, _)) = p.phase_shift.take() {
                    p.opacity = orig;
                }
                p.explosion_frames = 0;
            }
        }
        if completed {
            if t.style == TransitionStyle::Explosive {
                if let Some(sys) = self.systems[t.target].as_mut() {
                    let mut rng = self.rng.fork(0xE7 + t.target as u64);
                    behavior_for_level(t.target).populate(sys, t.target, &mut rng);
                }
            }
            self.current = t.target;
            info!(level = t.target, name = self.current_level_name(), "emergence transition complete");
            if let Some((next, style)) = self.queued.take() {
                if let Err(e) = self.transition_to_level(next, style) {
                    warn!("queued emergence transition abandoned: {e}");
                }
            }
        }
    }

    pub fn set_epo_parameters(&mut self, forces: EpoForces) {
        self.forces = EpoForces::new(
            forces.integration,
            forces.dispersion,
            forces.information,
            forces.consciousness,
        );
        self.consciousness_tween = None;
    }

    /// Ease consciousness from 0 to `target` over `duration_ms`.
    pub fn consciousness_expansion(&mut self, target: f32, duration_ms: f32) {
        let target = target.clamp(0.0, 1.0);
        self.consciousness_tween = Some(Tween::new(0.0, target, duration_ms, Easing::EaseInOut));
        self.forces.consciousness = 0.0;
    }

    pub fn toggle_consciousness(&mut self) {
        self.consciousness_tween = None;
        self.forces.consciousness = if self.forces.consciousness > 0.5 { 0.0 } else { 1.0 };
        info!(consciousness = self.forces.consciousness, "consciousness field toggled");
    }

    /// Wheel zoom: scrolling down zooms by 1.1, up by 0.9.
    pub fn handle_wheel(&mut self, delta_y: f32) {
        let k = if delta_y > 0.0 { 1.1 } else { 0.9 };
        self.set_zoom(self.zoom * k);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.config.zoom_min, self.config.zoom_max);
        }
    }

    /// Pointer in viewport pixels; stored normalized with y up.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        let s = self.canvas.size();
        self.mouse = Vec2::new(x / s.width.max(1.0), 1.0 - y / s.height.max(1.0)).clamp(0.0, 1.0);
    }

    pub fn pointer(&self) -> Vec2 {
        self.mouse
    }

    pub fn reset_to_quantum(&mut self) {
        info!("resetting to quantum level");
        if let Err(e) = self.transition_to_level(0, TransitionStyle::Explosive) {
            warn!("reset failed: {e}");
        }
        self.consciousness_tween = None;
        self.forces.consciousness = 0.0;
        self.zoom = 1.0;
    }

    /// Emergence shortcuts. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        let table = EmergenceLevelTable;
        let result = match key {
            Key::ArrowUp => self.transition_to_level(table.next(self.current), TransitionStyle::Smooth),
            Key::ArrowDown => {
                self.transition_to_level(table.previous(self.current), TransitionStyle::Smooth)
            }
            Key::Space => {
                self.toggle_consciousness();
                Ok(())
            }
            k if k.is_char('r') => {
                self.reset_to_quantum();
                Ok(())
            }
            k if k.is_char('c') => self.transition_to_level(table.last_index(), TransitionStyle::Smooth),
            _ => return false,
        };
        if let Err(e) = result {
            warn!("emergence key ignored: {e}");
        }
        true
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.canvas.resize(width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(width, height);
        }
        self.config.particles = self.config.particles.clone().with_bounds(width, height);
        for sys in self.systems.iter_mut().flatten() {
            sys.set_bounds(width, height);
        }
    }

    pub fn uniforms(&self) -> EmergenceUniforms {
        let s = self.canvas.size();
        let level = EmergenceLevelTable.get(self.current);
        let progress = self.transition.map_or(0.0, |t| t.progress);
        EmergenceUniforms {
            resolution: [s.width, s.height],
            mouse: [self.mouse.x, self.mouse.y],
            time: self.time,
            morph_factor: 0.5,
            dimension: 4.0,
            glitch_intensity: 0.0,
            rotation_speed: 1.0,
            grid_density: self.grid_density(),
            emergence_level: self.current as f32 + progress,
            zoom_factor: self.zoom,
            level_color: level.map_or([1.0, 1.0, 1.0], |l| l.color),
            epo_integration: self.forces.integration,
            epo_dispersion: self.forces.dispersion,
            information_density: self.forces.information,
            consciousness: self.forces.consciousness,
            ..EmergenceUniforms::default()
        }
    }

    /// Draw one frame on the selected path.
    pub fn render(&mut self) {
        self.canvas.begin_frame();
        if !self.visible {
            self.canvas.clear();
            return;
        }
        if self.path == RenderPath::Gpu {
            match self.render_gpu() {
                Ok(()) => {
                    self.stats.gpu_frames += 1;
                    self.draw_overlay(true);
                    return;
                }
                Err(e) => {
                    error!("GPU draw failed ({e}); switching to Canvas 2D for the session");
                    if let Some(mut gpu) = self.gpu.take() {
                        gpu.release();
                    }
                    self.path = RenderPath::Canvas;
                }
            }
        }
        self.render_canvas();
        self.stats.canvas_frames += 1;
    }

    fn render_gpu(&mut self) -> Result<(), crate::error::RenderError> {
        self.time += 1.0 / 60.0;
        let uniforms = self.uniforms();
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(crate::error::RenderError("GPU surface missing".to_string()));
        };
        gpu.set_uniforms(&uniforms);
        gpu.draw_fullscreen()
    }

    fn render_canvas(&mut self) {
        let size = self.canvas.size();
        self.canvas
            .fill_rect(0.0, 0.0, size.width, size.height, Rgba::new(0.0, 0.0, 0.0, 0.1));
        if let Some(sys) = self.systems[self.current].as_ref() {
            sys.render(self.canvas.as_mut(), SortOrder::None, Projection::Flat);
        }
        self.draw_overlay(false);
        if let Some(t) = self.transition {
            let color = EmergenceLevelTable
                .get(t.target)
                .map_or([1.0, 1.0, 1.0], |l| l.color);
            let alpha = 0.3 * (PI * t.progress).sin();
            self.canvas
                .fill_rect(0.0, 0.0, size.width, size.height, Rgba::rgb(color, alpha));
        }
    }

    fn draw_overlay(&mut self, with_shortcuts: bool) {
        let size = self.canvas.size();
        let Some(level) = EmergenceLevelTable.get(self.current) else {
            return;
        };
        let c = self.canvas.as_mut();

        c.fill_text(
            &format!("Level {}: {}", self.current + 1, level.name),
            30.0,
            50.0,
            24.0,
            Rgba::WHITE.with_alpha(0.9),
            TextAlign::Left,
        );
        c.fill_rect(30.0, 70.0, 300.0, 10.0, Rgba::WHITE.with_alpha(0.2));
        let filled = (self.current + 1) as f32 / LEVEL_COUNT as f32;
        c.fill_rect(30.0, 70.0, 300.0 * filled, 10.0, Rgba::rgb(level.color, 1.0));

        let (x, y) = (30.0, size.height - 150.0);
        c.fill_text("EPO Forces:", x, y, 16.0, Rgba::WHITE.with_alpha(0.8), TextAlign::Left);
        let bars = [
            ("Integration", self.forces.integration, Rgba::bytes(0, 179, 255, 0.8)),
            ("Dispersion", self.forces.dispersion, Rgba::bytes(255, 77, 26, 0.8)),
            ("Information", self.forces.information, Rgba::bytes(204, 255, 204, 0.8)),
            ("Consciousness", self.forces.consciousness, Rgba::bytes(255, 229, 255, 0.8)),
        ];
        for (k, (label, value, color)) in bars.into_iter().enumerate() {
            let row = 25.0 * (k as f32 + 1.0);
            c.fill_text(
                &format!("{label}: {:.0}%", value * 100.0),
                x,
                y + row,
                16.0,
                color,
                TextAlign::Left,
            );
            c.fill_rect(x + 120.0, y + row - 15.0, value * 100.0, 10.0, color);
        }

        if with_shortcuts {
            let n = SHORTCUTS.len();
            for (k, line) in SHORTCUTS.iter().enumerate() {
                let ly = size.height - 20.0 - (n - k - 1) as f32 * 20.0;
                c.fill_text(line, size.width - 20.0, ly, 14.0, Rgba::WHITE.with_alpha(0.7), TextAlign::Right);
            }
        }
    }

    /// Release the GPU surface. Safe to call more than once.
    pub fn destroy(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            gpu.release();
        }
        self.path = RenderPath::Canvas;
        self.transition = None;
        self.queued = None;
        for s in self.systems.iter_mut() {
            *s = None;
        }
    }
}

fn start_effect(sys: &mut ParticleSystem, style: TransitionStyle, center: Vec2, rng: &mut Prng) {
    match style {
        TransitionStyle::Smooth => {}
        TransitionStyle::Explosive => {
            for p in &mut sys.particles {
                let a = rng.gen_range_f32(0.0, TAU);
                p.vel += Vec3::new(a.cos(), a.sin(), 0.0) * EXPLOSION_IMPULSE;
                p.explosion_frames = EXPLOSION_FRAMES;
            }
        }
        TransitionStyle::Collapse => {
            for p in &mut sys.particles {
                let d = center - p.pos.xy();
                let dist = d.length();
                if dist > 0.0 {
                    let dir = d * (COLLAPSE_IMPULSE / dist);
                    p.vel += Vec3::new(dir.x, dir.y, 0.0);
                }
            }
        }
        TransitionStyle::PhaseShift => {
            for p in &mut sys.particles {
                p.phase_shift = Some((p.opacity, rng.angle()));
            }
        }
    }
}

/// Two distinct mutable slots of `v`.
fn pair_mut<T>(v: &mut [Option<T>], a: usize, b: usize) -> (Option<&mut T>, Option<&mut T>) {
    if a == b || a >= v.len() || b >= v.len() {
        return (None, None);
    }
    if a < b {
        let (l, r) = v.split_at_mut(b);
        (l[a].as_mut(), r[0].as_mut())
    } else {
        let (l, r) = v.split_at_mut(a);
        (r[0].as_mut(), l[b].as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingCanvas, RecordingGpu};

    fn small() -> RendererConfig {
        RendererConfig::default().with_particles(ParticleConfig::default().with_cap(300))
    }

    fn canvas_only() -> (EmergenceRenderer, RecordingCanvas) {
        let canvas = RecordingCanvas::new(800.0, 600.0);
        let r = EmergenceRenderer::new(small(), Box::new(canvas.clone()), None);
        (r, canvas)
    }

    #[test]
    fn failed_gpu_init_is_permanent() {
        let gpu = RecordingGpu::failing();
        let log = gpu.log();
        let canvas = RecordingCanvas::new(800.0, 600.0);
        let mut r = EmergenceRenderer::new(small(), Box::new(canvas), Some(Box::new(gpu)));
        assert_eq!(r.render_path(), RenderPath::Canvas);
        for _ in 0..100 {
            r.update(16.0);
            r.render();
        }
        assert_eq!(r.frame_stats().canvas_frames, 100);
        assert_eq!(r.frame_stats().gpu_frames, 0);
        let log = log.borrow();
        assert_eq!(log.init_calls, 1);
        assert_eq!(log.total_calls(), 1);
    }

    #[test]
    fn lost_context_switches_for_good() {
        let gpu = RecordingGpu::losing_context_after(3);
        let log = gpu.log();
        let canvas = RecordingCanvas::new(800.0, 600.0);
        let mut r = EmergenceRenderer::new(small(), Box::new(canvas), Some(Box::new(gpu)));
        assert_eq!(r.render_path(), RenderPath::Gpu);
        for _ in 0..10 {
            r.render();
        }
        assert_eq!(r.render_path(), RenderPath::Canvas);
        assert_eq!(r.frame_stats().gpu_frames, 3);
        assert_eq!(r.frame_stats().canvas_frames, 7);
        assert_eq!(log.borrow().draws, 3);
        assert_eq!(log.borrow().releases, 1);
    }

    #[test]
    fn gpu_path_pushes_level_uniforms() {
        let gpu = RecordingGpu::new();
        let log = gpu.log();
        let canvas = RecordingCanvas::new(800.0, 600.0);
        let mut r = EmergenceRenderer::new(small(), Box::new(canvas), Some(Box::new(gpu)));
        r.set_level(5).ok();
        r.handle_wheel(-1.0);
        r.render();
        let u = log.borrow().last_uniforms.unwrap_or_default();
        assert_eq!(u.emergence_level, 5.0);
        assert_eq!(u.resolution, [800.0, 600.0]);
        assert!((u.zoom_factor - 0.9).abs() < 1e-6);
        assert!((u.grid_density - 7.5).abs() < 1e-5);
        assert!((u.time - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(u.dimension, 4.0);
    }

    #[test]
    fn out_of_range_levels_are_rejected() {
        let (mut r, _) = canvas_only();
        assert_eq!(r.set_level(16), Err(NavigationError::LevelOutOfRange(16)));
        assert_eq!(
            r.transition_to_level(40, TransitionStyle::Smooth),
            Err(NavigationError::LevelOutOfRange(40))
        );
        assert_eq!(r.current_level(), 0);
    }

    #[test]
    fn transition_completes_after_one_second() {
        let (mut r, _) = canvas_only();
        r.transition_to_level(3, TransitionStyle::Smooth).ok();
        assert!(r.is_transitioning());
        assert_eq!(r.resident_levels(), vec![0, 3]);
        for _ in 0..59 {
            r.update(16.0);
        }
        assert!(r.is_transitioning());
        for _ in 0..5 {
            r.update(16.0);
        }
        assert!(!r.is_transitioning());
        assert_eq!(r.current_level(), 3);
    }

    #[test]
    fn requests_during_a_transition_run_next_latest_wins() {
        let (mut r, _) = canvas_only();
        r.transition_to_level(3, TransitionStyle::Smooth).ok();
        r.transition_to_level(9, TransitionStyle::Smooth).ok();
        r.transition_to_level(14, TransitionStyle::Collapse).ok();
        assert_eq!(r.queued_target(), Some(14));
        assert_eq!(r.transition().map(|t| t.target), Some(3));

        for _ in 0..64 {
            r.update(16.0);
        }
        assert_eq!(r.current_level(), 3);
        assert_eq!(r.queued_target(), None);
        assert_eq!(r.transition().map(|t| (t.target, t.style)), Some((14, TransitionStyle::Collapse)));

        for _ in 0..64 {
            r.update(16.0);
        }
        assert!(!r.is_transitioning());
        assert_eq!(r.current_level(), 14);
    }

    #[test]
    fn duration_scale_shortens_transitions() {
        let (mut r, _) = canvas_only();
        r.set_duration_scale(0.5);
        assert!((r.transition_secs() - 0.5).abs() < 1e-6);
        r.transition_to_level(4, TransitionStyle::Smooth).ok();
        for _ in 0..33 {
            r.update(16.0);
        }
        assert!(!r.is_transitioning());
        assert_eq!(r.current_level(), 4);
        r.set_duration_scale(f32::NAN);
        assert!((r.transition_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn asking_for_the_running_target_clears_the_queue() {
        let (mut r, _) = canvas_only();
        r.transition_to_level(3, TransitionStyle::Smooth).ok();
        r.transition_to_level(9, TransitionStyle::Smooth).ok();
        r.transition_to_level(3, TransitionStyle::Smooth).ok();
        assert_eq!(r.queued_target(), None);
        r.set_level(5).ok();
        r.transition_to_level(6, TransitionStyle::Smooth).ok();
        r.transition_to_level(7, TransitionStyle::Smooth).ok();
        r.set_level(2).ok();
        assert_eq!(r.queued_target(), None);
        assert!(!r.is_transitioning());
        assert_eq!(r.current_level(), 2);
    }

    #[test]
    fn phase_shift_restores_opacity() {
        let (mut r, _) = canvas_only();
        r.transition_to_level(1, TransitionStyle::PhaseShift).ok();
        for _ in 0..20 {
            r.update(16.0);
        }
        let dimmed = r
            .system(0)
            .map_or(false, |s| s.particles.iter().any(|p| p.opacity < 1.0));
        assert!(dimmed);
        for _ in 0..60 {
            r.update(16.0);
        }
        assert!(r
            .system(0)
            .is_some_and(|s| s.particles.iter().all(|p| p.opacity == 1.0 && p.phase_shift.is_none())));
    }

    #[test]
    fn explosive_marks_particles() {
        let (mut r, _) = canvas_only();
        r.transition_to_level(2, TransitionStyle::Explosive).ok();
        assert!(r
            .system(0)
            .is_some_and(|s| s.particles.iter().all(|p| p.explosion_frames == EXPLOSION_FRAMES)));
    }

    #[test]
    fn keys_drive_levels_and_consciousness() {
        let (mut r, _) = canvas_only();
        assert!(r.handle_key(&Key::ArrowUp));
        assert_eq!(r.transition().map(|t| t.target), Some(1));
        r.set_level(4).ok();
        assert!(r.handle_key(&Key::Space));
        assert_eq!(r.forces().consciousness, 1.0);
        r.handle_key(&Key::Space);
        assert_eq!(r.forces().consciousness, 0.0);
        r.set_zoom(3.0);
        assert!(r.handle_key(&Key::Char('R')));
        assert_eq!(r.zoom(), 1.0);
        assert_eq!(r.transition().map(|t| (t.target, t.style)), Some((0, TransitionStyle::Explosive)));
        assert!(!r.handle_key(&Key::Char('x')));
    }

    #[test]
    fn zoom_is_clamped() {
        let (mut r, _) = canvas_only();
        for _ in 0..100 {
            r.handle_wheel(1.0);
        }
        assert_eq!(r.zoom(), 10.0);
        for _ in 0..200 {
            r.handle_wheel(-1.0);
        }
        assert!((r.zoom() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn epo_parameters_clamp_and_expansion_eases() {
        let (mut r, _) = canvas_only();
        r.set_epo_parameters(EpoForces {
            integration: 2.0,
            dispersion: -1.0,
            information: 0.4,
            consciousness: 0.2,
        });
        assert_eq!(r.forces().integration, 1.0);
        assert_eq!(r.forces().dispersion, 0.0);
        r.consciousness_expansion(0.8, 3000.0);
        r.update(1500.0);
        assert!((r.forces().consciousness - 0.4).abs() < 1e-4);
        r.update(1500.0);
        assert!((r.forces().consciousness - 0.8).abs() < 1e-4);
    }

    #[test]
    fn canvas_frame_draws_hud() {
        let (mut r, canvas) = canvas_only();
        r.set_level(2).ok();
        r.render();
        let log = canvas.snapshot();
        assert!(log.texts.iter().any(|t| t == "Level 3: Atoms"));
        assert!(log.texts.iter().any(|t| t.starts_with("Integration: 50%")));
        assert!(log.circles > 0);
        assert_eq!(r.frame_stats().canvas_frames, 1);
    }

    #[test]
    fn pointer_is_normalized_with_y_up() {
        let (mut r, _) = canvas_only();
        r.set_pointer(200.0, 150.0);
        assert!((r.pointer().x - 0.25).abs() < 1e-6);
        assert!((r.pointer().y - 0.75).abs() < 1e-6);
    }
}
