//! Surface ⇄ depth transitions.
//!
//! Entering depth runs three phases in order: a particle tunnel forms, the
//! virtual camera pushes in, and the section's three content layers fade in
//! one after another. Exiting reverses it: content fades, the camera pulls
//! back, and the tunnel dissolves. Every phase is a state advanced by
//! [`DepthTransitionController::update`]; nothing blocks.
//!
//! While a sequence is in flight a second `enter`/`exit` is a no-op.

use std::f32::consts::PI;

use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::clock::frames_in;
use crate::content::{DepthContent, DepthLayerKind};
use crate::easing::{Easing, Tween};
use crate::geometry::{Size2, Vec2, Vec3};
use crate::input::{Channel, InputBus, Key, ListenerId, Subscriber};
use crate::particles::{Kinematics, Particle, ParticleConfig, ParticleKind, ParticleSystem, Projection, SortOrder};
use crate::surface::{Canvas2d, Rgba, TextAlign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DepthState {
    #[default]
    Surface,
    EnteringDepth,
    Depth,
    ExitingDepth,
}

impl DepthState {
    pub fn label(self) -> &'static str {
        match self {
            DepthState::Surface => "surface",
            DepthState::EnteringDepth => "entering_depth",
            DepthState::Depth => "depth",
            DepthState::ExitingDepth => "exiting_depth",
        }
    }

    /// `0` at the surface, `1` once in depth.
    pub fn depth(self) -> u8 {
        match self {
            DepthState::Depth | DepthState::ExitingDepth => 1,
            DepthState::Surface | DepthState::EnteringDepth => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthConfig {
    pub tunnel_particles: usize,
    pub tunnel_length: f32,
    /// Formation progress per 60 Hz frame.
    pub formation_step: f32,
    pub spiral_speed: f32,
    pub camera_depth_z: f32,
    pub surface_fov: f32,
    pub depth_fov: f32,
    pub enter_camera_ms: f32,
    pub exit_camera_ms: f32,
    pub layer_stagger_ms: f32,
    pub layer_settle_ms: f32,
    pub content_fade_ms: f32,
    /// Dissolve progress per 60 Hz frame.
    pub dissolve_step: f32,
    pub focal: f32,
    pub unfocused_opacity: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            tunnel_particles: 200,
            tunnel_length: 500.0,
            formation_step: 0.02,
            spiral_speed: 0.05,
            camera_depth_z: 300.0,
            surface_fov: 75.0,
            depth_fov: 100.0,
            enter_camera_ms: 2000.0,
            exit_camera_ms: 1500.0,
            layer_stagger_ms: 500.0,
            layer_settle_ms: 1000.0,
            content_fade_ms: 1000.0,
            dissolve_step: 0.03,
            focal: 300.0,
            unfocused_opacity: 0.3,
        }
    }
}

impl DepthConfig {
    pub fn with_tunnel_particles(mut self, n: usize) -> Self {
        self.tunnel_particles = n;
        self
    }

    /// Scale every millisecond duration (reduced motion uses 0.5).
    pub fn with_duration_scale(mut self, k: f32) -> Self {
        let k = k.max(0.0);
        self.enter_camera_ms *= k;
        self.exit_camera_ms *= k;
        self.layer_stagger_ms *= k;
        self.layer_settle_ms *= k;
        self.content_fade_ms *= k;
        self
    }

    fn reveal_ms(&self) -> f32 {
        let layers = DepthLayerKind::all().len() as f32;
        (layers - 1.0) * self.layer_stagger_ms + self.layer_settle_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub z: f32,
    pub fov: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerView {
    pub kind: DepthLayerKind,
    pub text: &'static str,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Forming { formation: f32 },
    PushIn { z: Tween, fov: Tween },
    Reveal { elapsed_ms: f32 },
    FadeContent { fade: Tween },
    PullBack { z: Tween, fov: Tween },
    Dissolve { progress: f32 },
}

pub struct DepthTransitionController {
    config: DepthConfig,
    state: DepthState,
    phase: Phase,
    bounds: Size2,
    tunnel: ParticleSystem,
    camera: Camera,
    content: Option<DepthContent>,
    section: Option<String>,
    layers: Vec<LayerView>,
    content_opacity: f32,
    focused: Option<DepthLayerKind>,
    key_listener: Option<ListenerId>,
    token: CancelToken,
    sequences: u64,
}

impl DepthTransitionController {
    pub fn new(config: DepthConfig, bounds: Size2) -> Self {
        let particles = ParticleConfig::default()
            .with_cap(config.tunnel_particles)
            .with_bounds(bounds.width, bounds.height);
        let camera = Camera {
            z: 0.0,
            fov: config.surface_fov,
        };
        Self {
            config,
            state: DepthState::Surface,
            phase: Phase::Idle,
            bounds,
            tunnel: ParticleSystem::new(particles),
            camera,
            content: None,
            section: None,
            layers: Vec::new(),
            content_opacity: 0.0,
            focused: None,
            key_listener: None,
            token: CancelToken::new(),
            sequences: 0,
        }
    }

    pub fn state(&self) -> DepthState {
        self.state
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, DepthState::EnteringDepth | DepthState::ExitingDepth)
    }

    pub fn is_in_depth(&self) -> bool {
        self.state.depth() > 0
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn tunnel(&self) -> &ParticleSystem {
        &self.tunnel
    }

    pub fn layers(&self) -> &[LayerView] {
        &self.layers
    }

    pub fn focused_layer(&self) -> Option<DepthLayerKind> {
        self.focused
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Sequences started so far (enter and exit both count).
    pub fn sequences_started(&self) -> u64 {
        self.sequences
    }

    /// Token of the running sequence; cancelling it forces the controller
    /// back to the surface on the next update.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn is_listening(&self) -> bool {
        self.key_listener.is_some()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Size2::new(width, height);
        self.tunnel.set_bounds(width, height);
    }

    /// Start entering depth for `section`. Returns false (and does nothing)
    /// unless the controller is at the surface.
    pub fn enter_depth(&mut self, section: &str, content: DepthContent, trigger: Vec2) -> bool {
        if self.state != DepthState::Surface {
            debug!(state = self.state.label(), "enter_depth ignored");
            return false;
        }
        info!(section, "entering depth");
        self.token.renew();
        self.sequences += 1;
        self.state = DepthState::EnteringDepth;
        self.section = Some(section.to_string());
        self.content = Some(content);
        self.layers.clear();
        self.focused = None;
        self.content_opacity = 0.0;
        self.spawn_tunnel(trigger);
        self.phase = Phase::Forming { formation: 0.0 };
        true
    }

    /// Start returning to the surface. Only valid from [`DepthState::Depth`].
    pub fn exit_depth(&mut self) -> bool {
        if self.state != DepthState::Depth {
            debug!(state = self.state.label(), "exit_depth ignored");
            return false;
        }
        info!("exiting depth");
        self.token.renew();
        self.sequences += 1;
        self.state = DepthState::ExitingDepth;
        self.phase = Phase::FadeContent {
            fade: Tween::new(self.content_opacity, 0.0, self.config.content_fade_ms, Easing::EaseOut),
        };
        true
    }

    /// Enter from the surface, exit from depth; no-op mid-transition.
    pub fn toggle(&mut self, section: &str, content: DepthContent, trigger: Vec2) -> bool {
        match self.state {
            DepthState::Surface => self.enter_depth(section, content, trigger),
            DepthState::Depth => self.exit_depth(),
            DepthState::EnteringDepth | DepthState::ExitingDepth => false,
        }
    }

    /// Depth-mode keys. Returns true when the key was consumed.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        if self.state != DepthState::Depth {
            return false;
        }
        match key {
            Key::Escape => self.exit_depth(),
            Key::Digit(d) => match DepthLayerKind::from_digit(*d) {
                Some(kind) => {
                    self.focus_layer(kind);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    pub fn focus_layer(&mut self, kind: DepthLayerKind) {
        self.focused = Some(kind);
        let dim = self.config.unfocused_opacity;
        for layer in &mut self.layers {
            layer.opacity = if layer.kind == kind { 1.0 } else { dim };
        }
        debug!(layer = kind.label(), "depth layer focused");
    }

    /// Advance the running sequence. Keyboard registration follows the
    /// state: added on arrival in depth, removed on return to the surface.
    pub fn update(&mut self, dt_ms: f32, bus: &mut InputBus) {
        if self.token.is_cancelled() && self.state != DepthState::Surface {
            self.force_surface(bus);
            return;
        }
        let dt_ms = dt_ms.max(0.0);
        let frames = frames_in(dt_ms / 1000.0);
        let cfg = self.config;

        match self.phase {
            Phase::Idle => {}
            Phase::Forming { formation } => {
                let formation = (formation + cfg.formation_step * frames).min(1.0);
                self.advance_tunnel(frames, formation);
                self.phase = if formation >= 1.0 {
                    Phase::PushIn {
                        z: Tween::new(self.camera.z, cfg.camera_depth_z, cfg.enter_camera_ms, Easing::EaseOut),
                        fov: Tween::new(self.camera.fov, cfg.depth_fov, cfg.enter_camera_ms, Easing::EaseOut),
                    }
                } else {
                    Phase::Forming { formation }
                };
            }
            Phase::PushIn { mut z, mut fov } => {
                self.camera.z = z.advance(dt_ms);
                self.camera.fov = fov.advance(dt_ms);
                if z.is_done() {
                    self.layers = self
                        .content
                        .map(|c| {
                            DepthLayerKind::all()
                                .iter()
                                .map(|&kind| LayerView {
                                    kind,
                                    text: c.layer(kind),
                                    opacity: 0.0,
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    self.content_opacity = 1.0;
                    self.phase = Phase::Reveal { elapsed_ms: 0.0 };
                } else {
                    self.phase = Phase::PushIn { z, fov };
                }
            }
            Phase::Reveal { elapsed_ms } => {
                let elapsed_ms = elapsed_ms + dt_ms;
                let stagger = cfg.layer_stagger_ms;
                for (i, layer) in self.layers.iter_mut().enumerate() {
                    let start = i as f32 * stagger;
                    layer.opacity = if stagger <= 0.0 {
                        1.0
                    } else {
                        ((elapsed_ms - start) / stagger).clamp(0.0, 1.0)
                    };
                }
                if elapsed_ms >= cfg.reveal_ms() {
                    for layer in &mut self.layers {
                        layer.opacity = 1.0;
                    }
                    self.state = DepthState::Depth;
                    self.phase = Phase::Idle;
                    self.key_listener = Some(bus.register(Channel::Keyboard, Subscriber::Depth, 10));
                    info!(section = self.section.as_deref().unwrap_or(""), "depth reached");
                } else {
                    self.phase = Phase::Reveal { elapsed_ms };
                }
            }
            Phase::FadeContent { mut fade } => {
                self.content_opacity = fade.advance(dt_ms);
                if fade.is_done() {
                    self.content = None;
                    self.layers.clear();
                    self.focused = None;
                    self.content_opacity = 0.0;
                    self.phase = Phase::PullBack {
                        z: Tween::new(self.camera.z, 0.0, cfg.exit_camera_ms, Easing::OutQuad),
                        fov: Tween::new(self.camera.fov, cfg.surface_fov, cfg.exit_camera_ms, Easing::OutQuad),
                    };
                } else {
                    self.phase = Phase::FadeContent { fade };
                }
            }
            Phase::PullBack { mut z, mut fov } => {
                self.camera.z = z.advance(dt_ms);
                self.camera.fov = fov.advance(dt_ms);
                self.phase = if z.is_done() {
                    Phase::Dissolve { progress: 0.0 }
                } else {
                    Phase::PullBack { z, fov }
                };
            }
            Phase::Dissolve { progress } => {
                let progress = progress + cfg.dissolve_step * frames;
                let fade = (1.0 - cfg.dissolve_step).powf(frames);
                let accel = 1.1f32.powf(frames);
                for p in &mut self.tunnel.particles {
                    p.opacity *= fade;
                    p.vel.z *= accel;
                    p.pos.z += p.vel.z * frames;
                }
                if self.tunnel.is_empty() || progress >= 1.0 {
                    self.tunnel.clear();
                    self.state = DepthState::Surface;
                    self.phase = Phase::Idle;
                    self.section = None;
                    self.unlisten(bus);
                    info!("back at surface");
                } else {
                    self.phase = Phase::Dissolve { progress };
                }
            }
        }
    }

    /// Draw the tunnel and any visible content layers.
    pub fn render(&self, canvas: &mut dyn Canvas2d) {
        if self.state == DepthState::Surface {
            return;
        }
        let size = canvas.size();
        let center = Vec2::new(size.width * 0.5, size.height * 0.5);
        self.tunnel.render(
            canvas,
            SortOrder::DepthDescending,
            Projection::Perspective {
                focal: self.config.focal,
                center,
            },
        );

        let n = self.layers.len() as f32;
        for (i, layer) in self.layers.iter().enumerate() {
            let alpha = layer.opacity * self.content_opacity;
            if alpha <= 0.0 {
                continue;
            }
            let y = center.y + (i as f32 - (n - 1.0) * 0.5) * 80.0;
            let size_px = if self.focused == Some(layer.kind) { 28.0 } else { 22.0 };
            canvas.fill_text(layer.text, center.x, y, size_px, Rgba::WHITE.with_alpha(alpha), TextAlign::Center);
        }
    }

    /// Abort whatever runs, drop the tunnel and content, and unregister
    /// keyboard handling. Safe to call repeatedly.
    pub fn destroy(&mut self, bus: &mut InputBus) {
        self.token.cancel();
        self.force_surface(bus);
    }

    fn force_surface(&mut self, bus: &mut InputBus) {
        if self.state != DepthState::Surface {
            debug!(state = self.state.label(), "depth sequence cancelled");
        }
        self.tunnel.clear();
        self.content = None;
        self.section = None;
        self.layers.clear();
        self.focused = None;
        self.content_opacity = 0.0;
        self.camera = Camera {
            z: 0.0,
            fov: self.config.surface_fov,
        };
        self.phase = Phase::Idle;
        self.state = DepthState::Surface;
        self.unlisten(bus);
    }

    fn unlisten(&mut self, bus: &mut InputBus) {
        if let Some(id) = self.key_listener.take() {
            bus.unregister(id);
        }
    }

    fn spawn_tunnel(&mut self, trigger: Vec2) {
        self.tunnel.clear();
        let n = self.config.tunnel_particles.max(1);
        let origin = Vec2::new(trigger.x * self.bounds.width, trigger.y * self.bounds.height);
        for i in 0..n {
            let k = i as f32 / n as f32;
            let angle = k * 8.0 * PI;
            let radius = 50.0 + 100.0 * k;
            let mut p = Particle::new(
                Vec3::new(
                    origin.x + angle.cos() * radius,
                    origin.y + angle.sin() * radius,
                    k * self.config.tunnel_length,
                ),
                ParticleKind::Tunnel,
            );
            p.vel = Vec3::new(0.0, 0.0, 5.0);
            p.size = 2.0 + 3.0 * k;
            p.opacity = 1.0 - 0.5 * k;
            p.color = tunnel_color(k);
            p.kinematics = Kinematics::Spiral { angle, radius };
            if !self.tunnel.spawn(p) {
                break;
            }
        }
    }

    fn advance_tunnel(&mut self, frames: f32, formation: f32) {
        let center = Vec2::new(self.bounds.width * 0.5, self.bounds.height * 0.5);
        let n = self.tunnel.len().max(1) as f32;
        let turn = self.config.spiral_speed * frames;
        for (i, p) in self.tunnel.particles.iter_mut().enumerate() {
            p.pos.z += p.vel.z * frames;
            let d = p.pos.xy() - center;
            let radius = d.length();
            let angle = d.y.atan2(d.x) + turn;
            p.pos.x = center.x + angle.cos() * radius;
            p.pos.y = center.y + angle.sin() * radius;
            p.kinematics = Kinematics::Spiral { angle, radius };
            p.opacity = (1.0 - i as f32 / n) * formation;
        }
    }
}

/// Blue at the mouth of the tunnel, gold at the far end.
pub fn tunnel_color(k: f32) -> [f32; 3] {
    let k = k.clamp(0.0, 1.0);
    [
        (100.0 + 155.0 * k) / 255.0,
        (200.0 + 55.0 * k) / 255.0,
        (255.0 - 200.0 * k) / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSource, StaticContent};
    use crate::surface::RecordingCanvas;

    const FRAME_MS: f32 = 1000.0 / 60.0;

    fn controller() -> DepthTransitionController {
        DepthTransitionController::new(DepthConfig::default(), Size2::new(800.0, 600.0))
    }

    fn run_until(
        c: &mut DepthTransitionController,
        bus: &mut InputBus,
        state: DepthState,
        max_frames: usize,
    ) -> usize {
        for frame in 0..max_frames {
            if c.state() == state {
                return frame;
            }
            c.update(FRAME_MS, bus);
        }
        panic!("never reached {:?}, stuck in {:?}", state, c.state());
    }

    fn enter(c: &mut DepthTransitionController) -> bool {
        c.enter_depth("2.2", StaticContent.depth_content("2.2"), Vec2::CENTER)
    }

    #[test]
    fn tunnel_is_spawned_on_a_spiral() {
        let mut c = controller();
        assert!(enter(&mut c));
        let t = c.tunnel();
        assert_eq!(t.len(), 200);
        let first = t.particles[0];
        assert!((first.pos.x - 450.0).abs() < 1e-3);
        assert_eq!(first.pos.z, 0.0);
        assert_eq!(first.size, 2.0);
        assert_eq!(tunnel_color(0.0), [100.0 / 255.0, 200.0 / 255.0, 1.0]);
        assert!(t.particles[199].pos.z > 490.0);
    }

    #[test]
    fn second_enter_is_a_no_op() {
        let mut c = controller();
        let mut bus = InputBus::new();
        assert!(enter(&mut c));
        assert!(!enter(&mut c));
        assert!(!c.exit_depth());
        assert_eq!(c.sequences_started(), 1);
        assert_eq!(c.tunnel().len(), 200);

        c.update(FRAME_MS, &mut bus);
        assert!(!enter(&mut c));
        assert_eq!(c.sequences_started(), 1);
    }

    #[test]
    fn enter_runs_phases_in_order_and_registers_keys() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);

        // formation: 50 frames at .02 per frame
        for _ in 0..49 {
            c.update(FRAME_MS, &mut bus);
        }
        assert_eq!(c.camera().z, 0.0);
        assert!(!c.is_listening());

        let frames = run_until(&mut c, &mut bus, DepthState::Depth, 1000);
        assert!(frames > 100, "camera and reveal take over three seconds, got {frames} frames");
        assert!((c.camera().z - 300.0).abs() < 1e-3);
        assert!((c.camera().fov - 100.0).abs() < 1e-3);
        assert_eq!(c.layers().len(), 3);
        assert!(c.layers().iter().all(|l| l.opacity == 1.0));
        assert!(c.is_listening());
        assert_eq!(bus.listeners(Channel::Keyboard), vec![Subscriber::Depth]);
    }

    #[test]
    fn layers_fade_in_staggered() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);
        while c.layers().is_empty() {
            c.update(FRAME_MS, &mut bus);
        }
        c.update(250.0, &mut bus);
        let ops: Vec<f32> = c.layers().iter().map(|l| l.opacity).collect();
        assert!(ops[0] > 0.4 && ops[0] < 0.6);
        assert_eq!(ops[1], 0.0);
        assert_eq!(ops[2], 0.0);
        c.update(500.0, &mut bus);
        assert_eq!(c.layers()[0].opacity, 1.0);
        assert!(c.layers()[1].opacity > 0.0);
        assert_eq!(c.state(), DepthState::EnteringDepth);
    }

    #[test]
    fn escape_exits_and_unregisters() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);
        run_until(&mut c, &mut bus, DepthState::Depth, 1000);

        assert!(c.handle_key(&Key::Digit(2)));
        assert_eq!(c.focused_layer(), Some(DepthLayerKind::Conceptual));
        let ops: Vec<f32> = c.layers().iter().map(|l| l.opacity).collect();
        assert_eq!(ops, vec![0.3, 1.0, 0.3]);
        assert!(!c.handle_key(&Key::Digit(7)));

        assert!(c.handle_key(&Key::Escape));
        assert_eq!(c.state(), DepthState::ExitingDepth);
        assert!(!c.handle_key(&Key::Escape));

        run_until(&mut c, &mut bus, DepthState::Surface, 1000);
        assert!(!c.is_listening());
        assert!(bus.is_empty());
        assert!(c.tunnel().is_empty());
        assert!(c.camera().z.abs() < 1e-3);
        assert!((c.camera().fov - 75.0).abs() < 1e-3);
        assert_eq!(c.sequences_started(), 2);
    }

    #[test]
    fn dissolve_fades_and_accelerates() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);
        run_until(&mut c, &mut bus, DepthState::Depth, 1000);
        c.exit_depth();
        while !matches!(c.phase, Phase::Dissolve { .. }) {
            c.update(FRAME_MS, &mut bus);
        }
        let before = c.tunnel().particles[0];
        c.update(FRAME_MS, &mut bus);
        let after = c.tunnel().particles[0];
        assert!(after.opacity < before.opacity);
        assert!(after.vel.z > before.vel.z);
        assert!(after.pos.z > before.pos.z);
    }

    #[test]
    fn pull_back_eases_fov_with_the_camera() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);
        run_until(&mut c, &mut bus, DepthState::Depth, 1000);
        c.exit_depth();
        while !matches!(c.phase, Phase::PullBack { .. }) {
            c.update(FRAME_MS, &mut bus);
        }
        for _ in 0..20 {
            c.update(FRAME_MS, &mut bus);
        }
        let cam = c.camera();
        let z_done = 1.0 - cam.z / 300.0;
        let fov_done = (100.0 - cam.fov) / 25.0;
        assert!(z_done > 0.3 && z_done < 0.9, "mid pull-back, got {z_done}");
        assert!((z_done - fov_done).abs() < 1e-3, "z {z_done} vs fov {fov_done}");
    }

    #[test]
    fn destroy_mid_transition_cleans_up() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);
        run_until(&mut c, &mut bus, DepthState::Depth, 1000);
        c.exit_depth();
        c.update(FRAME_MS, &mut bus);

        c.destroy(&mut bus);
        assert_eq!(c.state(), DepthState::Surface);
        assert!(!c.is_transitioning());
        assert!(bus.is_empty());
        c.destroy(&mut bus);

        // a fresh sequence may start after forced cleanup
        assert!(enter(&mut c));
    }

    #[test]
    fn cancelled_token_forces_surface() {
        let mut c = controller();
        let mut bus = InputBus::new();
        enter(&mut c);
        c.token().cancel();
        c.update(FRAME_MS, &mut bus);
        assert_eq!(c.state(), DepthState::Surface);
        assert!(c.tunnel().is_empty());
    }

    #[test]
    fn toggle_and_render() {
        let mut c = controller();
        let mut bus = InputBus::new();
        let content = StaticContent.depth_content("cover");
        assert!(c.toggle("cover", content, Vec2::CENTER));
        assert!(!c.toggle("cover", content, Vec2::CENTER));
        run_until(&mut c, &mut bus, DepthState::Depth, 1000);

        let mut canvas = RecordingCanvas::new(800.0, 600.0);
        c.render(&mut canvas);
        let log = canvas.snapshot();
        assert_eq!(log.circles, 200);
        assert!(log.texts.iter().any(|t| t == "F_EPO = -ζ_i∇U_i + ζ_d∇U_d"));

        assert!(c.toggle("cover", content, Vec2::CENTER));
        assert_eq!(c.state(), DepthState::ExitingDepth);
    }

    #[test]
    fn reduced_motion_halves_durations() {
        let cfg = DepthConfig::default().with_duration_scale(0.5);
        assert_eq!(cfg.enter_camera_ms, 1000.0);
        assert_eq!(cfg.reveal_ms(), 1000.0);
    }
}
