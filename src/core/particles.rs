//! Bounded particle systems.
//!
//! One [`ParticleSystem`] backs each emergence level, and a transient one backs
//! the depth tunnel. A step runs five phases in order:
//!
//! 1. level kinematics (via [`LevelBehavior`])
//! 2. EPO forces from a position snapshot
//! 3. damping and integration
//! 4. boundary reflection
//! 5. bond springs
//!
//! The pairwise force pass is the only quadratic loop. Particles are binned
//! into a uniform grid with cell size equal to the interaction radius, so only
//! the 3×3 neighbourhood of a cell is visited.

use crate::geometry::{Size2, Vec2, Vec3};
use crate::level_behavior::{LevelBehavior, LevelContext};
use crate::prng::Prng;
use crate::surface::{Canvas2d, Rgba};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Hard per-system particle cap.
pub const PARTICLE_CAP: usize = 2000;

/// Simulation step units per millisecond of frame time.
pub const DT_PER_MS: f32 = 0.016;

#[derive(Debug, Clone)]
pub struct ParticleConfig {
    pub cap: usize,
    pub interaction_radius: f32,
    pub inner_radius: f32,
    pub damping: f32,
    pub margin: f32,
    pub bounds: Size2,
    pub seed: u64,
    /// Use the uniform grid for the force pass. Brute force otherwise.
    pub binning: bool,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            cap: PARTICLE_CAP,
            interaction_radius: 50.0,
            inner_radius: 10.0,
            damping: 0.95,
            margin: 20.0,
            bounds: Size2::new(1280.0, 720.0),
            seed: 0x5EED_E90,
            binning: true,
        }
    }
}

impl ParticleConfig {
    /// Caps above [`PARTICLE_CAP`] are lowered to it.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.min(PARTICLE_CAP);
        self
    }

    pub fn with_bounds(mut self, width: f32, height: f32) -> Self {
        self.bounds = Size2::new(width.max(1.0), height.max(1.0));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_binning(mut self, binning: bool) -> Self {
        self.binning = binning;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Quantum,
    Electron,
    Bonded,
    Membrane,
    Organelle,
    Organic,
    Star,
    Planet,
    Neuron,
    Tunnel,
}

/// Level-specific motion state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kinematics {
    Free,
    Wave {
        amplitude: f32,
        phase: f32,
    },
    Orbital {
        radius: f32,
        angle: f32,
        speed: f32,
    },
    Anchored {
        anchor: Vec2,
        spring: f32,
        wander: bool,
    },
    Circular {
        radius: f32,
        angle: f32,
        speed: f32,
    },
    Neural {
        phase: f32,
        activity: f32,
    },
    Spiral {
        angle: f32,
        radius: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec3,
    pub vel: Vec3,
    pub size: f32,
    pub opacity: f32,
    pub color: [f32; 3],
    pub kind: ParticleKind,
    pub mass: f32,
    pub energy: f32,
    pub information: f32,
    pub resonance: f32,
    pub age: f32,
    pub kinematics: Kinematics,
    /// Frames left of post-explosion damping.
    pub explosion_frames: u32,
    /// `(original opacity, phase offset)` while a phase-shift transition runs.
    pub phase_shift: Option<(f32, f32)>,
}

impl Particle {
    pub fn new(pos: Vec3, kind: ParticleKind) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            size: 1.0,
            opacity: 1.0,
            color: [1.0, 1.0, 1.0],
            kind,
            mass: 1.0,
            energy: 0.0,
            information: 0.0,
            resonance: 0.0,
            age: 0.0,
            kinematics: Kinematics::Free,
            explosion_frames: 0,
            phase_shift: None,
        }
    }

    /// Neural activity, 0 for non-neural particles.
    pub fn activity(&self) -> f32 {
        match self.kinematics {
            Kinematics::Neural { activity, .. } => activity,
            _ => 0.0,
        }
    }
}

/// Spring between two particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub strength: f32,
    pub ideal: f32,
}

/// Neural connection with decaying activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub strength: f32,
    pub activity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemStats {
    pub avg_energy: f32,
    pub avg_information: f32,
    pub centroid: Vec2,
    pub coherence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    /// Far particles first (tunnel view).
    DepthDescending,
}

/// How particle positions map to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Projection {
    #[default]
    Flat,
    /// `scale = focal / (focal + z)`, around `center`.
    Perspective { focal: f32, center: Vec2 },
}

impl Projection {
    fn apply(self, p: Vec3) -> Option<(Vec2, f32)> {
        match self {
            Projection::Flat => Some((p.xy(), 1.0)),
            Projection::Perspective { focal, center } => {
                let denom = focal + p.z;
                if denom <= 0.0 {
                    return None;
                }
                let s = focal / denom;
                Some((center + (p.xy() - center) * s, s))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    pub bonds: Vec<Bond>,
    pub links: Vec<Link>,
    pub integration_force: f32,
    pub dispersion_force: f32,
    pub color: [f32; 3],
    config: ParticleConfig,
    stats: SystemStats,
    grid: SpatialGrid,
}

impl ParticleSystem {
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            particles: Vec::new(),
            bonds: Vec::new(),
            links: Vec::new(),
            integration_force: 0.1,
            dispersion_force: 0.05,
            color: [1.0, 1.0, 1.0],
            config,
            stats: SystemStats::default(),
            grid: SpatialGrid::default(),
        }
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn set_binning(&mut self, binning: bool) {
        self.config.binning = binning;
    }

    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.config.bounds = Size2::new(width.max(1.0), height.max(1.0));
    }

    pub fn bounds(&self) -> Size2 {
        self.config.bounds
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.config.bounds.width * 0.5, self.config.bounds.height * 0.5)
    }

    pub fn cap(&self) -> usize {
        self.config.cap
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn stats(&self) -> SystemStats {
        self.stats
    }

    /// Add a particle. Returns false (and drops it) at the cap.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.particles.len() >= self.config.cap {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Remove every particle, bond and link.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.bonds.clear();
        self.links.clear();
        self.stats = SystemStats::default();
    }

    /// Drop particles matching `pred`, remapping bonds and links.
    pub fn retain(&mut self, mut keep: impl FnMut(&Particle) -> bool) {
        let mut remap = vec![usize::MAX; self.particles.len()];
        let mut next = 0;
        for (i, p) in self.particles.iter().enumerate() {
            if keep(p) {
                remap[i] = next;
                next += 1;
            }
        }
        if next == self.particles.len() {
            return;
        }
        let mut i = 0;
        self.particles.retain(|_| {
            let kept = remap[i] != usize::MAX;
            i += 1;
            kept
        });
        self.bonds.retain_mut(|b| {
            let (a, c) = (remap[b.a], remap[b.b]);
            b.a = a;
            b.b = c;
            a != usize::MAX && c != usize::MAX
        });
        self.links.retain_mut(|l| {
            let (a, c) = (remap[l.a], remap[l.b]);
            l.a = a;
            l.b = c;
            a != usize::MAX && c != usize::MAX
        });
    }

    /// Advance one step. `dt` is in simulation units ([`DT_PER_MS`] per ms).
    pub fn step(&mut self, dt: f32, behavior: &dyn LevelBehavior, rng: &mut Prng) {
        if self.particles.is_empty() {
            return;
        }
        let ctx = LevelContext {
            dt,
            center: self.center(),
            bounds: self.config.bounds,
        };

        for p in &mut self.particles {
            p.age += dt;
            behavior.update(p, &ctx, rng);
        }
        behavior.update_system(self, &ctx, rng);

        let acc = self.epo_accelerations();
        let damping = self.config.damping;
        for (p, a) in self.particles.iter_mut().zip(acc) {
            p.vel.x += a.x * dt;
            p.vel.y += a.y * dt;
            p.vel = p.vel * damping;
            p.pos += p.vel * dt;
        }

        for p in &mut self.particles {
            reflect(p, self.config.margin, self.config.bounds);
        }

        self.apply_bonds(dt);
        self.update_stats();
    }

    /// Per-particle EPO acceleration from the current positions.
    pub fn epo_accelerations(&mut self) -> Vec<Vec2> {
        if self.config.binning {
            self.grid.rebuild(&self.particles, self.config.interaction_radius, self.config.bounds);
        }
        let grid = if self.config.binning {
            Some(&self.grid)
        } else {
            None
        };
        let params = ForceParams {
            radius: self.config.interaction_radius,
            inner: self.config.inner_radius,
            integration: self.integration_force,
            dispersion: self.dispersion_force,
        };
        let particles = &self.particles;

        #[cfg(feature = "parallel")]
        {
            (0..particles.len())
                .into_par_iter()
                .map(|i| accel_for(i, particles, grid, params))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (0..particles.len())
                .map(|i| accel_for(i, particles, grid, params))
                .collect()
        }
    }

    fn apply_bonds(&mut self, dt: f32) {
        for bond in &self.bonds {
            let (Some(pa), Some(pb)) = (self.particles.get(bond.a), self.particles.get(bond.b))
            else {
                continue;
            };
            let d = pb.pos.xy() - pa.pos.xy();
            let dist = d.length();
            if dist <= 0.0 {
                continue;
            }
            let force = bond.strength * (dist - bond.ideal);
            let push = d * (force * dt * 0.1 / dist);
            self.particles[bond.a].vel.x += push.x;
            self.particles[bond.a].vel.y += push.y;
            self.particles[bond.b].vel.x -= push.x;
            self.particles[bond.b].vel.y -= push.y;
        }
    }

    fn update_stats(&mut self) {
        let n = self.particles.len();
        if n == 0 {
            self.stats = SystemStats::default();
            return;
        }
        let (mut e, mut info, mut cx, mut cy) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        for p in &self.particles {
            e += p.energy;
            info += p.information;
            cx += p.pos.x;
            cy += p.pos.y;
        }
        let inv = 1.0 / n as f32;
        let avg_information = info * inv;
        self.stats = SystemStats {
            avg_energy: e * inv,
            avg_information,
            centroid: Vec2::new(cx * inv, cy * inv),
            coherence: (avg_information / 10.0).min(1.0),
        };
    }

    /// Draw links, bonds and particles.
    pub fn render(&self, canvas: &mut dyn Canvas2d, order: SortOrder, projection: Projection) {
        for bond in &self.bonds {
            if let (Some(a), Some(b)) = (self.particles.get(bond.a), self.particles.get(bond.b)) {
                canvas.line(
                    a.pos.xy(),
                    b.pos.xy(),
                    bond.strength * 2.0,
                    Rgba::WHITE.with_alpha(bond.strength * 0.3),
                );
            }
        }
        for link in self.links.iter().filter(|l| l.activity > 0.1) {
            if let (Some(a), Some(b)) = (self.particles.get(link.a), self.particles.get(link.b)) {
                canvas.line(
                    a.pos.xy(),
                    b.pos.xy(),
                    link.activity * 3.0,
                    Rgba::bytes(255, 200, 100, link.activity * 0.5),
                );
            }
        }

        let mut indices: Vec<usize> = (0..self.particles.len()).collect();
        if order == SortOrder::DepthDescending {
            indices.sort_by(|&a, &b| {
                self.particles[b]
                    .pos
                    .z
                    .total_cmp(&self.particles[a].pos.z)
            });
        }
        for i in indices {
            let p = &self.particles[i];
            let Some((at, scale)) = projection.apply(p.pos) else {
                continue;
            };
            draw_particle(canvas, p, at, p.size * scale);
        }
    }
}

fn draw_particle(canvas: &mut dyn Canvas2d, p: &Particle, at: Vec2, radius: f32) {
    if p.opacity <= 0.0 || radius <= 0.0 {
        return;
    }
    if p.energy > 50.0 {
        canvas.fill_circle(at.x, at.y, radius * 3.0, Rgba::WHITE.with_alpha(p.opacity * 0.2));
    }
    canvas.fill_circle(at.x, at.y, radius, Rgba::rgb(p.color, p.opacity));
    let activity = p.activity();
    if activity > 0.5 {
        canvas.stroke_circle(at.x, at.y, radius + 5.0, 2.0, Rgba::new(1.0, 1.0, 0.0, activity));
    }
    if p.kind == ParticleKind::Star {
        canvas.fill_polygon(&star_points(at, radius * 2.0, radius, 8), Rgba::new(1.0, 1.0, 0.0, p.opacity));
    }
}

/// Alternating outer/inner vertices of an `spikes`-pointed star.
pub fn star_points(center: Vec2, outer: f32, inner: f32, spikes: usize) -> Vec<Vec2> {
    (0..spikes * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let a = i as f32 * std::f32::consts::PI / spikes as f32;
            center + Vec2::new(a.cos(), a.sin()) * r
        })
        .collect()
}

/// Clamp into `[margin, dim − margin]` and point the velocity back inside.
pub fn reflect(p: &mut Particle, margin: f32, bounds: Size2) {
    let max_x = (bounds.width - margin).max(margin);
    let max_y = (bounds.height - margin).max(margin);
    if p.pos.x < margin {
        p.pos.x = margin;
        p.vel.x = p.vel.x.abs();
    } else if p.pos.x > max_x {
        p.pos.x = max_x;
        p.vel.x = -p.vel.x.abs();
    }
    if p.pos.y < margin {
        p.pos.y = margin;
        p.vel.y = p.vel.y.abs();
    } else if p.pos.y > max_y {
        p.pos.y = max_y;
        p.vel.y = -p.vel.y.abs();
    }
}

#[derive(Debug, Clone, Copy)]
struct ForceParams {
    radius: f32,
    inner: f32,
    integration: f32,
    dispersion: f32,
}

fn pair_accel(p: &Particle, other: &Particle, f: ForceParams) -> Vec2 {
    let d = other.pos.xy() - p.pos.xy();
    let dist = d.length();
    if dist <= 0.0 || dist >= f.radius {
        return Vec2::ZERO;
    }
    let dir = d * (1.0 / dist);
    let mut acc = dir * (f.integration * p.information / (dist * dist));
    if dist < f.inner {
        acc = acc - dir * (f.dispersion * p.energy / dist);
    }
    acc
}

fn accel_for(i: usize, particles: &[Particle], grid: Option<&SpatialGrid>, f: ForceParams) -> Vec2 {
    let p = &particles[i];
    let mut acc = Vec2::ZERO;
    match grid {
        Some(grid) => grid.for_each_neighbor(p.pos.xy(), |j| {
            if j != i {
                acc += pair_accel(p, &particles[j], f);
            }
        }),
        None => {
            for (j, other) in particles.iter().enumerate() {
                if j != i {
                    acc += pair_accel(p, other, f);
                }
            }
        }
    }
    acc
}

/// Uniform grid rebuilt each step with a counting sort.
#[derive(Debug, Clone, Default)]
struct SpatialGrid {
    cell: f32,
    cols: usize,
    rows: usize,
    starts: Vec<usize>,
    order: Vec<usize>,
}

impl SpatialGrid {
    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let cx = (p.x / self.cell).floor();
        let cy = (p.y / self.cell).floor();
        let clamp = |v: f32, n: usize| {
            if v.is_nan() || v < 0.0 {
                0
            } else {
                (v as usize).min(n - 1)
            }
        };
        (clamp(cx, self.cols), clamp(cy, self.rows))
    }

    fn rebuild(&mut self, particles: &[Particle], cell: f32, bounds: Size2) {
        self.cell = cell.max(1.0);
        self.cols = ((bounds.width / self.cell).ceil() as usize).max(1);
        self.rows = ((bounds.height / self.cell).ceil() as usize).max(1);
        let n_cells = self.cols * self.rows;

        self.starts.clear();
        self.starts.resize(n_cells + 1, 0);
        let cells: Vec<usize> = particles
            .iter()
            .map(|p| {
                let (x, y) = self.cell_of(p.pos.xy());
                y * self.cols + x
            })
            .collect();
        for &c in &cells {
            self.starts[c + 1] += 1;
        }
        for c in 0..n_cells {
            self.starts[c + 1] += self.starts[c];
        }
        let mut fill = self.starts.clone();
        self.order.clear();
        self.order.resize(particles.len(), 0);
        for (i, &c) in cells.iter().enumerate() {
            self.order[fill[c]] = i;
            fill[c] += 1;
        }
    }

    fn for_each_neighbor(&self, p: Vec2, mut f: impl FnMut(usize)) {
        let (cx, cy) = self.cell_of(p);
        let x0 = cx.saturating_sub(1);
        let y0 = cy.saturating_sub(1);
        let x1 = (cx + 1).min(self.cols - 1);
        let y1 = (cy + 1).min(self.rows - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let c = y * self.cols + x;
                for &j in &self.order[self.starts[c]..self.starts[c + 1]] {
                    f(j);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level_behavior::{behavior_for_level, OrganicDrift};

    fn scattered(n: usize, seed: u64, binning: bool) -> ParticleSystem {
        let mut sys = ParticleSystem::new(ParticleConfig::default().with_binning(binning));
        let mut rng = Prng::new(seed);
        for _ in 0..n {
            let mut p = Particle::new(
                Vec3::new(rng.gen_range_f32(0.0, 1280.0), rng.gen_range_f32(0.0, 720.0), 0.0),
                ParticleKind::Organic,
            );
            p.energy = rng.gen_range_f32(0.0, 100.0);
            p.information = rng.gen_range_f32(0.0, 8.0);
            sys.spawn(p);
        }
        sys
    }

    #[test]
    fn spawn_refuses_past_cap() {
        let mut sys = ParticleSystem::new(ParticleConfig::default().with_cap(3));
        for _ in 0..3 {
            assert!(sys.spawn(Particle::new(Vec3::ZERO, ParticleKind::Organic)));
        }
        assert!(!sys.spawn(Particle::new(Vec3::ZERO, ParticleKind::Organic)));
        assert_eq!(sys.len(), 3);
        assert_eq!(ParticleConfig::default().with_cap(10_000).cap, PARTICLE_CAP);
    }

    #[test]
    fn count_never_exceeds_cap_across_ticks() {
        let mut rng = Prng::new(3);
        for level in [0usize, 5, 10, 15] {
            let behavior = behavior_for_level(level);
            let mut sys = ParticleSystem::new(ParticleConfig::default());
            behavior.populate(&mut sys, level, &mut rng);
            for _ in 0..50 {
                sys.step(0.27, behavior, &mut rng);
                for _ in 0..100 {
                    sys.spawn(Particle::new(Vec3::ZERO, ParticleKind::Organic));
                }
                assert!(sys.len() <= PARTICLE_CAP);
            }
        }
    }

    #[test]
    fn reflection_on_all_four_edges() {
        let bounds = Size2::new(800.0, 600.0);
        let margin = 20.0;
        let cases = [
            (Vec3::new(-5.0, 300.0, 0.0), Vec3::new(-3.0, 0.0, 0.0)),
            (Vec3::new(900.0, 300.0, 0.0), Vec3::new(3.0, 0.0, 0.0)),
            (Vec3::new(400.0, -40.0, 0.0), Vec3::new(0.0, -2.0, 0.0)),
            (Vec3::new(400.0, 700.0, 0.0), Vec3::new(0.0, 2.0, 0.0)),
        ];
        for (pos, vel) in cases {
            let mut p = Particle::new(pos, ParticleKind::Organic);
            p.vel = vel;
            reflect(&mut p, margin, bounds);
            assert!((margin..=bounds.width - margin).contains(&p.pos.x));
            assert!((margin..=bounds.height - margin).contains(&p.pos.y));
            if vel.x != 0.0 {
                assert_eq!(p.vel.x, -vel.x);
            }
            if vel.y != 0.0 {
                assert_eq!(p.vel.y, -vel.y);
            }
        }
    }

    #[test]
    fn grid_matches_brute_force() {
        let mut binned = scattered(600, 11, true);
        let mut brute = scattered(600, 11, false);
        binned.integration_force = 0.4;
        brute.integration_force = 0.4;
        let a = binned.epo_accelerations();
        let b = brute.epo_accelerations();
        for (x, y) in a.iter().zip(&b) {
            assert!((x.x - y.x).abs() < 1e-3 && (x.y - y.y).abs() < 1e-3, "{x:?} vs {y:?}");
        }
    }

    #[test]
    fn grid_handles_out_of_bounds_positions() {
        let mut sys = ParticleSystem::new(ParticleConfig::default());
        let mut a = Particle::new(Vec3::new(-30.0, -30.0, 0.0), ParticleKind::Organic);
        a.information = 5.0;
        sys.spawn(a);
        sys.spawn(Particle::new(Vec3::new(-10.0, -30.0, 0.0), ParticleKind::Organic));
        let acc = sys.epo_accelerations();
        assert!(acc[0].x > 0.0, "particle 0 should be pulled toward particle 1");
    }

    #[test]
    fn inner_radius_repels() {
        let mut sys = ParticleSystem::new(ParticleConfig::default());
        let mut a = Particle::new(Vec3::new(100.0, 100.0, 0.0), ParticleKind::Organic);
        a.energy = 80.0;
        sys.spawn(a);
        sys.spawn(Particle::new(Vec3::new(105.0, 100.0, 0.0), ParticleKind::Organic));
        let acc = sys.epo_accelerations();
        assert!(acc[0].x < 0.0);
    }

    #[test]
    fn step_updates_stats() {
        let mut sys = scattered(100, 5, true);
        let mut rng = Prng::new(1);
        sys.step(0.27, &OrganicDrift, &mut rng);
        let s = sys.stats();
        assert!(s.avg_energy > 0.0);
        assert!((s.coherence - (s.avg_information / 10.0).min(1.0)).abs() < 1e-6);
    }

    #[test]
    fn retain_remaps_bonds() {
        let mut sys = ParticleSystem::new(ParticleConfig::default());
        for i in 0..4 {
            sys.spawn(Particle::new(Vec3::new(i as f32, 0.0, 0.0), ParticleKind::Bonded));
        }
        sys.bonds.push(Bond { a: 1, b: 3, strength: 0.5, ideal: 20.0 });
        sys.bonds.push(Bond { a: 0, b: 2, strength: 0.5, ideal: 20.0 });
        sys.retain(|p| p.pos.x != 0.0);
        assert_eq!(sys.len(), 3);
        assert_eq!(sys.bonds, vec![Bond { a: 0, b: 2, strength: 0.5, ideal: 20.0 }]);
    }

    #[test]
    fn perspective_shrinks_far_particles() {
        let proj = Projection::Perspective {
            focal: 300.0,
            center: Vec2::new(400.0, 300.0),
        };
        let (at, s) = proj.apply(Vec3::new(500.0, 300.0, 300.0)).unwrap_or_default();
        assert!((s - 0.5).abs() < 1e-6);
        assert!((at.x - 450.0).abs() < 1e-4);
    }

    #[test]
    fn star_has_alternating_radii() {
        let pts = star_points(Vec2::ZERO, 2.0, 1.0, 8);
        assert_eq!(pts.len(), 16);
        assert!((pts[0].length() - 2.0).abs() < 1e-5);
        assert!((pts[1].length() - 1.0).abs() < 1e-5);
    }
}
