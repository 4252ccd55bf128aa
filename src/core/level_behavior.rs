//! Per-level particle behavior, dispatched by emergence level index.
//!
//! Seven behaviors cover the sixteen levels. Each one arranges a freshly
//! populated system, moves individual particles every step, and supplies the
//! GLSL field function the fragment shader uses for its level range.

use std::f32::consts::TAU;

use crate::geometry::{Size2, Vec2, Vec3};
use crate::levels::{EmergenceLevelTable, LEVEL_COUNT};
use crate::particles::{Bond, Kinematics, Link, Particle, ParticleKind, ParticleSystem};
use crate::prng::Prng;

/// Frame-level inputs to a kinematic update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelContext {
    pub dt: f32,
    pub center: Vec2,
    pub bounds: Size2,
}

pub trait LevelBehavior: Sync {
    /// Short lowercase id. Also names the GLSL function `field_<name>`.
    fn name(&self) -> &'static str;

    /// Lay out particles, bonds and links after population.
    fn arrange(&self, system: &mut ParticleSystem, rng: &mut Prng);

    fn update(&self, particle: &mut Particle, ctx: &LevelContext, rng: &mut Prng);

    /// Whole-system pass after the per-particle updates.
    fn update_system(&self, _system: &mut ParticleSystem, _ctx: &LevelContext, _rng: &mut Prng) {}

    fn shader_snippet(&self) -> &'static str;

    /// Refill `system` with the particles for `level` and arrange them.
    fn populate(&self, system: &mut ParticleSystem, level: usize, rng: &mut Prng) {
        system.clear();
        let i = level.min(LEVEL_COUNT - 1);
        let fi = i as f32;
        system.integration_force = 0.1 + 0.05 * fi;
        system.dispersion_force = 0.05 + 0.02 * fi;
        system.color = EmergenceLevelTable
            .get(i)
            .map(|l| l.color)
            .unwrap_or([1.0, 1.0, 1.0]);

        let bounds = system.bounds();
        for _ in 0..particle_count(i, system.cap()) {
            let mut p = Particle::new(
                Vec3::new(
                    rng.gen_range_f32(0.0, bounds.width),
                    rng.gen_range_f32(0.0, bounds.height),
                    0.0,
                ),
                ParticleKind::Organic,
            );
            p.vel = Vec3::new(rng.signed(1.0), rng.signed(1.0), 0.0);
            p.size = 1.0 + 0.5 * fi;
            p.mass = 1.0 + 0.1 * fi;
            p.energy = rng.gen_range_f32(0.0, 100.0);
            p.information = rng.gen_range_f32(0.0, fi);
            p.resonance = rng.angle();
            p.color = system.color;
            system.spawn(p);
        }
        self.arrange(system, rng);
    }
}

/// `min(50 · 1.5^level, cap)`.
pub fn particle_count(level: usize, cap: usize) -> usize {
    let n = 50.0 * 1.5f64.powi(level as i32);
    (n.floor() as usize).min(cap)
}

// ═══════════════════════════════════════════════════════════════════════════
// Quantum (0–1)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct QuantumWaves;

impl LevelBehavior for QuantumWaves {
    fn name(&self) -> &'static str {
        "quantum"
    }

    fn arrange(&self, system: &mut ParticleSystem, rng: &mut Prng) {
        for p in &mut system.particles {
            p.kind = ParticleKind::Quantum;
            p.kinematics = Kinematics::Wave {
                amplitude: rng.next_f32_01(),
                phase: rng.angle(),
            };
        }
    }

    fn update(&self, p: &mut Particle, ctx: &LevelContext, rng: &mut Prng) {
        if let Kinematics::Wave { amplitude, phase } = &mut p.kinematics {
            *phase += *amplitude * ctx.dt * 0.1;
            let jitter = *amplitude * 0.05;
            p.pos.x += rng.signed(jitter);
            p.pos.y += rng.signed(jitter);
        }
    }

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_quantum(vec2 uv) {
    float foam = 0.0;
    for (int i = 0; i < 8; i++) {
        float fi = float(i);
        vec2 p = uv * pow(2.0, fi) * 10.0;
        foam += sin(p.x + u_time * (1.0 + fi * 0.2)) * sin(p.y + u_time * (1.5 + fi * 0.1)) / pow(2.0, fi);
    }
    return abs(foam) * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Atomic (2)
// ═══════════════════════════════════════════════════════════════════════════

pub const SHELL_RADII: [f32; 4] = [30.0, 60.0, 90.0, 120.0];

#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicShells;

impl LevelBehavior for AtomicShells {
    fn name(&self) -> &'static str {
        "atomic"
    }

    fn arrange(&self, system: &mut ParticleSystem, _rng: &mut Prng) {
        let n = system.particles.len().max(1) as f32;
        for (i, p) in system.particles.iter_mut().enumerate() {
            let shell = i % SHELL_RADII.len();
            p.kind = ParticleKind::Electron;
            p.kinematics = Kinematics::Orbital {
                radius: SHELL_RADII[shell],
                angle: i as f32 / n * TAU,
                speed: 0.02 / (shell as f32 + 1.0),
            };
        }
    }

    fn update(&self, p: &mut Particle, ctx: &LevelContext, _rng: &mut Prng) {
        if let Kinematics::Orbital {
            radius,
            angle,
            speed,
        } = &mut p.kinematics
        {
            let slot = ctx.center + Vec2::new(angle.cos(), angle.sin()) * *radius;
            p.vel.x += (slot.x - p.pos.x) * 0.1 * ctx.dt;
            p.vel.y += (slot.y - p.pos.y) * 0.1 * ctx.dt;
            *angle += *speed * ctx.dt;
        }
    }

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_atomic(vec2 uv) {
    float shells = 0.0;
    for (int i = 1; i <= 4; i++) {
        float shellDist = abs(distance(uv, vec2(0.5)) - float(i) * 0.08);
        shells += exp(-shellDist * 50.0);
    }
    return shells * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Molecular (3–4)
// ═══════════════════════════════════════════════════════════════════════════

pub const MOLECULE_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct MolecularBonds;

impl LevelBehavior for MolecularBonds {
    fn name(&self) -> &'static str {
        "molecular"
    }

    fn arrange(&self, system: &mut ParticleSystem, rng: &mut Prng) {
        let n = system.particles.len();
        for p in &mut system.particles {
            p.kind = ParticleKind::Bonded;
        }
        for start in (0..n).step_by(MOLECULE_SIZE) {
            let end = (start + MOLECULE_SIZE).min(n);
            for a in start..end {
                for b in (a + 1)..end {
                    system.bonds.push(Bond {
                        a,
                        b,
                        strength: 0.5,
                        ideal: rng.gen_range_f32(20.0, 30.0),
                    });
                }
            }
        }
    }

    fn update(&self, _p: &mut Particle, _ctx: &LevelContext, _rng: &mut Prng) {}

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_molecular(vec2 uv) {
    float networks = 0.0;
    for (int i = 0; i < 6; i++) {
        float angle = float(i) * 1.047;
        networks += exp(-distance(uv, vec2(0.5) + vec2(cos(angle), sin(angle)) * 0.2) * 30.0);
    }
    return networks * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Cellular (5–7)
// ═══════════════════════════════════════════════════════════════════════════

pub const CELL_SIZE: usize = 20;
pub const MEMBRANE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, Default)]
pub struct CellularMembranes;

impl LevelBehavior for CellularMembranes {
    fn name(&self) -> &'static str {
        "cellular"
    }

    fn arrange(&self, system: &mut ParticleSystem, rng: &mut Prng) {
        let bounds = system.bounds();
        let cells = system.particles.len() / CELL_SIZE;
        for c in 0..cells {
            let center = Vec2::new(
                rng.gen_range_f32(0.0, bounds.width),
                rng.gen_range_f32(0.0, bounds.height),
            );
            let radius = rng.gen_range_f32(30.0, 50.0);
            let cell = &mut system.particles[c * CELL_SIZE..(c + 1) * CELL_SIZE];
            for (k, p) in cell.iter_mut().enumerate() {
                if k < MEMBRANE_SIZE {
                    let a = k as f32 / MEMBRANE_SIZE as f32 * TAU;
                    p.kind = ParticleKind::Membrane;
                    p.kinematics = Kinematics::Anchored {
                        anchor: center + Vec2::new(a.cos(), a.sin()) * radius,
                        spring: 0.15,
                        wander: false,
                    };
                } else {
                    p.kind = ParticleKind::Organelle;
                    p.kinematics = Kinematics::Anchored {
                        anchor: center + Vec2::new(rng.signed(radius * 0.5), rng.signed(radius * 0.5)),
                        spring: 0.05,
                        wander: true,
                    };
                }
            }
        }
    }

    fn update(&self, p: &mut Particle, ctx: &LevelContext, rng: &mut Prng) {
        if let Kinematics::Anchored {
            anchor,
            spring,
            wander,
        } = &mut p.kinematics
        {
            p.vel.x += (anchor.x - p.pos.x) * *spring * ctx.dt;
            p.vel.y += (anchor.y - p.pos.y) * *spring * ctx.dt;
            if *wander {
                anchor.x += rng.signed(0.25 * ctx.dt);
                anchor.y += rng.signed(0.25 * ctx.dt);
            }
        }
    }

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_cellular(vec2 uv) {
    float cells = 0.0;
    for (int i = 0; i < 5; i++) {
        float fi = float(i);
        vec2 c = vec2(0.5) + vec2(cos(fi * 1.257 + u_time * 0.1), sin(fi * 1.257 + u_time * 0.1)) * 0.25;
        float ring = abs(distance(uv, c) - 0.08);
        cells += exp(-ring * 60.0) + exp(-distance(uv, c) * 40.0) * 0.3;
    }
    return cells * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Organic (8–10)
// ═══════════════════════════════════════════════════════════════════════════

/// Free drift under EPO forces alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganicDrift;

impl LevelBehavior for OrganicDrift {
    fn name(&self) -> &'static str {
        "organic"
    }

    fn arrange(&self, system: &mut ParticleSystem, _rng: &mut Prng) {
        for p in &mut system.particles {
            p.kind = ParticleKind::Organic;
            p.kinematics = Kinematics::Free;
        }
    }

    fn update(&self, _p: &mut Particle, _ctx: &LevelContext, _rng: &mut Prng) {}

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_organic(vec2 uv) {
    return consciousnessField(uv) * 0.8 * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Gravitational (11–14)
// ═══════════════════════════════════════════════════════════════════════════

pub const MAX_PLANETS: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct GravitationalOrbits;

impl LevelBehavior for GravitationalOrbits {
    fn name(&self) -> &'static str {
        "gravitational"
    }

    fn arrange(&self, system: &mut ParticleSystem, rng: &mut Prng) {
        let center = system.center();
        let Some(star) = system.particles.first_mut() else {
            return;
        };
        star.kind = ParticleKind::Star;
        star.pos = Vec3::new(center.x, center.y, 0.0);
        star.vel = Vec3::ZERO;
        star.size = 8.0;
        star.mass = 100.0;

        let planets = MAX_PLANETS.min(system.particles.len() - 1);
        for i in 1..=planets {
            let radius = 50.0 + 30.0 * i as f32;
            let p = &mut system.particles[i];
            p.kind = ParticleKind::Planet;
            p.size = rng.gen_range_f32(2.0, 5.0);
            p.kinematics = Kinematics::Circular {
                radius,
                angle: i as f32 / planets as f32 * TAU,
                speed: 0.02 / radius.sqrt(),
            };
        }
    }

    fn update(&self, p: &mut Particle, ctx: &LevelContext, _rng: &mut Prng) {
        match &mut p.kinematics {
            Kinematics::Circular {
                radius,
                angle,
                speed,
            } => {
                *angle += *speed * ctx.dt;
                p.pos.x = ctx.center.x + angle.cos() * *radius;
                p.pos.y = ctx.center.y + angle.sin() * *radius;
            }
            _ if p.kind == ParticleKind::Star => {
                p.pos = Vec3::new(ctx.center.x, ctx.center.y, p.pos.z);
                p.vel = Vec3::ZERO;
            }
            _ => {}
        }
    }

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_gravitational(vec2 uv) {
    vec2 pos = uv - vec2(0.5);
    float radius = length(pos);
    float angle = atan(pos.y, pos.x);
    float spiral = 0.0;
    for (int i = 0; i < 3; i++) {
        float arm = angle + float(i) * 2.094 - radius * 8.0;
        spiral += exp(-abs(sin(arm)) * 5.0) * exp(-radius * 2.0);
    }
    return spiral * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Consciousness (15)
// ═══════════════════════════════════════════════════════════════════════════

pub const NEURAL_LINK_DISTANCE: f32 = 100.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct NeuralWeb;

impl LevelBehavior for NeuralWeb {
    fn name(&self) -> &'static str {
        "consciousness"
    }

    fn arrange(&self, system: &mut ParticleSystem, rng: &mut Prng) {
        for p in &mut system.particles {
            p.kind = ParticleKind::Neuron;
            p.kinematics = Kinematics::Neural {
                phase: rng.angle(),
                activity: 0.0,
            };
        }
        let ps = &system.particles;
        for a in 0..ps.len() {
            for b in (a + 1)..ps.len() {
                let d = ps[a].pos.xy().distance(ps[b].pos.xy());
                if d > 0.0 && d < NEURAL_LINK_DISTANCE {
                    system.links.push(Link {
                        a,
                        b,
                        strength: 1.0 / d,
                        activity: rng.next_f32_01(),
                    });
                }
            }
        }
    }

    fn update(&self, p: &mut Particle, ctx: &LevelContext, _rng: &mut Prng) {
        if let Kinematics::Neural { phase, activity } = &mut p.kinematics {
            *phase += 0.01 * ctx.dt;
            *activity = 0.5 + 0.5 * phase.sin();
        }
    }

    fn update_system(&self, system: &mut ParticleSystem, _ctx: &LevelContext, rng: &mut Prng) {
        let ParticleSystem {
            particles, links, ..
        } = system;
        for link in links.iter_mut() {
            link.activity *= 0.99;
            let firing = particles.get(link.a).is_some_and(|p| p.activity() > 0.8);
            if firing && rng.chance(0.1) {
                link.activity = (link.activity + 0.3).min(1.0);
            }
        }
    }

    fn shader_snippet(&self) -> &'static str {
        r#"
vec3 field_consciousness(vec2 uv) {
    return (consciousnessField(uv) + hypercubeLattice(uv) * 0.5) * u_levelColor;
}
"#
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════════

static QUANTUM: QuantumWaves = QuantumWaves;
static ATOMIC: AtomicShells = AtomicShells;
static MOLECULAR: MolecularBonds = MolecularBonds;
static CELLULAR: CellularMembranes = CellularMembranes;
static ORGANIC: OrganicDrift = OrganicDrift;
static GRAVITATIONAL: GravitationalOrbits = GravitationalOrbits;
static CONSCIOUSNESS: NeuralWeb = NeuralWeb;

static REGISTRY: [&(dyn LevelBehavior); LEVEL_COUNT] = [
    &QUANTUM,
    &QUANTUM,
    &ATOMIC,
    &MOLECULAR,
    &MOLECULAR,
    &CELLULAR,
    &CELLULAR,
    &CELLULAR,
    &ORGANIC,
    &ORGANIC,
    &ORGANIC,
    &GRAVITATIONAL,
    &GRAVITATIONAL,
    &GRAVITATIONAL,
    &GRAVITATIONAL,
    &CONSCIOUSNESS,
];

/// Behavior for `level`. Out-of-range indices clamp to the top level.
pub fn behavior_for_level(level: usize) -> &'static dyn LevelBehavior {
    REGISTRY[level.min(LEVEL_COUNT - 1)]
}

/// Contiguous `(first, last, behavior)` level ranges, in order.
pub fn behavior_ranges() -> Vec<(usize, usize, &'static dyn LevelBehavior)> {
    let mut out: Vec<(usize, usize, &'static dyn LevelBehavior)> = Vec::new();
    for (i, b) in REGISTRY.iter().enumerate() {
        match out.last_mut() {
            Some(last) if last.2.name() == b.name() => last.1 = i,
            _ => out.push((i, i, *b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{ParticleConfig, DT_PER_MS};

    fn populated(level: usize) -> (ParticleSystem, Prng) {
        let mut rng = Prng::new(42 + level as u64);
        let mut sys = ParticleSystem::new(ParticleConfig::default());
        behavior_for_level(level).populate(&mut sys, level, &mut rng);
        (sys, rng)
    }

    #[test]
    fn registry_inventory() {
        let names: Vec<&str> = (0..LEVEL_COUNT).map(|i| behavior_for_level(i).name()).collect();
        assert_eq!(names[0], "quantum");
        assert_eq!(names[1], "quantum");
        assert_eq!(names[2], "atomic");
        assert_eq!(names[4], "molecular");
        assert_eq!(names[7], "cellular");
        assert_eq!(names[10], "organic");
        assert_eq!(names[14], "gravitational");
        assert_eq!(names[15], "consciousness");
        assert_eq!(behavior_for_level(99).name(), "consciousness");
        assert_eq!(behavior_ranges().len(), 7);
    }

    #[test]
    fn snippets_define_their_field_function() {
        for (_, _, b) in behavior_ranges() {
            let decl = format!("vec3 field_{}(vec2 uv)", b.name());
            assert!(b.shader_snippet().contains(&decl), "{}", b.name());
        }
    }

    #[test]
    fn counts_and_forces_grow_with_level() {
        assert_eq!(particle_count(0, 2000), 50);
        assert_eq!(particle_count(2, 2000), 112);
        assert_eq!(particle_count(15, 2000), 2000);
        let (sys, _) = populated(4);
        assert_eq!(sys.len(), 253);
        assert!((sys.integration_force - 0.3).abs() < 1e-6);
        assert!((sys.dispersion_force - 0.13).abs() < 1e-6);
        assert!(sys.particles.iter().all(|p| (p.size - 3.0).abs() < 1e-6));
    }

    #[test]
    fn molecules_are_fully_bonded_groups() {
        let (sys, _) = populated(3);
        let groups = sys.len() / MOLECULE_SIZE;
        assert!(sys.bonds.len() >= groups * 6);
        for b in &sys.bonds {
            assert_eq!(b.a / MOLECULE_SIZE, b.b / MOLECULE_SIZE);
            assert!((20.0..=30.0).contains(&b.ideal));
        }
    }

    #[test]
    fn planets_follow_exact_circles() {
        let (mut sys, mut rng) = populated(12);
        let ctx = LevelContext {
            dt: 16.0 * DT_PER_MS,
            center: sys.center(),
            bounds: sys.bounds(),
        };
        assert_eq!(sys.particles[0].kind, ParticleKind::Star);
        let behavior = behavior_for_level(12);
        for _ in 0..30 {
            for p in &mut sys.particles {
                behavior.update(p, &ctx, &mut rng);
            }
        }
        for (i, p) in sys.particles.iter().enumerate().skip(1).take(MAX_PLANETS) {
            let r = p.pos.xy().distance(ctx.center);
            let expected = 50.0 + 30.0 * i as f32;
            assert!((r - expected).abs() < 1e-3, "planet {i}: {r} vs {expected}");
        }
        assert!(sys.particles[0].pos.xy().distance(ctx.center) < 1e-6);
    }

    #[test]
    fn neural_links_decay_and_stay_bounded() {
        let (mut sys, mut rng) = populated(15);
        assert!(!sys.links.is_empty());
        for l in &sys.links {
            let d = sys.particles[l.a].pos.xy().distance(sys.particles[l.b].pos.xy());
            assert!(d < NEURAL_LINK_DISTANCE);
        }
        for _ in 0..20 {
            sys.step(0.27, behavior_for_level(15), &mut rng);
        }
        assert!(sys.links.iter().all(|l| (0.0..=1.0).contains(&l.activity)));
        assert!(sys
            .particles
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.activity())));
    }

    #[test]
    fn cells_pull_membrane_toward_ring() {
        let (sys, _) = populated(5);
        let membrane = sys
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Membrane)
            .count();
        assert_eq!(membrane, sys.len() / CELL_SIZE * MEMBRANE_SIZE);
    }
}
