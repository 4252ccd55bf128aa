//! Criterion benchmarks for the emergence particle field.
//!
//! Run with:
//!   cargo bench
//!   cargo bench --features parallel
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use epo::level_behavior::{behavior_for_level, LevelBehavior};
use epo::orchestrator::{OrchestratorConfig, PresentationOrchestrator};
use epo::particles::{ParticleConfig, ParticleSystem, PARTICLE_CAP};
use epo::prelude::InputEvent;
use epo::prng::Prng;

fn populated(level: usize, binning: bool, seed: u64) -> (ParticleSystem, Prng) {
    let config = ParticleConfig::default()
        .with_bounds(1280.0, 720.0)
        .with_cap(PARTICLE_CAP)
        .with_binning(binning);
    let mut system = ParticleSystem::new(config);
    let mut rng = Prng::new(seed);
    behavior_for_level(level).populate(&mut system, level, &mut rng);
    (system, rng)
}

/// Force pass: spatial binning against the all-pairs scan.
fn bench_epo_forces(c: &mut Criterion) {
    let mut group = c.benchmark_group("epo_forces");

    // levels 4, 8 and 12 give ~250, ~1280 and the 2000 cap
    for level in [4usize, 8, 12].iter() {
        let (probe, _) = populated(*level, true, 1);
        group.throughput(Throughput::Elements(probe.len() as u64));

        for (label, binning) in [("binned", true), ("brute_force", false)] {
            group.bench_with_input(BenchmarkId::new(label, probe.len()), level, |b, &level| {
                let (mut system, _) = populated(level, binning, 42);
                b.iter(|| black_box(system.epo_accelerations().len()));
            });
        }
    }

    group.finish();
}

/// Full simulation step per level behavior at the particle cap.
fn bench_step_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_level");

    for level in [0usize, 3, 6, 9, 12, 15].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(level), level, |b, &level| {
            let (mut system, mut rng) = populated(level, true, 7);
            let behavior = behavior_for_level(level);
            b.iter(|| {
                system.step(0.016 * 16.0, behavior, &mut rng);
                black_box(system.len())
            });
        });
    }

    group.finish();
}

/// One tick + render of the whole headless presentation mid-narrative.
fn bench_frame(c: &mut Criterion) {
    c.bench_function("frame_headless", |b| {
        let mut show = PresentationOrchestrator::headless(OrchestratorConfig::default())
            .expect("recording surfaces");
        show.handle_input(InputEvent::Scroll { y: 5000.0, max: 10_000.0 });
        for _ in 0..300 {
            show.tick(1.0 / 60.0);
        }
        b.iter(|| {
            show.tick(1.0 / 60.0);
            show.render();
            black_box(show.progress())
        });
    });
}

criterion_group!(benches, bench_epo_forces, bench_step_levels, bench_frame);
criterion_main!(benches);
