//! Headless demo of the presentation engine.
//!
//! Prints the narrative and emergence catalogs, or drives a recording-surface
//! presentation through the whole story and reports what it did.

use epo::config::{PerformanceProfile, Preferences, StaticConfig};
use epo::content::StaticContent;
use epo::levels::EmergenceLevelTable;
use epo::observer::EngineAdapter;
use epo::orchestrator::{NarrativeEvent, OrchestratorConfig, PresentationOrchestrator};
use epo::prelude::*;
use epo::surface::{GpuSurface, RecordingCanvas, RecordingCardSurface};
use tracing::Level;

const FRAME_SECS: f32 = 1.0 / 60.0;
const VIRTUAL_SCROLL: f32 = 10_000.0;

struct Options {
    verbose: bool,
    gpu: bool,
    frames_per_beat: usize,
    seed: u64,
    prefs: Preferences,
    rest: Vec<String>,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        verbose: false,
        gpu: false,
        frames_per_beat: 240,
        seed: OrchestratorConfig::default().seed,
        prefs: Preferences::default(),
        rest: Vec::new(),
    };
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--verbose" | "-v" => opts.verbose = true,
            "--gpu" => opts.gpu = true,
            "--reduced-motion" => opts.prefs = opts.prefs.with_reduced_motion(true),
            "--high-contrast" => opts.prefs = opts.prefs.with_high_contrast(true),
            "--performance" => {
                let value = it.next().ok_or("--performance needs a value")?;
                let profile: PerformanceProfile = value.parse().map_err(|e| format!("{e}"))?;
                opts.prefs = opts.prefs.with_performance(profile);
            }
            "--frames" => {
                let value = it.next().ok_or("--frames needs a value")?;
                opts.frames_per_beat = value.parse().map_err(|_| format!("bad frame count '{value}'"))?;
            }
            "--seed" => {
                let value = it.next().ok_or("--seed needs a value")?;
                opts.seed = value.parse().map_err(|_| format!("bad seed '{value}'"))?;
            }
            _ => opts.rest.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = match parse_options(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            print_help();
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(if opts.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    let command = opts.rest.first().map(String::as_str).unwrap_or("walk");
    match command {
        "--help" | "-h" | "help" => print_help(),
        "beats" => print_beats(),
        "levels" => print_levels(),
        "walk" => run_walk(&opts),
        "snapshot" => {
            let progress = opts.rest.get(1).and_then(|s| s.parse::<f32>().ok()).unwrap_or(0.5);
            run_snapshot(&opts, progress);
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    }
}

fn print_help() {
    println!("epo - headless EPO presentation engine demo");
    println!();
    println!("USAGE: epo [OPTIONS] [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("  walk              scroll through every beat and report transitions (default)");
    println!("  snapshot [P]      settle at scroll progress P (0..1) and print a JSON snapshot");
    println!("  beats             list the narrative beats");
    println!("  levels            list the emergence levels");
    println!("  help              show this message");
    println!();
    println!("OPTIONS:");
    println!("  -v, --verbose         debug logging");
    println!("  --frames N            frames to run per beat (default 240)");
    println!("  --seed N              layout and particle seed");
    println!("  --gpu                 render the shader offscreen (needs the gpu feature)");
    println!("  --performance P       high | medium | low");
    println!("  --reduced-motion      halve durations and soften forces");
    println!("  --high-contrast       high-contrast color schemes");
}

fn print_beats() {
    for (i, beat) in NarrativeBeatTable.ordered().iter().enumerate() {
        println!(
            "{:>2}  {:<26} [{:.2}, {:.2})  {:<27} level={:<2} exit={}",
            i,
            beat.id,
            beat.lo,
            beat.hi,
            beat.behavior.kind.label(),
            beat.level,
            beat.exit.label()
        );
    }
}

fn print_levels() {
    for level in EmergenceLevelTable.ordered() {
        println!(
            "{:>2}  {:<24} 10^{:<4} {}",
            level.index,
            level.name,
            level.scale.log10().round(),
            level.geometry
        );
    }
}

#[cfg(feature = "gpu")]
fn gpu_surface(opts: &Options, config: &OrchestratorConfig) -> Option<Box<dyn GpuSurface>> {
    opts.gpu.then(|| {
        Box::new(epo::gpu::WgpuSurface::new(config.viewport.width, config.viewport.height)) as Box<dyn GpuSurface>
    })
}

#[cfg(not(feature = "gpu"))]
fn gpu_surface(opts: &Options, _config: &OrchestratorConfig) -> Option<Box<dyn GpuSurface>> {
    if opts.gpu {
        eprintln!("built without the gpu feature; using the canvas path");
    }
    None
}

fn build(opts: &Options) -> PresentationOrchestrator {
    let config = OrchestratorConfig::default().with_seed(opts.seed);
    let built = PresentationOrchestrator::new(
        config.clone(),
        Box::new(RecordingCanvas::new(config.viewport.width, config.viewport.height)),
        gpu_surface(opts, &config),
        Box::new(RecordingCardSurface::new()),
        Box::new(StaticContent),
        Box::new(StaticConfig::new(opts.prefs)),
    );
    match built {
        Ok(show) => show,
        Err(e) => {
            eprintln!("presentation failed to start: {e}");
            std::process::exit(1);
        }
    }
}

fn settle(show: &mut PresentationOrchestrator, frames: usize) {
    for _ in 0..frames {
        show.tick(FRAME_SECS);
        show.render();
    }
}

fn run_walk(opts: &Options) {
    let mut show = build(opts);
    let beats = NarrativeBeatTable.ordered();
    for beat in beats {
        // land mid-beat so the in-beat progress is exercised too
        let y = (beat.lo + beat.hi) * 0.5 * VIRTUAL_SCROLL;
        show.handle_input(InputEvent::Scroll {
            y,
            max: VIRTUAL_SCROLL,
        });
        settle(&mut show, opts.frames_per_beat);

        for event in show.take_events() {
            match event {
                NarrativeEvent::BeatEntered { beat, level } => println!("  entered {beat} (level {level})"),
                NarrativeEvent::BeatChangeDropped { requested } => println!("  dropped change to {requested}"),
                NarrativeEvent::BehaviorFailed { beat, reason } => println!("  {beat}: behavior failed: {reason}"),
                NarrativeEvent::ModeChanged { .. } | NarrativeEvent::DepthChanged { .. } => {}
            }
        }
        println!("{}", EngineAdapter::new(&show).summary());
    }
    show.destroy();
}

fn run_snapshot(opts: &Options, progress: f32) {
    let mut show = build(opts);
    show.handle_input(InputEvent::Scroll {
        y: progress.clamp(0.0, 1.0) * VIRTUAL_SCROLL,
        max: VIRTUAL_SCROLL,
    });
    settle(&mut show, opts.frames_per_beat);
    let snapshot = EngineAdapter::new(&show).snapshot();
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("snapshot failed: {e}");
            std::process::exit(1);
        }
    }
    show.destroy();
}
