//! epo_player - headless presentation driver
//!
//! Runs the engine against recording surfaces at a fixed frame rate,
//! replays an input script and logs narrative events as they happen.

mod error;
mod paths;
mod player;
mod script;

use std::time::Duration;

use epo::clock::FrameClock;
use epo::config::{PerformanceProfile, Preferences};
use epo::orchestrator::OrchestratorConfig;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use error::PlayerError;
use paths::AppPaths;
use player::Player;
use script::Script;

/// Frames to keep running after the last script step.
const TAIL_MS: u64 = 3_000;
const SUMMARY_EVERY_MS: u64 = 1_000;

struct Args {
    script: Option<String>,
    fps: Option<u32>,
    seed: Option<u64>,
    performance: Option<PerformanceProfile>,
    save_preferences: bool,
}

fn parse_args() -> Result<Args, PlayerError> {
    let mut args = Args {
        script: None,
        fps: None,
        seed: None,
        performance: None,
        save_preferences: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--fps" => {
                let v = it.next().ok_or_else(|| PlayerError::Argument("--fps needs a value".into()))?;
                args.fps = Some(v.parse().map_err(|_| PlayerError::Argument(format!("bad fps '{v}'")))?);
            }
            "--seed" => {
                let v = it.next().ok_or_else(|| PlayerError::Argument("--seed needs a value".into()))?;
                args.seed = Some(v.parse().map_err(|_| PlayerError::Argument(format!("bad seed '{v}'")))?);
            }
            "--performance" => {
                let v = it
                    .next()
                    .ok_or_else(|| PlayerError::Argument("--performance needs a value".into()))?;
                args.performance = Some(v.parse().map_err(|e| PlayerError::Argument(format!("{e}")))?);
            }
            "--save-preferences" => args.save_preferences = true,
            other if other.starts_with("--") => {
                return Err(PlayerError::Argument(format!("unknown option '{other}'")));
            }
            path => args.script = Some(path.to_string()),
        }
    }
    Ok(args)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = parse_args()?;
    let paths = AppPaths::new()?;
    let mut prefs: Preferences = paths.load_preferences();
    if let Some(profile) = args.performance {
        prefs = prefs.with_performance(profile);
    }
    if args.save_preferences {
        paths.save_preferences(&prefs)?;
    }

    let script = match &args.script {
        Some(path) => Script::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => Script::walk(),
    };

    let mut config = OrchestratorConfig::default();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let fps = args.fps.unwrap_or_else(|| prefs.performance.target_fps()).max(1);
    let dt = 1.0 / fps as f32;
    let end_ms = script.duration_ms() + TAIL_MS;

    info!(fps, steps = script.steps.len(), data_dir = %paths.data_dir().display(), "epo_player starting");
    let mut player = Player::new(config, prefs, script)?;

    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut clock = FrameClock::default();
    let mut next_summary = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now_ms = started.elapsed().as_secs_f64() * 1000.0;
                player.frame(clock.tick(now_ms));
                if player.elapsed_ms() >= next_summary {
                    next_summary += SUMMARY_EVERY_MS;
                    info!("{}", player.summary());
                }
                if player.script_done() && player.elapsed_ms() >= end_ms {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted");
                break;
            }
        }
    }

    player.log_snapshot();
    player.finish();
    Ok(())
}
