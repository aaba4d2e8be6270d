//! Plummet entry point
//!
//! Runs the simulation headless at a fixed frame rate and prints the final
//! metrics as JSON.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use anyhow::Result;
#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
use plummet::Settings;
#[cfg(not(target_arch = "wasm32"))]
use plummet::sim::{FixedStepper, MetricsSampler, SimulationState};

/// Drop a ball through an endless obstacle field and report what happened
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "plummet", version)]
struct Options {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 30.0, value_parser = non_negative)]
    seconds: f32,
    /// Seed for a reproducible run (OS entropy when absent)
    #[arg(long)]
    seed: Option<u64>,
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Wall-clock delta fed to the stepper each frame
    #[arg(long, default_value_t = 1.0 / 60.0, value_parser = positive)]
    frame_dt: f32,
}

#[cfg(not(target_arch = "wasm32"))]
fn positive(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{s} is not a positive number"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn non_negative(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{s} must not be negative"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    env_logger::init();

    let options = Options::parse();

    let settings = match &options.config {
        Some(path) => Settings::load(path),
        None => Settings::new(),
    };
    let metrics_interval = settings.metrics_interval;

    let mut state = match options.seed {
        Some(seed) => SimulationState::new(settings, seed),
        None => SimulationState::from_entropy(settings),
    };
    log::info!("Plummet (native) starting: {:.1} s at frame dt {:.4}", options.seconds, options.frame_dt);

    let mut stepper = FixedStepper::default();
    let mut sampler = MetricsSampler::new(metrics_interval);
    let frames = (options.seconds / options.frame_dt).ceil() as u64;
    let mut next_report = 1.0;

    for _ in 0..frames {
        stepper.run(&mut state, options.frame_dt);

        if let Some(sample) = sampler.frame(&state) {
            log::debug!(
                "t={:.2} speed={:.2} obstacles={} collisions={}",
                sample.time,
                sample.ball_speed,
                sample.active_primitives,
                sample.collision_count
            );
        }
        if state.time >= next_report {
            next_report += 1.0;
            log::info!(
                "t={:.0}s height={:.1} speed={:.2} obstacles={} collisions={}",
                state.time,
                state.ball.position().y,
                state.ball.speed(),
                state.primitives.active_count(),
                state.collision_count
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&state.metrics())?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; a host page drives it
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::try_parse_from(["plummet"]).unwrap();
        assert_eq!(options.seconds, 30.0);
        assert_eq!(options.seed, None);
        assert_eq!(options.config, None);
        assert!((options.frame_dt - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_flags() {
        let options = Options::try_parse_from([
            "plummet", "--seconds", "5", "--seed", "42", "--config", "plummet.json", "--frame-dt", "0.02",
        ])
        .unwrap();
        assert_eq!(options.seconds, 5.0);
        assert_eq!(options.seed, Some(42));
        assert_eq!(options.config, Some(PathBuf::from("plummet.json")));
        assert_eq!(options.frame_dt, 0.02);
    }

    #[test]
    fn test_equals_form() {
        let options = Options::try_parse_from(["plummet", "--seed=42", "--seconds=1.5"]).unwrap();
        assert_eq!(options.seed, Some(42));
        assert_eq!(options.seconds, 1.5);
    }

    #[test]
    fn test_bad_args() {
        assert!(Options::try_parse_from(["plummet", "--seed"]).is_err());
        assert!(Options::try_parse_from(["plummet", "--seed", "x"]).is_err());
        assert!(Options::try_parse_from(["plummet", "--frame-dt", "0"]).is_err());
        assert!(Options::try_parse_from(["plummet", "--frame-dt", "NaN"]).is_err());
        assert!(Options::try_parse_from(["plummet", "--seconds=-1"]).is_err());
        assert!(Options::try_parse_from(["plummet", "--wat"]).is_err());
    }
}
