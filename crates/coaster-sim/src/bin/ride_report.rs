//! Headless ride report.
//!
//! Runs the motion model on the default track without a window, printing CSV
//! telemetry to stdout and a summary of which update branches ran.
//!
//! Run with: cargo run -p coaster-sim --bin ride-report -- [frames] [every]
//! Example: cargo run -p coaster-sim --bin ride-report -- 36000 60

use std::{collections::BTreeMap, env, process::ExitCode};

use coaster_sim::{
    MotionConfig, StepOutcome, TelemetrySnapshot, VehicleMotion, default_track,
    telemetry::{StdoutTelemetryOutput, emit_telemetry_to, reset_telemetry_to},
};

/// Ten simulated minutes at 60 frames per second.
const DEFAULT_FRAMES: u64 = 36_000;

/// Emit one row per simulated second by default.
const DEFAULT_EVERY: u64 = 60;

/// Samples used to measure the track length.
const LENGTH_SAMPLES: usize = 2048;

/// Column width for outcome names in the summary; fits `DegenerateFallback`.
const OUTCOME_WIDTH: usize = 20;

fn outcome_line(outcome: &str, count: u64) -> String {
    format!("{outcome:<OUTCOME_WIDTH$} {count}")
}

fn parse_arg(args: &[String], index: usize, default: u64) -> Result<u64, String> {
    match args.get(index) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| format!("invalid argument '{raw}': {e}")),
        None => Ok(default),
    }
}

fn main() -> ExitCode {
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args: Vec<String> = env::args().collect();
    let (frames, every) = match (
        parse_arg(&args, 1, DEFAULT_FRAMES),
        parse_arg(&args, 2, DEFAULT_EVERY),
    ) {
        (Ok(frames), Ok(every)) => (frames, every.max(1)),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("ERROR: {e}");
            eprintln!("Usage: ride-report [frames] [every]");
            return ExitCode::FAILURE;
        }
    };

    let track = match default_track() {
        Ok(track) => track,
        Err(e) => {
            tracing::error!("Failed to build track: {e}");
            return ExitCode::FAILURE;
        }
    };
    let track_length = track.approximate_length(LENGTH_SAMPLES);
    tracing::info!(
        "Track: {} control points, {track_length:.1} m",
        track.control_points().len()
    );

    let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 0.0);
    let mut output = StdoutTelemetryOutput;
    reset_telemetry_to(&mut output);

    let mut outcomes: BTreeMap<String, u64> = BTreeMap::new();
    let mut max_speed_kmh = 0.0_f32;
    let mut max_height = f32::MIN;

    for frame in 0..frames {
        let outcome = motion.update(&track);
        *outcomes.entry(format!("{outcome:?}")).or_default() += 1;

        let snapshot = TelemetrySnapshot::capture(motion.state(), track_length);
        max_speed_kmh = max_speed_kmh.max(snapshot.speed_kmh());
        max_height = max_height.max(snapshot.height);

        if frame % every == 0 || outcome == StepOutcome::Faulted {
            emit_telemetry_to(&mut output, &snapshot, frame);
        }
    }

    let final_snapshot = TelemetrySnapshot::capture(motion.state(), track_length);
    tracing::info!("=== Ride report ===");
    tracing::info!("Frames:        {frames}");
    tracing::info!(
        "Laps:          {} (+{:.0}%)",
        final_snapshot.laps,
        final_snapshot.lap_progress * 100.0
    );
    tracing::info!("Max speed:     {max_speed_kmh:.1} km/h");
    tracing::info!("Max height:    {max_height:.1} m");
    for (outcome, count) in &outcomes {
        tracing::info!("{}", outcome_line(outcome, *count));
    }

    ExitCode::SUCCESS
}
