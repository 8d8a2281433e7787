//! Launch parameter parsing for the ride.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used (CLI argument parsing is not available).

use std::path::PathBuf;

use bevy::prelude::*;

/// Default window width in logical pixels.
const DEFAULT_WIDTH: u32 = 1280;
/// Default window height in logical pixels.
const DEFAULT_HEIGHT: u32 = 720;
/// Default seed for scenery placement.
const DEFAULT_SEED: u64 = 7;

/// Launch parameters for the ride.
#[derive(Resource, Debug, Clone)]
pub struct LaunchParams {
    /// Start with the ride stopped.
    pub paused: bool,
    /// Write CSV telemetry to this file (native only).
    pub telemetry: Option<PathBuf>,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Seed for tree and cloud placement.
    pub seed: u64,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            paused: false,
            telemetry: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: DEFAULT_SEED,
        }
    }
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{DEFAULT_HEIGHT, DEFAULT_SEED, DEFAULT_WIDTH, LaunchParams};

    #[derive(Parser)]
    #[command(about = "Animated roller coaster ride")]
    struct CliArgs {
        /// Start with the ride stopped.
        #[arg(long)]
        paused: bool,

        /// Write CSV telemetry to this file.
        #[arg(long)]
        telemetry: Option<PathBuf>,

        /// Initial window width.
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u32,

        /// Initial window height.
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: u32,

        /// Seed for tree and cloud placement.
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    }

    pub fn parse() -> LaunchParams {
        let args = CliArgs::parse();
        LaunchParams {
            paused: args.paused,
            telemetry: args.telemetry,
            width: args.width.max(1),
            height: args.height.max(1),
            seed: args.seed,
        }
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        LaunchParams::default()
    }
}
