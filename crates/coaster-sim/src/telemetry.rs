//! Ride telemetry.
//!
//! [`TelemetrySnapshot`] is recomputed from the cart state every frame for the
//! HUD. The same snapshot can be written as CSV rows for offline analysis.

use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::motion::{SimulationMode, VehicleState};

/// Display ticks per second assumed when converting to world units.
pub const FRAMES_PER_SECOND: f32 = 60.0;

/// Display values derived from the cart state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    /// Cart speed in metres per second.
    pub speed_mps: f32,
    /// Cart height above the ground plane in metres.
    pub height: f32,
    /// Progress through the current lap, in `[0, 1)`.
    pub lap_progress: f32,
    /// Completed laps.
    pub laps: u32,
    /// Acceleration in curve-parameter units per frame squared.
    pub acceleration: f64,
    /// Curve-parameter velocity per frame.
    pub velocity: f64,
    /// Bank angle in degrees.
    pub bank_degrees: f32,
    /// Whether the ride is running.
    pub mode: SimulationMode,
}

impl TelemetrySnapshot {
    /// Derive telemetry from the cart state on a track of `track_length` metres.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn capture(state: &VehicleState, track_length: f32) -> Self {
        let parameter = if state.parameter.is_finite() {
            state.parameter
        } else {
            0.0
        };
        let laps = parameter.max(0.0).floor();

        Self {
            speed_mps: state.velocity as f32 * track_length * FRAMES_PER_SECOND,
            height: state.position.y,
            lap_progress: crate::wrap_parameter(parameter).unwrap_or(0.0) as f32,
            laps: laps.min(f64::from(u32::MAX)) as u32,
            acceleration: state.acceleration,
            velocity: state.velocity,
            bank_degrees: state.bank.to_degrees(),
            mode: state.mode,
        }
    }

    /// Cart speed in kilometres per hour.
    pub fn speed_kmh(&self) -> f32 {
        self.speed_mps * 3.6
    }
}

/// Destination for CSV telemetry rows.
pub trait TelemetryOutput {
    /// Start a fresh log, writing the header line.
    fn reset(&mut self, header: &str) -> io::Result<()>;

    /// Append one row.
    fn write_row(&mut self, row: &str) -> io::Result<()>;
}

/// Writes telemetry to a file, truncating it on reset.
pub struct FileTelemetryOutput {
    path: PathBuf,
    file: Option<File>,
}

impl FileTelemetryOutput {
    /// Create an output for `path`. Nothing is written until `reset`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetryOutput for FileTelemetryOutput {
    fn reset(&mut self, header: &str) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        writeln!(file, "{header}")?;
        self.file = Some(file);
        Ok(())
    }

    fn write_row(&mut self, row: &str) -> io::Result<()> {
        match &mut self.file {
            Some(file) => writeln!(file, "{row}"),
            None => Err(io::Error::other("telemetry file was not reset")),
        }
    }
}

/// Writes telemetry to standard output.
#[derive(Default)]
pub struct StdoutTelemetryOutput;

impl TelemetryOutput for StdoutTelemetryOutput {
    fn reset(&mut self, header: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{header}")
    }

    fn write_row(&mut self, row: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{row}")
    }
}

/// Generates the CSV header and row formatter from one column list.
macro_rules! define_telemetry_csv {
    (
        columns: {
            $( $name:ident : $fmt:literal => |$snapshot:ident, $frame:ident| $val:expr ),* $(,)?
        }
    ) => {
        /// CSV header line.
        pub fn csv_header() -> &'static str {
            const HEADER: &str = concat!( $( stringify!($name), "," ),* );
            HEADER.trim_end_matches(',')
        }

        /// Format one CSV row for a snapshot taken on `frame`.
        pub fn csv_row(snapshot: &TelemetrySnapshot, frame: u64) -> String {
            let mut fields: Vec<String> = Vec::new();
            $(
                {
                    let $snapshot = snapshot;
                    let $frame = frame;
                    fields.push(format!($fmt, $val));
                }
            )*
            fields.join(",")
        }
    };
}

define_telemetry_csv! {
    columns: {
        frame: "{}" => |_s, f| f,
        laps: "{}" => |s, _f| s.laps,
        progress: "{:.4}" => |s, _f| s.lap_progress,
        velocity: "{:.6}" => |s, _f| s.velocity,
        acceleration: "{:.7}" => |s, _f| s.acceleration,
        speed_kmh: "{:.2}" => |s, _f| s.speed_kmh(),
        height: "{:.2}" => |s, _f| s.height,
        bank_deg: "{:.2}" => |s, _f| s.bank_degrees,
        moving: "{}" => |s, _f| u8::from(s.mode == SimulationMode::Moving),
    }
}

/// Reset an output with the CSV header, logging failures.
pub fn reset_telemetry_to(output: &mut dyn TelemetryOutput) {
    if let Err(e) = output.reset(csv_header()) {
        tracing::warn!("Failed to reset telemetry output: {e}");
    }
}

/// Append a snapshot to an output, logging failures.
pub fn emit_telemetry_to(
    output: &mut dyn TelemetryOutput,
    snapshot: &TelemetrySnapshot,
    frame: u64,
) {
    if let Err(e) = output.write_row(&csv_row(snapshot, frame)) {
        tracing::warn!("Failed to write telemetry row: {e}");
    }
}
