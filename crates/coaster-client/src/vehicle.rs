//! Ride cart: motion, controls and the cart model.
//!
//! The [`Ride`] resource owns the track and the motion model. Each tick the
//! cart advances once and its root transform is copied from the model;
//! the body, seats and wheels are children of that root.

use std::collections::BTreeMap;

use bevy::ecs::message::{Message, MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_egui::input::egui_wants_any_keyboard_input;
use coaster_sim::{
    CatmullRomTrack, MotionConfig, SimulationMode, StepOutcome, TelemetrySnapshot, VehicleMotion,
    default_track,
    telemetry::{FileTelemetryOutput, emit_telemetry_to, reset_telemetry_to},
};

use crate::{FrameStage, launch_params::LaunchParams};

/// Samples used to measure the track length for telemetry.
const LENGTH_SAMPLES: usize = 2048;

/// Write a telemetry row every this many frames.
const TELEMETRY_EVERY: u64 = 10;

/// Plugin for the ride cart.
pub struct VehiclePlugin;

impl Plugin for VehiclePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<RideControl>()
            .init_resource::<RideStats>()
            .add_systems(PreStartup, init_ride)
            .add_systems(Startup, spawn_cart)
            .add_systems(
                Update,
                (
                    keyboard_ride_controls.run_if(not(egui_wants_any_keyboard_input)),
                    apply_ride_controls,
                )
                    .chain()
                    .in_set(FrameStage::Controls),
            )
            .add_systems(
                Update,
                (vehicle_update_system, write_telemetry)
                    .chain()
                    .in_set(FrameStage::Vehicle),
            );
    }
}

// ============================================================================
// Resources
// ============================================================================

/// The track and the cart moving on it.
#[derive(Resource)]
pub struct Ride {
    /// Closed spline the cart follows.
    pub track: CatmullRomTrack,
    /// Approximate track length in metres.
    pub track_length: f32,
    /// Cart motion model.
    pub motion: VehicleMotion,
}

impl Ride {
    /// Telemetry for the current frame.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::capture(self.motion.state(), self.track_length)
    }
}

/// Counts of each motion update branch since startup.
#[derive(Resource, Default)]
pub struct RideStats {
    /// Frames simulated.
    pub frames: u64,
    /// Frames per outcome.
    pub outcomes: BTreeMap<&'static str, u64>,
}

impl RideStats {
    fn record(&mut self, outcome: StepOutcome) {
        self.frames += 1;
        let key = match outcome {
            StepOutcome::Stopped => "stopped",
            StepOutcome::Advanced => "advanced",
            StepOutcome::DegenerateFallback => "degenerate",
            StepOutcome::JumpGuarded => "jump guarded",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Faulted => "faulted",
        };
        *self.outcomes.entry(key).or_default() += 1;
    }
}

/// Optional CSV telemetry log (enabled by `--telemetry`).
#[derive(Resource)]
struct TelemetryLog {
    output: FileTelemetryOutput,
}

/// Start/stop request from the HUD or keyboard.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideControl {
    /// Set the ride moving.
    Start,
    /// Stop the ride.
    Stop,
}

// ============================================================================
// Components
// ============================================================================

/// Marker for the cart's root entity.
#[derive(Component)]
pub struct Cart;

// ============================================================================
// Setup
// ============================================================================

/// Build the track and motion model before anything else spawns.
fn init_ride(mut commands: Commands, params: Res<LaunchParams>) {
    let track = match default_track() {
        Ok(track) => track,
        Err(e) => {
            // The layout is a compile-time constant; this only fires if it is edited badly.
            tracing::error!("Failed to build ride track: {e}");
            return;
        }
    };
    let track_length = track.approximate_length(LENGTH_SAMPLES);

    let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 0.0);
    if params.paused {
        motion.stop();
    }

    tracing::info!(
        "Ride ready: {} control points, {track_length:.0} m of track",
        track.control_points().len()
    );

    if let Some(path) = &params.telemetry {
        let mut output = FileTelemetryOutput::new(path);
        reset_telemetry_to(&mut output);
        tracing::info!("Writing telemetry to {}", output.path().display());
        commands.insert_resource(TelemetryLog { output });
    }

    commands.insert_resource(Ride {
        track,
        track_length,
        motion,
    });
}

/// Spawn the cart hierarchy at the motion model's starting pose.
fn spawn_cart(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    ride: Option<Res<Ride>>,
) {
    let Some(ride) = ride else {
        return;
    };
    let state = ride.motion.state();

    let body_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.12, 0.1),
        metallic: 0.3,
        perceptual_roughness: 0.4,
        ..default()
    });
    let seat_material = materials.add(Color::srgb(0.1, 0.1, 0.12));
    let wheel_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.6, 0.6, 0.65),
        metallic: 0.8,
        perceptual_roughness: 0.3,
        ..default()
    });

    let body = meshes.add(Cuboid::new(1.8, 0.7, 3.2));
    let nose = meshes.add(Cuboid::new(1.6, 0.5, 0.6));
    let seat = meshes.add(Cuboid::new(1.4, 0.6, 0.4));
    let wheel = meshes.add(Cylinder::new(0.22, 0.2));

    // Local -Z is forward, +Y is up; the root sits on the rail centreline.
    commands
        .spawn((
            Cart,
            Transform::from_translation(state.position).with_rotation(state.orientation),
            Visibility::default(),
        ))
        .with_children(|cart| {
            cart.spawn((
                Mesh3d(body),
                MeshMaterial3d(body_material.clone()),
                Transform::from_xyz(0.0, 0.75, 0.0),
            ));
            cart.spawn((
                Mesh3d(nose),
                MeshMaterial3d(body_material),
                Transform::from_xyz(0.0, 0.9, -1.8),
            ));
            for z in [-0.5, 0.6] {
                cart.spawn((
                    Mesh3d(seat.clone()),
                    MeshMaterial3d(seat_material.clone()),
                    Transform::from_xyz(0.0, 1.3, z),
                ));
            }
            for x in [-0.8, 0.8] {
                for z in [-1.1, 1.1] {
                    cart.spawn((
                        Mesh3d(wheel.clone()),
                        MeshMaterial3d(wheel_material.clone()),
                        Transform::from_xyz(x, 0.3, z)
                            .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
                    ));
                }
            }
        });
}

// ============================================================================
// Controls
// ============================================================================

/// Space starts the ride, Backspace stops it.
fn keyboard_ride_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut controls: MessageWriter<RideControl>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        controls.write(RideControl::Start);
    }
    if keyboard.just_pressed(KeyCode::Backspace) {
        controls.write(RideControl::Stop);
    }
}

/// Apply pending start/stop requests before the cart updates.
fn apply_ride_controls(mut controls: MessageReader<RideControl>, ride: Option<ResMut<Ride>>) {
    let Some(mut ride) = ride else {
        controls.clear();
        return;
    };
    for control in controls.read() {
        match control {
            RideControl::Start => ride.motion.set_mode(SimulationMode::Moving),
            RideControl::Stop => ride.motion.set_mode(SimulationMode::Stopped),
        }
    }
}

// ============================================================================
// Per-frame update
// ============================================================================

/// Advance the cart by one tick and move its root entity.
fn vehicle_update_system(
    ride: Option<ResMut<Ride>>,
    mut stats: ResMut<RideStats>,
    mut cart_query: Query<&mut Transform, With<Cart>>,
) {
    let Some(mut ride) = ride else {
        return;
    };
    let Ride { track, motion, .. } = &mut *ride;

    let outcome = motion.update(&*track);
    stats.record(outcome);

    let state = motion.state();
    if !state.position.is_finite() || !state.orientation.is_finite() {
        tracing::warn!("Cart pose is not finite, leaving transform unchanged");
        return;
    }

    for mut transform in &mut cart_query {
        transform.translation = state.position;
        transform.rotation = state.orientation;
    }
}

/// Append a CSV row every few frames when telemetry is enabled.
fn write_telemetry(
    log: Option<ResMut<TelemetryLog>>,
    ride: Option<Res<Ride>>,
    stats: Res<RideStats>,
) {
    let (Some(mut log), Some(ride)) = (log, ride) else {
        return;
    };
    if stats.frames % TELEMETRY_EVERY != 0 {
        return;
    }
    emit_telemetry_to(&mut log.output, &ride.snapshot(), stats.frames);
}
