//! Vehicle motion along the track.
//!
//! The cart's progress is a single unbounded curve parameter `t`. Each frame
//! the model samples the track around `t`, derives slope and curvature, and
//! turns them into a smoothed per-frame velocity (in curve-parameter units).
//! A set of hard clamps keeps the result stable on arbitrary curvature:
//!
//! - acceleration is clamped to `±max_acceleration`
//! - velocity is low-pass filtered and clamped to `[min_velocity, max_velocity]`
//! - centripetal damping is capped at [`MAX_CENTRIPETAL_DAMPING`]
//! - a step that would move the cart more than `max_position_jump` only moves
//!   it [`JUMP_INTERPOLATION`] of the way and decays velocity
//!
//! Faults never escape [`VehicleMotion::update`]. An unavailable sample skips
//! the frame, degenerate geometry falls back to a plain advance, and any
//! non-finite intermediate resets velocity and abandons the frame.

use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};

use glam::{Mat3, Quat, Vec3};

use crate::{MotionError, TrackCurve};

/// Weight of the new velocity in the per-frame low-pass filter.
pub const VELOCITY_BLEND: f64 = 0.05;

/// Fraction of a rejected step the cart still travels.
pub const JUMP_INTERPOLATION: f32 = 0.1;

/// Velocity multiplier applied when a step is rejected.
pub const JUMP_VELOCITY_DECAY: f64 = 0.8;

/// Upper bound on the curvature estimate (radians).
pub const MAX_CURVATURE: f32 = FRAC_PI_4;

/// Upper bound on the bank angle (radians).
pub const MAX_BANK: f32 = FRAC_PI_6;

/// Bank angle per radian of curvature.
pub const BANK_GAIN: f32 = 1.2;

/// Upper bound on the centripetal damping term.
pub const MAX_CENTRIPETAL_DAMPING: f64 = 0.0005;

/// Centripetal damping per unit of `curvature * velocity²`.
pub const CENTRIPETAL_GAIN: f64 = 0.08;

/// Lookahead points closer than this are treated as coincident.
const MIN_LOOKAHEAD_DISTANCE: f32 = 1e-4;

/// Whether the ride is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationMode {
    /// The cart advances every frame.
    #[default]
    Moving,
    /// The cart holds its position with zero velocity.
    Stopped,
}

/// Tunable constants for the motion model.
///
/// Velocities are in curve-parameter units per frame; accelerations are in
/// curve-parameter units per frame squared.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionConfig {
    /// Acceleration from gravity on a vertical slope.
    pub gravity: f64,
    /// Constant rolling friction subtracted every frame.
    pub friction: f64,
    /// Velocity floor while moving.
    pub min_velocity: f64,
    /// Velocity ceiling.
    pub max_velocity: f64,
    /// Acceleration magnitude limit.
    pub max_acceleration: f64,
    /// Largest world-space distance a single frame may move the cart.
    pub max_position_jump: f32,
    /// Parameter offset used for curvature chords and the orientation target.
    pub lookahead: f64,
    /// Chords shorter than this mark the geometry as degenerate.
    pub min_chord_length: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gravity: 0.000_1,
            friction: 0.000_005,
            min_velocity: 0.000_3,
            max_velocity: 0.002,
            max_acceleration: 0.000_1,
            max_position_jump: 5.0,
            lookahead: 0.05,
            min_chord_length: 0.001,
        }
    }
}

/// Full state of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    /// Unbounded curve parameter; the integer part counts completed laps.
    pub parameter: f64,
    /// Curve parameter advanced per frame.
    pub velocity: f64,
    /// Acceleration applied on the last physics frame.
    pub acceleration: f64,
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation (local -Z forward, +Y up, banked).
    pub orientation: Quat,
    /// Curvature estimate from the last physics frame (radians).
    pub curvature: f32,
    /// Bank angle from the last physics frame (radians).
    pub bank: f32,
    /// Whether the cart is running.
    pub mode: SimulationMode,
}

/// Which branch a call to [`VehicleMotion::update`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The ride is stopped; velocity and acceleration were pinned to zero.
    Stopped,
    /// Normal physics step.
    Advanced,
    /// Chords were too short for curvature; the cart advanced without physics.
    DegenerateFallback,
    /// The step would have moved the cart too far and was scaled back.
    JumpGuarded,
    /// A track sample was unavailable; state is unchanged.
    Skipped,
    /// A computation fault reset the velocity; position is unchanged.
    Faulted,
}

/// Owns the cart state and advances it along a track.
#[derive(Debug, Clone)]
pub struct VehicleMotion {
    config: MotionConfig,
    state: VehicleState,
}

impl VehicleMotion {
    /// Place a moving cart at `start_parameter` on the track.
    ///
    /// The cart starts at the minimum velocity, facing along the track.
    pub fn new<T: TrackCurve + ?Sized>(
        config: MotionConfig,
        track: &T,
        start_parameter: f64,
    ) -> Self {
        let position = track.point_at(start_parameter).unwrap_or(Vec3::ZERO);
        let orientation = track
            .tangent_at(start_parameter)
            .and_then(|tangent| facing_rotation(tangent, Vec3::Y))
            .unwrap_or(Quat::IDENTITY);

        let state = VehicleState {
            parameter: start_parameter,
            velocity: config.min_velocity,
            acceleration: 0.0,
            position,
            orientation,
            curvature: 0.0,
            bank: 0.0,
            mode: SimulationMode::Moving,
        };

        Self { config, state }
    }

    /// Current cart state.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Current mode.
    pub fn mode(&self) -> SimulationMode {
        self.state.mode
    }

    /// Start the ride. Velocity is raised to at least the minimum.
    pub fn start(&mut self) {
        self.set_mode(SimulationMode::Moving);
    }

    /// Stop the ride. Velocity and acceleration drop to zero.
    pub fn stop(&mut self) {
        self.set_mode(SimulationMode::Stopped);
    }

    /// Switch mode. Setting the current mode again is a no-op apart from
    /// re-applying the mode's velocity rule.
    pub fn set_mode(&mut self, mode: SimulationMode) {
        if self.state.mode != mode {
            tracing::info!("Ride mode changed: {:?} -> {mode:?}", self.state.mode);
        }
        self.state.mode = mode;
        match mode {
            SimulationMode::Moving => {
                self.state.velocity = self.state.velocity.max(self.config.min_velocity);
            }
            SimulationMode::Stopped => {
                self.state.velocity = 0.0;
                self.state.acceleration = 0.0;
            }
        }
    }

    /// Advance the cart by one frame.
    ///
    /// Never fails: faults are logged and absorbed, and the returned outcome
    /// says which branch ran.
    pub fn update<T: TrackCurve + ?Sized>(&mut self, track: &T) -> StepOutcome {
        if self.state.mode == SimulationMode::Stopped {
            self.state.velocity = 0.0;
            self.state.acceleration = 0.0;
            return StepOutcome::Stopped;
        }

        match self.step(track) {
            Ok((next, outcome)) => {
                self.state = next;
                outcome
            }
            Err(error @ MotionError::SampleUnavailable { .. }) => {
                tracing::warn!("Skipping vehicle update: {error}");
                StepOutcome::Skipped
            }
            Err(error) => {
                tracing::warn!("Vehicle update faulted, resetting velocity: {error}");
                self.state.velocity = self.config.min_velocity;
                self.state.acceleration = 0.0;
                StepOutcome::Faulted
            }
        }
    }

    /// Compute the next state without committing it.
    fn step<T: TrackCurve + ?Sized>(
        &self,
        track: &T,
    ) -> Result<(VehicleState, StepOutcome), MotionError> {
        let config = &self.config;
        let mut next = self.state.clone();
        let t = self.state.parameter;
        let v = self.state.velocity;

        let p = sample_point(track, t, "position")?;
        let tangent = track
            .tangent_at(t)
            .ok_or(MotionError::SampleUnavailable {
                sample: "tangent",
                parameter: t,
            })?;

        let slope = slope_angle(tangent);
        finite(slope, "slope")?;

        // Clamped rather than wrapped; only matters while t < Δ.
        let ahead = sample_point(track, t + config.lookahead, "lookahead chord")?;
        let behind = sample_point(track, (t - config.lookahead).max(0.0), "trailing chord")?;
        let forward_chord = ahead - p;
        let backward_chord = behind - p;

        if forward_chord.length() < config.min_chord_length
            || backward_chord.length() < config.min_chord_length
        {
            let velocity = v.clamp(config.min_velocity, config.max_velocity);
            next.parameter = t + velocity;
            next.velocity = velocity;
            next.position = sample_point(track, next.parameter, "position")?;
            if !next.position.is_finite() {
                return Err(MotionError::NonFinite {
                    quantity: "position",
                });
            }
            tracing::debug!("Degenerate chords at t = {t:.5}, advancing without physics");
            return Ok((next, StepOutcome::DegenerateFallback));
        }

        let curvature = turning_angle(forward_chord, backward_chord);
        finite(curvature, "curvature")?;
        let damping = centripetal_damping(curvature, v);

        let acceleration = (f64::from(slope.sin()) * config.gravity
            - config.friction
            - damping)
            .clamp(-config.max_acceleration, config.max_acceleration);
        finite(acceleration, "acceleration")?;

        let mut velocity = smooth_velocity(v, acceleration, config);
        next.parameter = t + velocity;
        let target = sample_point(track, next.parameter, "position")?;

        let mut outcome = StepOutcome::Advanced;
        let position = if self.state.position.distance(target) > config.max_position_jump {
            velocity = (v * JUMP_VELOCITY_DECAY).clamp(config.min_velocity, config.max_velocity);
            outcome = StepOutcome::JumpGuarded;
            tracing::debug!(
                "Rejected step of {:.2} at t = {t:.5}",
                self.state.position.distance(target)
            );
            self.state.position.lerp(target, JUMP_INTERPOLATION)
        } else {
            target
        };

        finite(velocity, "velocity")?;
        if !position.is_finite() {
            return Err(MotionError::NonFinite {
                quantity: "position",
            });
        }

        let bank = bank_angle(curvature);
        if let Some(look_target) = track.point_at(next.parameter + config.lookahead)
            && let Some(facing) = facing_rotation(look_target - position, Vec3::Y)
        {
            next.orientation = facing * Quat::from_rotation_z(bank);
        }

        next.velocity = velocity;
        next.acceleration = acceleration;
        next.position = position;
        next.curvature = curvature;
        next.bank = bank;

        Ok((next, outcome))
    }
}

/// Sample a track position, mapping `None` to a sample fault.
fn sample_point<T: TrackCurve + ?Sized>(
    track: &T,
    t: f64,
    sample: &'static str,
) -> Result<Vec3, MotionError> {
    track
        .point_at(t)
        .ok_or(MotionError::SampleUnavailable {
            sample,
            parameter: t,
        })
}

/// Reject NaN and infinity.
fn finite<F: Into<f64>>(value: F, quantity: &'static str) -> Result<(), MotionError> {
    if value.into().is_finite() {
        Ok(())
    } else {
        Err(MotionError::NonFinite { quantity })
    }
}

/// Angle of a tangent above the horizontal plane (radians).
///
/// The vertical component is clamped to `[-1, 1]` so near-vertical tangents
/// with slight denormalization stay in range.
pub fn slope_angle(tangent: Vec3) -> f32 {
    let vertical = tangent.y.clamp(-1.0, 1.0);
    let horizontal = (tangent.x * tangent.x + tangent.z * tangent.z).sqrt();
    vertical.atan2(horizontal)
}

/// Turning angle at a point, from the chords to the points ahead and behind.
///
/// A straight line gives zero; the result is capped at [`MAX_CURVATURE`].
pub fn turning_angle(forward_chord: Vec3, backward_chord: Vec3) -> f32 {
    let incoming = -backward_chord.normalize();
    let outgoing = forward_chord.normalize();
    let cos = incoming.dot(outgoing).clamp(-1.0, 1.0);
    cos.acos().min(MAX_CURVATURE)
}

/// Velocity penalty for cornering, capped at [`MAX_CENTRIPETAL_DAMPING`].
pub fn centripetal_damping(curvature: f32, velocity: f64) -> f64 {
    let damping = f64::from(curvature) * velocity * velocity * CENTRIPETAL_GAIN;
    damping.min(MAX_CENTRIPETAL_DAMPING)
}

/// Blend the current velocity towards `velocity + acceleration`, then clamp.
pub fn smooth_velocity(velocity: f64, acceleration: f64, config: &MotionConfig) -> f64 {
    let blended = velocity * (1.0 - VELOCITY_BLEND) + (velocity + acceleration) * VELOCITY_BLEND;
    blended.clamp(config.min_velocity, config.max_velocity)
}

/// Lean-into-the-turn roll for a curvature estimate, within `±MAX_BANK`.
pub fn bank_angle(curvature: f32) -> f32 {
    (curvature * BANK_GAIN).clamp(-MAX_BANK, MAX_BANK)
}

/// Rotation whose local -Z axis points along `direction`, with local +Y as
/// close to `up` as possible.
///
/// Returns `None` for a zero or non-finite direction.
pub fn facing_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    if !direction.is_finite() || direction.length() < MIN_LOOKAHEAD_DISTANCE {
        return None;
    }
    let back = -direction.normalize();
    let right = up
        .cross(back)
        .try_normalize()
        .unwrap_or_else(|| up.any_orthonormal_vector());
    let up = back.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, back)))
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{PI, TAU};

    use super::*;
    use crate::CatmullRomTrack;
    use proptest::prelude::*;

    /// Endless straight, flat line along +X.
    struct StraightTrack {
        scale: f32,
    }

    impl TrackCurve for StraightTrack {
        #[allow(clippy::cast_possible_truncation)]
        fn point_at(&self, t: f64) -> Option<Vec3> {
            Some(Vec3::new(t as f32 * self.scale, 2.0, 0.0))
        }

        fn tangent_at(&self, _t: f64) -> Option<Vec3> {
            Some(Vec3::X)
        }
    }

    /// Every position is the same point, but tangents still exist.
    struct CollapsedTrack;

    impl TrackCurve for CollapsedTrack {
        fn point_at(&self, _t: f64) -> Option<Vec3> {
            Some(Vec3::new(1.0, 2.0, 3.0))
        }

        fn tangent_at(&self, _t: f64) -> Option<Vec3> {
            Some(Vec3::X)
        }
    }

    /// No samples at all.
    struct MissingTrack;

    impl TrackCurve for MissingTrack {
        fn point_at(&self, _t: f64) -> Option<Vec3> {
            None
        }

        fn tangent_at(&self, _t: f64) -> Option<Vec3> {
            None
        }
    }

    /// Valid samples whose tangent is NaN.
    struct PoisonedTrack;

    impl TrackCurve for PoisonedTrack {
        #[allow(clippy::cast_possible_truncation)]
        fn point_at(&self, t: f64) -> Option<Vec3> {
            Some(Vec3::new(t as f32 * 100.0, 0.0, 0.0))
        }

        fn tangent_at(&self, _t: f64) -> Option<Vec3> {
            Some(Vec3::new(f32::NAN, f32::NAN, 0.0))
        }
    }

    /// A single collapsed point up to `t = 0.6`, NaN beyond it.
    struct CliffTrack;

    impl TrackCurve for CliffTrack {
        fn point_at(&self, t: f64) -> Option<Vec3> {
            if t <= 0.6 {
                Some(Vec3::new(4.0, 2.0, 0.0))
            } else {
                Some(Vec3::NAN)
            }
        }

        fn tangent_at(&self, _t: f64) -> Option<Vec3> {
            Some(Vec3::X)
        }
    }

    fn circle(radius: f32, points: usize) -> CatmullRomTrack {
        let points = (0..points)
            .map(|i| {
                let angle = i as f32 / points as f32 * TAU;
                Vec3::new(radius * angle.cos(), 10.0, radius * angle.sin())
            })
            .collect();
        CatmullRomTrack::new(points).unwrap()
    }

    #[test]
    fn test_slope_angle() {
        assert!(slope_angle(Vec3::X).abs() < 1e-6);
        assert!((slope_angle(Vec3::new(1.0, 1.0, 0.0).normalize()) - PI / 4.0).abs() < 1e-5);
        assert!((slope_angle(Vec3::NEG_Y) + PI / 2.0).abs() < 1e-5);
        // Slightly denormalized vertical tangent stays finite.
        assert!(slope_angle(Vec3::new(0.0, 1.0001, 0.0)).is_finite());
    }

    #[test]
    fn test_turning_angle_straight_and_capped() {
        assert!(turning_angle(Vec3::X, Vec3::NEG_X).abs() < 1e-3);
        let right_angle = turning_angle(Vec3::Z, Vec3::NEG_X);
        assert!((right_angle - MAX_CURVATURE).abs() < 1e-6);
        let small = turning_angle(Vec3::new(1.0, 0.0, 0.1), Vec3::NEG_X);
        assert!((small - 0.1_f32.atan()).abs() < 1e-4);
    }

    #[test]
    fn test_stop_pins_velocity_and_keeps_parameter() {
        let track = StraightTrack { scale: 10.0 };
        let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 1.0);
        for _ in 0..10 {
            motion.update(&track);
        }
        let parameter = motion.state().parameter;

        motion.stop();
        assert_eq!(motion.update(&track), StepOutcome::Stopped);
        assert_eq!(motion.state().velocity, 0.0);
        assert_eq!(motion.state().acceleration, 0.0);
        assert_eq!(motion.state().parameter, parameter);

        motion.start();
        assert!(motion.state().velocity >= motion.config().min_velocity);
        assert_eq!(motion.state().parameter, parameter);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let track = StraightTrack { scale: 10.0 };
        let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 1.0);
        motion.stop();
        motion.stop();
        assert_eq!(motion.mode(), SimulationMode::Stopped);
        motion.start();
        let velocity = motion.state().velocity;
        motion.start();
        assert_eq!(motion.state().velocity, velocity);
        assert_eq!(motion.mode(), SimulationMode::Moving);
    }

    #[test]
    fn test_straight_flat_track_decelerates_to_floor() {
        let track = StraightTrack { scale: 10.0 };
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 1.0);
        motion.state.velocity = config.max_velocity;

        let outcome = motion.update(&track);
        assert_eq!(outcome, StepOutcome::Advanced);
        assert!((motion.state().acceleration + config.friction).abs() < 1e-9);
        assert!(motion.state().curvature < 1e-3);

        for _ in 0..20_000 {
            motion.update(&track);
        }
        assert!((motion.state().velocity - config.min_velocity).abs() < 1e-12);
    }

    #[test]
    fn test_circle_converges_to_min_velocity_and_steady_bank() {
        let track = circle(40.0, 16);
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 0.0);
        motion.state.velocity = config.max_velocity;

        for _ in 0..20_000 {
            motion.update(&track);
        }
        let state = motion.state();
        assert!((state.velocity - config.min_velocity).abs() < 1e-12);

        // One lookahead step covers Δ of the full turn.
        #[allow(clippy::cast_possible_truncation)]
        let expected_curvature = TAU * config.lookahead as f32;
        assert!(
            (state.curvature - expected_curvature).abs() < 0.05,
            "curvature {}",
            state.curvature
        );
        let expected_bank = (state.curvature * BANK_GAIN).min(MAX_BANK);
        assert!((state.bank - expected_bank).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_geometry_advances_without_physics() {
        let track = CollapsedTrack;
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 0.5);
        motion.state.velocity = 1.0;
        let orientation = motion.state().orientation;

        assert_eq!(motion.update(&track), StepOutcome::DegenerateFallback);
        let state = motion.state();
        assert_eq!(state.velocity, config.max_velocity);
        assert!((state.parameter - (0.5 + config.max_velocity)).abs() < 1e-12);
        assert_eq!(Some(state.position), track.point_at(state.parameter));
        assert_eq!(state.orientation, orientation);
    }

    #[test]
    fn test_degenerate_fallback_rejects_non_finite_position() {
        let track = CliffTrack;
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 0.599);
        motion.state.velocity = 0.002;
        let position = motion.state().position;

        assert_eq!(motion.update(&track), StepOutcome::Faulted);
        let state = motion.state();
        assert_eq!(state.position, position);
        assert!((state.parameter - 0.599).abs() < 1e-12);
        assert_eq!(state.velocity, config.min_velocity);

        // Later frames keep failing but never commit the NaN.
        for _ in 0..60 {
            motion.update(&track);
            assert!(motion.state().position.is_finite());
        }
    }

    #[test]
    fn test_first_frame_trailing_chord_clamp() {
        // At t = 0 the trailing chord collapses onto the cart's own position,
        // so the first frame always takes the fallback.
        let track = StraightTrack { scale: 10.0 };
        let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 0.0);
        assert_eq!(motion.update(&track), StepOutcome::DegenerateFallback);
        assert_eq!(motion.update(&track), StepOutcome::Advanced);
    }

    #[test]
    fn test_runaway_jump_is_interpolated() {
        let track = StraightTrack { scale: 100_000.0 };
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 1.0);
        let old_position = motion.state().position;
        let old_velocity = 0.001;
        motion.state.velocity = old_velocity;

        assert_eq!(motion.update(&track), StepOutcome::JumpGuarded);
        let state = motion.state();
        let rejected = track.point_at(state.parameter).unwrap();
        let expected = old_position.lerp(rejected, JUMP_INTERPOLATION);
        assert!(state.position.distance(expected) < 1e-2);
        assert!((state.velocity - old_velocity * JUMP_VELOCITY_DECAY).abs() < 1e-12);
    }

    #[test]
    fn test_jump_guard_decay_respects_velocity_floor() {
        let track = StraightTrack { scale: 100_000.0 };
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 1.0);
        motion.state.velocity = config.min_velocity;

        assert_eq!(motion.update(&track), StepOutcome::JumpGuarded);
        // 0.8 of the floor is below the floor, so the clamp wins.
        assert_eq!(motion.state().velocity, config.min_velocity);
    }

    #[test]
    fn test_unavailable_sample_leaves_state_unchanged() {
        let track = StraightTrack { scale: 10.0 };
        let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 1.0);
        let before = motion.state().clone();
        assert_eq!(motion.update(&MissingTrack), StepOutcome::Skipped);
        assert_eq!(motion.state(), &before);
    }

    #[test]
    fn test_fault_resets_velocity_and_keeps_position() {
        let track = PoisonedTrack;
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 1.0);
        motion.state.velocity = config.max_velocity;
        motion.state.acceleration = 0.5;
        let position = motion.state().position;

        assert_eq!(motion.update(&track), StepOutcome::Faulted);
        let state = motion.state();
        assert_eq!(state.velocity, config.min_velocity);
        assert_eq!(state.acceleration, 0.0);
        assert_eq!(state.position, position);
        assert_eq!(state.parameter, 1.0);
    }

    #[test]
    fn test_orientation_faces_along_track() {
        let track = StraightTrack { scale: 10.0 };
        let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 1.0);
        motion.update(&track);
        let forward = motion.state().orientation * Vec3::NEG_Z;
        assert!(forward.distance(Vec3::X) < 1e-3, "forward {forward:?}");
    }

    #[test]
    fn test_bank_rolls_orientation_on_circle() {
        let track = circle(40.0, 16);
        let config = MotionConfig::default();
        let t = 0.25;
        let mut motion = VehicleMotion::new(config.clone(), &track, t);

        let p = track.point_at(t).unwrap();
        let incoming = p - track.point_at(t - config.lookahead).unwrap();
        let outgoing = track.point_at(t + config.lookahead).unwrap() - p;
        let expected_curvature = incoming.angle_between(outgoing).min(FRAC_PI_4);

        assert_eq!(motion.update(&track), StepOutcome::Advanced);
        let state = motion.state();
        assert!((state.curvature - expected_curvature).abs() < 1e-4);
        let expected_bank = (expected_curvature * 1.2).min(FRAC_PI_6);
        assert!((state.bank - expected_bank).abs() < 1e-4);
        assert!(state.bank > 0.3);

        let look_target = track.point_at(state.parameter + config.lookahead).unwrap();
        let facing = facing_rotation(look_target - state.position, Vec3::Y).unwrap();
        let roll = (state.orientation * Vec3::Y).angle_between(facing * Vec3::Y);
        assert!((roll - state.bank).abs() < 1e-3, "roll {roll} bank {}", state.bank);
        let forward = state.orientation * Vec3::NEG_Z;
        assert!(forward.distance(facing * Vec3::NEG_Z) < 1e-4);
    }

    #[test]
    fn test_facing_rotation_vertical_direction() {
        let rotation = facing_rotation(Vec3::Y, Vec3::Y).unwrap();
        assert!(rotation.is_finite());
        assert!((rotation * Vec3::NEG_Z).distance(Vec3::Y) < 1e-5);
        assert!(facing_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_default_track_survives_many_laps() {
        let track = crate::default_track().unwrap();
        let config = MotionConfig::default();
        let mut motion = VehicleMotion::new(config.clone(), &track, 0.0);
        for _ in 0..50_000 {
            let outcome = motion.update(&track);
            assert_ne!(outcome, StepOutcome::Faulted);
            assert_ne!(outcome, StepOutcome::Skipped);
            let state = motion.state();
            assert!(state.position.is_finite());
            assert!(state.orientation.is_finite());
            assert!(state.velocity >= config.min_velocity && state.velocity <= config.max_velocity);
        }
        assert!(motion.state().parameter > 1.0);
    }

    proptest! {
        #[test]
        fn test_velocity_stays_in_range(
            velocity in -1.0f64..1.0,
            acceleration in -1e3f64..1e3,
        ) {
            let config = MotionConfig::default();
            let result = smooth_velocity(velocity, acceleration, &config);
            prop_assert!(result >= config.min_velocity && result <= config.max_velocity);
        }

        #[test]
        fn test_centripetal_damping_is_capped(
            curvature in 0.0f32..10.0,
            velocity in -100.0f64..100.0,
        ) {
            prop_assert!(centripetal_damping(curvature, velocity) <= MAX_CENTRIPETAL_DAMPING);
        }

        #[test]
        fn test_bank_angle_is_capped(curvature in -100.0f32..100.0) {
            prop_assert!(bank_angle(curvature).abs() <= MAX_BANK);
        }

        #[test]
        fn test_update_keeps_velocity_in_range(
            start in 0.0f64..1.0,
            velocity in 0.0f64..0.1,
            frames in 1usize..200,
        ) {
            let track = crate::default_track().unwrap();
            let config = MotionConfig::default();
            let mut motion = VehicleMotion::new(config.clone(), &track, start);
            motion.state.velocity = velocity;
            for _ in 0..frames {
                motion.update(&track);
                let v = motion.state().velocity;
                prop_assert!(v >= config.min_velocity && v <= config.max_velocity);
            }
        }
    }
}
