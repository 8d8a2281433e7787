//! Ride simulation for the coaster viewer.
//!
//! This crate contains everything about the ride that is independent of
//! rendering: the closed spline the cart runs on, the per-frame motion model,
//! the trailing camera controller and the telemetry derived from the cart.
//!
//! # Design principles
//!
//! - **Frame-driven**: every update advances exactly one display tick; there
//!   is no internal clock or thread
//! - **Fault-absorbing**: a bad frame never propagates; the motion model
//!   skips, falls back or resets instead of panicking
//! - **Renderer-agnostic**: only `glam` types cross the API, so the client
//!   (or a headless binary) decides how to present the results
//!
//! # Example
//!
//! ```
//! use coaster_sim::{CameraFollow, FollowConfig, MotionConfig, VehicleMotion, default_track};
//!
//! let track = default_track().unwrap();
//! let mut motion = VehicleMotion::new(MotionConfig::default(), &track, 0.0);
//! let mut camera = CameraFollow::new(FollowConfig::default());
//!
//! for _ in 0..120 {
//!     motion.update(&track);
//!     camera.update(motion.state().position);
//! }
//! assert!(motion.state().parameter > 0.0);
//! ```

mod error;
pub mod follow;
pub mod layout;
pub mod motion;
pub mod telemetry;
pub mod track;

pub use error::{MotionError, Result, TrackError};
pub use follow::{CameraFollow, CameraPose, FollowConfig};
pub use layout::{default_layout, default_track};
pub use motion::{MotionConfig, SimulationMode, StepOutcome, VehicleMotion, VehicleState};
pub use telemetry::TelemetrySnapshot;
pub use track::{CatmullRomTrack, TrackCurve, wrap_parameter};
