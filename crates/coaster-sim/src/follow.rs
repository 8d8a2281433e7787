//! Trailing camera controller.
//!
//! Chases a fixed offset from the cart with exponential smoothing. The chase
//! target is rate-limited so a sudden cart jump cannot drag the camera across
//! the scene in one frame, and the final height is kept inside a band so the
//! camera never clips the ground or flies off above the ride.

use glam::Vec3;

/// Configuration for the trailing camera.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowConfig {
    /// Camera position relative to the cart (world axes).
    pub offset: Vec3,
    /// Look-at point relative to the cart (world axes).
    pub look_offset: Vec3,
    /// Largest distance the chase target may sit from the last camera position.
    pub max_step: f32,
    /// Fraction of the remaining distance covered each frame.
    pub smoothing: f32,
    /// Lowest allowed camera height.
    pub min_height: f32,
    /// Highest allowed camera height.
    pub max_height: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(-30.0, 20.0, 30.0),
            look_offset: Vec3::new(0.0, 2.0, 0.0),
            max_step: 2.0,
            smoothing: 0.03,
            min_height: 8.0,
            max_height: 50.0,
        }
    }
}

/// Camera placement for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Camera position.
    pub position: Vec3,
    /// Point the camera looks at.
    pub look_at: Vec3,
}

/// Smoothed trailing camera state.
#[derive(Debug, Clone)]
pub struct CameraFollow {
    config: FollowConfig,
    /// Last smoothed pose; `None` until the first frame.
    last: Option<CameraPose>,
}

impl CameraFollow {
    /// Create a controller with no history.
    pub fn new(config: FollowConfig) -> Self {
        Self { config, last: None }
    }

    /// Configuration in use.
    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    /// Last pose produced, if any.
    pub fn last_pose(&self) -> Option<CameraPose> {
        self.last
    }

    /// Forget history; the next update snaps to its target.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Advance the camera by one frame towards the cart at `vehicle_position`.
    ///
    /// Returns `None`, leaving the state untouched, when the cart position is
    /// not finite.
    pub fn update(&mut self, vehicle_position: Vec3) -> Option<CameraPose> {
        if !vehicle_position.is_finite() {
            tracing::warn!("Skipping camera follow: vehicle position {vehicle_position:?}");
            return None;
        }

        let config = &self.config;
        let target = vehicle_position + config.offset;
        let look_target = vehicle_position + config.look_offset;

        let Some(last) = self.last else {
            let pose = CameraPose {
                position: target,
                look_at: look_target,
            };
            self.last = Some(pose);
            return Some(pose);
        };

        let to_target = target - last.position;
        let target = if to_target.length() > config.max_step {
            last.position + to_target.normalize() * config.max_step
        } else {
            target
        };

        let mut position = last.position.lerp(target, config.smoothing);
        position.y = position.y.clamp(config.min_height, config.max_height);
        let look_at = last.look_at.lerp(look_target, config.smoothing);

        let pose = CameraPose { position, look_at };
        self.last = Some(pose);
        Some(pose)
    }
}
