//! Trailing camera that follows the cart.
//!
//! The smoothing and rate limiting live in [`CameraFollow`]; this module
//! spawns the camera and copies each pose into its transform.

use bevy::pbr::{DistanceFog, FogFalloff};
use bevy::prelude::*;
use coaster_sim::{CameraFollow, FollowConfig};

use crate::FrameStage;
use crate::environment::SKY_COLOR;
use crate::vehicle::Ride;

/// Plugin for the trailing camera.
pub struct FollowCameraPlugin;

impl Plugin for FollowCameraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(FollowState(CameraFollow::new(FollowConfig::default())))
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, follow_cart.in_set(FrameStage::Camera));
    }
}

/// Marker for the ride camera.
#[derive(Component)]
pub struct RideCamera;

/// Follow controller state carried between frames.
#[derive(Resource)]
pub struct FollowState(pub CameraFollow);

fn spawn_camera(mut commands: Commands, ride: Option<Res<Ride>>) {
    let start = ride.map_or(Vec3::ZERO, |ride| ride.motion.state().position);
    let offset = FollowConfig::default().offset;

    commands.spawn((
        RideCamera,
        Camera3d::default(),
        Transform::from_translation(start + offset).looking_at(start, Vec3::Y),
        Projection::Perspective(PerspectiveProjection {
            fov: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 2000.0,
            ..Default::default()
        }),
        DistanceFog {
            color: SKY_COLOR,
            falloff: FogFalloff::Linear {
                start: 150.0,
                end: 600.0,
            },
            ..default()
        },
    ));
}

/// Move the camera towards its follow pose for this frame.
fn follow_cart(
    ride: Option<Res<Ride>>,
    mut follow: ResMut<FollowState>,
    mut camera_query: Query<&mut Transform, With<RideCamera>>,
) {
    let Some(ride) = ride else {
        return;
    };
    let Some(pose) = follow.0.update(ride.motion.state().position) else {
        return;
    };
    let Ok(mut transform) = camera_query.single_mut() else {
        return;
    };
    *transform = Transform::from_translation(pose.position).looking_at(pose.look_at, Vec3::Y);
}
