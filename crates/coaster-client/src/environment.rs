//! Scenery around the ride: ground, lights, trees, a station and clouds.
//!
//! Everything except the clouds is static. Clouds drift along +X by
//! wall-clock time and wrap around a window centred on the cart.

use bevy::prelude::*;
use coaster_sim::{CatmullRomTrack, TrackCurve};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use web_time::Instant;

use crate::FrameStage;
use crate::launch_params::LaunchParams;
use crate::vehicle::Ride;

/// Sky colour, shared with the camera fog.
pub const SKY_COLOR: Color = Color::srgb(0.53, 0.75, 0.95);

/// Side length of the ground plane.
const GROUND_SIZE: f32 = 800.0;
/// Trees are scattered within this distance of the origin.
const TREE_RANGE: f32 = 180.0;
/// Number of trees to place.
const TREE_COUNT: usize = 70;
/// Trees keep at least this horizontal distance from the track.
const TREE_CLEARANCE: f32 = 10.0;
/// Track samples used when checking tree clearance.
const CLEARANCE_SAMPLES: usize = 256;
/// Number of clouds.
const CLOUD_COUNT: usize = 16;
/// Clouds wrap within this distance of the cart along X.
const CLOUD_HALF_EXTENT: f32 = 300.0;

/// Plugin for the static scenery and drifting clouds.
pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(SKY_COLOR))
            .init_resource::<EnvironmentClock>()
            .add_systems(Startup, (spawn_ground_and_lights, spawn_scenery))
            .add_systems(Update, drift_clouds.in_set(FrameStage::Environment));
    }
}

// ============================================================================
// Components and resources
// ============================================================================

/// A drifting cloud.
#[derive(Component)]
pub struct Cloud {
    /// Drift speed along +X in metres per second.
    pub speed: f32,
}

/// Marker for a tree root.
#[derive(Component)]
pub struct Tree;

/// Wall-clock time of the previous cloud update.
///
/// Unset until the first update, which drifts nothing.
#[derive(Resource, Default)]
struct EnvironmentClock {
    last: Option<Instant>,
}

// ============================================================================
// Setup
// ============================================================================

fn spawn_ground_and_lights(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.3, 0.55, 0.25),
            perceptual_roughness: 0.95,
            ..default()
        })),
        Transform::default(),
    ));

    // Sun.
    commands.spawn((
        DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(80.0, 150.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Fill.
    commands.spawn((
        DirectionalLight {
            illuminance: 2_500.0,
            shadows_enabled: false,
            color: Color::srgb(0.75, 0.85, 1.0),
            ..default()
        },
        Transform::from_xyz(-60.0, 40.0, -80.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn spawn_scenery(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    params: Res<LaunchParams>,
    ride: Option<Res<Ride>>,
) {
    let mut rng = SmallRng::seed_from_u64(params.seed);

    let obstacles = ride
        .as_ref()
        .map(|ride| track_footprint(&ride.track))
        .unwrap_or_default();

    // Station platform beside the first control point.
    if let Some(ride) = &ride
        && let Some(&station) = ride.track.control_points().first()
    {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(24.0, station.y, 4.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.6, 0.58, 0.55))),
            Transform::from_xyz(station.x + 12.0, station.y / 2.0, station.z + 3.5),
        ));
    }

    let trunk_mesh = meshes.add(Cylinder::new(0.35, 3.0));
    let canopy_mesh = meshes.add(Sphere::new(2.2));
    let trunk_material = materials.add(Color::srgb(0.4, 0.27, 0.15));
    let canopy_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.15, 0.45, 0.18),
        perceptual_roughness: 0.9,
        ..default()
    });

    let mut placed = 0;
    for _ in 0..TREE_COUNT * 4 {
        if placed == TREE_COUNT {
            break;
        }
        let position = Vec2::new(
            rng.random_range(-TREE_RANGE..TREE_RANGE),
            rng.random_range(-TREE_RANGE..TREE_RANGE),
        );
        if obstacles
            .iter()
            .any(|p| p.distance(position) < TREE_CLEARANCE)
        {
            continue;
        }
        let scale = rng.random_range(0.7..1.5);
        commands
            .spawn((
                Tree,
                Transform::from_xyz(position.x, 0.0, position.y).with_scale(Vec3::splat(scale)),
                Visibility::default(),
            ))
            .with_children(|tree| {
                tree.spawn((
                    Mesh3d(trunk_mesh.clone()),
                    MeshMaterial3d(trunk_material.clone()),
                    Transform::from_xyz(0.0, 1.5, 0.0),
                ));
                tree.spawn((
                    Mesh3d(canopy_mesh.clone()),
                    MeshMaterial3d(canopy_material.clone()),
                    Transform::from_xyz(0.0, 4.2, 0.0),
                ));
            });
        placed += 1;
    }

    let puff_mesh = meshes.add(Sphere::new(1.0));
    let cloud_material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.9),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    for _ in 0..CLOUD_COUNT {
        let origin = Vec3::new(
            rng.random_range(-CLOUD_HALF_EXTENT..CLOUD_HALF_EXTENT),
            rng.random_range(70.0..110.0),
            rng.random_range(-250.0..250.0),
        );
        let speed = rng.random_range(1.5..4.0);
        let puffs: Vec<(Vec3, f32)> = (0..rng.random_range(3..6))
            .map(|_| {
                (
                    Vec3::new(
                        rng.random_range(-8.0..8.0),
                        rng.random_range(-1.5..1.5),
                        rng.random_range(-4.0..4.0),
                    ),
                    rng.random_range(4.0..8.0),
                )
            })
            .collect();

        commands
            .spawn((
                Cloud { speed },
                Transform::from_translation(origin),
                Visibility::default(),
            ))
            .with_children(|cloud| {
                for (offset, radius) in puffs {
                    cloud.spawn((
                        Mesh3d(puff_mesh.clone()),
                        MeshMaterial3d(cloud_material.clone()),
                        Transform::from_translation(offset).with_scale(Vec3::new(
                            radius * 1.4,
                            radius * 0.6,
                            radius,
                        )),
                    ));
                }
            });
    }

    tracing::info!("Scenery spawned: {placed} trees, {CLOUD_COUNT} clouds");
}

/// Horizontal footprint of the track as sample points on the XZ plane.
#[allow(clippy::cast_precision_loss)]
fn track_footprint(track: &CatmullRomTrack) -> Vec<Vec2> {
    (0..CLEARANCE_SAMPLES)
        .filter_map(|i| track.point_at(i as f64 / CLEARANCE_SAMPLES as f64))
        .map(|p| Vec2::new(p.x, p.z))
        .collect()
}

// ============================================================================
// Cloud drift
// ============================================================================

/// Move `x` by `distance` and wrap it into `[center - half_extent, center + half_extent)`.
///
/// Non-finite input or an empty window leaves `x` unchanged.
pub fn drift(x: f32, distance: f32, center: f32, half_extent: f32) -> f32 {
    let moved = x + distance;
    if !moved.is_finite() || !center.is_finite() || half_extent.is_nan() || half_extent <= 0.0 {
        return x;
    }
    let relative = moved - center;
    center + (relative + half_extent).rem_euclid(2.0 * half_extent) - half_extent
}

fn drift_clouds(
    mut clock: ResMut<EnvironmentClock>,
    ride: Option<Res<Ride>>,
    mut clouds: Query<(&Cloud, &mut Transform)>,
) {
    let now = Instant::now();
    let elapsed = clock
        .last
        .replace(now)
        .map_or(0.0, |last| now.duration_since(last).as_secs_f32());

    let center = ride.map_or(0.0, |ride| ride.motion.state().position.x);
    for (cloud, mut transform) in &mut clouds {
        transform.translation.x = drift(
            transform.translation.x,
            cloud.speed * elapsed,
            center,
            CLOUD_HALF_EXTENT,
        );
    }
}
