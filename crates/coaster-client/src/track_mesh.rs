//! Track visuals: rails, cross ties and support columns.
//!
//! Built once at startup by sampling the spline. The rails are closed tube
//! meshes swept along the track; ties and supports are instanced primitives
//! placed every few samples. Everything hangs off a single root entity.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use coaster_sim::{CatmullRomTrack, TrackCurve, motion::facing_rotation};

use crate::vehicle::Ride;

/// Track samples per lap.
const TRACK_SAMPLES: usize = 720;
/// Distance between rail centrelines.
const RAIL_GAUGE: f32 = 1.6;
/// Rail tube radius.
const RAIL_RADIUS: f32 = 0.12;
/// Segments around each rail tube.
const RAIL_RADIAL_SEGMENTS: usize = 8;
/// Place a cross tie every this many samples.
const TIE_SPACING: usize = 3;
/// Place a support column every this many samples.
const SUPPORT_SPACING: usize = 24;
/// Tracks lower than this need no support.
const MIN_SUPPORT_HEIGHT: f32 = 1.5;

/// Plugin that builds the track visuals.
pub struct TrackMeshPlugin;

impl Plugin for TrackMeshPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_track);
    }
}

/// Marker for the track's root entity.
#[derive(Component)]
pub struct TrackVisual;

/// Local frame of the track at one sample.
#[derive(Debug, Clone, Copy)]
pub struct RailFrame {
    /// Point on the centreline.
    pub center: Vec3,
    /// Direction of travel.
    pub tangent: Vec3,
    /// Horizontal vector to the right of travel.
    pub right: Vec3,
    /// Up vector perpendicular to tangent and right.
    pub up: Vec3,
}

/// Sample `count` evenly spaced frames around the track.
///
/// Samples without a usable position are dropped; a missing tangent falls
/// back to the chord towards the next sample.
pub fn rail_frames<T: TrackCurve + ?Sized>(track: &T, count: usize) -> Vec<RailFrame> {
    #[allow(clippy::cast_precision_loss)]
    let step = 1.0 / count.max(1) as f64;
    (0..count)
        .filter_map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 * step;
            let center = track.point_at(t)?;
            let tangent = track
                .tangent_at(t)
                .or_else(|| {
                    let next = track.point_at(t + step)?;
                    (next - center).try_normalize()
                })
                .unwrap_or(Vec3::NEG_Z);
            let right = tangent.cross(Vec3::Y).normalize_or(Vec3::X);
            let up = right.cross(tangent).normalize_or(Vec3::Y);
            Some(RailFrame {
                center,
                tangent,
                right,
                up,
            })
        })
        .collect()
}

/// Raw vertex data for a closed tube.
#[derive(Debug, Default)]
pub struct TubeGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TubeGeometry {
    /// Convert into a renderable mesh.
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_indices(Indices::U32(self.indices));
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh
    }
}

/// Sweep a circle of `radius` along a closed path.
///
/// `ups` gives the reference up vector per path point. The last ring joins
/// back to the first. Faces wind counter-clockwise seen from outside.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn closed_tube(
    path: &[Vec3],
    ups: &[Vec3],
    radius: f32,
    radial_segments: usize,
) -> TubeGeometry {
    let rings = path.len().min(ups.len());
    if rings < 3 || radial_segments < 3 {
        return TubeGeometry::default();
    }
    let ring_verts = radial_segments + 1;

    let mut geometry = TubeGeometry {
        positions: Vec::with_capacity(rings * ring_verts),
        normals: Vec::with_capacity(rings * ring_verts),
        uvs: Vec::with_capacity(rings * ring_verts),
        indices: Vec::with_capacity(rings * radial_segments * 6),
    };

    for j in 0..rings {
        let prev = path[(j + rings - 1) % rings];
        let next = path[(j + 1) % rings];
        let tangent = (next - prev).normalize_or(Vec3::X);
        let normal = (ups[j] - tangent * ups[j].dot(tangent))
            .normalize_or(tangent.any_orthonormal_vector());
        let binormal = tangent.cross(normal);

        let u = j as f32 / rings as f32;
        for i in 0..ring_verts {
            let v = i as f32 / radial_segments as f32;
            let angle = v * std::f32::consts::TAU;
            let dir = normal * angle.cos() + binormal * angle.sin();
            let p = path[j] + dir * radius;
            geometry.positions.push(p.to_array());
            geometry.normals.push(dir.to_array());
            geometry.uvs.push([u, v]);
        }
    }

    for j in 0..rings {
        let ring0 = j * ring_verts;
        let ring1 = ((j + 1) % rings) * ring_verts;
        for i in 0..radial_segments {
            let a = (ring0 + i) as u32;
            let b = (ring1 + i) as u32;
            let c = (ring1 + i + 1) as u32;
            let d = (ring0 + i + 1) as u32;
            geometry.indices.extend_from_slice(&[a, d, b, b, d, c]);
        }
    }

    geometry
}

/// Build the rail meshes for both sides of the track.
fn rail_meshes(frames: &[RailFrame]) -> [Mesh; 2] {
    let ups: Vec<Vec3> = frames.iter().map(|f| f.up).collect();
    [-0.5, 0.5].map(|side| {
        let path: Vec<Vec3> = frames
            .iter()
            .map(|f| f.center + f.right * RAIL_GAUGE * side)
            .collect();
        closed_tube(&path, &ups, RAIL_RADIUS, RAIL_RADIAL_SEGMENTS).into_mesh()
    })
}

/// Spawn the rails, ties and supports under one root entity.
fn spawn_track(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    ride: Option<Res<Ride>>,
) {
    let Some(ride) = ride else {
        tracing::warn!("No ride available, skipping track visuals");
        return;
    };
    let track: &CatmullRomTrack = &ride.track;
    let frames = rail_frames(track, TRACK_SAMPLES);

    let rail_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.15, 0.35, 0.85),
        metallic: 0.7,
        perceptual_roughness: 0.35,
        ..default()
    });
    let tie_material = materials.add(Color::srgb(0.35, 0.25, 0.18));
    let support_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.85, 0.85, 0.8),
        metallic: 0.4,
        perceptual_roughness: 0.6,
        ..default()
    });

    let rail_handles = rail_meshes(&frames).map(|mesh| meshes.add(mesh));
    let tie_mesh = meshes.add(Cuboid::new(RAIL_GAUGE + 0.4, 0.12, 0.35));
    let support_mesh = meshes.add(Cylinder::new(0.18, 1.0));

    let mut tie_count = 0;
    let mut support_count = 0;

    commands
        .spawn((TrackVisual, Transform::default(), Visibility::default()))
        .with_children(|root| {
            for handle in rail_handles {
                root.spawn((
                    Mesh3d(handle),
                    MeshMaterial3d(rail_material.clone()),
                    Transform::default(),
                ));
            }

            for frame in frames.iter().step_by(TIE_SPACING) {
                let rotation = facing_rotation(frame.tangent, frame.up).unwrap_or_default();
                root.spawn((
                    Mesh3d(tie_mesh.clone()),
                    MeshMaterial3d(tie_material.clone()),
                    Transform::from_translation(frame.center - frame.up * 0.15)
                        .with_rotation(rotation),
                ));
                tie_count += 1;
            }

            for frame in frames.iter().step_by(SUPPORT_SPACING) {
                let height = frame.center.y - 0.3;
                if height < MIN_SUPPORT_HEIGHT {
                    continue;
                }
                // Unit cylinder scaled to reach from the ground to the ties.
                root.spawn((
                    Mesh3d(support_mesh.clone()),
                    MeshMaterial3d(support_material.clone()),
                    Transform::from_xyz(frame.center.x, height / 2.0, frame.center.z)
                        .with_scale(Vec3::new(1.0, height, 1.0)),
                ));
                support_count += 1;
            }
        });

    tracing::info!(
        "Track visuals spawned: {} samples, {tie_count} ties, {support_count} supports",
        frames.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_loop() -> Vec<Vec3> {
        vec![
            Vec3::new(10.0, 5.0, 0.0),
            Vec3::new(10.0, 5.0, 10.0),
            Vec3::new(0.0, 5.0, 10.0),
            Vec3::new(-10.0, 5.0, 10.0),
            Vec3::new(-10.0, 5.0, 0.0),
            Vec3::new(-10.0, 5.0, -10.0),
            Vec3::new(0.0, 5.0, -10.0),
            Vec3::new(10.0, 5.0, -10.0),
        ]
    }

    #[test]
    fn test_closed_tube_counts() {
        let path = square_loop();
        let ups = vec![Vec3::Y; path.len()];
        let tube = closed_tube(&path, &ups, 0.5, 6);

        assert_eq!(tube.positions.len(), 8 * 7);
        assert_eq!(tube.normals.len(), tube.positions.len());
        assert_eq!(tube.uvs.len(), tube.positions.len());
        assert_eq!(tube.indices.len(), 8 * 6 * 6);
        assert!(
            tube.indices
                .iter()
                .all(|&i| (i as usize) < tube.positions.len())
        );
    }

    #[test]
    fn test_closed_tube_normals_point_outward() {
        let path = square_loop();
        let ups = vec![Vec3::Y; path.len()];
        let tube = closed_tube(&path, &ups, 0.5, 6);

        for (ring, center) in path.iter().enumerate() {
            for i in 0..7 {
                let index = ring * 7 + i;
                let position = Vec3::from_array(tube.positions[index]);
                let normal = Vec3::from_array(tube.normals[index]);
                assert!((normal.length() - 1.0).abs() < 1e-5);
                assert!((position - *center).dot(normal) > 0.0);
            }
        }

        // The first triangle's winding agrees with its vertex normal.
        let [a, b, c] =
            [0, 1, 2].map(|k| Vec3::from_array(tube.positions[tube.indices[k] as usize]));
        let face_normal = (b - a).cross(c - a);
        let vertex_normal = Vec3::from_array(tube.normals[tube.indices[0] as usize]);
        assert!(face_normal.dot(vertex_normal) > 0.0);
    }

    #[test]
    fn test_closed_tube_rejects_short_paths() {
        let tube = closed_tube(&[Vec3::ZERO, Vec3::X], &[Vec3::Y, Vec3::Y], 1.0, 6);
        assert!(tube.positions.is_empty());
        assert!(tube.indices.is_empty());
    }

    #[test]
    fn test_rail_frames_are_orthonormal() {
        let track = coaster_sim::default_track().unwrap();
        let frames = rail_frames(&track, 256);
        assert_eq!(frames.len(), 256);
        for frame in frames {
            assert!((frame.tangent.length() - 1.0).abs() < 1e-4);
            assert!((frame.right.length() - 1.0).abs() < 1e-4);
            assert!(frame.right.y.abs() < 1e-4);
            assert!(frame.tangent.dot(frame.right).abs() < 1e-4);
            assert!(frame.up.dot(frame.tangent).abs() < 1e-4);
        }
    }
}
