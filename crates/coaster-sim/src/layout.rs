//! The ride's fixed track layout.

use glam::Vec3;

use crate::{CatmullRomTrack, Result};

/// Control points of the default ride, in travel order.
///
/// Station straight, lift hill, first drop, a sweeping turn, two camel-back
/// hills and a turnaround back into the station. The lowest point sits above
/// the ground plane at `y = 0`.
const DEFAULT_LAYOUT: [[f32; 3]; 18] = [
    // Station.
    [-50.0, 4.0, 40.0],
    [-25.0, 4.0, 40.0],
    // Lift hill.
    [0.0, 12.0, 40.0],
    [22.0, 26.0, 40.0],
    [40.0, 38.0, 40.0],
    [52.0, 42.0, 36.0],
    // First drop.
    [62.0, 30.0, 28.0],
    [68.0, 10.0, 14.0],
    [70.0, 6.0, -4.0],
    // Far turn.
    [62.0, 10.0, -22.0],
    [45.0, 16.0, -34.0],
    // Camel-backs.
    [25.0, 28.0, -38.0],
    [5.0, 12.0, -40.0],
    [-15.0, 22.0, -38.0],
    // Turnaround.
    [-38.0, 12.0, -30.0],
    [-56.0, 8.0, -12.0],
    [-64.0, 6.0, 10.0],
    [-62.0, 5.0, 30.0],
];

/// Control points of the default ride.
pub fn default_layout() -> Vec<Vec3> {
    DEFAULT_LAYOUT.iter().copied().map(Vec3::from_array).collect()
}

/// Build the default ride track.
pub fn default_track() -> Result<CatmullRomTrack> {
    CatmullRomTrack::new(default_layout())
}
