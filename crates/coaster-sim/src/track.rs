//! Closed spline track.
//!
//! The track is a looping Catmull-Rom spline through a fixed list of control
//! points. Every query takes an unbounded curve parameter and wraps it modulo
//! one, so callers may probe `t + Δ` and `t - Δ` without clamping first.

use glam::Vec3;

use crate::error::{Result, TrackError};

/// Minimum number of control points for a closed spline.
pub const MIN_CONTROL_POINTS: usize = 4;

/// Default Catmull-Rom tension (0.5 is the uniform Catmull-Rom spline).
pub const DEFAULT_TENSION: f32 = 0.5;

/// Derivatives shorter than this are treated as having no direction.
const MIN_DERIVATIVE_LENGTH: f32 = 1e-6;

/// A closed curve that can be sampled by normalized parameter.
///
/// Both queries return `None` when no usable sample exists (for example a
/// non-finite parameter, or a tangent on a stretch of coincident points).
pub trait TrackCurve {
    /// Position on the curve at parameter `t mod 1`.
    fn point_at(&self, t: f64) -> Option<Vec3>;

    /// Unit direction of travel at parameter `t mod 1`.
    fn tangent_at(&self, t: f64) -> Option<Vec3>;
}

/// Wrap an unbounded curve parameter into `[0, 1)`.
///
/// Returns `None` for NaN or infinite input.
pub fn wrap_parameter(t: f64) -> Option<f64> {
    if !t.is_finite() {
        return None;
    }
    let wrapped = t.rem_euclid(1.0);
    // `rem_euclid` rounds tiny negative inputs up to exactly 1.0.
    Some(if wrapped >= 1.0 { 0.0 } else { wrapped })
}

/// Closed Catmull-Rom spline through a fixed set of control points.
///
/// Each control point owns an equal share of the parameter range, so
/// `t = i / n` lands exactly on control point `i`.
#[derive(Debug, Clone)]
pub struct CatmullRomTrack {
    points: Vec<Vec3>,
    tension: f32,
}

impl CatmullRomTrack {
    /// Build a closed track with the default tension.
    pub fn new(points: Vec<Vec3>) -> Result<Self> {
        Self::with_tension(points, DEFAULT_TENSION)
    }

    /// Build a closed track with an explicit tension.
    pub fn with_tension(points: Vec<Vec3>, tension: f32) -> Result<Self> {
        if points.len() < MIN_CONTROL_POINTS {
            return Err(TrackError::TooFewPoints {
                count: points.len(),
                required: MIN_CONTROL_POINTS,
            });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(TrackError::NonFinitePoint { index });
        }

        tracing::debug!(
            "Built closed track with {} control points (tension {tension})",
            points.len()
        );

        Ok(Self { points, tension })
    }

    /// The control points the spline interpolates.
    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    /// Approximate arc length by summing chords between `samples` points.
    pub fn approximate_length(&self, samples: usize) -> f32 {
        let samples = samples.max(MIN_CONTROL_POINTS);
        let points = self.sample(samples);
        points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(a, b)| a.distance(*b))
            .sum()
    }

    /// Evenly spaced positions over one lap, starting at `t = 0`.
    ///
    /// The closing point (`t = 1`) is not repeated.
    pub fn sample(&self, count: usize) -> Vec<Vec3> {
        #[allow(clippy::cast_precision_loss)]
        let step = 1.0 / count.max(1) as f64;
        (0..count)
            .filter_map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 * step;
                self.point_at(t)
            })
            .collect()
    }

    /// Locate the segment for a parameter.
    ///
    /// Returns the four neighbouring control points and the local parameter
    /// within the segment.
    fn segment(&self, t: f64) -> Option<([Vec3; 4], f32)> {
        let u = wrap_parameter(t)?;
        let n = self.points.len();

        #[allow(clippy::cast_precision_loss)]
        let scaled = u * n as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (scaled.floor() as usize).min(n - 1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let local = (scaled - index as f64) as f32;

        let p = |offset: usize| self.points[(index + offset) % n];
        Some(([p(n - 1), p(0), p(1), p(2)], local))
    }
}

impl TrackCurve for CatmullRomTrack {
    fn point_at(&self, t: f64) -> Option<Vec3> {
        let ([p0, p1, p2, p3], s) = self.segment(t)?;
        let point = hermite_point(p0, p1, p2, p3, s, self.tension);
        point.is_finite().then_some(point)
    }

    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        let ([p0, p1, p2, p3], s) = self.segment(t)?;
        let derivative = hermite_derivative(p0, p1, p2, p3, s, self.tension);
        if !derivative.is_finite() || derivative.length() < MIN_DERIVATIVE_LENGTH {
            return None;
        }
        Some(derivative.normalize())
    }
}

/// Catmull-Rom position in cubic Hermite form.
fn hermite_point(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, s: f32, tension: f32) -> Vec3 {
    let m1 = (p2 - p0) * tension;
    let m2 = (p3 - p1) * tension;

    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    p1 * h00 + m1 * h10 + p2 * h01 + m2 * h11
}

/// Derivative of [`hermite_point`] with respect to the local parameter.
fn hermite_derivative(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, s: f32, tension: f32) -> Vec3 {
    let m1 = (p2 - p0) * tension;
    let m2 = (p3 - p1) * tension;

    let s2 = s * s;

    let d00 = 6.0 * s2 - 6.0 * s;
    let d10 = 3.0 * s2 - 4.0 * s + 1.0;
    let d01 = -6.0 * s2 + 6.0 * s;
    let d11 = 3.0 * s2 - 2.0 * s;

    p1 * d00 + m1 * d10 + p2 * d01 + m2 * d11
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square() -> CatmullRomTrack {
        CatmullRomTrack::new(vec![
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(-10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -10.0),
        ])
        .unwrap()
    }

    fn assert_close(a: Vec3, b: Vec3, tolerance: f32) {
        assert!(
            a.distance(b) <= tolerance,
            "{a:?} and {b:?} differ by more than {tolerance}"
        );
    }

    #[test]
    fn test_rejects_too_few_points() {
        let result = CatmullRomTrack::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(
            result.unwrap_err(),
            TrackError::TooFewPoints {
                count: 3,
                required: MIN_CONTROL_POINTS
            }
        );
    }

    #[test]
    fn test_rejects_non_finite_point() {
        let result = CatmullRomTrack::new(vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::Z,
        ]);
        assert_eq!(result.unwrap_err(), TrackError::NonFinitePoint { index: 2 });
    }

    #[test]
    fn test_passes_through_control_points() {
        let track = square();
        for (i, expected) in track.control_points().iter().enumerate() {
            let t = i as f64 / 4.0;
            assert_close(track.point_at(t).unwrap(), *expected, 1e-5);
        }
    }

    #[test]
    fn test_wrap_parameter() {
        assert_eq!(wrap_parameter(0.25), Some(0.25));
        assert_eq!(wrap_parameter(1.25), Some(0.25));
        assert_eq!(wrap_parameter(-0.75), Some(0.25));
        assert_eq!(wrap_parameter(-1e-20), Some(0.0));
        assert_eq!(wrap_parameter(f64::NAN), None);
        assert_eq!(wrap_parameter(f64::INFINITY), None);
    }

    #[test]
    fn test_non_finite_parameter_is_unavailable() {
        let track = square();
        assert!(track.point_at(f64::NAN).is_none());
        assert!(track.tangent_at(f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn test_tangent_follows_direction_of_travel() {
        let track = square();
        // At the first control point the curve heads towards the second,
        // i.e. in the +Z direction.
        let tangent = track.tangent_at(0.0).unwrap();
        assert!((tangent.length() - 1.0).abs() < 1e-5);
        assert!(tangent.z > 0.9, "unexpected tangent {tangent:?}");
    }

    #[test]
    fn test_tangent_unavailable_on_coincident_points() {
        let track = CatmullRomTrack::new(vec![Vec3::ONE; 4]).unwrap();
        assert_close(track.point_at(0.3).unwrap(), Vec3::ONE, 1e-5);
        assert!(track.tangent_at(0.3).is_none());
    }

    #[test]
    fn test_approximate_length_of_square_loop() {
        // The spline bulges slightly past the inscribed square but stays
        // inside the circumscribing circle.
        let length = square().approximate_length(512);
        let square_perimeter = 4.0 * 200.0_f32.sqrt();
        let circle = std::f32::consts::TAU * 10.0;
        assert!(length > square_perimeter && length < circle + 1.0, "{length}");
    }

    #[test]
    fn test_sample_count() {
        let track = square();
        let samples = track.sample(64);
        assert_eq!(samples.len(), 64);
        assert_close(samples[0], track.control_points()[0], 1e-5);
    }

    proptest! {
        #[test]
        fn test_point_at_is_periodic(t in -10.0f64..10.0) {
            let track = square();
            let p = track.point_at(t).unwrap();
            prop_assert!(p.distance(track.point_at(t + 1.0).unwrap()) < 1e-3);
            prop_assert!(p.distance(track.point_at(t - 1.0).unwrap()) < 1e-3);
        }

        #[test]
        fn test_tangent_is_unit_length(t in -10.0f64..10.0) {
            let tangent = square().tangent_at(t).unwrap();
            prop_assert!((tangent.length() - 1.0).abs() < 1e-4);
        }
    }
}
