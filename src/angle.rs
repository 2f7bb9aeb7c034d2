//! Angle utilities shared by projection geometry and road intersections.

use std::f64::consts::{FRAC_PI_2, PI};

/// Computes the smallest unsigned angular difference between two
/// orientations, treating antipodal directions as equivalent (π apart → 0).
#[inline]
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs().rem_euclid(PI);
    if diff > FRAC_PI_2 {
        PI - diff
    } else {
        diff
    }
}

/// Unit vector `(cos θ, sin θ)` of the coordinate axis measured by a projection.
#[inline]
pub fn axis(angle: f64) -> [f64; 2] {
    let (s, c) = angle.sin_cos();
    [c, s]
}

/// Converts degrees given in configuration files to radians.
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}
