//! Fibonacci-lattice sampling of a sphere surface.

use std::f64::consts::PI;

use glam::DVec3;

use crate::{config::validate_radius, error::ConfigError};

/// Returns `count` near-uniformly spread points on a sphere of `radius`.
///
/// Point `i` sits at height `y = 1 - 2i/(count-1)` (from the north pole
/// down to the south pole) and is rotated by `i` golden angles around the
/// y-axis. The output is deterministic for a given `(count, radius)`.
///
/// A single requested point is placed at the north pole `(0, radius, 0)`.
///
/// ### Errors
/// - [`ConfigError::SampleCount`] if `count == 0`.
/// - [`ConfigError::SphereRadius`] if `radius` is not finite and positive.
pub fn fibonacci_sphere(count: usize, radius: f64) -> Result<Vec<DVec3>, ConfigError> {
    if count == 0 {
        return Err(ConfigError::SampleCount);
    }
    validate_radius(radius)?;

    Ok(lattice_points(count, radius))
}

/// Unchecked lattice; callers guarantee `count >= 1` and a valid radius.
pub(crate) fn lattice_points(count: usize, radius: f64) -> Vec<DVec3> {
    if count == 1 {
        return vec![DVec3::new(0.0, radius, 0.0)];
    }

    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let last = (count - 1) as f64;

    (0..count)
        .map(|i| {
            let y = 1.0 - (i as f64 / last) * 2.0;
            // `1 - y*y` can round just below zero at the poles.
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            DVec3::new(theta.cos() * r, y, theta.sin() * r) * radius
        })
        .collect()
}
