//! Deterministic point-cloud generators shared by the test suite, the
//! benchmark and the fuzz target (the latter two through the
//! `test-util` feature).

use std::f64::consts::TAU;

use glam::{DQuat, DVec3};

/// Points of a latitude/longitude sweep of the unit sphere: the unit y
/// vector pitched around x in `divisions` steps, each pitch swung
/// around z in `divisions` steps.
///
/// Adjacent steps of the sweep produce clusters of nearly coincident
/// and nearly coplanar points, which makes it a good stress input for
/// tolerance-based claiming and merging. Scaling each direction by an
/// arbitrary radius yields the sea-urchin clouds the benchmark and fuzz
/// target build on.
pub fn sphere(divisions: usize) -> Vec<DVec3> {
    let mut points = Vec::with_capacity(divisions * divisions);
    for pitch_step in 0..divisions {
        let pitch = DQuat::from_rotation_x(TAU * pitch_step as f64 / divisions as f64);
        let meridian = pitch * DVec3::Y;
        for swing_step in 0..divisions {
            let swing = DQuat::from_rotation_z(TAU * swing_step as f64 / divisions as f64);
            points.push(swing * meridian);
        }
    }
    points
}
