#![no_main]

use glam::DVec3;
use hull3d::{cloud, ConvexHull};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|array: [f64; 14]| {
    if array.iter().any(|num| num.is_nan() || num.is_subnormal() || *num < 13e-27 || *num > 7e27) {
        return;
    }

    // A spherical sweep scaled by radii cycled from the fuzz words.
    let points: Vec<DVec3> = cloud::sphere(20)
        .into_iter()
        .enumerate()
        .map(|(i, direction)| direction * array[i % 14])
        .collect();
    let hull = ConvexHull::try_new(&points).unwrap();
    assert!(hull.volume() >= 0.0);

    // Tiny clouds assembled straight from the fuzz words may be
    // degenerate in every way; they only have to fail cleanly.
    let points = array
        .windows(3)
        .map(|window| DVec3::new(window[0], window[1], window[2]))
        .collect::<Vec<_>>();
    let _ = ConvexHull::try_new(&points);
});
