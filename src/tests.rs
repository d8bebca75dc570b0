use super::*;

use std::collections::{BTreeMap, BTreeSet};

use approx::assert_relative_eq;
use glam::DVec3;
use rand::prelude::{Distribution, SeedableRng, SliceRandom};
use rand::{rngs::StdRng, Rng};

fn sorted(face: &[usize]) -> Vec<usize> {
    let mut face = face.to_vec();
    face.sort_unstable();
    face
}

fn face_sets(hull: &ConvexHull) -> BTreeSet<Vec<usize>> {
    hull.faces().iter().map(|face| sorted(face)).collect()
}

fn used_indices(hull: &ConvexHull) -> BTreeSet<usize> {
    hull.faces().iter().flatten().copied().collect()
}

/// Unit normal of a face loop by Newell accumulation; consistent with
/// the builder's counterclockwise-from-outside winding.
fn face_normal(points: &[DVec3], face: &[usize]) -> DVec3 {
    let mut normal = DVec3::ZERO;
    for k in 0..face.len() {
        let a = points[face[k]];
        let b = points[face[(k + 1) % face.len()]];
        normal += DVec3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        );
    }
    normal.normalize()
}

fn face_centroid(points: &[DVec3], face: &[usize]) -> DVec3 {
    face.iter().fold(DVec3::ZERO, |acc, &i| acc + points[i]) / face.len() as f64
}

fn cube_corners() -> Vec<DVec3> {
    let mut corners = Vec::with_capacity(8);
    for x in 0..2 {
        for y in 0..2 {
            for z in 0..2 {
                corners.push(DVec3::new(x as f64, y as f64, z as f64));
            }
        }
    }
    corners
}

/// Checks the quantified hull invariants on the polygonal (untriangulated)
/// hull of `points`: containment, extremes on the hull, a closed paired
/// edge structure, the Euler relation, convexity across shared edges and
/// outward orientation.
fn assert_hull_properties(points: &[DVec3]) {
    let hull = QuickHull::new(points)
        .unwrap()
        .skip_triangulation(true)
        .build()
        .unwrap();
    let slack = 10.0 * hull.tolerance();
    let pts = hull.points();

    // Containment: no input point lies meaningfully outside any face.
    for face in hull.faces() {
        let normal = face_normal(pts, face);
        let offset = normal.dot(pts[face[0]]);
        for point in pts {
            assert!(
                normal.dot(*point) - offset <= slack,
                "point {point} outside face {face:?}"
            );
        }
    }

    // Extremes: the min and max along each axis are attained on the hull
    // (up to the slack, for extreme points absorbed as on-plane).
    let used = used_indices(&hull);
    for axis in 0..3 {
        let min = pts.iter().map(|p| p[axis]).fold(f64::INFINITY, f64::min);
        let max = pts.iter().map(|p| p[axis]).fold(f64::NEG_INFINITY, f64::max);
        assert!(used.iter().any(|&i| pts[i][axis] <= min + slack));
        assert!(used.iter().any(|&i| pts[i][axis] >= max - slack));
    }

    // Closedness: every directed edge appears once, with its reverse in
    // exactly one other face.
    let mut directed: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for (face_index, face) in hull.faces().iter().enumerate() {
        for k in 0..face.len() {
            let a = face[k];
            let b = face[(k + 1) % face.len()];
            assert!(
                directed.insert((a, b), face_index).is_none(),
                "directed edge ({a}, {b}) emitted twice"
            );
        }
    }
    for &(a, b) in directed.keys() {
        assert!(directed.contains_key(&(b, a)), "edge ({a}, {b}) is unpaired");
    }

    // Euler relation for a mesh homeomorphic to a sphere.
    let v = used.len();
    let e = directed.len() / 2;
    let f = hull.faces().len();
    assert_eq!(v + f, e + 2, "V - E + F != 2");

    // Convexity: across every shared edge, the neighbor's centroid does
    // not rise above this face's plane.
    for (&(a, b), &face_index) in &directed {
        let face = &hull.faces()[face_index];
        let normal = face_normal(pts, face);
        let offset = normal.dot(pts[face[0]]);
        let neighbor = &hull.faces()[directed[&(b, a)]];
        let centroid = face_centroid(pts, neighbor);
        assert!(normal.dot(centroid) - offset <= slack, "reflex edge ({a}, {b})");
    }

    // Orientation: normals point away from the hull's centroid.
    let hull_centroid =
        used.iter().fold(DVec3::ZERO, |acc, &i| acc + pts[i]) / used.len() as f64;
    for face in hull.faces() {
        let normal = face_normal(pts, face);
        let centroid = face_centroid(pts, face);
        assert!(normal.dot(centroid - hull_centroid) > 0.0, "inward-facing normal");
    }
}

#[test]
fn tetrahedron_faces_are_exact() {
    let points = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
    ];
    let hull = ConvexHull::try_new(&points).unwrap();
    let expected: BTreeSet<Vec<usize>> =
        [vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]]
            .into_iter()
            .collect();
    assert_eq!(face_sets(&hull), expected);
}

#[test]
fn cube_triangulates_to_twelve_faces() {
    let points = cube_corners();
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_eq!(hull.faces().len(), 12);
    assert!(hull.faces().iter().all(|face| face.len() == 3));
    assert_eq!(used_indices(&hull).len(), 8);

    // Six distinct face planes.
    let planes: BTreeSet<[i64; 3]> = hull
        .faces()
        .iter()
        .map(|face| face_normal(&points, face).to_array().map(|c| (c * 1.0e9).round() as i64))
        .collect();
    assert_eq!(planes.len(), 6);
}

#[test]
fn cube_merges_to_six_quads() {
    let hull = QuickHull::new(&cube_corners())
        .unwrap()
        .skip_triangulation(true)
        .build()
        .unwrap();
    assert_eq!(hull.faces().len(), 6);
    assert!(hull.faces().iter().all(|face| face.len() == 4));
    assert_hull_properties(&cube_corners());
}

#[test]
fn interior_point_is_never_emitted() {
    let mut points = cube_corners();
    points.push(DVec3::splat(0.5));
    let hull = ConvexHull::try_new(&points).unwrap();
    let cube_hull = ConvexHull::try_new(&cube_corners()).unwrap();

    assert!(!used_indices(&hull).contains(&8));
    assert_eq!(face_sets(&hull), face_sets(&cube_hull));
}

#[test]
fn coplanar_base_merges_to_square() {
    let points = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.5, 0.5, 1.0),
    ];
    let hull = QuickHull::new(&points)
        .unwrap()
        .skip_triangulation(true)
        .build()
        .unwrap();
    assert_eq!(hull.faces().len(), 5);

    let base = hull.faces().iter().find(|face| face.len() == 4).unwrap();
    assert_eq!(sorted(base), vec![0, 1, 2, 3]);
    let sides = hull.faces().iter().filter(|face| face.len() == 3);
    assert!(sides.clone().count() == 4 && sides.clone().all(|face| face.contains(&4)));
}

#[test]
fn coplanar_base_triangles_share_a_plane() {
    let points = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (1.0, 1.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.5, 0.5, 1.0),
    ];
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_eq!(hull.faces().len(), 6);

    let pts = hull.points();
    let base_normals: Vec<DVec3> = hull
        .faces()
        .iter()
        .filter(|face| !face.contains(&4))
        .map(|face| face_normal(pts, face))
        .collect();
    assert_eq!(base_normals.len(), 2);
    assert!((base_normals[0] - base_normals[1]).length() < 1.0e-12);
    assert!((base_normals[0] - DVec3::NEG_Z).length() < 1.0e-12);
}

#[test]
fn repeated_point_keeps_tetrahedron() {
    let points = [
        (0.0, 0.0, 0.0),
        (1.0, 0.0, 0.0),
        (0.0, 1.0, 0.0),
        (0.0, 0.0, 1.0),
        (0.0, 0.0, 0.0),
    ];
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_eq!(hull.faces().len(), 4);

    // Only one of the duplicate pair makes it onto the hull.
    let used = used_indices(&hull);
    assert_eq!(used.len(), 4);
    assert!(!(used.contains(&0) && used.contains(&4)));

    // Collapsing the duplicate index recovers the plain tetrahedron.
    let expected: BTreeSet<Vec<usize>> =
        [vec![0, 1, 2], vec![0, 1, 3], vec![0, 2, 3], vec![1, 2, 3]]
            .into_iter()
            .collect();
    let collapsed: BTreeSet<Vec<usize>> = hull
        .faces()
        .iter()
        .map(|face| sorted(&face.iter().map(|&i| if i == 4 { 0 } else { i }).collect::<Vec<_>>()))
        .collect();
    assert_eq!(collapsed, expected);
}

#[test]
fn too_few_points_are_rejected() {
    assert_eq!(
        ConvexHull::try_new::<DVec3>(&[]).unwrap_err(),
        HullError::TooFewPoints(0)
    );
    let points = [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)];
    assert_eq!(
        ConvexHull::try_new(&points).unwrap_err(),
        HullError::TooFewPoints(3)
    );
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let points = [
        DVec3::ZERO,
        DVec3::X,
        DVec3::Y,
        DVec3::new(0.0, f64::NAN, 0.0),
    ];
    assert!(matches!(
        ConvexHull::try_new(&points).unwrap_err(),
        HullError::BadInput { index: 3, .. }
    ));

    let points = [
        DVec3::new(f64::INFINITY, 0.0, 0.0),
        DVec3::X,
        DVec3::Y,
        DVec3::Z,
    ];
    assert!(matches!(
        ConvexHull::try_new(&points).unwrap_err(),
        HullError::BadInput { index: 0, value } if value == f64::INFINITY
    ));
}

#[test]
fn coincident_points_are_rejected() {
    let points = (0..4).map(|_| DVec3::splat(1.0)).collect::<Vec<_>>();
    assert_eq!(
        ConvexHull::try_new(&points).unwrap_err(),
        HullError::Degenerate(Degeneracy::Coincident)
    );
}

#[test]
fn collinear_points_are_rejected() {
    let points = (0..10)
        .map(|i| DVec3::new(i as f64, 1.0, 10.0))
        .collect::<Vec<_>>();
    assert_eq!(
        ConvexHull::try_new(&points).unwrap_err(),
        HullError::Degenerate(Degeneracy::Collinear)
    );
}

#[test]
fn coplanar_points_are_rejected() {
    let points = [
        DVec3::new(1.0, 1.0, 10.0),
        DVec3::new(1.0, -1.0, 10.0),
        DVec3::new(-1.0, 1.0, 10.0),
        DVec3::new(-1.0, -1.0, 10.0),
        DVec3::new(0.0, 0.3, 10.0),
    ];
    assert_eq!(
        ConvexHull::try_new(&points).unwrap_err(),
        HullError::Degenerate(Degeneracy::Coplanar)
    );
}

#[test]
fn point_representations_agree() {
    let arrays = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.9, 0.9, 0.9],
    ];
    let tuples: Vec<(f64, f64, f64)> = arrays.iter().map(|p| (p[0], p[1], p[2])).collect();
    let vectors: Vec<DVec3> = arrays.iter().map(|&p| DVec3::from_array(p)).collect();

    let from_arrays = ConvexHull::try_new(&arrays).unwrap();
    let from_tuples = ConvexHull::try_new(&tuples).unwrap();
    let from_vectors = ConvexHull::try_new(&vectors).unwrap();
    assert_eq!(face_sets(&from_arrays), face_sets(&from_tuples));
    assert_eq!(face_sets(&from_arrays), face_sets(&from_vectors));
}

#[test]
fn octahedron_test() {
    let points = [
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 0.0),
        DVec3::new(0.0, 0.0, -1.0),
    ];
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_eq!(hull.faces().len(), 8);
    assert_eq!(used_indices(&hull).len(), 6);
}

#[test]
fn octahedron_translation_test() {
    let points: Vec<_> = [
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(-1.0, 0.0, 0.0),
        DVec3::new(0.0, -1.0, 0.0),
        DVec3::new(0.0, 0.0, -1.0),
    ]
    .into_iter()
    .map(|p| p + DVec3::splat(10.0))
    .collect();
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_eq!(hull.faces().len(), 8);
}

#[test]
fn cube_volume_test() {
    let points: Vec<_> = cube_corners().into_iter().map(|p| p * 2.0).collect();
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_relative_eq!(hull.volume(), 8.0, epsilon = 1.0e-12);
}

#[test]
fn translated_volume_test() {
    let points: Vec<_> = cube_corners()
        .into_iter()
        .map(|p| p + DVec3::new(100.0, -40.0, 7.0))
        .collect();
    let hull = ConvexHull::try_new(&points).unwrap();
    assert_relative_eq!(hull.volume(), 1.0, epsilon = 1.0e-9);
}

#[test]
fn sphere_volume_test() {
    let points = cloud::sphere(24);
    let hull = ConvexHull::try_new(&points).unwrap();
    let expected = 4.0 / 3.0 * std::f64::consts::PI;
    let volume = hull.volume();
    assert!(
        (volume - expected).abs() < 0.1,
        "Expected {expected}, got {volume}"
    );
}

#[test]
fn cube_support_point_test() {
    let hull = ConvexHull::try_new(&cube_corners()).unwrap();
    assert_eq!(hull.support_point(DVec3::splat(0.5)), DVec3::splat(1.0));
    assert_eq!(
        hull.support_point(DVec3::new(-1.0, -1.0, 1.0)),
        DVec3::new(0.0, 0.0, 1.0)
    );
}

#[test]
fn simplex_may_degenerate_test() {
    let points = vec![
        DVec3::new(1.0, 0.0, 1.0),
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(2.0, 1.0, 0.0),
        DVec3::new(2.0, 1.0, 1.0),
        DVec3::new(2.0, 0.0, 1.0),
        DVec3::new(2.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 2.0),
        DVec3::new(0.0, 1.0, 2.0),
        DVec3::new(0.0, 0.0, 2.0),
        DVec3::new(1.0, 0.0, 2.0),
    ];
    assert_hull_properties(&points);
}

#[test]
fn simplex_may_degenerate_test_2() {
    let vertices = [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 0.0),
        DVec3::new(1.0, 0.0, 1.0),
        DVec3::new(0.0, 0.0, 1.0),
        DVec3::new(0.0, 1.0, 0.0),
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(1.0, 1.0, 1.0),
        DVec3::new(0.0, 1.0, 1.0),
        DVec3::new(2.0, 1.0, 0.0),
        DVec3::new(2.0, 1.0, 1.0),
        DVec3::new(2.0, 0.0, 1.0),
        DVec3::new(2.0, 0.0, 0.0),
        DVec3::new(1.0, 1.0, 2.0),
        DVec3::new(0.0, 1.0, 2.0),
        DVec3::new(0.0, 0.0, 2.0),
        DVec3::new(1.0, 0.0, 2.0),
    ];
    let indices = [4, 5, 1, 11, 1, 5, 1, 11, 10, 10, 2, 1, 5, 8, 11];
    let points = indices.iter().map(|&i| vertices[i]).collect::<Vec<_>>();
    assert_hull_properties(&points);
}

#[test]
fn random_cloud_properties() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5 {
        let points: Vec<DVec3> = (0..200)
            .map(|_| {
                DVec3::new(rng.random(), rng.random(), rng.random()) * 2.0 - DVec3::ONE
            })
            .collect();
        assert_hull_properties(&points);
    }
}

#[test]
fn sphere_cloud_properties() {
    assert_hull_properties(&cloud::sphere(10));
}

#[test]
fn rehulling_hull_vertices_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(42);
    let points: Vec<DVec3> = (0..120)
        .map(|_| DVec3::new(rng.random(), rng.random(), rng.random()))
        .collect();
    let hull = ConvexHull::try_new(&points).unwrap();

    let used: Vec<usize> = used_indices(&hull).into_iter().collect();
    let subset: Vec<DVec3> = used.iter().map(|&i| points[i]).collect();
    let rehull = ConvexHull::try_new(&subset).unwrap();

    let remapped: BTreeSet<Vec<usize>> = rehull
        .faces()
        .iter()
        .map(|face| sorted(&face.iter().map(|&i| used[i]).collect::<Vec<_>>()))
        .collect();
    assert_eq!(remapped, face_sets(&hull));
}

// Sea-urchin style cloud: sphere directions scaled by arbitrary radii,
// shuffled so claiming order is unrelated to position.
#[test]
fn sea_urchin_test() {
    let mut rng = StdRng::seed_from_u64(3);
    let dist = rand::distr::StandardUniform;

    let mut points: Vec<DVec3> = cloud::sphere(20)
        .into_iter()
        .map(|direction| {
            let radius: f64 = dist.sample(&mut rng);
            direction * radius
        })
        .collect();
    points.shuffle(&mut rng);
    assert_hull_properties(&points);

    let hull = ConvexHull::try_new(&points).unwrap();
    assert!(hull.volume() > 0.0);
}
