use glam::DVec3;

/// Computes the normal of a triangle face with a counterclockwise
/// orientation. The result is unnormalized; its length is twice the
/// triangle's area.
pub(crate) fn triangle_normal(a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    let ab = b - a;
    let ac = c - a;
    ab.cross(ac)
}

/// Euclidean distance from `point` to the infinite line through `a` and
/// `b`, or `0.0` when `a` and `b` coincide.
pub(crate) fn point_line_distance(point: DVec3, a: DVec3, b: DVec3) -> f64 {
    let direction = b - a;
    let length_squared = direction.length_squared();
    if length_squared == 0.0 {
        return 0.0;
    }
    direction.cross(point - a).length() / length_squared.sqrt()
}
