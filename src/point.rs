use glam::DVec3;

/// Adapter from a caller-side point representation to the coordinate
/// triple the hull builder works with.
///
/// Points may arrive as ordered triples (`[f64; 3]`, `(f64, f64, f64)`)
/// or as a vector type with named `x`/`y`/`z` components ([`DVec3`]).
/// The builder normalizes its input through this trait once, up front,
/// preserving the original index order.
pub trait HullPoint {
    /// Returns the point as `(x, y, z)` coordinates.
    fn coords(&self) -> DVec3;
}

impl HullPoint for DVec3 {
    fn coords(&self) -> DVec3 {
        *self
    }
}

impl HullPoint for [f64; 3] {
    fn coords(&self) -> DVec3 {
        DVec3::from_array(*self)
    }
}

impl HullPoint for (f64, f64, f64) {
    fn coords(&self) -> DVec3 {
        DVec3::new(self.0, self.1, self.2)
    }
}

impl<P: HullPoint> HullPoint for &P {
    fn coords(&self) -> DVec3 {
        (**self).coords()
    }
}
