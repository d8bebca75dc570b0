//! # hull3d
//!
//! A half-edge based implementation of the Quickhull algorithm for computing
//! convex hulls of 3D point sets.
//!
//! The hull is built incrementally: an initial tetrahedron claims every
//! outside point, then the point farthest from its claiming face is folded in
//! by deleting the faces it can see, fanning new triangles around the
//! resulting horizon, and merging adjacent faces that the addition left
//! coplanar or concave. The result is a closed, convex, outward-oriented
//! polygon mesh whose faces index the original input points.
//!
//! ```
//! use hull3d::ConvexHull;
//!
//! let points = [
//!     (0.0, 0.0, 0.0),
//!     (1.0, 0.0, 0.0),
//!     (0.0, 1.0, 0.0),
//!     (0.0, 0.0, 1.0),
//! ];
//! let hull = ConvexHull::try_new(&points).unwrap();
//! assert_eq!(hull.faces().len(), 4);
//! ```
//!
//! ## References
//!
//! - C. Bradford Barber et al. 1996. [The Quickhull Algorithm for Convex Hulls](https://www.cise.ufl.edu/~ungor/courses/fall06/papers/QuickHull.pdf) (the original paper)
//! - Dirk Gregorius. GDC 2014. [Physics for Game Programmers: Implementing Quickhull](https://archive.org/details/GDC2014Gregorius)

#![warn(missing_docs, clippy::all)]

#[cfg(any(test, feature = "test-util"))]
pub mod cloud;
mod error;
mod hull;
mod list;
mod math;
mod mesh;
mod point;

pub use error::{Degeneracy, HullError};
pub use hull::{ConvexHull, QuickHull};
pub use point::HullPoint;

#[cfg(test)]
mod tests;
