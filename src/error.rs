use thiserror::Error;

/// The type of error returned during convex hull construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HullError {
    /// An input point has a coordinate that is NaN or infinite.
    #[error("point {index} has a non-finite coordinate ({value})")]
    BadInput {
        /// Position of the offending point in the input sequence.
        index: usize,
        /// The offending coordinate value.
        value: f64,
    },
    /// Fewer than four input points were supplied, so no simplex can be
    /// formed.
    #[error("a 3D convex hull needs at least 4 points, got {0}")]
    TooFewPoints(usize),
    /// The input points span less than three dimensions.
    #[error("degenerate input: {0}")]
    Degenerate(Degeneracy),
    /// A runtime consistency check failed inside the builder. This is a
    /// bug in the builder, not a property of the input.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}

/// The way a degenerate point set fails to span three dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Degeneracy {
    /// The input points are approximately equal.
    #[error("all points are approximately coincident")]
    Coincident,
    /// The input points are approximately on the same line.
    #[error("all points are approximately collinear")]
    Collinear,
    /// The input points are approximately on the same plane.
    #[error("all points are approximately coplanar")]
    Coplanar,
}
