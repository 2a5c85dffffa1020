//! The errors that can occur while a tree session is inserting, looking up,
//! enumerating or removing points. Mirrors the shape of `GokoError` from the
//! covertree this crate descends from, but built with `thiserror` rather
//! than hand-rolled `Display`/`Error` impls.

use geo::Point;

/// Helper type for a call that could go wrong.
pub type TreeResult<T> = Result<T, TreeError>;

/// Error type for the point-region index. Fatal for a single operation
/// unless noted otherwise; the session itself remains usable except after
/// a `StorageError` on a write path (see `TreeSession`'s poison flag).
#[derive(thiserror::Error, Debug)]
pub enum TreeError {
    /// A point to insert lies outside the session's `entire` bound.
    #[error("point {point:?} lies outside the tree's bound")]
    OutOfBounds { point: Point },

    /// A point or bound's dimension disagrees with `entire`'s.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Any backend-reported failure (I/O, transaction). Propagated
    /// unchanged; the session is considered poisoned after a failed write.
    #[error("storage backend failed: {0}")]
    StorageError(#[from] anyhow::Error),

    /// Cancellation was observed at a suspension point.
    #[error("operation canceled")]
    Canceled,
}
