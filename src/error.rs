//! Recoverable construction-time errors.
//!
//! Per the crate's error model: allocation failure and iteration-time
//! programmer error surface as `Option`/`debug_assert!` (see [`crate::driver`]
//! and [`crate::cmsm`]), but a caller-supplied matrix description can be
//! malformed in ways that are not the solver's fault. Those get a real
//! [`SolverError`] instead of a panic.

use thiserror::Error;

/// Errors produced while constructing a [`crate::cmsm::Cmsm`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    /// `rnum` or `cnum` was zero.
    #[error("matrix dimensions must be non-zero (rnum={rnum}, cnum={cnum})")]
    EmptyDimensions {
        /// Row count supplied by the caller.
        rnum: usize,
        /// Column count supplied by the caller.
        cnum: usize,
    },
    /// A row index in the input data was out of bounds for `rnum`.
    #[error("row index {row} out of range for rnum={rnum}")]
    RowOutOfRange {
        /// The offending row index.
        row: usize,
        /// The declared row count.
        rnum: usize,
    },
    /// The declared total non-zero count did not match the data supplied.
    #[error("declared nznum={declared} does not match supplied entry count {actual}")]
    NzNumMismatch {
        /// What the caller claimed.
        declared: usize,
        /// What was actually present.
        actual: usize,
    },
    /// Per-column capacity supplied to `from_mdmac` was inconsistent with `cnum`.
    #[error("nznum_per_col has {got} entries, expected cnum={cnum}")]
    CapacityLenMismatch {
        /// Length actually supplied.
        got: usize,
        /// Expected length (`cnum`).
        cnum: usize,
    },
}
