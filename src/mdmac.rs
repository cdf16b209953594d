//! `MDMac` / `MDMacColIterator` — the multi-degree Macaulay matrix source.
//!
//! Out of scope per spec §1: the core only consumes these as an opaque
//! non-zero-entry oracle when building a [`crate::cmsm::Cmsm`] from a
//! caller-supplied generator rather than a flat GF(16) array. No concrete
//! implementation lives in this crate.

use crate::gf16::Gf16;

/// Enumerates the column indices of the underlying Macaulay matrix that a
/// [`Cmsm`](crate::cmsm::Cmsm) should be built from.
pub trait MDMacColIterator {
    /// Advance to and return the next column index, or `None` once every
    /// selected column has been produced.
    fn next_col(&mut self) -> Option<usize>;
}

/// Supplies the non-zero entries of one column of the Macaulay matrix on
/// demand.
pub trait MDMac {
    /// Append every non-zero `(row_index, value)` pair of column `col` to
    /// `out`, in unspecified order.
    fn col_nonzeros(&self, col: usize, out: &mut Vec<(u32, Gf16)>);
}
