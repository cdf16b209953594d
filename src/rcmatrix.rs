//! `RCMatrix<L>` — dense `B × B` matrix over GF(16), `B = 64 * L`.
//!
//! Exactly `B` rows, each a [`GrpB<L>`] (spec §3.4/C5). Every intermediate
//! Gramian and correction matrix in the Lanczos recurrence is an
//! `RCMatrix`. Row storage lives in a boxed slice rather than `[GrpB<L>;
//! 64 * L]`: stable Rust's const generics only accept a bare const
//! parameter as an array length, not an expression like `64 * L`, so the
//! row count is allocated once at construction and never resized.

use crate::bitvec::BitVec;
use crate::gf16::{self, Gf16};
use crate::grp::GrpB;

/// A dense `B × B` GF(16) matrix, `B = 64 * L`, stored as `B` rows.
#[derive(Clone, Debug)]
pub struct RCMatrix<const L: usize> {
    rows: Box<[GrpB<L>]>,
}

impl<const L: usize> RCMatrix<L> {
    /// Row/column count `B`.
    pub const WIDTH: usize = GrpB::<L>::WIDTH;

    /// All-zero `B × B` matrix.
    pub fn zero() -> Self {
        Self {
            rows: vec![GrpB::zero(); Self::WIDTH].into_boxed_slice(),
        }
    }

    /// The `B × B` identity matrix: bit `i` of row `i`'s `b0` plane set,
    /// every other bit/plane zero (spec §4.3 `identity`).
    pub fn identity() -> Self {
        let mut m = Self::zero();
        for i in 0..Self::WIDTH {
            m.rows[i].set(i, 1);
        }
        m
    }

    /// Overwrite `self` with `src`'s contents (spec §8 property 7: `copy;
    /// copy` is a no-op, trivially true for any `Clone`-based copy).
    #[inline]
    pub fn copy_from(&mut self, src: &Self) {
        self.rows.clone_from(&src.rows);
    }

    /// Row `i` of the matrix.
    #[inline]
    pub fn row(&self, i: usize) -> &GrpB<L> {
        &self.rows[i]
    }

    /// Mutable row `i` of the matrix.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut GrpB<L> {
        &mut self.rows[i]
    }

    /// Swap rows `i` and `j` in O(1) (spec §3.4: "row swap is O(1) per
    /// plane").
    #[inline]
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.rows.swap(i, j);
    }

    /// `m[i][j]`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> Gf16 {
        self.rows[i].at(j)
    }

    /// `m[i][j] <- v`.
    #[inline]
    pub fn set_at(&mut self, i: usize, j: usize, v: Gf16) {
        self.rows[i].set(j, v);
    }

    /// `true` iff `at(i,j) == at(j,i)` for all `i, j` (spec §3.4 invariant,
    /// checked by the Gauss–Jordan pseudo-inverse property test §8.6).
    pub fn is_symmetric(&self) -> bool {
        for i in 0..Self::WIDTH {
            for j in (i + 1)..Self::WIDTH {
                if self.at(i, j) != self.at(j, i) {
                    return false;
                }
            }
        }
        true
    }

    /// `p[i][j] = XOR over k of m[i][k] * n[k][j]`, i.e. `p = m * n`
    /// (spec §4.3). Steps columns in pairs via `fmaddi_scalar_bs`, mirroring
    /// the teacher matrix's row-at-a-time accumulation.
    pub fn mul_naive(&self, other: &Self) -> Self {
        let mut p = Self::zero();
        for i in 0..Self::WIDTH {
            let m_row = &self.rows[i];
            let dst = &mut p.rows[i];
            let mut ci = 0;
            while ci + 1 < Self::WIDTH {
                dst.fmaddi_scalar_bs(&other.rows[ci], m_row, ci);
                dst.fmaddi_scalar_bs(&other.rows[ci + 1], m_row, ci + 1);
                ci += 2;
            }
            if ci < Self::WIDTH {
                dst.fmaddi_scalar_bs(&other.rows[ci], m_row, ci);
            }
        }
        p
    }

    /// `a <- a + b` (spec §4.3 `A += B`).
    pub fn addi(&mut self, other: &Self) {
        for (a, b) in self.rows.iter_mut().zip(other.rows.iter()) {
            a.addi(b);
        }
    }

    /// `a <- mix(a, b, d)`: per-row `grp_mix`, with `d` the same
    /// column-indexed mask applied to every row (spec §4.3 `mixi`).
    pub fn mixi(&mut self, other: &Self, d: &BitVec<L>) {
        for (a, b) in self.rows.iter_mut().zip(other.rows.iter()) {
            a.mixi(b, d);
        }
    }

    /// Zero every row `i` where `keep[i] = 0`, then zero every column `j`
    /// where `keep[j] = 0` of the surviving rows (spec §4.3
    /// `zero_subset_rc`). Only the submatrix indexed by `keep` on both
    /// sides survives.
    pub fn zero_subset_rc(&mut self, keep: &BitVec<L>) {
        for i in 0..Self::WIDTH {
            if !keep.get(i) {
                self.rows[i].zeroi();
            } else {
                self.rows[i].zero_subset(keep);
            }
        }
    }

    /// In-place Gauss–Jordan elimination (spec §4.3 `gj`).
    ///
    /// `self` is reduced towards the identity; `inv` accumulates the same
    /// row operations starting from whatever the caller seeded it with
    /// (identity for a true inverse, a constant column for solving a
    /// linear system). Returns the independent-column `DiagMask`: bit `i`
    /// is 1 iff column `i` had a non-zero pivot.
    ///
    /// Pivot search always takes the *first* row with a non-zero entry in
    /// the pivot column, not the sparsest one — this is load-bearing for
    /// which columns end up flagged dependent, and therefore for the
    /// iteration count of the caller's recurrence.
    pub fn gj(&mut self, inv: &mut Self, di: &mut BitVec<L>) {
        *di = BitVec::all_ones();
        for i in 0..Self::WIDTH {
            let mut pivot_row = i;
            let mut inv_coeff = 0;
            while pivot_row < Self::WIDTH {
                let coeff = self.rows[pivot_row].at(i);
                if coeff != 0 {
                    inv_coeff = gf16::inv(coeff);
                    break;
                }
                pivot_row += 1;
            }

            if pivot_row == Self::WIDTH {
                di.toggle(i);
                continue;
            }

            self.rows[pivot_row].muli_scalar(inv_coeff);
            inv.rows[pivot_row].muli_scalar(inv_coeff);

            // Rows in `0..i` still need reducing in column i; rows in
            // `i..pivot_row` were never touched by an earlier pivot (their
            // column `i` entry is already zero), so only the pivot row
            // itself and rows after it need the update.
            for j in 0..i {
                row_reduce(self, inv, j, pivot_row, i);
            }
            for j in (pivot_row + 1)..Self::WIDTH {
                row_reduce(self, inv, j, pivot_row, i);
            }

            self.swap_rows(pivot_row, i);
            inv.swap_rows(pivot_row, i);
        }
    }
}

/// `m[j] <- m[j] + m[pivot_row] * m[j][i]` (and the same update to `inv`),
/// the per-row elimination step of [`RCMatrix::gj`].
#[inline]
fn row_reduce<const L: usize>(m: &mut RCMatrix<L>, inv: &mut RCMatrix<L>, j: usize, pivot_row: usize, i: usize) {
    if j == pivot_row {
        return;
    }
    let coeff = m.at(j, i);
    if coeff == 0 {
        return;
    }
    let (pvt_m, pvt_inv) = (m.row(pivot_row).clone(), inv.row(pivot_row).clone());
    m.row_mut(j).fmaddi_scalar(&pvt_m, coeff);
    inv.row_mut(j).fmaddi_scalar(&pvt_inv, coeff);
}

#[cfg(test)]
mod tests {
    use super::*;

    type RC = RCMatrix<1>; // B = 64

    #[test]
    fn identity_roundtrips_through_mul_naive() {
        let id = RC::identity();
        let mut n = RC::zero();
        for i in 0..RC::WIDTH {
            n.set_at(i, (i + 1) % RC::WIDTH, ((i % 15) + 1) as Gf16);
        }
        let p = id.mul_naive(&n);
        for i in 0..RC::WIDTH {
            for j in 0..RC::WIDTH {
                assert_eq!(p.at(i, j), n.at(i, j));
            }
        }
    }

    #[test]
    fn gj_on_identity_is_identity_inverse() {
        let mut m = RC::identity();
        let mut inv = RC::identity();
        let mut di = BitVec::zero();
        m.gj(&mut inv, &mut di);
        assert!(di.is_max());
        let prod = m.mul_naive(&inv);
        for i in 0..RC::WIDTH {
            for j in 0..RC::WIDTH {
                let want = if i == j { 1 } else { 0 };
                assert_eq!(prod.at(i, j), want);
            }
        }
    }

    #[test]
    fn gj_on_rank_deficient_matrix_flags_singular_column() {
        // 8x8 leading block, rank 7: column 7 = column 0 (spec S5 shape).
        let mut m = RC::zero();
        for i in 0..8 {
            m.set_at(i, i, 1);
        }
        m.set_at(0, 7, 1); // column 7 duplicates column 0 in row 0
        let mut inv = RC::identity();
        let mut di = BitVec::zero();
        m.gj(&mut inv, &mut di);
        assert!(!di.get(7));
        for i in 0..7 {
            assert!(di.get(i));
        }
    }

    #[test]
    fn zero_subset_rc_keeps_only_selected_submatrix() {
        let mut m = RC::zero();
        for i in 0..RC::WIDTH {
            for j in 0..RC::WIDTH {
                m.set_at(i, j, 7);
            }
        }
        let mut keep = BitVec::zero();
        keep.set(0, true);
        keep.set(1, true);
        m.zero_subset_rc(&keep);
        assert_eq!(m.at(0, 0), 7);
        assert_eq!(m.at(0, 1), 7);
        assert_eq!(m.at(0, 2), 0);
        assert_eq!(m.at(2, 0), 0);
        assert_eq!(m.at(2, 2), 0);
    }

    #[test]
    fn addi_self_is_zero() {
        let mut m = RC::zero();
        for i in 0..RC::WIDTH {
            m.set_at(i, i, 9);
        }
        let snapshot = m.clone();
        m.addi(&snapshot);
        for i in 0..RC::WIDTH {
            for j in 0..RC::WIDTH {
                assert_eq!(m.at(i, j), 0);
            }
        }
    }
}
