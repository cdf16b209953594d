//! `DiagMask` — a `BitVec<L>` read as the diagonal of a `B × B` 0/1 matrix.
//!
//! There is no dedicated storage here: a `DiagMask<L>` is exactly a
//! [`BitVec<L>`] (spec §3.2/C4), so this module is a thin semantic layer —
//! a type alias plus the handful of free functions the driver and RC/R
//! matrices call out by name (`negate`, `is_zero`, `is_full_rank`).

use crate::bitvec::BitVec;

/// Bit `i` set means column/row `i` is kept by this diagonal selection.
pub type DiagMask<const L: usize> = BitVec<L>;

/// `NOT d`, i.e. the complementary selection (spec §4.6 step 10, `ndi`).
#[inline]
pub fn negate<const L: usize>(d: &DiagMask<L>) -> DiagMask<L> {
    d.neg()
}

/// `true` iff no column is selected — the Lanczos termination condition
/// (spec §4.6 "Termination": the loop runs while `di` is non-zero).
#[inline]
pub fn is_zero<const L: usize>(d: &DiagMask<L>) -> bool {
    d.is_zero()
}

/// `true` iff every column is selected, i.e. the Gramian was full rank.
#[inline]
pub fn is_full_rank<const L: usize>(d: &DiagMask<L>) -> bool {
    d.is_max()
}

/// Number of selected columns.
#[inline]
pub fn rank<const L: usize>(d: &DiagMask<L>) -> u32 {
    d.popcount()
}

#[cfg(test)]
mod tests {
    use super::*;

    type D = DiagMask<2>;

    #[test]
    fn negate_is_involution() {
        let d = D::rand(11);
        assert_eq!(negate(&negate(&d)), d);
    }

    #[test]
    fn full_rank_and_zero_are_complementary_extremes() {
        assert!(is_full_rank::<2>(&D::all_ones()));
        assert!(!is_zero::<2>(&D::all_ones()));
        assert!(is_zero::<2>(&D::zero()));
        assert!(!is_full_rank::<2>(&D::zero()));
        assert_eq!(rank::<2>(&D::all_ones()), D::WIDTH as u32);
        assert_eq!(rank::<2>(&D::zero()), 0);
    }
}
