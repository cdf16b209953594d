//! Fixed-width bit sets, `W = 64 * L` bits wide for `L` `u64` limbs.
//!
//! This is the Rust-native answer to the spec's "compile-time block width"
//! note (§9 REDESIGN FLAGS): rather than four hand-duplicated `BitVecNN`
//! structs selected by a preprocessor macro wall, `BitVec<const L: usize>`
//! is a single generic type, and `L ∈ {1, 2, 4, 8}` gives `W ∈ {64, 128,
//! 256, 512}`. The crate's `block-wNNN` Cargo features pick one `L` for the
//! `blk` module's type aliases (see `lib.rs`); nothing stops a caller from
//! instantiating other widths directly.
//!
//! Bit `i` of a BitVec used as a column mask is 1 iff column `i` is
//! "alive" — independent, kept, selected — depending on context (spec
//! §3.2 invariant).

use crate::rng::rng_from_seed;
use rand::RngCore;

/// A fixed-width, 64-byte-aligned bit set of `64 * L` bits.
///
/// 64-byte alignment (rather than the natural 8-byte alignment of
/// `[u64; L]`) keeps every `BitVec` usable as the source/destination of the
/// widest aligned load the host offers, per spec §3.4's alignment
/// requirement on the matrices built from these.
#[repr(align(64))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitVec<const L: usize> {
    limbs: [u64; L],
}

impl<const L: usize> Default for BitVec<L> {
    #[inline]
    fn default() -> Self {
        Self::zero()
    }
}

impl<const L: usize> BitVec<L> {
    /// Bit width of this type, `64 * L`.
    pub const WIDTH: usize = 64 * L;

    /// The all-zero bit set.
    #[inline]
    pub const fn zero() -> Self {
        Self { limbs: [0u64; L] }
    }

    /// The all-ones bit set (every one of the `WIDTH` bits set).
    #[inline]
    pub const fn all_ones() -> Self {
        Self { limbs: [u64::MAX; L] }
    }

    /// Uniformly random fill, seeded deterministically (see [`crate::rng`]).
    pub fn rand(seed: u64) -> Self {
        let mut rng = rng_from_seed(seed);
        let mut limbs = [0u64; L];
        for limb in limbs.iter_mut() {
            *limb = rng.next_u64();
        }
        Self { limbs }
    }

    /// Raw limb access, low limb first.
    #[inline]
    pub fn limbs(&self) -> &[u64; L] {
        &self.limbs
    }

    #[inline]
    fn limb_bit(i: usize) -> (usize, u64) {
        debug_assert!(i < Self::WIDTH);
        (i / 64, 1u64 << (i % 64))
    }

    /// Read bit `i`.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        let (limb, mask) = Self::limb_bit(i);
        self.limbs[limb] & mask != 0
    }

    /// Set bit `i` to `v`.
    #[inline]
    pub fn set(&mut self, i: usize, v: bool) {
        let (limb, mask) = Self::limb_bit(i);
        if v {
            self.limbs[limb] |= mask;
        } else {
            self.limbs[limb] &= !mask;
        }
    }

    /// Flip bit `i`.
    #[inline]
    pub fn toggle(&mut self, i: usize) {
        let (limb, mask) = Self::limb_bit(i);
        self.limbs[limb] ^= mask;
    }

    /// `self & other`.
    #[inline]
    pub fn and(&self, other: &Self) -> Self {
        let mut out = *self;
        out.andi(other);
        out
    }

    /// `self &= other`.
    #[inline]
    pub fn andi(&mut self, other: &Self) {
        for (a, b) in self.limbs.iter_mut().zip(other.limbs.iter()) {
            *a &= *b;
        }
    }

    /// `self | other`.
    #[inline]
    pub fn or(&self, other: &Self) -> Self {
        let mut out = *self;
        out.ori(other);
        out
    }

    /// `self |= other`.
    #[inline]
    pub fn ori(&mut self, other: &Self) {
        for (a, b) in self.limbs.iter_mut().zip(other.limbs.iter()) {
            *a |= *b;
        }
    }

    /// `self ^ other`.
    #[inline]
    pub fn xor(&self, other: &Self) -> Self {
        let mut out = *self;
        out.xori(other);
        out
    }

    /// `self ^= other`.
    #[inline]
    pub fn xori(&mut self, other: &Self) {
        for (a, b) in self.limbs.iter_mut().zip(other.limbs.iter()) {
            *a ^= *b;
        }
    }

    /// `self & !other`.
    #[inline]
    pub fn andnot(&self, other: &Self) -> Self {
        let mut out = *self;
        out.andnoti(other);
        out
    }

    /// `self &= !other`.
    #[inline]
    pub fn andnoti(&mut self, other: &Self) {
        for (a, b) in self.limbs.iter_mut().zip(other.limbs.iter()) {
            *a &= !*b;
        }
    }

    /// `!self`, in place.
    #[inline]
    pub fn negi(&mut self) {
        for a in self.limbs.iter_mut() {
            *a = !*a;
        }
    }

    /// `!self`.
    #[inline]
    pub fn neg(&self) -> Self {
        let mut out = *self;
        out.negi();
        out
    }

    /// Number of set bits.
    #[inline]
    pub fn popcount(&self) -> u32 {
        self.limbs.iter().map(|l| l.count_ones()).sum()
    }

    /// `true` iff no bit is set.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    /// `true` iff every bit is set.
    #[inline]
    pub fn is_max(&self) -> bool {
        self.limbs.iter().all(|&l| l == u64::MAX)
    }

    /// Broadcast a single `u64` boolean-as-mask value (`0` or `u64::MAX`)
    /// across every limb. Used to build the AND-masks `mul_scalar` needs
    /// from a single coefficient bit.
    #[inline]
    pub const fn broadcast64(v: u64) -> Self {
        Self { limbs: [v; L] }
    }

    /// Append the indices of every set bit to `out`, in ascending order.
    pub fn set_bit_indices(&self, out: &mut Vec<usize>) {
        for (word_idx, &limb) in self.limbs.iter().enumerate() {
            let mut bits = limb;
            while bits != 0 {
                let tz = bits.trailing_zeros() as usize;
                out.push(word_idx * 64 + tz);
                bits &= bits - 1;
            }
        }
    }
}

impl<const L: usize> std::ops::BitAnd for BitVec<L> {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.and(&rhs)
    }
}

impl<const L: usize> std::ops::BitOr for BitVec<L> {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.or(&rhs)
    }
}

impl<const L: usize> std::ops::BitXor for BitVec<L> {
    type Output = Self;
    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        self.xor(&rhs)
    }
}
