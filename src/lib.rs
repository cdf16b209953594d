//! Crate root: public surface, block-width configuration, and cross-module
//! re-exports for a parallel Block Lanczos null-space solver over GF(16).
//!
//! ## Invariants (spec-aligned)
//!
//! - **Field.** Every coefficient lives in `GF(16) = GF(2)[x]/(x⁴+x+1)`
//!   ([`gf16`]). Addition is XOR; subtraction equals addition throughout the
//!   crate (a property the test suites in [`grp`], [`rmatrix`] and
//!   [`rcmatrix`] all probe on random inputs).
//! - **Block width `B`.** A compile-time choice from `{64, 128, 256, 512}`,
//!   selected with the `block-wNNN` Cargo features below and exposed
//!   uniformly as a const generic `L` (number of `u64` limbs per bit-plane,
//!   `B = 64 * L`) rather than four hand-duplicated types.
//! - **No `unsafe`.** SIMD-equivalence (spec §8 property 2) is achieved by
//!   giving the bitsliced kernels exactly one, portable implementation and
//!   letting LLVM autovectorize the limb loop — see [`grp`] for the
//!   rationale.
//! - **Parallelism.** The two sparse products and the two Gramians are the
//!   only fan-out points; everything else runs on the caller's thread. See
//!   [`pool`] for the `Threadpool` interface and [`driver`] for the
//!   recurrence that drives the fan-outs.
//!
//! These invariants are enforced by construction across the submodules; a
//! violation is a precise `debug_assert!`/`Option`/`Result`, never UB.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Fixed-width bit sets (`BitVec<const L: usize>`, `W = 64 * L` bits).
pub mod bitvec;
/// `DiagMask` — a `BitVec` read as the diagonal of a 0/1 selection matrix.
pub mod diag;
/// Scalar arithmetic over `GF(16) = GF(2)[x]/(x⁴+x+1)`.
pub mod gf16;
/// `GrpB` — bitsliced group of `B` GF(16) elements.
pub mod grp;
/// Dense `B × B` matrix with Gauss–Jordan elimination.
pub mod rcmatrix;
/// Dense `rnum × B` matrix with the Gramian/fma toolkit the recurrence needs.
pub mod rmatrix;
/// Column-major sparse GF(16) matrix with parallel `M·v`/`Mᵀ·v`.
pub mod cmsm;
/// The Block Lanczos workspace and iteration driver.
pub mod driver;
/// Construction-time error types.
pub mod error;
/// The multi-degree Macaulay matrix source: consumed only as an opaque
/// non-zero-entry oracle.
pub mod mdmac;
/// The `Threadpool` interface the core consumes, plus two implementations.
pub mod pool;
/// Deterministic seeding for the crate's randomized fills.
pub mod rng;

pub use crate::cmsm::Cmsm;
pub use crate::diag::DiagMask;
pub use crate::driver::{blk_iter_num, blk_iter_num_gf16, block_lanczos, Arg};
pub use crate::error::SolverError;
pub use crate::gf16::Gf16;
pub use crate::pool::{SerialThreadpool, Threadpool};

#[cfg(feature = "rayon-pool")]
pub use crate::pool::RayonThreadpool;

// ============================================================================
// Block-width configuration
// ============================================================================
//
// Exactly one `block-wNNN` feature should be enabled; `block-w128` is the
// default (matches a 128-bit vector register without requiring AVX-512, per
// spec §6 "Build-time configuration"). The `blk` module re-exports the
// width-appropriate concrete aliases so a caller that doesn't care about
// other widths can just `use gf16_block_lanczos::blk::{BitVec, GrpB, ...}`.
// This plays the role the original implementation's preprocessor macro
// dispatch played, via `cfg(feature = ...)` re-exports instead of a macro
// wall (spec §9 REDESIGN FLAGS "Compile-time block width").

#[cfg(not(any(
    feature = "block-w64",
    feature = "block-w128",
    feature = "block-w256",
    feature = "block-w512"
)))]
compile_error!("enable exactly one of the block-w64/128/256/512 features");

#[cfg(any(
    all(feature = "block-w64", feature = "block-w128"),
    all(feature = "block-w64", feature = "block-w256"),
    all(feature = "block-w64", feature = "block-w512"),
    all(feature = "block-w128", feature = "block-w256"),
    all(feature = "block-w128", feature = "block-w512"),
    all(feature = "block-w256", feature = "block-w512"),
))]
compile_error!("enable exactly one of the block-w64/128/256/512 features, not several");

#[cfg(feature = "block-w64")]
const BLOCK_LIMBS: usize = 1;
#[cfg(feature = "block-w128")]
const BLOCK_LIMBS: usize = 2;
#[cfg(feature = "block-w256")]
const BLOCK_LIMBS: usize = 4;
#[cfg(feature = "block-w512")]
const BLOCK_LIMBS: usize = 8;

/// Concrete, width-selected type aliases matching the crate's active
/// `block-wNNN` feature. Prefer these over spelling out `<2>`/`<4>`/... by
/// hand so that flipping the feature in `Cargo.toml` is the only change
/// needed to retarget a consumer at a different block width.
pub mod blk {
    use super::BLOCK_LIMBS;

    /// Block width `B` in GF(16) elements, selected by the active
    /// `block-wNNN` feature.
    pub const WIDTH: usize = 64 * BLOCK_LIMBS;

    /// [`crate::bitvec::BitVec`] at the active block width.
    pub type BitVec = crate::bitvec::BitVec<BLOCK_LIMBS>;
    /// [`crate::diag::DiagMask`] at the active block width.
    pub type DiagMask = crate::diag::DiagMask<BLOCK_LIMBS>;
    /// [`crate::grp::GrpB`] at the active block width.
    pub type GrpB = crate::grp::GrpB<BLOCK_LIMBS>;
    /// [`crate::rcmatrix::RCMatrix`] at the active block width.
    pub type RCMatrix = crate::rcmatrix::RCMatrix<BLOCK_LIMBS>;
    /// [`crate::rmatrix::RMatrix`] at the active block width.
    pub type RMatrix = crate::rmatrix::RMatrix<BLOCK_LIMBS>;
    /// [`crate::driver::Arg`] at the active block width.
    pub type Arg = crate::driver::Arg<BLOCK_LIMBS>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blk_width_matches_selected_feature() {
        // Exactly one block-wNNN feature is enabled by the [features] table
        // used to build the test binary (default: block-w128, B=128).
        assert_eq!(blk::WIDTH, blk::BitVec::WIDTH);
        assert!([64, 128, 256, 512].contains(&blk::WIDTH));
    }

    #[test]
    fn end_to_end_via_blk_aliases_reaches_null_space() {
        let n = 48;
        let cnum = 47;
        let mut arr = vec![0u8; n * cnum];
        let mut seed = 9001u64;
        for j in 0..cnum {
            for _ in 0..4 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                let i = (seed >> 33) as usize % n;
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
                let v = ((seed >> 40) as u8 % 15) + 1;
                arr[i * cnum + j] = v;
            }
        }
        let m = Cmsm::from_gf_arr(&arr, n, cnum).unwrap();
        let mut arg = blk::Arg::create(n, cnum, 2).unwrap();
        let pool = SerialThreadpool::new();
        let iter = block_lanczos(&mut arg, &m, &pool);
        assert!(iter >= 1);
        assert!(crate::driver::mtv_is_zero(&m, arg.v(), &pool));
    }
}
