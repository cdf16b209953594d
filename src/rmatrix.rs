//! `RMatrix<L>` — dense `rnum × B` matrix over GF(16), `B = 64 * L`.
//!
//! Row-major array of [`GrpB<L>`] with a `rnum` header (spec §3.5/C6). The
//! Lanczos block vectors `v`, `p`, `mtv`, `av` are all `RMatrix` values.
//! `rnum` is a runtime value (the sparse matrix's row or column count);
//! `B` is the compile-time block width.

use crate::bitvec::BitVec;
use crate::diag::DiagMask;
use crate::gf16::Gf16;
use crate::grp::GrpB;
use crate::rcmatrix::RCMatrix;

/// A dense `rnum × B` GF(16) matrix.
#[derive(Clone, Debug)]
pub struct RMatrix<const L: usize> {
    rnum: usize,
    rows: Box<[GrpB<L>]>,
}

impl<const L: usize> RMatrix<L> {
    /// Block width `B`.
    pub const WIDTH: usize = GrpB::<L>::WIDTH;

    /// All-zero `rnum × B` matrix.
    pub fn zero(rnum: usize) -> Self {
        Self {
            rnum,
            rows: vec![GrpB::zero(); rnum].into_boxed_slice(),
        }
    }

    /// Uniformly random `rnum × B` matrix, deterministically seeded. Row
    /// `i`'s seed is derived via [`crate::rng::derive_seed`] rather than
    /// `seed + i`, so that row `i`'s planes never collide with row `i + 1`'s
    /// (each row's seed, and each plane within it, comes from an
    /// independent BLAKE3 derivation).
    pub fn rand(rnum: usize, seed: u64) -> Self {
        let rows = (0..rnum)
            .map(|i| GrpB::rand(crate::rng::derive_seed(seed, i as u64)))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { rnum, rows }
    }

    /// Row count.
    #[inline]
    pub fn rnum(&self) -> usize {
        self.rnum
    }

    /// Overwrite `self` with `src`'s contents.
    #[inline]
    pub fn copy_from(&mut self, src: &Self) {
        debug_assert_eq!(self.rnum, src.rnum);
        self.rows.clone_from(&src.rows);
    }

    /// Row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &GrpB<L> {
        &self.rows[i]
    }

    /// Mutable row `i`.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut GrpB<L> {
        &mut self.rows[i]
    }

    /// All rows, for callers that parallelize across them (sparse
    /// products, see [`crate::cmsm`]).
    #[inline]
    pub fn rows(&self) -> &[GrpB<L>] {
        &self.rows
    }

    /// Mutable access to all rows.
    #[inline]
    pub fn rows_mut(&mut self) -> &mut [GrpB<L>] {
        &mut self.rows
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

    /// `p <- mᵀ · m`, a `B × B` [`RCMatrix`] (spec §4.4 `gramian`).
    ///
    /// The Gramian of a GF(16) matrix is always symmetric: `(Aᵀ A)ᵀ = Aᵀ A`
    /// in characteristic 2 since transposition of a product reverses
    /// order and `(Aᵀ)ᵀ = A`, and `Aᵀ A = (Aᵀ A)ᵀ` follows by direct
    /// substitution (spec §8 property 3).
    ///
    /// Two optimizations preserved from the reference: the accumulator is
    /// zeroed only implicitly (by being freshly allocated and written via
    /// pure store on `r = 0`), and columns are processed in pairs.
    pub fn gramian(&self) -> RCMatrix<L> {
        let mut p = RCMatrix::<L>::zero();
        for r in 0..self.rnum {
            let m_row = &self.rows[r];
            let mut ci = 0;
            while ci + 1 < Self::WIDTH {
                if r == 0 {
                    p.row_mut(ci).zeroi();
                    p.row_mut(ci + 1).zeroi();
                }
                p.row_mut(ci).fmaddi_scalar_bs(m_row, m_row, ci);
                p.row_mut(ci + 1).fmaddi_scalar_bs(m_row, m_row, ci + 1);
                ci += 2;
            }
            if ci < Self::WIDTH {
                if r == 0 {
                    p.row_mut(ci).zeroi();
                }
                p.row_mut(ci).fmaddi_scalar_bs(m_row, m_row, ci);
            }
        }
        p
    }

    /// Row-range-parallel variant of [`Self::gramian`]: splits `0..rnum`
    /// into `tnum` strips, has each worker accumulate its strip's
    /// contribution into a private `partials[w]`, then XORs every partial
    /// into the result under `mutex` (spec §3.7 `gramian_partials`). Each
    /// strip's accumulation re-implements the zero-on-first-row and
    /// column-pair optimizations locally, since every worker owns the
    /// "first row" of its own strip.
    ///
    /// Fan-out is routed through `pool` (spec §6's "submit `tnum` jobs,
    /// then block on `wait_all`" scheduling contract), so this is where a
    /// `RayonThreadpool` actually spreads work across the global rayon
    /// pool rather than the ad hoc `std::thread::scope` this used to use.
    pub fn gramian_parallel(
        &self,
        tnum: usize,
        partials: &mut [RCMatrix<L>],
        pool: &dyn crate::pool::Threadpool,
        mutex: &std::sync::Mutex<()>,
    ) -> RCMatrix<L> {
        let tnum = tnum.max(1);
        debug_assert_eq!(partials.len(), tnum);
        let base = self.rnum / tnum;
        let rem = self.rnum % tnum;
        let mut strips = Vec::with_capacity(tnum);
        let mut start = 0;
        for t in 0..tnum {
            let len = base + if t < rem { 1 } else { 0 };
            strips.push((start, start + len));
            start += len;
        }

        for part in partials.iter_mut() {
            *part = RCMatrix::zero();
        }

        let mut partial_refs: Vec<&mut RCMatrix<L>> = partials.iter_mut().collect();
        pool.scope(&mut |scope| {
            for ((lo, hi), part) in strips.iter().copied().zip(partial_refs.drain(..)) {
                scope.submit(Box::new(move || {
                    for r in lo..hi {
                        let m_row = &self.rows[r];
                        let mut ci = 0;
                        while ci + 1 < Self::WIDTH {
                            part.row_mut(ci).fmaddi_scalar_bs(m_row, m_row, ci);
                            part.row_mut(ci + 1).fmaddi_scalar_bs(m_row, m_row, ci + 1);
                            ci += 2;
                        }
                        if ci < Self::WIDTH {
                            part.row_mut(ci).fmaddi_scalar_bs(m_row, m_row, ci);
                        }
                    }
                }));
            }
        });

        let _guard = mutex.lock().expect("workspace mutex poisoned");
        let mut out = RCMatrix::<L>::zero();
        for part in partials.iter() {
            out.addi(part);
        }
        out
    }

    /// `a <- a + b * c`, the hot path of the recurrence for `B >= 128`
    /// (spec §4.4 `fma`): for each row `i`, walk columns of `c` in pairs,
    /// accumulating `c.rows[j] * b_row[j]` via `fmaddi_scalar_bs`.
    pub fn fma(&mut self, b: &Self, c: &RCMatrix<L>) {
        debug_assert_eq!(self.rnum, b.rnum);
        for i in 0..self.rnum {
            let b_row = b.rows[i];
            let a_row = &mut self.rows[i];
            let mut j = 0;
            while j + 1 < Self::WIDTH {
                a_row.fmaddi_scalar_bs(c.row(j), &b_row, j);
                a_row.fmaddi_scalar_bs(c.row(j + 1), &b_row, j + 1);
                j += 2;
            }
            if j < Self::WIDTH {
                a_row.fmaddi_scalar_bs(c.row(j), &b_row, j);
            }
        }
    }

    /// `a <- a - b * c`; identical to [`Self::fma`] (spec §4.4 `fms*`,
    /// §8 property 4).
    #[inline]
    pub fn fms(&mut self, b: &Self, c: &RCMatrix<L>) {
        self.fma(b, c);
    }

    /// `a <- a + b * c * D_d` (spec §4.4 `fma_diag`): accumulate `b·c` for
    /// each row into a scratch group, AND with `d`, then XOR into `a`. The
    /// mask applies only to the new contribution, not to the existing
    /// value of `a`.
    pub fn fma_diag(&mut self, b: &Self, c: &RCMatrix<L>, d: &DiagMask<L>) {
        debug_assert_eq!(self.rnum, b.rnum);
        for i in 0..self.rnum {
            let b_row = b.rows[i];
            let mut scratch = GrpB::<L>::zero();
            let mut j = 0;
            while j + 1 < Self::WIDTH {
                scratch.fmaddi_scalar_bs(c.row(j), &b_row, j);
                scratch.fmaddi_scalar_bs(c.row(j + 1), &b_row, j + 1);
                j += 2;
            }
            if j < Self::WIDTH {
                scratch.fmaddi_scalar_bs(c.row(j), &b_row, j);
            }
            scratch.zero_subset(d);
            self.rows[i].addi(&scratch);
        }
    }

    /// `a <- a - b * c * D_d`; identical to [`Self::fma_diag`] (property 4).
    #[inline]
    pub fn fms_diag(&mut self, b: &Self, c: &RCMatrix<L>, d: &DiagMask<L>) {
        self.fma_diag(b, c, d);
    }

    /// `a <- a · D_d + b * c` (spec §4.4 `diag_fma`): zero out columns of
    /// `a` not selected by `d`, then accumulate `b·c`. Symmetric to
    /// [`Self::fma_diag`], but the mask gates the existing value rather
    /// than the new contribution.
    pub fn diag_fma(&mut self, d: &DiagMask<L>, b: &Self, c: &RCMatrix<L>) {
        debug_assert_eq!(self.rnum, b.rnum);
        for i in 0..self.rnum {
            self.rows[i].zero_subset(d);
        }
        self.fma(b, c);
    }

    /// `a <- mix(a, b, d)`: per-row `grp_mix` (spec §4.4 `mixi`).
    pub fn mixi(&mut self, other: &Self, d: &BitVec<L>) {
        debug_assert_eq!(self.rnum, other.rnum);
        for (a, b) in self.rows.iter_mut().zip(other.rows.iter()) {
            a.mixi(b, d);
        }
    }

    /// `a <- a + b` (spec §4.4 `addi`).
    pub fn addi(&mut self, other: &Self) {
        debug_assert_eq!(self.rnum, other.rnum);
        for (a, b) in self.rows.iter_mut().zip(other.rows.iter()) {
            a.addi(b);
        }
    }

    /// Columns that are globally zero across every row: seed `out =
    /// all-ones`, AND with `grp_z_pos(row)` for every row, stopping early
    /// once `out` is entirely zero (spec §4.4 `zc_pos`).
    pub fn zc_pos(&self) -> BitVec<L> {
        let mut out = BitVec::all_ones();
        for row in self.rows.iter() {
            out.andi(&row.z_pos());
            if out.is_zero() {
                break;
            }
        }
        out
    }

    /// Like [`Self::zc_pos`] but scans only the rows listed in `ridxs`
    /// (spec §4.4 `subset_zc_pos`).
    pub fn subset_zc_pos(&self, ridxs: &[usize]) -> BitVec<L> {
        let mut out = BitVec::all_ones();
        for &r in ridxs {
            out.andi(&self.rows[r].z_pos());
            if out.is_zero() {
                break;
            }
        }
        out
    }

    /// Columns that are non-zero in at least one row; the complement of
    /// [`Self::zc_pos`].
    pub fn nzc_pos(&self) -> BitVec<L> {
        self.zc_pos().neg()
    }
}
