//! `Cmsm` — column-major sparse matrix over GF(16) (spec §3.6/C7).
//!
//! Storage follows the column-major sparse layout used for GF(2) linear
//! algebra elsewhere in the retrieved corpus (`CscMatrix`): a flat
//! `(row_index, value)` array plus a per-column end-offset, so column `j`
//! occupies `entries[end[j-1]..end[j]]` (with `end[-1] = 0`). The matrix is
//! immutable after construction.

use crate::error::SolverError;
use crate::gf16::{self, Gf16};
use crate::grp::GrpB;
use crate::mdmac::{MDMac, MDMacColIterator};
use crate::pool::Threadpool;
use crate::rmatrix::RMatrix;
use crate::rng::rng_from_seed;
use rand::seq::index::sample;
use std::sync::Mutex;

/// One non-zero entry: a row index paired with its GF(16) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Entry {
    row: u32,
    value: Gf16,
}

/// A sparse `rnum × cnum` GF(16) matrix, stored column-major.
#[derive(Clone, Debug)]
pub struct Cmsm {
    rnum: usize,
    cnum: usize,
    /// `end[j]` is the index one past the last entry of column `j`;
    /// column `j` occupies `entries[end[j-1]..end[j]]`.
    end: Vec<usize>,
    entries: Vec<Entry>,
}

impl Cmsm {
    /// Row count.
    #[inline]
    pub fn rnum(&self) -> usize {
        self.rnum
    }

    /// Column count.
    #[inline]
    pub fn cnum(&self) -> usize {
        self.cnum
    }

    /// Total non-zero count.
    #[inline]
    pub fn nznum(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn col_range(&self, j: usize) -> std::ops::Range<usize> {
        let start = if j == 0 { 0 } else { self.end[j - 1] };
        start..self.end[j]
    }

    #[inline]
    fn col(&self, j: usize) -> &[Entry] {
        &self.entries[self.col_range(j)]
    }

    /// Heaviest column's non-zero count.
    pub fn max_col_weight(&self) -> usize {
        (0..self.cnum).map(|j| self.col(j).len()).max().unwrap_or(0)
    }

    /// Average non-zero count per column.
    pub fn avg_col_weight(&self) -> f64 {
        if self.cnum == 0 {
            0.0
        } else {
            self.entries.len() as f64 / self.cnum as f64
        }
    }

    /// Build a `Cmsm` from a dense row-major `rnum * cnum` array of GF(16)
    /// values (spec §6 `from_gf_arr`).
    pub fn from_gf_arr(a: &[Gf16], rnum: usize, cnum: usize) -> Result<Self, SolverError> {
        if rnum == 0 || cnum == 0 {
            return Err(SolverError::EmptyDimensions { rnum, cnum });
        }
        if a.len() != rnum * cnum {
            return Err(SolverError::NzNumMismatch {
                declared: rnum * cnum,
                actual: a.len(),
            });
        }
        let mut end = Vec::with_capacity(cnum);
        let mut entries = Vec::new();
        for j in 0..cnum {
            for i in 0..rnum {
                let v = a[i * cnum + j];
                if v != 0 {
                    entries.push(Entry { row: i as u32, value: v });
                }
            }
            end.push(entries.len());
        }
        Ok(Self { rnum, cnum, end, entries })
    }

    /// Build a `Cmsm` by sampling `nrow` rows of an external [`MDMac`]
    /// source, enumerating columns through `iter`, with per-column
    /// capacity hints in `nznum_per_col` (spec §6 `from_mdmac`, §4.5
    /// "Storage").
    ///
    /// `row_seed` drives a reproducible row sub-selection: `nrow` distinct
    /// row indices are drawn out of the full Macaulay row space via the
    /// crate's seeded RNG, and only non-zero entries whose row survived the
    /// sample are kept (spec: "`row_seed` drives selection of `nrow` rows
    /// via a reproducible RNG").
    pub fn from_mdmac(
        mdmac: &dyn MDMac,
        total_rows: usize,
        nrow: usize,
        row_seed: u64,
        mut iter: impl MDMacColIterator,
        nznum_per_col: &[usize],
        nznum: usize,
    ) -> Result<Self, SolverError> {
        let cnum = nznum_per_col.len();
        if nrow == 0 || cnum == 0 {
            return Err(SolverError::EmptyDimensions { rnum: nrow, cnum });
        }
        if total_rows < nrow {
            return Err(SolverError::RowOutOfRange { row: nrow, rnum: total_rows });
        }

        let mut rng = rng_from_seed(row_seed);
        let sampled = sample(&mut rng, total_rows, nrow).into_vec();
        let mut row_map = vec![None; total_rows];
        for (new_idx, &old_idx) in sampled.iter().enumerate() {
            row_map[old_idx] = Some(new_idx as u32);
        }

        let mut end = Vec::with_capacity(cnum);
        let mut entries = Vec::new();
        let mut col_idx = 0;
        let mut scratch = Vec::new();
        while let Some(col) = iter.next_col() {
            if col_idx >= cnum {
                break;
            }
            scratch.clear();
            mdmac.col_nonzeros(col, &mut scratch);
            let before = entries.len();
            for &(row, value) in scratch.iter() {
                if let Some(&Some(new_row)) = row_map.get(row as usize) {
                    if value != 0 {
                        entries.push(Entry { row: new_row, value });
                    }
                }
            }
            let got = entries.len() - before;
            if got > nznum_per_col[col_idx] {
                return Err(SolverError::NzNumMismatch {
                    declared: nznum_per_col[col_idx],
                    actual: got,
                });
            }
            end.push(entries.len());
            col_idx += 1;
        }

        if col_idx != cnum {
            return Err(SolverError::CapacityLenMismatch { got: col_idx, cnum });
        }
        if entries.len() != nznum {
            return Err(SolverError::NzNumMismatch {
                declared: nznum,
                actual: entries.len(),
            });
        }

        Ok(Self {
            rnum: nrow,
            cnum,
            end,
            entries,
        })
    }

    /// Serial `res = Mᵀ · v` on 64-bit scalars: for each column `j`,
    /// `res[j] = Σᵢ M[i,j] · v[i]` (spec §4.5).
    pub fn trmul_scalar(&self, v: &[Gf16], res: &mut [Gf16]) {
        debug_assert_eq!(v.len(), self.rnum);
        debug_assert_eq!(res.len(), self.cnum);
        for j in 0..self.cnum {
            let mut acc = 0;
            for e in self.col(j) {
                acc = gf16::add(acc, gf16::mul(e.value, v[e.row as usize]));
            }
            res[j] = acc;
        }
    }

    /// Serial `res = M · v` on 64-bit scalars (spec §4.5): naturally
    /// scatter-shaped, so not parallel-safe across columns.
    pub fn mul_scalar(&self, v: &[Gf16], res: &mut [Gf16]) {
        debug_assert_eq!(v.len(), self.cnum);
        debug_assert_eq!(res.len(), self.rnum);
        res.iter_mut().for_each(|x| *x = 0);
        for j in 0..self.cnum {
            let vj = v[j];
            if vj == 0 {
                continue;
            }
            for e in self.col(j) {
                let r = e.row as usize;
                res[r] = gf16::add(res[r], gf16::mul(e.value, vj));
            }
        }
    }

    /// Column-parallel `res[j] = Σᵢ M[i,j] · v[i]` (spec §4.5
    /// `cmsm_trmul`). Outputs are disjoint per column, so each worker
    /// strip writes into its own slice of `res` with no reduction needed.
    ///
    /// The `tnum`-way split is submitted to `pool` as `tnum` jobs inside a
    /// single [`Threadpool::scope`] call, so `RayonThreadpool` really does
    /// spread this work across rayon's pool (spec §6's "submit `tnum`
    /// jobs, then block on `wait_all`" contract).
    pub fn trmul<const L: usize>(
        &self,
        res: &mut RMatrix<L>,
        v: &RMatrix<L>,
        tnum: usize,
        pool: &dyn Threadpool,
    ) {
        debug_assert_eq!(v.rnum(), self.rnum);
        debug_assert_eq!(res.rnum(), self.cnum);
        let tnum = tnum.max(1);
        let strips = strip_bounds(self.cnum, tnum);

        let mut remaining: &mut [GrpB<L>] = res.rows_mut();
        let mut chunks: Vec<&mut [GrpB<L>]> = Vec::with_capacity(tnum);
        for &(start, end) in &strips {
            let (head, tail) = remaining.split_at_mut(end - start);
            chunks.push(head);
            remaining = tail;
        }

        pool.scope(&mut |scope| {
            for ((start, end), chunk) in strips.iter().copied().zip(chunks.drain(..)) {
                scope.submit(Box::new(move || {
                    for (local_j, j) in (start..end).enumerate() {
                        let mut acc = GrpB::<L>::zero();
                        for e in self.col(j) {
                            acc.fmaddi_scalar(v.row(e.row as usize), e.value);
                        }
                        chunk[local_j] = acc;
                    }
                }));
            }
        });
    }

    /// Column-parallel-with-reduction `res = M · v` (spec §4.5
    /// `cmsm_mul`): each worker accumulates into a private `RMatrix`
    /// partial over its column strip, then the partials are XORed into
    /// `res` under `mutex` once every worker has finished. See
    /// [`Self::trmul`] for the fan-out's `pool.scope` shape.
    pub fn mul<const L: usize>(
        &self,
        res: &mut RMatrix<L>,
        v: &RMatrix<L>,
        tnum: usize,
        partials: &mut [RMatrix<L>],
        pool: &dyn Threadpool,
        mutex: &Mutex<()>,
    ) {
        debug_assert_eq!(v.rnum(), self.cnum);
        debug_assert_eq!(res.rnum(), self.rnum);
        debug_assert_eq!(partials.len(), tnum.max(1));
        let tnum = tnum.max(1);
        let strips = strip_bounds(self.cnum, tnum);

        for p in partials.iter_mut() {
            for row in p.rows_mut().iter_mut() {
                row.zeroi();
            }
        }

        let mut partial_refs: Vec<&mut RMatrix<L>> = partials.iter_mut().collect();
        pool.scope(&mut |scope| {
            for ((start, end), partial) in strips.iter().copied().zip(partial_refs.drain(..)) {
                scope.submit(Box::new(move || {
                    for j in start..end {
                        let vj = v.row(j);
                        for e in self.col(j) {
                            partial.row_mut(e.row as usize).fmaddi_scalar(vj, e.value);
                        }
                    }
                }));
            }
        });

        let _guard = mutex.lock().expect("workspace mutex poisoned");
        for row in res.rows_mut().iter_mut() {
            row.zeroi();
        }
        for partial in partials.iter() {
            res.addi(partial);
        }
    }
}

/// Split `0..n` into `tnum` contiguous, near-equal strips.
fn strip_bounds(n: usize, tnum: usize) -> Vec<(usize, usize)> {
    let mut bounds = Vec::with_capacity(tnum);
    let base = n / tnum;
    let rem = n % tnum;
    let mut start = 0;
    for t in 0..tnum {
        let len = base + if t < rem { 1 } else { 0 };
        let end = start + len;
        bounds.push((start, end));
        start = end;
    }
    bounds
}
