//! Core coordinate-matrix type: construction, accessors, sorting and the
//! in-place / query operations.

use rayon::prelude::*;

use crate::algs::primitives::{
    apply_permutation, compact_indices, compute_offsets, gather3, lexicographic_permutation,
};
use crate::context::ExecContext;
use crate::debug_invariants::DebugInvariants;
use crate::multicut_error::MulticutError;

/// 0-based vertex id.
pub type VertexId = u32;
/// Edge cost. Negative is attractive (joining the endpoints pays it), positive
/// is repulsive.
pub type Weight = f32;

/// Sparse coordinate-format graph: three parallel arrays of
/// `(row, col, weight)` entries.
///
/// Entries need not be unique. The matrix is never sorted implicitly; call
/// [`Graph::sort`] before any operation that needs row order. The sort used
/// here is lexicographic by `(row, col)`, so column ids are also ordered
/// within each row whenever [`Graph::sorted`] is `true`.
///
/// Mutating operations (`sort`, `remove_diagonal`, `weights_mut`) take
/// `&mut self`. Value-returning transforms (`contract`, `export_undirected`,
/// `export_directed`) borrow the source and allocate fresh storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) row_ids: Vec<VertexId>,
    pub(crate) col_ids: Vec<VertexId>,
    pub(crate) weights: Vec<Weight>,
    pub(crate) sorted: bool,
}

static_assertions::assert_impl_all!(Graph: Send, Sync);

impl Graph {
    /// Build a matrix from owned index and weight arrays.
    ///
    /// A `rows` or `cols` of 0 is inferred as `max(index) + 1` over the
    /// respective array. A supplied count must be strictly greater than every
    /// index. The entries are not sorted.
    pub fn try_new(
        ctx: &ExecContext,
        rows: usize,
        cols: usize,
        row_ids: Vec<VertexId>,
        col_ids: Vec<VertexId>,
        weights: Vec<Weight>,
    ) -> Result<Self, MulticutError> {
        if row_ids.len() != col_ids.len() || row_ids.len() != weights.len() {
            return Err(MulticutError::LengthMismatch {
                rows: row_ids.len(),
                cols: col_ids.len(),
                weights: weights.len(),
            });
        }
        log::debug!("allocating matrix with {} entries", weights.len());
        let (max_row, max_col) = ctx.install(|| {
            (
                row_ids.par_iter().copied().max(),
                col_ids.par_iter().copied().max(),
            )
        });
        let rows = resolve_extent(rows, max_row)
            .map_err(|index| MulticutError::RowOutOfRange { index, rows })?;
        let cols = resolve_extent(cols, max_col)
            .map_err(|index| MulticutError::ColOutOfRange { index, cols })?;
        Ok(Self {
            rows,
            cols,
            row_ids,
            col_ids,
            weights,
            sorted: false,
        })
    }

    /// Panicking form of [`Graph::try_new`].
    ///
    /// # Panics
    /// On mismatched lengths or out-of-range indices.
    pub fn new(
        ctx: &ExecContext,
        rows: usize,
        cols: usize,
        row_ids: Vec<VertexId>,
        col_ids: Vec<VertexId>,
        weights: Vec<Weight>,
    ) -> Self {
        Self::try_new(ctx, rows, cols, row_ids, col_ids, weights)
            .unwrap_or_else(|e| panic!("invalid coordinate matrix: {e}"))
    }

    /// Copy borrowed sequences into a new matrix; counts are inferred.
    pub fn from_slices(
        ctx: &ExecContext,
        row_ids: &[VertexId],
        col_ids: &[VertexId],
        weights: &[Weight],
    ) -> Result<Self, MulticutError> {
        Self::try_new(
            ctx,
            0,
            0,
            row_ids.to_vec(),
            col_ids.to_vec(),
            weights.to_vec(),
        )
    }

    /// Empty matrix with the given extents. Trivially sorted.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            sorted: true,
            ..Default::default()
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    pub fn edges(&self) -> usize {
        self.row_ids.len()
    }

    pub fn sorted(&self) -> bool {
        self.sorted
    }

    pub fn row_ids(&self) -> &[VertexId] {
        &self.row_ids
    }

    pub fn col_ids(&self) -> &[VertexId] {
        &self.col_ids
    }

    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    /// Writable view of the weights. Structure and sortedness are unaffected.
    pub fn weights_mut(&mut self) -> &mut [Weight] {
        &mut self.weights
    }

    /// Iterate `(row, col, weight)` triples in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, VertexId, Weight)> + '_ {
        itertools::izip!(
            self.row_ids.iter().copied(),
            self.col_ids.iter().copied(),
            self.weights.iter().copied()
        )
    }

    /// Take the three arrays out of the matrix.
    pub fn into_parts(self) -> (Vec<VertexId>, Vec<VertexId>, Vec<Weight>) {
        (self.row_ids, self.col_ids, self.weights)
    }

    /// Reorder all three arrays jointly by `(row, col)` and set the sorted flag.
    ///
    /// One permutation is computed from the index keys and applied verbatim to
    /// every array. Entries with equal `(row, col)` keep their relative order.
    pub fn sort(&mut self, ctx: &ExecContext) {
        ctx.install(|| {
            let perm = lexicographic_permutation(&self.row_ids, &self.col_ids);
            apply_permutation(&mut self.row_ids, &perm);
            apply_permutation(&mut self.col_ids, &perm);
            apply_permutation(&mut self.weights, &perm);
        });
        self.sorted = true;
        log::debug!("sorted matrix with {} entries", self.edges());
        crate::debug_invariants!(&*self, "Graph::sort");
    }

    /// CSR-style row offsets: `rows + 1` entries, `offsets[rows] == edges()`.
    ///
    /// Entries of row `r` live in `offsets[r]..offsets[r + 1]`.
    pub fn try_row_offsets(&self, ctx: &ExecContext) -> Result<Vec<usize>, MulticutError> {
        if !self.sorted {
            return Err(MulticutError::NotSorted("row_offsets"));
        }
        Ok(ctx.install(|| compute_offsets(&self.row_ids, self.rows)))
    }

    /// Panicking form of [`Graph::try_row_offsets`].
    ///
    /// # Panics
    /// If the matrix is not sorted.
    pub fn row_offsets(&self, ctx: &ExecContext) -> Vec<usize> {
        self.try_row_offsets(ctx).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Total of all stored weights.
    ///
    /// Accumulates in `f64` with a parallel reduction tree, so the last bits
    /// may differ between runs.
    pub fn sum(&self, ctx: &ExecContext) -> f64 {
        ctx.install(|| self.weights.par_iter().map(|&w| w as f64).sum())
    }

    /// Delete every entry with `row == col`. Survivors keep their relative
    /// order, so the sorted flag is unchanged.
    pub fn remove_diagonal(&mut self, ctx: &ExecContext) {
        let before = self.edges();
        ctx.install(|| {
            let (r, c) = (&self.row_ids, &self.col_ids);
            let keep = compact_indices(r.len(), |i| r[i] != c[i]);
            let (r, c, w) = gather3(&self.row_ids, &self.col_ids, &self.weights, &keep);
            self.row_ids = r;
            self.col_ids = c;
            self.weights = w;
        });
        log::trace!("removed {} diagonal entries", before - self.edges());
    }

    /// Dense diagonal of length `min(rows, cols)`; absent entries are 0 and
    /// duplicate diagonal entries are summed.
    pub fn try_diagonal(&self, ctx: &ExecContext) -> Result<Vec<Weight>, MulticutError> {
        let offsets = self.try_row_offsets(ctx)?;
        let n = self.rows.min(self.cols);
        Ok(ctx.install(|| {
            (0..n)
                .into_par_iter()
                .map(|k| {
                    let cols = &self.col_ids[offsets[k]..offsets[k + 1]];
                    let lo = cols.partition_point(|&c| (c as usize) < k);
                    let hi = cols.partition_point(|&c| (c as usize) <= k);
                    let base = offsets[k];
                    self.weights[base + lo..base + hi].iter().sum::<Weight>()
                })
                .collect()
        }))
    }

    /// Panicking form of [`Graph::try_diagonal`].
    ///
    /// # Panics
    /// If the matrix is not sorted.
    pub fn diagonal(&self, ctx: &ExecContext) -> Vec<Weight> {
        self.try_diagonal(ctx).unwrap_or_else(|e| panic!("{e}"))
    }
}

/// Resolve a requested extent against the largest index present.
///
/// Returns the offending index when a non-zero request is too small.
fn resolve_extent(requested: usize, max_index: Option<VertexId>) -> Result<usize, VertexId> {
    match (requested, max_index) {
        (0, None) => Ok(0),
        (0, Some(m)) => Ok(m as usize + 1),
        (n, Some(m)) if n <= m as usize => Err(m),
        (n, _) => Ok(n),
    }
}

impl DebugInvariants for Graph {
    fn validate_invariants(&self) -> Result<(), MulticutError> {
        if self.row_ids.len() != self.col_ids.len() || self.row_ids.len() != self.weights.len() {
            return Err(MulticutError::LengthMismatch {
                rows: self.row_ids.len(),
                cols: self.col_ids.len(),
                weights: self.weights.len(),
            });
        }
        if let Some(&index) = self.row_ids.iter().find(|&&r| r as usize >= self.rows) {
            return Err(MulticutError::RowOutOfRange {
                index,
                rows: self.rows,
            });
        }
        if let Some(&index) = self.col_ids.iter().find(|&&c| c as usize >= self.cols) {
            return Err(MulticutError::ColOutOfRange {
                index,
                cols: self.cols,
            });
        }
        if self.sorted {
            let ordered = (1..self.row_ids.len()).all(|i| {
                (self.row_ids[i - 1], self.col_ids[i - 1]) <= (self.row_ids[i], self.col_ids[i])
            });
            if !ordered {
                return Err(MulticutError::NotSorted("sorted flag set on unordered entries"));
            }
        }
        Ok(())
    }
}
