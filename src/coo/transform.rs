//! Value-returning transforms: contraction and directed/undirected export.
//!
//! None of these touch the source matrix; each allocates fresh arrays, so a
//! failure leaves the source exactly as it was.

use rayon::prelude::*;

use super::core::{Graph, VertexId, Weight};
use crate::algs::primitives::{
    self, apply_permutation, compact_indices, lexicographic_permutation, reduce_by_key_sum,
    try_alloc,
};
use crate::context::ExecContext;
use crate::multicut_error::MulticutError;

impl Graph {
    /// Contract vertices into clusters.
    ///
    /// Every entry `(r, c, w)` becomes `(mapping[r], mapping[c], w)`; entries
    /// that land on the diagonal are dropped and entries sharing a target
    /// `(row, col)` are summed into one. The result is `k × k` with
    /// `k = max(mapping) + 1`, sorted by `(row, col)`.
    ///
    /// `mapping` must have an entry for every row and column index.
    pub fn try_contract(
        &self,
        ctx: &ExecContext,
        mapping: &[VertexId],
    ) -> Result<Graph, MulticutError> {
        let clusters = ctx
            .install(|| mapping.par_iter().copied().max())
            .map_or(0, |m| m as usize + 1);
        self.try_contract_into(ctx, mapping, clusters)
    }

    /// Like [`Graph::try_contract`] with an explicit cluster count.
    ///
    /// Every mapped id must be below `clusters`. With no entries the result
    /// is an empty `clusters × clusters` matrix.
    pub fn try_contract_into(
        &self,
        ctx: &ExecContext,
        mapping: &[VertexId],
        clusters: usize,
    ) -> Result<Graph, MulticutError> {
        let needed = self.rows.max(self.cols);
        if mapping.len() < needed {
            return Err(MulticutError::MappingTooShort {
                got: mapping.len(),
                needed,
            });
        }
        ctx.install(|| {
            if let Some(&cluster) = mapping[..needed]
                .par_iter()
                .find_any(|&&m| m as usize >= clusters)
            {
                return Err(MulticutError::ClusterOutOfRange { cluster, clusters });
            }

            let n = self.edges();
            let mut rows = try_alloc::<VertexId>(n)?;
            let mut cols = try_alloc::<VertexId>(n)?;
            let mut weights = try_alloc::<Weight>(n)?;
            let off_diagonal = compact_indices(n, |e| {
                mapping[self.row_ids[e] as usize] != mapping[self.col_ids[e] as usize]
            });
            rows.par_extend(off_diagonal.par_iter().map(|&e| mapping[self.row_ids[e] as usize]));
            cols.par_extend(off_diagonal.par_iter().map(|&e| mapping[self.col_ids[e] as usize]));
            weights.par_extend(off_diagonal.par_iter().map(|&e| self.weights[e]));

            let perm = lexicographic_permutation(&rows, &cols);
            apply_permutation(&mut rows, &perm);
            apply_permutation(&mut cols, &perm);
            apply_permutation(&mut weights, &perm);

            let keys: Vec<(VertexId, VertexId)> = rows
                .par_iter()
                .zip(cols.par_iter())
                .map(|(&r, &c)| (r, c))
                .collect();
            let (keys, weights) = reduce_by_key_sum(&keys, &weights);
            let (rows, cols): (Vec<VertexId>, Vec<VertexId>) = keys.into_par_iter().unzip();

            log::debug!(
                "contracted {} entries on {} vertices into {} entries on {} clusters",
                n,
                needed,
                weights.len(),
                clusters
            );
            let out = Graph {
                rows: clusters,
                cols: clusters,
                row_ids: rows,
                col_ids: cols,
                weights,
                sorted: true,
            };
            crate::debug_invariants!(&out, "Graph::contract");
            Ok(out)
        })
    }

    /// Panicking form of [`Graph::try_contract`].
    ///
    /// # Panics
    /// If the mapping is too short or an allocation fails.
    pub fn contract(&self, ctx: &ExecContext, mapping: &[VertexId]) -> Graph {
        self.try_contract(ctx, mapping).unwrap_or_else(|e| panic!("contraction failed: {e}"))
    }

    /// Mirror every entry, doubling the entry count.
    ///
    /// Pre-existing symmetric pairs are not deduplicated. The result is square
    /// with extent `max(rows, cols)` and unsorted.
    pub fn try_export_undirected(&self, ctx: &ExecContext) -> Result<Graph, MulticutError> {
        let (row_ids, col_ids, weights) = ctx.install(|| {
            primitives::to_undirected(&self.row_ids, &self.col_ids, &self.weights)
        })?;
        let n = self.rows.max(self.cols);
        Ok(Graph {
            rows: n,
            cols: n,
            row_ids,
            col_ids,
            weights,
            sorted: false,
        })
    }

    /// Panicking form of [`Graph::try_export_undirected`].
    pub fn export_undirected(&self, ctx: &ExecContext) -> Graph {
        self.try_export_undirected(ctx).unwrap_or_else(|e| panic!("undirected export failed: {e}"))
    }

    /// Keep the lower triangle (`row >= col`, diagonal included).
    ///
    /// Entries above the diagonal are dropped, not merged into their mirror.
    /// Relative order is preserved, and with it the sorted flag.
    pub fn export_directed(&self, ctx: &ExecContext) -> Graph {
        let (row_ids, col_ids, weights) = ctx.install(|| {
            primitives::to_directed(&self.row_ids, &self.col_ids, &self.weights)
        });
        Graph {
            rows: self.rows,
            cols: self.cols,
            row_ids,
            col_ids,
            weights,
            sorted: self.sorted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> &'static ExecContext {
        ExecContext::global()
    }

    #[test]
    fn contract_merges_parallel_edges() {
        // (2,0) and (3,1) both land on (0,1); (1,0) collapses onto the diagonal.
        let g = Graph::new(
            ctx(),
            0,
            0,
            vec![2, 3, 1],
            vec![0, 1, 0],
            vec![1.5, 2.5, -4.0],
        );
        let c = g.contract(ctx(), &[1, 1, 0, 0]);
        assert_eq!((c.rows(), c.cols()), (2, 2));
        assert!(c.sorted());
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![(0, 1, 4.0)]);
    }

    #[test]
    fn contract_rejects_short_mapping() {
        let g = Graph::new(ctx(), 0, 0, vec![2], vec![0], vec![1.0]);
        let err = g.try_contract(ctx(), &[0, 0]).unwrap_err();
        assert_eq!(err, MulticutError::MappingTooShort { got: 2, needed: 3 });
    }

    #[test]
    fn contract_into_checks_cluster_range() {
        let g = Graph::new(ctx(), 0, 0, vec![1], vec![0], vec![1.0]);
        let err = g.try_contract_into(ctx(), &[0, 3], 2).unwrap_err();
        assert_eq!(err, MulticutError::ClusterOutOfRange { cluster: 3, clusters: 2 });
    }

    #[test]
    fn contract_of_empty_matrix_keeps_cluster_count() {
        let g = Graph::empty(4, 4);
        let c = g.try_contract_into(ctx(), &[0, 1, 2, 0], 3).unwrap();
        assert_eq!((c.rows(), c.cols(), c.edges()), (3, 3, 0));
    }

    #[test]
    fn export_directed_drops_upper_triangle() {
        let g = Graph::new(
            ctx(),
            0,
            0,
            vec![0, 1, 2, 2],
            vec![1, 0, 2, 0],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let d = g.export_directed(ctx());
        assert_eq!(
            d.iter().collect::<Vec<_>>(),
            vec![(1, 0, 2.0), (2, 2, 3.0), (2, 0, 4.0)]
        );
        assert_eq!((d.rows(), d.cols()), (3, 3));
    }

    #[test]
    fn export_undirected_is_square() {
        let g = Graph::new(ctx(), 0, 0, vec![0], vec![4], vec![1.0]);
        let u = g.export_undirected(ctx());
        assert_eq!((u.rows(), u.cols(), u.edges()), (5, 5, 2));
        assert!(!u.sorted());
    }
}
