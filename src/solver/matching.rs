//! Vertex-based matching: choose which vertices to merge next.

use rayon::prelude::*;

use crate::algs::primitives::compact_indices;
use crate::context::ExecContext;
use crate::coo::{Graph, VertexId};
use crate::multicut_error::MulticutError;

/// Picks a set of vertex merges for one contraction step.
///
/// Implementations return a mapping with one entry per vertex of `graph`
/// (`max(rows, cols)` entries) onto `0..clusters`, surjective. Returning
/// `clusters == max(rows, cols)` means nothing is merged.
pub trait ContractionHeuristic: Sync {
    fn select(
        &self,
        ctx: &ExecContext,
        graph: &Graph,
    ) -> Result<(Vec<VertexId>, usize), MulticutError>;
}

/// Each vertex proposes to its most attractive neighbour (most negative
/// weight, lowest id on ties); mutual proposals are merged.
///
/// Some pair is always mutual while any attractive edge remains, so every
/// step makes progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexMatching;

impl ContractionHeuristic for VertexMatching {
    fn select(
        &self,
        ctx: &ExecContext,
        graph: &Graph,
    ) -> Result<(Vec<VertexId>, usize), MulticutError> {
        let n = graph.rows().max(graph.cols());
        let mut sym = graph.try_export_undirected(ctx)?;
        sym.sort(ctx);
        let offsets = sym.try_row_offsets(ctx)?;
        let (cols, weights) = (sym.col_ids(), sym.weights());

        Ok(ctx.install(|| {
            let best: Vec<Option<VertexId>> = (0..n)
                .into_par_iter()
                .map(|v| {
                    let range = offsets[v]..offsets[v + 1];
                    cols[range.clone()]
                        .iter()
                        .zip(&weights[range])
                        .filter(|&(&c, &w)| w < 0.0 && c as usize != v)
                        .min_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
                        .map(|(&c, _)| c)
                })
                .collect();

            let rep: Vec<VertexId> = (0..n)
                .into_par_iter()
                .map(|v| match best[v] {
                    Some(b) if best[b as usize] == Some(v as VertexId) => b.min(v as VertexId),
                    _ => v as VertexId,
                })
                .collect();
            let reps = compact_indices(n, |v| rep[v] as usize == v);
            let mapping = rep
                .par_iter()
                .map(|&r| reps.partition_point(|&x| x < r as usize) as VertexId)
                .collect();
            log::trace!("matching merged {} of {} vertices", n - reps.len(), n);
            (mapping, reps.len())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutual_proposals_merge() {
        let ctx = ExecContext::global();
        // path 0 -(-1)- 1 -(-3)- 2 -(+2)- 3
        let g = Graph::new(ctx, 0, 0, vec![1, 2, 3], vec![0, 1, 2], vec![-1.0, -3.0, 2.0]);
        let (mapping, clusters) = VertexMatching.select(ctx, &g).unwrap();
        assert_eq!(clusters, 3);
        assert_eq!(mapping, vec![0, 1, 1, 2]);
    }

    #[test]
    fn repulsive_graph_is_left_alone() {
        let ctx = ExecContext::global();
        let g = Graph::new(ctx, 0, 0, vec![1, 2], vec![0, 1], vec![1.0, 2.0]);
        let (mapping, clusters) = VertexMatching.select(ctx, &g).unwrap();
        assert_eq!(clusters, 3);
        assert_eq!(mapping, vec![0, 1, 2]);
    }
}
