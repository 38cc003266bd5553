//! Undirected neighbour index used by the cycle searches.
//!
//! Every off-diagonal entry `e = (r, c)` of the graph contributes two
//! adjacency slots, `r -> c` and `c -> r`, both pointing back at `e`. Slots are
//! sorted by `(vertex, neighbour)`, so a vertex's neighbours form one
//! contiguous, ordered run and edge lookup is a binary search.

use rayon::prelude::*;

use crate::algs::primitives::{
    apply_permutation, compact_indices, compute_offsets, lexicographic_permutation, try_alloc,
};
use crate::coo::{Graph, VertexId};
use crate::multicut_error::MulticutError;

#[derive(Debug)]
pub struct CycleIndex {
    offsets: Vec<usize>,
    neighbours: Vec<VertexId>,
    edge_of: Vec<usize>,
    endpoints: Vec<(VertexId, VertexId)>,
}

impl CycleIndex {
    /// Build the index. Must run inside the caller's execution context.
    pub fn build(graph: &Graph) -> Result<Self, MulticutError> {
        let (rows, cols) = (graph.row_ids(), graph.col_ids());
        let n = graph.rows().max(graph.cols());
        let live = compact_indices(graph.edges(), |e| rows[e] != cols[e]);

        let slots = 2 * live.len();
        let mut from = try_alloc::<VertexId>(slots)?;
        let mut to = try_alloc::<VertexId>(slots)?;
        let mut edge_of = try_alloc::<usize>(slots)?;
        from.par_extend(
            live.par_iter()
                .map(|&e| rows[e])
                .chain(live.par_iter().map(|&e| cols[e])),
        );
        to.par_extend(
            live.par_iter()
                .map(|&e| cols[e])
                .chain(live.par_iter().map(|&e| rows[e])),
        );
        edge_of.par_extend(live.par_iter().chain(live.par_iter()).copied());

        let perm = lexicographic_permutation(&from, &to);
        apply_permutation(&mut from, &perm);
        apply_permutation(&mut to, &perm);
        apply_permutation(&mut edge_of, &perm);
        let offsets = compute_offsets(&from, n);

        let endpoints = rows
            .par_iter()
            .zip(cols.par_iter())
            .map(|(&r, &c)| (r, c))
            .collect();
        Ok(Self {
            offsets,
            neighbours: to,
            edge_of,
            endpoints,
        })
    }

    /// Number of graph entries (edge ids range over `0..edges()`).
    pub fn edges(&self) -> usize {
        self.endpoints.len()
    }

    #[inline]
    pub fn endpoints(&self, edge: usize) -> (VertexId, VertexId) {
        self.endpoints[edge]
    }

    #[inline]
    pub fn degree(&self, v: VertexId) -> usize {
        let v = v as usize;
        self.offsets[v + 1] - self.offsets[v]
    }

    /// Neighbour ids of `v` and the edge id behind each, in neighbour order.
    #[inline]
    pub fn neighbours(&self, v: VertexId) -> (&[VertexId], &[usize]) {
        let v = v as usize;
        let range = self.offsets[v]..self.offsets[v + 1];
        (&self.neighbours[range.clone()], &self.edge_of[range])
    }

    /// Edge id joining `u` and `v`, if any. With duplicate entries the first
    /// in sorted order is returned.
    #[inline]
    pub fn find_edge(&self, u: VertexId, v: VertexId) -> Option<usize> {
        let (nbrs, edges) = self.neighbours(u);
        let pos = nbrs.partition_point(|&w| w < v);
        (nbrs.get(pos) == Some(&v)).then(|| edges[pos])
    }
}
