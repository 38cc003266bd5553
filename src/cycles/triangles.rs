//! Triangle search-and-pack kernel.
//!
//! One lane per edge. A lane only works on its edge while the edge is
//! positive: a conflicted triangle has exactly one positive edge, so anchoring
//! on it means each triangle is owned by a single lane. The lane walks the
//! neighbours of the lower-degree endpoint, starting at a random position,
//! and packs every conflicted triangle it meets until its edge reaches zero.

use rand::Rng;
use rayon::prelude::*;

use super::RoundStats;
use super::atomic_cost::AtomicCost;
use super::index::CycleIndex;
use crate::algs::rng::lane_rng;

/// Run one parallel triangle round over all edges.
pub(super) fn pack_round(index: &CycleIndex, costs: &[AtomicCost], seed: u64) -> RoundStats {
    (0..index.edges())
        .into_par_iter()
        .map(|anchor| pack_anchor(index, costs, seed, anchor))
        .sum()
}

fn pack_anchor(index: &CycleIndex, costs: &[AtomicCost], seed: u64, anchor: usize) -> RoundStats {
    let mut stats = RoundStats::default();
    let (u, v) = index.endpoints(anchor);
    if u == v || costs[anchor].load() <= 0.0 {
        return stats;
    }
    let (a, b) = if index.degree(u) <= index.degree(v) {
        (u, v)
    } else {
        (v, u)
    };
    let (nbrs, edges) = index.neighbours(a);
    if nbrs.is_empty() {
        return stats;
    }
    let start = lane_rng(seed, anchor).gen_range(0..nbrs.len());
    for k in 0..nbrs.len() {
        let slot = (start + k) % nbrs.len();
        let w = nbrs[slot];
        if w == b {
            continue;
        }
        let e_aw = edges[slot];
        if costs[e_aw].load() >= 0.0 {
            continue;
        }
        let Some(e_bw) = index.find_edge(b, w) else {
            continue;
        };
        let alpha = costs[anchor]
            .load()
            .min(-costs[e_aw].load())
            .min(-costs[e_bw].load());
        if alpha <= 0.0 {
            continue;
        }
        costs[anchor].fetch_add(-alpha);
        costs[e_aw].fetch_add(alpha);
        costs[e_bw].fetch_add(alpha);
        // Cycle factor with +α on one edge and -α on two: its minimum is -α.
        stats.record(1, -(alpha as f64));
        if costs[anchor].load() <= 0.0 {
            break;
        }
    }
    stats
}
