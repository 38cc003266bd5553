//! Quadrilateral search-and-pack kernel.
//!
//! For a positive anchor edge `(u, v)` the lane looks for `u - w - x - v`
//! with all three edges negative: it walks negative neighbours `w` of `u` and
//! `x` of `v` from random start positions and tests `(w, x)` by binary search.
//! The number of `(w, x)` tests per lane is capped, since the pair space grows
//! with the product of the two degrees. A lane that hits the cap reports itself
//! as saturated: its round was a sample, not a full scan.

use rand::Rng;
use rayon::prelude::*;

use super::RoundStats;
use super::atomic_cost::AtomicCost;
use super::index::CycleIndex;
use crate::algs::rng::lane_rng;

/// Run one parallel quad round over all edges.
pub(super) fn pack_round(
    index: &CycleIndex,
    costs: &[AtomicCost],
    seed: u64,
    max_probes: usize,
) -> RoundStats {
    (0..index.edges())
        .into_par_iter()
        .map(|anchor| pack_anchor(index, costs, seed, max_probes, anchor))
        .sum()
}

fn pack_anchor(
    index: &CycleIndex,
    costs: &[AtomicCost],
    seed: u64,
    max_probes: usize,
    anchor: usize,
) -> RoundStats {
    let mut stats = RoundStats::default();
    let (u, v) = index.endpoints(anchor);
    if u == v || costs[anchor].load() <= 0.0 {
        return stats;
    }
    let (u_nbrs, u_edges) = index.neighbours(u);
    let (v_nbrs, v_edges) = index.neighbours(v);
    if u_nbrs.len() < 2 || v_nbrs.len() < 2 {
        return stats;
    }
    let mut rng = lane_rng(seed, anchor);
    let u_start = rng.gen_range(0..u_nbrs.len());
    let v_start = rng.gen_range(0..v_nbrs.len());
    let mut probes = 0usize;

    'outer: for i in 0..u_nbrs.len() {
        let si = (u_start + i) % u_nbrs.len();
        let w = u_nbrs[si];
        let e_uw = u_edges[si];
        if w == v || costs[e_uw].load() >= 0.0 {
            continue;
        }
        for j in 0..v_nbrs.len() {
            let sj = (v_start + j) % v_nbrs.len();
            let x = v_nbrs[sj];
            let e_vx = v_edges[sj];
            if x == u || x == w || costs[e_vx].load() >= 0.0 {
                continue;
            }
            if probes == max_probes {
                stats.saturated = 1;
                break 'outer;
            }
            probes += 1;
            let Some(e_wx) = index.find_edge(w, x) else {
                continue;
            };
            let alpha = costs[anchor]
                .load()
                .min(-costs[e_uw].load())
                .min(-costs[e_vx].load())
                .min(-costs[e_wx].load());
            if alpha <= 0.0 {
                continue;
            }
            costs[anchor].fetch_add(-alpha);
            costs[e_uw].fetch_add(alpha);
            costs[e_vx].fetch_add(alpha);
            costs[e_wx].fetch_add(alpha);
            // Three negative edges: the cycle factor bottoms out at -2α.
            stats.record(1, -2.0 * alpha as f64);
            if costs[anchor].load() <= 0.0 {
                break 'outer;
            }
            if costs[e_uw].load() >= 0.0 {
                continue 'outer;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecContext;
    use crate::coo::Graph;
    use crate::cycles::atomic_cost::atomic_costs;

    fn square(weights: Vec<f32>) -> Graph {
        // 0-1, 1-2, 2-3, 3-0
        Graph::new(ExecContext::global(), 0, 0, vec![1, 2, 3, 3], vec![0, 1, 2, 0], weights)
    }

    #[test]
    fn packs_conflicted_square() {
        let ctx = ExecContext::global();
        let g = square(vec![4.0, -1.0, -3.0, -2.0]);
        let (stats, after) = ctx.install(|| {
            let idx = CycleIndex::build(&g).unwrap();
            let costs = atomic_costs(g.weights());
            let stats = pack_round(&idx, &costs, 11, 64);
            let after: Vec<f32> = costs.into_iter().map(AtomicCost::into_inner).collect();
            (stats, after)
        });
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.slack, -2.0);
        assert_eq!(stats.saturated, 0);
        assert_eq!(after, vec![3.0, 0.0, -2.0, -1.0]);
    }

    #[test]
    fn zero_probe_budget_packs_nothing() {
        let ctx = ExecContext::global();
        let g = square(vec![4.0, -1.0, -3.0, -2.0]);
        let stats = ctx.install(|| {
            let idx = CycleIndex::build(&g).unwrap();
            pack_round(&idx, &atomic_costs(g.weights()), 11, 0)
        });
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.saturated, 1);
    }
}
