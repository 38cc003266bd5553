//! Parallel small-cycle packing.
//!
//! Tightens the multicut lower bound by moving cost along conflicted
//! triangles and quadrilaterals.
//!
//! ## Cost convention
//!
//! A negative weight is attractive: the objective pays it when the endpoints
//! end up in the same cluster. A positive weight is repulsive. Joining every
//! attractive edge and nothing else is the trivial bound `Σ min(0, w)`.
//!
//! ## Packing step
//!
//! A cycle is *conflicted* when exactly one of its edges is positive and all
//! others are negative; no clustering can join the negative edges while
//! separating the positive one. For such a cycle with `k` negative edges let
//!
//! `α = min(w⁺, min |w⁻|)`
//!
//! and update `w⁺ -= α`, `w⁻ += α`. The removed cost forms a cycle factor
//! whose minimum over valid clusterings is `-(k - 1)·α`; that value is kept as
//! slack. Per cycle `Σ w_before = Σ w_after + slack`, and the bound
//!
//! `Σ min(0, w_after) + Σ slack`
//!
//! is valid for any non-negative `α`, improving by `α` per packed cycle. This
//! is what makes same-round conflicts harmless: lanes sharing an edge combine
//! their deltas through [`AtomicCost`](atomic_cost::AtomicCost) and the bound
//! stays valid whatever the interleaving.
//!
//! ## Rounds
//!
//! [`pack_cycles`] runs up to `max_tries_triangles` triangle rounds and then up
//! to `max_tries_quads` quad rounds. Each round is one parallel pass with one
//! lane per edge and a freshly seeded random scan order. Triangle lanes scan
//! their whole neighbourhood, so the triangle phase ends after the first round
//! that packs nothing. Quad lanes sample under a probe cap; an empty quad round
//! ends the phase only if no lane hit the cap.

mod atomic_cost;
mod index;
mod quads;
mod triangles;

pub use self::atomic_cost::AtomicCost;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use self::atomic_cost::atomic_costs;
use self::index::CycleIndex;
use crate::algs::primitives::negative_floor;
use crate::algs::rng::stream_seed;
use crate::context::ExecContext;
use crate::coo::{Graph, VertexId, Weight};
use crate::multicut_error::MulticutError;

/// Work limits and seeding for [`pack_cycles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingConfig {
    /// Upper bound on triangle rounds; 0 disables triangle packing.
    pub max_tries_triangles: usize,
    /// Upper bound on quad rounds; 0 disables quad packing.
    pub max_tries_quads: usize,
    /// Global seed for the per-lane scan order.
    pub seed: u64,
    /// Cap on `(w, x)` edge tests per anchor edge in one quad round.
    pub max_quad_probes: usize,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            max_tries_triangles: 10,
            max_tries_quads: 0,
            seed: 42,
            max_quad_probes: 64,
        }
    }
}

impl PackingConfig {
    pub fn with_tries(max_tries_triangles: usize, max_tries_quads: usize) -> Self {
        Self {
            max_tries_triangles,
            max_tries_quads,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), MulticutError> {
        if self.max_tries_quads > 0 && self.max_quad_probes == 0 {
            return Err(MulticutError::InvalidConfig(
                "max_quad_probes must be positive when quad packing is enabled".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a packing run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PackingReport {
    /// Tightened lower bound: `Σ min(0, w_after) + slack`.
    pub lower_bound: f64,
    /// Accumulated cycle-factor minima (non-positive).
    pub slack: f64,
    pub triangles_packed: usize,
    pub quads_packed: usize,
    pub triangle_rounds: usize,
    pub quad_rounds: usize,
}

/// Per-round tally, summed across lanes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RoundStats {
    pub cycles: usize,
    pub slack: f64,
    /// Lanes that ran out of probe budget before finishing their scan.
    pub saturated: usize,
}

impl RoundStats {
    fn record(&mut self, cycles: usize, slack: f64) {
        self.cycles += cycles;
        self.slack += slack;
    }

    /// An empty round only proves there is nothing left when every lane
    /// finished its scan.
    fn exhaustive_miss(&self) -> bool {
        self.cycles == 0 && self.saturated == 0
    }
}

impl std::iter::Sum for RoundStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, s| {
            acc.record(s.cycles, s.slack);
            acc.saturated += s.saturated;
            acc
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Triangles = 1,
    Quads = 2,
}

/// Pack small cycles of `graph` in place and return the tightened bound.
///
/// Only weights change; the entries, their order and the sorted flag are
/// untouched. The input may be in any sort state: the engine builds its own
/// neighbour index. Diagonal entries are ignored.
pub fn pack_cycles(
    ctx: &ExecContext,
    graph: &mut Graph,
    cfg: &PackingConfig,
) -> Result<PackingReport, MulticutError> {
    cfg.validate()?;
    let mut report = PackingReport::default();
    if graph.edges() > 0 && (cfg.max_tries_triangles > 0 || cfg.max_tries_quads > 0) {
        let costs = ctx.install(|| -> Result<_, MulticutError> {
            let index = CycleIndex::build(graph)?;
            let costs = atomic_costs(graph.weights());

            let (rounds, stats) =
                run_phase(cfg, Phase::Triangles, cfg.max_tries_triangles, |seed| {
                    triangles::pack_round(&index, &costs, seed)
                });
            report.triangle_rounds = rounds;
            report.triangles_packed = stats.cycles;
            report.slack += stats.slack;

            let (rounds, stats) = run_phase(cfg, Phase::Quads, cfg.max_tries_quads, |seed| {
                quads::pack_round(&index, &costs, seed, cfg.max_quad_probes)
            });
            report.quad_rounds = rounds;
            report.quads_packed = stats.cycles;
            report.slack += stats.slack;
            Ok(costs)
        })?;
        ctx.install(|| {
            graph
                .weights_mut()
                .par_iter_mut()
                .zip(costs.par_iter())
                .for_each(|(w, c)| *w = c.load());
        });
    }
    report.lower_bound = ctx.install(|| negative_floor(graph.weights())) + report.slack;
    log::info!(
        "cycle packing: {} triangles in {} rounds, {} quads in {} rounds, lower bound {}",
        report.triangles_packed,
        report.triangle_rounds,
        report.quads_packed,
        report.quad_rounds,
        report.lower_bound
    );
    Ok(report)
}

/// Run up to `max_rounds` rounds of one phase, each with a fresh seed.
///
/// The phase ends early after a round that packed nothing while every lane
/// completed its scan. Sampled rounds (quad lanes hitting their probe cap)
/// never end it early.
fn run_phase<F>(
    cfg: &PackingConfig,
    phase: Phase,
    max_rounds: usize,
    mut round: F,
) -> (usize, RoundStats)
where
    F: FnMut(u64) -> RoundStats,
{
    let mut total = RoundStats::default();
    for r in 0..max_rounds {
        let seed = stream_seed(cfg.seed, ((phase as u64) << 32) | r as u64);
        let stats = round(seed);
        log::trace!(
            "{} round {}: packed {} cycles, slack {}, {} lanes saturated",
            phase,
            r,
            stats.cycles,
            stats.slack,
            stats.saturated
        );
        if stats.exhaustive_miss() {
            return (r + 1, total);
        }
        total.record(stats.cycles, stats.slack);
    }
    if max_rounds > 0 && total.cycles > 0 {
        log::warn!(
            "{} packing stopped at the {} round limit while still finding cycles",
            phase,
            max_rounds
        );
    }
    (max_rounds, total)
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Triangles => "triangle",
            Phase::Quads => "quad",
        })
    }
}

/// Lower bound of `graph` after packing, leaving `graph` unchanged.
pub fn lower_bound(
    ctx: &ExecContext,
    graph: &Graph,
    cfg: &PackingConfig,
) -> Result<f64, MulticutError> {
    let mut scratch = graph.clone();
    pack_cycles(ctx, &mut scratch, cfg).map(|r| r.lower_bound)
}

/// Build a graph from edge triples, pack it, and return the bound together
/// with the reweighted graph.
pub fn small_cycle_packing(
    ctx: &ExecContext,
    i: &[VertexId],
    j: &[VertexId],
    costs: &[Weight],
    max_tries_triangles: usize,
    max_tries_quads: usize,
) -> Result<(f64, Graph), MulticutError> {
    let mut graph = Graph::from_slices(ctx, i, j, costs)?;
    let cfg = PackingConfig::with_tries(max_tries_triangles, max_tries_quads);
    let report = pack_cycles(ctx, &mut graph, &cfg)?;
    Ok((report.lower_bound, graph))
}

/// Bound-only form of [`small_cycle_packing`].
pub fn small_cycle_packing_lower_bound(
    ctx: &ExecContext,
    i: &[VertexId],
    j: &[VertexId],
    costs: &[Weight],
    max_tries_triangles: usize,
    max_tries_quads: usize,
) -> Result<f64, MulticutError> {
    small_cycle_packing(ctx, i, j, costs, max_tries_triangles, max_tries_quads).map(|(lb, _)| lb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> &'static ExecContext {
        ExecContext::global()
    }

    #[test]
    fn zero_tries_gives_negative_floor() {
        let mut g = Graph::new(ctx(), 0, 0, vec![1, 2, 2], vec![0, 1, 0], vec![-2.0, -3.0, 5.0]);
        let report = pack_cycles(ctx(), &mut g, &PackingConfig::with_tries(0, 0)).unwrap();
        assert_eq!(report.lower_bound, -5.0);
        assert_eq!(g.weights(), &[-2.0, -3.0, 5.0]);
    }

    #[test]
    fn phase_stops_after_an_empty_round() {
        let mut g = Graph::new(ctx(), 0, 0, vec![1, 2, 2], vec![0, 1, 0], vec![-2.0, -3.0, 5.0]);
        let report = pack_cycles(ctx(), &mut g, &PackingConfig::with_tries(10, 0)).unwrap();
        assert_eq!(report.triangles_packed, 1);
        assert_eq!(report.triangle_rounds, 2);
        assert_eq!(report.lower_bound, -3.0);
    }

    #[test]
    fn saturated_empty_round_does_not_end_a_phase() {
        let mut calls = 0;
        let (rounds, stats) = run_phase(&PackingConfig::default(), Phase::Quads, 4, |_| {
            calls += 1;
            RoundStats {
                saturated: 1,
                ..Default::default()
            }
        });
        assert_eq!((calls, rounds, stats.cycles), (4, 4, 0));

        let (rounds, _) = run_phase(&PackingConfig::default(), Phase::Triangles, 4, |_| {
            RoundStats::default()
        });
        assert_eq!(rounds, 1);
        assert_eq!(Phase::Quads.to_string(), "quad");
    }

    #[test]
    fn quad_probes_must_be_positive() {
        let cfg = PackingConfig {
            max_tries_quads: 1,
            max_quad_probes: 0,
            ..Default::default()
        };
        let mut g = Graph::empty(0, 0);
        assert!(matches!(
            pack_cycles(ctx(), &mut g, &cfg),
            Err(MulticutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_graph_has_zero_bound() {
        let lb = small_cycle_packing_lower_bound(ctx(), &[], &[], &[], 5, 5).unwrap();
        assert_eq!(lb, 0.0);
    }

    #[test]
    fn config_reads_partial_json() {
        let cfg: PackingConfig = serde_json::from_str(r#"{"max_tries_quads": 3}"#).unwrap();
        assert_eq!(cfg.max_tries_quads, 3);
        assert_eq!(cfg.max_tries_triangles, 10);
    }
}
