//! Greedy additive edge contraction driver.
//!
//! Each step packs small cycles on the current graph, asks a
//! [`ContractionHeuristic`] for merges on the packed costs, contracts the
//! graph and folds the step mapping into the per-vertex labels. The run ends
//! when no merge is proposed. The bound packed on the input graph in the first
//! step certifies the result.
//!
//! Packing moves cost off conflicted cycles, so an attractive edge that sits
//! on a cycle with a strong repulsive edge looks weaker to the heuristic than
//! an equally attractive edge that does not. Contraction itself always uses
//! the unpacked costs. When the packed costs propose nothing, the step falls
//! back to the unpacked ones so no attractive cluster pair is left behind.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::matching::{ContractionHeuristic, VertexMatching};
use crate::context::ExecContext;
use crate::coo::{Graph, VertexId, Weight};
use crate::cycles::{self, PackingConfig};
use crate::multicut_error::MulticutError;

/// Settings for [`greedy_additive_contraction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaecConfig {
    pub packing: PackingConfig,
    /// Whether to report the lower bound packed on the input graph.
    pub compute_lower_bound: bool,
    /// Pack each step's graph and select merges on the packed costs.
    pub guide_with_packing: bool,
    /// Upper bound on contraction steps.
    pub max_iterations: usize,
}

impl Default for GaecConfig {
    fn default() -> Self {
        Self {
            packing: PackingConfig::default(),
            compute_lower_bound: true,
            guide_with_packing: true,
            max_iterations: usize::MAX,
        }
    }
}

/// Result of a contraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct MulticutSolution {
    /// Cluster id per input vertex, dense in `0..clusters`.
    pub node_labels: Vec<VertexId>,
    pub clusters: usize,
    /// Sum of the weights of input edges whose endpoints share a cluster.
    pub objective: f64,
    pub lower_bound: Option<f64>,
    pub iterations: usize,
    /// `node_labels` as they stood after each contraction step.
    pub timeline: Vec<Vec<VertexId>>,
}

/// Solve with the default [`VertexMatching`] heuristic.
pub fn greedy_additive_contraction(
    ctx: &ExecContext,
    i: &[VertexId],
    j: &[VertexId],
    costs: &[Weight],
    cfg: &GaecConfig,
) -> Result<MulticutSolution, MulticutError> {
    greedy_additive_contraction_with(ctx, i, j, costs, cfg, &VertexMatching)
}

/// Solve with a caller-supplied heuristic.
pub fn greedy_additive_contraction_with<H: ContractionHeuristic>(
    ctx: &ExecContext,
    i: &[VertexId],
    j: &[VertexId],
    costs: &[Weight],
    cfg: &GaecConfig,
    heuristic: &H,
) -> Result<MulticutSolution, MulticutError> {
    cfg.packing.validate()?;
    let input = Graph::from_slices(ctx, i, j, costs)?;
    let mut graph = canonicalize(ctx, &input)?;
    let n = graph.rows();

    let first = if cfg.guide_with_packing {
        Some(packed_copy(ctx, &graph, &cfg.packing)?)
    } else {
        None
    };
    let lower_bound = match (&first, cfg.compute_lower_bound) {
        (_, false) => None,
        (Some((_, bound)), true) => Some(*bound),
        (None, true) => Some(cycles::lower_bound(ctx, &graph, &cfg.packing)?),
    };
    let mut guide = first.map(|(packed, _)| packed);

    let mut labels: Vec<VertexId> = ctx.install(|| (0..n as VertexId).into_par_iter().collect());
    let mut timeline = Vec::new();
    let mut iterations = 0;
    while iterations < cfg.max_iterations {
        let packed = match guide.take() {
            Some(packed) => Some(packed),
            None if cfg.guide_with_packing => Some(packed_copy(ctx, &graph, &cfg.packing)?.0),
            None => None,
        };
        let (mapping, clusters) = select_merges(ctx, heuristic, &graph, packed.as_ref())?;
        if clusters == graph.rows() {
            break;
        }
        let contracted = graph.try_contract_into(ctx, &mapping, clusters)?;
        graph = canonicalize(ctx, &contracted)?;
        labels = ctx.install(|| labels.par_iter().map(|&l| mapping[l as usize]).collect());
        timeline.push(labels.clone());
        iterations += 1;
        log::debug!(
            "contraction step {}: {} clusters, {} edges",
            iterations,
            clusters,
            graph.edges()
        );
    }

    let objective = ctx.install(|| {
        input
            .row_ids()
            .par_iter()
            .zip(input.col_ids().par_iter())
            .zip(input.weights().par_iter())
            .filter(|((r, c), _)| r != c && labels[**r as usize] == labels[**c as usize])
            .map(|(_, &w)| w as f64)
            .sum()
    });
    log::info!(
        "greedy contraction: {} clusters after {} steps, objective {}, lower bound {:?}",
        graph.rows(),
        iterations,
        objective,
        lower_bound
    );
    Ok(MulticutSolution {
        node_labels: labels,
        clusters: graph.rows(),
        objective,
        lower_bound,
        iterations,
        timeline,
    })
}

/// Packed clone of `graph` and the bound the packing certified.
fn packed_copy(
    ctx: &ExecContext,
    graph: &Graph,
    cfg: &PackingConfig,
) -> Result<(Graph, f64), MulticutError> {
    let mut packed = graph.clone();
    let report = cycles::pack_cycles(ctx, &mut packed, cfg)?;
    Ok((packed, report.lower_bound))
}

/// Merges for one step: from the packed costs when given, else (or when those
/// propose nothing) from the graph's own costs.
fn select_merges<H: ContractionHeuristic>(
    ctx: &ExecContext,
    heuristic: &H,
    graph: &Graph,
    packed: Option<&Graph>,
) -> Result<(Vec<VertexId>, usize), MulticutError> {
    if let Some(packed) = packed {
        let (mapping, clusters) = heuristic.select(ctx, packed)?;
        if clusters < graph.rows() {
            return Ok((mapping, clusters));
        }
        log::trace!("packed costs propose no merge; using unpacked costs");
    }
    heuristic.select(ctx, graph)
}

/// One entry per unordered vertex pair, oriented `row > col`, parallel
/// entries summed and loops dropped. The result is square.
fn canonicalize(ctx: &ExecContext, graph: &Graph) -> Result<Graph, MulticutError> {
    let n = graph.rows().max(graph.cols());
    let identity: Vec<VertexId> = ctx.install(|| (0..n as VertexId).into_par_iter().collect());
    graph
        .try_export_undirected(ctx)?
        .export_directed(ctx)
        .try_contract_into(ctx, &identity, n)
}
