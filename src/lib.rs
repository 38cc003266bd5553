#![cfg_attr(docsrs, feature(doc_cfg))]
//! # parallel-gaec
//!
//! parallel-gaec is a data-parallel toolkit for approximate minimum multicut /
//! correlation clustering on large weighted graphs. It provides a sparse
//! coordinate-format graph with the transforms greedy edge contraction needs,
//! and a small-cycle packing engine that certifies a lower bound.
//!
//! ## Features
//! - [`Graph`](coo::Graph): row/col/weight arrays with sort, row offsets,
//!   contraction, diagonal extraction and directed/undirected export
//! - Parallel small-cycle (triangle and quadrilateral) packing with lock-free
//!   cost updates
//! - A greedy contraction driver with a pluggable matching heuristic
//! - Every kernel runs on an explicit [`ExecContext`](context::ExecContext)
//!
//! ## Cost convention
//!
//! A negative weight is attractive (the objective pays it when the endpoints
//! share a cluster), a positive weight is repulsive. The trivial lower bound
//! is the sum of negative weights; packing tightens it.
//!
//! ## Determinism
//!
//! Randomized scan orders use `SmallRng` seeds derived from configuration, per
//! lane, so they do not depend on scheduling. Floating-point reductions and
//! concurrent cost updates do: repeated runs may differ in the last bits.
//!
//! ## Errors
//!
//! Precondition violations are caller bugs. Checked operations come as a
//! `try_*` form returning [`MulticutError`](multicut_error::MulticutError) and
//! a panicking form.

pub mod algs;
pub mod context;
pub mod coo;
pub mod cycles;
pub mod debug_invariants;
pub mod multicut_error;
pub mod solver;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::context::{ContextConfig, ExecContext};
    pub use crate::coo::{Graph, VertexId, Weight};
    pub use crate::cycles::{
        PackingConfig, PackingReport, lower_bound, pack_cycles, small_cycle_packing,
        small_cycle_packing_lower_bound,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::multicut_error::MulticutError;
    pub use crate::solver::{
        ContractionHeuristic, GaecConfig, MulticutSolution, VertexMatching,
        greedy_additive_contraction,
    };
}
