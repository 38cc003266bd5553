//! Greedy contraction on top of the coordinate graph and cycle packing.
//!
//! The matching heuristic sits behind [`ContractionHeuristic`] so callers can
//! plug in their own merge selection.

pub mod gaec;
pub mod matching;

pub use self::gaec::{
    GaecConfig, MulticutSolution, greedy_additive_contraction, greedy_additive_contraction_with,
};
pub use self::matching::{ContractionHeuristic, VertexMatching};
