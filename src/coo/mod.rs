//! Sparse coordinate-format graph representation.
//!
//! [`Graph`] owns three parallel arrays `(row, col, weight)` and provides the
//! data-parallel transforms the multicut solver is built on: sorting,
//! row-offset indexing, contraction, diagonal extraction and
//! directed/undirected conversion.

mod core;
mod transform;

pub use self::core::{Graph, VertexId, Weight};
