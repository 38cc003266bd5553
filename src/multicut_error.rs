//! MulticutError: Unified error type for parallel-gaec public APIs
//!
//! Precondition-checked operations come in two flavours: a `try_*` form that
//! returns this error, and a panicking form that fails loudly with the same
//! message. A wrong row-offset table corrupts every downstream neighbour
//! lookup, so nothing in the crate silently corrects bad input.

use thiserror::Error;

/// Unified error type for graph and packing operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MulticutError {
    /// The row, column and weight sequences do not have the same length.
    #[error("Length mismatch: {rows} row ids, {cols} col ids, {weights} weights")]
    LengthMismatch {
        rows: usize,
        cols: usize,
        weights: usize,
    },
    /// A row index is not strictly below the row count.
    #[error("Row index {index} out of range for {rows} rows")]
    RowOutOfRange { index: u32, rows: usize },
    /// A column index is not strictly below the column count.
    #[error("Column index {index} out of range for {cols} columns")]
    ColOutOfRange { index: u32, cols: usize },
    /// An operation that needs row-sorted entries was called on an unsorted matrix.
    #[error("Operation `{0}` requires a sorted matrix; call sort() first")]
    NotSorted(&'static str),
    /// The node mapping passed to contraction does not cover every vertex.
    #[error("Node mapping has {got} entries but the matrix spans {needed} vertices")]
    MappingTooShort { got: usize, needed: usize },
    /// A cluster id in the node mapping is not below the cluster count.
    #[error("Cluster id {cluster} out of range for {clusters} clusters")]
    ClusterOutOfRange { cluster: u32, clusters: usize },
    /// A buffer could not be allocated.
    #[error("Allocation of {requested} elements failed")]
    Allocation { requested: usize },
    /// A configuration value is outside its valid domain.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
