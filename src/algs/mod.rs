//! Parallel building blocks shared by the graph and the packing engine.

pub mod primitives;
pub mod rng;
