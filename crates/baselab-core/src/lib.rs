//! Deterministic core of baselab: identifier consolidation, the observation
//! index, window resolution and matrix assembly.
//!
//! Everything here is a pure function over immutable snapshots. Given
//! byte-identical inputs, every stage produces identical output: there is
//! no interior mutability, no clock, no randomness.

pub mod consolidate;
pub mod index;
pub mod matrix;
pub mod resolve;

pub use consolidate::{concept_counts, consolidate};
pub use index::ObservationIndex;
pub use matrix::{
    FeatureMatrix, MatrixColumn, MatrixRow, ProvenanceEntry, SourceDistribution, build_matrix,
};
pub use resolve::WindowResolver;
