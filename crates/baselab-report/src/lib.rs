//! Output generation for baselab builds.
//!
//! This crate writes every on-disk build artifact:
//!
//! - **Wide matrix**: one row per encounter, one column per concept
//! - **Long table**: one row per resolved cell, with full provenance
//! - **Offset audit**: which window day supplied each cell
//! - **Merge mapping / concept summary**: consolidation lineage and coverage
//! - **Build summary**: machine-readable JSON describing the whole build

mod common;
mod summary;
mod tables;
mod wide;

// Re-export public types and functions
pub use summary::{
    BUILD_SUMMARY_FILE, BuildSummary, ConsolidationSummary, InputSummary, MatrixSummary,
    SUMMARY_SCHEMA, SUMMARY_SCHEMA_VERSION, SourceSummary, WarningSummary, write_build_summary,
};
pub use tables::{
    CONCEPT_SUMMARY_FILE, MATRIX_LONG_FILE, MERGE_MAPPING_FILE, OFFSETS_FILE,
    write_concept_summary, write_matrix_long, write_merge_mapping, write_offsets,
};
pub use wide::{MATRIX_WIDE_FILE, matrix_frame, write_matrix_wide};
