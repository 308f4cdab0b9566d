//! Machine-readable build summary.
//!
//! One JSON document per build: input fingerprints, matrix shape and
//! coverage, window-day distribution, the consolidation outcome, and
//! data-quality warning counts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use baselab_core::FeatureMatrix;
use baselab_ingest::InputDigest;
use baselab_model::{Consolidation, InputKind, MergeRule, QualityReport, UnmergedGroup};

use crate::common::ensure_output_dir;

/// Schema identifier embedded in every build summary.
pub const SUMMARY_SCHEMA: &str = "baselab.build-summary";

/// Current summary schema version.
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// File name of the build summary JSON.
pub const BUILD_SUMMARY_FILE: &str = "build_summary.json";

#[derive(Debug, Serialize)]
pub struct InputSummary {
    pub kind: String,
    pub path: String,
    pub sha256: String,
    pub records: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
pub struct MatrixSummary {
    pub encounters: usize,
    pub columns: usize,
    pub cells: usize,
    pub resolved_cells: usize,
    pub numeric_cells: usize,
    pub numeric_coverage_pct: f64,
}

#[derive(Debug, Serialize)]
pub struct SourceSummary {
    pub day0: usize,
    pub day_minus1: usize,
    pub day_plus1: usize,
}

#[derive(Debug, Serialize)]
pub struct ConsolidationSummary {
    pub labels_evaluated: usize,
    pub merged_groups: usize,
    pub merged_identifiers: usize,
    pub merges: Vec<MergeRule>,
    pub unmerged: Vec<UnmergedGroup>,
}

#[derive(Debug, Serialize)]
pub struct WarningSummary {
    pub total: usize,
    pub catalog: usize,
    pub observations: usize,
    pub encounters: usize,
}

#[derive(Debug, Serialize)]
pub struct BuildSummary {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub inputs: Vec<InputSummary>,
    pub matrix: MatrixSummary,
    pub sources: SourceSummary,
    pub consolidation: ConsolidationSummary,
    pub warnings: WarningSummary,
}

impl BuildSummary {
    /// Assemble the summary for one finished build.
    pub fn new(
        digests: &[InputDigest],
        matrix: &FeatureMatrix,
        consolidation: &Consolidation,
        quality: &QualityReport,
    ) -> Self {
        let cells = matrix.cell_count();
        let numeric = matrix.numeric_count();
        let coverage = if cells == 0 {
            0.0
        } else {
            numeric as f64 / cells as f64 * 100.0
        };
        let distribution = matrix.source_distribution();
        Self {
            schema: SUMMARY_SCHEMA,
            schema_version: SUMMARY_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            inputs: digests
                .iter()
                .map(|digest| InputSummary {
                    kind: digest.kind.to_string(),
                    path: digest.path.display().to_string(),
                    sha256: digest.sha256.clone(),
                    records: digest.records,
                    warnings: digest.warnings,
                })
                .collect(),
            matrix: MatrixSummary {
                encounters: matrix.encounter_count(),
                columns: matrix.column_count(),
                cells,
                resolved_cells: matrix.resolved_count(),
                numeric_cells: numeric,
                numeric_coverage_pct: (coverage * 100.0).round() / 100.0,
            },
            sources: SourceSummary {
                day0: distribution.day0,
                day_minus1: distribution.day_minus1,
                day_plus1: distribution.day_plus1,
            },
            consolidation: ConsolidationSummary {
                labels_evaluated: consolidation.labels_evaluated(),
                merged_groups: consolidation.merged_groups(),
                merged_identifiers: consolidation.merged_identifiers(),
                merges: consolidation.merges().to_vec(),
                unmerged: consolidation.unmerged().to_vec(),
            },
            warnings: WarningSummary {
                total: quality.total(),
                catalog: quality.count_for(InputKind::Catalog),
                observations: quality.count_for(InputKind::Observations),
                encounters: quality.count_for(InputKind::Encounters),
            },
        }
    }
}

/// Write `build_summary.json` into `output_dir` and return its path.
pub fn write_build_summary(output_dir: &Path, summary: &BuildSummary) -> Result<PathBuf> {
    ensure_output_dir(output_dir)?;
    let path = output_dir.join(BUILD_SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary).context("serialize build summary")?;
    std::fs::write(&path, format!("{json}\n"))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
