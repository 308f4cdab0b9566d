//! Row-oriented CSV outputs.
//!
//! The long table and the offset audit carry per-cell provenance; the merge
//! mapping and concept summary describe the consolidated catalog itself.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::Writer;

use baselab_core::FeatureMatrix;
use baselab_ingest::format_timestamp;
use baselab_model::Consolidation;

use crate::common::{ensure_output_dir, format_float};

/// File name of the long provenance CSV.
pub const MATRIX_LONG_FILE: &str = "lab_matrix_long.csv";

/// File name of the offset audit CSV.
pub const OFFSETS_FILE: &str = "lab_matrix_offsets.csv";

/// File name of the merge mapping CSV.
pub const MERGE_MAPPING_FILE: &str = "merge_mapping.csv";

/// File name of the concept summary CSV.
pub const CONCEPT_SUMMARY_FILE: &str = "concept_summary.csv";

fn open_writer(output_dir: &Path, file_name: &str) -> Result<(Writer<File>, PathBuf)> {
    ensure_output_dir(output_dir)?;
    let path = output_dir.join(file_name);
    let writer =
        Writer::from_path(&path).with_context(|| format!("create {}", path.display()))?;
    Ok((writer, path))
}

/// Write the long table: one row per resolved cell, carrying the source
/// observation in full together with its window offset.
pub fn write_matrix_long(output_dir: &Path, matrix: &FeatureMatrix) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(output_dir, MATRIX_LONG_FILE)?;
    writer.write_record([
        "hadm_id",
        "subject_id",
        "itemid",
        "column",
        "charttime",
        "day_offset",
        "source",
        "valuenum",
        "value",
        "valueuom",
        "flag",
        "ref_range_lower",
        "ref_range_upper",
    ])?;
    for entry in matrix.provenance() {
        let value = entry.value;
        writer.write_record([
            entry.encounter_id().to_string(),
            entry.row.encounter.subject.to_string(),
            value.concept.to_string(),
            entry.column.name.clone(),
            format_timestamp(value.charttime),
            value.offset.days().to_string(),
            value.offset.source_tag().to_string(),
            value.value_num.map(format_float).unwrap_or_default(),
            value.value_text.clone().unwrap_or_default(),
            value.unit.clone().unwrap_or_default(),
            value.flag.clone().unwrap_or_default(),
            value.ref_lower.map(format_float).unwrap_or_default(),
            value.ref_upper.map(format_float).unwrap_or_default(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Write the offset audit: which window day supplied each resolved cell.
pub fn write_offsets(output_dir: &Path, matrix: &FeatureMatrix) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(output_dir, OFFSETS_FILE)?;
    writer.write_record([
        "hadm_id",
        "itemid",
        "column",
        "day_offset",
        "source",
        "charttime",
    ])?;
    for entry in matrix.provenance() {
        let value = entry.value;
        writer.write_record([
            entry.encounter_id().to_string(),
            value.concept.to_string(),
            entry.column.name.clone(),
            value.offset.days().to_string(),
            value.offset.source_tag().to_string(),
            format_timestamp(value.charttime),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Write the merge mapping: one row per merged identifier.
pub fn write_merge_mapping(output_dir: &Path, consolidation: &Consolidation) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(output_dir, MERGE_MAPPING_FILE)?;
    writer.write_record(["source_itemid", "target_itemid", "label"])?;
    for rule in consolidation.merges() {
        writer.write_record([
            rule.source.to_string(),
            rule.target.to_string(),
            rule.label.clone(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Write the concept summary: catalog metadata, merge lineage, and numeric
/// coverage for every column of the wide matrix.
///
/// `data_count` counts numeric cells only; `coverage_pct` is that count over
/// the encounter total, in percent with two decimals.
pub fn write_concept_summary(output_dir: &Path, matrix: &FeatureMatrix) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(output_dir, CONCEPT_SUMMARY_FILE)?;
    writer.write_record([
        "itemid",
        "column",
        "label",
        "category",
        "fluid",
        "merged_sources",
        "has_data",
        "data_count",
        "coverage_pct",
    ])?;
    let rows = matrix.encounter_count();
    let counts = matrix.column_numeric_counts();
    for (column, count) in matrix.columns.iter().zip(counts) {
        let coverage = if rows == 0 {
            0.0
        } else {
            count as f64 / rows as f64 * 100.0
        };
        let merged = column
            .merged_sources
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([
            column.concept.to_string(),
            column.name.clone(),
            column.label.clone(),
            column.category.clone().unwrap_or_default(),
            column.fluid.clone().unwrap_or_default(),
            merged,
            (count > 0).to_string(),
            count.to_string(),
            format!("{coverage:.2}"),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
