//! Wide feature-matrix output.
//!
//! One row per encounter, one feature column per post-consolidation
//! concept, preceded by the encounter metadata columns. Cells without a
//! resolved numeric value stay empty; nothing is imputed.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{Column, CsvWriter, DataFrame, NamedFrom, SerWriter, Series};

use baselab_core::FeatureMatrix;
use baselab_ingest::format_timestamp;

use crate::common::ensure_output_dir;

/// File name of the wide matrix CSV.
pub const MATRIX_WIDE_FILE: &str = "lab_matrix_wide.csv";

/// Build the wide matrix as a polars frame.
///
/// Metadata columns come first (`hadm_id`, `subject_id`, `admittime`,
/// `admit_date`, `hospital_expire_flag`, `deathtime`), then one `f64`
/// column per feature in catalog order.
pub fn matrix_frame(matrix: &FeatureMatrix) -> Result<DataFrame> {
    let rows = matrix.rows.len();
    let mut hadm_id: Vec<i64> = Vec::with_capacity(rows);
    let mut subject_id: Vec<i64> = Vec::with_capacity(rows);
    let mut admittime: Vec<Option<String>> = Vec::with_capacity(rows);
    let mut admit_date: Vec<Option<String>> = Vec::with_capacity(rows);
    let mut expire_flag: Vec<Option<String>> = Vec::with_capacity(rows);
    let mut deathtime: Vec<Option<String>> = Vec::with_capacity(rows);
    for row in &matrix.rows {
        let encounter = &row.encounter;
        hadm_id.push(encounter.id.get());
        subject_id.push(encounter.subject.get());
        admittime.push(encounter.admittime.map(format_timestamp));
        admit_date.push(
            encounter
                .anchor_date()
                .map(|date| date.format("%Y-%m-%d").to_string()),
        );
        expire_flag.push(encounter.expire_flag.clone());
        deathtime.push(encounter.deathtime.clone());
    }

    let mut columns: Vec<Column> = Vec::with_capacity(matrix.columns.len() + 6);
    columns.push(Series::new("hadm_id".into(), hadm_id).into());
    columns.push(Series::new("subject_id".into(), subject_id).into());
    columns.push(Series::new("admittime".into(), admittime).into());
    columns.push(Series::new("admit_date".into(), admit_date).into());
    columns.push(Series::new("hospital_expire_flag".into(), expire_flag).into());
    columns.push(Series::new("deathtime".into(), deathtime).into());
    for (index, column) in matrix.columns.iter().enumerate() {
        let values: Vec<Option<f64>> = matrix
            .rows
            .iter()
            .map(|row| row.cells[index].as_ref().and_then(|cell| cell.value_num))
            .collect();
        columns.push(Series::new(column.name.as_str().into(), values).into());
    }

    DataFrame::new(columns).context("build wide matrix frame")
}

/// Write `lab_matrix_wide.csv` into `output_dir` and return its path.
pub fn write_matrix_wide(output_dir: &Path, matrix: &FeatureMatrix) -> Result<PathBuf> {
    ensure_output_dir(output_dir)?;
    let path = output_dir.join(MATRIX_WIDE_FILE);
    let mut frame = matrix_frame(matrix)?;
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file))
        .include_header(true)
        .finish(&mut frame)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}
