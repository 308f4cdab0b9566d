use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use comfy_table::Table;
use tracing::{info, info_span, warn};

use baselab_core::{FeatureMatrix, ObservationIndex, build_matrix, concept_counts, consolidate};
use baselab_ingest::{InputDigest, InputPaths, InputSet, read_catalog, read_observations};
use baselab_model::{ConceptId, Consolidation, QualityReport};
use baselab_report::{
    BuildSummary, write_build_summary, write_concept_summary, write_matrix_long, write_matrix_wide,
    write_merge_mapping, write_offsets,
};

use crate::cli::{BuildArgs, ConsolidateArgs};
use crate::summary::apply_table_style;
use crate::types::BuildResult;

pub fn run_build(args: &BuildArgs) -> Result<BuildResult> {
    let data_dir = &args.data_dir;
    let build_span = info_span!("build", data_dir = %data_dir.display());
    let _build_guard = build_span.enter();
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("output"));
    let paths = input_paths(
        data_dir,
        args.catalog.as_ref(),
        args.observations.as_ref(),
        args.encounters.as_ref(),
    );

    // =========================================================================
    // Stage 1: Load inputs
    // =========================================================================
    let ingest_span = info_span!("ingest", data_dir = %data_dir.display());
    let ingest_start = Instant::now();
    let InputSet {
        catalog,
        observations,
        encounters,
        digests,
        quality,
    } = ingest_span.in_scope(|| InputSet::load(&paths))?;
    info!(
        concepts = catalog.len(),
        observations = observations.len(),
        encounters = encounters.len(),
        warnings = quality.total(),
        duration_ms = ingest_start.elapsed().as_millis(),
        "inputs loaded"
    );

    // =========================================================================
    // Stage 2: Consolidate duplicate identifiers
    // =========================================================================
    let consolidate_span = info_span!("consolidate");
    let consolidate_start = Instant::now();
    let consolidation = consolidate_span.in_scope(|| {
        let counts = concept_counts(&observations);
        consolidate(&catalog, &counts)
    });
    info!(
        labels_evaluated = consolidation.labels_evaluated(),
        merged_groups = consolidation.merged_groups(),
        merged_identifiers = consolidation.merged_identifiers(),
        unmerged_groups = consolidation.unmerged().len(),
        duration_ms = consolidate_start.elapsed().as_millis(),
        "consolidation complete"
    );

    // =========================================================================
    // Stage 3: Index observations by identity and calendar date
    // =========================================================================
    let index_span = info_span!("index");
    let index_start = Instant::now();
    let index =
        index_span.in_scope(|| ObservationIndex::build(&observations, &catalog, &consolidation));
    info!(
        indexed = index.indexed_count(),
        duration_ms = index_start.elapsed().as_millis(),
        "observation index built"
    );

    // =========================================================================
    // Stage 4: Resolve windows and assemble the matrix
    // =========================================================================
    let resolve_span = info_span!("resolve");
    let resolve_start = Instant::now();
    let matrix =
        resolve_span.in_scope(|| build_matrix(&encounters, &catalog, &consolidation, &index));
    info!(
        encounters = matrix.encounter_count(),
        columns = matrix.column_count(),
        resolved_cells = matrix.resolved_count(),
        numeric_cells = matrix.numeric_count(),
        duration_ms = resolve_start.elapsed().as_millis(),
        "matrix assembled"
    );

    // =========================================================================
    // Stage 5: Write outputs
    // =========================================================================
    let mut outputs = Vec::new();
    if args.dry_run {
        info!("dry run, skipping output writes");
    } else {
        let output_span = info_span!("output", output_dir = %output_dir.display());
        let output_start = Instant::now();
        outputs = output_span
            .in_scope(|| write_outputs(&output_dir, &matrix, &consolidation, &digests, &quality))?;
        info!(
            files = outputs.len(),
            duration_ms = output_start.elapsed().as_millis(),
            "outputs written"
        );
    }

    if !quality.is_empty() {
        warn!(
            warnings = quality.total(),
            "data-quality issues were recovered during loading"
        );
    }

    Ok(BuildResult {
        data_dir: data_dir.clone(),
        output_dir,
        dry_run: args.dry_run,
        digests,
        consolidation,
        matrix,
        quality,
        outputs,
    })
}

/// Audit identifier consolidation: evaluate every duplicate label group and
/// print the outcome without building the matrix.
pub fn run_consolidate(args: &ConsolidateArgs) -> Result<()> {
    let data_dir = &args.data_dir;
    let paths = input_paths(
        data_dir,
        args.catalog.as_ref(),
        args.observations.as_ref(),
        None,
    );
    let (catalog, catalog_quality) = read_catalog(&paths.catalog)?;
    let (observations, observation_quality) = read_observations(&paths.observations)?;
    let warnings = catalog_quality.total() + observation_quality.total();

    let counts = concept_counts(&observations);
    let consolidation = consolidate(&catalog, &counts);

    println!("Data: {}", data_dir.display());
    println!(
        "Labels evaluated: {}  Merged: {}  Not merged: {}  Warnings: {}",
        consolidation.labels_evaluated(),
        consolidation.merged_groups(),
        consolidation.unmerged().len(),
        warnings
    );

    if !consolidation.merges().is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Source", "Target", "Label"]);
        apply_table_style(&mut table);
        for rule in consolidation.merges() {
            table.add_row(vec![
                rule.source.to_string(),
                rule.target.to_string(),
                rule.label.clone(),
            ]);
        }
        println!("{table}");
    }

    if !consolidation.unmerged().is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Label", "Members", "Data counts", "Reason"]);
        apply_table_style(&mut table);
        for group in consolidation.unmerged() {
            table.add_row(vec![
                group.label.clone(),
                join_ids(&group.members),
                group
                    .data_counts
                    .iter()
                    .map(|count| count.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                group.reason.describe().to_string(),
            ]);
        }
        println!();
        println!("Not merged:");
        println!("{table}");
    }
    Ok(())
}

fn write_outputs(
    output_dir: &Path,
    matrix: &FeatureMatrix,
    consolidation: &Consolidation,
    digests: &[InputDigest],
    quality: &QualityReport,
) -> Result<Vec<PathBuf>> {
    let mut outputs = vec![
        write_matrix_wide(output_dir, matrix)?,
        write_matrix_long(output_dir, matrix)?,
        write_offsets(output_dir, matrix)?,
        write_merge_mapping(output_dir, consolidation)?,
        write_concept_summary(output_dir, matrix)?,
    ];
    let summary = BuildSummary::new(digests, matrix, consolidation, quality);
    outputs.push(write_build_summary(output_dir, &summary)?);
    Ok(outputs)
}

fn input_paths(
    data_dir: &Path,
    catalog: Option<&PathBuf>,
    observations: Option<&PathBuf>,
    encounters: Option<&PathBuf>,
) -> InputPaths {
    let mut paths = InputPaths::from_dir(data_dir);
    if let Some(path) = catalog {
        paths = paths.with_catalog(path.clone());
    }
    if let Some(path) = observations {
        paths = paths.with_observations(path.clone());
    }
    if let Some(path) = encounters {
        paths = paths.with_encounters(path.clone());
    }
    paths
}

fn join_ids(ids: &[ConceptId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
