//! Feature-matrix assembly.
//!
//! The matrix is a pure function of its immutable inputs. Rows are mutually
//! independent (each is produced solely from the shared index snapshot), so
//! the row loop could be parallelized without changing any output; ordering
//! is fixed by construction (encounter input order, catalog column order),
//! not by execution order.

use tracing::debug;

use baselab_model::{
    ConceptCatalog, ConceptId, Consolidation, DayOffset, Encounter, EncounterId, ResolvedValue,
};

use crate::index::ObservationIndex;
use crate::resolve::WindowResolver;

/// One feature column of the output matrix.
#[derive(Debug, Clone)]
pub struct MatrixColumn {
    pub concept: ConceptId,
    /// Final feature name, e.g. `Glucose_50931_merged`.
    pub name: String,
    pub label: String,
    pub category: Option<String>,
    pub fluid: Option<String>,
    /// Identifiers merged onto this column; empty for non-targets.
    pub merged_sources: Vec<ConceptId>,
}

/// One encounter with its resolved cells, aligned with
/// [`FeatureMatrix::columns`].
#[derive(Debug, Clone)]
pub struct MatrixRow {
    pub encounter: Encounter,
    pub cells: Vec<Option<ResolvedValue>>,
}

/// One resolved cell in provenance iteration order (row-major).
#[derive(Debug, Clone, Copy)]
pub struct ProvenanceEntry<'a> {
    pub row: &'a MatrixRow,
    pub column: &'a MatrixColumn,
    pub value: &'a ResolvedValue,
}

impl ProvenanceEntry<'_> {
    pub fn encounter_id(&self) -> EncounterId {
        self.row.encounter.id
    }
}

/// How many cells each window day contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceDistribution {
    pub day0: usize,
    pub day_minus1: usize,
    pub day_plus1: usize,
}

impl SourceDistribution {
    fn record(&mut self, offset: DayOffset) {
        match offset {
            DayOffset::SameDay => self.day0 += 1,
            DayOffset::DayBefore => self.day_minus1 += 1,
            DayOffset::DayAfter => self.day_plus1 += 1,
        }
    }
}

/// The assembled wide matrix: every encounter exactly once, in input order;
/// every post-consolidation included concept exactly once, in catalog order.
/// Null cells stay null; nothing is imputed.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub columns: Vec<MatrixColumn>,
    pub rows: Vec<MatrixRow>,
}

impl FeatureMatrix {
    pub fn encounter_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    /// Cells with a chosen observation, qualitative results included.
    pub fn resolved_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.iter().filter(|cell| cell.is_some()).count())
            .sum()
    }

    /// Cells with a numeric value, i.e. what the wide CSV shows as non-null.
    pub fn numeric_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| &row.cells)
            .filter(|cell| cell.as_ref().is_some_and(|v| v.value_num.is_some()))
            .count()
    }

    /// Numeric cells per column, aligned with `columns`.
    pub fn column_numeric_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.columns.len()];
        for row in &self.rows {
            for (index, cell) in row.cells.iter().enumerate() {
                if cell.as_ref().is_some_and(|v| v.value_num.is_some()) {
                    counts[index] += 1;
                }
            }
        }
        counts
    }

    pub fn source_distribution(&self) -> SourceDistribution {
        let mut distribution = SourceDistribution::default();
        for row in &self.rows {
            for cell in row.cells.iter().flatten() {
                distribution.record(cell.offset);
            }
        }
        distribution
    }

    /// Resolved cells in row-major order, for the provenance and long
    /// outputs.
    pub fn provenance(&self) -> impl Iterator<Item = ProvenanceEntry<'_>> {
        self.rows.iter().flat_map(move |row| {
            row.cells
                .iter()
                .enumerate()
                .filter_map(move |(index, cell)| {
                    cell.as_ref().map(|value| ProvenanceEntry {
                        row,
                        column: &self.columns[index],
                        value,
                    })
                })
        })
    }
}

/// Resolves every (encounter, concept) cell and assembles the matrix.
pub fn build_matrix(
    encounters: &[Encounter],
    catalog: &ConceptCatalog,
    consolidation: &Consolidation,
    index: &ObservationIndex<'_>,
) -> FeatureMatrix {
    let columns: Vec<MatrixColumn> = catalog
        .included()
        .filter(|concept| !consolidation.is_merged_source(concept.id))
        .map(|concept| {
            let merged_sources = consolidation.merged_sources(concept.id).to_vec();
            let mut name = concept.column_label();
            if !merged_sources.is_empty() {
                name.push_str("_merged");
            }
            MatrixColumn {
                concept: concept.id,
                name,
                label: concept.label.clone(),
                category: concept.category.clone(),
                fluid: concept.fluid.clone(),
                merged_sources,
            }
        })
        .collect();

    let resolver = WindowResolver::new(index);
    let mut rows = Vec::with_capacity(encounters.len());
    for encounter in encounters {
        let cells = columns
            .iter()
            .map(|column| resolver.resolve(encounter, column.concept))
            .collect();
        rows.push(MatrixRow {
            encounter: encounter.clone(),
            cells,
        });
    }

    let matrix = FeatureMatrix { columns, rows };
    debug!(
        encounters = matrix.encounter_count(),
        columns = matrix.column_count(),
        resolved = matrix.resolved_count(),
        "assembled feature matrix"
    );
    matrix
}
