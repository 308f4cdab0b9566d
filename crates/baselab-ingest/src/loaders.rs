//! CSV loaders for the three inputs.
//!
//! Headers are resolved by name (case-insensitive, UTF-8 BOM tolerated,
//! extra columns ignored). File-level problems are fatal; row-level problems
//! are recovered: the offending row or field is dropped and a
//! [`QualityWarning`] records what happened.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use baselab_model::{
    Concept, ConceptCatalog, ConceptId, Encounter, EncounterId, InputKind, Observation,
    QualityReport, QualityWarning, SubjectId,
};

use crate::datetime::parse_timestamp;

struct HeaderIndex {
    file: String,
    by_name: BTreeMap<String, usize>,
}

impl HeaderIndex {
    fn new(path: &Path, headers: &StringRecord) -> Self {
        let mut by_name = BTreeMap::new();
        for (index, raw) in headers.iter().enumerate() {
            let name = raw.trim().trim_matches('\u{feff}').to_lowercase();
            by_name.entry(name).or_insert(index);
        }
        Self {
            file: path.display().to_string(),
            by_name,
        }
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.by_name
            .get(column)
            .copied()
            .ok_or_else(|| anyhow!("missing required column `{column}` in {}", self.file))
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.by_name.get(column).copied()
    }
}

fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> &'r str {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .unwrap_or("")
}

fn parse_i64(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn parse_f64(raw: &str) -> Option<f64> {
    raw.parse().ok()
}

fn non_empty(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn integer_message(raw: &str) -> String {
    if raw.is_empty() {
        "missing value".to_string()
    } else {
        format!("unparseable integer {raw:?}")
    }
}

fn parse_inclusion(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        _ => Err(format!("unrecognized inclusion flag {raw:?}")),
    }
}

fn push_warning(
    report: &mut QualityReport,
    input: InputKind,
    record: u64,
    field_name: &'static str,
    message: String,
) {
    warn!(
        input = %input,
        record,
        field = field_name,
        "data quality: {message}"
    );
    report.push(QualityWarning {
        input,
        record,
        field: field_name,
        message,
    });
}

/// Numeric field that is dropped, rather than excluding its row, when it
/// does not parse. Used for the reference-range bounds.
fn lenient_f64(
    raw: &str,
    input: InputKind,
    row: u64,
    name: &'static str,
    report: &mut QualityReport,
) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match parse_f64(raw) {
        Some(value) => Some(value),
        None => {
            push_warning(
                report,
                input,
                row,
                name,
                format!("unparseable number {raw:?}; field dropped"),
            );
            None
        }
    }
}

/// Loads the concept catalog.
///
/// A duplicate identifier with conflicting metadata aborts the build; every
/// other malformed row is skipped with a warning. An empty inclusion flag
/// means not included.
pub fn read_catalog(path: &Path) -> Result<(ConceptCatalog, QualityReport)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("read catalog {}", path.display()))?;
    let headers = HeaderIndex::new(path, reader.headers().context("read catalog headers")?);
    let itemid_col = headers.require("itemid")?;
    let label_col = headers.require("label")?;
    let inclusion_col = headers.require("inclusion")?;
    let category_col = headers.optional("category");
    let fluid_col = headers.optional("fluid");

    let mut catalog = ConceptCatalog::new();
    let mut report = QualityReport::new();
    let mut skipped = 0usize;
    for (position, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("read catalog record {}", position + 1))?;
        let row = position as u64 + 1;

        let raw_id = field(&record, Some(itemid_col));
        let Some(id) = parse_i64(raw_id) else {
            push_warning(
                &mut report,
                InputKind::Catalog,
                row,
                "itemid",
                integer_message(raw_id),
            );
            skipped += 1;
            continue;
        };
        let label = field(&record, Some(label_col));
        if label.is_empty() {
            push_warning(
                &mut report,
                InputKind::Catalog,
                row,
                "label",
                "missing value".to_string(),
            );
            skipped += 1;
            continue;
        }
        let included = match parse_inclusion(field(&record, Some(inclusion_col))) {
            Ok(value) => value,
            Err(message) => {
                push_warning(&mut report, InputKind::Catalog, row, "inclusion", message);
                skipped += 1;
                continue;
            }
        };

        let concept = Concept {
            id: ConceptId::new(id),
            label: label.to_string(),
            category: non_empty(field(&record, category_col)),
            fluid: non_empty(field(&record, fluid_col)),
            included,
        };
        catalog
            .insert(concept)
            .with_context(|| format!("catalog record {row}"))?;
    }

    debug!(
        path = %path.display(),
        concepts = catalog.len(),
        included = catalog.included_count(),
        skipped,
        "loaded concept catalog"
    );
    Ok((catalog, report))
}

/// Loads the observation store.
///
/// Rows that cannot participate in matching (bad identifiers, bad
/// timestamp, bad numeric value) are excluded with a warning. An empty
/// `hadm_id` is valid and means the observation is matched by subject; an
/// empty `valuenum` is valid and means a qualitative result.
pub fn read_observations(path: &Path) -> Result<(Vec<Observation>, QualityReport)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("read observations {}", path.display()))?;
    let headers = HeaderIndex::new(path, reader.headers().context("read observation headers")?);
    let subject_col = headers.require("subject_id")?;
    let itemid_col = headers.require("itemid")?;
    let charttime_col = headers.require("charttime")?;
    let hadm_col = headers.optional("hadm_id");
    let value_col = headers.optional("value");
    let valuenum_col = headers.optional("valuenum");
    let unit_col = headers.optional("valueuom");
    let flag_col = headers.optional("flag");
    let ref_lower_col = headers.optional("ref_range_lower");
    let ref_upper_col = headers.optional("ref_range_upper");

    let mut observations = Vec::new();
    let mut report = QualityReport::new();
    let mut skipped = 0usize;
    for (position, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("read observation record {}", position + 1))?;
        let row = position as u64 + 1;

        let raw_subject = field(&record, Some(subject_col));
        let Some(subject) = parse_i64(raw_subject) else {
            push_warning(
                &mut report,
                InputKind::Observations,
                row,
                "subject_id",
                integer_message(raw_subject),
            );
            skipped += 1;
            continue;
        };
        let encounter = match field(&record, hadm_col) {
            "" => None,
            raw => match parse_i64(raw) {
                Some(id) => Some(EncounterId::new(id)),
                None => {
                    push_warning(
                        &mut report,
                        InputKind::Observations,
                        row,
                        "hadm_id",
                        format!("unparseable integer {raw:?}"),
                    );
                    skipped += 1;
                    continue;
                }
            },
        };
        let raw_concept = field(&record, Some(itemid_col));
        let Some(concept) = parse_i64(raw_concept) else {
            push_warning(
                &mut report,
                InputKind::Observations,
                row,
                "itemid",
                integer_message(raw_concept),
            );
            skipped += 1;
            continue;
        };
        let charttime = match parse_timestamp(field(&record, Some(charttime_col))) {
            Ok(value) => value,
            Err(err) => {
                push_warning(
                    &mut report,
                    InputKind::Observations,
                    row,
                    "charttime",
                    err.to_string(),
                );
                skipped += 1;
                continue;
            }
        };
        let value_num = match field(&record, valuenum_col) {
            "" => None,
            raw => match parse_f64(raw) {
                Some(value) => Some(value),
                None => {
                    push_warning(
                        &mut report,
                        InputKind::Observations,
                        row,
                        "valuenum",
                        format!("unparseable number {raw:?}"),
                    );
                    skipped += 1;
                    continue;
                }
            },
        };
        let ref_lower = lenient_f64(
            field(&record, ref_lower_col),
            InputKind::Observations,
            row,
            "ref_range_lower",
            &mut report,
        );
        let ref_upper = lenient_f64(
            field(&record, ref_upper_col),
            InputKind::Observations,
            row,
            "ref_range_upper",
            &mut report,
        );

        observations.push(Observation {
            subject: SubjectId::new(subject),
            encounter,
            concept: ConceptId::new(concept),
            charttime,
            value_num,
            value_text: non_empty(field(&record, value_col)),
            unit: non_empty(field(&record, unit_col)),
            flag: non_empty(field(&record, flag_col)),
            ref_lower,
            ref_upper,
        });
    }

    debug!(
        path = %path.display(),
        observations = observations.len(),
        skipped,
        "loaded observation store"
    );
    Ok((observations, report))
}

/// Loads the encounter set.
///
/// A missing or malformed anchor timestamp keeps the encounter (it becomes
/// an all-null matrix row); malformed identifiers skip the row. On duplicate
/// encounter identifiers the first occurrence wins.
pub fn read_encounters(path: &Path) -> Result<(Vec<Encounter>, QualityReport)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("read encounters {}", path.display()))?;
    let headers = HeaderIndex::new(path, reader.headers().context("read encounter headers")?);
    let hadm_col = headers.require("hadm_id")?;
    let subject_col = headers.require("subject_id")?;
    let admittime_col = headers.require("admittime")?;
    let expire_col = headers.optional("hospital_expire_flag");
    let deathtime_col = headers.optional("deathtime");

    let mut encounters = Vec::new();
    let mut seen = BTreeSet::new();
    let mut report = QualityReport::new();
    let mut skipped = 0usize;
    for (position, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("read encounter record {}", position + 1))?;
        let row = position as u64 + 1;

        let raw_id = field(&record, Some(hadm_col));
        let Some(id) = parse_i64(raw_id) else {
            push_warning(
                &mut report,
                InputKind::Encounters,
                row,
                "hadm_id",
                integer_message(raw_id),
            );
            skipped += 1;
            continue;
        };
        let id = EncounterId::new(id);
        if !seen.insert(id) {
            push_warning(
                &mut report,
                InputKind::Encounters,
                row,
                "hadm_id",
                format!("duplicate encounter id {id}; first occurrence wins"),
            );
            skipped += 1;
            continue;
        }
        let raw_subject = field(&record, Some(subject_col));
        let Some(subject) = parse_i64(raw_subject) else {
            push_warning(
                &mut report,
                InputKind::Encounters,
                row,
                "subject_id",
                integer_message(raw_subject),
            );
            skipped += 1;
            continue;
        };
        let admittime = match parse_timestamp(field(&record, Some(admittime_col))) {
            Ok(value) => Some(value),
            Err(err) => {
                push_warning(
                    &mut report,
                    InputKind::Encounters,
                    row,
                    "admittime",
                    format!("{err}; encounter kept as an all-null row"),
                );
                None
            }
        };

        encounters.push(Encounter {
            id,
            subject: SubjectId::new(subject),
            admittime,
            expire_flag: non_empty(field(&record, expire_col)),
            deathtime: non_empty(field(&record, deathtime_col)),
        });
    }

    debug!(
        path = %path.display(),
        encounters = encounters.len(),
        skipped,
        "loaded encounter set"
    );
    Ok((encounters, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusion_flag_accepts_common_spellings() {
        assert_eq!(parse_inclusion("1"), Ok(true));
        assert_eq!(parse_inclusion("Yes"), Ok(true));
        assert_eq!(parse_inclusion("TRUE"), Ok(true));
        assert_eq!(parse_inclusion("0"), Ok(false));
        assert_eq!(parse_inclusion("no"), Ok(false));
        assert_eq!(parse_inclusion(""), Ok(false));
        assert!(parse_inclusion("maybe").is_err());
    }

    #[test]
    fn lenient_numeric_drops_field_not_row() {
        let mut report = QualityReport::new();
        assert_eq!(
            lenient_f64("4.5", InputKind::Observations, 1, "ref_range_lower", &mut report),
            Some(4.5)
        );
        assert_eq!(
            lenient_f64("", InputKind::Observations, 2, "ref_range_lower", &mut report),
            None
        );
        assert!(report.is_empty());
        assert_eq!(
            lenient_f64("n/a", InputKind::Observations, 3, "ref_range_lower", &mut report),
            None
        );
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn integer_message_distinguishes_missing_from_malformed() {
        assert_eq!(integer_message(""), "missing value");
        assert_eq!(integer_message("12x"), "unparseable integer \"12x\"");
    }
}
