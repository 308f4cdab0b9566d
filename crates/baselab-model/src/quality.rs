use std::fmt;

use serde::Serialize;

/// Which input file a data-quality warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Catalog,
    Observations,
    Encounters,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Observations => "observations",
            Self::Encounters => "encounters",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row-level data problem that was recovered from, not aborted on.
/// The affected row (or field) is excluded and the build continues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityWarning {
    pub input: InputKind,
    /// 1-based record number in the source file, headers excluded.
    pub record: u64,
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record {}, field {}: {}",
            self.input, self.record, self.field, self.message
        )
    }
}

/// Aggregated data-quality warnings for one build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub warnings: Vec<QualityWarning>,
}

impl QualityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: QualityWarning) {
        self.warnings.push(warning);
    }

    pub fn merge(&mut self, other: QualityReport) {
        self.warnings.extend(other.warnings);
    }

    pub fn total(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn count_for(&self, input: InputKind) -> usize {
        self.warnings.iter().filter(|w| w.input == input).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_per_input() {
        let mut report = QualityReport::new();
        report.push(QualityWarning {
            input: InputKind::Observations,
            record: 12,
            field: "charttime",
            message: "unparseable timestamp \"not-a-date\"".to_string(),
        });
        report.push(QualityWarning {
            input: InputKind::Observations,
            record: 40,
            field: "valuenum",
            message: "unparseable number \"abc\"".to_string(),
        });
        report.push(QualityWarning {
            input: InputKind::Encounters,
            record: 3,
            field: "admittime",
            message: "missing value".to_string(),
        });

        assert_eq!(report.total(), 3);
        assert_eq!(report.count_for(InputKind::Observations), 2);
        assert_eq!(report.count_for(InputKind::Encounters), 1);
        assert_eq!(report.count_for(InputKind::Catalog), 0);
        assert!(!report.is_empty());
    }

    #[test]
    fn warning_displays_location_and_message() {
        let warning = QualityWarning {
            input: InputKind::Encounters,
            record: 7,
            field: "admittime",
            message: "unparseable timestamp \"2180-13-40\"".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "encounters record 7, field admittime: unparseable timestamp \"2180-13-40\""
        );
    }
}
