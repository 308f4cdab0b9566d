use chrono::{NaiveDate, NaiveDateTime};

use crate::ids::{ConceptId, EncounterId, SubjectId};

/// One timestamped measurement from the observation store.
///
/// `encounter` is `None` for observations charted outside any encounter
/// (for example outpatient draws); those are matched to encounters by
/// subject identifier instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub subject: SubjectId,
    pub encounter: Option<EncounterId>,
    pub concept: ConceptId,
    pub charttime: NaiveDateTime,
    /// Numeric result; `None` for qualitative results that only carry text.
    pub value_num: Option<f64>,
    pub value_text: Option<String>,
    pub unit: Option<String>,
    pub flag: Option<String>,
    pub ref_lower: Option<f64>,
    pub ref_upper: Option<f64>,
}

impl Observation {
    /// Calendar date of the measurement, used for window matching.
    pub fn chart_date(&self) -> NaiveDate {
        self.charttime.date()
    }
}
