use std::fmt;

use chrono::NaiveDateTime;

use crate::ids::ConceptId;

/// Day offset of a resolved observation relative to the encounter anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOffset {
    SameDay,
    DayBefore,
    DayAfter,
}

impl DayOffset {
    /// Resolution priority: the anchor day first, then the day before, then
    /// the day after. Never reordered.
    pub const PRIORITY: [DayOffset; 3] = [Self::SameDay, Self::DayBefore, Self::DayAfter];

    /// Signed number of days relative to the anchor date.
    pub fn days(self) -> i64 {
        match self {
            Self::SameDay => 0,
            Self::DayBefore => -1,
            Self::DayAfter => 1,
        }
    }

    /// Provenance vocabulary used in the offsets and long outputs.
    pub fn source_tag(self) -> &'static str {
        match self {
            Self::SameDay => "Day0",
            Self::DayBefore => "Day-1",
            Self::DayAfter => "Day+1",
        }
    }
}

impl fmt::Display for DayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_tag())
    }
}

/// The single observation chosen for one (encounter, concept) cell.
///
/// The resolver guarantees at most one of these per (encounter, concept)
/// pair. `value_num` may be `None` for qualitative results; the cell is then
/// null in the wide matrix but still present in the long and provenance
/// outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    /// Identifier of the observation that supplied the value.
    pub concept: ConceptId,
    pub offset: DayOffset,
    pub charttime: NaiveDateTime,
    pub value_num: Option<f64>,
    pub value_text: Option<String>,
    pub unit: Option<String>,
    pub flag: Option<String>,
    pub ref_lower: Option<f64>,
    pub ref_upper: Option<f64>,
}
