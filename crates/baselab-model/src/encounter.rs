use chrono::{NaiveDate, NaiveDateTime};

use crate::ids::{EncounterId, SubjectId};

/// One encounter (admission); every encounter becomes a matrix row.
#[derive(Debug, Clone, PartialEq)]
pub struct Encounter {
    pub id: EncounterId,
    pub subject: SubjectId,
    /// Anchor timestamp for window resolution. `None` when the source value
    /// was missing or malformed; the encounter then yields an all-null row.
    pub admittime: Option<NaiveDateTime>,
    /// Outcome flag carried through to the matrix untouched.
    pub expire_flag: Option<String>,
    /// Death timestamp carried through to the matrix untouched.
    pub deathtime: Option<String>,
}

impl Encounter {
    /// Calendar date of the anchor, the day-0 reference for the window.
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        self.admittime.map(|t| t.date())
    }
}
