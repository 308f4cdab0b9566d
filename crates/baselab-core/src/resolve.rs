//! Window resolution: the single observation for one (encounter, concept).

use chrono::Duration;

use baselab_model::{ConceptId, DayOffset, Encounter, Observation, ResolvedValue};

use crate::index::ObservationIndex;

/// Chooses at most one observation per (encounter, concept) pair.
///
/// Offsets are walked in the fixed priority order day 0, day −1, day +1.
/// The first offset with any candidate decides the cell; later offsets are
/// never consulted once a match exists, even if they would offer "better"
/// values. Within the chosen offset the earliest timestamp wins; identical
/// timestamps fall back to input order, so results are stable for identical
/// input files.
#[derive(Debug, Clone, Copy)]
pub struct WindowResolver<'a> {
    index: &'a ObservationIndex<'a>,
}

impl<'a> WindowResolver<'a> {
    pub fn new(index: &'a ObservationIndex<'a>) -> Self {
        Self { index }
    }

    pub fn resolve(&self, encounter: &Encounter, concept: ConceptId) -> Option<ResolvedValue> {
        let anchor = encounter.anchor_date()?;
        for offset in DayOffset::PRIORITY {
            let Some(date) = anchor.checked_add_signed(Duration::days(offset.days())) else {
                continue;
            };
            let chosen = self
                .index
                .candidates(encounter.id, encounter.subject, date, concept)
                .min_by_key(|(position, observation)| (observation.charttime, *position));
            if let Some((_, observation)) = chosen {
                return Some(resolved_from(observation, offset));
            }
        }
        None
    }
}

fn resolved_from(observation: &Observation, offset: DayOffset) -> ResolvedValue {
    ResolvedValue {
        concept: observation.concept,
        offset,
        charttime: observation.charttime,
        value_num: observation.value_num,
        value_text: observation.value_text.clone(),
        unit: observation.unit.clone(),
        flag: observation.flag.clone(),
        ref_lower: observation.ref_lower,
        ref_upper: observation.ref_upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use baselab_model::{Concept, ConceptCatalog, Consolidation, EncounterId, SubjectId};
    use chrono::NaiveDateTime;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").expect("fixture timestamp")
    }

    fn catalog() -> ConceptCatalog {
        ConceptCatalog::from_concepts(vec![Concept {
            id: ConceptId::new(100),
            label: "Sodium".to_string(),
            category: None,
            fluid: None,
            included: true,
        }])
        .expect("valid catalog")
    }

    fn encounter(id: i64, subject: i64, admittime: &str) -> Encounter {
        Encounter {
            id: EncounterId::new(id),
            subject: SubjectId::new(subject),
            admittime: Some(at(admittime)),
            expire_flag: None,
            deathtime: None,
        }
    }

    fn observation(
        subject: i64,
        encounter: Option<i64>,
        concept: i64,
        charttime: &str,
        value: f64,
    ) -> Observation {
        Observation {
            subject: SubjectId::new(subject),
            encounter: encounter.map(EncounterId::new),
            concept: ConceptId::new(concept),
            charttime: at(charttime),
            value_num: Some(value),
            value_text: None,
            unit: None,
            flag: None,
            ref_lower: None,
            ref_upper: None,
        }
    }

    fn resolve_one(
        observations: &[Observation],
        encounter: &Encounter,
        concept: i64,
    ) -> Option<ResolvedValue> {
        let catalog = catalog();
        let consolidation = Consolidation::default();
        let index = ObservationIndex::build(observations, &catalog, &consolidation);
        WindowResolver::new(&index).resolve(encounter, ConceptId::new(concept))
    }

    #[test]
    fn anchor_day_wins_over_neighbouring_days() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![
            observation(1, Some(10), 100, "2125-03-01 06:00:00", 138.0),
            observation(1, Some(10), 100, "2125-03-02 06:00:00", 140.0),
            observation(1, Some(10), 100, "2125-03-03 06:00:00", 142.0),
        ];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.offset, DayOffset::SameDay);
        assert_eq!(value.value_num, Some(140.0));
    }

    #[test]
    fn day_before_wins_when_anchor_day_is_empty() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![
            observation(1, Some(10), 100, "2125-03-01 22:10:00", 4.1),
            observation(1, Some(10), 100, "2125-03-03 06:00:00", 4.4),
        ];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.offset, DayOffset::DayBefore);
        assert_eq!(value.value_num, Some(4.1));
    }

    #[test]
    fn day_after_is_the_last_resort() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![observation(1, Some(10), 100, "2125-03-03 05:00:00", 7.7)];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.offset, DayOffset::DayAfter);
    }

    #[test]
    fn no_fall_through_to_later_offsets() {
        // The anchor day has only a qualitative result; day -1 has a numeric
        // one. The anchor day still decides the cell.
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let mut qualitative = observation(1, Some(10), 100, "2125-03-02 06:00:00", 0.0);
        qualitative.value_num = None;
        qualitative.value_text = Some("HEMOLYZED".to_string());
        let observations = vec![
            qualitative,
            observation(1, Some(10), 100, "2125-03-01 06:00:00", 139.0),
        ];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.offset, DayOffset::SameDay);
        assert_eq!(value.value_num, None);
        assert_eq!(value.value_text.as_deref(), Some("HEMOLYZED"));
    }

    #[test]
    fn earliest_timestamp_wins_within_the_offset() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![
            observation(1, Some(10), 100, "2125-03-02 12:00:00", 145.0),
            observation(1, Some(10), 100, "2125-03-02 05:30:00", 141.0),
        ];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.value_num, Some(141.0));
        assert_eq!(value.charttime, at("2125-03-02 05:30:00"));
    }

    #[test]
    fn identical_timestamps_fall_back_to_input_order() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![
            observation(1, Some(10), 100, "2125-03-02 05:30:00", 141.0),
            observation(1, Some(10), 100, "2125-03-02 05:30:00", 143.0),
        ];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.value_num, Some(141.0));
    }

    #[test]
    fn subject_matching_only_applies_to_encounter_less_rows() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        // Same subject but charted under a different encounter: no match.
        let foreign = vec![observation(1, Some(77), 100, "2125-03-02 06:00:00", 9.9)];
        assert!(resolve_one(&foreign, &enc, 100).is_none());

        // Encounter-less row for the same subject: matches.
        let ambulatory = vec![observation(1, None, 100, "2125-03-02 06:00:00", 5.5)];
        let value = resolve_one(&ambulatory, &enc, 100).expect("match");
        assert_eq!(value.value_num, Some(5.5));
    }

    #[test]
    fn encounter_identity_matches_across_subject_records() {
        // Rule (a) is pure encounter-id equality; a subject-id discrepancy
        // on the observation row does not block it.
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![observation(2, Some(10), 100, "2125-03-02 06:00:00", 3.3)];
        let value = resolve_one(&observations, &enc, 100).expect("match");
        assert_eq!(value.value_num, Some(3.3));
    }

    #[test]
    fn missing_anchor_resolves_nothing() {
        let mut enc = encounter(10, 1, "2125-03-02 08:15:00");
        enc.admittime = None;
        let observations = vec![observation(1, Some(10), 100, "2125-03-02 06:00:00", 140.0)];
        assert!(resolve_one(&observations, &enc, 100).is_none());
    }

    #[test]
    fn outside_window_days_never_match() {
        let enc = encounter(10, 1, "2125-03-02 08:15:00");
        let observations = vec![
            observation(1, Some(10), 100, "2125-02-28 06:00:00", 1.0),
            observation(1, Some(10), 100, "2125-03-04 06:00:00", 2.0),
        ];
        assert!(resolve_one(&observations, &enc, 100).is_none());
    }
}
