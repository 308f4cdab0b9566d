//! Property tests for the window resolver, checked against a naive scan.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use baselab_core::{ObservationIndex, WindowResolver};
use baselab_model::{
    Concept, ConceptCatalog, ConceptId, Consolidation, DayOffset, Encounter, EncounterId,
    Observation, SubjectId,
};

const CONCEPT: i64 = 50983;
const ENCOUNTER: i64 = 20001;
const SUBJECT: i64 = 10001;

fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2125, 3, 2).expect("anchor date")
}

fn catalog() -> ConceptCatalog {
    ConceptCatalog::from_concepts(vec![Concept {
        id: ConceptId::new(CONCEPT),
        label: "Sodium".to_string(),
        category: None,
        fluid: None,
        included: true,
    }])
    .expect("valid catalog")
}

fn encounter() -> Encounter {
    Encounter {
        id: EncounterId::new(ENCOUNTER),
        subject: SubjectId::new(SUBJECT),
        admittime: anchor_date().and_hms_opt(8, 15, 0),
        expire_flag: None,
        deathtime: None,
    }
}

/// Observations scattered over a week around the anchor, for a mix of
/// identities: the encounter itself, encounter-less rows of the same
/// subject, a foreign encounter, and a foreign subject.
fn observations_strategy() -> impl Strategy<Value = Vec<Observation>> {
    let one = (-3i64..=3, 0u32..24, 0u32..60, 0u8..4, 0u32..5000).prop_map(
        |(day, hour, minute, who, raw_value)| {
            let date = anchor_date()
                .checked_add_signed(Duration::days(day))
                .expect("window date");
            let charttime = date.and_hms_opt(hour, minute, 0).expect("valid time");
            let (subject, encounter) = match who {
                0 => (SUBJECT, Some(ENCOUNTER)),
                1 => (SUBJECT, None),
                2 => (SUBJECT, Some(ENCOUNTER + 1)),
                _ => (SUBJECT + 1, None),
            };
            Observation {
                subject: SubjectId::new(subject),
                encounter: encounter.map(EncounterId::new),
                concept: ConceptId::new(CONCEPT),
                charttime,
                value_num: Some(f64::from(raw_value) / 10.0),
                value_text: None,
                unit: None,
                flag: None,
                ref_lower: None,
                ref_upper: None,
            }
        },
    );
    prop::collection::vec(one, 0..24)
}

/// Naive restatement of the matching rule: scan everything, try day 0, then
/// day -1, then day +1, take the earliest timestamp with input order as the
/// tie-break.
fn naive_choice(observations: &[Observation]) -> Option<(DayOffset, NaiveDateTime, usize)> {
    for offset in DayOffset::PRIORITY {
        let date = anchor_date()
            .checked_add_signed(Duration::days(offset.days()))
            .expect("window date");
        let mut best: Option<(NaiveDateTime, usize)> = None;
        for (position, observation) in observations.iter().enumerate() {
            let identity = observation.encounter == Some(EncounterId::new(ENCOUNTER))
                || (observation.encounter.is_none()
                    && observation.subject == SubjectId::new(SUBJECT));
            if identity && observation.chart_date() == date {
                let key = (observation.charttime, position);
                if best.is_none_or(|current| key < current) {
                    best = Some(key);
                }
            }
        }
        if let Some((charttime, position)) = best {
            return Some((offset, charttime, position));
        }
    }
    None
}

fn resolve(observations: &[Observation]) -> Option<baselab_model::ResolvedValue> {
    let catalog = catalog();
    let consolidation = Consolidation::default();
    let index = ObservationIndex::build(observations, &catalog, &consolidation);
    WindowResolver::new(&index).resolve(&encounter(), ConceptId::new(CONCEPT))
}

proptest! {
    #[test]
    fn chosen_offset_and_timestamp_match_the_naive_scan(observations in observations_strategy()) {
        let resolved = resolve(&observations);
        match naive_choice(&observations) {
            None => prop_assert!(resolved.is_none()),
            Some((offset, charttime, position)) => {
                let value = resolved.expect("naive scan found a candidate");
                prop_assert_eq!(value.offset, offset);
                prop_assert_eq!(value.charttime, charttime);
                prop_assert_eq!(value.value_num, observations[position].value_num);
            }
        }
    }

    #[test]
    fn resolved_cells_stay_inside_the_window(observations in observations_strategy()) {
        if let Some(value) = resolve(&observations) {
            prop_assert!(DayOffset::PRIORITY.contains(&value.offset));
            let expected_date = anchor_date()
                .checked_add_signed(Duration::days(value.offset.days()))
                .expect("window date");
            prop_assert_eq!(value.charttime.date(), expected_date);
        }
    }

    #[test]
    fn resolution_is_deterministic_across_rebuilds(observations in observations_strategy()) {
        prop_assert_eq!(resolve(&observations), resolve(&observations));
    }
}
