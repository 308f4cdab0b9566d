//! Pre-indexed observation store.
//!
//! The resolver answers (encounter, concept, date) lookups once per cell of
//! the output matrix, so candidates are bucketed up front instead of being
//! scanned per call. Two hash indices cover the two halves of the matching
//! rule: observations carrying an encounter id are keyed by it, observations
//! without one are keyed by subject.

use std::collections::HashMap;

use chrono::NaiveDate;

use tracing::debug;

use baselab_model::{ConceptCatalog, ConceptId, Consolidation, EncounterId, Observation, SubjectId};

/// Immutable lookup structure over one observation snapshot.
///
/// Concept ids are remapped through the consolidation before indexing, so a
/// merged identifier's observations surface under its merge target. Only
/// observations whose post-consolidation concept owns a matrix column are
/// indexed. Bucket payloads are positions into the snapshot, in input order;
/// the resolver relies on that order for its tie-break.
#[derive(Debug)]
pub struct ObservationIndex<'a> {
    observations: &'a [Observation],
    by_encounter: HashMap<(EncounterId, NaiveDate, ConceptId), Vec<usize>>,
    by_subject: HashMap<(SubjectId, NaiveDate, ConceptId), Vec<usize>>,
    indexed: usize,
}

impl<'a> ObservationIndex<'a> {
    pub fn build(
        observations: &'a [Observation],
        catalog: &ConceptCatalog,
        consolidation: &Consolidation,
    ) -> Self {
        let mut by_encounter: HashMap<_, Vec<usize>> = HashMap::new();
        let mut by_subject: HashMap<_, Vec<usize>> = HashMap::new();
        let mut indexed = 0usize;
        for (position, observation) in observations.iter().enumerate() {
            // After remapping, merged sources surface as their target, so an
            // indexed concept is always a column owner if it is included.
            let concept = consolidation.remap(observation.concept);
            if !catalog.get(concept).is_some_and(|c| c.included) {
                continue;
            }
            let date = observation.chart_date();
            match observation.encounter {
                Some(encounter) => by_encounter
                    .entry((encounter, date, concept))
                    .or_default()
                    .push(position),
                None => by_subject
                    .entry((observation.subject, date, concept))
                    .or_default()
                    .push(position),
            }
            indexed += 1;
        }
        debug!(
            total = observations.len(),
            indexed,
            encounter_keys = by_encounter.len(),
            subject_keys = by_subject.len(),
            "built observation index"
        );
        Self {
            observations,
            by_encounter,
            by_subject,
            indexed,
        }
    }

    /// Candidates for `concept` on `date`: observations matched by encounter
    /// identity plus, for encounter-less rows, by subject identity. Yields
    /// `(input position, observation)` pairs.
    pub fn candidates(
        &self,
        encounter: EncounterId,
        subject: SubjectId,
        date: NaiveDate,
        concept: ConceptId,
    ) -> impl Iterator<Item = (usize, &'a Observation)> {
        let direct = self
            .by_encounter
            .get(&(encounter, date, concept))
            .into_iter()
            .flatten();
        let subject_level = self
            .by_subject
            .get(&(subject, date, concept))
            .into_iter()
            .flatten();
        direct
            .chain(subject_level)
            .map(|&position| (position, &self.observations[position]))
    }

    /// Observations that survived filtering and are reachable by lookups.
    pub fn indexed_count(&self) -> usize {
        self.indexed
    }
}
