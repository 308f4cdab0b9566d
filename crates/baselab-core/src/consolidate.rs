//! Identifier consolidation.
//!
//! Some catalogs carry several identifiers for the same measurement under
//! one label. Merging them is only safe when at most one identifier actually
//! carries data; otherwise a merged column would conflate distinct
//! measurement series. The decision is made once per build from store-wide
//! counts, never per encounter.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use baselab_model::{
    Concept, ConceptCatalog, ConceptId, Consolidation, MergeRule, Observation, UnmergedGroup,
    UnmergedReason,
};

/// Store-wide observation counts per concept identifier.
pub fn concept_counts(observations: &[Observation]) -> HashMap<ConceptId, usize> {
    let mut counts = HashMap::new();
    for observation in observations {
        *counts.entry(observation.concept).or_insert(0) += 1;
    }
    counts
}

/// Decides which duplicate-label identifiers are merged.
///
/// Included concepts are grouped by exact label. A group merges when exactly
/// one member has observations anywhere in the store: every zero-data member
/// is re-keyed onto it. Groups where two or more members carry data, and
/// groups where none do, are left unmerged and recorded with their reason
/// and per-member counts.
pub fn consolidate(
    catalog: &ConceptCatalog,
    counts: &HashMap<ConceptId, usize>,
) -> Consolidation {
    let mut groups: BTreeMap<&str, Vec<&Concept>> = BTreeMap::new();
    for concept in catalog.included() {
        groups
            .entry(concept.label.as_str())
            .or_default()
            .push(concept);
    }

    let mut merges = Vec::new();
    let mut unmerged = Vec::new();
    let mut labels_evaluated = 0usize;
    for (label, members) in groups {
        if members.len() < 2 {
            continue;
        }
        labels_evaluated += 1;
        let data_counts: Vec<usize> = members
            .iter()
            .map(|concept| counts.get(&concept.id).copied().unwrap_or(0))
            .collect();
        let active = data_counts.iter().filter(|&&count| count > 0).count();

        if active == 1 {
            let Some(target_index) = data_counts.iter().position(|&count| count > 0) else {
                continue;
            };
            let target = members[target_index];
            for member in &members {
                if member.id == target.id {
                    continue;
                }
                if member.category != target.category || member.fluid != target.fluid {
                    debug!(
                        label,
                        source = %member.id,
                        target = %target.id,
                        "merging across divergent catalog metadata; target metadata wins"
                    );
                }
                merges.push(MergeRule {
                    source: member.id,
                    target: target.id,
                    label: label.to_string(),
                });
            }
            debug!(
                label,
                target = %target.id,
                sources = members.len() - 1,
                "label group merged"
            );
        } else {
            let reason = if active == 0 {
                UnmergedReason::AllEmpty
            } else {
                UnmergedReason::MultipleActive
            };
            debug!(label, active, reason = reason.describe(), "label group left unmerged");
            unmerged.push(UnmergedGroup {
                label: label.to_string(),
                members: members.iter().map(|concept| concept.id).collect(),
                data_counts,
                reason,
            });
        }
    }

    Consolidation::new(merges, unmerged, labels_evaluated)
}
