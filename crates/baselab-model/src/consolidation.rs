use std::collections::BTreeMap;

use serde::Serialize;

use crate::ids::ConceptId;

/// Why a duplicate-label group was evaluated but left unmerged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmergedReason {
    /// Two or more members carry data; merging would conflate measurements.
    MultipleActive,
    /// No member carries data; the group is left as empty columns.
    AllEmpty,
}

impl UnmergedReason {
    pub fn describe(self) -> &'static str {
        match self {
            Self::MultipleActive => "two or more members carry data",
            Self::AllEmpty => "no member carries data",
        }
    }
}

/// One identifier re-keyed onto the surviving member of its label group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeRule {
    pub source: ConceptId,
    pub target: ConceptId,
    pub label: String,
}

/// A duplicate-label group that was evaluated but deliberately left
/// unmerged, with per-member observation counts for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmergedGroup {
    pub label: String,
    pub members: Vec<ConceptId>,
    pub data_counts: Vec<usize>,
    pub reason: UnmergedReason,
}

/// Outcome of identifier consolidation.
///
/// Computed once per build from store-wide observation counts, before any
/// window resolution, and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    merges: Vec<MergeRule>,
    unmerged: Vec<UnmergedGroup>,
    labels_evaluated: usize,
    remap: BTreeMap<ConceptId, ConceptId>,
    sources_by_target: BTreeMap<ConceptId, Vec<ConceptId>>,
}

impl Consolidation {
    pub fn new(
        merges: Vec<MergeRule>,
        unmerged: Vec<UnmergedGroup>,
        labels_evaluated: usize,
    ) -> Self {
        let mut remap = BTreeMap::new();
        let mut sources_by_target: BTreeMap<ConceptId, Vec<ConceptId>> = BTreeMap::new();
        for rule in &merges {
            remap.insert(rule.source, rule.target);
            sources_by_target
                .entry(rule.target)
                .or_default()
                .push(rule.source);
        }
        Self {
            merges,
            unmerged,
            labels_evaluated,
            remap,
            sources_by_target,
        }
    }

    /// Post-consolidation identifier for `id`: the merge target when `id`
    /// was merged away, otherwise `id` itself.
    pub fn remap(&self, id: ConceptId) -> ConceptId {
        self.remap.get(&id).copied().unwrap_or(id)
    }

    /// True when `id` was merged away and no longer owns a column.
    pub fn is_merged_source(&self, id: ConceptId) -> bool {
        self.remap.contains_key(&id)
    }

    /// True when at least one other identifier was merged onto `id`.
    pub fn is_merge_target(&self, id: ConceptId) -> bool {
        self.sources_by_target.contains_key(&id)
    }

    /// Identifiers merged onto `id`, in rule order; empty for non-targets.
    pub fn merged_sources(&self, id: ConceptId) -> &[ConceptId] {
        self.sources_by_target
            .get(&id)
            .map_or(&[], |sources| sources.as_slice())
    }

    pub fn merges(&self) -> &[MergeRule] {
        &self.merges
    }

    pub fn unmerged(&self) -> &[UnmergedGroup] {
        &self.unmerged
    }

    /// Number of duplicate-label groups inspected.
    pub fn labels_evaluated(&self) -> usize {
        self.labels_evaluated
    }

    /// Number of distinct merge targets.
    pub fn merged_groups(&self) -> usize {
        self.sources_by_target.len()
    }

    /// Number of identifiers merged away.
    pub fn merged_identifiers(&self) -> usize {
        self.merges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: i64) -> ConceptId {
        ConceptId::new(value)
    }

    #[test]
    fn remap_is_identity_without_rules() {
        let consolidation = Consolidation::default();
        assert_eq!(consolidation.remap(id(50931)), id(50931));
        assert!(!consolidation.is_merge_target(id(50931)));
        assert!(consolidation.merged_sources(id(50931)).is_empty());
    }

    #[test]
    fn remap_follows_merge_rules() {
        let consolidation = Consolidation::new(
            vec![
                MergeRule {
                    source: id(50809),
                    target: id(50931),
                    label: "Glucose".to_string(),
                },
                MergeRule {
                    source: id(52027),
                    target: id(50931),
                    label: "Glucose".to_string(),
                },
            ],
            Vec::new(),
            1,
        );
        assert_eq!(consolidation.remap(id(50809)), id(50931));
        assert_eq!(consolidation.remap(id(52027)), id(50931));
        assert_eq!(consolidation.remap(id(50931)), id(50931));
        assert!(consolidation.is_merged_source(id(50809)));
        assert!(consolidation.is_merge_target(id(50931)));
        assert_eq!(
            consolidation.merged_sources(id(50931)),
            &[id(50809), id(52027)]
        );
        assert_eq!(consolidation.merged_groups(), 1);
        assert_eq!(consolidation.merged_identifiers(), 2);
    }
}
