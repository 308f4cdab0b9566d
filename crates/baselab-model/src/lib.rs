pub mod concept;
pub mod consolidation;
pub mod encounter;
pub mod error;
pub mod ids;
pub mod observation;
pub mod quality;
pub mod resolved;

pub use concept::{Concept, ConceptCatalog, clean_label};
pub use consolidation::{Consolidation, MergeRule, UnmergedGroup, UnmergedReason};
pub use encounter::Encounter;
pub use error::{BaselabError, Result};
pub use ids::{ConceptId, EncounterId, SubjectId};
pub use observation::Observation;
pub use quality::{InputKind, QualityReport, QualityWarning};
pub use resolved::{DayOffset, ResolvedValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_conflict_is_fatal_and_typed() {
        let mut catalog = ConceptCatalog::new();
        catalog
            .insert(Concept {
                id: ConceptId::new(50912),
                label: "Creatinine".to_string(),
                category: None,
                fluid: None,
                included: true,
            })
            .unwrap();
        let err = catalog
            .insert(Concept {
                id: ConceptId::new(50912),
                label: "Creatinine, Serum".to_string(),
                category: None,
                fluid: None,
                included: true,
            })
            .unwrap_err();
        assert!(matches!(err, BaselabError::CatalogConflict { .. }));
    }

    #[test]
    fn merge_rules_serialize_for_reporting() {
        let rule = MergeRule {
            source: ConceptId::new(50809),
            target: ConceptId::new(50931),
            label: "Glucose".to_string(),
        };
        let json = serde_json::to_string(&rule).expect("serialize rule");
        assert_eq!(
            json,
            "{\"source\":50809,\"target\":50931,\"label\":\"Glucose\"}"
        );
    }
}
