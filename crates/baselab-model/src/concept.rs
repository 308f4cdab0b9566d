use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BaselabError, Result};
use crate::ids::ConceptId;

/// One measurement concept from the input catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    pub label: String,
    pub category: Option<String>,
    pub fluid: Option<String>,
    /// Inclusion flag from the catalog; only included concepts participate
    /// in consolidation and the output matrix.
    pub included: bool,
}

impl Concept {
    /// Feature-column stem for this concept: the cleaned label followed by
    /// the numeric identifier, e.g. `Absolute_Lymphocyte_Count_51133`.
    pub fn column_label(&self) -> String {
        format!("{}_{}", clean_label(&self.label), self.id)
    }
}

/// Makes a catalog label safe for use as a feature-column name: spaces,
/// commas, slashes and hyphens become `_`, parentheses are dropped, other
/// characters pass through.
pub fn clean_label(label: &str) -> String {
    label
        .chars()
        .filter_map(|c| match c {
            ' ' | ',' | '/' | '-' => Some('_'),
            '(' | ')' => None,
            other => Some(other),
        })
        .collect()
}

/// Insertion-ordered collection of concepts with identifier lookup.
///
/// Construction fails when the same identifier appears twice with
/// conflicting metadata; byte-identical duplicate rows are collapsed.
#[derive(Debug, Clone, Default)]
pub struct ConceptCatalog {
    concepts: Vec<Concept>,
    by_id: BTreeMap<ConceptId, usize>,
}

impl ConceptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_concepts<I>(concepts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Concept>,
    {
        let mut catalog = Self::new();
        for concept in concepts {
            catalog.insert(concept)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, concept: Concept) -> Result<()> {
        if let Some(&index) = self.by_id.get(&concept.id) {
            let existing = &self.concepts[index];
            if *existing == concept {
                return Ok(());
            }
            return Err(BaselabError::CatalogConflict {
                id: concept.id,
                detail: conflict_detail(existing, &concept),
            });
        }
        self.by_id.insert(concept.id, self.concepts.len());
        self.concepts.push(concept);
        Ok(())
    }

    pub fn get(&self, id: ConceptId) -> Option<&Concept> {
        self.by_id.get(&id).map(|&index| &self.concepts[index])
    }

    pub fn contains(&self, id: ConceptId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// All concepts in catalog (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter()
    }

    /// Concepts with the inclusion flag set, in catalog order.
    pub fn included(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter().filter(|concept| concept.included)
    }

    pub fn included_count(&self) -> usize {
        self.included().count()
    }
}

fn conflict_detail(existing: &Concept, duplicate: &Concept) -> String {
    let mut differences = Vec::new();
    if existing.label != duplicate.label {
        differences.push(format!(
            "label {:?} vs {:?}",
            existing.label, duplicate.label
        ));
    }
    if existing.category != duplicate.category {
        differences.push(format!(
            "category {:?} vs {:?}",
            existing.category, duplicate.category
        ));
    }
    if existing.fluid != duplicate.fluid {
        differences.push(format!(
            "fluid {:?} vs {:?}",
            existing.fluid, duplicate.fluid
        ));
    }
    if existing.included != duplicate.included {
        differences.push(format!(
            "inclusion {} vs {}",
            existing.included, duplicate.included
        ));
    }
    differences.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(id: i64, label: &str) -> Concept {
        Concept {
            id: ConceptId::new(id),
            label: label.to_string(),
            category: Some("Blood Gas".to_string()),
            fluid: Some("Blood".to_string()),
            included: true,
        }
    }

    #[test]
    fn clean_label_replaces_separators() {
        assert_eq!(
            clean_label("Absolute Lymphocyte Count"),
            "Absolute_Lymphocyte_Count"
        );
        assert_eq!(clean_label("WBC, other"), "WBC__other");
        assert_eq!(clean_label("pO2/pCO2"), "pO2_pCO2");
        assert_eq!(clean_label("Anti-DNA"), "Anti_DNA");
    }

    #[test]
    fn clean_label_drops_parentheses() {
        assert_eq!(clean_label("Calcium (Total)"), "Calcium_Total");
        assert_eq!(clean_label("pH (Arterial)"), "pH_Arterial");
    }

    #[test]
    fn column_label_appends_identifier() {
        assert_eq!(concept(50912, "Creatinine").column_label(), "Creatinine_50912");
    }

    #[test]
    fn insert_collapses_identical_duplicates() {
        let mut catalog = ConceptCatalog::new();
        catalog.insert(concept(1, "Sodium")).unwrap();
        catalog.insert(concept(1, "Sodium")).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn insert_rejects_conflicting_metadata() {
        let mut catalog = ConceptCatalog::new();
        catalog.insert(concept(1, "Sodium")).unwrap();
        let err = catalog.insert(concept(1, "Potassium")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("catalog conflict for itemid 1"), "{message}");
        assert!(message.contains("label"), "{message}");
    }

    #[test]
    fn included_filters_and_preserves_order() {
        let mut catalog = ConceptCatalog::new();
        catalog.insert(concept(3, "Lactate")).unwrap();
        let mut excluded = concept(2, "Ammonia");
        excluded.included = false;
        catalog.insert(excluded).unwrap();
        catalog.insert(concept(9, "Glucose")).unwrap();

        let ids: Vec<i64> = catalog.included().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![3, 9]);
        assert_eq!(catalog.included_count(), 2);
        assert_eq!(catalog.len(), 3);
    }
}
