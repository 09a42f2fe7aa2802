//! Curated known-variant table.
//!
//! Keyed by (canonical gene symbol, canonical protein change). Built once from
//! the rule-set config and shared read-only by every predictor instance.

use std::collections::HashMap;

use oncomatch_common::{ClassificationLabel, GenomicError, Result};

use crate::config::KnownVariantSpec;
use crate::normalise::hgvs::{canonical_protein_change, change_consequence};
use crate::normalise::GeneRoster;

/// One curated entry, keyed elsewhere by canonical (gene, change).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownVariant {
    pub label: ClassificationLabel,
    pub note: Option<String>,
    /// Sequence Ontology term, `None` when neither configured nor implied
    pub consequence: Option<String>,
    pub sift: Option<String>,
    pub polyphen: Option<String>,
    pub clinvar: Option<String>,
    pub oncokb: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnownVariantTable {
    entries: HashMap<(String, String), KnownVariant>,
}

impl KnownVariantTable {
    /// Build the table. Gene aliases are folded through `roster`; duplicate
    /// keys keep the first entry.
    pub fn from_specs(specs: &[KnownVariantSpec], roster: &GeneRoster) -> Result<Self> {
        let mut entries = HashMap::with_capacity(specs.len());
        for spec in specs {
            if spec.label == ClassificationLabel::WildType {
                return Err(GenomicError::Config(format!(
                    "known variant {} {} cannot be labelled WILD_TYPE",
                    spec.gene, spec.protein_change
                )));
            }
            let change = canonical_protein_change(&spec.protein_change).ok_or_else(|| {
                GenomicError::Config(format!("known variant for {} has an empty protein change", spec.gene))
            })?;
            let gene = roster.canonical_or_self(&spec.gene);
            if gene.is_empty() {
                return Err(GenomicError::Config("known variant with empty gene symbol".into()));
            }
            if entries.contains_key(&(gene.clone(), change.clone())) {
                tracing::warn!("Duplicate known variant {} {}; keeping first entry", gene, change);
                continue;
            }
            let consequence = spec.consequence.clone()
                .or_else(|| change_consequence(&change).map(str::to_string));
            let entry = KnownVariant {
                label: spec.label,
                note: spec.note.clone(),
                consequence,
                sift: spec.sift.clone(),
                polyphen: spec.polyphen.clone(),
                clinvar: spec.clinvar.clone(),
                oncokb: spec.oncokb.clone(),
            };
            entries.insert((gene, change), entry);
        }
        Ok(Self { entries })
    }

    /// Entry for an already-canonical (gene, change) pair.
    pub fn lookup(&self, gene: &str, change: &str) -> Option<&KnownVariant> {
        self.entries.get(&(gene.to_string(), change.to_string()))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetConfig;

    fn roster() -> GeneRoster {
        GeneRoster::from_specs(&RuleSetConfig::default().genes).unwrap()
    }

    fn spec(gene: &str, change: &str, label: ClassificationLabel) -> KnownVariantSpec {
        KnownVariantSpec::new(gene, change, label)
    }

    #[test]
    fn test_default_table_lookup() {
        let config = RuleSetConfig::default();
        let table = KnownVariantTable::from_specs(&config.known_variants, &roster()).unwrap();
        assert_eq!(table.len(), config.known_variants.len());
        assert_eq!(table.lookup("BRAF", "V600E").map(|k| k.label), Some(ClassificationLabel::PredictedActivating));
        assert_eq!(table.lookup("EGFR", "T790M").map(|k| k.label), Some(ClassificationLabel::PredictedResistance));
        assert_eq!(table.lookup("BRAF", "V600D").map(|k| k.label), None);
    }

    #[test]
    fn test_entries_keep_curation() {
        let config = RuleSetConfig::default();
        let table = KnownVariantTable::from_specs(&config.known_variants, &roster()).unwrap();

        let v600e = table.lookup("BRAF", "V600E").unwrap();
        assert_eq!(v600e.note.as_deref(), Some("BRAF V600E, targeted by BRAF/MEK inhibitors"));
        assert_eq!(v600e.consequence.as_deref(), Some("missense_variant"));
        assert_eq!(v600e.oncokb.as_deref(), Some("Level 1"));

        let p72r = table.lookup("TP53", "P72R").unwrap();
        assert_eq!(p72r.sift.as_deref(), Some("tolerated"));
        assert_eq!(p72r.clinvar.as_deref(), Some("Benign/Likely_Benign"));

        let exon19 = table.lookup("EGFR", "EXON19DEL").unwrap();
        assert_eq!(exon19.consequence.as_deref(), Some("inframe_deletion"));
        assert_eq!(exon19.sift, None);
    }

    #[test]
    fn test_configured_consequence_wins() {
        let specs = vec![KnownVariantSpec {
            consequence: Some("splice_region_variant".into()),
            ..spec("MET", "X1010_splice", ClassificationLabel::PredictedActivating)
        }];
        let table = KnownVariantTable::from_specs(&specs, &roster()).unwrap();
        let entry = table.lookup("MET", "X1010_SPLICE").unwrap();
        assert_eq!(entry.consequence.as_deref(), Some("splice_region_variant"));
        assert_eq!(entry.note, None);
    }

    #[test]
    fn test_entries_are_canonicalised() {
        let specs = vec![spec("her2", "p.Ser310Phe", ClassificationLabel::PredictedActivating)];
        let table = KnownVariantTable::from_specs(&specs, &roster()).unwrap();
        assert_eq!(table.lookup("ERBB2", "S310F").map(|k| k.label), Some(ClassificationLabel::PredictedActivating));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let specs = vec![
            spec("KRAS", "G12C", ClassificationLabel::PredictedActivating),
            spec("KRAS", "p.G12C", ClassificationLabel::PredictedVus),
        ];
        let table = KnownVariantTable::from_specs(&specs, &roster()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("KRAS", "G12C").map(|k| k.label), Some(ClassificationLabel::PredictedActivating));
    }

    #[test]
    fn test_invalid_entries_rejected() {
        let wild = vec![spec("KRAS", "G12C", ClassificationLabel::WildType)];
        assert!(KnownVariantTable::from_specs(&wild, &roster()).is_err());
        let blank = vec![spec("KRAS", " ", ClassificationLabel::PredictedVus)];
        assert!(KnownVariantTable::from_specs(&blank, &roster()).is_err());
    }
}
