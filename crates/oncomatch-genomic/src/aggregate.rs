//! Per-gene reduction of classified patient mutations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use oncomatch_common::{Classification, ClassificationLabel, MutationRecord};

use crate::classifier::VariantEffectPredictor;
use crate::normalise::{same_protein_change, GeneRoster};

/// What the patient data says about a gene before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneObservation {
    /// No record for the gene at all: untested and wild-type look the same
    NoRecords,
    /// The gene has records, none of them the requested variant(s)
    RequestedVariantAbsent { requested: Vec<String>, other_records: usize },
    /// `records` records were classified
    Classified { records: usize },
}

/// One classified patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFinding {
    pub record: MutationRecord,
    pub classification: Classification,
}

/// Gene-level summary status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneSummary {
    ActivatingFound,
    PathogenicFound,
    ResistanceFound,
    VusPresent,
    WildType,
}

impl GeneSummary {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneSummary::ActivatingFound => "ACTIVATING_FOUND",
            GeneSummary::PathogenicFound => "PATHOGENIC_FOUND",
            GeneSummary::ResistanceFound => "RESISTANCE_FOUND",
            GeneSummary::VusPresent      => "VUS_PRESENT",
            GeneSummary::WildType        => "WILD_TYPE",
        }
    }
}

/// Reduced status of one criterion gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneStatus {
    pub gene_symbol: String,
    pub best_classification: Classification,
    /// Record behind `best_classification`; `None` for wild-type
    pub contributing_variant: Option<MutationRecord>,
    pub observation: GeneObservation,
    /// Every classified record, input order
    pub findings: Vec<VariantFinding>,
}

impl GeneStatus {
    pub fn label(&self) -> ClassificationLabel {
        self.best_classification.label
    }

    pub fn is_wild_type(&self) -> bool {
        self.label() == ClassificationLabel::WildType
    }

    pub fn summary(&self) -> GeneSummary {
        match self.label() {
            ClassificationLabel::PredictedActivating    => GeneSummary::ActivatingFound,
            ClassificationLabel::PredictedPathogenicLof => GeneSummary::PathogenicFound,
            ClassificationLabel::PredictedResistance    => GeneSummary::ResistanceFound,
            ClassificationLabel::PredictedVus           => GeneSummary::VusPresent,
            ClassificationLabel::PredictedBenignUnclear
            | ClassificationLabel::WildType             => GeneSummary::WildType,
        }
    }
}

/// Classifies a gene's records and keeps the most severe.
pub struct GeneAggregator {
    predictor: Arc<dyn VariantEffectPredictor>,
    roster: Arc<GeneRoster>,
}

impl GeneAggregator {
    pub fn new(predictor: Arc<dyn VariantEffectPredictor>, roster: Arc<GeneRoster>) -> Self {
        Self { predictor, roster }
    }

    /// Reduce `records` for `gene_symbol`.
    ///
    /// `requested` holds canonical variant notations named for this gene; when
    /// non-empty only records carrying one of them are classified.
    pub fn aggregate(&self, gene_symbol: &str, requested: &[String], records: &[MutationRecord]) -> GeneStatus {
        let gene = self.roster.canonical_or_self(gene_symbol);

        let gene_records: Vec<&MutationRecord> = records
            .iter()
            .filter(|r| self.roster.same_gene(&r.gene_symbol, &gene))
            .collect();

        if gene_records.is_empty() {
            return wild_type(
                gene.clone(),
                format!("No mutation found in {gene} among patient records"),
                GeneObservation::NoRecords,
                Vec::new(),
            );
        }

        let selected: Vec<&MutationRecord> = if requested.is_empty() {
            gene_records.clone()
        } else {
            gene_records
                .iter()
                .copied()
                .filter(|r| {
                    r.protein_change.as_deref().is_some_and(|change| {
                        requested.iter().any(|wanted| same_protein_change(change, wanted))
                    })
                })
                .collect()
        };

        if selected.is_empty() {
            let reason = format!(
                "Requested variant(s) {} not found among {} {gene} record(s)",
                requested.join(", "),
                gene_records.len(),
            );
            let observation = GeneObservation::RequestedVariantAbsent {
                requested: requested.to_vec(),
                other_records: gene_records.len(),
            };
            return wild_type(gene, reason, observation, Vec::new());
        }

        let findings: Vec<VariantFinding> = selected
            .into_iter()
            .map(|record| {
                let classification = self.predictor.classify(&gene, record);
                debug!(
                    "{} {} classified {} by {} ({})",
                    gene,
                    record.display_variant(),
                    classification.label,
                    self.predictor.name(),
                    classification.reasoning
                );
                VariantFinding { record: record.clone(), classification }
            })
            .collect();

        let observation = GeneObservation::Classified { records: findings.len() };

        // Strictly greater only: ties keep the first record
        let mut best: Option<usize> = None;
        for (i, finding) in findings.iter().enumerate() {
            if best.is_none_or(|b| finding.classification.label > findings[b].classification.label) {
                best = Some(i);
            }
        }

        let best = best.filter(|&i| findings[i].classification.label > ClassificationLabel::PredictedBenignUnclear);
        match best {
            Some(i) => {
                let VariantFinding { record, classification } = findings[i].clone();
                debug!("{} reduced to {} from {} record(s)", gene, classification.label, findings.len());
                GeneStatus {
                    gene_symbol: gene,
                    best_classification: classification,
                    contributing_variant: Some(record),
                    observation,
                    findings,
                }
            }
            None => {
                let reason = format!(
                    "All {} {gene} record(s) classified benign or unclear; no qualifying mutation",
                    findings.len()
                );
                wild_type(gene, reason, observation, findings)
            }
        }
    }
}

fn wild_type(
    gene_symbol: String,
    reasoning: String,
    observation: GeneObservation,
    findings: Vec<VariantFinding>,
) -> GeneStatus {
    debug!("{} reduced to WILD_TYPE: {}", gene_symbol, reasoning);
    GeneStatus {
        gene_symbol,
        best_classification: Classification::new(ClassificationLabel::WildType, reasoning),
        contributing_variant: None,
        observation,
        findings,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RuleBasedPredictor;
    use crate::config::RuleSetConfig;
    use crate::known_variants::KnownVariantTable;
    use pretty_assertions::assert_eq;

    fn aggregator() -> GeneAggregator {
        let config = RuleSetConfig::default();
        let roster = Arc::new(GeneRoster::from_specs(&config.genes).unwrap());
        let table = KnownVariantTable::from_specs(&config.known_variants, &roster).unwrap();
        GeneAggregator::new(Arc::new(RuleBasedPredictor::new(Arc::new(table))), roster)
    }

    fn rec(gene: &str, vt: &str, change: Option<&str>) -> MutationRecord {
        MutationRecord::new(gene, vt, change)
    }

    #[test]
    fn test_no_records_is_wild_type() {
        let status = aggregator().aggregate("EGFR", &[], &[rec("KRAS", "Missense_Mutation", Some("G12C"))]);
        assert!(status.is_wild_type());
        assert_eq!(status.observation, GeneObservation::NoRecords);
        assert_eq!(status.contributing_variant, None);
        assert_eq!(status.summary(), GeneSummary::WildType);
    }

    #[test]
    fn test_highest_severity_wins() {
        let records = vec![
            rec("TP53", "Missense_Mutation", Some("A1V")),
            rec("TP53", "Nonsense_Mutation", Some("R196*")),
            rec("TP53", "Silent", None),
        ];
        let status = aggregator().aggregate("TP53", &[], &records);
        assert_eq!(status.label(), ClassificationLabel::PredictedPathogenicLof);
        assert_eq!(status.contributing_variant.as_ref().and_then(|r| r.protein_change.as_deref()), Some("R196*"));
        assert_eq!(status.findings.len(), 3);
        assert_eq!(status.observation, GeneObservation::Classified { records: 3 });
    }

    #[test]
    fn test_ties_keep_first_record() {
        let records = vec![
            rec("KRAS", "Missense_Mutation", Some("A59T")),
            rec("KRAS", "In_Frame_Del", Some("G10del")),
        ];
        let status = aggregator().aggregate("KRAS", &[], &records);
        assert_eq!(status.label(), ClassificationLabel::PredictedVus);
        assert_eq!(status.contributing_variant, Some(records[0].clone()));
    }

    #[test]
    fn test_activating_outranks_resistance() {
        let records = vec![
            rec("EGFR", "Missense_Mutation", Some("T790M")),
            rec("EGFR", "Missense_Mutation", Some("L858R")),
        ];
        let status = aggregator().aggregate("EGFR", &[], &records);
        assert_eq!(status.summary(), GeneSummary::ActivatingFound);
    }

    #[test]
    fn test_all_benign_is_wild_type() {
        let records = vec![
            rec("TP53", "Missense_Mutation", Some("P72R")),
            rec("TP53", "Silent", Some("S100S")),
        ];
        let status = aggregator().aggregate("TP53", &[], &records);
        assert!(status.is_wild_type());
        assert_eq!(status.findings.len(), 2);
        assert_eq!(status.contributing_variant, None);
    }

    #[test]
    fn test_vus_never_wild_type() {
        let records = vec![rec("KRAS", "Missense_Mutation", Some("A59T")), rec("KRAS", "Silent", None)];
        let status = aggregator().aggregate("KRAS", &[], &records);
        assert_eq!(status.summary(), GeneSummary::VusPresent);
    }

    #[test]
    fn test_requested_variant_filter() {
        let records = vec![
            rec("EGFR", "Missense_Mutation", Some("p.L858R")),
            rec("EGFR", "Missense_Mutation", Some("p.Thr790Met")),
        ];
        let status = aggregator().aggregate("EGFR", &["T790M".to_string()], &records);
        assert_eq!(status.label(), ClassificationLabel::PredictedResistance);
        assert_eq!(status.findings.len(), 1);
    }

    #[test]
    fn test_requested_variant_in_any_notation() {
        let records = vec![
            rec("EGFR", "Missense_Mutation", Some("L858R")),
            rec("EGFR", "Missense_Mutation", Some("T790M")),
        ];
        let requested = vec!["p.Thr790Met".to_string()];
        let status = aggregator().aggregate("EGFR", &requested, &records);
        assert_eq!(status.label(), ClassificationLabel::PredictedResistance);
        assert_eq!(status.findings.len(), 1);
    }

    #[test]
    fn test_requested_variant_absent() {
        let records = vec![rec("EGFR", "Missense_Mutation", Some("L858R"))];
        let status = aggregator().aggregate("EGFR", &["T790M".to_string()], &records);
        assert!(status.is_wild_type());
        assert_eq!(
            status.observation,
            GeneObservation::RequestedVariantAbsent { requested: vec!["T790M".into()], other_records: 1 }
        );
        assert!(status.best_classification.reasoning.contains("T790M"));
    }

    #[test]
    fn test_gene_match_is_case_insensitive_and_alias_aware() {
        let records = vec![rec("her2", "Missense_Mutation", Some("S310F")), rec("braf", "Missense_Mutation", Some("V600E"))];
        assert_eq!(aggregator().aggregate("ERBB2", &[], &records).findings.len(), 1);
        assert_eq!(aggregator().aggregate("BRAF", &[], &records).summary(), GeneSummary::ActivatingFound);
    }
}
