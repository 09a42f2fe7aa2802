//! Variant classification: the rule hierarchy that stands in for a real
//! variant-effect predictor.
//!
//! Strict precedence, first match wins:
//! 1. known-variant table on (gene, protein change)
//! 2. truncating variant types → PREDICTED_PATHOGENIC_LOF
//! 3. missense / in-frame → PREDICTED_VUS
//! 4. anything else → PREDICTED_BENIGN_UNCLEAR
//!
//! Every result carries a [`VariantAnnotation`]; curated entries add their
//! rationale, tool calls and knowledge-base levels.

use std::sync::Arc;

use oncomatch_common::{Classification, ClassificationLabel, MutationRecord, VariantAnnotation};

use crate::known_variants::{KnownVariant, KnownVariantTable};
use crate::normalise::hgvs::{canonical_protein_change, canonical_variant_id, change_consequence};

pub const REASON_LOF_CATEGORY: &str = "variant-type rule: loss-of-function category";
pub const REASON_VUS_DEFAULT: &str = "no specific rule matched; defaulting to uncertain significance";
pub const REASON_UNRECOGNIZED: &str = "unrecognized variant type";

/// Anything that can label a single patient mutation.
///
/// Implementations must be pure and total: same input, same output, never
/// panics on odd records.
pub trait VariantEffectPredictor: Send + Sync {
    /// `gene_symbol` is the canonical symbol the record was matched under.
    fn classify(&self, gene_symbol: &str, record: &MutationRecord) -> Classification;

    /// Predictor name, for logs.
    fn name(&self) -> &str;
}

/// Table lookup plus variant-type rules.
#[derive(Debug, Clone)]
pub struct RuleBasedPredictor {
    known: Arc<KnownVariantTable>,
}

impl RuleBasedPredictor {
    pub fn new(known: Arc<KnownVariantTable>) -> Self {
        Self { known }
    }
}

impl VariantEffectPredictor for RuleBasedPredictor {
    fn classify(&self, gene_symbol: &str, record: &MutationRecord) -> Classification {
        let gene = gene_symbol.trim().to_uppercase();
        let change = record.protein_change.as_deref().and_then(canonical_protein_change);
        let known = change.as_deref().and_then(|change| self.known.lookup(&gene, change));
        let annotation = annotate(&gene, record, change.as_deref(), known);

        let classification = if let Some(entry) = known {
            Classification::new(entry.label, format!("known variant: {}", entry.label))
        } else if record.variant_type.is_truncating() {
            Classification::new(ClassificationLabel::PredictedPathogenicLof, REASON_LOF_CATEGORY)
        } else if record.variant_type.is_in_frame() {
            Classification::new(ClassificationLabel::PredictedVus, REASON_VUS_DEFAULT)
        } else {
            Classification::new(ClassificationLabel::PredictedBenignUnclear, REASON_UNRECOGNIZED)
        };
        classification.with_annotation(annotation)
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}

/// Consequence precedence: curated term, record variant type, notation.
fn annotate(
    gene: &str,
    record: &MutationRecord,
    change: Option<&str>,
    known: Option<&KnownVariant>,
) -> VariantAnnotation {
    let canonical_variant_id = match change {
        Some(change) => canonical_variant_id(gene, change),
        None if record.variant_type.as_str().is_empty() => format!("{gene}:unknown"),
        None => format!("{gene}:{}", record.variant_type),
    };
    let from_type = Some(record.variant_type.consequence_term()).filter(|term| *term != "unknown");
    let predicted_consequence = known
        .and_then(|k| k.consequence.clone())
        .or_else(|| from_type.or_else(|| change.and_then(change_consequence)).map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    match known {
        Some(k) => VariantAnnotation {
            canonical_variant_id,
            predicted_consequence,
            rationale: k.note.clone(),
            sift: k.sift.clone(),
            polyphen: k.polyphen.clone(),
            clinvar_significance: k.clinvar.clone(),
            oncokb_level: k.oncokb.clone(),
        },
        None => VariantAnnotation { canonical_variant_id, predicted_consequence, ..Default::default() },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetConfig;
    use crate::normalise::GeneRoster;
    use pretty_assertions::assert_eq;

    fn predictor() -> RuleBasedPredictor {
        let config = RuleSetConfig::default();
        let roster = GeneRoster::from_specs(&config.genes).unwrap();
        let table = KnownVariantTable::from_specs(&config.known_variants, &roster).unwrap();
        RuleBasedPredictor::new(Arc::new(table))
    }

    fn classify(gene: &str, vt: &str, change: Option<&str>) -> Classification {
        predictor().classify(gene, &MutationRecord::new(gene, vt, change))
    }

    #[test]
    fn test_known_variant_wins() {
        let c = classify("BRAF", "Missense_Mutation", Some("p.V600E"));
        assert_eq!(c.label, ClassificationLabel::PredictedActivating);
        assert_eq!(c.reasoning, "known variant: PREDICTED_ACTIVATING");
    }

    #[test]
    fn test_known_variant_overrides_variant_type() {
        // Table says resistance even when the record claims a truncating type
        let c = classify("EGFR", "Nonsense_Mutation", Some("T790M"));
        assert_eq!(c.label, ClassificationLabel::PredictedResistance);
        let c = classify("TP53", "Frame_Shift_Del", Some("P72R"));
        assert_eq!(c.label, ClassificationLabel::PredictedBenignUnclear);
    }

    #[test]
    fn test_three_letter_record_hits_table() {
        let c = classify("TP53", "Missense_Mutation", Some("p.Arg248Gln"));
        assert_eq!(c.label, ClassificationLabel::PredictedPathogenicLof);
        assert_eq!(c.reasoning, "known variant: PREDICTED_PATHOGENIC_LOF");
    }

    #[test]
    fn test_truncating_types_are_lof() {
        for vt in ["Nonsense_Mutation", "Frame_Shift_Del", "Frame_Shift_Ins", "Splice_Site"] {
            let c = classify("TP53", vt, None);
            assert_eq!(c.label, ClassificationLabel::PredictedPathogenicLof, "{vt}");
            assert_eq!(c.reasoning, REASON_LOF_CATEGORY);
        }
    }

    #[test]
    fn test_in_frame_types_are_vus() {
        for vt in ["Missense_Mutation", "In_Frame_Del", "In_Frame_Ins"] {
            let c = classify("KRAS", vt, Some("A59T"));
            assert_eq!(c.label, ClassificationLabel::PredictedVus, "{vt}");
            assert_eq!(c.reasoning, REASON_VUS_DEFAULT);
        }
    }

    #[test]
    fn test_unknown_type_falls_through() {
        let c = classify("KRAS", "Silent", Some("G12G"));
        assert_eq!(c.label, ClassificationLabel::PredictedBenignUnclear);
        assert_eq!(c.reasoning, REASON_UNRECOGNIZED);
        let c = classify("KRAS", "", None);
        assert_eq!(c.label, ClassificationLabel::PredictedBenignUnclear);
    }

    #[test]
    fn test_known_variant_annotation() {
        let c = classify("BRAF", "Missense_Mutation", Some("p.Val600Glu"));
        let a = c.annotation.unwrap();
        assert_eq!(a.canonical_variant_id, "BRAF:p.V600E");
        assert_eq!(a.predicted_consequence, "missense_variant");
        assert_eq!(a.rationale.as_deref(), Some("BRAF V600E, targeted by BRAF/MEK inhibitors"));
        assert_eq!(a.polyphen.as_deref(), Some("probably_damaging"));
        assert_eq!(a.oncokb_level.as_deref(), Some("Level 1"));
        // Curation never rewrites the reasoning citation
        assert_eq!(c.reasoning, "known variant: PREDICTED_ACTIVATING");
    }

    #[test]
    fn test_rule_annotation_follows_record() {
        let a = classify("TP53", "Frame_Shift_Del", Some("p.S90fs")).annotation.unwrap();
        assert_eq!(a.canonical_variant_id, "TP53:p.S90FS");
        assert_eq!(a.predicted_consequence, "frameshift_variant");
        assert_eq!(a.rationale, None);
        assert_eq!(a.sift, None);

        let a = classify("BRCA2", "Splice_Site", None).annotation.unwrap();
        assert_eq!(a.canonical_variant_id, "BRCA2:Splice_Site");
        assert_eq!(a.predicted_consequence, "splice_site_variant");
    }

    #[test]
    fn test_untyped_record_consequence_from_notation() {
        let a = classify("APC", "", Some("R1450*")).annotation.unwrap();
        assert_eq!(a.predicted_consequence, "stop_gained");
        let a = classify("APC", "", None).annotation.unwrap();
        assert_eq!(a.canonical_variant_id, "APC:unknown");
        assert_eq!(a.predicted_consequence, "unknown");
    }

    #[test]
    fn test_gene_matters_for_table() {
        // V600E is only in the table for BRAF
        let c = classify("NRAS", "Missense_Mutation", Some("V600E"));
        assert_eq!(c.label, ClassificationLabel::PredictedVus);
    }
}
