//! Eligibility evaluation: intent × per-gene statuses → verdict.
//!
//! Each gene gets a three-valued qualification; the verdict is MET when
//! every gene agrees with the required polarity, NOT_MET when every gene
//! disagrees, and UNCLEAR for anything else (no genes, indeterminate genes,
//! or a mix).

use std::fmt;

use serde::{Deserialize, Serialize};

use oncomatch_common::{ClassificationLabel, GenomicStatus, Intent, VariantAnnotation};

use crate::aggregate::{GeneObservation, GeneStatus, GeneSummary};
use crate::config::{MissingGeneData, PolicyConfig};
use crate::extraction::ExtractedQuery;
use crate::intent::IntentMatch;

/// Final verdict for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionStatus {
    Met,
    NotMet,
    Unclear,
}

impl CriterionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionStatus::Met     => "MET",
            CriterionStatus::NotMet  => "NOT_MET",
            CriterionStatus::Unclear => "UNCLEAR",
        }
    }
}

impl fmt::Display for CriterionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a gene's status satisfies the required genomic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    Qualifies,
    DoesNotQualify,
    Indeterminate,
}

impl Qualification {
    fn from_bool(b: bool) -> Self {
        if b { Qualification::Qualifies } else { Qualification::DoesNotQualify }
    }

    fn describe(&self) -> &'static str {
        match self {
            Qualification::Qualifies      => "qualifies",
            Qualification::DoesNotQualify => "does not qualify",
            Qualification::Indeterminate  => "indeterminate",
        }
    }
}

/// One row of the `details` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDetail {
    pub gene_symbol: String,
    /// Protein change, variant type, or "none"
    pub variant_identified: String,
    pub simulated_classification: ClassificationLabel,
    pub classification_reasoning: String,
    /// Absent for wild-type genes and predictors that do not annotate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<VariantAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneSummaryEntry {
    pub gene_symbol: String,
    pub summary: GeneSummary,
}

/// Result of analysing one criterion against one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: CriterionStatus,
    pub evidence: String,
    pub details: Vec<VariantDetail>,
    pub intent: Intent,
    pub query: ExtractedQuery,
    pub gene_summaries: Vec<GeneSummaryEntry>,
}

impl AnalysisResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub struct EligibilityEvaluator {
    policy: PolicyConfig,
}

impl EligibilityEvaluator {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Three-valued qualification of one gene under `intent`.
    pub fn qualify(&self, intent: &Intent, gene: &GeneStatus) -> Qualification {
        let label = gene.label();
        match intent.required_status {
            GenomicStatus::WildType => Qualification::from_bool(label == ClassificationLabel::WildType),
            GenomicStatus::AnyMutation => {
                if gene.observation == GeneObservation::NoRecords
                    && self.policy.missing_gene_data == MissingGeneData::Unclear
                {
                    return Qualification::Indeterminate;
                }
                Qualification::from_bool(
                    label != ClassificationLabel::WildType && label != ClassificationLabel::PredictedBenignUnclear,
                )
            }
            status => {
                if label == ClassificationLabel::PredictedVus {
                    Qualification::Indeterminate
                } else {
                    Qualification::from_bool(status.matching_label() == Some(label))
                }
            }
        }
    }

    /// Combine per-gene qualifications into the verdict.
    pub fn verdict(&self, intent: &Intent, qualifications: &[Qualification]) -> CriterionStatus {
        if qualifications.is_empty() || qualifications.contains(&Qualification::Indeterminate) {
            return CriterionStatus::Unclear;
        }
        let wanted = Qualification::from_bool(intent.presence_required);
        if qualifications.iter().all(|q| *q == wanted) {
            CriterionStatus::Met
        } else if qualifications.iter().all(|q| *q != wanted) {
            CriterionStatus::NotMet
        } else {
            CriterionStatus::Unclear
        }
    }

    /// Build the full result. Never fails; anything it cannot decide is
    /// UNCLEAR.
    pub fn evaluate(
        &self,
        criterion: &str,
        query: &ExtractedQuery,
        intent: &IntentMatch,
        genes: &[GeneStatus],
    ) -> AnalysisResult {
        let qualifications: Vec<Qualification> = genes.iter().map(|g| self.qualify(&intent.intent, g)).collect();
        let status = self.verdict(&intent.intent, &qualifications);

        let mut evidence: Vec<String> = vec![format!("Criterion: \"{}\"", criterion.trim())];
        evidence.push(describe_query(query));
        evidence.push(describe_intent(intent));
        if genes.is_empty() {
            evidence.push("Could not identify a specific target gene in the criterion.".to_string());
        }
        for (gene, q) in genes.iter().zip(&qualifications) {
            evidence.push(describe_gene(gene, *q));
        }
        evidence.push(format!("Overall Status for Criterion: {status}"));

        let details = genes
            .iter()
            .map(|g| VariantDetail {
                gene_symbol: g.gene_symbol.clone(),
                variant_identified: g.contributing_variant.as_ref()
                    .map(|r| r.display_variant())
                    .unwrap_or_else(|| "none".to_string()),
                simulated_classification: g.label(),
                classification_reasoning: g.best_classification.reasoning.clone(),
                annotation: g.best_classification.annotation.clone(),
            })
            .collect();

        let gene_summaries = genes
            .iter()
            .map(|g| GeneSummaryEntry { gene_symbol: g.gene_symbol.clone(), summary: g.summary() })
            .collect();

        AnalysisResult {
            status,
            evidence: evidence.join("\n"),
            details,
            intent: intent.intent,
            query: query.clone(),
            gene_summaries,
        }
    }
}

fn describe_query(query: &ExtractedQuery) -> String {
    let variants: Vec<String> = query.specific_variants
        .iter()
        .map(|v| match &v.gene {
            Some(g) => format!("{} ({})", v.notation, g),
            None => v.notation.clone(),
        })
        .collect();
    format!("Parsed query: genes=[{}]; variants=[{}]", query.genes.join(", "), variants.join(", "))
}

fn describe_intent(m: &IntentMatch) -> String {
    let polarity = if m.intent.presence_required { "presence required" } else { "absence required" };
    let rule = match (&m.rule, &m.negation) {
        (Some(rule), Some(marker)) => format!("rule: {rule}; negated by '{marker}'"),
        (Some(rule), None) => format!("rule: {rule}"),
        (None, _) => "default, bare gene mention".to_string(),
    };
    format!("Resolved intent: {}, {} ({})", m.intent.required_status, polarity, rule)
}

fn describe_gene(gene: &GeneStatus, q: Qualification) -> String {
    let c = &gene.best_classification;
    let source = match &gene.contributing_variant {
        Some(record) => format!(" from {}", record.display_variant()),
        None => String::new(),
    };
    let mut line = format!("{}: {}{} ({}) -> {}", gene.gene_symbol, c.label, source, c.reasoning, q.describe());
    if q == Qualification::Indeterminate {
        if gene.observation == GeneObservation::NoRecords {
            line.push_str("; untested and wild-type cannot be distinguished");
        } else {
            line.push_str("; variant of uncertain significance");
        }
    }
    line
}

// ── Tests ─────────────────────────────────────────────────────────────────────
