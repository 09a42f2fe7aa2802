//! Genomic criterion analyzer: the full pipeline behind one call.
//!
//! ```text
//! criterion ─┬─► extract ──────► query ─┐
//!            └─► resolve intent ────────┤
//! records ──────────────► aggregate ◄───┘ (classify per record)
//!                               │
//!                               ▼
//!                           evaluate ──► AnalysisResult
//! ```
//!
//! The analyzer holds only immutable rule data, so one instance can serve any
//! number of threads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use oncomatch_common::{Classification, GenomicError, Intent, MutationRecord, Result};

use crate::aggregate::{GeneAggregator, GeneStatus};
use crate::classifier::{RuleBasedPredictor, VariantEffectPredictor};
use crate::evaluate::{AnalysisResult, EligibilityEvaluator};
use crate::extraction::{self, ExtractedQuery};
use crate::intent::IntentMatch;
use crate::rules::RuleSet;

/// One (criterion, patient) pair for batch analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub criterion: String,
    pub records: Vec<MutationRecord>,
}

impl AnalysisJob {
    pub fn new(criterion: impl Into<String>, records: Vec<MutationRecord>) -> Self {
        Self { criterion: criterion.into(), records }
    }
}

pub struct GenomicAnalyzer {
    rules: Arc<RuleSet>,
    predictor: Arc<dyn VariantEffectPredictor>,
    aggregator: GeneAggregator,
    evaluator: EligibilityEvaluator,
}

impl GenomicAnalyzer {
    /// Analyzer using the rule-based predictor over `rules`' known-variant table.
    pub fn new(rules: RuleSet) -> Self {
        let predictor = Arc::new(RuleBasedPredictor::new(rules.known_variants.clone()));
        Self::with_predictor(rules, predictor)
    }

    /// Analyzer with a substitute variant-effect predictor.
    pub fn with_predictor(rules: RuleSet, predictor: Arc<dyn VariantEffectPredictor>) -> Self {
        let aggregator = GeneAggregator::new(predictor.clone(), rules.roster.clone());
        let evaluator = EligibilityEvaluator::new(rules.policy.clone());
        Self { rules: Arc::new(rules), predictor, aggregator, evaluator }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    // ── Pipeline stages ───────────────────────────────────────────────────────

    pub fn extract(&self, criterion: &str) -> ExtractedQuery {
        extraction::extract(&self.rules.roster, criterion)
    }

    pub fn resolve_intent(&self, criterion: &str) -> Intent {
        self.rules.intents.resolve(criterion)
    }

    pub fn explain_intent(&self, criterion: &str) -> IntentMatch {
        self.rules.intents.explain(criterion)
    }

    /// Classify one record. Gene aliases are folded first.
    pub fn classify(&self, gene_symbol: &str, record: &MutationRecord) -> Classification {
        self.predictor.classify(&self.rules.roster.canonical_or_self(gene_symbol), record)
    }

    pub fn aggregate(&self, gene_symbol: &str, requested: &[String], records: &[MutationRecord]) -> GeneStatus {
        self.aggregator.aggregate(gene_symbol, requested, records)
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Analyse one criterion against one patient's mutation list.
    pub fn analyze(&self, criterion: &str, records: &[MutationRecord]) -> Result<AnalysisResult> {
        validate_records(records)?;

        let query = self.extract(criterion);
        let intent = self.explain_intent(criterion);
        debug!(
            "Criterion parsed: genes={:?}, variants={}, intent={}/{}",
            query.genes,
            query.specific_variants.len(),
            intent.intent.required_status,
            intent.intent.presence_required
        );

        let statuses: Vec<GeneStatus> = query
            .genes
            .iter()
            .map(|gene| self.aggregate(gene, &query.variants_for(gene), records))
            .collect();

        let result = self.evaluator.evaluate(criterion, &query, &intent, &statuses);
        info!(
            "Criterion analysed: {} ({} gene(s), {} record(s))",
            result.status,
            statuses.len(),
            records.len()
        );
        Ok(result)
    }

    /// Analyse with records given as a JSON array.
    pub fn analyze_json(&self, criterion: &str, records_json: &str) -> Result<AnalysisResult> {
        let records: Vec<MutationRecord> = serde_json::from_str(records_json).map_err(|e| {
            warn!("Rejected mutation records: {}", e);
            GenomicError::InvalidInput(format!("malformed mutation records: {e}"))
        })?;
        self.analyze(criterion, &records)
    }

    /// Analyse many independent jobs. Output order matches input order.
    /// Runs on the rayon pool above the configured threshold.
    pub fn analyze_batch(&self, jobs: &[AnalysisJob]) -> Vec<Result<AnalysisResult>> {
        #[cfg(feature = "parallel")]
        {
            let threshold = self.rules.policy.parallel_threshold;
            if threshold > 0 && jobs.len() > threshold {
                use rayon::prelude::*;
                return jobs.par_iter()
                    .map(|job| self.analyze(&job.criterion, &job.records))
                    .collect();
            }
        }
        jobs.iter()
            .map(|job| self.analyze(&job.criterion, &job.records))
            .collect()
    }
}

impl Default for GenomicAnalyzer {
    fn default() -> Self {
        Self::new(RuleSet::builtin())
    }
}

fn validate_records(records: &[MutationRecord]) -> Result<()> {
    if let Some(i) = records.iter().position(|r| r.gene_symbol.trim().is_empty()) {
        warn!("Rejected mutation records: record {} has no gene symbol", i);
        return Err(GenomicError::InvalidInput(format!("mutation record {i} has an empty gene symbol")));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
