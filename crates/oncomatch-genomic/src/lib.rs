//! oncomatch-genomic: Genomic criterion analyzer.
//! Decides whether a patient's mutations satisfy a free-text genomic
//! eligibility criterion:
//! - Lexical extraction of genes and variant notations
//! - Intent resolution with clause-scoped negation
//! - Rule-based variant classification
//! - Per-gene aggregation with wild-type inference
//! - MET / NOT_MET / UNCLEAR evaluation with evidence

pub mod aggregate;
pub mod analyzer;
pub mod classifier;
pub mod clauses;
pub mod config;
pub mod evaluate;
pub mod extraction;
pub mod intent;
pub mod known_variants;
pub mod normalise;
pub mod rules;

pub use aggregate::{GeneAggregator, GeneObservation, GeneStatus, GeneSummary, VariantFinding};
pub use analyzer::{AnalysisJob, GenomicAnalyzer};
pub use classifier::{RuleBasedPredictor, VariantEffectPredictor};
pub use config::{MissingGeneData, RuleSetConfig};
pub use evaluate::{AnalysisResult, CriterionStatus, EligibilityEvaluator, Qualification, VariantDetail};
pub use extraction::{extract, ExtractedQuery, SpecificVariant};
pub use intent::{IntentMatch, IntentResolver};
pub use known_variants::{KnownVariant, KnownVariantTable};
pub use rules::RuleSet;
