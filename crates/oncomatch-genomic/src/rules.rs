//! Compiled rule set: roster, known-variant table, intent table, policy.
//!
//! Immutable after construction and shared across threads.

use std::sync::Arc;

use tracing::info;

use oncomatch_common::Result;

use crate::config::{PolicyConfig, RuleSetConfig};
use crate::intent::IntentResolver;
use crate::known_variants::KnownVariantTable;
use crate::normalise::GeneRoster;

pub struct RuleSet {
    pub roster: Arc<GeneRoster>,
    pub known_variants: Arc<KnownVariantTable>,
    pub intents: IntentResolver,
    pub policy: PolicyConfig,
}

impl RuleSet {
    /// Compile and validate a configuration.
    pub fn from_config(config: &RuleSetConfig) -> Result<Self> {
        let roster = Arc::new(GeneRoster::from_specs(&config.genes)?);
        let known_variants = Arc::new(KnownVariantTable::from_specs(&config.known_variants, &roster)?);
        let intents = IntentResolver::from_config(&config.intent_rules, &config.negation)?;

        info!(
            "Rule set ready: {} genes ({} terms), {} known variants, {} intent rules",
            roster.n_genes(),
            roster.n_terms(),
            known_variants.len(),
            intents.rules().len()
        );

        Ok(Self { roster, known_variants, intents, policy: config.policy.clone() })
    }

    /// The built-in rule set.
    pub fn builtin() -> Self {
        Self::from_config(&RuleSetConfig::default()).expect("built-in rule set must compile")
    }

    /// Rule set named by `ONCOMATCH_RULES`, else the built-in one.
    pub fn load() -> anyhow::Result<Self> {
        let config = RuleSetConfig::load()?;
        Ok(Self::from_config(&config)?)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oncomatch_common::GenomicError;

    #[test]
    fn test_builtin_compiles() {
        let rules = RuleSet::builtin();
        assert!(rules.roster.n_genes() >= 40);
        assert!(!rules.known_variants.is_empty());
        assert_eq!(rules.intents.rules().len(), RuleSetConfig::default().intent_rules.len());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RuleSetConfig::default();
        config.negation.pre_markers.push("   ".into());
        assert!(matches!(RuleSet::from_config(&config), Err(GenomicError::Config(_))));
    }
}
