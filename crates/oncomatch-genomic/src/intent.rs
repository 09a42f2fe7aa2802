//! Intent resolution: criterion phrasing → required status and polarity.
//!
//! Rules are an explicit ordered list; the first rule whose pattern matches
//! decides `required_status`. Negation markers in the same clause, within a
//! bounded number of words of the matched phrase, flip `presence_required`
//! for negatable rules only.

use regex::Regex;
use serde::{Deserialize, Serialize};

use oncomatch_common::{GenomicError, GenomicStatus, Intent, Result};

use crate::clauses::{clause_index, clause_spans, word_count};
use crate::config::{IntentRuleSpec, NegationConfig};

/// One compiled row of the intent table.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub name: String,
    pub pattern: Regex,
    pub status: GenomicStatus,
    pub negatable: bool,
}

#[derive(Debug, Clone)]
struct Marker {
    text: String,
    pattern: Regex,
}

/// Intent plus the rule and negation marker that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub intent: Intent,
    /// Name of the winning rule, `None` for the bare-mention default
    pub rule: Option<String>,
    /// Negation marker that flipped polarity
    pub negation: Option<String>,
}

impl IntentMatch {
    fn default_intent() -> Self {
        Self { intent: Intent::default(), rule: None, negation: None }
    }
}

pub struct IntentResolver {
    rules: Vec<IntentRule>,
    pre_markers: Vec<Marker>,
    post_markers: Vec<Marker>,
    window_tokens: usize,
}

fn compile(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| GenomicError::Config(format!("invalid {what} pattern {pattern:?}: {e}")))
}

fn compile_marker(text: &str) -> Result<Marker> {
    let words: Vec<String> = text.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Err(GenomicError::Config("empty negation marker".into()));
    }
    let pattern = compile(&format!(r"(?i)\b{}\b", words.join(r"\s+")), "negation marker")?;
    Ok(Marker { text: text.trim().to_string(), pattern })
}

impl IntentResolver {
    pub fn from_config(rules: &[IntentRuleSpec], negation: &NegationConfig) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|spec| {
                Ok(IntentRule {
                    name: spec.name.clone(),
                    pattern: compile(&spec.pattern, &format!("intent rule '{}'", spec.name))?,
                    status: spec.status,
                    negatable: spec.negatable,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let pre_markers = negation.pre_markers.iter().map(|m| compile_marker(m)).collect::<Result<Vec<_>>>()?;
        let post_markers = negation.post_markers.iter().map(|m| compile_marker(m)).collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, pre_markers, post_markers, window_tokens: negation.window_tokens })
    }

    pub fn rules(&self) -> &[IntentRule] { &self.rules }

    /// Resolve the criterion intent.
    pub fn resolve(&self, text: &str) -> Intent {
        self.explain(text).intent
    }

    /// Resolve, keeping track of which rule and negation marker fired.
    pub fn explain(&self, text: &str) -> IntentMatch {
        for rule in &self.rules {
            let Some(phrase) = rule.pattern.find(text) else {
                continue;
            };
            let negation = if rule.negatable {
                self.find_negation(text, phrase.start(), phrase.end())
            } else {
                None
            };
            return IntentMatch {
                intent: Intent::new(rule.status, negation.is_none()),
                rule: Some(rule.name.clone()),
                negation,
            };
        }
        IntentMatch::default_intent()
    }

    /// Negation marker scoping over `text[start..end]`, if any.
    fn find_negation(&self, text: &str, start: usize, end: usize) -> Option<String> {
        let spans = clause_spans(text);
        let clause = clause_index(&spans, start)?;
        let span = spans[clause].clone();

        // Closest pre-marker before the phrase
        let before = &text[span.start..start];
        let pre = self.pre_markers.iter()
            .filter_map(|m| m.pattern.find_iter(before).last().map(|hit| (hit.end(), m)))
            .filter(|(hit_end, _)| word_count(&before[*hit_end..]) <= self.window_tokens)
            .max_by_key(|(hit_end, _)| *hit_end);
        if let Some((_, marker)) = pre {
            return Some(marker.text.clone());
        }

        // Closest post-marker after the phrase
        let after = &text[end..span.end.max(end)];
        self.post_markers.iter()
            .filter_map(|m| m.pattern.find(after).map(|hit| (hit.start(), m)))
            .filter(|(hit_start, _)| word_count(&after[..*hit_start]) <= self.window_tokens)
            .min_by_key(|(hit_start, _)| *hit_start)
            .map(|(_, marker)| marker.text.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetConfig;
    use pretty_assertions::assert_eq;

    fn resolver() -> IntentResolver {
        let config = RuleSetConfig::default();
        IntentResolver::from_config(&config.intent_rules, &config.negation).unwrap()
    }

    fn resolve(text: &str) -> (GenomicStatus, bool) {
        let intent = resolver().resolve(text);
        (intent.required_status, intent.presence_required)
    }

    #[test]
    fn test_negation_symmetry() {
        assert_eq!(resolve("presence of activating BRAF mutation"), (GenomicStatus::Activating, true));
        assert_eq!(resolve("absence of activating BRAF mutation"), (GenomicStatus::Activating, false));
    }

    #[test]
    fn test_specific_phrase_beats_generic() {
        assert_eq!(resolve("Pathogenic KRAS mutation"), (GenomicStatus::PathogenicLof, true));
        assert_eq!(resolve("EGFR T790M resistance mutation"), (GenomicStatus::Resistance, true));
        assert_eq!(resolve("Any mutation in BRCA1"), (GenomicStatus::AnyMutation, true));
    }

    #[test]
    fn test_pre_marker_negates() {
        assert_eq!(resolve("No pathogenic TP53 mutation"), (GenomicStatus::PathogenicLof, false));
        assert_eq!(resolve("Patients without KRAS mutations"), (GenomicStatus::AnyMutation, false));
        assert_eq!(resolve("Negative for EGFR sensitizing mutation"), (GenomicStatus::Activating, false));
    }

    #[test]
    fn test_post_marker_negates() {
        assert_eq!(resolve("EGFR mutation not detected"), (GenomicStatus::AnyMutation, false));
        assert_eq!(resolve("KRAS mutations absent"), (GenomicStatus::AnyMutation, false));
    }

    #[test]
    fn test_trailing_biomarker_adjective_does_not_negate() {
        assert_eq!(
            resolve("BRAF V600E mutation in PD-L1 negative melanoma"),
            (GenomicStatus::AnyMutation, true)
        );
        assert_eq!(resolve("Activating EGFR mutation, HER2-negative"), (GenomicStatus::Activating, true));
        assert_eq!(resolver().explain("BRAF V600E mutation in PD-L1 negative melanoma").negation, None);
    }

    #[test]
    fn test_post_marker_outside_window_ignored() {
        let text = "KRAS mutation found in samples that were sequenced at the central lab and confirmed absent";
        assert_eq!(resolve(text), (GenomicStatus::AnyMutation, true));
        let text = "KRAS mutation in sequenced samples confirmed absent";
        assert_eq!(resolve(text), (GenomicStatus::AnyMutation, false));
    }

    #[test]
    fn test_negation_in_other_clause_ignored() {
        assert_eq!(resolve("No prior chemotherapy; activating EGFR mutation"), (GenomicStatus::Activating, true));
        assert_eq!(resolve("BRAF mutation, but no brain metastases"), (GenomicStatus::AnyMutation, true));
    }

    #[test]
    fn test_negation_outside_window_ignored() {
        let text = "no history of any kind of earlier serious illness and then later KRAS mutation";
        assert_eq!(resolve(text), (GenomicStatus::AnyMutation, true));
    }

    #[test]
    fn test_wild_type_ignores_negation() {
        assert_eq!(resolve("EGFR wild-type"), (GenomicStatus::WildType, true));
        assert_eq!(resolve("No EGFR sensitizing mutation (EGFR WT)"), (GenomicStatus::WildType, true));
        assert_eq!(resolve("KRAS wildtype tumour"), (GenomicStatus::WildType, true));
    }

    #[test]
    fn test_negated_wild_type_means_mutated() {
        assert_eq!(resolve("Tumour must not be EGFR wild-type"), (GenomicStatus::AnyMutation, true));
        assert_eq!(resolve("non-wild-type KRAS"), (GenomicStatus::AnyMutation, true));
    }

    #[test]
    fn test_default_intent() {
        assert_eq!(resolve("BRAF"), (GenomicStatus::AnyMutation, true));
        assert_eq!(resolve(""), (GenomicStatus::AnyMutation, true));
        assert_eq!(resolver().explain("BRAF").rule, None);
    }

    #[test]
    fn test_explain_reports_rule_and_marker() {
        let m = resolver().explain("absence of activating BRAF mutation");
        assert_eq!(m.rule.as_deref(), Some("activating"));
        assert_eq!(m.negation.as_deref(), Some("absence of"));
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let mut config = RuleSetConfig::default();
        config.intent_rules[0].pattern = "(unclosed".into();
        let err = IntentResolver::from_config(&config.intent_rules, &config.negation).err().unwrap();
        assert!(matches!(err, GenomicError::Config(_)));
    }
}
