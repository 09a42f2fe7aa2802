//! Gene roster: symbol normalisation and dictionary matching.
//!
//! Built once from the rule-set gene list. Provides two things:
//! - alias-aware lookup (`"HER2"` → `"ERBB2"`), case-insensitive
//! - mention finding in free text, using an Aho-Corasick automaton with
//!   word-boundary filtering so `RAS` never fires inside `KRAS`
//!
//! Usage:
//! ```ignore
//! let roster = GeneRoster::from_specs(&RuleSetConfig::default().genes)?;
//! assert_eq!(roster.canonical("her2"), Some("ERBB2"));
//! ```

use std::collections::HashMap;

use aho_corasick::{AhoCorasick, MatchKind};
use oncomatch_common::{GenomicError, Result};

use crate::config::GeneSpec;

/// A gene symbol found in text, with byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneMention {
    /// Canonical symbol
    pub symbol: String,
    /// Text as written
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
struct RosterTerm {
    canonical: String,
    /// Upper-case spelling, compared verbatim when `case_sensitive`
    term: String,
    case_sensitive: bool,
}

/// In-memory gene roster.
/// Build once per rule set; immutable afterwards.
pub struct GeneRoster {
    automaton: AhoCorasick,
    /// Pattern index → term info
    terms: Vec<RosterTerm>,
    /// Upper-case symbol or alias → canonical symbol
    lookup: HashMap<String, String>,
    /// Canonical symbols in roster order
    symbols: Vec<String>,
}

impl GeneRoster {
    // ── Constructors ──────────────────────────────────────────────────────────

    pub fn from_specs(specs: &[GeneSpec]) -> Result<Self> {
        let mut terms: Vec<RosterTerm> = Vec::new();
        let mut lookup: HashMap<String, String> = HashMap::new();
        let mut symbols: Vec<String> = Vec::new();

        for spec in specs {
            let canonical = spec.symbol.trim().to_uppercase();
            if canonical.is_empty() {
                return Err(GenomicError::Config("gene roster entry with empty symbol".into()));
            }
            if !symbols.contains(&canonical) {
                symbols.push(canonical.clone());
            }

            let spellings = std::iter::once(spec.symbol.as_str()).chain(spec.aliases.iter().map(String::as_str));
            for raw in spellings {
                let term = raw.trim().to_uppercase();
                if term.is_empty() {
                    return Err(GenomicError::Config(format!("empty alias for gene {canonical}")));
                }
                if !term.is_ascii() {
                    return Err(GenomicError::Config(format!("non-ASCII gene term {raw:?}")));
                }
                // First entry wins on alias collisions
                lookup.entry(term.clone()).or_insert_with(|| canonical.clone());
                terms.push(RosterTerm {
                    canonical: canonical.clone(),
                    term,
                    case_sensitive: spec.case_sensitive,
                });
            }
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(terms.iter().map(|t| t.term.as_str()))
            .map_err(|e| GenomicError::Config(format!("gene roster automaton: {e}")))?;

        tracing::debug!("Gene roster built: {} genes, {} terms", symbols.len(), terms.len());
        Ok(Self { automaton, terms, lookup, symbols })
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// Canonical symbol for a symbol or alias. Case-insensitive.
    pub fn canonical(&self, symbol: &str) -> Option<&str> {
        self.lookup.get(&symbol.trim().to_uppercase()).map(String::as_str)
    }

    /// Canonical symbol, or the upper-cased input for genes outside the roster.
    pub fn canonical_or_self(&self, symbol: &str) -> String {
        self.canonical(symbol)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.trim().to_uppercase())
    }

    /// Do two symbols name the same gene?
    pub fn same_gene(&self, a: &str, b: &str) -> bool {
        self.canonical_or_self(a) == self.canonical_or_self(b)
    }

    pub fn n_genes(&self) -> usize { self.symbols.len() }

    pub fn n_terms(&self) -> usize { self.terms.len() }

    // ── Matching ──────────────────────────────────────────────────────────────

    /// Every roster mention in `text`, in order, overlaps resolved to the
    /// longest match.
    pub fn find_mentions(&self, text: &str) -> Vec<GeneMention> {
        let mut mentions = Vec::new();

        for mat in self.automaton.find_overlapping_iter(text) {
            let (start, end) = (mat.start(), mat.end());
            if !is_word_boundary(text, start, end) {
                continue;
            }
            let info = &self.terms[mat.pattern().as_usize()];
            let surface = &text[start..end];
            if info.case_sensitive && surface != info.term {
                continue;
            }
            mentions.push(GeneMention {
                symbol: info.canonical.clone(),
                text: surface.to_string(),
                start,
                end,
            });
        }

        remove_overlapping(mentions)
    }
}

/// Letters and digits continue a token; everything else (space, `-`, `/`,
/// punctuation) ends it.
fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

fn remove_overlapping(mut mentions: Vec<GeneMention>) -> Vec<GeneMention> {
    // Sort by start position, then by length (longest first)
    mentions.sort_by(|a, b| {
        a.start.cmp(&b.start)
            .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
    });

    let mut result = Vec::new();
    let mut last_end = 0;

    for mention in mentions {
        if mention.start >= last_end {
            last_end = mention.end;
            result.push(mention);
        }
    }

    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
