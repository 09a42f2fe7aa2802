//! Lexical extraction of genes and variant notations from criterion text.
//!
//! Genes come from the roster automaton; variants from three notation
//! families (one-letter protein change, three-letter HGVS, exon-level
//! events). Every notation is stored in canonical form, see
//! [`crate::normalise::hgvs`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clauses::{clause_index, clause_spans};
use crate::normalise::hgvs::{aa3_to_aa1, exon_notation, is_aa1};
use crate::normalise::{GeneMention, GeneRoster};

/// A variant notation named in the criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificVariant {
    /// Canonical notation (e.g. "V600E", "EXON19DEL")
    pub notation: String,
    /// Gene mentioned next to it in the same clause
    pub gene: Option<String>,
}

/// Structured reading of the genes and variants in a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedQuery {
    /// Canonical symbols, first-appearance order
    pub genes: Vec<String>,
    pub specific_variants: Vec<SpecificVariant>,
}

impl ExtractedQuery {
    /// Notations that apply to `gene`. With a single-gene query, variants
    /// without a co-located gene are attributed to that gene.
    pub fn variants_for(&self, gene: &str) -> Vec<String> {
        let single_gene = self.genes.len() == 1 && self.genes[0].eq_ignore_ascii_case(gene);
        self.specific_variants
            .iter()
            .filter(|v| match &v.gene {
                Some(g) => g.eq_ignore_ascii_case(gene),
                None => single_gene,
            })
            .map(|v| v.notation.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty() && self.specific_variants.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn re_one_letter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // V600E, p.V600E, R213*
    RE.get_or_init(|| Regex::new(r"(\bp\.)?\b([A-Z])(\d{1,5})([A-Z*])").expect("valid regex"))
}

fn re_three_letter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // p.Arg248Gln, p.(Val600Glu), Arg213Ter
    RE.get_or_init(|| {
        Regex::new(r"(?:\bp\.\(?)?\b([A-Z][a-z]{2})(\d{1,5})([A-Z][a-z]{2}|\*)").expect("valid regex")
    })
}

fn re_exon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // exon 19 deletion, Exon20Ins, exon 19 del
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bexon\s*(\d{1,3})\s*(del(?:etion)?|ins(?:ertion)?)s?\b").expect("valid regex")
    })
}

/// True when the token ends at `end` (nothing alphanumeric follows).
fn token_ends(text: &str, end: usize) -> bool {
    !text[end..].chars().next().is_some_and(char::is_alphanumeric)
}

/// A variant hit before deduplication: (start, end, notation).
type Hit = (usize, usize, String);

fn one_letter_hits(text: &str) -> Vec<Hit> {
    let mut hits = Vec::new();
    for caps in re_one_letter().captures_iter(text) {
        let (Some(whole), Some(ref_aa), Some(position), Some(alt_aa)) =
            (caps.get(0), caps.get(2), caps.get(3), caps.get(4))
        else {
            continue;
        };
        // Bare single-digit positions read like schedules (Q3W, Q2D)
        let position = position.as_str();
        if caps.get(1).is_none() && position.len() < 2 {
            continue;
        }
        let ref_aa = ref_aa.as_str().chars().next().unwrap_or('?');
        let alt_aa = alt_aa.as_str().chars().next().unwrap_or('?');
        if !is_aa1(ref_aa) || !is_aa1(alt_aa) || !token_ends(text, whole.end()) {
            continue;
        }
        hits.push((whole.start(), whole.end(), format!("{ref_aa}{position}{alt_aa}")));

        // Slash alternatives: V600E/K → V600K
        let bytes = text.as_bytes();
        let mut cursor = whole.end();
        while cursor + 1 < bytes.len() && bytes[cursor] == b'/' {
            let alt = bytes[cursor + 1] as char;
            if !(alt.is_ascii_uppercase() || alt == '*') || !is_aa1(alt) || !token_ends(text, cursor + 2) {
                break;
            }
            hits.push((cursor, cursor + 2, format!("{ref_aa}{position}{alt}")));
            cursor += 2;
        }
    }
    hits
}

fn three_letter_hits(text: &str) -> Vec<Hit> {
    re_three_letter()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ref_aa = aa3_to_aa1(&caps[1])?;
            let alt_aa = aa3_to_aa1(&caps[3])?;
            if !token_ends(text, whole.end()) && !text[whole.end()..].starts_with(')') {
                return None;
            }
            Some((whole.start(), whole.end(), format!("{}{}{}", ref_aa, &caps[2], alt_aa)))
        })
        .collect()
}

fn exon_hits(text: &str) -> Vec<Hit> {
    re_exon()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let exon: u32 = caps[1].parse().ok()?;
            Some((whole.start(), whole.end(), exon_notation(exon, &caps[2])))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract genes and specific variants from criterion text.
///
/// Pure and total: text without matches yields an empty query.
pub fn extract(roster: &GeneRoster, text: &str) -> ExtractedQuery {
    let mentions = roster.find_mentions(text);

    let mut genes: Vec<String> = Vec::new();
    for m in &mentions {
        if !genes.contains(&m.symbol) {
            genes.push(m.symbol.clone());
        }
    }

    let mut hits = one_letter_hits(text);
    hits.extend(three_letter_hits(text));
    hits.extend(exon_hits(text));
    hits.sort_by_key(|(start, end, _)| (*start, *end));

    let spans = clause_spans(text);
    let mut specific_variants: Vec<SpecificVariant> = Vec::new();
    for (start, end, notation) in hits {
        if specific_variants.iter().any(|v| v.notation == notation) {
            continue;
        }
        let gene = nearest_gene(&mentions, &spans, start, end);
        specific_variants.push(SpecificVariant { notation, gene });
    }

    ExtractedQuery { genes, specific_variants }
}

/// The gene mention closest to `start..end` within the same clause.
/// Ties go to the mention that precedes the variant.
fn nearest_gene(
    mentions: &[GeneMention],
    spans: &[std::ops::Range<usize>],
    start: usize,
    end: usize,
) -> Option<String> {
    let clause = clause_index(spans, start)?;
    mentions
        .iter()
        .filter(|m| clause_index(spans, m.start) == Some(clause))
        .filter_map(|m| {
            if m.end <= start {
                Some((start - m.end, 0u8, m))
            } else if m.start >= end {
                Some((m.start - end, 1u8, m))
            } else {
                None
            }
        })
        .min_by_key(|(distance, following, _)| (*distance, *following))
        .map(|(_, _, m)| m.symbol.clone())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
