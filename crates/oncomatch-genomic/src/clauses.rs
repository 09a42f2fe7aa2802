//! Clause segmentation for criterion text.
//!
//! Variant association and negation scope both stop at clause boundaries:
//! `; , : ! ?`, newlines, a period followed by whitespace (so `p.V600E` and
//! `1.5` stay whole), and the contrastive words `but`, `whereas`, `however`.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

fn re_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)[;,:!?\n]|\.(?:\s|$)|\b(?:but|whereas|however)\b").expect("valid regex")
    })
}

/// Byte ranges of each clause, in order. Boundaries themselves are excluded;
/// empty clauses are kept so indices stay stable.
pub fn clause_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for m in re_boundary().find_iter(text) {
        spans.push(start..m.start());
        start = m.end();
    }
    spans.push(start..text.len());
    spans
}

/// Index of the clause containing byte offset `pos`.
pub fn clause_index(spans: &[Range<usize>], pos: usize) -> Option<usize> {
    spans.iter().position(|s| s.start <= pos && pos < s.end.max(s.start + 1))
}

/// Number of word tokens in `text`.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .count()
}
