//! Protein-change notation normalisation.
//!
//! Criteria, patient records and the known-variant table spell the same
//! change in different ways ("V600E", "p.V600E", "p.Val600Glu",
//! "p.(Val600Glu)"). Everything is folded onto the short one-letter form so
//! two notations compare with `==`. Exon-level events become `EXON19DEL` /
//! `EXON20INS`.
//!
//! # Example
//! ```ignore
//! assert_eq!(canonical_protein_change("p.Val600Glu").as_deref(), Some("V600E"));
//! assert_eq!(canonical_protein_change("exon 19 deletion").as_deref(), Some("EXON19DEL"));
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// Three-letter → single-letter amino acid map.
pub fn aa3_to_aa1(aa: &str) -> Option<char> {
    match aa.to_lowercase().as_str() {
        "ala" => Some('A'), "cys" => Some('C'), "asp" => Some('D'),
        "glu" => Some('E'), "phe" => Some('F'), "gly" => Some('G'),
        "his" => Some('H'), "ile" => Some('I'), "lys" => Some('K'),
        "leu" => Some('L'), "met" => Some('M'), "asn" => Some('N'),
        "pro" => Some('P'), "gln" => Some('Q'), "arg" => Some('R'),
        "ser" => Some('S'), "thr" => Some('T'), "val" => Some('V'),
        "trp" => Some('W'), "tyr" => Some('Y'),
        "ter" | "stop" | "*" => Some('*'),
        _ => None,
    }
}

/// One of the twenty standard one-letter codes, or `*` for stop.
pub fn is_aa1(c: char) -> bool {
    matches!(
        c,
        'A' | 'C' | 'D' | 'E' | 'F' | 'G' | 'H' | 'I' | 'K' | 'L'
            | 'M' | 'N' | 'P' | 'Q' | 'R' | 'S' | 'T' | 'V' | 'W' | 'Y' | '*'
    )
}

/// Build the canonical exon-level notation, e.g. `EXON19DEL`.
pub fn exon_notation(exon: u32, kind: &str) -> String {
    let kind = if kind.to_ascii_lowercase().starts_with("ins") { "INS" } else { "DEL" };
    format!("EXON{exon}{kind}")
}

fn re_three_letter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Val600Glu, Arg213Ter, Arg213*
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]{3})(\d+)([A-Za-z]{3}|\*)$").expect("valid regex"))
}

fn re_exon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // exon 19 deletion, Exon20Ins, exon19del
    RE.get_or_init(|| {
        Regex::new(r"(?i)^exon\s*(\d{1,3})\s*(del(?:etion)?|ins(?:ertion)?)s?$").expect("valid regex")
    })
}

/// Canonicalise a protein-change notation.
///
/// Strips an optional `p.` prefix and HGVS parentheses, converts three-letter
/// amino acids to one-letter codes and upper-cases the rest. Returns `None`
/// for blank input. Notations that are not recognised are still returned
/// upper-cased so they can be compared exactly.
pub fn canonical_protein_change(raw: &str) -> Option<String> {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("p.").or_else(|| s.strip_prefix("P.")) {
        s = rest;
    }
    let s = s.trim_start_matches('(').trim_end_matches(')').trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = re_exon().captures(s) {
        if let Ok(exon) = caps[1].parse::<u32>() {
            return Some(exon_notation(exon, &caps[2]));
        }
    }

    if let Some(caps) = re_three_letter().captures(s) {
        if let (Some(ref_aa), Some(alt_aa)) = (aa3_to_aa1(&caps[1]), aa3_to_aa1(&caps[3])) {
            return Some(format!("{}{}{}", ref_aa, &caps[2], alt_aa));
        }
    }

    Some(s.to_ascii_uppercase())
}

fn re_substitution() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z])\d+([A-Z*])$").expect("valid regex"))
}

/// Sequence Ontology term implied by a canonical notation, if any.
pub fn change_consequence(canonical: &str) -> Option<&'static str> {
    if canonical.starts_with("EXON") {
        return Some(if canonical.ends_with("INS") { "inframe_insertion" } else { "inframe_deletion" });
    }
    if canonical.contains("FS") {
        return Some("frameshift_variant");
    }
    let caps = re_substitution().captures(canonical)?;
    Some(match (&caps[1], &caps[2]) {
        (_, "*") => "stop_gained",
        (r, a) if r == a => "synonymous_variant",
        _ => "missense_variant",
    })
}

/// `GENE:p.V600E` for protein changes, `GENE:EXON19DEL` for exon events.
pub fn canonical_variant_id(gene: &str, canonical: &str) -> String {
    if canonical.starts_with("EXON") {
        format!("{gene}:{canonical}")
    } else {
        format!("{gene}:p.{canonical}")
    }
}

/// Do two notations describe the same protein change?
pub fn same_protein_change(a: &str, b: &str) -> bool {
    match (canonical_protein_change(a), canonical_protein_change(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
