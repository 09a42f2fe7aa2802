//! Shared test fixtures: logging init, mutation-record builders and canned
//! patient panels.

use oncomatch_common::MutationRecord;

pub use pretty_assertions::{assert_eq, assert_ne};

/// Install a test-friendly tracing subscriber. Safe to call from every test;
/// only the first call wins. Honours `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

// ── Record builders ───────────────────────────────────────────────────────────

pub fn missense(gene: &str, change: &str) -> MutationRecord {
    MutationRecord::new(gene, "Missense_Mutation", Some(change))
}

pub fn nonsense(gene: &str, change: &str) -> MutationRecord {
    MutationRecord::new(gene, "Nonsense_Mutation", Some(change))
}

pub fn frameshift_del(gene: &str, change: &str) -> MutationRecord {
    MutationRecord::new(gene, "Frame_Shift_Del", Some(change))
}

pub fn in_frame_del(gene: &str, change: &str) -> MutationRecord {
    MutationRecord::new(gene, "In_Frame_Del", Some(change))
}

pub fn splice_site(gene: &str) -> MutationRecord {
    MutationRecord::new(gene, "Splice_Site", None)
}

pub fn silent(gene: &str, change: &str) -> MutationRecord {
    MutationRecord::new(gene, "Silent", Some(change))
}

/// Serialize records the way the upstream store hands them over.
pub fn records_json(records: &[MutationRecord]) -> String {
    serde_json::to_string(records).unwrap_or_else(|e| panic!("fixture records must serialize: {e}"))
}

// ── Patient panels ────────────────────────────────────────────────────────────

/// Melanoma: BRAF V600E plus a TP53 polymorphism.
pub fn melanoma_braf_v600e() -> Vec<MutationRecord> {
    vec![missense("BRAF", "p.V600E"), missense("TP53", "p.P72R")]
}

/// NSCLC on first-line TKI: EGFR L858R, no resistance mutation.
pub fn nsclc_egfr_l858r() -> Vec<MutationRecord> {
    vec![missense("EGFR", "p.L858R"), missense("TP53", "p.R248Q")]
}

/// NSCLC progressed on TKI: EGFR L858R plus T790M.
pub fn nsclc_egfr_t790m() -> Vec<MutationRecord> {
    vec![missense("EGFR", "p.L858R"), missense("EGFR", "p.T790M")]
}

/// Colorectal: KRAS G12D, APC truncation, TP53 nonsense.
pub fn colorectal_kras_g12d() -> Vec<MutationRecord> {
    vec![
        missense("KRAS", "p.G12D"),
        nonsense("APC", "p.R1450*"),
        nonsense("TP53", "p.R196*"),
    ]
}

/// Breast: PIK3CA hotspot, no TP53 or BRCA records.
pub fn breast_pik3ca() -> Vec<MutationRecord> {
    vec![missense("PIK3CA", "p.E545K"), missense("GATA3", "p.S408fs")]
}
