//! Rule-set configuration.
//!
//! Every table the analyzer consults (gene roster, known-variant
//! classifications, intent phrases, negation markers) lives here as plain
//! serde data so an alternate rule set can be dropped in from YAML, JSON or
//! TOML without touching the parsing or aggregation code. The defaults are
//! the built-in rule set.

use std::path::Path;

use oncomatch_common::{ClassificationLabel, GenomicStatus};
use serde::{Deserialize, Serialize};

/// Environment variable pointing at an alternate rule-set file.
pub const RULES_ENV_VAR: &str = "ONCOMATCH_RULES";

/// Complete rule-set configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetConfig {
    /// Gene symbols recognised in criterion text
    #[serde(default = "default_genes")]
    pub genes: Vec<GeneSpec>,

    /// Curated (gene, protein change) → label table
    #[serde(default = "default_known_variants")]
    pub known_variants: Vec<KnownVariantSpec>,

    /// Intent phrases, in precedence order
    #[serde(default = "default_intent_rules")]
    pub intent_rules: Vec<IntentRuleSpec>,

    #[serde(default)]
    pub negation: NegationConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Default for RuleSetConfig {
    fn default() -> Self {
        Self {
            genes: default_genes(),
            known_variants: default_known_variants(),
            intent_rules: default_intent_rules(),
            negation: NegationConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

// ── Gene roster ───────────────────────────────────────────────────────────────

/// One roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneSpec {
    /// Canonical symbol (e.g., "ERBB2")
    pub symbol: String,

    /// Other spellings that resolve to `symbol` (e.g., "HER2")
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Match only the exact upper-case spelling. For short symbols that
    /// collide with English words ("MET", "KIT", "ER").
    #[serde(default)]
    pub case_sensitive: bool,
}

impl GeneSpec {
    fn new(symbol: &str) -> Self {
        Self { symbol: symbol.to_string(), aliases: vec![], case_sensitive: false }
    }

    fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    fn exact_case(mut self) -> Self {
        self.case_sensitive = true;
        self
    }
}

fn default_genes() -> Vec<GeneSpec> {
    let plain = [
        "AKT1", "AKT2", "AKT3", "ALK", "APC", "ARID1A", "ATM", "BRAF", "BRCA1", "BRCA2",
        "CDKN2A", "CTNNB1", "EGFR", "FGFR1", "FGFR2", "FGFR3", "HRAS", "IDH1", "IDH2",
        "KEAP1", "KRAS", "NF1", "NRAS", "NTRK1", "NTRK2", "NTRK3", "PDGFRA", "PIK3CA",
        "PTEN", "RB1", "ROS1", "SMAD4", "STK11",
    ];
    let mut genes: Vec<GeneSpec> = plain.iter().map(|s| GeneSpec::new(s)).collect();
    genes.push(GeneSpec::new("ERBB2").with_aliases(&["HER2", "HER-2"]));
    genes.push(GeneSpec::new("TP53").with_aliases(&["P53"]));
    genes.push(GeneSpec::new("ESR1").with_aliases(&["ER"]).exact_case());
    genes.push(GeneSpec::new("AR").exact_case());
    genes.push(GeneSpec::new("KIT").exact_case());
    genes.push(GeneSpec::new("MET").exact_case());
    genes.push(GeneSpec::new("RET").exact_case());
    genes
}

// ── Known variants ────────────────────────────────────────────────────────────

/// Curated classification for one (gene, protein change) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownVariantSpec {
    pub gene: String,
    /// Any notation accepted by `canonical_protein_change`
    pub protein_change: String,
    pub label: ClassificationLabel,
    /// Curated rationale, reported with the classification
    #[serde(default)]
    pub note: Option<String>,
    /// Sequence Ontology term; derived from the protein change when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sift: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyphen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinvar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oncokb: Option<String>,
}

impl KnownVariantSpec {
    pub fn new(gene: &str, protein_change: &str, label: ClassificationLabel) -> Self {
        Self {
            gene: gene.to_string(),
            protein_change: protein_change.to_string(),
            label,
            note: None,
            consequence: None,
            sift: None,
            polyphen: None,
            clinvar: None,
            oncokb: None,
        }
    }

    /// Attach tool calls and knowledge-base levels.
    fn scored(mut self, sift: &str, polyphen: &str, clinvar: &str, oncokb: &str) -> Self {
        self.sift = Some(sift.to_string());
        self.polyphen = Some(polyphen.to_string());
        self.clinvar = Some(clinvar.to_string());
        self.oncokb = Some(oncokb.to_string());
        self
    }
}

fn known(gene: &str, change: &str, label: ClassificationLabel, note: &str) -> KnownVariantSpec {
    KnownVariantSpec { note: Some(note.to_string()), ..KnownVariantSpec::new(gene, change, label) }
}

fn default_known_variants() -> Vec<KnownVariantSpec> {
    use ClassificationLabel::*;
    vec![
        // BRAF
        known("BRAF", "V600E", PredictedActivating, "BRAF V600E, targeted by BRAF/MEK inhibitors")
            .scored("deleterious", "probably_damaging", "Pathogenic", "Level 1"),
        known("BRAF", "V600K", PredictedActivating, "BRAF V600K activating")
            .scored("deleterious", "probably_damaging", "Pathogenic", "Level 1"),
        // EGFR
        known("EGFR", "L858R", PredictedActivating, "EGFR L858R sensitizing")
            .scored("deleterious", "probably_damaging", "Pathogenic", "Level 1"),
        known("EGFR", "EXON19DEL", PredictedActivating, "EGFR exon 19 deletion sensitizing"),
        known("EGFR", "EXON20INS", PredictedActivating, "EGFR exon 20 insertion"),
        known("EGFR", "G719S", PredictedActivating, "EGFR G719S uncommon sensitizing"),
        known("EGFR", "L861Q", PredictedActivating, "EGFR L861Q uncommon sensitizing"),
        known("EGFR", "T790M", PredictedResistance, "EGFR T790M, first/second-generation TKI resistance")
            .scored("deleterious", "possibly_damaging", "Pathogenic", "Level R1"),
        known("EGFR", "C797S", PredictedResistance, "EGFR C797S, osimertinib resistance"),
        // RAS
        known("KRAS", "G12C", PredictedActivating, "KRAS G12C oncogenic")
            .scored("deleterious", "probably_damaging", "Pathogenic", "Level 1"),
        known("KRAS", "G12D", PredictedActivating, "KRAS G12D oncogenic")
            .scored("deleterious", "probably_damaging", "Pathogenic", "Oncogenic"),
        known("KRAS", "G12V", PredictedActivating, "KRAS G12V oncogenic"),
        known("KRAS", "G13D", PredictedActivating, "KRAS G13D oncogenic"),
        known("KRAS", "Q61H", PredictedActivating, "KRAS Q61H oncogenic"),
        known("NRAS", "Q61K", PredictedActivating, "NRAS Q61K oncogenic"),
        known("NRAS", "Q61R", PredictedActivating, "NRAS Q61R oncogenic"),
        // PI3K / AKT
        known("PIK3CA", "E545K", PredictedActivating, "PIK3CA helical-domain hotspot"),
        known("PIK3CA", "E542K", PredictedActivating, "PIK3CA helical-domain hotspot"),
        known("PIK3CA", "H1047R", PredictedActivating, "PIK3CA kinase-domain hotspot"),
        known("AKT1", "E17K", PredictedActivating, "AKT1 E17K PH-domain hotspot"),
        known("IDH1", "R132H", PredictedActivating, "IDH1 R132H neomorphic"),
        // Resistance
        known("ALK", "G1202R", PredictedResistance, "ALK G1202R solvent-front resistance"),
        known("ALK", "L1196M", PredictedResistance, "ALK L1196M gatekeeper resistance"),
        known("ESR1", "Y537S", PredictedResistance, "ESR1 Y537S endocrine resistance"),
        known("ESR1", "D538G", PredictedResistance, "ESR1 D538G endocrine resistance"),
        known("KIT", "D816V", PredictedResistance, "KIT D816V imatinib resistance"),
        // Tumour suppressors
        known("TP53", "R175H", PredictedPathogenicLof, "TP53 R175H DNA-binding hotspot"),
        known("TP53", "R248Q", PredictedPathogenicLof, "TP53 R248Q DNA-binding hotspot")
            .scored("deleterious", "probably_damaging", "Pathogenic", "Likely Oncogenic"),
        known("TP53", "R273H", PredictedPathogenicLof, "TP53 R273H DNA-binding hotspot"),
        known("TP53", "P72R", PredictedBenignUnclear, "TP53 P72R common polymorphism")
            .scored("tolerated", "benign", "Benign/Likely_Benign", "N/A"),
        known("PTEN", "R130G", PredictedPathogenicLof, "PTEN R130G phosphatase-dead"),
        known("BRCA1", "C61G", PredictedPathogenicLof, "BRCA1 C61G RING-domain founder variant"),
    ]
}

// ── Intent phrases ────────────────────────────────────────────────────────────

/// One row of the ordered intent table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRuleSpec {
    /// Short name, shown in evidence
    pub name: String,
    /// Regex matched against the criterion text
    pub pattern: String,
    pub status: GenomicStatus,
    /// When false the rule fixes `presence_required = true` and negation
    /// markers are ignored
    #[serde(default = "default_true")]
    pub negatable: bool,
}

fn default_true() -> bool { true }

fn intent_rule(name: &str, pattern: &str, status: GenomicStatus, negatable: bool) -> IntentRuleSpec {
    IntentRuleSpec {
        name: name.to_string(),
        pattern: pattern.to_string(),
        status,
        negatable,
    }
}

fn default_intent_rules() -> Vec<IntentRuleSpec> {
    use GenomicStatus::*;
    vec![
        intent_rule(
            "negated_wild_type",
            r"(?i)\b(?:not|non)[\s-]+(?:be\s+)?(?:[a-z0-9]+[\s-]+)?wild[\s-]?type\b|\babsence\s+of\s+(?:[a-z0-9]+[\s-]+)?wild[\s-]?type\b",
            AnyMutation,
            false,
        ),
        intent_rule("wild_type", r"(?i)\bwild[\s-]?type\b|\bwt\b", WildType, false),
        intent_rule("resistance", r"(?i)\bresistan(?:ce|t)\b", Resistance, true),
        intent_rule(
            "activating",
            r"(?i)\b(?:activating|oncogenic|gain[\s-]of[\s-]function|sensiti[sz]ing)\b",
            Activating,
            true,
        ),
        intent_rule(
            "pathogenic",
            r"(?i)\b(?:pathogenic|deleterious|loss[\s-]of[\s-]function|lof|inactivating|truncating)\b",
            PathogenicLof,
            true,
        ),
        intent_rule(
            "any_mutation",
            r"(?i)\b(?:mutations?|mutated|mutants?|alterations?|altered|variants?)\b",
            AnyMutation,
            true,
        ),
    ]
}

// ── Negation ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegationConfig {
    /// Markers that negate a phrase that follows them
    #[serde(default = "default_pre_markers")]
    pub pre_markers: Vec<String>,

    /// Markers that negate a phrase that precedes them
    #[serde(default = "default_post_markers")]
    pub post_markers: Vec<String>,

    /// Maximum number of words between marker and phrase
    #[serde(default = "default_window")]
    pub window_tokens: usize,
}

fn default_pre_markers() -> Vec<String> {
    ["no", "not", "absence of", "without", "negative for", "lack of", "free of"]
        .iter().map(|s| s.to_string()).collect()
}

fn default_post_markers() -> Vec<String> {
    ["absent", "not detected", "not present"]
        .iter().map(|s| s.to_string()).collect()
}

fn default_window() -> usize { 8 }

impl Default for NegationConfig {
    fn default() -> Self {
        Self {
            pre_markers: default_pre_markers(),
            post_markers: default_post_markers(),
            window_tokens: default_window(),
        }
    }
}

// ── Evaluation policy ─────────────────────────────────────────────────────────

/// How a criterion gene with no patient records at all is read under an
/// ANY_MUTATION intent: "not tested" and "wild-type" look the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingGeneData {
    /// Indeterminate, the verdict becomes UNCLEAR
    #[default]
    Unclear,
    /// Treat the gene as confirmed wild-type
    WildType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub missing_gene_data: MissingGeneData,

    /// Batches larger than this run on the rayon pool
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_parallel_threshold() -> usize { 16 }

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            missing_gene_data: MissingGeneData::default(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RuleSetConfig {
    /// Load from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from TOML file
    pub fn from_toml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file, picking the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            Some("toml") => Self::from_toml(path),
            _ => anyhow::bail!("Unsupported rule-set file extension: {}", path.display()),
        }
    }

    /// Save to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the rule set named by `ONCOMATCH_RULES`, or the built-in one when
    /// the variable is unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(RULES_ENV_VAR) {
            Ok(path) => {
                if !Path::new(&path).exists() {
                    anyhow::bail!("Rule-set file not found: {} (from {})", path, RULES_ENV_VAR);
                }
                tracing::info!("Loading rule set from {}", path);
                Self::from_path(&path)
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
