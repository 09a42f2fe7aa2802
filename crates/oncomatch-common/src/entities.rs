/// Core domain types shared by the criterion analyzer.
/// Patient records come from the external mutation store; labels and
/// statuses are closed enums so rule tables never compare raw strings.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Variant type
// ---------------------------------------------------------------------------

/// Consequence category of a patient mutation.
///
/// Parsed leniently from MAF `Variant_Classification` values
/// (`Missense_Mutation`, `Frame_Shift_Del`, ...) and from VEP consequence
/// terms (`missense_variant`, `stop_gained`, ...). Anything else is kept
/// verbatim in [`VariantType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariantType {
    Missense,
    Nonsense,
    FrameShiftDeletion,
    FrameShiftInsertion,
    SpliceSite,
    InFrameDeletion,
    InFrameInsertion,
    Other(String),
}

impl VariantType {
    /// Parse a variant type label. Never fails.
    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "missense_mutation" | "missense_variant" | "missense" => VariantType::Missense,
            "nonsense_mutation" | "nonsense" | "stop_gained" => VariantType::Nonsense,
            "frame_shift_del" | "frame_shift_deletion" | "frameshift_deletion" => {
                VariantType::FrameShiftDeletion
            }
            // VEP does not say which direction the frame moved; both land in the
            // same loss-of-function bucket, so deletion is as good as insertion.
            "frameshift_variant" => VariantType::FrameShiftDeletion,
            "frame_shift_ins" | "frame_shift_insertion" | "frameshift_insertion" => {
                VariantType::FrameShiftInsertion
            }
            "splice_site" | "splice_site_snp" | "splice_site_del" | "splice_site_ins"
            | "splice_acceptor_variant" | "splice_donor_variant" => VariantType::SpliceSite,
            "in_frame_del" | "in_frame_deletion" | "inframe_deletion" => VariantType::InFrameDeletion,
            "in_frame_ins" | "in_frame_insertion" | "inframe_insertion" => {
                VariantType::InFrameInsertion
            }
            _ => VariantType::Other(raw.trim().to_string()),
        }
    }

    /// Canonical MAF-style name.
    pub fn as_str(&self) -> &str {
        match self {
            VariantType::Missense            => "Missense_Mutation",
            VariantType::Nonsense            => "Nonsense_Mutation",
            VariantType::FrameShiftDeletion  => "Frame_Shift_Del",
            VariantType::FrameShiftInsertion => "Frame_Shift_Ins",
            VariantType::SpliceSite          => "Splice_Site",
            VariantType::InFrameDeletion     => "In_Frame_Del",
            VariantType::InFrameInsertion    => "In_Frame_Ins",
            VariantType::Other(raw)          => raw.as_str(),
        }
    }

    /// Truncating categories: frame-shifts, nonsense and splice-site changes.
    pub fn is_truncating(&self) -> bool {
        matches!(
            self,
            VariantType::FrameShiftDeletion
                | VariantType::FrameShiftInsertion
                | VariantType::Nonsense
                | VariantType::SpliceSite
        )
    }

    /// Sequence Ontology consequence term, `"unknown"` when unmapped.
    pub fn consequence_term(&self) -> &'static str {
        match self {
            VariantType::Missense            => "missense_variant",
            VariantType::Nonsense            => "stop_gained",
            VariantType::FrameShiftDeletion
            | VariantType::FrameShiftInsertion => "frameshift_variant",
            VariantType::SpliceSite          => "splice_site_variant",
            VariantType::InFrameDeletion     => "inframe_deletion",
            VariantType::InFrameInsertion    => "inframe_insertion",
            VariantType::Other(raw) => match raw.to_ascii_lowercase().as_str() {
                "silent" | "synonymous_variant" => "synonymous_variant",
                _ => "unknown",
            },
        }
    }

    /// Protein-altering but reading-frame preserving categories.
    pub fn is_in_frame(&self) -> bool {
        matches!(
            self,
            VariantType::Missense | VariantType::InFrameDeletion | VariantType::InFrameInsertion
        )
    }
}

impl Default for VariantType {
    fn default() -> Self {
        VariantType::Other(String::new())
    }
}

impl From<String> for VariantType {
    fn from(raw: String) -> Self {
        VariantType::parse(&raw)
    }
}

impl From<&str> for VariantType {
    fn from(raw: &str) -> Self {
        VariantType::parse(raw)
    }
}

impl From<VariantType> for String {
    fn from(vt: VariantType) -> Self {
        vt.as_str().to_string()
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Mutation record
// ---------------------------------------------------------------------------

/// One patient mutation as materialised by the upstream record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    #[serde(alias = "hugo_gene_symbol")]
    pub gene_symbol: String,
    #[serde(default, deserialize_with = "variant_type_or_default")]
    pub variant_type: VariantType,
    #[serde(default)]
    pub protein_change: Option<String>, // e.g. p.V600E
}

impl MutationRecord {
    pub fn new(
        gene_symbol: impl Into<String>,
        variant_type: impl Into<VariantType>,
        protein_change: Option<&str>,
    ) -> Self {
        Self {
            gene_symbol: gene_symbol.into(),
            variant_type: variant_type.into(),
            protein_change: protein_change.map(str::to_string),
        }
    }

    /// Human-readable identifier: the protein change when known,
    /// otherwise the variant type.
    pub fn display_variant(&self) -> String {
        match self.protein_change.as_deref().map(str::trim) {
            Some(change) if !change.is_empty() => change.to_string(),
            _ => self.variant_type.as_str().to_string(),
        }
    }
}

/// Accepts a missing or `null` variant type as [`VariantType::default`].
fn variant_type_or_default<'de, D>(deserializer: D) -> Result<VariantType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(VariantType::from).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Classification labels
// ---------------------------------------------------------------------------

/// Simulated variant-effect label.
///
/// `WildType` is never produced by the classifier itself; the gene
/// aggregator uses it when no qualifying mutation is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationLabel {
    PredictedActivating,
    PredictedPathogenicLof,
    PredictedResistance,
    PredictedVus,
    PredictedBenignUnclear,
    WildType,
}

impl ClassificationLabel {
    /// Reduction rank: ACTIVATING > PATHOGENIC_LOF > RESISTANCE > VUS > BENIGN_UNCLEAR.
    pub fn severity(&self) -> u8 {
        match self {
            ClassificationLabel::PredictedActivating    => 5,
            ClassificationLabel::PredictedPathogenicLof => 4,
            ClassificationLabel::PredictedResistance    => 3,
            ClassificationLabel::PredictedVus           => 2,
            ClassificationLabel::PredictedBenignUnclear => 1,
            ClassificationLabel::WildType               => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::PredictedActivating    => "PREDICTED_ACTIVATING",
            ClassificationLabel::PredictedPathogenicLof => "PREDICTED_PATHOGENIC_LOF",
            ClassificationLabel::PredictedResistance    => "PREDICTED_RESISTANCE",
            ClassificationLabel::PredictedVus           => "PREDICTED_VUS",
            ClassificationLabel::PredictedBenignUnclear => "PREDICTED_BENIGN_UNCLEAR",
            ClassificationLabel::WildType               => "WILD_TYPE",
        }
    }

    /// Parse from the serialized name. Returns `None` for unknown labels.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PREDICTED_ACTIVATING"     => Some(ClassificationLabel::PredictedActivating),
            "PREDICTED_PATHOGENIC_LOF" => Some(ClassificationLabel::PredictedPathogenicLof),
            "PREDICTED_RESISTANCE"     => Some(ClassificationLabel::PredictedResistance),
            "PREDICTED_VUS"            => Some(ClassificationLabel::PredictedVus),
            "PREDICTED_BENIGN_UNCLEAR" => Some(ClassificationLabel::PredictedBenignUnclear),
            "WILD_TYPE"                => Some(ClassificationLabel::WildType),
            _ => None,
        }
    }
}

impl PartialOrd for ClassificationLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassificationLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive context reported alongside a classification.
///
/// Annotations never influence the label or the verdict. Tool calls and
/// knowledge-base levels are only present for curated variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAnnotation {
    /// `GENE:p.V600E`, or `GENE:<variant type>` without a protein change
    pub canonical_variant_id: String,
    /// Sequence Ontology term such as `missense_variant`
    pub predicted_consequence: String,
    /// Curated rationale for a known variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sift: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyphen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinvar_significance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oncokb_level: Option<String>,
}

/// A label plus the rule citation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: ClassificationLabel,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<VariantAnnotation>,
}

impl Classification {
    pub fn new(label: ClassificationLabel, reasoning: impl Into<String>) -> Self {
        Self { label, reasoning: reasoning.into(), annotation: None }
    }

    pub fn with_annotation(mut self, annotation: VariantAnnotation) -> Self {
        self.annotation = Some(annotation);
        self
    }
}

// ---------------------------------------------------------------------------
// Clinical intent
// ---------------------------------------------------------------------------

/// Genomic status a criterion asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenomicStatus {
    Activating,
    PathogenicLof,
    Resistance,
    WildType,
    AnyMutation,
}

impl GenomicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenomicStatus::Activating    => "ACTIVATING",
            GenomicStatus::PathogenicLof => "PATHOGENIC_LOF",
            GenomicStatus::Resistance    => "RESISTANCE",
            GenomicStatus::WildType      => "WILD_TYPE",
            GenomicStatus::AnyMutation   => "ANY_MUTATION",
        }
    }

    /// The single classification label this status asks for, if any.
    pub fn matching_label(&self) -> Option<ClassificationLabel> {
        match self {
            GenomicStatus::Activating    => Some(ClassificationLabel::PredictedActivating),
            GenomicStatus::PathogenicLof => Some(ClassificationLabel::PredictedPathogenicLof),
            GenomicStatus::Resistance    => Some(ClassificationLabel::PredictedResistance),
            GenomicStatus::WildType      => Some(ClassificationLabel::WildType),
            GenomicStatus::AnyMutation   => None,
        }
    }
}

impl fmt::Display for GenomicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reading of a criterion: which status, and whether it must be
/// present (`true`) or absent (`false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub required_status: GenomicStatus,
    pub presence_required: bool,
}

impl Intent {
    pub fn new(required_status: GenomicStatus, presence_required: bool) -> Self {
        Self { required_status, presence_required }
    }
}

impl Default for Intent {
    /// A bare gene mention: any mutation, required present.
    fn default() -> Self {
        Self::new(GenomicStatus::AnyMutation, true)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_variant_type_maf_names() {
        assert_eq!(VariantType::parse("Missense_Mutation"), VariantType::Missense);
        assert_eq!(VariantType::parse("Nonsense_Mutation"), VariantType::Nonsense);
        assert_eq!(VariantType::parse("Frame_Shift_Del"), VariantType::FrameShiftDeletion);
        assert_eq!(VariantType::parse("Frame_Shift_Ins"), VariantType::FrameShiftInsertion);
        assert_eq!(VariantType::parse("Splice_Site_SNP"), VariantType::SpliceSite);
        assert_eq!(VariantType::parse("In_Frame_Del"), VariantType::InFrameDeletion);
        assert_eq!(VariantType::parse("In_Frame_Ins"), VariantType::InFrameInsertion);
    }

    #[test]
    fn test_variant_type_vep_terms() {
        assert_eq!(VariantType::parse("stop_gained"), VariantType::Nonsense);
        assert_eq!(VariantType::parse("missense_variant"), VariantType::Missense);
        assert_eq!(VariantType::parse("inframe_deletion"), VariantType::InFrameDeletion);
        assert_eq!(VariantType::parse("splice donor variant"), VariantType::SpliceSite);
    }

    #[test]
    fn test_unknown_variant_type_kept_verbatim() {
        let vt = VariantType::parse(" Silent ");
        assert_eq!(vt, VariantType::Other("Silent".to_string()));
        assert_eq!(vt.as_str(), "Silent");
        assert!(!vt.is_truncating());
        assert!(!vt.is_in_frame());
    }

    #[test]
    fn test_consequence_terms() {
        assert_eq!(VariantType::parse("Frame_Shift_Ins").consequence_term(), "frameshift_variant");
        assert_eq!(VariantType::parse("Nonsense_Mutation").consequence_term(), "stop_gained");
        assert_eq!(VariantType::parse("Silent").consequence_term(), "synonymous_variant");
        assert_eq!(VariantType::parse("RNA").consequence_term(), "unknown");
    }

    #[test]
    fn test_classification_without_annotation_omits_field() {
        let plain = Classification::new(ClassificationLabel::PredictedVus, "no rule");
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("annotation").is_none());

        let annotated = plain.with_annotation(VariantAnnotation {
            canonical_variant_id: "KRAS:p.A59T".into(),
            predicted_consequence: "missense_variant".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&annotated).unwrap();
        assert_eq!(json["annotation"]["canonical_variant_id"], "KRAS:p.A59T");
        assert!(json["annotation"].get("sift").is_none());
        let back: Classification = serde_json::from_value(json).unwrap();
        assert_eq!(back, annotated);
    }

    #[test]
    fn test_record_accepts_hugo_alias_and_null_type() {
        let json = r#"{"hugo_gene_symbol": "MYC", "variant_type": null, "protein_change": "S70A"}"#;
        let rec: MutationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.gene_symbol, "MYC");
        assert_eq!(rec.variant_type, VariantType::default());
        assert_eq!(rec.display_variant(), "S70A");
    }

    #[test]
    fn test_record_serializes_maf_name() {
        let rec = MutationRecord::new("TP53", "stop_gained", Some("p.R196*"));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["variant_type"], "Nonsense_Mutation");
    }

    #[test]
    fn test_severity_total_order() {
        use ClassificationLabel::*;
        let mut labels = vec![PredictedVus, WildType, PredictedResistance, PredictedActivating,
                              PredictedBenignUnclear, PredictedPathogenicLof];
        labels.sort();
        assert_eq!(labels, vec![WildType, PredictedBenignUnclear, PredictedVus,
                                PredictedResistance, PredictedPathogenicLof, PredictedActivating]);
    }

    #[test]
    fn test_label_names_roundtrip_through_serde() {
        let json = serde_json::to_string(&ClassificationLabel::PredictedPathogenicLof).unwrap();
        assert_eq!(json, "\"PREDICTED_PATHOGENIC_LOF\"");
        assert_eq!(ClassificationLabel::from_name("predicted_vus"), Some(ClassificationLabel::PredictedVus));
        assert_eq!(ClassificationLabel::from_name("PATHOGENIC"), None);
    }

    #[test]
    fn test_default_intent_is_any_mutation_present() {
        let intent = Intent::default();
        assert_eq!(intent.required_status, GenomicStatus::AnyMutation);
        assert!(intent.presence_required);
        assert_eq!(serde_json::to_value(intent).unwrap()["required_status"], "ANY_MUTATION");
    }
}
