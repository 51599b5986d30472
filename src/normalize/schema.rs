//! Normalized output schema returned to the client.
//!
//! Every default lives here: sparse note sections are simply absent,
//! recommendation lists default to empty, OCR name/ID are omitted when not
//! found, and every [`Usage`] counter defaults to zero.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// NoteSection
// ---------------------------------------------------------------------------

/// The 18 named sections of a SOAP-style clinical note, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSection {
    SubjectiveChiefComplaint,
    SubjectiveHpi,
    SubjectiveMedicalHistory,
    SubjectiveAllergies,
    ObjectiveExtraoral,
    ObjectiveIntraoral,
    ObjectiveTeethFindings,
    ObjectiveRadiographic,
    AssessmentDiagnosis,
    AssessmentDifferential,
    AssessmentCdtCodes,
    PlanTreatmentPerformed,
    PlanMaterialsUsed,
    PlanAnesthesia,
    PlanPostOp,
    PlanFollowUp,
    PlanReferrals,
    AdditionalNotes,
}

impl NoteSection {
    pub const ALL: [NoteSection; 18] = [
        NoteSection::SubjectiveChiefComplaint,
        NoteSection::SubjectiveHpi,
        NoteSection::SubjectiveMedicalHistory,
        NoteSection::SubjectiveAllergies,
        NoteSection::ObjectiveExtraoral,
        NoteSection::ObjectiveIntraoral,
        NoteSection::ObjectiveTeethFindings,
        NoteSection::ObjectiveRadiographic,
        NoteSection::AssessmentDiagnosis,
        NoteSection::AssessmentDifferential,
        NoteSection::AssessmentCdtCodes,
        NoteSection::PlanTreatmentPerformed,
        NoteSection::PlanMaterialsUsed,
        NoteSection::PlanAnesthesia,
        NoteSection::PlanPostOp,
        NoteSection::PlanFollowUp,
        NoteSection::PlanReferrals,
        NoteSection::AdditionalNotes,
    ];

    /// Wire key, e.g. `"subjective_chief_complaint"`.
    pub fn key(&self) -> &'static str {
        match self {
            NoteSection::SubjectiveChiefComplaint => "subjective_chief_complaint",
            NoteSection::SubjectiveHpi => "subjective_hpi",
            NoteSection::SubjectiveMedicalHistory => "subjective_medical_history",
            NoteSection::SubjectiveAllergies => "subjective_allergies",
            NoteSection::ObjectiveExtraoral => "objective_extraoral",
            NoteSection::ObjectiveIntraoral => "objective_intraoral",
            NoteSection::ObjectiveTeethFindings => "objective_teeth_findings",
            NoteSection::ObjectiveRadiographic => "objective_radiographic",
            NoteSection::AssessmentDiagnosis => "assessment_diagnosis",
            NoteSection::AssessmentDifferential => "assessment_differential",
            NoteSection::AssessmentCdtCodes => "assessment_cdt_codes",
            NoteSection::PlanTreatmentPerformed => "plan_treatment_performed",
            NoteSection::PlanMaterialsUsed => "plan_materials_used",
            NoteSection::PlanAnesthesia => "plan_anesthesia",
            NoteSection::PlanPostOp => "plan_post_op",
            NoteSection::PlanFollowUp => "plan_follow_up",
            NoteSection::PlanReferrals => "plan_referrals",
            NoteSection::AdditionalNotes => "additional_notes",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl fmt::Display for NoteSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// ClinicalNote
// ---------------------------------------------------------------------------

/// Sparse SOAP note: only sections with non-blank text are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClinicalNote {
    sections: BTreeMap<NoteSection, String>,
}

impl ClinicalNote {
    /// Build from the model's `notes` object.
    ///
    /// Unknown keys, blank strings and non-string values are dropped.  Any
    /// non-object input yields an empty note.
    pub fn from_value(value: &Value) -> Self {
        let mut sections = BTreeMap::new();
        if let Value::Object(map) = value {
            for (key, text) in map {
                let (Some(section), Some(text)) = (NoteSection::from_key(key), text.as_str())
                else {
                    continue;
                };
                let text = text.trim();
                if !text.is_empty() {
                    sections.insert(section, text.to_string());
                }
            }
        }
        Self { sections }
    }

    pub fn get(&self, section: NoteSection) -> Option<&str> {
        self.sections.get(&section).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoteSection, &str)> {
        self.sections.iter().map(|(s, t)| (*s, t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clinical,
    Followup,
    Medication,
    Preventive,
    Diagnostic,
    Safety,
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clinical" => Ok(Category::Clinical),
            "followup" | "follow-up" | "follow_up" => Ok(Category::Followup),
            "medication" => Ok(Category::Medication),
            "preventive" => Ok(Category::Preventive),
            "diagnostic" => Ok(Category::Diagnostic),
            "safety" => Ok(Category::Safety),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(()),
        }
    }
}

/// One clinical recommendation, in the order the model produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub category: Category,
    pub title: String,
    pub detail: String,
    pub priority: Priority,
}

impl Recommendation {
    /// Validate one entry of the model's `recommendations` array.
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::trim);

        let category = field("category")?.parse().ok()?;
        let priority = field("priority")?.parse().ok()?;
        let title = field("title").filter(|t| !t.is_empty())?;
        let detail = field("detail").unwrap_or_default();

        Some(Self {
            category,
            title: title.to_string(),
            detail: detail.to_string(),
            priority,
        })
    }
}

// ---------------------------------------------------------------------------
// Mode results
// ---------------------------------------------------------------------------

/// Structure-mode result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredNote {
    pub notes: ClinicalNote,
    pub recommendations: Vec<Recommendation>,
}

/// OCR-mode result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OcrResult {
    pub extracted_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

impl OcrResult {
    /// Unstructured fallback: the whole text, no name or ID.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            extracted_text: text.into(),
            patient_name: None,
            patient_id: None,
        }
    }
}

/// Agent-mode result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentReply {
    pub reply: String,
}

/// The mode-specific half of a success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ModeResult {
    Structure(StructuredNote),
    Ocr(OcrResult),
    Agent(AgentReply),
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// Token accounting.  Reads the upstream's field names, writes the client's;
/// any missing or `null` counter is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(deserialize_with = "zero_if_null")]
    pub input_tokens: u64,
    #[serde(deserialize_with = "zero_if_null")]
    pub output_tokens: u64,
    #[serde(
        rename = "cache_read",
        alias = "cache_read_input_tokens",
        deserialize_with = "zero_if_null"
    )]
    pub cache_read: u64,
    #[serde(
        rename = "cache_creation",
        alias = "cache_creation_input_tokens",
        deserialize_with = "zero_if_null"
    )]
    pub cache_creation: u64,
}

fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

// ---------------------------------------------------------------------------
// NormalizedResponse
// ---------------------------------------------------------------------------

/// Complete success body: mode result fields plus `usage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedResponse {
    #[serde(flatten)]
    pub result: ModeResult,
    pub usage: Usage,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_keys_are_unique_and_round_trip() {
        for section in NoteSection::ALL {
            assert_eq!(NoteSection::from_key(section.key()), Some(section));
            assert_eq!(
                serde_json::to_value(section).unwrap(),
                json!(section.key())
            );
        }
    }

    #[test]
    fn clinical_note_drops_blank_unknown_and_non_string() {
        let note = ClinicalNote::from_value(&json!({
            "subjective_chief_complaint": "Pain on 36",
            "subjective_hpi": "   ",
            "objective_radiographic": null,
            "plan_follow_up": 7,
            "made_up_section": "ignored"
        }));

        assert_eq!(note.len(), 1);
        assert_eq!(
            note.get(NoteSection::SubjectiveChiefComplaint),
            Some("Pain on 36")
        );
    }

    #[test]
    fn clinical_note_serializes_in_soap_order() {
        let note = ClinicalNote::from_value(&json!({
            "plan_referrals": "Endo",
            "subjective_chief_complaint": "Pain"
        }));
        let text = serde_json::to_string(&note).unwrap();
        assert_eq!(
            text,
            r#"{"subjective_chief_complaint":"Pain","plan_referrals":"Endo"}"#
        );
    }

    #[test]
    fn recommendation_accepts_loose_casing() {
        let rec = Recommendation::from_value(&json!({
            "category": "Follow-up",
            "title": "Review in two weeks",
            "detail": "Check healing.",
            "priority": "HIGH"
        }))
        .expect("valid");
        assert_eq!(rec.category, Category::Followup);
        assert_eq!(rec.priority, Priority::High);
    }

    #[test]
    fn recommendation_rejects_unknown_category() {
        assert!(Recommendation::from_value(&json!({
            "category": "billing",
            "title": "x",
            "detail": "y",
            "priority": "low"
        }))
        .is_none());
    }

    #[test]
    fn usage_reads_upstream_names_and_defaults_missing() {
        let usage: Usage = serde_json::from_value(json!({
            "input_tokens": 120,
            "output_tokens": 40,
            "cache_read_input_tokens": 900,
            "cache_creation_input_tokens": null
        }))
        .unwrap();
        assert_eq!(
            usage,
            Usage {
                input_tokens: 120,
                output_tokens: 40,
                cache_read: 900,
                cache_creation: 0
            }
        );

        let out = serde_json::to_value(usage).unwrap();
        assert_eq!(
            out,
            json!({"input_tokens":120,"output_tokens":40,"cache_read":900,"cache_creation":0})
        );
    }

    #[test]
    fn empty_usage_object_is_all_zero() {
        let usage: Usage = serde_json::from_value(json!({})).unwrap();
        assert_eq!(usage, Usage::default());
    }

    #[test]
    fn ocr_result_omits_absent_identity() {
        let body = NormalizedResponse {
            result: ModeResult::Ocr(OcrResult::plain("Rx: amoxicillin 500mg")),
            usage: Usage::default(),
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["extracted_text"], "Rx: amoxicillin 500mg");
        assert!(value.get("patient_name").is_none());
        assert!(value.get("patient_id").is_none());
        assert_eq!(value["usage"]["cache_read"], 0);
    }
}
