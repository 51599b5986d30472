//! Upstream text → client contract.
//!
//! | Mode      | Parse                          | On parse failure           |
//! |-----------|--------------------------------|----------------------------|
//! | structure | strip fences, strict JSON      | [`NormalizeError`]         |
//! | ocr       | strip fences, JSON             | whole text as extracted    |
//! | agent     | none                           | n/a                        |
//!
//! Usage counters are attached unchanged in every mode.

use serde_json::Value;
use thiserror::Error;

use crate::request::Mode;
use crate::upstream::UpstreamResult;

use super::schema::{
    AgentReply, ClinicalNote, ModeResult, NormalizedResponse, OcrResult, Recommendation,
    StructuredNote,
};

/// Structure-mode output could not be parsed.  Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("AI returned invalid format. Please try again.")]
    InvalidFormat,
}

/// Normalize one upstream reply for `mode`.
pub fn normalize(mode: Mode, upstream: UpstreamResult) -> Result<NormalizedResponse, NormalizeError> {
    let UpstreamResult { raw_text, usage } = upstream;

    let result = match mode {
        Mode::Structure => ModeResult::Structure(normalize_structure(&raw_text)?),
        Mode::Ocr => ModeResult::Ocr(normalize_ocr(&raw_text)),
        Mode::Agent => ModeResult::Agent(AgentReply { reply: raw_text }),
    };

    Ok(NormalizedResponse { result, usage })
}

/// Remove markdown code-fence markers (```` ```json ```` and ```` ``` ````)
/// wherever they occur, then trim.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Strict parse of the SOAP note object.
///
/// The top level must be a JSON object; `notes` and `recommendations`
/// default to empty when absent.  Recommendation entries that do not
/// validate are dropped.
pub fn normalize_structure(raw: &str) -> Result<StructuredNote, NormalizeError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|_| {
        log::warn!("structure output is not valid JSON (len={})", cleaned.len());
        NormalizeError::InvalidFormat
    })?;
    if !value.is_object() {
        log::warn!("structure output is JSON but not an object");
        return Err(NormalizeError::InvalidFormat);
    }

    let notes = value
        .get("notes")
        .map(ClinicalNote::from_value)
        .unwrap_or_default();

    let raw_recommendations = value
        .get("recommendations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let recommendations: Vec<Recommendation> = raw_recommendations
        .iter()
        .filter_map(Recommendation::from_value)
        .collect();
    if recommendations.len() < raw_recommendations.len() {
        log::warn!(
            "dropped {} malformed recommendation(s)",
            raw_recommendations.len() - recommendations.len()
        );
    }

    Ok(StructuredNote {
        notes,
        recommendations,
    })
}

/// Parse the OCR JSON object, falling back to the cleaned text.
pub fn normalize_ocr(raw: &str) -> OcrResult {
    let cleaned = strip_code_fences(raw);
    match parse_ocr_object(&cleaned) {
        Some(result) => result,
        None => {
            log::debug!("ocr output is not structured; returning plain text");
            OcrResult::plain(cleaned)
        }
    }
}

fn parse_ocr_object(cleaned: &str) -> Option<OcrResult> {
    let value: Value = serde_json::from_str(cleaned).ok()?;
    let object = value.as_object()?;

    let extracted_text = ["extracted_text", "extractedText"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))?
        .to_string();

    let identity = |keys: [&str; 2]| {
        keys.iter()
            .find_map(|key| match object.get(*key) {
                Some(Value::String(s)) => Some(s.trim().to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
    };

    Some(OcrResult {
        extracted_text,
        patient_name: identity(["patient_name", "patientName"]),
        patient_id: identity(["patient_id", "patientId"]),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
