//! Body → [`RelayRequest`] parsing.
//!
//! Only shape is checked here (JSON object, known mode, field types).  Length
//! and content policy belongs to the prompt assembler.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::InputError;
use super::types::{Mode, RelayRequest};

impl RelayRequest {
    /// Parse a raw request body.
    ///
    /// ```rust
    /// use dentavoice_relay::request::{Mode, RelayRequest};
    ///
    /// let req = RelayRequest::from_body(br#"{"transcript":"tooth 36 sensitive to cold"}"#).unwrap();
    /// assert_eq!(req.mode(), Mode::Structure);
    /// ```
    pub fn from_body(body: &[u8]) -> Result<Self, InputError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| InputError::InvalidJson)?;
        let Value::Object(object) = value else {
            return Err(InputError::NotAnObject);
        };

        match mode_of(&object)? {
            Mode::Structure => decode(object).map(RelayRequest::Structure),
            Mode::Ocr => decode(object).map(RelayRequest::Ocr),
            Mode::Agent => decode(object).map(RelayRequest::Agent),
        }
    }
}

/// Absent, `null` or blank mode means structure.
fn mode_of(object: &Map<String, Value>) -> Result<Mode, InputError> {
    match object.get("mode") {
        None | Some(Value::Null) => Ok(Mode::default()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Mode::default()),
        Some(Value::String(s)) => s.parse(),
        Some(_) => Err(InputError::InvalidField("mode must be a string".into())),
    }
}

fn decode<T: DeserializeOwned>(object: Map<String, Value>) -> Result<T, InputError> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| InputError::InvalidField(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ChatTurn, Role};

    #[test]
    fn missing_mode_defaults_to_structure() {
        let req = RelayRequest::from_body(br#"{"transcript":"hello there doctor"}"#).unwrap();
        match req {
            RelayRequest::Structure(s) => {
                assert_eq!(s.transcript.as_deref(), Some("hello there doctor"))
            }
            other => panic!("expected structure, got {other:?}"),
        }
    }

    #[test]
    fn null_mode_defaults_to_structure() {
        let req = RelayRequest::from_body(br#"{"mode":null}"#).unwrap();
        assert_eq!(req.mode(), Mode::Structure);
    }

    #[test]
    fn blank_mode_defaults_to_structure() {
        let bodies: [&[u8]; 2] = [br#"{"mode":""}"#, br#"{"mode":"  "}"#];
        for body in bodies {
            assert_eq!(RelayRequest::from_body(body).unwrap().mode(), Mode::Structure);
        }
    }

    #[test]
    fn agent_null_fields_take_defaults() {
        let req = RelayRequest::from_body(
            br#"{"mode":"agent","needs_patient_data":null,"messages":null,"patient_context":null}"#,
        )
        .unwrap();
        let RelayRequest::Agent(agent) = req else {
            panic!("expected agent");
        };
        assert!(agent.needs_patient_data);
        assert!(agent.messages.is_empty());
        assert!(agent.patient_context.is_none());
    }

    #[test]
    fn ocr_media_type_defaults_to_jpeg() {
        let req = RelayRequest::from_body(br#"{"mode":"ocr","image":"aGVsbG8="}"#).unwrap();
        let RelayRequest::Ocr(ocr) = req else {
            panic!("expected ocr");
        };
        assert_eq!(ocr.image.as_deref(), Some("aGVsbG8="));
        assert_eq!(ocr.media_type(), "image/jpeg");
    }

    #[test]
    fn agent_needs_patient_data_defaults_true() {
        let req =
            RelayRequest::from_body(br#"{"mode":"agent","messages":[{"role":"user","content":"hi"}]}"#)
                .unwrap();
        let RelayRequest::Agent(agent) = req else {
            panic!("expected agent");
        };
        assert!(agent.needs_patient_data);
        assert_eq!(agent.messages, vec![ChatTurn::new(Role::User, "hi")]);
        assert!(agent.patient_context.is_none());
        assert!(agent.conversation_summary.is_none());
    }

    #[test]
    fn agent_explicit_false_is_kept() {
        let req = RelayRequest::from_body(
            br#"{"mode":"agent","needs_patient_data":false,"messages":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        let RelayRequest::Agent(agent) = req else {
            panic!("expected agent");
        };
        assert!(!agent.needs_patient_data);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = RelayRequest::from_body(br#"{"mode":"translate"}"#).unwrap_err();
        assert_eq!(err, InputError::UnknownMode("translate".into()));
    }

    #[test]
    fn non_string_mode_is_rejected() {
        let err = RelayRequest::from_body(br#"{"mode":3}"#).unwrap_err();
        assert!(matches!(err, InputError::InvalidField(_)));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_eq!(
            RelayRequest::from_body(b"not json").unwrap_err(),
            InputError::InvalidJson
        );
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert_eq!(
            RelayRequest::from_body(b"[1,2,3]").unwrap_err(),
            InputError::NotAnObject
        );
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        let err = RelayRequest::from_body(br#"{"transcript":42}"#).unwrap_err();
        assert!(matches!(err, InputError::InvalidField(_)));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = RelayRequest::from_body(
            br#"{"mode":"agent","messages":[{"role":"system","content":"x"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::InvalidField(_)));
    }
}
