//! REST API types for frontend integration.
//!
//! Everything serializes as camelCase JSON; the wizard frontend consumes
//! these shapes directly.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::office::Office;
use crate::session::{DocumentProcessor, Phase};

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /api/agenda`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaRequest {
    pub agenda: String,
}

/// Body of `POST /api/office`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeRequest {
    pub office: String,
}

/// Body of `POST /api/case-number`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseNumberRequest {
    pub case_number: String,
}

// =============================================================================
// Responses
// =============================================================================

/// Snapshot of the wizard session, returned by `GET /api/session` and by
/// every state-changing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub agenda: String,
    pub agenda_label: String,
    pub phase: Phase,
    pub office: Option<&'static Office>,
    pub case_number: Option<String>,
    /// Fill state of every slot the active agenda requires.
    pub slots: Vec<SlotState>,
    pub processed_rows: Option<usize>,
}

/// Fill state of one input slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub slot: String,
    pub filled: bool,
}

impl SessionResponse {
    pub fn from_processor(processor: &DocumentProcessor) -> Self {
        let agenda = processor.agenda();
        let slots = agenda
            .required_slots()
            .iter()
            .map(|slot| SlotState {
                slot: slot.key().to_string(),
                filled: processor.has_input(*slot),
            })
            .collect();

        Self {
            session_id: processor.id().to_string(),
            agenda: agenda.key().to_string(),
            agenda_label: agenda.label().to_string(),
            phase: processor.phase(),
            office: processor.office(),
            case_number: processor.case_number().map(str::to_string),
            slots,
            processed_rows: processor.dataset().map(|d| d.len()),
        }
    }
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agenda::Agenda;
    use crate::template::TemplateCache;
    use std::collections::HashMap;

    #[test]
    fn test_session_response_snapshot() {
        let mut processor =
            DocumentProcessor::new(Agenda::Vp, TemplateCache::fixed(HashMap::new()));
        processor.select_office("ke").unwrap();

        let response = SessionResponse::from_processor(&processor);
        assert_eq!(response.agenda, "vp");
        assert_eq!(response.phase, Phase::AwaitingInputs);
        assert_eq!(response.office.unwrap().key, "ke");
        assert_eq!(response.slots.len(), 2);
        assert!(response.slots.iter().all(|s| !s.filled));
        assert!(response.processed_rows.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["agendaLabel"], "Dodávka tovarov");
        assert_eq!(json["slots"][1]["slot"], "postal-reference");
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("niečo sa pokazilo");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "niečo sa pokazilo");
    }
}
