//! Session orchestration: inputs, transformation, preview and generation.
//!
//! [`DocumentProcessor`] exclusively owns the [`SessionState`]; every
//! mutation goes through its operations. Submitting the last required input
//! triggers the agenda transformation automatically; removing any input
//! invalidates the cached dataset instead of leaving stale data behind.
//! At most one generation runs at a time.

pub mod store;

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::agenda::{self, Agenda, CanonicalDataset, Slot, SlotInputs};
use crate::api::notify::{notify_error, notify_success};
use crate::error::{GenerateError, GenerateResult, ProcessResult};
use crate::generate::{find_generator, run_generator, ArchiveOutput, BindCtx, GeneratorSpec};
use crate::office::{find_office, Office};
use crate::template::TemplateCache;
use crate::validate;

use store::{PersistedSession, SessionStore};

// =============================================================================
// Session State
// =============================================================================

/// All mutable per-session state, owned exclusively by the orchestrator.
pub struct SessionState {
    /// Currently selected agenda.
    pub agenda: Agenda,
    /// Currently selected office, if any.
    pub office: Option<&'static Office>,
    /// Saved case number per agenda key.
    pub case_numbers: HashMap<String, String>,
    /// Uploaded raw inputs keyed by logical slot.
    pub inputs: SlotInputs,
    /// The transformed dataset, present only while all inputs are valid.
    pub dataset: Option<CanonicalDataset>,
}

impl SessionState {
    fn new(agenda: Agenda) -> Self {
        Self {
            agenda,
            office: None,
            case_numbers: HashMap::new(),
            inputs: SlotInputs::new(),
            dataset: None,
        }
    }
}

/// Coarse phase of the input state machine, derived from state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    AwaitingInputs,
    Ready,
    Generating,
}

// =============================================================================
// Preview Render Model
// =============================================================================

/// Render model consumed by the UI preview table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub header: Vec<String>,
    pub rows: Vec<PreviewRow>,
    pub total_rows: usize,
    pub error_rows: usize,
}

/// One data row tagged with its validation errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub cells: Vec<String>,
    pub errors: Vec<String>,
    pub is_error: bool,
}

/// Enabling state of one generator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorReadiness {
    pub key: String,
    pub label: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// =============================================================================
// Document Processor
// =============================================================================

/// The orchestrator over one wizard session.
pub struct DocumentProcessor {
    id: String,
    state: SessionState,
    templates: TemplateCache,
    store: Option<SessionStore>,
    generating: bool,
}

impl DocumentProcessor {
    pub fn new(agenda: Agenda, templates: TemplateCache) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SessionState::new(agenda),
            templates,
            store: None,
            generating: false,
        }
    }

    /// Identifier of this wizard session; regenerated on reset.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attach a durable store and restore the persisted agenda, office and
    /// case numbers from it.
    pub fn with_store(mut self, store: SessionStore) -> Self {
        let persisted = store.load();
        if let Some(agenda) = persisted.agenda.as_deref().and_then(Agenda::from_key) {
            self.state.agenda = agenda;
        }
        self.state.office = persisted.office.as_deref().and_then(find_office);
        self.state.case_numbers = persisted.case_numbers;
        self.store = Some(store);
        self
    }

    pub fn agenda(&self) -> Agenda {
        self.state.agenda
    }

    pub fn office(&self) -> Option<&'static Office> {
        self.state.office
    }

    pub fn dataset(&self) -> Option<&CanonicalDataset> {
        self.state.dataset.as_ref()
    }

    pub fn has_input(&self, slot: Slot) -> bool {
        self.state.inputs.contains_key(&slot)
    }

    pub fn case_number(&self) -> Option<&str> {
        self.state
            .case_numbers
            .get(self.state.agenda.key())
            .map(String::as_str)
    }

    /// Current phase of the input state machine.
    pub fn phase(&self) -> Phase {
        if self.generating {
            Phase::Generating
        } else if self.state.dataset.is_some() {
            Phase::Ready
        } else {
            Phase::AwaitingInputs
        }
    }

    // -------------------------------------------------------------------------
    // User Actions
    // -------------------------------------------------------------------------

    /// Switch the active agenda. Uploaded inputs and the dataset belong to
    /// the previous agenda and are dropped.
    pub fn set_agenda(&mut self, agenda: Agenda) {
        if self.state.agenda != agenda {
            self.state.agenda = agenda;
            self.state.inputs.clear();
            self.state.dataset = None;
        }
        self.persist();
    }

    /// Select the office interpolated into generated documents.
    pub fn select_office(&mut self, key: &str) -> Option<&'static Office> {
        let office = find_office(key)?;
        self.state.office = Some(office);
        self.persist();
        Some(office)
    }

    /// Save the case number for the active agenda.
    pub fn save_case_number(&mut self, value: impl Into<String>) {
        self.state
            .case_numbers
            .insert(self.state.agenda.key().to_string(), value.into());
        self.persist();
    }

    /// Store uploaded bytes under a slot; once all required slots for the
    /// active agenda are filled, the transformation runs immediately.
    ///
    /// Returns `Ok(true)` when a dataset was produced. On a transformation
    /// failure the dataset stays absent and the error is surfaced.
    pub fn submit_input(&mut self, slot: Slot, bytes: Vec<u8>) -> ProcessResult<bool> {
        self.state.inputs.insert(slot, bytes);

        let all_filled = self
            .state
            .agenda
            .required_slots()
            .iter()
            .all(|s| self.state.inputs.contains_key(s));
        if !all_filled {
            return Ok(false);
        }

        match agenda::process(self.state.agenda, &self.state.inputs) {
            Ok(dataset) => {
                notify_success(format!(
                    "Spracovaných {} riadkov ({})",
                    dataset.len(),
                    self.state.agenda.label()
                ));
                self.state.dataset = Some(dataset);
                Ok(true)
            }
            Err(err) => {
                self.state.dataset = None;
                notify_error("Spracovanie vstupov zlyhalo", err.to_string());
                Err(err)
            }
        }
    }

    /// Remove one uploaded input; the previously computed dataset is
    /// invalidated rather than left stale.
    pub fn remove_input(&mut self, slot: Slot) {
        self.state.inputs.remove(&slot);
        self.state.dataset = None;
    }

    /// Tear down the whole session, including the durable store.
    pub fn reset(&mut self) {
        self.id = Uuid::new_v4().to_string();
        self.state = SessionState::new(self.state.agenda);
        if let Some(store) = &self.store {
            let _ = store.clear();
        }
    }

    // -------------------------------------------------------------------------
    // Preview & Readiness
    // -------------------------------------------------------------------------

    /// Render model for the preview table: each data row tagged with its
    /// validation errors plus aggregate counts. `None` until a dataset has
    /// been processed.
    pub fn preview(&self) -> Option<Preview> {
        let dataset = self.state.dataset.as_ref()?;
        let map = dataset.column_map();
        let agenda_key = self.state.agenda.key();

        let rows: Vec<PreviewRow> = dataset
            .rows
            .iter()
            .map(|row| {
                let errors = validate::validate(agenda_key, row, &map);
                PreviewRow {
                    cells: row.iter().map(|c| c.text()).collect(),
                    is_error: !errors.is_empty(),
                    errors,
                }
            })
            .collect();

        let error_rows = rows.iter().filter(|r| r.is_error).count();
        Some(Preview {
            header: dataset.header.clone(),
            total_rows: rows.len(),
            error_rows,
            rows,
        })
    }

    /// Enabling condition of one generator: dataset processed, case number
    /// saved (when the agenda requires one) and an office selected.
    fn generator_blocker(&self, spec: &GeneratorSpec) -> Option<String> {
        if spec.agenda != self.state.agenda {
            return Some("generátor patrí inej agende".to_string());
        }
        if self.state.dataset.as_ref().map_or(true, |d| d.is_empty()) {
            return Some("vstupy ešte nie sú spracované".to_string());
        }
        if self.state.agenda.requires_case_number() && self.case_number().is_none() {
            return Some("nie je uložené číslo spisu".to_string());
        }
        if self.state.office.is_none() {
            return Some("nie je vybraný úrad".to_string());
        }
        None
    }

    /// Readiness of every generator of the active agenda; recomputed from
    /// current state on each call.
    pub fn readiness(&self) -> Vec<GeneratorReadiness> {
        crate::generate::generators_for(self.state.agenda)
            .into_iter()
            .map(|spec| {
                let reason = self.generator_blocker(spec);
                GeneratorReadiness {
                    key: spec.key.to_string(),
                    label: spec.label.to_string(),
                    ready: reason.is_none(),
                    reason,
                }
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Generation
    // -------------------------------------------------------------------------

    /// Run one generator and return the finished archive.
    ///
    /// Refuses a second invocation while a generation is in flight, for the
    /// same or a different generator.
    pub async fn generate(&mut self, generator_key: &str) -> GenerateResult<ArchiveOutput> {
        let spec = find_generator(generator_key)
            .ok_or_else(|| GenerateError::UnknownGenerator(generator_key.to_string()))?;

        if self.generating {
            return Err(GenerateError::Busy);
        }
        let dataset = match self.state.dataset.as_ref() {
            Some(dataset) if !dataset.is_empty() => dataset,
            _ => return Err(GenerateError::NoProcessedData),
        };
        if let Some(reason) = self.generator_blocker(spec) {
            return Err(GenerateError::NotReady(reason));
        }
        let office = self
            .state
            .office
            .ok_or_else(|| GenerateError::NotReady("nie je vybraný úrad".to_string()))?;

        let map = dataset.column_map();
        let case_number = self
            .state
            .case_numbers
            .get(self.state.agenda.key())
            .cloned()
            .unwrap_or_default();
        let ctx = BindCtx {
            office,
            case_number: &case_number,
            map: &map,
            header: &dataset.header,
            today: chrono::Local::now().format("%d.%m.%Y").to_string(),
        };

        self.generating = true;
        let result = run_generator(spec, dataset, &ctx, &mut self.templates).await;
        self.generating = false;

        if let Err(err) = &result {
            notify_error("Generovanie zlyhalo", err.to_string());
        }
        result
    }

    // -------------------------------------------------------------------------

    fn persist(&self) {
        if let Some(store) = &self.store {
            let persisted = PersistedSession {
                agenda: Some(self.state.agenda.key().to_string()),
                office: self.state.office.map(|o| o.key.to_string()),
                case_numbers: self.state.case_numbers.clone(),
            };
            let _ = store.save(&persisted);
        }
    }
}
