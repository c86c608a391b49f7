//! Extraction session controller
//!
//! Owns the [`SessionState`], the visible form values, the view flags and
//! the submission toggles. All user actions go through here; each one runs
//! to completion before the next is handled, so ordering comes from the
//! handlers themselves rather than from locks.
//!
//! Phases: `Input -> Loading -> {Form, Error}`, `Form -> Input` on reset,
//! and `Error` accepts a new extraction directly.

use crate::backend::{BackendError, ShippingBackend, SubmissionReceipt};
use crate::error::{SessionError, SessionResult, EMPTY_MARKUP_MESSAGE, GENERIC_EXTRACTION_MESSAGE};
use crate::form::{FieldId, FormFields};
use crate::navigation::{self, CursorMove, Direction};
use crate::state::SessionState;
use crate::submission::{self, SubmissionPayload, SubmitOptions};
use chrono::Utc;
use shipform_common::events::{EventBus, SessionEvent};
use shipform_common::{AddressRecord, Extraction, UiPhase};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything the view layer renders besides the form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// "1 order found" / "N orders found"; hidden when `None`
    pub order_count: Option<String>,
    pub selector_visible: bool,
    pub selector_options: Vec<String>,
    pub navigation_enabled: bool,
    pub error_message: Option<String>,
    pub invalid_fields: BTreeSet<FieldId>,
}

/// Order count badge text
pub fn order_count_text(count: usize) -> String {
    if count == 1 {
        "1 order found".to_string()
    } else {
        format!("{} orders found", count)
    }
}

/// Address selector label: `"<name> - <city>, <state> (Order: <id>)"`
pub fn selector_label(record: &AddressRecord) -> String {
    let name = record
        .to_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown");
    let city = record.city_to.as_deref().unwrap_or("");
    let state = record.state_to.as_deref().unwrap_or("");
    match record.order_id() {
        Some(order_id) => format!("{} - {}, {} (Order: {})", name, city, state, order_id),
        None => format!("{} - {}, {}", name, city, state),
    }
}

pub struct SessionController<B> {
    backend: B,
    events: EventBus,
    state: SessionState,
    form: FormFields,
    view: ViewState,
    options: SubmitOptions,
    markup: String,
    session_id: Option<Uuid>,
}

impl<B: ShippingBackend> SessionController<B> {
    pub fn new(backend: B, events: EventBus) -> Self {
        Self {
            backend,
            events,
            state: SessionState::new(),
            form: FormFields::default(),
            view: ViewState::default(),
            options: SubmitOptions::default(),
            markup: String::new(),
            session_id: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn form(&self) -> &FormFields {
        &self.form
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn options(&self) -> SubmitOptions {
        self.options
    }

    pub fn phase(&self) -> UiPhase {
        self.state.phase
    }

    /// Markup from the last extract attempt (kept intact on failure)
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one full extraction cycle
    ///
    /// Returns the number of addresses loaded.
    pub async fn extract(&mut self, markup: &str) -> SessionResult<usize> {
        let markup = self.begin_extraction(markup)?;

        match self.backend.extract(&markup).await {
            Ok(extraction) => Ok(self.complete_extraction(extraction).await),
            Err(e) => Err(self.fail_extraction(e)),
        }
    }

    /// Guarded `Input -> Loading` transition
    ///
    /// Rejects a second start while a request is in flight, and rejects
    /// blank markup without leaving the input phase. Returns the trimmed
    /// markup to send.
    pub fn begin_extraction(&mut self, markup: &str) -> SessionResult<String> {
        match self.state.phase {
            UiPhase::Loading => return Err(SessionError::Busy),
            UiPhase::Form => return Err(SessionError::WrongPhase(UiPhase::Form)),
            UiPhase::Input | UiPhase::Error => {}
        }

        self.markup = markup.to_string();
        let trimmed = markup.trim();
        if trimmed.is_empty() {
            debug!("Extraction refused: markup is blank");
            self.view.error_message = Some(EMPTY_MARKUP_MESSAGE.to_string());
            self.set_phase(UiPhase::Error);
            return Err(SessionError::EmptyMarkup);
        }

        self.view.error_message = None;
        self.set_phase(UiPhase::Loading);
        Ok(trimmed.to_string())
    }

    /// `Loading -> Form`: populate the collection, forward it to storage, project
    async fn complete_extraction(&mut self, extraction: Extraction) -> usize {
        let session_id = Uuid::new_v4();
        let multiple = extraction.is_multiple();

        self.state.dimensions.clear();
        self.state.addresses.replace_all(extraction.into_records());
        let count = self.state.addresses.len();
        self.session_id = Some(session_id);

        if let Err(e) = self
            .backend
            .store_addresses(self.state.addresses.records())
            .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to store addresses, continuing");
            self.events.emit_lossy(SessionEvent::AddressStorageFailed {
                session_id,
                message: e.to_string(),
                timestamp: Utc::now(),
            });
        }

        self.view.order_count = Some(order_count_text(count));
        self.view.selector_visible = multiple;
        self.view.navigation_enabled = multiple;
        self.view.selector_options = if multiple {
            self.state.addresses.records().iter().map(selector_label).collect()
        } else {
            Vec::new()
        };
        self.view.invalid_fields.clear();

        self.state.load_current(&mut self.form);
        self.set_phase(UiPhase::Form);

        info!(session_id = %session_id, count, multiple, "Addresses loaded");
        self.events.emit_lossy(SessionEvent::AddressesLoaded {
            session_id,
            count,
            multiple,
            timestamp: Utc::now(),
        });
        count
    }

    /// `Loading -> Error`: record the user-facing message and reopen input
    fn fail_extraction(&mut self, error: BackendError) -> SessionError {
        let message = error
            .server_message()
            .unwrap_or(GENERIC_EXTRACTION_MESSAGE)
            .to_string();
        warn!(error = %error, "Extraction failed");

        self.view.error_message = Some(message.clone());
        self.set_phase(UiPhase::Error);
        self.events.emit_lossy(SessionEvent::ExtractionFailed {
            message: message.clone(),
            timestamp: Utc::now(),
        });
        SessionError::Extraction(message)
    }

    /// Page to the previous or next address (no-op unless two or more exist)
    pub fn navigate(&mut self, direction: Direction) -> Option<CursorMove> {
        if self.state.phase != UiPhase::Form {
            return None;
        }
        let moved = navigation::advance(&mut self.state, &mut self.form, direction)?;
        self.after_move(moved);
        Some(moved)
    }

    /// Jump to the address at `index` via the selector
    pub fn select(&mut self, index: usize) -> Option<CursorMove> {
        if self.state.phase != UiPhase::Form {
            return None;
        }
        let moved = navigation::select(&mut self.state, &mut self.form, index)?;
        self.after_move(moved);
        Some(moved)
    }

    fn after_move(&mut self, moved: CursorMove) {
        self.refresh_invalid_marks();
        debug!(from = moved.from, to = moved.to, "Cursor moved");
        self.events.emit_lossy(SessionEvent::CursorMoved {
            from: moved.from,
            to: moved.to,
            timestamp: Utc::now(),
        });
    }

    /// Apply a user edit to one visible field
    ///
    /// Required fields get live feedback: blank marks the field invalid,
    /// anything else clears the mark.
    pub fn set_field(&mut self, field: FieldId, value: impl Into<String>) {
        self.form.set(field, value);
        if field.is_required() {
            if self.form.is_blank(field) {
                self.view.invalid_fields.insert(field);
            } else {
                self.view.invalid_fields.remove(&field);
            }
        }
    }

    pub fn set_merge_orders(&mut self, enabled: bool) {
        self.options.merge_orders = enabled;
    }

    pub fn set_same_dimensions(&mut self, enabled: bool) {
        self.options.same_dimensions = enabled;
    }

    /// Validate and assemble the submission without sending it
    pub fn prepare_submission(&mut self) -> SessionResult<SubmissionPayload> {
        if self.state.phase != UiPhase::Form {
            return Err(SessionError::WrongPhase(self.state.phase));
        }

        let result = submission::prepare_submit(&mut self.state, &self.form, self.options);
        self.view.invalid_fields = submission::missing_required(&self.form).into_iter().collect();

        match &result {
            Ok(payload) => {
                debug!(fields = payload.len(), "Submission prepared");
                self.events.emit_lossy(SessionEvent::SubmissionPrepared {
                    address_count: self.state.addresses.len(),
                    same_dimensions: self.options.applies_same_dimensions(),
                    timestamp: Utc::now(),
                });
            }
            Err(SessionError::Validation { missing }) => {
                info!(missing = missing.len(), "Submission blocked by blank required fields");
                self.events.emit_lossy(SessionEvent::SubmissionRejected {
                    missing_fields: missing.iter().map(|f| f.name().to_string()).collect(),
                    timestamp: Utc::now(),
                });
            }
            Err(_) => {}
        }
        result
    }

    /// Validate, assemble and post the submission form
    pub async fn submit(&mut self) -> SessionResult<SubmissionReceipt> {
        let payload = self.prepare_submission()?;
        self.backend
            .submit(&payload)
            .await
            .map_err(SessionError::Submission)
    }

    /// Back to an empty input phase
    ///
    /// Clears markup, addresses, cursor, cached dimensions and view flags.
    /// Form values are left as rendered; the next extraction overwrites the
    /// address fields.
    pub fn reset(&mut self) {
        self.markup.clear();
        self.session_id = None;
        self.view = ViewState::default();
        let old_phase = self.state.phase;
        self.state.reset();
        self.emit_phase_change(old_phase, UiPhase::Input);

        info!("Session reset");
        self.events.emit_lossy(SessionEvent::SessionReset {
            timestamp: Utc::now(),
        });
    }

    fn refresh_invalid_marks(&mut self) {
        let form = &self.form;
        self.view.invalid_fields.retain(|field| form.is_blank(*field));
    }

    fn set_phase(&mut self, new_phase: UiPhase) {
        let old_phase = self.state.phase;
        self.state.phase = new_phase;
        self.emit_phase_change(old_phase, new_phase);
    }

    fn emit_phase_change(&self, old_phase: UiPhase, new_phase: UiPhase) {
        if old_phase == new_phase {
            return;
        }
        self.events.emit_lossy(SessionEvent::PhaseChanged {
            old_phase,
            new_phase,
            timestamp: Utc::now(),
        });
    }
}
