//! Submission assembler
//!
//! Validates the required fields, saves the visible dimensions for the
//! current record, restamps the current-address flags and builds the
//! form-post payload.

use crate::error::{SessionError, SessionResult};
use crate::form::{FieldId, FormFields};
use crate::state::SessionState;

/// Posted as `merge_orders=on` when orders are merged into one shipment
pub const MERGE_ORDERS_FIELD: &str = "merge_orders";

/// Injected as `same_dimensions=on` when one dimension set applies to every merged order
pub const SAME_DIMENSIONS_FIELD: &str = "same_dimensions";

const CHECKED: &str = "on";

/// Submission toggles chosen by the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    pub merge_orders: bool,
    pub same_dimensions: bool,
}

impl SubmitOptions {
    /// Same-dimensions only takes effect together with merging
    pub fn applies_same_dimensions(&self) -> bool {
        self.merge_orders && self.same_dimensions
    }
}

/// Hidden field carrying one address's selection flag
pub fn current_address_field(index: usize) -> String {
    format!("address[{}][current_address]", index)
}

/// Ordered `name=value` pairs ready for a urlencoded form post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    fields: Vec<(String, String)>,
}

impl SubmissionPayload {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value posted under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Required fields that are blank after trimming, in form order
pub fn missing_required(form: &FormFields) -> Vec<FieldId> {
    FieldId::REQUIRED
        .iter()
        .copied()
        .filter(|field| form.is_blank(*field))
        .collect()
}

/// Validate and finalize a submission
///
/// On a validation failure nothing in `state` changes.
pub fn prepare_submit(
    state: &mut SessionState,
    form: &FormFields,
    options: SubmitOptions,
) -> SessionResult<SubmissionPayload> {
    let missing = missing_required(form);
    if !missing.is_empty() {
        return Err(SessionError::Validation { missing });
    }

    state.save_current_dimensions(form);
    state.addresses.mark_current();

    let mut payload = SubmissionPayload::default();
    for (name, value) in form.to_pairs() {
        payload.push(name, value);
    }
    if options.merge_orders {
        payload.push(MERGE_ORDERS_FIELD, CHECKED);
    }
    for (index, record) in state.addresses.records().iter().enumerate() {
        let flag = if record.current_address { "true" } else { "false" };
        payload.push(current_address_field(index), flag);
    }
    if options.applies_same_dimensions() {
        payload.push(SAME_DIMENSIONS_FIELD, CHECKED);
    }

    Ok(payload)
}
