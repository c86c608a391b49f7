//! Error types for the session controller
//!
//! Three user-facing categories: input errors (nothing sent), extraction
//! errors (request or response failed), and validation errors (submit
//! blocked locally). None of them are retried automatically.

use crate::backend::BackendError;
use crate::form::FieldId;
use shipform_common::UiPhase;
use thiserror::Error;

/// Shown when extract is triggered with blank markup
pub const EMPTY_MARKUP_MESSAGE: &str = "Please enter HTML content to extract shipping information.";

/// Shown when an extraction fails without a server-provided message
pub const GENERIC_EXTRACTION_MESSAGE: &str = "Failed to extract shipping information.";

/// Blocking summary shown when required fields are blank
pub const VALIDATION_MESSAGE: &str = "Please fill in all required fields.";

#[derive(Debug, Error)]
pub enum SessionError {
    /// Markup was empty or whitespace-only; no request was made
    #[error("{}", EMPTY_MARKUP_MESSAGE)]
    EmptyMarkup,

    /// An extraction request is already in flight
    #[error("An extraction request is already in progress")]
    Busy,

    /// Action is not available in the current phase
    #[error("Action not available in the {0} phase")]
    WrongPhase(UiPhase),

    /// Extraction failed; the payload is the message shown to the user
    #[error("{0}")]
    Extraction(String),

    /// Required fields are blank; submission was not sent
    #[error("{} Missing: {}", VALIDATION_MESSAGE, field_list(.missing))]
    Validation { missing: Vec<FieldId> },

    /// The submission form post failed
    #[error("Submission failed: {0}")]
    Submission(#[source] BackendError),
}

fn field_list(fields: &[FieldId]) -> String {
    fields
        .iter()
        .map(|field| field.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
