//! shipform-session library
//!
//! Session state machine for turning pasted order markup into shipping
//! address records, paging through them while caching per-order package
//! dimensions, and assembling the submission form.

pub mod backend;
pub mod collection;
pub mod dimensions;
pub mod error;
pub mod form;
pub mod navigation;
pub mod session;
pub mod state;
pub mod submission;

pub use crate::backend::{BackendError, HttpBackend, ShippingBackend, SubmissionReceipt};
pub use crate::error::{SessionError, SessionResult};
pub use crate::form::{FieldId, FormFields};
pub use crate::navigation::Direction;
pub use crate::session::{SessionController, ViewState};
pub use crate::state::SessionState;
pub use crate::submission::{SubmissionPayload, SubmitOptions};
