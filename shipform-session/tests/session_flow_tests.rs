//! Session controller scenarios driven through an in-memory backend
//!
//! Tests cover:
//! - Single and multi-address extraction responses
//! - Wraparound paging and the current-address flag
//! - Per-order dimension cache round trips
//! - Input, extraction and validation errors
//! - The in-flight guard and phase transitions
//! - Submission payload assembly

use async_trait::async_trait;
use shipform_common::events::{EventBus, SessionEvent};
use shipform_common::{AddressRecord, Extraction, UiPhase};
use shipform_session::error::{EMPTY_MARKUP_MESSAGE, GENERIC_EXTRACTION_MESSAGE};
use shipform_session::{
    BackendError, Direction, FieldId, SessionController, SessionError, ShippingBackend,
    SubmissionPayload, SubmissionReceipt,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted outcome for the next extract call
#[derive(Clone)]
enum Reply {
    Found(Extraction),
    ServerError(u16, Option<String>),
    NetworkDown,
}

/// Test helper: in-memory backend recording every call
struct FakeBackend {
    reply: Mutex<Reply>,
    store_fails: bool,
    extract_calls: AtomicUsize,
    stored: Mutex<Vec<Vec<AddressRecord>>>,
    submitted: Mutex<Vec<SubmissionPayload>>,
}

impl FakeBackend {
    fn replying(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            store_fails: false,
            extract_calls: AtomicUsize::new(0),
            stored: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShippingBackend for FakeBackend {
    async fn extract(&self, _markup: &str) -> Result<Extraction, BackendError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        match self.reply.lock().unwrap().clone() {
            Reply::Found(extraction) => Ok(extraction),
            Reply::ServerError(status, message) => Err(BackendError::Server { status, message }),
            Reply::NetworkDown => Err(BackendError::Network("connection refused".to_string())),
        }
    }

    async fn store_addresses(&self, addresses: &[AddressRecord]) -> Result<(), BackendError> {
        self.stored.lock().unwrap().push(addresses.to_vec());
        if self.store_fails {
            return Err(BackendError::Server {
                status: 500,
                message: Some("Error storing addresses".to_string()),
            });
        }
        Ok(())
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt, BackendError> {
        self.submitted.lock().unwrap().push(payload.clone());
        Ok(SubmissionReceipt {
            filename: Some("shipping_orders_merged.csv".to_string()),
            content: b"No,FromName\n".to_vec(),
        })
    }
}

fn address(name: &str, order_id: Option<&str>) -> AddressRecord {
    AddressRecord {
        to_name: Some(name.to_string()),
        street1_to: Some(format!("{} Street", name)),
        city_to: Some("Springfield".to_string()),
        state_to: Some("IL".to_string()),
        zip_to: Some("62701".to_string()),
        order_id: order_id.map(str::to_string),
        ..Default::default()
    }
}

fn jane_doe() -> Extraction {
    Extraction::Single(AddressRecord {
        to_name: Some("Jane Doe".to_string()),
        street1_to: Some("1 Main St".to_string()),
        city_to: Some("Springfield".to_string()),
        state_to: Some("IL".to_string()),
        zip_to: Some("62701".to_string()),
        ..Default::default()
    })
}

fn abc() -> Extraction {
    Extraction::Multiple(vec![
        address("A", Some("A1")),
        address("B", Some("B1")),
        address("C", Some("C1")),
    ])
}

fn controller(reply: Reply) -> SessionController<FakeBackend> {
    SessionController::new(FakeBackend::replying(reply), EventBus::new(64))
}

fn current_flags(controller: &SessionController<FakeBackend>) -> Vec<bool> {
    controller
        .state()
        .addresses
        .records()
        .iter()
        .map(|r| r.current_address)
        .collect()
}

fn set_dimensions(controller: &mut SessionController<FakeBackend>, weight: &str, length: &str) {
    controller.set_field(FieldId::Weight, weight);
    controller.set_field(FieldId::Length, length);
    controller.set_field(FieldId::Width, "6");
    controller.set_field(FieldId::Height, "4");
    controller.set_field(FieldId::Description, "parts");
}

// =============================================================================
// Extraction
// =============================================================================

#[tokio::test]
async fn test_single_address_response() {
    let mut session = controller(Reply::Found(jane_doe()));

    let count = session.extract("<div>order</div>").await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(session.phase(), UiPhase::Form);

    let form = session.form();
    assert_eq!(form.to_name, "Jane Doe");
    assert_eq!(form.street1_to, "1 Main St");
    assert_eq!(form.city_to, "Springfield");
    assert_eq!(form.state_to, "IL");
    assert_eq!(form.zip_to, "62701");

    let view = session.view();
    assert!(!view.selector_visible);
    assert!(!view.navigation_enabled);
    assert_eq!(view.order_count.as_deref(), Some("1 order found"));
    assert!(view.error_message.is_none());

    assert!(session.navigate(Direction::Next).is_none());
    assert_eq!(current_flags(&session), vec![true]);
}

#[tokio::test]
async fn test_multiple_address_response_and_wraparound() {
    let mut session = controller(Reply::Found(abc()));

    assert_eq!(session.extract("<table>orders</table>").await.unwrap(), 3);
    assert_eq!(session.view().order_count.as_deref(), Some("3 orders found"));
    assert!(session.view().selector_visible);
    assert!(session.view().navigation_enabled);
    assert_eq!(session.view().selector_options.len(), 3);
    assert_eq!(session.state().cursor(), 0);
    assert_eq!(current_flags(&session), vec![true, false, false]);
    assert_eq!(session.form().to_name, "A");

    session.navigate(Direction::Next).unwrap();
    session.navigate(Direction::Next).unwrap();
    assert_eq!(session.form().to_name, "C");
    assert_eq!(current_flags(&session), vec![false, false, true]);

    let wrapped = session.navigate(Direction::Next).unwrap();
    assert_eq!((wrapped.from, wrapped.to), (2, 0));
    assert_eq!(session.form().to_name, "A");

    session.navigate(Direction::Previous).unwrap();
    assert_eq!(session.state().cursor(), 2);
}

#[tokio::test]
async fn test_addresses_forwarded_to_storage() {
    let mut session = controller(Reply::Found(abc()));
    session.extract("<html/>").await.unwrap();

    let stored = session.backend().stored.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].len(), 3);
    assert_eq!(stored[0][1].order_id.as_deref(), Some("B1"));
}

#[tokio::test]
async fn test_storage_failure_still_enters_form() {
    let mut backend = FakeBackend::replying(Reply::Found(abc()));
    backend.store_fails = true;
    let events = EventBus::new(64);
    let mut rx = events.subscribe();
    let mut session = SessionController::new(backend, events);

    session.extract("<html/>").await.unwrap();
    assert_eq!(session.phase(), UiPhase::Form);

    let mut saw_storage_failure = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, SessionEvent::AddressStorageFailed { .. }) {
            saw_storage_failure = true;
        }
    }
    assert!(saw_storage_failure);
}

#[tokio::test]
async fn test_empty_markup_sends_nothing() {
    let mut session = controller(Reply::Found(jane_doe()));

    let result = session.extract("  \n\t ").await;
    assert!(matches!(result, Err(SessionError::EmptyMarkup)));
    assert_eq!(session.backend().extract_calls(), 0);
    assert!(session.phase().shows_input());
    assert_eq!(session.view().error_message.as_deref(), Some(EMPTY_MARKUP_MESSAGE));
}

#[tokio::test]
async fn test_server_message_is_surfaced_verbatim() {
    let mut session = controller(Reply::ServerError(
        400,
        Some("Could not extract shipping information from the HTML".to_string()),
    ));

    let err = session.extract("<p>nothing</p>").await.unwrap_err();
    assert_eq!(err.to_string(), "Could not extract shipping information from the HTML");
    assert_eq!(session.phase(), UiPhase::Error);
    assert!(session.phase().shows_input());
    assert_eq!(session.markup(), "<p>nothing</p>");
}

#[tokio::test]
async fn test_generic_message_without_server_text() {
    for reply in [Reply::NetworkDown, Reply::ServerError(500, None)] {
        let mut session = controller(reply);
        let err = session.extract("<p/>").await.unwrap_err();
        assert!(matches!(err, SessionError::Extraction(ref m) if m == GENERIC_EXTRACTION_MESSAGE));
        assert_eq!(
            session.view().error_message.as_deref(),
            Some(GENERIC_EXTRACTION_MESSAGE)
        );
    }
}

#[tokio::test]
async fn test_retry_after_error_succeeds() {
    let mut session = controller(Reply::NetworkDown);
    assert!(session.extract("<p/>").await.is_err());

    session.backend().set_reply(Reply::Found(jane_doe()));
    assert_eq!(session.extract("<p/>").await.unwrap(), 1);
    assert_eq!(session.phase(), UiPhase::Form);
    assert!(session.view().error_message.is_none());
}

#[tokio::test]
async fn test_second_start_while_loading_is_busy() {
    let mut session = controller(Reply::Found(jane_doe()));

    let markup = session.begin_extraction("  <div/>  ").unwrap();
    assert_eq!(markup, "<div/>");
    assert_eq!(session.phase(), UiPhase::Loading);

    assert!(matches!(session.begin_extraction("<div/>"), Err(SessionError::Busy)));
    assert_eq!(session.backend().extract_calls(), 0);
}

#[tokio::test]
async fn test_extract_from_form_requires_reset() {
    let mut session = controller(Reply::Found(jane_doe()));
    session.extract("<div/>").await.unwrap();

    let result = session.extract("<div/>").await;
    assert!(matches!(result, Err(SessionError::WrongPhase(UiPhase::Form))));
    assert_eq!(session.backend().extract_calls(), 1);
}

#[tokio::test]
async fn test_phase_events_in_order() {
    let events = EventBus::new(64);
    let mut rx = events.subscribe();
    let backend = FakeBackend::replying(Reply::Found(jane_doe()));
    let mut session = SessionController::new(backend, events);

    session.extract("<div/>").await.unwrap();

    let mut phases = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SessionEvent::PhaseChanged { old_phase, new_phase, .. } = event {
            phases.push((old_phase, new_phase));
        }
    }
    assert_eq!(
        phases,
        vec![
            (UiPhase::Input, UiPhase::Loading),
            (UiPhase::Loading, UiPhase::Form)
        ]
    );
}

// =============================================================================
// Dimension cache
// =============================================================================

#[tokio::test]
async fn test_dimensions_follow_their_order() {
    let mut session = controller(Reply::Found(abc()));
    session.extract("<html/>").await.unwrap();

    session.navigate(Direction::Next).unwrap();
    assert_eq!(session.form().order_id, "B1");
    set_dimensions(&mut session, "2", "12");

    session.navigate(Direction::Next).unwrap();
    assert_eq!(session.form().order_id, "C1");
    set_dimensions(&mut session, "9", "30");

    session.navigate(Direction::Previous).unwrap();
    assert_eq!(session.form().order_id, "B1");
    assert_eq!(session.form().weight, "2");
    assert_eq!(session.form().length, "12");
    assert_eq!(session.form().description, "parts");
}

#[tokio::test]
async fn test_selector_saves_dimensions_too() {
    let mut session = controller(Reply::Found(abc()));
    session.extract("<html/>").await.unwrap();

    set_dimensions(&mut session, "3", "10");
    session.select(2).unwrap();
    set_dimensions(&mut session, "8", "20");
    session.select(0).unwrap();

    assert_eq!(session.form().weight, "3");
    assert!(session.select(3).is_none());
}

#[tokio::test]
async fn test_new_extraction_clears_positional_dimensions() {
    let unkeyed = Extraction::Multiple(vec![address("A", None), address("B", None)]);
    let mut session = controller(Reply::Found(unkeyed.clone()));
    session.extract("<html/>").await.unwrap();
    let first_session = session.session_id().unwrap();

    set_dimensions(&mut session, "5", "50");
    session.navigate(Direction::Next).unwrap();
    assert!(session.state().dimensions.load("0").is_some());

    session.reset();
    assert!(session.state().dimensions.is_empty());
    assert!(session.state().addresses.is_empty());
    assert_eq!(session.phase(), UiPhase::Input);
    assert!(session.view().order_count.is_none());
    assert!(session.session_id().is_none());

    session.extract("<html/>").await.unwrap();
    assert!(session.state().dimensions.load("0").is_none());
    assert_ne!(session.session_id(), Some(first_session));
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_rejects_blank_required_field() {
    let mut session = controller(Reply::Found(jane_doe()));
    session.extract("<div/>").await.unwrap();
    set_dimensions(&mut session, "1", "10");
    session.set_field(FieldId::Height, " ");

    let err = session.submit().await.unwrap_err();
    match err {
        SessionError::Validation { missing } => assert_eq!(missing, vec![FieldId::Height]),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(session.view().invalid_fields.contains(&FieldId::Height));
    assert!(session.backend().submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_merged_orders_with_same_dimensions() {
    let mut session = controller(Reply::Found(abc()));
    session.extract("<html/>").await.unwrap();
    session.navigate(Direction::Next).unwrap();
    set_dimensions(&mut session, "4", "16");
    session.set_merge_orders(true);
    session.set_same_dimensions(true);

    let receipt = session.submit().await.unwrap();
    assert_eq!(receipt.filename_or_default(), "shipping_orders_merged.csv");

    let submitted = session.backend().submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    let payload = &submitted[0];
    assert_eq!(payload.get("order_id"), Some("B1"));
    assert_eq!(payload.get("Weight"), Some("4"));
    assert_eq!(payload.get("merge_orders"), Some("on"));
    assert_eq!(payload.get("same_dimensions"), Some("on"));
    assert_eq!(payload.get("address[0][current_address]"), Some("false"));
    assert_eq!(payload.get("address[1][current_address]"), Some("true"));
    assert_eq!(payload.get("address[2][current_address]"), Some("false"));

    assert_eq!(session.state().dimensions.load("B1").unwrap().weight, "4");
}

#[tokio::test]
async fn test_submit_without_merge_omits_directive() {
    let mut session = controller(Reply::Found(abc()));
    session.extract("<html/>").await.unwrap();
    set_dimensions(&mut session, "4", "16");
    session.set_same_dimensions(true);

    let payload = session.prepare_submission().unwrap();
    assert!(!payload.contains("same_dimensions"));
    assert!(!payload.contains("merge_orders"));
}

#[tokio::test]
async fn test_submit_outside_form_phase() {
    let mut session = controller(Reply::Found(jane_doe()));
    assert!(matches!(
        session.prepare_submission(),
        Err(SessionError::WrongPhase(UiPhase::Input))
    ));
}

#[tokio::test]
async fn test_live_feedback_on_required_fields() {
    let mut session = controller(Reply::Found(jane_doe()));
    session.extract("<div/>").await.unwrap();

    session.set_field(FieldId::ZipTo, "");
    assert!(session.view().invalid_fields.contains(&FieldId::ZipTo));
    session.set_field(FieldId::ZipTo, "62702");
    assert!(!session.view().invalid_fields.contains(&FieldId::ZipTo));

    session.set_field(FieldId::PhoneTo, "");
    assert!(!session.view().invalid_fields.contains(&FieldId::PhoneTo));
}
