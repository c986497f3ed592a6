use std::cell::RefCell;

use async_trait::async_trait;
use form_dom::{Field, FieldKind, FormDocument, StepView};
use shared::{
    domain::{LocalRejection, SelectedFile, SubmissionMode, SubmissionOutcome},
    error::TransportError,
    protocol::SubmissionPayload,
};

use crate::{
    config::{WizardSettings, NETWORK_ERROR_MESSAGE},
    controller::{SubmitStart, WizardController},
    effects::{NoticeKind, ViewEffect},
    transport::{MissingTransport, SubmissionTransport, TransportResponse},
};

const MIB: u64 = 1024 * 1024;

struct ScriptedTransport {
    reply: Result<TransportResponse, TransportError>,
    requests: RefCell<Vec<(String, SubmissionPayload)>>,
}

impl ScriptedTransport {
    fn status(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(TransportResponse::new(status, body.as_bytes())),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn unreachable() -> Self {
        Self {
            reply: Err(TransportError::new("connection refused")),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl SubmissionTransport for ScriptedTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: SubmissionPayload,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .borrow_mut()
            .push((endpoint.to_string(), payload));
        self.reply.clone()
    }
}

fn three_step_form() -> FormDocument {
    FormDocument::new(vec![
        StepView::titled("Contact").with_field(Field::text("full_name").required()),
        StepView::titled("Payment")
            .with_field(Field::select(
                "payment_method",
                vec!["direct-deposit".into(), "paper-check".into(), "ffg-card".into()],
            ))
            .with_field(Field::new("routing_number", FieldKind::Text)),
        StepView::titled("Documents")
            .with_field(Field::email("email").required())
            .with_field(Field::file("bank_statement")),
    ])
    .with_success("formSuccess")
}

fn wizard<T: SubmissionTransport>(transport: T) -> WizardController<T> {
    WizardController::new(three_step_form(), WizardSettings::default(), transport)
}

fn walk_to_last_step<T: SubmissionTransport>(controller: &mut WizardController<T>) {
    controller
        .document_mut()
        .set_value("full_name", "Ada Lovelace")
        .expect("name");
    assert!(controller.go_next());
    assert!(controller.go_next());
    controller
        .document_mut()
        .set_value("email", "ada@example.org")
        .expect("email");
    assert!(controller.is_last_step());
    controller.drain_effects();
}

fn notices(effects: &[ViewEffect]) -> Vec<(NoticeKind, String)> {
    effects
        .iter()
        .filter_map(ViewEffect::notice)
        .map(|notice| (notice.kind, notice.message.clone()))
        .collect()
}

#[test]
fn construction_shows_only_the_first_step() {
    let controller = wizard(MissingTransport);
    assert_eq!(controller.current_step(), 0);
    assert_eq!(controller.document().visible_steps(), vec![0]);
    assert_eq!(
        controller.pending_effects(),
        &[ViewEffect::StepShown { index: 0 }]
    );
    assert_eq!(controller.document().sections().len(), 3);
}

#[test]
fn show_step_leaves_exactly_one_step_visible() {
    let mut controller = wizard(MissingTransport);
    for index in [2, 0, 1, 1] {
        controller.show_step(index);
        assert_eq!(controller.document().visible_steps(), vec![index]);
    }
    controller.show_step(7);
    assert_eq!(controller.document().visible_steps(), vec![1]);
}

#[test]
fn next_is_blocked_until_required_field_is_filled() {
    let mut controller = wizard(MissingTransport);
    controller.drain_effects();

    assert!(!controller.go_next());
    assert_eq!(controller.current_step(), 0);
    assert_eq!(
        controller.drain_effects(),
        vec![ViewEffect::FieldMessage {
            step: 0,
            field: "full_name".into(),
            message: "Please fill out this field.".into(),
        }]
    );

    controller
        .document_mut()
        .set_value("full_name", "Ada Lovelace")
        .expect("name");
    assert!(controller.go_next());
    assert_eq!(controller.current_step(), 1);
    assert_eq!(controller.document().visible_steps(), vec![1]);
}

#[test]
fn validation_stops_at_the_first_invalid_field() {
    let document = FormDocument::new(vec![StepView::new()
        .with_field(Field::text("first").required())
        .with_field(Field::text("second").required())]);
    let mut controller =
        WizardController::new(document, WizardSettings::default(), MissingTransport);
    controller.drain_effects();

    assert!(!controller.validate_step(0));
    let effects = controller.drain_effects();
    assert_eq!(effects.len(), 1);
    assert!(matches!(
        &effects[0],
        ViewEffect::FieldMessage { field, .. } if field == "first"
    ));
}

#[test]
fn required_radio_group_blocks_next_until_answered() {
    let document = FormDocument::new(vec![
        StepView::titled("Contact")
            .with_field(Field::radio("contact_pref", "email").required())
            .with_field(Field::radio("contact_pref", "phone")),
        StepView::titled("Documents").with_field(Field::file("bank_statement")),
    ]);
    let mut controller =
        WizardController::new(document, WizardSettings::default(), MissingTransport);
    controller.drain_effects();

    assert!(!controller.go_next());
    assert_eq!(controller.current_step(), 0);
    assert_eq!(
        controller.drain_effects(),
        vec![ViewEffect::FieldMessage {
            step: 0,
            field: "contact_pref".into(),
            message: "Please select one of these options.".into(),
        }]
    );

    controller
        .document_mut()
        .select_radio("contact_pref", "phone")
        .expect("phone option");
    assert!(controller.go_next());
    assert_eq!(controller.current_step(), 1);

    let payload = controller.document().form_data();
    assert_eq!(payload.text("contact_pref"), Some("phone"));
}

#[test]
fn navigation_stays_within_bounds() {
    let mut controller = wizard(MissingTransport);
    assert!(!controller.go_previous());
    assert_eq!(controller.current_step(), 0);

    walk_to_last_step(&mut controller);
    assert!(!controller.go_next());
    assert_eq!(controller.current_step(), 2);

    assert!(controller.go_previous());
    assert!(controller.go_previous());
    assert!(!controller.go_previous());
    assert_eq!(controller.current_step(), 0);
}

#[test]
fn previous_does_not_validate() {
    let mut controller = wizard(MissingTransport);
    walk_to_last_step(&mut controller);
    controller
        .document_mut()
        .set_value("email", "not an email")
        .expect("email");

    assert!(controller.go_previous());
    assert_eq!(controller.current_step(), 1);
    assert!(!controller
        .drain_effects()
        .iter()
        .any(|effect| matches!(effect, ViewEffect::FieldMessage { .. })));
}

#[test]
fn empty_wizard_is_inert() {
    let mut controller = WizardController::new(
        FormDocument::new(Vec::new()),
        WizardSettings::default(),
        MissingTransport,
    );
    assert!(controller.drain_effects().is_empty());
    assert!(!controller.go_next());
    assert!(!controller.go_previous());
    controller.show_step(0);
    assert_eq!(controller.current_step(), 0);
    assert!(controller.drain_effects().is_empty());
}

#[test]
fn payment_toggle_keeps_a_single_section_visible() {
    let mut controller = wizard(MissingTransport);

    assert_eq!(
        controller.toggle_payment_section("direct-deposit").as_deref(),
        Some("direct-deposit-section")
    );
    assert_eq!(
        controller.document().visible_sections(),
        vec!["direct-deposit-section"]
    );

    assert_eq!(
        controller.toggle_payment_section("ffg-card").as_deref(),
        Some("ffg-card-section")
    );
    assert_eq!(
        controller.document().visible_sections(),
        vec!["ffg-card-section"]
    );

    assert_eq!(controller.toggle_payment_section("bitcoin"), None);
    assert!(controller.document().visible_sections().is_empty());
}

#[test]
fn payment_toggle_hides_before_showing() {
    let mut controller = wizard(MissingTransport);
    controller.drain_effects();
    controller.toggle_payment_section("paper-check");

    let effects = controller.drain_effects();
    let shown_at = effects
        .iter()
        .position(|effect| {
            matches!(effect, ViewEffect::SectionVisibility { visible: true, .. })
        })
        .expect("section shown");
    assert_eq!(shown_at, effects.len() - 1);
    assert_eq!(
        effects
            .iter()
            .filter(|effect| matches!(effect, ViewEffect::SectionVisibility { visible: false, .. }))
            .count(),
        3
    );
}

#[test]
fn file_check_rejects_only_strictly_larger_files() {
    let mut controller = wizard(MissingTransport);
    controller
        .document_mut()
        .select_files(
            "bank_statement",
            vec![
                SelectedFile::metadata("exact.pdf", 5 * MIB),
                SelectedFile::metadata("huge.pdf", 5 * MIB + 1),
                SelectedFile::metadata("also-huge.pdf", 9 * MIB),
            ],
        )
        .expect("files");

    assert!(controller.check_file_constraints(2, 9 * MIB).is_ok());
    let violation = controller
        .check_file_constraints(2, 5 * MIB)
        .expect_err("oversized file");
    assert_eq!(violation.file_name, "huge.pdf");
    assert_eq!(violation.field, "bank_statement");

    let reported = notices(&controller.drain_effects());
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].0, NoticeKind::FileSize);
    assert!(reported[0].1.contains("huge.pdf"));
}

#[tokio::test]
async fn oversized_upload_on_final_step_blocks_submission() {
    let mut controller = wizard(ScriptedTransport::status(200, ""));
    walk_to_last_step(&mut controller);
    controller
        .document_mut()
        .select_files(
            "bank_statement",
            vec![SelectedFile::metadata("statement.pdf", 6 * MIB)],
        )
        .expect("file");

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    match outcome {
        SubmissionOutcome::ValidationFailure(LocalRejection::FileTooLarge(violation)) => {
            assert_eq!(violation.file_name, "statement.pdf")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(controller.transport().request_count(), 0);
    let effects = controller.drain_effects();
    assert!(notices(&effects)
        .iter()
        .any(|(kind, message)| *kind == NoticeKind::FileSize && message.contains("statement.pdf")));
    assert!(controller.document().is_submit_enabled());
    assert_eq!(controller.current_step(), 2);
}

#[tokio::test]
async fn accepted_submission_resets_the_wizard() {
    let mut controller = wizard(ScriptedTransport::status(200, r#"{"ok":true}"#));
    walk_to_last_step(&mut controller);
    controller
        .document_mut()
        .select_files(
            "bank_statement",
            vec![SelectedFile::from_bytes("statement.pdf", b"%PDF".to_vec())],
        )
        .expect("file");

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    assert_eq!(outcome, SubmissionOutcome::Success);
    assert!(!controller.document().is_form_visible());
    assert_eq!(
        controller.document().success().map(|success| success.visible),
        Some(true)
    );
    assert_eq!(controller.current_step(), 0);
    assert_eq!(controller.document().visible_steps(), vec![0]);
    assert_eq!(
        controller
            .document()
            .field("full_name")
            .map(|field| field.text_value()),
        Some("")
    );
    assert!(controller.document().is_submit_enabled());

    let requests = controller.transport().requests.borrow();
    assert_eq!(requests.len(), 1);
    let (endpoint, payload) = &requests[0];
    assert_eq!(endpoint, "/api/submit-contact");
    assert_eq!(payload.text("full_name"), Some("Ada Lovelace"));
    assert_eq!(payload.text("email"), Some("ada@example.org"));
    assert_eq!(payload.files().count(), 1);
}

#[tokio::test]
async fn accepted_submission_effects_follow_the_page_sequence() {
    let mut controller = wizard(ScriptedTransport::status(204, ""));
    walk_to_last_step(&mut controller);

    controller.submit(SubmissionMode::Asynchronous).await;

    assert_eq!(
        controller.drain_effects(),
        vec![
            ViewEffect::DefaultPrevented,
            ViewEffect::SubmitControl { enabled: false },
            ViewEffect::FormHidden,
            ViewEffect::SuccessShown {
                fade: WizardSettings::default().success_fade()
            },
            ViewEffect::FieldsReset,
            ViewEffect::StepShown { index: 0 },
            ViewEffect::SubmitControl { enabled: true },
        ]
    );
}

#[tokio::test]
async fn server_rejection_shows_body_message_and_keeps_step() {
    let mut controller = wizard(ScriptedTransport::status(500, r#"{"error":"Invalid email"}"#));
    walk_to_last_step(&mut controller);

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    assert_eq!(
        outcome,
        SubmissionOutcome::ServerError {
            status: 500,
            message: "Invalid email".into()
        }
    );
    assert_eq!(controller.current_step(), 2);
    assert!(controller.document().is_form_visible());
    assert_eq!(
        notices(&controller.drain_effects()),
        vec![(NoticeKind::Server, "Invalid email".to_string())]
    );
    assert!(controller.document().is_submit_enabled());
}

#[tokio::test]
async fn server_rejection_without_json_uses_generic_message() {
    let mut controller = wizard(ScriptedTransport::status(502, "<html>Bad Gateway</html>"));
    walk_to_last_step(&mut controller);

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    assert_eq!(
        outcome,
        SubmissionOutcome::ServerError {
            status: 502,
            message: WizardSettings::default().generic_error_message
        }
    );
}

#[tokio::test]
async fn network_failure_reports_generic_message_and_reenables_submit() {
    let mut controller = wizard(ScriptedTransport::unreachable());
    walk_to_last_step(&mut controller);

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    assert_eq!(
        outcome,
        SubmissionOutcome::NetworkError {
            message: NETWORK_ERROR_MESSAGE.into()
        }
    );
    let effects = controller.drain_effects();
    assert_eq!(
        notices(&effects),
        vec![(NoticeKind::Network, NETWORK_ERROR_MESSAGE.to_string())]
    );
    assert_eq!(
        effects.last(),
        Some(&ViewEffect::SubmitControl { enabled: true })
    );
    assert!(controller.document().is_submit_enabled());
    assert_eq!(controller.current_step(), 2);
}

#[tokio::test]
async fn invalid_current_step_is_never_sent() {
    let mut controller = wizard(ScriptedTransport::status(200, ""));
    controller.drain_effects();

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    assert!(matches!(
        outcome,
        SubmissionOutcome::ValidationFailure(LocalRejection::InvalidField(ref violation))
            if violation.field == "full_name"
    ));
    assert_eq!(controller.transport().request_count(), 0);
    assert!(controller.document().is_submit_enabled());
}

#[test]
fn second_submit_while_pending_is_ignored() {
    let mut controller = wizard(MissingTransport);
    walk_to_last_step(&mut controller);

    let pending = match controller.begin_submit(SubmissionMode::Asynchronous) {
        SubmitStart::Pending(pending) => pending,
        other => panic!("expected pending submission, got {other:?}"),
    };
    assert!(!controller.document().is_submit_enabled());
    assert_eq!(pending.payload.text("email"), Some("ada@example.org"));

    assert_eq!(
        controller.begin_submit(SubmissionMode::Asynchronous),
        SubmitStart::Settled(SubmissionOutcome::InFlight)
    );

    let outcome = controller.finish_submit(Ok(TransportResponse::new(200, Vec::new())));
    assert_eq!(outcome, SubmissionOutcome::Success);
    assert!(controller.document().is_submit_enabled());
}

#[tokio::test]
async fn navigation_mode_prevents_default_only_when_invalid() {
    let mut controller = wizard(ScriptedTransport::status(200, ""));
    controller.drain_effects();

    let blocked = controller.submit(SubmissionMode::Navigation).await;
    assert!(matches!(blocked, SubmissionOutcome::ValidationFailure(_)));
    assert!(controller
        .drain_effects()
        .contains(&ViewEffect::DefaultPrevented));

    walk_to_last_step(&mut controller);
    let allowed = controller.submit(SubmissionMode::Navigation).await;
    assert_eq!(allowed, SubmissionOutcome::NativeSubmission);
    assert!(!controller
        .drain_effects()
        .contains(&ViewEffect::DefaultPrevented));
    assert_eq!(controller.transport().request_count(), 0);
    assert!(controller.document().is_form_visible());
}

#[tokio::test]
async fn navigation_mode_checks_file_sizes_on_last_step() {
    let settings = WizardSettings::default().with_max_file_bytes(MIB);
    let mut controller =
        WizardController::new(three_step_form(), settings, ScriptedTransport::status(200, ""));
    walk_to_last_step(&mut controller);
    controller
        .document_mut()
        .select_files("bank_statement", vec![SelectedFile::metadata("scan.png", 2 * MIB)])
        .expect("file");

    let outcome = controller.submit(SubmissionMode::Navigation).await;

    assert!(matches!(
        outcome,
        SubmissionOutcome::ValidationFailure(LocalRejection::FileTooLarge(_))
    ));
    assert!(controller
        .drain_effects()
        .contains(&ViewEffect::DefaultPrevented));
}

#[tokio::test]
async fn disabled_file_limit_skips_the_size_check() {
    let settings = WizardSettings::default().with_max_file_bytes(0);
    let mut controller =
        WizardController::new(three_step_form(), settings, ScriptedTransport::status(200, ""));
    walk_to_last_step(&mut controller);
    controller
        .document_mut()
        .select_files("bank_statement", vec![SelectedFile::metadata("scan.png", 50 * MIB)])
        .expect("file");

    assert_eq!(
        controller.submit(SubmissionMode::Asynchronous).await,
        SubmissionOutcome::Success
    );
}

#[tokio::test]
async fn form_action_overrides_configured_endpoint() {
    let document = three_step_form().with_action("/api/submit-application");
    let mut controller = WizardController::new(
        document,
        WizardSettings::default(),
        ScriptedTransport::status(200, ""),
    );
    walk_to_last_step(&mut controller);

    controller.submit(SubmissionMode::Asynchronous).await;

    let requests = controller.transport().requests.borrow();
    assert_eq!(requests[0].0, "/api/submit-application");
}

#[tokio::test]
async fn missing_transport_surfaces_as_network_error() {
    let mut controller = wizard(MissingTransport);
    walk_to_last_step(&mut controller);

    let outcome = controller.submit(SubmissionMode::Asynchronous).await;

    assert!(matches!(outcome, SubmissionOutcome::NetworkError { .. }));
    assert!(controller.document().is_submit_enabled());
}
