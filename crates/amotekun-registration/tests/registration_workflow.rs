//! End-to-end registration scenarios against a local stand-in for the
//! registration API, exercising the HTTP client and the filesystem slip sink
//! through the public workflow facade.

mod common {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use amotekun_registration::config::ApiConfig;
    use amotekun_registration::workflows::registration::{
        FieldName, RegistrationPolicy, RegistrationWorkflow,
    };
    use axum::extract::State;
    use axum::http::{header, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    pub(super) const DUPLICATE_PHONE: &str = "08099999999";

    pub(super) type Received = Arc<Mutex<Vec<Value>>>;

    async fn register(State(received): State<Received>, Json(body): Json<Value>) -> Response {
        received
            .lock()
            .expect("payload mutex poisoned")
            .push(body.clone());

        if body["phoneNumber"] == DUPLICATE_PHONE {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Phone number already registered" })),
            )
                .into_response();
        }
        if body["fullName"] == "" {
            return (StatusCode::BAD_REQUEST, "missing name").into_response();
        }

        (
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"Amotekun-AMO-00123.pdf\"",
                ),
            ],
            b"%PDF-1.4 stub slip".to_vec(),
        )
            .into_response()
    }

    /// Serves `POST /api/register` on an ephemeral port.
    pub(super) async fn spawn_registration_api() -> (ApiConfig, Received) {
        let received = Received::default();
        let app = Router::new()
            .route("/api/register", post(register))
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server runs");
        });

        (api_config(addr), received)
    }

    pub(super) fn api_config(addr: SocketAddr) -> ApiConfig {
        ApiConfig {
            base_url: format!("http://{addr}"),
            timeout: Duration::from_secs(5),
        }
    }

    pub(super) fn reviewed_workflow(phone_number: &str) -> RegistrationWorkflow {
        let today = NaiveDate::from_ymd_opt(2026, 2, 25).expect("valid date");
        let mut workflow = RegistrationWorkflow::mount(RegistrationPolicy::default(), today, false);
        let answers = [
            (FieldName::FullName, "folake adeyemi"),
            (FieldName::PhoneNumber, phone_number),
            (FieldName::DateOfBirth, "1999-11-02"),
            (FieldName::Gender, "Female"),
            (FieldName::Lga, "Ogbomosho North"),
            (FieldName::HomeAddress, "4 Takie Road, Ogbomoso"),
            (FieldName::HasSecurityExp, "No"),
            (FieldName::OrganizationName, "Vigilante Group of Nigeria"),
        ];
        for (field, value) in answers {
            workflow
                .update_field(field, value)
                .expect("answer accepted");
        }
        workflow
            .update_field(FieldName::Declaration, true)
            .expect("declaration accepted");
        workflow.request_review().expect("draft is valid");
        workflow
    }
}

use amotekun_registration::workflows::registration::{
    DirectorySlipSink, HttpRegistrationApi, RegistrationApi, RegistrationPayload, SubmissionError,
    WorkflowError, WorkflowState,
};
use common::*;

#[tokio::test]
async fn submission_downloads_slip_named_after_form_number() {
    let (config, received) = spawn_registration_api().await;
    let api = HttpRegistrationApi::new(&config).expect("client builds");
    let downloads = tempfile::tempdir().expect("temp dir");
    let sink = DirectorySlipSink::new(downloads.path().join("slips"));

    let mut workflow = reviewed_workflow("08031234567");
    let slip = workflow
        .confirm_submit(&api, &sink)
        .await
        .expect("registration accepted");
    assert_eq!(slip.form_number.0, "AMO-00123");
    assert_eq!(slip.file_name, "AMO-00123_FOLAKE_ADEYEMI.pdf");
    assert_eq!(workflow.state(), WorkflowState::Completed);

    let saved = workflow
        .saved_slip_path()
        .expect("slip saved to disk")
        .clone();
    assert_eq!(
        saved,
        downloads.path().join("slips").join("AMO-00123_FOLAKE_ADEYEMI.pdf")
    );
    let contents = std::fs::read(&saved).expect("slip readable");
    assert_eq!(contents, b"%PDF-1.4 stub slip");

    let payloads = received.lock().expect("payload mutex poisoned").clone();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["fullName"], "FOLAKE ADEYEMI");
    assert_eq!(payloads[0]["hasSecurityExp"], "No");
    assert_eq!(payloads[0]["organizationName"], "");
    assert_eq!(payloads[0]["declaration"], true);
}

#[tokio::test]
async fn rejection_surfaces_server_message_and_keeps_draft() {
    let (config, received) = spawn_registration_api().await;
    let api = HttpRegistrationApi::new(&config).expect("client builds");
    let downloads = tempfile::tempdir().expect("temp dir");
    let sink = DirectorySlipSink::new(downloads.path());

    let mut workflow = reviewed_workflow(DUPLICATE_PHONE);
    let draft = workflow.draft().clone();

    match workflow.confirm_submit(&api, &sink).await {
        Err(WorkflowError::Submission(SubmissionError::Rejected { status, message })) => {
            assert_eq!(status, 409);
            assert_eq!(message, "Phone number already registered");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    assert_eq!(workflow.state(), WorkflowState::SubmissionFailed);
    assert_eq!(
        workflow.submit_error(),
        Some("Phone number already registered")
    );
    assert_eq!(workflow.draft(), &draft);
    assert!(workflow.slip().is_none());
    assert_eq!(received.lock().expect("payload mutex poisoned").len(), 1);
    assert_eq!(
        std::fs::read_dir(downloads.path())
            .expect("dir listing")
            .count(),
        0
    );
}

#[tokio::test]
async fn unexplained_rejection_uses_generic_message() {
    let (config, _received) = spawn_registration_api().await;
    let api = HttpRegistrationApi::new(&config).expect("client builds");

    let workflow = reviewed_workflow("08031234567");
    let mut payload = RegistrationPayload::from(workflow.draft());
    payload.full_name.clear();

    match api.submit(&payload).await {
        Err(SubmissionError::Rejected { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Registration failed. Please try again.");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_reported_as_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);

    let api = HttpRegistrationApi::new(&api_config(addr)).expect("client builds");
    let downloads = tempfile::tempdir().expect("temp dir");
    let sink = DirectorySlipSink::new(downloads.path());

    let mut workflow = reviewed_workflow("08031234567");
    match workflow.confirm_submit(&api, &sink).await {
        Err(WorkflowError::Submission(SubmissionError::Transport(_))) => {}
        other => panic!("expected transport failure, got {other:?}"),
    }
    assert_eq!(workflow.state(), WorkflowState::SubmissionFailed);
    assert!(workflow
        .submit_error()
        .expect("message shown")
        .starts_with("unable to reach the registration service"));
}
