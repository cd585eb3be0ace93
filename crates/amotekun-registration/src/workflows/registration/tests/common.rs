use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::workflows::registration::api::{
    RegistrationApi, RegistrationPayload, SubmissionError, SubmissionResult,
};
use crate::workflows::registration::domain::FieldName;
use crate::workflows::registration::photo::{
    CompressedPhoto, CompressionOptions, PhotoCompressor, PhotoError,
};
use crate::workflows::registration::policy::RegistrationPolicy;
use crate::workflows::registration::slip::{RegistrationSlip, SlipError, SlipSink};
use crate::workflows::registration::workflow::RegistrationWorkflow;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 25).expect("valid date")
}

pub(super) fn policy() -> RegistrationPolicy {
    RegistrationPolicy::default()
}

pub(super) fn open_workflow() -> RegistrationWorkflow {
    RegistrationWorkflow::mount(policy(), today(), false)
}

pub(super) fn closed_workflow() -> RegistrationWorkflow {
    RegistrationWorkflow::mount(policy(), today(), true)
}

/// Every required answer filled in with valid values.
pub(super) fn complete_answers() -> Vec<(FieldName, &'static str)> {
    vec![
        (FieldName::FullName, "adebayo john oluwaseun"),
        (FieldName::PhoneNumber, "08012345678"),
        (FieldName::DateOfBirth, "1996-07-14"),
        (FieldName::Gender, "Male"),
        (FieldName::Lga, "Ibadan North"),
        (FieldName::HomeAddress, "12 Ring Road, Ibadan"),
        (FieldName::Qualification, "OND"),
        (FieldName::HasSecurityExp, "Yes"),
        (FieldName::OrganizationName, "Nigeria Police Force"),
        (FieldName::MembershipDuration, "3 years 2 months"),
        (FieldName::SpecialSkill, "First Aid, Driving"),
    ]
}

pub(super) fn filled_workflow() -> RegistrationWorkflow {
    let mut workflow = open_workflow();
    for (field, value) in complete_answers() {
        workflow
            .update_field(field, value)
            .expect("fixture answers are accepted");
    }
    workflow
        .update_field(FieldName::Declaration, true)
        .expect("declaration accepted");
    workflow
}

pub(super) fn reviewing_workflow() -> RegistrationWorkflow {
    let mut workflow = filled_workflow();
    workflow.request_review().expect("complete draft reviews");
    workflow
}

pub(super) fn slip_response(form_number: &str) -> SubmissionResult {
    SubmissionResult::from_parts(
        Some(format!("attachment; filename=\"Amotekun-{form_number}.pdf\"").as_str()),
        Some("application/pdf".to_string()),
        b"%PDF-1.4 registration slip".to_vec(),
    )
}

pub(super) fn rejection(message: &str) -> SubmissionError {
    SubmissionError::Rejected {
        status: 400,
        message: message.to_string(),
    }
}

/// API double that replays scripted outcomes and records every call.
#[derive(Default)]
pub(super) struct ScriptedApi {
    outcomes: Mutex<VecDeque<Result<SubmissionResult, SubmissionError>>>,
    calls: AtomicUsize,
    payloads: Mutex<Vec<RegistrationPayload>>,
}

impl ScriptedApi {
    pub(super) fn with(outcomes: Vec<Result<SubmissionResult, SubmissionError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_payload(&self) -> Option<RegistrationPayload> {
        self.payloads
            .lock()
            .expect("payload mutex poisoned")
            .last()
            .cloned()
    }
}

#[async_trait]
impl RegistrationApi for ScriptedApi {
    async fn submit(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<SubmissionResult, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .lock()
            .expect("payload mutex poisoned")
            .push(payload.clone());
        self.outcomes
            .lock()
            .expect("outcome mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(SubmissionError::Transport("no scripted outcome".to_string())))
    }
}

/// Sink that keeps delivered slips in memory.
#[derive(Default, Clone)]
pub(super) struct MemorySink {
    delivered: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    failing: bool,
}

impl MemorySink {
    pub(super) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(super) fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered.lock().expect("sink mutex poisoned").clone()
    }
}

#[async_trait]
impl SlipSink for MemorySink {
    async fn deliver(&self, slip: &RegistrationSlip) -> Result<PathBuf, SlipError> {
        let path = PathBuf::from("downloads").join(&slip.file_name);
        if self.failing {
            return Err(SlipError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.delivered
            .lock()
            .expect("sink mutex poisoned")
            .push((slip.file_name.clone(), slip.document().to_vec()));
        Ok(path)
    }
}

pub(super) fn small_photo(marker: u8) -> CompressedPhoto {
    CompressedPhoto {
        bytes: vec![0xFF, 0xD8, marker, 0xFF, 0xD9],
        content_type: mime::IMAGE_JPEG,
        width: 4,
        height: 4,
    }
}

/// Compressor returning a fixed outcome without decoding anything.
pub(super) struct FixedCompressor {
    pub(super) marker: Option<u8>,
}

#[async_trait]
impl PhotoCompressor for FixedCompressor {
    async fn compress(
        &self,
        _bytes: Vec<u8>,
        _options: CompressionOptions,
    ) -> Result<CompressedPhoto, PhotoError> {
        match self.marker {
            Some(marker) => Ok(small_photo(marker)),
            None => Err(PhotoError::UnsupportedFormat),
        }
    }
}
