use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{ApplicationDraft, FormNumber, SecurityBackground};
use crate::config::ApiConfig;

/// Shown when a rejected submission carries no explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Registration failed. Please try again.";

static FORM_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Amotekun-(AMO-\d+)").expect("invalid form number regex"));

/// JSON body accepted by `POST /api/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload {
    pub full_name: String,
    pub phone_number: String,
    pub date_of_birth: String,
    pub gender: String,
    pub lga: String,
    pub home_address: String,
    pub qualification: String,
    pub has_security_exp: String,
    pub organization_name: String,
    pub membership_duration: String,
    pub special_skill: String,
    pub other_info: String,
    pub passport_photo: String,
    pub declaration: bool,
}

impl From<&ApplicationDraft> for RegistrationPayload {
    fn from(draft: &ApplicationDraft) -> Self {
        let (organization_name, membership_duration) = match draft.security_background() {
            Some(SecurityBackground::HasExperience {
                organization_name,
                membership_duration,
            }) => (organization_name, membership_duration),
            Some(SecurityBackground::NoExperience) | None => (String::new(), String::new()),
        };

        Self {
            full_name: draft.full_name.clone(),
            phone_number: draft.phone_number.clone(),
            date_of_birth: draft
                .date_of_birth
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            gender: draft
                .gender
                .map(|gender| gender.label().to_string())
                .unwrap_or_default(),
            lga: draft
                .lga
                .map(|lga| lga.label().to_string())
                .unwrap_or_default(),
            home_address: draft.home_address.clone(),
            qualification: draft.qualification.clone(),
            has_security_exp: draft
                .security_experience
                .map(|answer| answer.label().to_string())
                .unwrap_or_default(),
            organization_name,
            membership_duration,
            special_skill: draft.special_skill.clone(),
            other_info: draft.other_info.clone(),
            passport_photo: draft.passport_photo.clone().unwrap_or_default(),
            declaration: draft.declaration,
        }
    }
}

/// Generated document returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub form_number: FormNumber,
    pub content_type: Option<String>,
    pub document: Vec<u8>,
}

impl SubmissionResult {
    /// Assembles the result from response parts. A missing or unrecognised
    /// disposition header degrades to the placeholder form number.
    pub fn from_parts(
        disposition: Option<&str>,
        content_type: Option<String>,
        document: Vec<u8>,
    ) -> Self {
        let form_number = match disposition.and_then(extract_form_number) {
            Some(form_number) => form_number,
            None => {
                warn!(
                    disposition = disposition.unwrap_or(""),
                    "response carried no form number; using placeholder"
                );
                FormNumber::placeholder()
            }
        };

        Self {
            form_number,
            content_type,
            document,
        }
    }
}

/// Pulls `AMO-<digits>` out of a `Content-Disposition` value such as
/// `attachment; filename="Amotekun-AMO-00042.pdf"`.
pub fn extract_form_number(disposition: &str) -> Option<FormNumber> {
    FORM_NUMBER_RE
        .captures(disposition)
        .and_then(|captures| captures.get(1))
        .map(|token| FormNumber(token.as_str().to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Message to surface for a rejected submission: the server's `error`
/// string verbatim, or the generic fallback.
pub fn failure_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("unable to reach the registration service: {0}")]
    Transport(String),
    #[error("registration response could not be read: {0}")]
    Body(String),
}

/// Remote endpoint that turns a payload into a registration slip.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn submit(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<SubmissionResult, SubmissionError>;
}

/// `RegistrationApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistrationApi {
    client: Client,
    register_url: String,
}

impl HttpRegistrationApi {
    pub fn new(config: &ApiConfig) -> Result<Self, SubmissionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            register_url: config.register_url(),
        })
    }

    pub fn register_url(&self) -> &str {
        &self.register_url
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn submit(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<SubmissionResult, SubmissionError> {
        let response = self
            .client
            .post(&self.register_url)
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let status = response.status();
        let disposition = header_value(&response, CONTENT_DISPOSITION);
        let content_type = header_value(&response, CONTENT_TYPE);
        let body = response
            .bytes()
            .await
            .map_err(|err| SubmissionError::Body(err.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "registration response");

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: failure_message(&body),
            });
        }

        Ok(SubmissionResult::from_parts(
            disposition.as_deref(),
            content_type,
            body.to_vec(),
        ))
    }
}

fn header_value(
    response: &reqwest::Response,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
