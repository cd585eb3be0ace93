use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::api::{RegistrationApi, RegistrationPayload, SubmissionError, SubmissionResult};
use super::domain::{ApplicationDraft, FieldInputError, FieldName, FieldValue};
use super::photo::{CompressedPhoto, PhotoCompressor, PhotoError, PHOTO_FAILURE_MESSAGE};
use super::policy::RegistrationPolicy;
use super::portal::PortalSchedule;
use super::review::ReviewSummary;
use super::slip::{RegistrationSlip, SlipError, SlipSink};
use super::validation::{validate_draft, ValidationErrors};

/// Where the applicant is in the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Editing,
    Reviewing,
    Submitting,
    /// The last submission failed; the draft is intact and may be resubmitted.
    SubmissionFailed,
    Completed,
    PortalClosed,
}

impl WorkflowState {
    pub const fn label(self) -> &'static str {
        match self {
            WorkflowState::Editing => "editing",
            WorkflowState::Reviewing => "reviewing",
            WorkflowState::Submitting => "submitting",
            WorkflowState::SubmissionFailed => "submission_failed",
            WorkflowState::Completed => "completed",
            WorkflowState::PortalClosed => "portal_closed",
        }
    }

    const fn is_editable(self) -> bool {
        matches!(self, WorkflowState::Editing | WorkflowState::SubmissionFailed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("the registration portal is closed")]
    PortalClosed,
    #[error("the form cannot be edited while {state}")]
    Locked { state: WorkflowState },
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: WorkflowState,
    },
    #[error("{count} field(s) need attention, starting with {first_field}")]
    Invalid { first_field: FieldName, count: usize },
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    #[error(transparent)]
    Input(#[from] FieldInputError),
    #[error(transparent)]
    Photo(#[from] PhotoError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Slip(#[from] SlipError),
}

/// Issued by [`RegistrationWorkflow::begin_photo`]. Only the most recently
/// issued ticket may commit a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoTicket(u64);

/// Outcome of committing a compressed photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoCommit {
    Applied,
    /// A newer upload was started, or the draft is no longer editable.
    Stale,
}

/// Issued when the workflow enters `Submitting`; carries the payload to send.
#[derive(Debug)]
pub struct SubmissionTicket {
    payload: RegistrationPayload,
}

impl SubmissionTicket {
    pub fn payload(&self) -> &RegistrationPayload {
        &self.payload
    }
}

/// Owns the draft and drives it from editing to a downloaded registration
/// slip.
#[derive(Debug)]
pub struct RegistrationWorkflow {
    policy: RegistrationPolicy,
    today: NaiveDate,
    state: WorkflowState,
    draft: ApplicationDraft,
    errors: ValidationErrors,
    error_summary_visible: bool,
    submit_error: Option<String>,
    photo_preview: Option<String>,
    photo_error: Option<String>,
    photo_tickets_issued: u64,
    slip: Option<RegistrationSlip>,
    saved_slip: Option<PathBuf>,
    download_error: Option<String>,
}

impl RegistrationWorkflow {
    /// Creates an empty draft. `portal_closed` comes from the surrounding page
    /// and is not re-evaluated afterwards.
    pub fn mount(policy: RegistrationPolicy, today: NaiveDate, portal_closed: bool) -> Self {
        let state = if portal_closed {
            WorkflowState::PortalClosed
        } else {
            WorkflowState::Editing
        };
        debug!(state = %state, "registration workflow mounted");

        Self {
            policy,
            today,
            state,
            draft: ApplicationDraft::default(),
            errors: ValidationErrors::default(),
            error_summary_visible: false,
            submit_error: None,
            photo_preview: None,
            photo_error: None,
            photo_tickets_issued: 0,
            slip: None,
            saved_slip: None,
            download_error: None,
        }
    }

    /// Mounts against a schedule, reading the closed flag and the date window
    /// from `now` once.
    pub fn mount_at(
        policy: RegistrationPolicy,
        schedule: &PortalSchedule,
        now: DateTime<Utc>,
    ) -> Self {
        Self::mount(policy, now.date_naive(), schedule.is_closed(now))
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn is_portal_closed(&self) -> bool {
        self.state == WorkflowState::PortalClosed
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn policy(&self) -> &RegistrationPolicy {
        &self.policy
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// The aggregated error banner stays up until every listed field is fixed.
    pub fn error_summary_visible(&self) -> bool {
        self.error_summary_visible && !self.errors.is_empty()
    }

    pub fn first_invalid_field(&self) -> Option<FieldName> {
        self.errors.first_field()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn photo_preview(&self) -> Option<&str> {
        self.photo_preview.as_deref()
    }

    pub fn photo_error(&self) -> Option<&str> {
        self.photo_error.as_deref()
    }

    /// Slip retained after completion for reprinting.
    pub fn slip(&self) -> Option<&RegistrationSlip> {
        self.slip.as_ref()
    }

    pub fn saved_slip_path(&self) -> Option<&PathBuf> {
        self.saved_slip.as_ref()
    }

    pub fn download_error(&self) -> Option<&str> {
        self.download_error.as_deref()
    }

    pub fn success_notice(&self) -> Option<String> {
        self.slip.as_ref().map(|slip| {
            format!(
                "Registration Submitted | Form No: {}. Print your registration slip and bring it to the screening venue.",
                slip.form_number
            )
        })
    }

    pub fn update_field(
        &mut self,
        field: FieldName,
        value: impl Into<FieldValue>,
    ) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.draft.apply(field, value.into())?;

        if self.errors.clear(field) {
            debug!(%field, "cleared field error after edit");
        }
        self.return_to_editing();
        Ok(())
    }

    /// Starts a photo upload. Any upload started earlier becomes stale.
    pub fn begin_photo(&mut self) -> Result<PhotoTicket, WorkflowError> {
        self.ensure_editable()?;
        self.photo_tickets_issued += 1;
        Ok(PhotoTicket(self.photo_tickets_issued))
    }

    /// Applies a finished compression. Results for superseded tickets are
    /// dropped without touching the draft.
    pub fn commit_photo(
        &mut self,
        ticket: PhotoTicket,
        result: Result<CompressedPhoto, PhotoError>,
    ) -> Result<PhotoCommit, WorkflowError> {
        if self.is_portal_closed() {
            return Err(WorkflowError::PortalClosed);
        }
        if ticket.0 != self.photo_tickets_issued || !self.state.is_editable() {
            debug!(
                ticket = ticket.0,
                latest = self.photo_tickets_issued,
                state = %self.state,
                "discarding stale photo result"
            );
            return Ok(PhotoCommit::Stale);
        }

        match result {
            Ok(photo) => {
                let data_uri = photo.data_uri();
                info!(
                    bytes = photo.bytes.len(),
                    width = photo.width,
                    height = photo.height,
                    "passport photo attached"
                );
                self.draft.passport_photo = Some(data_uri.clone());
                self.photo_preview = Some(data_uri);
                self.photo_error = None;
                self.errors.clear(FieldName::PassportPhoto);
                self.return_to_editing();
                Ok(PhotoCommit::Applied)
            }
            Err(err) => {
                warn!(error = %err, "passport photo rejected");
                self.photo_error = Some(PHOTO_FAILURE_MESSAGE.to_string());
                Err(WorkflowError::Photo(err))
            }
        }
    }

    pub async fn attach_photo<C>(
        &mut self,
        bytes: Vec<u8>,
        compressor: &C,
    ) -> Result<PhotoCommit, WorkflowError>
    where
        C: PhotoCompressor + ?Sized,
    {
        let ticket = self.begin_photo()?;
        let result = compressor.compress(bytes, self.policy.compression).await;
        self.commit_photo(ticket, result)
    }

    /// Recomputes every rule from scratch.
    pub fn validate(&mut self) -> &ValidationErrors {
        self.errors = validate_draft(&self.draft, &self.policy, self.today);
        self.error_summary_visible = !self.errors.is_empty();
        &self.errors
    }

    pub fn request_review(&mut self) -> Result<ReviewSummary, WorkflowError> {
        if self.is_portal_closed() {
            return Err(WorkflowError::PortalClosed);
        }
        if !self.state.is_editable() {
            return Err(WorkflowError::InvalidTransition {
                action: "review the application",
                state: self.state,
            });
        }

        self.submit_error = None;
        self.state = WorkflowState::Editing;

        let errors = self.validate();
        if let Some(first_field) = errors.first_field() {
            let count = errors.len();
            info!(count, %first_field, "review blocked by validation errors");
            return Err(WorkflowError::Invalid { first_field, count });
        }

        self.state = WorkflowState::Reviewing;
        info!("application ready for review");
        Ok(ReviewSummary::from_draft(&self.draft))
    }

    /// Summary for the confirmation surface while it is showing.
    pub fn review_summary(&self) -> Option<ReviewSummary> {
        match self.state {
            WorkflowState::Reviewing
            | WorkflowState::Submitting
            | WorkflowState::SubmissionFailed => Some(ReviewSummary::from_draft(&self.draft)),
            _ => None,
        }
    }

    pub fn cancel_review(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            WorkflowState::Reviewing | WorkflowState::SubmissionFailed => {
                self.state = WorkflowState::Editing;
                Ok(())
            }
            WorkflowState::PortalClosed => Err(WorkflowError::PortalClosed),
            state => Err(WorkflowError::InvalidTransition {
                action: "leave review",
                state,
            }),
        }
    }

    /// Moves to `Submitting` and hands back the payload to send. A second call
    /// before the first finishes is refused.
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, WorkflowError> {
        match self.state {
            WorkflowState::Reviewing | WorkflowState::SubmissionFailed => {}
            WorkflowState::Submitting => return Err(WorkflowError::SubmissionInFlight),
            WorkflowState::PortalClosed => return Err(WorkflowError::PortalClosed),
            state => {
                return Err(WorkflowError::InvalidTransition {
                    action: "submit",
                    state,
                })
            }
        }

        self.submit_error = None;
        self.state = WorkflowState::Submitting;
        info!("submitting registration");

        Ok(SubmissionTicket {
            payload: RegistrationPayload::from(&self.draft),
        })
    }

    /// Records the API outcome. On success the slip is delivered to `sink`
    /// and retained, and the draft is discarded; a failed delivery does not
    /// undo the registration.
    pub async fn finish_submission<S>(
        &mut self,
        result: Result<SubmissionResult, SubmissionError>,
        sink: &S,
    ) -> Result<&RegistrationSlip, WorkflowError>
    where
        S: SlipSink + ?Sized,
    {
        if self.state != WorkflowState::Submitting {
            return Err(WorkflowError::InvalidTransition {
                action: "finish a submission",
                state: self.state,
            });
        }
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "registration submission failed");
                self.submit_error = Some(err.to_string());
                self.state = WorkflowState::SubmissionFailed;
                return Err(WorkflowError::Submission(err));
            }
        };

        let slip = RegistrationSlip::new(result, &self.draft.full_name);
        match sink.deliver(&slip).await {
            Ok(path) => {
                self.saved_slip = Some(path);
                self.download_error = None;
            }
            Err(err) => {
                warn!(error = %err, form_number = %slip.form_number, "slip download failed");
                self.download_error = Some(err.to_string());
            }
        }

        info!(form_number = %slip.form_number, "registration completed");
        self.draft = ApplicationDraft::default();
        self.photo_preview = None;
        self.state = WorkflowState::Completed;
        Ok(self.slip.insert(slip))
    }

    /// Issues exactly one API request for the reviewed draft.
    pub async fn confirm_submit<A, S>(
        &mut self,
        api: &A,
        sink: &S,
    ) -> Result<&RegistrationSlip, WorkflowError>
    where
        A: RegistrationApi + ?Sized,
        S: SlipSink + ?Sized,
    {
        let ticket = self.begin_submission()?;
        let result = api.submit(ticket.payload()).await;
        self.finish_submission(result, sink).await
    }

    pub fn dismiss_submit_error(&mut self) {
        self.submit_error = None;
    }

    /// Delivers the retained slip again without contacting the API.
    pub async fn resave_slip<S>(&mut self, sink: &S) -> Result<PathBuf, WorkflowError>
    where
        S: SlipSink + ?Sized,
    {
        let slip = self.slip.as_ref().ok_or(WorkflowError::InvalidTransition {
            action: "save the slip",
            state: self.state,
        })?;
        let path = sink.deliver(slip).await?;
        self.saved_slip = Some(path.clone());
        self.download_error = None;
        Ok(path)
    }

    fn ensure_editable(&self) -> Result<(), WorkflowError> {
        match self.state {
            WorkflowState::PortalClosed => Err(WorkflowError::PortalClosed),
            state if state.is_editable() => Ok(()),
            state => Err(WorkflowError::Locked { state }),
        }
    }

    fn return_to_editing(&mut self) {
        if self.state == WorkflowState::SubmissionFailed {
            self.state = WorkflowState::Editing;
        }
    }
}
