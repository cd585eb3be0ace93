//! Applicant registration: draft editing, validation, review, submission to
//! the registration API, and retention of the generated slip.

pub mod api;
pub mod domain;
pub mod photo;
pub mod policy;
pub mod portal;
pub mod review;
pub mod slip;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use api::{
    HttpRegistrationApi, RegistrationApi, RegistrationPayload, SubmissionError, SubmissionResult,
};
pub use domain::{
    ApplicationDraft, FieldInputError, FieldName, FieldValue, FormNumber, Gender, Lga,
    SecurityBackground, SecurityExperience,
};
pub use photo::{
    decode_data_uri, CompressedPhoto, CompressionOptions, JpegPhotoCompressor, PhotoCompressor,
    PhotoError,
};
pub use policy::{AgeWindow, RegistrationPolicy};
pub use portal::{Countdown, PortalSchedule};
pub use review::{ReviewRow, ReviewSummary};
pub use slip::{DirectorySlipSink, RegistrationSlip, SlipError, SlipSink};
pub use validation::ValidationErrors;
pub use workflow::{
    PhotoCommit, PhotoTicket, RegistrationWorkflow, SubmissionTicket, WorkflowError,
    WorkflowState,
};
