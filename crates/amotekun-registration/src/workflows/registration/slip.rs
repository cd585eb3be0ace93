use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::api::SubmissionResult;
use super::domain::FormNumber;

/// Runs of anything other than letters, digits and combining marks.
static NAME_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Alphabetic}\p{N}\p{M}]+").expect("invalid separator regex")
});

/// Registration slip kept in memory for the rest of the session so it can be
/// reopened or printed without another submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSlip {
    pub form_number: FormNumber,
    pub file_name: String,
    pub content_type: mime::Mime,
    document: Arc<[u8]>,
}

impl RegistrationSlip {
    pub fn new(result: SubmissionResult, full_name: &str) -> Self {
        let content_type = result
            .content_type
            .as_deref()
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .unwrap_or(mime::APPLICATION_PDF);
        let file_name = slip_file_name(&result.form_number, full_name, &content_type);

        Self {
            form_number: result.form_number,
            file_name,
            content_type,
            document: Arc::from(result.document),
        }
    }

    pub fn document(&self) -> &[u8] {
        &self.document
    }
}

/// `<form-number>_<NAME>.<ext>`, with every run of non-alphanumeric
/// characters in the name collapsed to one underscore. Diacritics are kept.
pub fn slip_file_name(
    form_number: &FormNumber,
    full_name: &str,
    content_type: &mime::Mime,
) -> String {
    let sanitized = NAME_SEPARATOR_RE.replace_all(full_name.trim(), "_");
    let sanitized = sanitized.trim_matches('_');
    let extension = extension_for(content_type);

    if sanitized.is_empty() {
        format!("{form_number}.{extension}")
    } else {
        format!("{form_number}_{sanitized}.{extension}")
    }
}

fn extension_for(content_type: &mime::Mime) -> &'static str {
    match content_type.essence_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "pdf",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SlipError {
    #[error("failed to save registration slip to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Hands a finished slip to the applicant (the "download").
#[async_trait]
pub trait SlipSink: Send + Sync {
    async fn deliver(&self, slip: &RegistrationSlip) -> Result<PathBuf, SlipError>;
}

/// Saves slips into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySlipSink {
    directory: PathBuf,
}

impl DirectorySlipSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl SlipSink for DirectorySlipSink {
    async fn deliver(&self, slip: &RegistrationSlip) -> Result<PathBuf, SlipError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| SlipError::Io {
                path: self.directory.clone(),
                source,
            })?;

        let path = self.directory.join(&slip.file_name);
        tokio::fs::write(&path, slip.document())
            .await
            .map_err(|source| SlipError::Io {
                path: path.clone(),
                source,
            })?;

        info!(
            form_number = %slip.form_number,
            bytes = slip.document().len(),
            "registration slip saved"
        );
        Ok(path)
    }
}
