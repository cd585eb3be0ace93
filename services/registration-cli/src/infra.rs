use amotekun_registration::error::AppError;
use amotekun_registration::workflows::registration::{
    decode_data_uri, FieldInputError, FieldName, FieldValue, PhotoError, RegistrationWorkflow,
    WorkflowError,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

/// Answers read from a JSON draft file, keyed by the form's field names
/// (`fullName`, `phoneNumber`, ...).
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub(crate) struct DraftFile {
    answers: BTreeMap<String, Value>,
}

impl DraftFile {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Answers in form order. `null` entries and the photo are skipped; the
    /// photo is read through [`DraftFile::embedded_photo`].
    pub(crate) fn answers(&self) -> Result<Vec<(FieldName, FieldValue)>, FieldInputError> {
        let mut answers = Vec::with_capacity(self.answers.len());
        for (key, value) in &self.answers {
            let field = key.parse::<FieldName>()?;
            if field == FieldName::PassportPhoto {
                continue;
            }
            let value = match value {
                Value::Null => continue,
                Value::Bool(checked) => FieldValue::Checked(*checked),
                Value::String(text) => FieldValue::Text(text.clone()),
                other => FieldValue::Text(other.to_string()),
            };
            answers.push((field, value));
        }
        answers.sort_by_key(|(field, _)| *field);
        Ok(answers)
    }

    /// Image bytes of a photo saved in the draft as a data URI, as found in a
    /// previously submitted payload. Blank or missing means no photo.
    pub(crate) fn embedded_photo(&self) -> Result<Option<Vec<u8>>, PhotoError> {
        match self.answers.get(FieldName::PassportPhoto.wire_key()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(uri)) if uri.trim().is_empty() => Ok(None),
            Some(Value::String(uri)) => decode_data_uri(uri).map(Some),
            Some(_) => Err(PhotoError::InvalidDataUri),
        }
    }

    /// Replays every answer through the workflow as if typed into the form.
    pub(crate) fn fill(&self, workflow: &mut RegistrationWorkflow) -> Result<(), WorkflowError> {
        for (field, value) in self.answers()? {
            workflow.update_field(field, value)?;
        }
        Ok(())
    }
}
