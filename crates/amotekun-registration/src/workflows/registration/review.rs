use std::fmt;

use serde::Serialize;

use super::domain::{ApplicationDraft, SecurityBackground};

const EMPTY_VALUE: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub label: &'static str,
    pub value: String,
}

/// Read-only digest shown on the confirmation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub rows: Vec<ReviewRow>,
}

impl ReviewSummary {
    pub fn from_draft(draft: &ApplicationDraft) -> Self {
        let mut rows = vec![
            row("Full Name", draft.full_name.clone()),
            row("Phone Number", draft.phone_number.clone()),
            row(
                "Date of Birth",
                draft
                    .date_of_birth
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            row(
                "Gender",
                draft
                    .gender
                    .map(|gender| gender.label().to_string())
                    .unwrap_or_default(),
            ),
            row(
                "LGA",
                draft
                    .lga
                    .map(|lga| lga.label().to_string())
                    .unwrap_or_default(),
            ),
            row("Qualification", draft.qualification.clone()),
            row(
                "Security Experience",
                draft
                    .security_experience
                    .map(|answer| answer.label().to_string())
                    .unwrap_or_default(),
            ),
        ];

        if let Some(SecurityBackground::HasExperience {
            organization_name,
            membership_duration,
        }) = draft.security_background()
        {
            rows.push(row("Organisation", organization_name));
            rows.push(row("Membership Duration", membership_duration));
        }

        Self { rows }
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }
}

fn row(label: &'static str, value: String) -> ReviewRow {
    let value = if value.trim().is_empty() {
        EMPTY_VALUE.to_string()
    } else {
        value
    };
    ReviewRow { label, value }
}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|row| row.label.len())
            .max()
            .unwrap_or(0);
        for row in &self.rows {
            writeln!(f, "{:<width$}  {}", row.label, row.value, width = width)?;
        }
        Ok(())
    }
}
