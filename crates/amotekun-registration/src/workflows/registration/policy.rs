use std::collections::BTreeSet;

use chrono::{Months, NaiveDate};

use super::domain::FieldName;
use super::photo::CompressionOptions;
use crate::config::{AppConfig, EligibilityConfig};

/// Inclusive age bounds in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeWindow {
    pub min_age: u32,
    pub max_age: u32,
}

impl AgeWindow {
    /// Earliest and latest acceptable dates of birth relative to `today`.
    ///
    /// Anniversaries that fall on 29 February in a non-leap year resolve to
    /// 28 February.
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            years_before(today, self.max_age),
            years_before(today, self.min_age),
        )
    }

    pub fn contains(&self, date_of_birth: NaiveDate, today: NaiveDate) -> bool {
        let (earliest, latest) = self.bounds(today);
        date_of_birth >= earliest && date_of_birth <= latest
    }
}

impl Default for AgeWindow {
    fn default() -> Self {
        Self {
            min_age: 18,
            max_age: 45,
        }
    }
}

impl From<EligibilityConfig> for AgeWindow {
    fn from(config: EligibilityConfig) -> Self {
        Self {
            min_age: config.min_age,
            max_age: config.max_age,
        }
    }
}

fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

/// Configurable rules the workflow enforces on a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPolicy {
    pub age_window: AgeWindow,
    pub required_fields: BTreeSet<FieldName>,
    pub compression: CompressionOptions,
}

impl RegistrationPolicy {
    pub fn default_required_fields() -> BTreeSet<FieldName> {
        BTreeSet::from([
            FieldName::FullName,
            FieldName::PhoneNumber,
            FieldName::DateOfBirth,
            FieldName::Gender,
            FieldName::Lga,
            FieldName::HomeAddress,
            FieldName::HasSecurityExp,
            FieldName::Declaration,
        ])
    }

    pub fn is_required(&self, field: FieldName) -> bool {
        self.required_fields.contains(&field)
    }
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            age_window: AgeWindow::default(),
            required_fields: Self::default_required_fields(),
            compression: CompressionOptions::default(),
        }
    }
}

impl From<&AppConfig> for RegistrationPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            age_window: config.eligibility.into(),
            ..Self::default()
        }
    }
}
