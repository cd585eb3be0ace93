use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::domain::{ApplicationDraft, FieldName, SecurityExperience};
use super::policy::RegistrationPolicy;

/// `+234` or a single leading `0`, then exactly ten digits.
static NIGERIAN_PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+234|0)[0-9]{10}$").expect("invalid phone regex"));

pub fn is_valid_phone_number(raw: &str) -> bool {
    NIGERIAN_PHONE_RE.is_match(raw)
}

/// Field errors from the latest validation pass, ordered by form position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    entries: BTreeMap<FieldName, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, field: FieldName) -> Option<&str> {
        self.entries.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.entries.contains_key(&field)
    }

    /// The field a front end should scroll to.
    pub fn first_field(&self) -> Option<FieldName> {
        self.entries.keys().next().copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &str)> + '_ {
        self.entries
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    pub(crate) fn insert(&mut self, field: FieldName, message: impl Into<String>) {
        self.entries.insert(field, message.into());
    }

    /// Drops the entry for one field, leaving the rest untouched.
    pub(crate) fn clear(&mut self, field: FieldName) -> bool {
        self.entries.remove(&field).is_some()
    }
}

/// Recomputes every rule against the draft. Nothing from earlier passes is
/// carried over.
pub fn validate_draft(
    draft: &ApplicationDraft,
    policy: &RegistrationPolicy,
    today: NaiveDate,
) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if policy.is_required(FieldName::FullName) && draft.full_name.trim().is_empty() {
        errors.insert(FieldName::FullName, "Full name is required");
    }

    if draft.phone_number.trim().is_empty() {
        if policy.is_required(FieldName::PhoneNumber) {
            errors.insert(FieldName::PhoneNumber, "Phone number is required");
        }
    } else if !is_valid_phone_number(&draft.phone_number) {
        errors.insert(
            FieldName::PhoneNumber,
            "Enter a valid Nigerian phone number (e.g. 08012345678)",
        );
    }

    match draft.date_of_birth {
        None if policy.is_required(FieldName::DateOfBirth) => {
            errors.insert(FieldName::DateOfBirth, "Date of birth is required");
        }
        Some(date_of_birth) if !policy.age_window.contains(date_of_birth, today) => {
            errors.insert(
                FieldName::DateOfBirth,
                format!(
                    "Applicants must be between {} and {} years old",
                    policy.age_window.min_age, policy.age_window.max_age
                ),
            );
        }
        _ => {}
    }

    if policy.is_required(FieldName::Gender) && draft.gender.is_none() {
        errors.insert(FieldName::Gender, "Gender is required");
    }

    if policy.is_required(FieldName::Lga) && draft.lga.is_none() {
        errors.insert(FieldName::Lga, "LGA is required");
    }

    if policy.is_required(FieldName::HomeAddress) && draft.home_address.trim().is_empty() {
        errors.insert(FieldName::HomeAddress, "Home address is required");
    }

    if policy.is_required(FieldName::Qualification) && draft.qualification.trim().is_empty() {
        errors.insert(FieldName::Qualification, "Qualification is required");
    }

    if policy.is_required(FieldName::HasSecurityExp) && draft.security_experience.is_none() {
        errors.insert(FieldName::HasSecurityExp, "Please answer this question");
    }

    // Organisation details only count when the applicant reported experience.
    if draft.security_experience == Some(SecurityExperience::Yes) {
        if policy.is_required(FieldName::OrganizationName)
            && draft.organization_name.trim().is_empty()
        {
            errors.insert(FieldName::OrganizationName, "Organisation name is required");
        }
        if policy.is_required(FieldName::MembershipDuration)
            && draft.membership_duration.trim().is_empty()
        {
            errors.insert(
                FieldName::MembershipDuration,
                "Duration of service is required",
            );
        }
    }

    if policy.is_required(FieldName::SpecialSkill) && draft.special_skill.trim().is_empty() {
        errors.insert(FieldName::SpecialSkill, "Special skills are required");
    }

    if policy.is_required(FieldName::OtherInfo) && draft.other_info.trim().is_empty() {
        errors.insert(FieldName::OtherInfo, "Other information is required");
    }

    if policy.is_required(FieldName::PassportPhoto) && draft.passport_photo.is_none() {
        errors.insert(FieldName::PassportPhoto, "Passport photograph is required");
    }

    if policy.is_required(FieldName::Declaration) && !draft.declaration {
        errors.insert(
            FieldName::Declaration,
            "You must accept the declaration to proceed",
        );
    }

    errors
}
