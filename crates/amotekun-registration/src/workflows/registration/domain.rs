use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder printed on the slip when an optional answer is left blank.
pub const EMPTY_ANSWER_PLACEHOLDER: &str = "NIL";

/// Form fields in the order they appear to the applicant.
///
/// The derived ordering follows that layout, so the first entry of any sorted
/// collection of fields is the one a front end should bring into view first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldName {
    #[serde(rename = "fullName")]
    FullName,
    #[serde(rename = "phoneNumber")]
    PhoneNumber,
    #[serde(rename = "dateOfBirth")]
    DateOfBirth,
    #[serde(rename = "gender")]
    Gender,
    #[serde(rename = "lga")]
    Lga,
    #[serde(rename = "homeAddress")]
    HomeAddress,
    #[serde(rename = "qualification")]
    Qualification,
    #[serde(rename = "hasSecurityExp")]
    HasSecurityExp,
    #[serde(rename = "organizationName")]
    OrganizationName,
    #[serde(rename = "membershipDuration")]
    MembershipDuration,
    #[serde(rename = "specialSkill")]
    SpecialSkill,
    #[serde(rename = "otherInfo")]
    OtherInfo,
    #[serde(rename = "passportPhoto")]
    PassportPhoto,
    #[serde(rename = "declaration")]
    Declaration,
}

impl FieldName {
    pub const ALL: [FieldName; 14] = [
        FieldName::FullName,
        FieldName::PhoneNumber,
        FieldName::DateOfBirth,
        FieldName::Gender,
        FieldName::Lga,
        FieldName::HomeAddress,
        FieldName::Qualification,
        FieldName::HasSecurityExp,
        FieldName::OrganizationName,
        FieldName::MembershipDuration,
        FieldName::SpecialSkill,
        FieldName::OtherInfo,
        FieldName::PassportPhoto,
        FieldName::Declaration,
    ];

    /// Key used in the registration API payload.
    pub const fn wire_key(self) -> &'static str {
        match self {
            FieldName::FullName => "fullName",
            FieldName::PhoneNumber => "phoneNumber",
            FieldName::DateOfBirth => "dateOfBirth",
            FieldName::Gender => "gender",
            FieldName::Lga => "lga",
            FieldName::HomeAddress => "homeAddress",
            FieldName::Qualification => "qualification",
            FieldName::HasSecurityExp => "hasSecurityExp",
            FieldName::OrganizationName => "organizationName",
            FieldName::MembershipDuration => "membershipDuration",
            FieldName::SpecialSkill => "specialSkill",
            FieldName::OtherInfo => "otherInfo",
            FieldName::PassportPhoto => "passportPhoto",
            FieldName::Declaration => "declaration",
        }
    }

    /// Human readable label shown next to the input.
    pub const fn label(self) -> &'static str {
        match self {
            FieldName::FullName => "Full Name",
            FieldName::PhoneNumber => "Phone Number",
            FieldName::DateOfBirth => "Date of Birth",
            FieldName::Gender => "Gender",
            FieldName::Lga => "Local Government Area (LGA)",
            FieldName::HomeAddress => "Permanent Home Address",
            FieldName::Qualification => "Highest Academic Qualification",
            FieldName::HasSecurityExp => "Security Experience",
            FieldName::OrganizationName => "Name of Organisation / Security Agency",
            FieldName::MembershipDuration => "Duration of Service / Membership",
            FieldName::SpecialSkill => "Special Skills or Trade",
            FieldName::OtherInfo => "Other Relevant Information",
            FieldName::PassportPhoto => "Passport Photograph",
            FieldName::Declaration => "Declaration",
        }
    }

    pub const fn is_checkbox(self) -> bool {
        matches!(self, FieldName::Declaration)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_key())
    }
}

impl FromStr for FieldName {
    type Err = FieldInputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed == "hasSecurityExperience" {
            return Ok(FieldName::HasSecurityExp);
        }
        FieldName::ALL
            .into_iter()
            .find(|field| field.wire_key() == trimmed)
            .ok_or_else(|| FieldInputError::UnknownField(trimmed.to_string()))
    }
}

/// Raw value delivered by an input control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Checked(value)
    }
}

/// Rejected input for a single field. The draft keeps its previous value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldInputError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("{field} expects text input")]
    ExpectedText { field: FieldName },
    #[error("'{value}' is not a valid option for {field}")]
    UnknownOption { field: FieldName, value: String },
    #[error("'{value}' is not a calendar date (expected YYYY-MM-DD)")]
    InvalidDate { value: String },
    #[error("{field} is set by the photo upload, not by direct edits")]
    ReadOnly { field: FieldName },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Answer to "Do you have security-related work experience?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityExperience {
    Yes,
    No,
}

impl SecurityExperience {
    pub const fn label(self) -> &'static str {
        match self {
            SecurityExperience::Yes => "Yes",
            SecurityExperience::No => "No",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(SecurityExperience::Yes),
            "no" => Some(SecurityExperience::No),
            _ => None,
        }
    }
}

/// Security background as it is rendered and submitted. Organisation details
/// only exist for applicants who answered yes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityBackground {
    NoExperience,
    HasExperience {
        organization_name: String,
        membership_duration: String,
    },
}

macro_rules! local_government_areas {
    ($($variant:ident => $label:literal),+ $(,)?) => {
        /// Local government areas of Oyo State.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Lga {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Lga {
            pub const ALL: &'static [Lga] = &[$(Lga::$variant),+];

            pub const fn label(self) -> &'static str {
                match self {
                    $(Lga::$variant => $label,)+
                }
            }
        }
    };
}

local_government_areas! {
    Afijio => "Afijio",
    Akinyele => "Akinyele",
    Atiba => "Atiba",
    Atisbo => "Atisbo",
    Egbeda => "Egbeda",
    IbadanNorth => "Ibadan North",
    IbadanNorthEast => "Ibadan North-East",
    IbadanNorthWest => "Ibadan North-West",
    IbadanSouthEast => "Ibadan South-East",
    IbadanSouthWest => "Ibadan South-West",
    IbarapaCentral => "Ibarapa Central",
    IbarapaEast => "Ibarapa East",
    IbarapaNorth => "Ibarapa North",
    Ido => "Ido",
    Irepo => "Irepo",
    Iseyin => "Iseyin",
    Itesiwaju => "Itesiwaju",
    Iwajowa => "Iwajowa",
    Kajola => "Kajola",
    Lagelu => "Lagelu",
    OgbomoshoNorth => "Ogbomosho North",
    OgbomoshoSouth => "Ogbomosho South",
    OgoOluwa => "Ogo Oluwa",
    Olorunsogo => "Olorunsogo",
    Oluyole => "Oluyole",
    OnaAra => "Ona Ara",
    Orelope => "Orelope",
    OriIre => "Ori Ire",
    OyoEast => "Oyo East",
    OyoWest => "Oyo West",
    SakiEast => "Saki East",
    SakiWest => "Saki West",
    Surulere => "Surulere",
}

impl Lga {
    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Lga::ALL
            .iter()
            .copied()
            .find(|lga| lga.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Lga {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier assigned by the registration API, e.g. `AMO-00042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormNumber(pub String);

impl FormNumber {
    pub const PLACEHOLDER: &'static str = "AMO-XXXX";

    pub fn placeholder() -> Self {
        FormNumber(Self::PLACEHOLDER.to_string())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::PLACEHOLDER
    }
}

impl fmt::Display for FormNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The application being edited. It lives only as long as the workflow that
/// owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub full_name: String,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub lga: Option<Lga>,
    pub home_address: String,
    pub qualification: String,
    pub security_experience: Option<SecurityExperience>,
    pub organization_name: String,
    pub membership_duration: String,
    pub special_skill: String,
    pub other_info: String,
    /// Compressed photo encoded as a `data:` URI.
    pub passport_photo: Option<String>,
    pub declaration: bool,
}

impl ApplicationDraft {
    /// Applies one edit, canonicalising the value for its field.
    pub fn apply(&mut self, field: FieldName, value: FieldValue) -> Result<(), FieldInputError> {
        if field == FieldName::PassportPhoto {
            return Err(FieldInputError::ReadOnly { field });
        }

        if field.is_checkbox() {
            self.declaration = match value {
                FieldValue::Checked(checked) => checked,
                FieldValue::Text(raw) => matches!(
                    raw.trim().to_ascii_lowercase().as_str(),
                    "true" | "on" | "yes" | "1"
                ),
            };
            return Ok(());
        }

        let raw = match value {
            FieldValue::Text(raw) => raw,
            FieldValue::Checked(_) => return Err(FieldInputError::ExpectedText { field }),
        };

        match field {
            FieldName::FullName => self.full_name = raw.to_uppercase(),
            FieldName::PhoneNumber => self.phone_number = raw,
            FieldName::DateOfBirth => {
                self.date_of_birth = if raw.trim().is_empty() {
                    None
                } else {
                    Some(
                        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                            .map_err(|_| FieldInputError::InvalidDate { value: raw.clone() })?,
                    )
                };
            }
            FieldName::Gender => self.gender = parse_option(field, &raw, Gender::parse)?,
            FieldName::Lga => self.lga = parse_option(field, &raw, Lga::parse)?,
            FieldName::HomeAddress => self.home_address = raw,
            FieldName::Qualification => self.qualification = raw,
            FieldName::HasSecurityExp => {
                self.security_experience = parse_option(field, &raw, SecurityExperience::parse)?
            }
            FieldName::OrganizationName => self.organization_name = raw,
            FieldName::MembershipDuration => self.membership_duration = raw,
            FieldName::SpecialSkill => self.special_skill = raw,
            FieldName::OtherInfo => self.other_info = raw,
            FieldName::PassportPhoto | FieldName::Declaration => {}
        }

        Ok(())
    }

    /// Tagged view of the security answers. Organisation details stored while
    /// the applicant answered "No" are not part of it.
    pub fn security_background(&self) -> Option<SecurityBackground> {
        match self.security_experience? {
            SecurityExperience::No => Some(SecurityBackground::NoExperience),
            SecurityExperience::Yes => Some(SecurityBackground::HasExperience {
                organization_name: self.organization_name.trim().to_string(),
                membership_duration: self.membership_duration.trim().to_string(),
            }),
        }
    }

    pub fn qualification_or_placeholder(&self) -> &str {
        let trimmed = self.qualification.trim();
        if trimmed.is_empty() {
            EMPTY_ANSWER_PLACEHOLDER
        } else {
            trimmed
        }
    }
}

fn parse_option<T>(
    field: FieldName,
    raw: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, FieldInputError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse(raw)
        .map(Some)
        .ok_or_else(|| FieldInputError::UnknownOption {
            field,
            value: raw.to_string(),
        })
}
