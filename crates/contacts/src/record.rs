//! Core record types for the contact book.
//!
//! A [`Record`] is one entry in the book: either a person or an organization,
//! plus the phone number and timestamps every entry carries. Fields are
//! addressed by name through [`Field`], so callers can read, edit, and search
//! records without caring which variant they hold.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Format used when showing timestamps to the user.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Placeholder shown for optional fields that have no value.
pub const NO_DATA: &str = "[no data]";

/// Format a birth date must follow.
const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Editable fields of a person, in prompt order.
const PERSON_FIELDS: &[Field] = &[
    Field::Name,
    Field::Surname,
    Field::Birth,
    Field::Gender,
    Field::Number,
];

/// Editable fields of an organization, in prompt order.
const ORGANIZATION_FIELDS: &[Field] = &[Field::OrganizationName, Field::Address, Field::Number];

/// Rejected field reads or writes.
///
/// The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The field name is not editable on this kind of record.
    #[error("Unknown field!")]
    UnknownField(String),

    /// The birth date is not a `yyyy-MM-dd` calendar date.
    #[error("Bad birth date!")]
    InvalidBirthDate(String),

    /// The gender is neither `M` nor `F`.
    #[error("Bad gender!")]
    InvalidGender(String),
}

/// A named, editable attribute of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// A person's first name.
    Name,
    /// A person's last name.
    Surname,
    /// A person's birth date.
    Birth,
    /// A person's gender.
    Gender,
    /// The phone number shared by every record.
    Number,
    /// An organization's name.
    OrganizationName,
    /// An organization's address.
    Address,
}

impl Field {
    /// The name users type to select this field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Surname => "surname",
            Self::Birth => "birth",
            Self::Gender => "gender",
            Self::Number => "number",
            Self::OrganizationName => "organization name",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "surname" => Ok(Self::Surname),
            "birth" => Ok(Self::Birth),
            "gender" => Ok(Self::Gender),
            "number" => Ok(Self::Number),
            "organization name" => Ok(Self::OrganizationName),
            "address" => Ok(Self::Address),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

/// Which variant a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// An individual.
    Person,
    /// A company or other organization.
    Organization,
}

impl ContactKind {
    /// The name used for this kind in prompts and on disk.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }

    /// Look up a kind by its name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "person" => Some(Self::Person),
            "organization" => Some(Self::Organization),
            _ => None,
        }
    }

    /// The editable fields for this kind, in prompt order.
    #[must_use]
    pub fn editable_fields(self) -> &'static [Field] {
        match self {
            Self::Person => PERSON_FIELDS,
            Self::Organization => ORGANIZATION_FIELDS,
        }
    }
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person's gender as recorded in the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// Stored as `M`.
    Male,
    /// Stored as `F`.
    Female,
}

impl Gender {
    /// The single-letter code for this gender.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            other => Err(FieldError::InvalidGender(other.to_string())),
        }
    }
}

fn birth_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("Invalid regex pattern"))
}

/// Check that `value` is a real calendar date written as `yyyy-MM-dd`.
///
/// # Errors
///
/// Returns [`FieldError::InvalidBirthDate`] for anything else, including the
/// empty string.
pub fn validate_birth_date(value: &str) -> Result<(), FieldError> {
    if birth_date_pattern().is_match(value)
        && NaiveDate::parse_from_str(value, BIRTH_DATE_FORMAT).is_ok()
    {
        Ok(())
    } else {
        Err(FieldError::InvalidBirthDate(value.to_string()))
    }
}

/// Render a timestamp the way the book shows it to users.
#[must_use]
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// An individual contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    first_name: String,
    last_name: String,
    birth_date: Option<String>,
    gender: Option<Gender>,
}

impl Person {
    /// Create a person with no birth date or gender.
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birth_date: None,
            gender: None,
        }
    }

    /// First name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Last name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Birth date as entered, if one was accepted.
    #[must_use]
    pub fn birth_date(&self) -> Option<&str> {
        self.birth_date.as_deref()
    }

    /// Gender, if one was accepted.
    #[must_use]
    pub fn gender(&self) -> Option<Gender> {
        self.gender
    }

    /// Store a birth date after checking its format.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidBirthDate`] and keeps the previous value
    /// if `value` is not a `yyyy-MM-dd` date.
    pub fn set_birth_date(&mut self, value: &str) -> Result<(), FieldError> {
        if let Err(err) = validate_birth_date(value) {
            warn!(value, "Rejected birth date");
            return Err(err);
        }
        self.birth_date = Some(value.to_string());
        Ok(())
    }

    /// Store a gender after checking it is `M` or `F`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidGender`] and keeps the previous value
    /// otherwise.
    pub fn set_gender(&mut self, value: &str) -> Result<(), FieldError> {
        match value.parse::<Gender>() {
            Ok(gender) => {
                self.gender = Some(gender);
                Ok(())
            }
            Err(err) => {
                warn!(value, "Rejected gender");
                Err(err)
            }
        }
    }
}

/// A company or other organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    name: String,
    address: String,
}

impl Organization {
    /// Create an organization.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Organization name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Postal address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// The variant-specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    /// An individual.
    Person(Person),
    /// A company or other organization.
    Organization(Organization),
}

impl Contact {
    /// Which variant this is.
    #[must_use]
    pub fn kind(&self) -> ContactKind {
        match self {
            Self::Person(_) => ContactKind::Person,
            Self::Organization(_) => ContactKind::Organization,
        }
    }
}

impl From<Person> for Contact {
    fn from(person: Person) -> Self {
        Self::Person(person)
    }
}

impl From<Organization> for Contact {
    fn from(organization: Organization) -> Self {
        Self::Organization(organization)
    }
}

/// One entry in the contact book.
///
/// Every successful write refreshes the last-edit timestamp; rejected writes
/// leave the record untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    contact: Contact,
    phone_number: String,
    time_created: NaiveDateTime,
    time_last_edit: NaiveDateTime,
}

impl Record {
    /// Create a record stamped with the current local time.
    #[must_use]
    pub fn new(contact: impl Into<Contact>, phone_number: impl Into<String>) -> Self {
        let created = now();
        Self {
            contact: contact.into(),
            phone_number: phone_number.into(),
            time_created: created,
            time_last_edit: created,
        }
    }

    /// Replace both timestamps, e.g. when restoring a stored record.
    #[must_use]
    pub fn with_timestamps(mut self, created: NaiveDateTime, last_edit: NaiveDateTime) -> Self {
        self.time_created = created;
        self.time_last_edit = last_edit;
        self
    }

    /// The variant-specific part of the record.
    #[must_use]
    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    /// Which variant this record holds.
    #[must_use]
    pub fn kind(&self) -> ContactKind {
        self.contact.kind()
    }

    /// Phone number, free text.
    #[must_use]
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// When the record was created.
    #[must_use]
    pub fn time_created(&self) -> NaiveDateTime {
        self.time_created
    }

    /// When the record was last successfully edited.
    #[must_use]
    pub fn time_last_edit(&self) -> NaiveDateTime {
        self.time_last_edit
    }

    /// Short name used in numbered lists.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.contact {
            Contact::Person(person) => format!("{} {}", person.first_name, person.last_name),
            Contact::Organization(organization) => organization.name.clone(),
        }
    }

    /// The fields that can be edited on this record, in prompt order.
    #[must_use]
    pub fn editable_fields(&self) -> &'static [Field] {
        self.kind().editable_fields()
    }

    /// Current value of `field`, or `None` if it is absent or does not apply
    /// to this record.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        match (&self.contact, field) {
            (_, Field::Number) => Some(self.phone_number.as_str()),
            (Contact::Person(person), Field::Name) => Some(person.first_name.as_str()),
            (Contact::Person(person), Field::Surname) => Some(person.last_name.as_str()),
            (Contact::Person(person), Field::Birth) => person.birth_date(),
            (Contact::Person(person), Field::Gender) => person.gender.map(Gender::as_str),
            (Contact::Organization(organization), Field::OrganizationName) => {
                Some(organization.name.as_str())
            }
            (Contact::Organization(organization), Field::Address) => {
                Some(organization.address.as_str())
            }
            _ => None,
        }
    }

    /// Current value of the field called `name`.
    ///
    /// Unknown names read as `None`, the same as an absent value.
    #[must_use]
    pub fn field_value(&self, name: &str) -> Option<&str> {
        name.parse::<Field>().ok().and_then(|field| self.get(field))
    }

    /// Overwrite the phone number. No format rules apply.
    pub fn edit_phone_number(&mut self, phone_number: impl Into<String>) {
        self.phone_number = phone_number.into();
        self.touch();
    }

    /// Write `value` into `field`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::UnknownField`] if the field does not belong to
    /// this kind of record, or a validation error for a bad birth date or
    /// gender. Nothing changes on error.
    pub fn set(&mut self, field: Field, value: &str) -> Result<(), FieldError> {
        if field == Field::Number {
            self.edit_phone_number(value);
            return Ok(());
        }

        match (&mut self.contact, field) {
            (Contact::Person(person), Field::Name) => person.first_name = value.to_string(),
            (Contact::Person(person), Field::Surname) => person.last_name = value.to_string(),
            (Contact::Person(person), Field::Birth) => person.set_birth_date(value)?,
            (Contact::Person(person), Field::Gender) => person.set_gender(value)?,
            (Contact::Organization(organization), Field::OrganizationName) => {
                organization.name = value.to_string();
            }
            (Contact::Organization(organization), Field::Address) => {
                organization.address = value.to_string();
            }
            _ => return Err(FieldError::UnknownField(field.to_string())),
        }

        self.touch();
        Ok(())
    }

    /// Write `value` into the field called `name`.
    ///
    /// # Errors
    ///
    /// Same as [`Record::set`]; names outside this record's editable set are
    /// [`FieldError::UnknownField`].
    pub fn edit_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let field = match name.parse::<Field>() {
            Ok(field) if self.editable_fields().contains(&field) => field,
            _ => {
                warn!(field = name, kind = %self.kind(), "Unknown field");
                return Err(FieldError::UnknownField(name.to_string()));
            }
        };
        self.set(field, value)?;
        debug!(%field, "Record field updated");
        Ok(())
    }

    /// Case-insensitive substring match against every editable field.
    ///
    /// Absent and empty values never match.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.editable_fields()
            .iter()
            .filter_map(|field| self.get(*field))
            .filter(|value| !value.is_empty())
            .any(|value| value.to_lowercase().contains(&query))
    }

    fn touch(&mut self) {
        self.time_last_edit = now();
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.contact {
            Contact::Person(person) => {
                writeln!(f, "Name: {}", person.first_name)?;
                writeln!(f, "Surname: {}", person.last_name)?;
                writeln!(f, "Birth date: {}", person.birth_date().unwrap_or(NO_DATA))?;
                writeln!(
                    f,
                    "Gender: {}",
                    person.gender.map_or(NO_DATA, Gender::as_str)
                )?;
            }
            Contact::Organization(organization) => {
                writeln!(f, "Organization name: {}", organization.name)?;
                writeln!(f, "Address: {}", organization.address)?;
            }
        }
        writeln!(f, "Number: {}", self.phone_number)?;
        writeln!(f, "Time created: {}", format_timestamp(self.time_created))?;
        write!(f, "Time last edit: {}", format_timestamp(self.time_last_edit))
    }
}
