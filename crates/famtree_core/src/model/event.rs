//! Life-event value types.
//!
//! # Responsibility
//! - Define `PartialDate` and `LifeEvent` shared by birth/death/marriage/divorce.
//! - Provide the single validating constructor used by every caller.
//!
//! # Invariants
//! - Date parts are independently optional; no cross-field checks.
//! - `partner_id` is only meaningful on marriage/divorce events.
//! - A blank country is stored as `None`.

use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Earliest accepted year in a partial date.
pub const MIN_YEAR: i32 = 1800;
/// Latest accepted year in a partial date.
pub const MAX_YEAR: i32 = 2024;

/// Which slot of a person record an event occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Birth,
    Death,
    Marriage,
    Divorce,
}

impl EventKind {
    /// Returns whether events of this kind may reference a partner.
    pub fn allows_partner(self) -> bool {
        matches!(self, Self::Marriage | Self::Divorce)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Death => "death",
            Self::Marriage => "marriage",
            Self::Divorce => "divorce",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors raised while building events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    YearOutOfRange(i32),
    MonthOutOfRange(u8),
    DayOutOfRange(u8),
    /// Birth and death events never carry a partner.
    PartnerNotAllowed(EventKind),
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearOutOfRange(year) => {
                write!(f, "year {year} is outside {MIN_YEAR}..={MAX_YEAR}")
            }
            Self::MonthOutOfRange(month) => write!(f, "month {month} is outside 1..=12"),
            Self::DayOutOfRange(day) => write!(f, "day {day} is outside 1..=31"),
            Self::PartnerNotAllowed(kind) => {
                write!(f, "{kind} events cannot reference a partner")
            }
        }
    }
}

impl Error for EventValidationError {}

/// Date where any of year, month and day may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
}

impl PartialDate {
    /// Builds a validated date.
    ///
    /// Returns `Ok(None)` when every part is unknown.
    pub fn new(
        year: Option<i32>,
        month: Option<u8>,
        day: Option<u8>,
    ) -> Result<Option<Self>, EventValidationError> {
        let date = Self { year, month, day };
        if date.is_empty() {
            return Ok(None);
        }
        date.validate()?;
        Ok(Some(date))
    }

    /// Checks every known part against its range.
    ///
    /// Day-of-month overflow (e.g. February 31st) is accepted.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if let Some(year) = self.year {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(EventValidationError::YearOutOfRange(year));
            }
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(EventValidationError::MonthOutOfRange(month));
            }
        }
        if let Some(day) = self.day {
            if !(1..=31).contains(&day) {
                return Err(EventValidationError::DayOutOfRange(day));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none() && self.day.is_none()
    }
}

impl Display for PartialDate {
    /// Renders `YYYY-MM-DD` with `?` placeholders, or nothing when fully unknown.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        match self.year {
            Some(year) => write!(f, "{year:04}")?,
            None => f.write_str("????")?,
        }
        match self.month {
            Some(month) => write!(f, "-{month:02}")?,
            None => f.write_str("-??")?,
        }
        match self.day {
            Some(day) => write!(f, "-{day:02}"),
            None => f.write_str("-??"),
        }
    }
}

/// Raw, unvalidated event input as collected from an edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields {
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub country: Option<String>,
    pub partner_id: Option<PersonId>,
}

/// Birth, death, marriage or divorce occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<PartialDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Only set on marriage/divorce events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<PersonId>,
}

impl LifeEvent {
    /// Builds one event from form fields.
    ///
    /// Returns `Ok(None)` when no field carries a value, so callers can store
    /// the result directly into an optional slot.
    ///
    /// # Errors
    /// - Date parts out of range.
    /// - `partner_id` supplied for a birth or death event.
    pub fn from_fields(
        kind: EventKind,
        fields: EventFields,
    ) -> Result<Option<Self>, EventValidationError> {
        let date = PartialDate::new(fields.year, fields.month, fields.day)?;
        let country = fields
            .country
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if fields.partner_id.is_some() && !kind.allows_partner() {
            return Err(EventValidationError::PartnerNotAllowed(kind));
        }

        if date.is_none() && country.is_none() && fields.partner_id.is_none() {
            return Ok(None);
        }

        Ok(Some(Self {
            date,
            country,
            partner_id: fields.partner_id,
        }))
    }

    /// Marriage/divorce event that only names a partner.
    pub fn with_partner(partner_id: PersonId) -> Self {
        Self {
            date: None,
            country: None,
            partner_id: Some(partner_id),
        }
    }

    /// Validates an already-built (for example deserialized) event.
    pub fn validate(&self, kind: EventKind) -> Result<(), EventValidationError> {
        if let Some(date) = &self.date {
            date.validate()?;
        }
        if self.partner_id.is_some() && !kind.allows_partner() {
            return Err(EventValidationError::PartnerNotAllowed(kind));
        }
        Ok(())
    }

    pub fn year(&self) -> Option<i32> {
        self.date.and_then(|date| date.year)
    }

    /// Copy of this event pointing at `partner_id` instead.
    pub(crate) fn mirrored_for(&self, partner_id: PersonId) -> Self {
        Self {
            date: self.date,
            country: self.country.clone(),
            partner_id: Some(partner_id),
        }
    }
}
