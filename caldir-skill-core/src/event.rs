//! Event types produced by the creation flow.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::UID_DOMAIN;
use crate::description::DescriptionNormalizer;
use crate::error::{SkillError, SkillResult};
use crate::recurrence::RecurrenceRule;

/// A non-empty description starting with a capital letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn new(text: impl Into<String>) -> SkillResult<Self> {
        let text = text.into();
        let starts_upper = text
            .chars()
            .next()
            .is_some_and(|c| !c.is_lowercase() && !c.is_whitespace());

        if starts_upper && !text.trim().is_empty() {
            Ok(Description(text))
        } else {
            Err(SkillError::EmptyDescription)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = SkillError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Description::new(value)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The slots gathered so far during one creation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateEvent {
    pub date_time: Option<DateTime<Tz>>,
    pub description: Option<String>,
    pub frequency: Option<RecurrenceRule>,
}

impl CandidateEvent {
    /// Build the final event, normalizing the description.
    pub fn into_event(self, normalizer: &DescriptionNormalizer) -> SkillResult<CalendarEvent> {
        let date_time = self.date_time.ok_or(SkillError::NoDateTimeFound)?;
        let description = self.description.ok_or(SkillError::EmptyDescription)?;
        let description = Description::new(normalizer.normalize(&description)?)?;

        Ok(CalendarEvent::new(
            description,
            date_time.with_timezone(&Utc),
            self.frequency,
        ))
    }
}

/// A complete event, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub uid: String,
    pub description: Description,
    pub start: DateTime<Utc>,
    pub recurrence: Option<RecurrenceRule>,
}

impl CalendarEvent {
    pub fn new(
        description: Description,
        start: DateTime<Utc>,
        recurrence: Option<RecurrenceRule>,
    ) -> Self {
        CalendarEvent {
            uid: format!("{}@{}", uuid::Uuid::new_v4(), UID_DOMAIN),
            description,
            start,
            recurrence,
        }
    }
}
