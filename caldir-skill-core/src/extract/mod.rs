//! Slot extraction from free text.
//!
//! Both extractors return an [`ExtractionOutcome`]: the value they found plus
//! whatever text was left over once the matched words were removed.

mod date_parser;
mod datetime;
mod frequency;

pub use date_parser::{DateParser, LexicalDateParser};
pub use datetime::DateTimeExtractor;
pub use frequency::FrequencyMatcher;

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Result of looking for one slot in an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome<T> {
    Found { value: T, residual: String },
    NotFound,
}

impl<T> ExtractionOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionOutcome::Found { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ExtractionOutcome::Found { value, .. } => Some(value),
            ExtractionOutcome::NotFound => None,
        }
    }

    pub fn into_found(self) -> Option<(T, String)> {
        match self {
            ExtractionOutcome::Found { value, residual } => Some((value, residual)),
            ExtractionOutcome::NotFound => None,
        }
    }
}

/// Resolve a wall-clock time in `tz`, taking the earlier instant when the
/// time is ambiguous.
pub(crate) fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest()
}

pub(crate) fn has_digit(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
}

/// Interpret the digit runs of one word as a time of day.
///
/// A single run is split from the right: `HH`, `HHMM` or `HHMMSS` (the hour
/// may be one digit). Two or three separated runs are hour, minute and
/// second. Anything else, or out-of-range fields, gives `None`.
pub(crate) fn time_from_digits(word: &str) -> Option<NaiveTime> {
    let runs: Vec<&str> = word
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect();

    let (hour, minute, second) = match runs.as_slice() {
        [run] => split_run(run)?,
        [hour, minute] => (hour.parse().ok()?, minute.parse().ok()?, 0),
        [hour, minute, second] => (
            hour.parse().ok()?,
            minute.parse().ok()?,
            second.parse().ok()?,
        ),
        _ => return None,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn split_run(run: &str) -> Option<(u32, u32, u32)> {
    let len = run.len();
    let field = |range: std::ops::Range<usize>| run[range].parse::<u32>().ok();

    match len {
        1..=2 => Some((field(0..len)?, 0, 0)),
        3..=4 => Some((field(0..len - 2)?, field(len - 2..len)?, 0)),
        5..=6 => Some((
            field(0..len - 4)?,
            field(len - 4..len - 2)?,
            field(len - 2..len)?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_runs_as_times() {
        assert_eq!(time_from_digits("1230"), NaiveTime::from_hms_opt(12, 30, 0));
        assert_eq!(time_from_digits("093015"), NaiveTime::from_hms_opt(9, 30, 15));
        assert_eq!(time_from_digits("15:00"), NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(time_from_digits("3pm"), NaiveTime::from_hms_opt(3, 0, 0));
        assert_eq!(time_from_digits("2575"), None);
        assert_eq!(time_from_digits("1234567"), None);
        assert_eq!(time_from_digits("2026-12-31"), None);
    }
}
