//! Date-time extraction with digit-group time disambiguation.

use chrono::{DateTime, NaiveTime, Timelike};
use chrono_tz::Tz;

use crate::extract::{
    DateParser, ExtractionOutcome, LexicalDateParser, has_digit, localize, time_from_digits,
};
use crate::locale::{Locale, LocaleTable};

/// Finds the start date-time of an event in an utterance.
///
/// The date comes from the base [`DateParser`]. The time of day is read from
/// the first digit group left in the residual, e.g. `1230` (12:30),
/// `093015` (09:30:15) or `9.30` (09:30). Without one, the parser's own
/// time is kept: midnight, or the evening for "tonight".
#[derive(Debug, Clone)]
pub struct DateTimeExtractor<P = LexicalDateParser> {
    parser: P,
    locale: Locale,
}

impl<P: DateParser> DateTimeExtractor<P> {
    pub fn new(parser: P, locale: Locale) -> Self {
        DateTimeExtractor { parser, locale }
    }

    pub fn contains_datetime(&self, utterance: &str) -> bool {
        self.extract(utterance).is_found()
    }

    pub fn extract(&self, utterance: &str) -> ExtractionOutcome<DateTime<Tz>> {
        let prepared = pad_short_numbers(&utterance.to_lowercase());

        let Some((date_time, residual)) = self.parser.parse(&prepared, self.locale) else {
            tracing::debug!(utterance, "No date found");
            return ExtractionOutcome::NotFound;
        };

        let table = self.locale.table();
        let tz = date_time.timezone();
        let date = date_time.date_naive();

        let time = time_from_residual(&residual, table).unwrap_or_else(|| date_time.time());

        let Some(start) = localize(&tz, date.and_time(time)) else {
            tracing::warn!(%date, %time, "Time does not exist in {}", tz);
            return ExtractionOutcome::NotFound;
        };

        let residual = residual
            .split_whitespace()
            .filter(|w| !table.is_time_word(w) && !has_digit(w))
            .collect::<Vec<_>>()
            .join(" ");

        tracing::debug!(%start, residual, "Extracted date-time");
        ExtractionOutcome::Found {
            value: start,
            residual,
        }
    }
}

/// Rewrite standalone one- and two-digit numbers as `N.00` so the base
/// parser never mistakes them for days or years.
fn pad_short_numbers(utterance: &str) -> String {
    utterance
        .split_whitespace()
        .map(|w| {
            if w.len() <= 2 && w.chars().all(|c| c.is_ascii_digit()) {
                format!("{}.00", w)
            } else {
                w.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Time of day from the first digit-bearing word that yields one, with
/// "pm" and "am" applied.
fn time_from_residual(residual: &str, table: &LocaleTable) -> Option<NaiveTime> {
    let words: Vec<&str> = residual.split_whitespace().collect();

    words.iter().enumerate().find_map(|(i, word)| {
        if !has_digit(word) {
            return None;
        }
        let time = time_from_digits(word)?;

        let marker = words.get(i + 1).copied().filter(|next| !has_digit(next));
        let afternoon = table.has_afternoon_marker(word)
            || marker.is_some_and(|m| table.has_afternoon_marker(m));
        let morning =
            table.has_morning_marker(word) || marker.is_some_and(|m| table.has_morning_marker(m));

        match time.hour() {
            1..=11 if afternoon => time.with_hour(time.hour() + 12),
            12 if morning => time.with_hour(0),
            _ => Some(time),
        }
    })
}
