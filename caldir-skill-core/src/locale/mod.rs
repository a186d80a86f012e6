//! Localized phrase tables.
//!
//! Each supported locale ships as a TOML resource compiled into the binary
//! and parsed once, on first use. Everything language-specific lives here:
//! recurrence trigger phrases, filler words, calendar vocabulary for the
//! built-in date parser, and the text of prompts and dialogs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Weekday};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::dialogue::DialogData;
use crate::error::SkillError;
use crate::recurrence::{Frequency, RecurrenceKind, RecurrenceRule};

static EN_US: Lazy<LocaleTable> = Lazy::new(|| LocaleTable::load("en-us", include_str!("en-us.toml")));
static SV_SE: Lazy<LocaleTable> = Lazy::new(|| LocaleTable::load("sv-se", include_str!("sv-se.toml")));

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A supported language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-us")]
    EnUs,
    #[serde(rename = "sv-se")]
    SvSe,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::EnUs, Locale::SvSe];

    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-us",
            Locale::SvSe => "sv-se",
        }
    }

    pub fn table(&self) -> &'static LocaleTable {
        match self {
            Locale::EnUs => &EN_US,
            Locale::SvSe => &SV_SE,
        }
    }
}

impl FromStr for Locale {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "en-us" | "en" => Ok(Locale::EnUs),
            "sv-se" | "sv" => Ok(Locale::SvSe),
            _ => Err(SkillError::UnknownLocale(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Deserialize)]
struct FrequencyPhrases {
    daily: Vec<String>,
    weekdays: Vec<String>,
    weekly: Vec<String>,
    monthly: Vec<String>,
    yearly: Vec<String>,
}

/// Calendar vocabulary used to recognize dates in free text.
#[derive(Debug, Deserialize)]
pub struct CalendarWords {
    pub weekdays: Vec<String>,
    pub weekday_abbreviations: Vec<String>,
    pub months: Vec<String>,
    pub month_abbreviations: Vec<String>,
    /// Modifiers such as "next friday", consumed together with the weekday.
    pub next: Vec<String>,
    /// Words like "on" that may directly precede a date.
    pub connectors: Vec<String>,
    /// Words that mark a following weekday abbreviation as a date ("on wed").
    pub weekday_leads: Vec<String>,
    /// Words joining an ordinal day and a month ("20th of march").
    pub day_of: Vec<String>,
    pub ordinal_suffixes: Vec<String>,
    pub capitalize_names: bool,
    /// Relative-day phrases that start at `evening_hour` unless a time is
    /// given ("tonight").
    pub evening: Vec<String>,
    pub evening_hour: u32,
    /// Phrase -> days from today.
    pub relative_days: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct DateFormat {
    date: String,
    time: String,
}

/// The read-only phrase table for one locale.
#[derive(Debug, Deserialize)]
pub struct LocaleTable {
    infinitive_markers: Vec<String>,
    time_words: Vec<String>,
    afternoon_markers: Vec<String>,
    morning_markers: Vec<String>,
    frequency: FrequencyPhrases,
    pub calendar: CalendarWords,
    prompts: HashMap<String, String>,
    dialogs: HashMap<String, String>,
    names: HashMap<String, String>,
    format: DateFormat,
}

impl LocaleTable {
    fn load(tag: &str, source: &str) -> Self {
        toml::from_str(source)
            .unwrap_or_else(|e| panic!("built-in locale table '{}' is invalid: {}", tag, e))
    }

    /// Trigger phrases for a recurrence kind, in table order.
    pub fn phrases_for(&self, kind: RecurrenceKind) -> &[String] {
        match kind {
            RecurrenceKind::Daily => &self.frequency.daily,
            RecurrenceKind::Weekdays => &self.frequency.weekdays,
            RecurrenceKind::Weekly => &self.frequency.weekly,
            RecurrenceKind::Monthly => &self.frequency.monthly,
            RecurrenceKind::Yearly => &self.frequency.yearly,
        }
    }

    pub fn infinitive_markers(&self) -> &[String] {
        &self.infinitive_markers
    }

    pub fn is_time_word(&self, word: &str) -> bool {
        self.time_words.iter().any(|w| w == word)
    }

    /// Whether `word` is an afternoon marker such as "pm", or a number
    /// carrying one ("3pm").
    pub fn has_afternoon_marker(&self, word: &str) -> bool {
        has_marker(&self.afternoon_markers, word)
    }

    /// Like [`has_afternoon_marker`](Self::has_afternoon_marker), for "am".
    pub fn has_morning_marker(&self, word: &str) -> bool {
        has_marker(&self.morning_markers, word)
    }

    /// Human-readable text for a prompt, dialog or name key.
    /// Unknown keys are returned unchanged.
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.prompts
            .get(key)
            .or_else(|| self.dialogs.get(key))
            .or_else(|| self.names.get(key))
            .map(String::as_str)
            .unwrap_or_else(|| {
                tracing::debug!(key, "No translation found");
                key
            })
    }

    /// Fill the `{name}` placeholders of the text behind `key`.
    pub fn render(&self, key: &str, data: &DialogData) -> String {
        data.iter()
            .fold(self.translate(key).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }

    /// e.g. "weekly", or "daily during weekdays".
    pub fn nice_frequency(&self, rule: &RecurrenceRule) -> String {
        let name = match rule.frequency {
            Frequency::Daily => self.translate("daily"),
            Frequency::Weekly => self.translate("weekly"),
            Frequency::Monthly => self.translate("monthly"),
            Frequency::Yearly => self.translate("yearly"),
        };

        if rule.by_weekday.is_some() {
            format!(
                "{} {} {}",
                name,
                self.translate("during"),
                self.translate("weekdays")
            )
        } else {
            name.to_string()
        }
    }

    /// e.g. "Tuesday, October 20, 2026 at 15:00".
    pub fn nice_date<Tz>(&self, date_time: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let weekday = &self.calendar.weekdays[date_time.weekday().num_days_from_monday() as usize];
        let month = &self.calendar.months[date_time.month0() as usize];

        self.format
            .date
            .replace("{weekday}", &self.display_name(weekday))
            .replace("{month}", &self.display_name(month))
            .replace("{day}", &date_time.day().to_string())
            .replace("{year}", &date_time.year().to_string())
            .replace(
                "{time}",
                &date_time.format(&self.format.time).to_string(),
            )
    }

    pub fn weekday_for(&self, word: &str) -> Option<Weekday> {
        let words = &self.calendar;
        let index = words
            .weekdays
            .iter()
            .position(|w| w == word)
            .or_else(|| words.weekday_abbreviations.iter().position(|w| w == word))?;

        WEEKDAYS.get(index).copied()
    }

    pub fn is_weekday_abbreviation(&self, word: &str) -> bool {
        self.calendar.weekday_abbreviations.iter().any(|w| w == word)
    }

    pub fn is_month_abbreviation(&self, word: &str) -> bool {
        self.calendar.month_abbreviations.iter().any(|w| w == word)
    }

    /// Default start time for a matched relative-day phrase, if it names a
    /// part of the day.
    pub fn evening_time(&self, phrase: &[&str]) -> Option<NaiveTime> {
        let phrase = phrase.join(" ");
        if !self.calendar.evening.iter().any(|e| *e == phrase) {
            return None;
        }
        NaiveTime::from_hms_opt(self.calendar.evening_hour, 0, 0)
    }

    /// Month number (1-12) for a full or abbreviated month name.
    pub fn month_for(&self, word: &str) -> Option<u32> {
        let words = &self.calendar;
        let index = words
            .months
            .iter()
            .position(|w| w == word)
            .or_else(|| words.month_abbreviations.iter().position(|w| w == word))?;

        Some(index as u32 + 1)
    }

    /// Day of month from an ordinal token such as "20th" or "20:e".
    pub fn ordinal_day(&self, word: &str) -> Option<u32> {
        let digits = self
            .calendar
            .ordinal_suffixes
            .iter()
            .find_map(|suffix| word.strip_suffix(suffix.as_str()))?;

        if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        digits.parse().ok().filter(|day| (1..=31).contains(day))
    }

    fn display_name(&self, name: &str) -> String {
        if self.calendar.capitalize_names {
            capitalize(name)
        } else {
            name.to_string()
        }
    }
}

fn has_marker(markers: &[String], word: &str) -> bool {
    markers.iter().any(|m| {
        word == m
            || word
                .strip_suffix(m.as_str())
                .is_some_and(|number| number.ends_with(|c: char| c.is_ascii_digit()))
    })
}

/// Upper-case the first character of `word`.
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
