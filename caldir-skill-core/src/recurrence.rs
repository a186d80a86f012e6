//! Recurrence rules attached to events.
//!
//! Only the five patterns a user can ask for by voice are modelled: daily,
//! weekdays, weekly, monthly and yearly, always with an interval of one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc, Weekday};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{SkillError, SkillResult};

/// The recurrence patterns a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Daily,
    Weekdays,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceKind {
    /// Enumeration order. Phrase matching breaks ties in favour of the
    /// earlier kind.
    pub const ALL: [RecurrenceKind; 5] = [
        RecurrenceKind::Daily,
        RecurrenceKind::Weekdays,
        RecurrenceKind::Weekly,
        RecurrenceKind::Monthly,
        RecurrenceKind::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekdays => "weekdays",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Yearly => "yearly",
        }
    }
}

/// RRULE `FREQ` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn as_ics_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

const WORKING_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// A repeat pattern for an event.
///
/// `by_weekday` is only ever set on daily rules, where it restricts the
/// repetition to Monday through Friday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub by_weekday: Option<Vec<Weekday>>,
}

impl RecurrenceRule {
    pub fn from_kind(kind: RecurrenceKind) -> Self {
        let (frequency, by_weekday) = match kind {
            RecurrenceKind::Daily => (Frequency::Daily, None),
            RecurrenceKind::Weekdays => (Frequency::Daily, Some(WORKING_DAYS.to_vec())),
            RecurrenceKind::Weekly => (Frequency::Weekly, None),
            RecurrenceKind::Monthly => (Frequency::Monthly, None),
            RecurrenceKind::Yearly => (Frequency::Yearly, None),
        };

        RecurrenceRule {
            frequency,
            interval: 1,
            by_weekday,
        }
    }

    pub fn kind(&self) -> RecurrenceKind {
        match (self.frequency, &self.by_weekday) {
            (Frequency::Daily, Some(_)) => RecurrenceKind::Weekdays,
            (Frequency::Daily, None) => RecurrenceKind::Daily,
            (Frequency::Weekly, _) => RecurrenceKind::Weekly,
            (Frequency::Monthly, _) => RecurrenceKind::Monthly,
            (Frequency::Yearly, _) => RecurrenceKind::Yearly,
        }
    }

    /// Occurrences of an event starting at `start`, strictly after `after`.
    pub fn upcoming(
        &self,
        start: DateTime<Utc>,
        after: DateTime<Utc>,
        limit: u16,
    ) -> SkillResult<Vec<DateTime<Utc>>> {
        let text = format!(
            "DTSTART:{}\nRRULE:{}",
            start.format("%Y%m%dT%H%M%SZ"),
            self
        );

        let rrule_set: RRuleSet = text
            .parse()
            .map_err(|e| SkillError::Recurrence(format!("Failed to parse '{}': {}", self, e)))?;

        let tz: rrule::Tz = Utc.into();
        let result = rrule_set.after(after.with_timezone(&tz)).all(limit);

        Ok(result
            .dates
            .iter()
            .map(|dt| dt.with_timezone(&Utc))
            .collect())
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "FREQ={};INTERVAL={}",
            self.frequency.as_ics_str(),
            self.interval
        )?;

        if let Some(days) = &self.by_weekday {
            let days: Vec<&str> = days.iter().map(weekday_code).collect();
            write!(f, ";BYDAY={}", days.join(","))?;
        }

        Ok(())
    }
}

impl FromStr for RecurrenceRule {
    type Err = SkillError;

    /// Parse the value of an RRULE property. Parts other than FREQ,
    /// INTERVAL and BYDAY are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut frequency = None;
        let mut interval = 1;
        let mut by_weekday = None;

        for part in s.trim().trim_start_matches("RRULE:").split(';') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };

            match key.to_ascii_uppercase().as_str() {
                "FREQ" => {
                    frequency = Some(match value.to_ascii_uppercase().as_str() {
                        "DAILY" => Frequency::Daily,
                        "WEEKLY" => Frequency::Weekly,
                        "MONTHLY" => Frequency::Monthly,
                        "YEARLY" => Frequency::Yearly,
                        other => {
                            return Err(SkillError::Recurrence(format!(
                                "Unsupported frequency '{}'",
                                other
                            )));
                        }
                    })
                }
                "INTERVAL" => {
                    interval = value.parse().map_err(|_| {
                        SkillError::Recurrence(format!("Invalid interval '{}'", value))
                    })?;
                }
                "BYDAY" => {
                    let days = value
                        .split(',')
                        .map(|code| {
                            weekday_from_code(code).ok_or_else(|| {
                                SkillError::Recurrence(format!("Invalid weekday '{}'", code))
                            })
                        })
                        .collect::<SkillResult<Vec<_>>>()?;
                    by_weekday = Some(days);
                }
                _ => {}
            }
        }

        let frequency =
            frequency.ok_or_else(|| SkillError::Recurrence(format!("Missing FREQ in '{}'", s)))?;

        Ok(RecurrenceRule {
            frequency,
            interval,
            by_weekday,
        })
    }
}

fn weekday_code(day: &Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code.trim().to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn weekdays_maps_to_daily_restricted_rule() {
        let rule = RecurrenceRule::from_kind(RecurrenceKind::Weekdays);
        assert_eq!(rule.frequency, Frequency::Daily);
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.by_weekday.as_deref(), Some(&WORKING_DAYS[..]));
        assert_eq!(rule.kind(), RecurrenceKind::Weekdays);
    }

    #[test]
    fn every_kind_survives_its_own_mapping() {
        for kind in RecurrenceKind::ALL {
            assert_eq!(RecurrenceRule::from_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn rrule_text_for_weekdays() {
        let rule = RecurrenceRule::from_kind(RecurrenceKind::Weekdays);
        assert_eq!(rule.to_string(), "FREQ=DAILY;INTERVAL=1;BYDAY=MO,TU,WE,TH,FR");
    }

    #[test]
    fn parse_ignores_unknown_parts() {
        let rule: RecurrenceRule = "FREQ=MONTHLY;INTERVAL=1;WKST=MO".parse().unwrap();
        assert_eq!(rule, RecurrenceRule::from_kind(RecurrenceKind::Monthly));
    }

    #[test]
    fn parse_rejects_unsupported_frequency() {
        assert!("FREQ=HOURLY;INTERVAL=1".parse::<RecurrenceRule>().is_err());
        assert!("INTERVAL=1".parse::<RecurrenceRule>().is_err());
    }

    #[test]
    fn upcoming_weekdays_skip_the_weekend() {
        // Friday 2026-10-23 09:00 UTC
        let start = Utc.with_ymd_and_hms(2026, 10, 23, 9, 0, 0).unwrap();
        let rule = RecurrenceRule::from_kind(RecurrenceKind::Weekdays);

        let next = rule.upcoming(start, start, 2).unwrap();

        assert_eq!(next.len(), 2);
        assert_eq!(next[0].weekday(), Weekday::Mon);
        assert_eq!(next[0].day(), 26);
        assert_eq!(next[1].weekday(), Weekday::Tue);
    }
}
