//! The on-disk calendar document.
//!
//! Existing files are kept as raw text split into top-level component
//! blocks, so writing back a file we did not change reproduces it byte for
//! byte. New events are generated with the icalendar crate and appended as
//! blocks of their own, using the line ending the file already has.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use icalendar::{
    Calendar, CalendarDateTime, Component, DatePerhapsTime,
    parser::{self, read_calendar, unfold},
};

use crate::error::{SkillError, SkillResult};
use crate::event::{CalendarEvent, Description};
use crate::extract::localize;
use crate::locale::capitalize;

const ICS_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

const EMPTY_HEAD: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:CALDIR-SKILL\r\n";
const EMPTY_TAIL: &str = "END:VCALENDAR\r\n";

/// A VCALENDAR file as head, component blocks and tail.
#[derive(Debug, Clone, PartialEq)]
pub struct IcsDocument {
    head: String,
    components: Vec<String>,
    tail: String,
}

impl Default for IcsDocument {
    fn default() -> Self {
        IcsDocument {
            head: EMPTY_HEAD.to_string(),
            components: Vec::new(),
            tail: EMPTY_TAIL.to_string(),
        }
    }
}

impl IcsDocument {
    pub fn parse(content: &str) -> SkillResult<Self> {
        read_calendar(&unfold(content)).map_err(|e| SkillError::IcsParse(e.to_string()))?;

        let mut head = String::new();
        let mut components: Vec<String> = Vec::new();
        let mut tail = String::new();
        let mut current: Option<String> = None;
        let mut depth = 0usize;

        for line in content.split_inclusive('\n') {
            let name = line.trim_end();

            if let Some(block) = current.as_mut() {
                block.push_str(line);
                if is_begin(name) {
                    depth += 1;
                } else if is_end(name) {
                    depth -= 1;
                }
                if depth == 1 {
                    components.extend(current.take());
                }
                continue;
            }

            if !tail.is_empty() || (depth == 1 && name.eq_ignore_ascii_case("END:VCALENDAR")) {
                tail.push_str(line);
                continue;
            }

            if is_begin(name) {
                depth += 1;
                if depth == 2 {
                    current = Some(line.to_string());
                    continue;
                }
            }

            // Calendar properties between components stay with the block
            // they follow.
            match components.last_mut() {
                Some(last) => last.push_str(line),
                None => head.push_str(line),
            }
        }

        if current.is_some() {
            return Err(SkillError::IcsParse("Unterminated component".to_string()));
        }
        let opens_calendar = head
            .lines()
            .find(|l| !l.trim().is_empty())
            .is_some_and(|l| l.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"));
        if !opens_calendar || tail.is_empty() {
            return Err(SkillError::IcsParse("Not a VCALENDAR document".to_string()));
        }

        Ok(IcsDocument {
            head,
            components,
            tail,
        })
    }

    pub fn push_event(&mut self, event: &CalendarEvent, stamp: DateTime<Utc>) -> SkillResult<()> {
        let block = generate_event(event, stamp)?;
        let block = if self.head.contains("\r\n") {
            block
        } else {
            block.replace("\r\n", "\n")
        };

        self.components.push(block);
        Ok(())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Events this skill can represent. Other components, and events
    /// without a usable description or start, are skipped.
    pub fn events(&self) -> Vec<CalendarEvent> {
        let content = self.to_string();
        let unfolded = unfold(&content);
        let calendar = match read_calendar(&unfolded) {
            Ok(calendar) => calendar,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read calendar document");
                return Vec::new();
            }
        };

        calendar
            .components
            .iter()
            .filter(|c| c.name == "VEVENT")
            .filter_map(|vevent| {
                let event = decode_event(vevent);
                if event.is_none() {
                    tracing::debug!("Skipping event without description or start");
                }
                event
            })
            .collect()
    }
}

impl fmt::Display for IcsDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.head)?;
        for component in &self.components {
            f.write_str(component)?;
        }
        f.write_str(&self.tail)
    }
}

fn is_begin(line: &str) -> bool {
    line.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("BEGIN:"))
}

fn is_end(line: &str) -> bool {
    line.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("END:"))
}

/// Generate the VEVENT block for an event.
fn generate_event(event: &CalendarEvent, stamp: DateTime<Utc>) -> SkillResult<String> {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);
    ics_event.add_property("DTSTAMP", stamp.format(ICS_UTC_FORMAT).to_string());
    ics_event.summary(event.description.as_str());
    ics_event.description(event.description.as_str());
    ics_event.add_property("DTSTART", event.start.format(ICS_UTC_FORMAT).to_string());

    if let Some(ref rule) = event.recurrence {
        ics_event.add_property("RRULE", rule.to_string());
    }

    let mut cal = Calendar::new();
    cal.push(ics_event.done());
    let text = cal.done().to_string();

    let start = text.find("BEGIN:VEVENT");
    let end = text.find("END:VEVENT").map(|i| {
        let i = i + "END:VEVENT".len();
        if text[i..].starts_with("\r\n") {
            i + 2
        } else if text[i..].starts_with('\n') {
            i + 1
        } else {
            i
        }
    });

    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            let mut block = text[start..end].to_string();
            if !block.ends_with('\n') {
                block.push_str("\r\n");
            }
            Ok(block)
        }
        _ => Err(SkillError::IcsGenerate(format!(
            "No VEVENT in generated calendar for '{}'",
            event.uid
        ))),
    }
}

fn decode_event(vevent: &parser::Component) -> Option<CalendarEvent> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_default();

    let description = vevent
        .find_prop("DESCRIPTION")
        .or_else(|| vevent.find_prop("SUMMARY"))
        .map(|p| p.val.to_string())?;
    let description = Description::new(capitalize(description.trim())).ok()?;

    let start = to_utc(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?)?;

    let recurrence = vevent.find_prop("RRULE").and_then(|p| {
        p.val
            .as_ref()
            .parse()
            .inspect_err(|e| tracing::warn!(uid, error = %e, "Ignoring recurrence"))
            .ok()
    });

    Some(CalendarEvent {
        uid,
        description,
        start,
        recurrence,
    })
}

fn to_utc(dpt: DatePerhapsTime) -> Option<DateTime<Utc>> {
    match dpt {
        DatePerhapsTime::Date(d) => Some(d.and_time(NaiveTime::MIN).and_utc()),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(dt),
            CalendarDateTime::Floating(naive) => Some(naive.and_utc()),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                let tz: chrono_tz::Tz = tzid.parse().ok()?;
                localize(&tz, date_time).map(|dt| dt.with_timezone(&Utc))
            }
        },
    }
}
