use anyhow::{Context, Result};
use caldir_skill_core::{CalendarEvent, EventStore, SkillConfig};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

pub fn run() -> Result<()> {
    let config = SkillConfig::load().context("Failed to load configuration")?;
    let store = EventStore::from_config(&config)?;
    let tz = config.timezone()?;
    let table = config.locale.table();

    let now = Utc::now();
    let events = store.events();
    let total = events.len();

    let mut upcoming: Vec<(DateTime<Utc>, CalendarEvent)> = events
        .into_iter()
        .filter_map(|event| next_occurrence(&event, now).map(|next| (next, event)))
        .collect();
    upcoming.sort_by(|a, b| a.0.cmp(&b.0));

    if upcoming.is_empty() {
        println!("{}", "No upcoming events".dimmed());
    }

    for (next, event) in &upcoming {
        let repeats = event
            .recurrence
            .as_ref()
            .map(|rule| format!("({})", table.nice_frequency(rule)))
            .unwrap_or_default();

        println!(
            "  {}  {} {}",
            table.nice_date(&next.with_timezone(&tz)).bold(),
            event.description,
            repeats.dimmed()
        );
    }

    let past = total - upcoming.len();
    if past > 0 {
        println!("{}", format!("  {} past event(s) not shown", past).dimmed());
    }

    Ok(())
}

/// The first start at or after `now`.
fn next_occurrence(event: &CalendarEvent, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if event.start >= now {
        return Some(event.start);
    }

    let rule = event.recurrence.as_ref()?;
    match rule.upcoming(event.start, now, 1) {
        Ok(dates) => dates.into_iter().next(),
        Err(e) => {
            tracing::warn!(uid = %event.uid, error = %e, "Could not expand recurrence");
            None
        }
    }
}
