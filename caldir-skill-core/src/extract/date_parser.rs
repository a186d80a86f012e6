//! Base date recognition.
//!
//! The extractor trusts the base parser for the calendar date. The time of
//! day it returns is only a default, used when the leftover digits give no
//! time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::extract::{has_digit, localize, time_from_digits};
use crate::locale::{Locale, LocaleTable};

/// A natural-language date parser.
///
/// Returns the date found in `text` (as a date-time in the parser's time
/// zone) together with the text that remains once the date words are
/// removed, or `None` when `text` holds no date.
pub trait DateParser {
    fn parse(&self, text: &str, locale: Locale) -> Option<(DateTime<Tz>, String)>;
}

/// Recognizes dates from the locale's calendar vocabulary: relative days
/// ("tomorrow"), weekday names ("next friday"), ISO dates and month names
/// with an ordinal day ("march 20th", "20th of march").
///
/// For English text with no such words, contiguous digit-free phrases are
/// handed to `fuzzydate`. Text that holds nothing but a time of day
/// ("lunch 1230") is dated today.
#[derive(Debug, Clone)]
pub struct LexicalDateParser {
    timezone: Tz,
    reference: Option<DateTime<Tz>>,
}

impl LexicalDateParser {
    pub fn new(timezone: Tz) -> Self {
        LexicalDateParser {
            timezone,
            reference: None,
        }
    }

    /// Resolve relative dates against a fixed instant instead of the clock.
    pub fn with_reference(reference: DateTime<Tz>) -> Self {
        LexicalDateParser {
            timezone: reference.timezone(),
            reference: Some(reference),
        }
    }

    fn today(&self) -> NaiveDate {
        self.reference
            .unwrap_or_else(|| Utc::now().with_timezone(&self.timezone))
            .date_naive()
    }

    fn match_at(&self, words: &[&str], i: usize, table: &LocaleTable) -> Option<(NaiveDate, usize)> {
        let today = self.today();
        let calendar = &table.calendar;

        // "tomorrow", "day after tomorrow", ... (longest phrase wins)
        let relative = calendar
            .relative_days
            .iter()
            .filter(|(phrase, _)| starts_with_phrase(&words[i..], phrase))
            .max_by_key(|(phrase, _)| phrase.split_whitespace().count());
        if let Some((phrase, offset)) = relative {
            let end = i + phrase.split_whitespace().count();
            return Some((today + Duration::days(*offset), end));
        }

        // "next friday"
        if calendar.next.iter().any(|w| w == words[i]) {
            if let Some(weekday) = words.get(i + 1).and_then(|w| table.weekday_for(w)) {
                return Some((next_weekday(today, weekday), i + 2));
            }
        }

        // "friday", or "fri" when it reads as a date ("on fri", "fri 1400")
        if let Some(weekday) = table.weekday_for(words[i]) {
            if !table.is_weekday_abbreviation(words[i])
                || abbreviation_has_context(words, i, table)
            {
                return Some((next_weekday(today, weekday), i + 1));
            }
        }

        if words[i].len() == 10 {
            if let Ok(date) = NaiveDate::parse_from_str(words[i], "%Y-%m-%d") {
                return Some((date, i + 1));
            }
        }

        // "march 20th [2027]"
        if let Some(month) = table.month_for(words[i]) {
            let day = words.get(i + 1).and_then(|w| table.ordinal_day(w))?;
            return resolve_month_day(today, month, day, words, i + 2);
        }

        // "20th [of] march [2027]"
        if let Some(day) = table.ordinal_day(words[i]) {
            let mut j = i + 1;
            if words.get(j).is_some_and(|w| calendar.day_of.iter().any(|d| d == w)) {
                j += 1;
            }
            let month = words.get(j).and_then(|w| table.month_for(w))?;
            return resolve_month_day(today, month, day, words, j + 1);
        }

        None
    }

    /// Try `fuzzydate` on digit-free windows, longest and leftmost first.
    fn fuzzy_match(&self, words: &[&str], table: &LocaleTable) -> Option<(NaiveDate, usize, usize)> {
        const MAX_WINDOW: usize = 3;

        for width in (1..=MAX_WINDOW.min(words.len())).rev() {
            for start in 0..=words.len() - width {
                let window = &words[start..start + width];
                if window.iter().any(|w| {
                    has_digit(w)
                        || table.is_time_word(w)
                        || table.is_weekday_abbreviation(w)
                        || table.is_month_abbreviation(w)
                }) {
                    continue;
                }

                if let Ok(parsed) = fuzzydate::parse(window.join(" ").as_str()) {
                    tracing::debug!(phrase = %window.join(" "), "fuzzydate recognized date");
                    return Some((parsed.date(), start, start + width));
                }
            }
        }

        None
    }
}

impl DateParser for LexicalDateParser {
    fn parse(&self, text: &str, locale: Locale) -> Option<(DateTime<Tz>, String)> {
        let table = locale.table();
        let words: Vec<&str> = text
            .split_whitespace()
            .map(|w| w.trim_end_matches([',', '!', '?', ';']))
            .filter(|w| !w.is_empty())
            .collect();

        let lexical = (0..words.len())
            .find_map(|i| self.match_at(&words, i, table).map(|(date, end)| (date, i, end)));

        let matched = lexical.or_else(|| match locale {
            Locale::EnUs => self.fuzzy_match(&words, table),
            _ => None,
        });

        let (date, mut start, end) = match matched {
            Some(found) => found,
            None if words.iter().any(|w| has_digit(w) && time_from_digits(w).is_some()) => {
                tracing::debug!("Only a time of day given, dating it today");
                (self.today(), 0, 0)
            }
            None => return None,
        };
        let time = table.evening_time(&words[start..end]).unwrap_or(NaiveTime::MIN);

        // "on the 20th of march": the connectors belong to the date
        for _ in 0..2 {
            if start > 0 && table.calendar.connectors.iter().any(|c| c == words[start - 1]) {
                start -= 1;
            }
        }

        let date_time = localize(&self.timezone, date.and_time(time))?;
        let residual = words[..start]
            .iter()
            .chain(&words[end..])
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        Some((date_time, residual))
    }
}

fn starts_with_phrase(words: &[&str], phrase: &str) -> bool {
    let phrase: Vec<&str> = phrase.split_whitespace().collect();
    words.len() >= phrase.len() && words[..phrase.len()] == phrase[..]
}

/// Whether the weekday abbreviation at `i` is used as a date: led by "next"
/// or "on", or followed by a time or a day number.
fn abbreviation_has_context(words: &[&str], i: usize, table: &LocaleTable) -> bool {
    let calendar = &table.calendar;
    let led = i.checked_sub(1).is_some_and(|p| {
        calendar.next.iter().chain(&calendar.weekday_leads).any(|w| w == words[p])
    });
    let followed = words
        .get(i + 1)
        .is_some_and(|w| has_digit(w) || table.is_time_word(w));

    led || followed
}

/// The next `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: chrono::Weekday) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today + Duration::days(ahead as i64)
}

/// Build a date from month and day, consuming a four-digit year at `next`
/// if there is one. Without a year the next such date on or after today is
/// used.
fn resolve_month_day(
    today: NaiveDate,
    month: u32,
    day: u32,
    words: &[&str],
    next: usize,
) -> Option<(NaiveDate, usize)> {
    let year = words
        .get(next)
        .filter(|w| w.len() == 4)
        .and_then(|w| w.parse::<i32>().ok())
        .filter(|y| (1970..=2200).contains(y));

    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, next + 1));
    }

    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some((date, next)),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day).map(|d| (d, next)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Stockholm;

    // Monday 2026-10-19, 10:00 in Stockholm
    fn parser() -> LexicalDateParser {
        LexicalDateParser::with_reference(Stockholm.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn relative_day_is_removed_from_residual() {
        let (dt, rest) = parser().parse("meeting tomorrow at 15.00", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 20));
        assert_eq!(rest, "meeting at 15.00");
    }

    #[test]
    fn longest_relative_phrase_wins() {
        let (dt, rest) = parser().parse("party the day after tomorrow", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 21));
        assert_eq!(rest, "party");
    }

    #[test]
    fn weekday_is_next_occurrence() {
        let (dt, rest) = parser().parse("gym on friday", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 23));
        assert_eq!(rest, "gym");

        let (dt, _) = parser().parse("standup next monday", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 26));
    }

    #[test]
    fn month_and_ordinal_day() {
        let (dt, rest) = parser().parse("review march 20th", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2027, 3, 20));
        assert_eq!(rest, "review");

        let (dt, rest) = parser()
            .parse("dinner on the 24th of december 2026", Locale::EnUs)
            .unwrap();
        assert_eq!(dt.date_naive(), date(2026, 12, 24));
        assert_eq!(rest, "dinner");
    }

    #[test]
    fn iso_date() {
        let (dt, rest) = parser().parse("party 2026-12-31 20.00", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 12, 31));
        assert_eq!(rest, "party 20.00");
    }

    #[test]
    fn swedish_vocabulary() {
        let (dt, rest) = parser().parse("möte i morgon kl 15.00", Locale::SvSe).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 20));
        assert_eq!(rest, "möte kl 15.00");

        let (dt, rest) = parser().parse("fika på fredag", Locale::SvSe).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 23));
        assert_eq!(rest, "fika");
    }

    #[test]
    fn date_is_midnight_in_parser_zone() {
        let (dt, _) = parser().parse("tomorrow", Locale::EnUs).unwrap();
        assert_eq!(dt, Stockholm.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn no_date_words() {
        assert!(parser().parse("vattna blommorna", Locale::SvSe).is_none());
        assert!(parser().parse("", Locale::SvSe).is_none());
    }

    #[test]
    fn a_bare_time_is_today() {
        let (dt, rest) = parser().parse("lunch 1230", Locale::EnUs).unwrap();
        assert_eq!(dt, Stockholm.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap());
        assert_eq!(rest, "lunch 1230");

        let (dt, _) = parser().parse("möte kl 15.00", Locale::SvSe).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 19));

        assert!(parser().parse("ticket 1234567", Locale::EnUs).is_none());
    }

    #[test]
    fn tonight_defaults_to_the_evening() {
        let (dt, rest) = parser().parse("dinner tonight", Locale::EnUs).unwrap();
        assert_eq!(dt, Stockholm.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap());
        assert_eq!(rest, "dinner");

        let (dt, _) = parser().parse("middag i kväll", Locale::SvSe).unwrap();
        assert_eq!(dt, Stockholm.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap());
    }

    #[test]
    fn abbreviations_need_date_context() {
        assert!(parser().parse("walk in the sun", Locale::EnUs).is_none());
        assert!(parser().parse("wed plans", Locale::EnUs).is_none());
        assert!(parser().parse("köp en ons", Locale::SvSe).is_none());

        let (dt, rest) = parser().parse("review on wed at 14.00", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 21));
        assert_eq!(rest, "review at 14.00");

        let (dt, _) = parser().parse("brunch sat 11.00", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 24));

        let (dt, _) = parser().parse("standup next fri", Locale::EnUs).unwrap();
        assert_eq!(dt.date_naive(), date(2026, 10, 23));
    }
}
