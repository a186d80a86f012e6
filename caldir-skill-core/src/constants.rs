/// Minimum fuzzy-match score for a recurrence phrase to count as found.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// MagicMirror installation the calendar module is served from.
pub const DEFAULT_MIRROR_DIR: &str = "~/MagicMirror";

/// Calendar file, relative to the mirror directory.
pub const DEFAULT_CALENDAR_PATH: &str = "modules/calendar/calendar.ics";

/// Base URL the mirror serves its files from.
pub const DEFAULT_NOTIFY_URL: &str = "https://localhost:8080/";

/// Message bus topic that makes the mirror's calendar module refetch.
pub const FETCH_CALENDAR_TOPIC: &str = "RELAY:calendar:FETCH_CALENDAR";

/// Suffix appended to generated event UIDs.
pub const UID_DOMAIN: &str = "caldir-skill";
