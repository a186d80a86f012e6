use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::FETCH_CALENDAR_TOPIC;

/// Sent after the calendar file has been written, so a display can refetch it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreNotification {
    pub topic: String,
    pub url: String,
    pub rel_path: PathBuf,
}

impl StoreNotification {
    pub fn calendar_changed(notify_url: &str, rel_path: &Path) -> Self {
        let rel = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        StoreNotification {
            topic: FETCH_CALENDAR_TOPIC.to_string(),
            url: format!("{}/{}", notify_url.trim_end_matches('/'), rel),
            rel_path: rel_path.to_path_buf(),
        }
    }

    /// Body to deliver under [`StoreNotification::topic`].
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({ "url": self.url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_relative_path() {
        let n = StoreNotification::calendar_changed(
            "https://localhost:8080/",
            Path::new("modules/calendar/calendar.ics"),
        );
        assert_eq!(n.topic, "RELAY:calendar:FETCH_CALENDAR");
        assert_eq!(n.url, "https://localhost:8080/modules/calendar/calendar.ics");
        assert_eq!(
            n.payload(),
            serde_json::json!({ "url": "https://localhost:8080/modules/calendar/calendar.ics" })
        );
    }
}
