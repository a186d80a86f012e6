//! Skill configuration at ~/.config/caldir-skill/config.toml

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALENDAR_PATH, DEFAULT_MIRROR_DIR, DEFAULT_NOTIFY_URL, DEFAULT_SCORE_THRESHOLD,
};
use crate::error::{SkillError, SkillResult};
use crate::locale::Locale;

fn default_mirror_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MIRROR_DIR)
}

fn is_default_mirror_dir(p: &PathBuf) -> bool {
    *p == default_mirror_dir()
}

fn default_calendar_path() -> PathBuf {
    PathBuf::from(DEFAULT_CALENDAR_PATH)
}

fn is_default_calendar_path(p: &PathBuf) -> bool {
    *p == default_calendar_path()
}

fn default_notify_url() -> String {
    DEFAULT_NOTIFY_URL.to_string()
}

fn default_score_threshold() -> f64 {
    DEFAULT_SCORE_THRESHOLD
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkillConfig {
    /// MagicMirror installation directory. `~` is expanded.
    #[serde(default = "default_mirror_dir", skip_serializing_if = "is_default_mirror_dir")]
    pub mirror_dir: PathBuf,

    /// Calendar file relative to `mirror_dir`.
    #[serde(
        default = "default_calendar_path",
        skip_serializing_if = "is_default_calendar_path"
    )]
    pub calendar_path: PathBuf,

    #[serde(default)]
    pub locale: Locale,

    /// IANA zone name. The system zone when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_notify_url")]
    pub notify_url: String,

    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// How often an unusable answer is asked again. Unlimited when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_retries: Option<u32>,
}

impl Default for SkillConfig {
    fn default() -> Self {
        SkillConfig {
            mirror_dir: default_mirror_dir(),
            calendar_path: default_calendar_path(),
            locale: Locale::default(),
            timezone: None,
            notify_url: default_notify_url(),
            score_threshold: default_score_threshold(),
            prompt_retries: None,
        }
    }
}

impl SkillConfig {
    pub fn config_path() -> SkillResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SkillError::Config("Could not determine config directory".into()))?
            .join("caldir-skill");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user's config, writing a commented default file first if
    /// there is none.
    pub fn load() -> SkillResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SkillResult<Self> {
        let config: SkillConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| SkillError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SkillError::Config(e.to_string()))?;

        if !(0.0..=1.0).contains(&config.score_threshold) {
            return Err(SkillError::Config(format!(
                "score_threshold must be between 0 and 1, got {}",
                config.score_threshold
            )));
        }

        Ok(config)
    }

    /// Save the current config to ~/.config/caldir-skill/config.toml
    pub fn save(&self) -> SkillResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> SkillResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SkillError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| SkillError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> SkillResult<()> {
        let contents = format!(
            "\
# caldir-skill configuration

# MagicMirror installation the calendar is served from:
# mirror_dir = \"{DEFAULT_MIRROR_DIR}\"

# Calendar file, relative to mirror_dir:
# calendar_path = \"{DEFAULT_CALENDAR_PATH}\"

# Language of utterances and replies (en-us or sv-se):
# locale = \"en-us\"

# Time zone for dates without one (defaults to the system zone):
# timezone = \"Europe/Stockholm\"

# Where the mirror serves files from:
# notify_url = \"{DEFAULT_NOTIFY_URL}\"

# How close a phrase must be to count as a recurrence (0 to 1):
# score_threshold = {DEFAULT_SCORE_THRESHOLD}

# How often to re-ask after an unusable answer:
# prompt_retries = 3
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SkillError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SkillError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn mirror_path(&self) -> PathBuf {
        let full_path_str =
            shellexpand::tilde(&self.mirror_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// The configured zone, else the system zone, else UTC.
    pub fn timezone(&self) -> SkillResult<Tz> {
        if let Some(ref name) = self.timezone {
            return name
                .parse()
                .map_err(|_| SkillError::UnknownTimezone(name.clone()));
        }

        match iana_time_zone::get_timezone() {
            Ok(name) => Ok(name.parse().unwrap_or_else(|_| {
                tracing::warn!(zone = %name, "Unknown system time zone, using UTC");
                Tz::UTC
            })),
            Err(e) => {
                tracing::warn!(error = %e, "Could not determine system time zone, using UTC");
                Ok(Tz::UTC)
            }
        }
    }
}
