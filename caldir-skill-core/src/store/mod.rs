//! The calendar file on disk.
//!
//! One `.ics` file under a root directory holds every event. Writers take an
//! exclusive lock on a sibling `.lock` file, re-read the calendar, append and
//! replace the file atomically, so concurrent writers never lose each
//! other's events and readers never see a half-written file.

mod ics;
mod notify;

pub use ics::IcsDocument;
pub use notify::StoreNotification;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use tokio::sync::broadcast;

use crate::config::SkillConfig;
use crate::constants::DEFAULT_NOTIFY_URL;
use crate::error::{SkillError, SkillResult};
use crate::event::CalendarEvent;

const NOTIFICATION_CAPACITY: usize = 16;

/// Held while the calendar file is being rewritten.
struct StoreLock {
    _file: File,
}

impl StoreLock {
    fn acquire(calendar_path: &Path) -> SkillResult<Self> {
        let mut name = calendar_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "calendar".into());
        name.push(".lock");
        let path = calendar_path.with_file_name(name);

        let file = File::create(&path).map_err(|e| SkillError::store_io(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| SkillError::store_io(&path, e))?;

        Ok(StoreLock { _file: file })
    }
}

pub struct EventStore {
    root: PathBuf,
    rel_path: PathBuf,
    notify_url: String,
    document: IcsDocument,
    notifier: broadcast::Sender<StoreNotification>,
}

impl EventStore {
    /// Open the calendar at `root/rel_path`. A missing or empty file is a
    /// new, empty calendar; its directory is created so the first write
    /// succeeds.
    pub fn open(root: impl Into<PathBuf>, rel_path: impl Into<PathBuf>) -> SkillResult<Self> {
        let root = root.into();
        let rel_path = rel_path.into();
        let path = root.join(&rel_path);

        let document = load_document(&path)?;
        tracing::debug!(
            path = %path.display(),
            components = document.component_count(),
            "Opened calendar"
        );

        let (notifier, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Ok(EventStore {
            root,
            rel_path,
            notify_url: DEFAULT_NOTIFY_URL.to_string(),
            document,
            notifier,
        })
    }

    pub fn from_config(config: &SkillConfig) -> SkillResult<Self> {
        Ok(Self::open(config.mirror_path(), &config.calendar_path)?
            .with_notify_url(config.notify_url.clone()))
    }

    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = url.into();
        self
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(&self.rel_path)
    }

    /// Events currently in the calendar, in file order.
    pub fn events(&self) -> Vec<CalendarEvent> {
        self.document.events()
    }

    /// Receive a notification after every successful write.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreNotification> {
        self.notifier.subscribe()
    }

    /// Write the calendar as currently held in memory.
    pub fn save(&self) -> SkillResult<()> {
        let path = self.path();
        let lock = StoreLock::acquire(&path)?;
        write_atomically(&path, &self.document.to_string())?;
        drop(lock);

        self.notify();
        Ok(())
    }

    /// Append `event` and persist. On error neither the file nor the
    /// in-memory calendar has changed.
    pub fn add_event(&mut self, event: &CalendarEvent) -> SkillResult<()> {
        let path = self.path();
        let lock = StoreLock::acquire(&path)?;

        // Another writer may have added events since we opened the file.
        let mut document = load_document(&path)?;
        document.push_event(event, Utc::now())?;
        write_atomically(&path, &document.to_string())?;
        drop(lock);

        self.document = document;
        tracing::info!(uid = %event.uid, path = %path.display(), "Event stored");

        self.notify();
        Ok(())
    }

    fn notify(&self) {
        let notification = StoreNotification::calendar_changed(&self.notify_url, &self.rel_path);
        let url = notification.url.clone();
        match self.notifier.send(notification) {
            Ok(receivers) => tracing::info!(%url, receivers, "Calendar change announced"),
            Err(_) => tracing::debug!("No listeners for calendar notification"),
        }
    }
}

fn load_document(path: &Path) -> SkillResult<IcsDocument> {
    match fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => IcsDocument::parse(&content),
        Ok(_) => Ok(IcsDocument::default()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| SkillError::store_io(parent, e))?;
            }
            Ok(IcsDocument::default())
        }
        Err(e) => Err(SkillError::store_io(path, e)),
    }
}

fn write_atomically(path: &Path, content: &str) -> SkillResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| SkillError::store_io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SkillError::store_io(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SkillError::store_io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| SkillError::store_io(path, e.error))?;

    Ok(())
}
