//! Turn a free-text request into a calendar event.
//!
//! This crate provides everything between an utterance and the `.ics` file:
//! - `extract` finds the start date-time and the recurrence in the text
//! - `dialogue` asks follow-up questions for whatever is missing
//! - `store` appends the finished event to the calendar file

pub mod config;
pub mod constants;
pub mod description;
pub mod dialogue;
pub mod error;
pub mod event;
pub mod extract;
pub mod locale;
pub mod recurrence;
pub mod store;

pub use config::SkillConfig;
pub use description::DescriptionNormalizer;
pub use dialogue::{
    ConfirmKey, Confirmation, Conversation, CreationOutcome, DialogData, DialogKey, PromptKey,
    SlotFillOrchestrator, SlotState,
};
pub use error::{SkillError, SkillResult};
pub use event::{CalendarEvent, CandidateEvent, Description};
pub use extract::{DateParser, DateTimeExtractor, ExtractionOutcome, FrequencyMatcher, LexicalDateParser};
pub use locale::Locale;
pub use recurrence::{RecurrenceKind, RecurrenceRule};
pub use store::{EventStore, StoreNotification};
