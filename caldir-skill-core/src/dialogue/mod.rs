//! Follow-up questions for missing event slots.
//!
//! The creation flow talks to the user only through the [`Conversation`]
//! trait. Each call blocks until the user has answered (or given up), so the
//! flow itself is a plain sequential function.

mod orchestrator;

pub use orchestrator::{CreationOutcome, FollowUp, SlotFillOrchestrator, SlotState};

use std::collections::BTreeMap;
use std::fmt;

/// Values substituted into a dialog's `{placeholders}`.
pub type DialogData = BTreeMap<String, String>;

/// Questions asked for a missing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKey {
    DateTime,
    Description,
    Frequency,
}

impl PromptKey {
    pub fn key(&self) -> &'static str {
        match self {
            PromptKey::DateTime => "what.datetime",
            PromptKey::Description => "what.description",
            PromptKey::Frequency => "what.frequency",
        }
    }
}

impl fmt::Display for PromptKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Yes/no questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmKey {
    ShouldRecur,
}

impl ConfirmKey {
    pub fn key(&self) -> &'static str {
        match self {
            ConfirmKey::ShouldRecur => "should.event.recur",
        }
    }
}

/// Final messages shown or spoken to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKey {
    EventCreated,
    CouldNotUnderstand,
}

impl DialogKey {
    pub fn key(&self) -> &'static str {
        match self {
            DialogKey::EventCreated => "event.created",
            DialogKey::CouldNotUnderstand => "could.not.understand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

/// Validates a prompt answer before it is accepted.
pub type Validator<'a> = &'a dyn Fn(&str) -> bool;

/// The user-facing side of the creation flow.
pub trait Conversation {
    /// Ask an open question. While `validator` rejects the answer the
    /// question is asked again, as often as the implementation allows.
    /// `None` means no usable answer: the user cancelled, stayed silent or
    /// ran out of retries.
    fn prompt(&mut self, key: PromptKey, validator: Option<Validator<'_>>) -> Option<String>;

    fn confirm(&mut self, key: ConfirmKey) -> Confirmation;

    fn render(&mut self, key: DialogKey, data: &DialogData);
}
