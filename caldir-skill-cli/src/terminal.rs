//! Conversation over the terminal.

use caldir_skill_core::dialogue::Validator;
use caldir_skill_core::{
    ConfirmKey, Confirmation, Conversation, DialogData, DialogKey, Locale, PromptKey,
};
use dialoguer::{Confirm, Input};
use owo_colors::OwoColorize;

pub struct TerminalConversation {
    locale: Locale,
    /// Re-asks allowed after a rejected answer. Unlimited when `None`.
    retries: Option<u32>,
}

impl TerminalConversation {
    pub fn new(locale: Locale, retries: Option<u32>) -> Self {
        TerminalConversation { locale, retries }
    }
}

impl Conversation for TerminalConversation {
    fn prompt(&mut self, key: PromptKey, validator: Option<Validator<'_>>) -> Option<String> {
        let table = self.locale.table();
        let mut rejected = 0u32;

        loop {
            let input: String = match Input::new()
                .with_prompt(format!("  {}", table.translate(key.key())))
                .allow_empty(true)
                .interact_text()
            {
                Ok(input) => input,
                Err(e) => {
                    tracing::debug!(error = %e, "Prompt interrupted");
                    return None;
                }
            };

            let input = input.trim();
            if input.is_empty() {
                return None;
            }
            if validator.is_none_or(|valid| valid(input)) {
                return Some(input.to_string());
            }

            rejected += 1;
            if self.retries.is_some_and(|max| rejected > max) {
                return None;
            }
            eprintln!("  {}", table.translate(DialogKey::CouldNotUnderstand.key()).red());
        }
    }

    fn confirm(&mut self, key: ConfirmKey) -> Confirmation {
        let answer = Confirm::new()
            .with_prompt(format!("  {}", self.locale.table().translate(key.key())))
            .default(false)
            .interact_opt();

        match answer {
            Ok(Some(true)) => Confirmation::Yes,
            _ => Confirmation::No,
        }
    }

    fn render(&mut self, key: DialogKey, data: &DialogData) {
        let text = self.locale.table().render(key.key(), data);

        match key {
            DialogKey::EventCreated => println!("{}", format!("  {}", text).green()),
            DialogKey::CouldNotUnderstand => println!("{}", format!("  {}", text).yellow()),
        }
    }
}
