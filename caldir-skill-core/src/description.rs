//! Event description clean-up.

use crate::error::{SkillError, SkillResult};
use crate::locale::{Locale, capitalize};

/// Turns leftover utterance text into a presentable description:
/// "to buy milk" becomes "Buy milk".
#[derive(Debug, Clone)]
pub struct DescriptionNormalizer {
    locale: Locale,
}

impl DescriptionNormalizer {
    pub fn new(locale: Locale) -> Self {
        DescriptionNormalizer { locale }
    }

    pub fn normalize(&self, description: &str) -> SkillResult<String> {
        let lower = description.to_lowercase();
        let mut words: Vec<&str> = lower.split_whitespace().collect();

        let markers = self.locale.table().infinitive_markers();
        if !words.is_empty() && markers.iter().any(|m| m == words[0]) {
            words.remove(0);
        }

        let Some(first) = words.first() else {
            return Err(SkillError::EmptyDescription);
        };

        let first = capitalize(first);
        Ok(std::iter::once(first.as_str())
            .chain(words[1..].iter().copied())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
