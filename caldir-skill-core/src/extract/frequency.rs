//! Recurrence phrase matching.

use std::ops::Range;

use crate::constants::DEFAULT_SCORE_THRESHOLD;
use crate::extract::ExtractionOutcome;
use crate::locale::Locale;
use crate::recurrence::{RecurrenceKind, RecurrenceRule};

/// Fuzzy-matches the locale's recurrence phrases ("every week", "daily",
/// ...) anywhere in an utterance.
///
/// A run of words is only scored against a phrase when each word could be a
/// typo of the phrase word in its place: same first letter and one edit
/// away (two for words of eight letters or more). "monthy" is scored
/// against "monthly"; "early" is never scored against "yearly".
#[derive(Debug, Clone)]
pub struct FrequencyMatcher {
    locale: Locale,
    score_threshold: f64,
}

/// Best phrase match seen so far.
#[derive(Debug, Clone)]
struct PhraseMatch {
    kind: RecurrenceKind,
    score: f64,
    span: Range<usize>,
}

impl FrequencyMatcher {
    pub fn new(locale: Locale) -> Self {
        FrequencyMatcher {
            locale,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    pub fn contains_frequency(&self, utterance: &str) -> bool {
        self.extract(utterance).is_found()
    }

    pub fn extract(&self, utterance: &str) -> ExtractionOutcome<RecurrenceRule> {
        let utterance = utterance.to_lowercase();
        let words: Vec<&str> = utterance.split_whitespace().collect();
        if words.is_empty() {
            return ExtractionOutcome::NotFound;
        }

        let table = self.locale.table();

        // Strictly greater scores replace the best so far, so on a tie the
        // kind enumerated first keeps the match.
        let best = RecurrenceKind::ALL
            .iter()
            .flat_map(|&kind| table.phrases_for(kind).iter().map(move |p| (kind, p)))
            .fold(None::<PhraseMatch>, |best, (kind, phrase)| {
                let Some((score, span)) = best_window(&words, phrase) else {
                    return best;
                };
                match best {
                    Some(b) if b.score >= score => Some(b),
                    _ => Some(PhraseMatch { kind, score, span }),
                }
            });

        let Some(best) = best.filter(|b| b.score >= self.score_threshold) else {
            tracing::debug!(utterance, "No recurrence phrase above threshold");
            return ExtractionOutcome::NotFound;
        };

        let residual = words
            .iter()
            .enumerate()
            .filter(|(i, _)| !best.span.contains(i))
            .map(|(_, w)| *w)
            .collect::<Vec<_>>()
            .join(" ");

        tracing::debug!(kind = best.kind.as_str(), score = best.score, residual, "Matched recurrence");
        ExtractionOutcome::Found {
            value: RecurrenceRule::from_kind(best.kind),
            residual,
        }
    }
}

/// Score `phrase` against every run of the same number of words that
/// could spell it, and return the best score with its word span.
fn best_window(words: &[&str], phrase: &str) -> Option<(f64, Range<usize>)> {
    let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
    let width = phrase_words.len().max(1);

    words
        .windows(width)
        .enumerate()
        .filter(|(_, window)| could_spell(window, &phrase_words))
        .map(|(start, window)| {
            let score = strsim::normalized_levenshtein(&window.join(" "), phrase);
            (score, start..start + width)
        })
        .fold(None, |best: Option<(f64, Range<usize>)>, (score, span)| match best {
            Some((best_score, _)) if best_score >= score => best,
            _ => Some((score, span)),
        })
}

fn could_spell(window: &[&str], phrase: &[&str]) -> bool {
    window.len() == phrase.len()
        && window.iter().zip(phrase).all(|(word, expected)| {
            let max_edits = 1 + expected.chars().count() / 8;
            word.chars().next() == expected.chars().next()
                && strsim::levenshtein(word, expected) <= max_edits
        })
}
