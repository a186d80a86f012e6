use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::SkillConfig;
use crate::description::DescriptionNormalizer;
use crate::dialogue::{
    ConfirmKey, Confirmation, Conversation, DialogData, DialogKey, PromptKey,
};
use crate::error::{SkillError, SkillResult};
use crate::event::{CalendarEvent, CandidateEvent};
use crate::extract::{DateParser, DateTimeExtractor, FrequencyMatcher, LexicalDateParser};
use crate::locale::Locale;
use crate::recurrence::RecurrenceRule;
use crate::store::EventStore;

/// What an utterance already says about the event.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Blank,
    DateTimeOnly {
        date_time: DateTime<Tz>,
    },
    DateTimeAndFrequency {
        date_time: DateTime<Tz>,
        frequency: RecurrenceRule,
        description: Option<String>,
    },
    DateTimeAndDescription {
        date_time: DateTime<Tz>,
        description: String,
    },
    FrequencyOnly {
        frequency: RecurrenceRule,
        description: Option<String>,
    },
    DescriptionOnly {
        description: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    AskDateTime,
    AskDescription,
    AskRecurrence,
}

impl SlotState {
    /// Split into the slots already filled and the questions still to ask,
    /// in asking order.
    pub fn plan(self) -> (CandidateEvent, Vec<FollowUp>) {
        use FollowUp::*;

        match self {
            SlotState::Blank => (
                CandidateEvent::default(),
                vec![AskDateTime, AskDescription, AskRecurrence],
            ),
            SlotState::DateTimeOnly { date_time } => (
                CandidateEvent {
                    date_time: Some(date_time),
                    ..Default::default()
                },
                vec![AskDescription, AskRecurrence],
            ),
            SlotState::DateTimeAndFrequency {
                date_time,
                frequency,
                description,
            } => {
                let follow_ups = if description.is_none() {
                    vec![AskDescription]
                } else {
                    Vec::new()
                };
                (
                    CandidateEvent {
                        date_time: Some(date_time),
                        description,
                        frequency: Some(frequency),
                    },
                    follow_ups,
                )
            }
            SlotState::DateTimeAndDescription {
                date_time,
                description,
            } => (
                CandidateEvent {
                    date_time: Some(date_time),
                    description: Some(description),
                    frequency: None,
                },
                vec![AskRecurrence],
            ),
            SlotState::FrequencyOnly {
                frequency,
                description,
            } => {
                let mut follow_ups = vec![AskDateTime];
                if description.is_none() {
                    follow_ups.push(AskDescription);
                }
                (
                    CandidateEvent {
                        date_time: None,
                        description,
                        frequency: Some(frequency),
                    },
                    follow_ups,
                )
            }
            SlotState::DescriptionOnly { description } => (
                CandidateEvent {
                    description: Some(description),
                    ..Default::default()
                },
                vec![AskDateTime, AskRecurrence],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreationOutcome {
    Created(CalendarEvent),
    /// The user was told the request could not be understood.
    NotUnderstood,
}

/// Drives one event creation request: classify the utterance, ask for
/// whatever is missing, build the event and store it.
pub struct SlotFillOrchestrator<P = LexicalDateParser> {
    datetime: DateTimeExtractor<P>,
    frequency: FrequencyMatcher,
    normalizer: DescriptionNormalizer,
    locale: Locale,
}

impl SlotFillOrchestrator<LexicalDateParser> {
    pub fn from_config(config: &SkillConfig) -> SkillResult<Self> {
        let parser = LexicalDateParser::new(config.timezone()?);
        Ok(Self::new(parser, config.locale).with_threshold(config.score_threshold))
    }
}

impl<P: DateParser> SlotFillOrchestrator<P> {
    pub fn new(parser: P, locale: Locale) -> Self {
        SlotFillOrchestrator {
            datetime: DateTimeExtractor::new(parser, locale),
            frequency: FrequencyMatcher::new(locale),
            normalizer: DescriptionNormalizer::new(locale),
            locale,
        }
    }

    pub fn with_threshold(mut self, score_threshold: f64) -> Self {
        self.frequency = self.frequency.with_threshold(score_threshold);
        self
    }

    pub fn classify(&self, utterance: Option<&str>) -> SlotState {
        let Some(utterance) = utterance.filter(|u| !u.trim().is_empty()) else {
            return SlotState::Blank;
        };

        if let Some((date_time, rest)) = self.datetime.extract(utterance).into_found() {
            if rest.trim().is_empty() {
                return SlotState::DateTimeOnly { date_time };
            }

            return match self.frequency.extract(&rest).into_found() {
                Some((frequency, rest)) => SlotState::DateTimeAndFrequency {
                    date_time,
                    frequency,
                    description: non_blank(rest),
                },
                None => SlotState::DateTimeAndDescription {
                    date_time,
                    description: rest,
                },
            };
        }

        match self.frequency.extract(utterance).into_found() {
            Some((frequency, rest)) => SlotState::FrequencyOnly {
                frequency,
                description: non_blank(rest),
            },
            None => SlotState::DescriptionOnly {
                description: utterance.to_string(),
            },
        }
    }

    /// Gather every slot, asking follow-up questions as needed.
    pub fn fill(
        &self,
        utterance: Option<&str>,
        conversation: &mut dyn Conversation,
    ) -> SkillResult<CalendarEvent> {
        self.gather(utterance, conversation).map(|(event, _)| event)
    }

    /// Run a whole creation request against `store`.
    ///
    /// Missing answers and unusable slots end the request with the
    /// "could not understand" dialog. Store failures are returned.
    pub fn create_event(
        &self,
        utterance: Option<&str>,
        conversation: &mut dyn Conversation,
        store: &mut EventStore,
    ) -> SkillResult<CreationOutcome> {
        let (event, tz) = match self.gather(utterance, conversation) {
            Ok(gathered) => gathered,
            Err(e) if e.is_recoverable() => {
                tracing::error!(error = %e, "Could not create event");
                conversation.render(DialogKey::CouldNotUnderstand, &DialogData::new());
                return Ok(CreationOutcome::NotUnderstood);
            }
            Err(e) => return Err(e),
        };

        store.add_event(&event)?;

        conversation.render(DialogKey::EventCreated, &self.created_dialog(&event, tz));
        Ok(CreationOutcome::Created(event))
    }

    fn gather(
        &self,
        utterance: Option<&str>,
        conversation: &mut dyn Conversation,
    ) -> SkillResult<(CalendarEvent, Tz)> {
        let state = self.classify(utterance);
        tracing::debug!(?state, "Classified utterance");

        let (mut candidate, follow_ups) = state.plan();
        for follow_up in follow_ups {
            match follow_up {
                FollowUp::AskDateTime => {
                    candidate.date_time = Some(self.ask_date_time(conversation)?);
                }
                FollowUp::AskDescription => {
                    candidate.description = Some(self.ask_description(conversation)?);
                }
                FollowUp::AskRecurrence => {
                    candidate.frequency = self.ask_recurrence(conversation)?;
                }
            }
        }

        let tz = candidate
            .date_time
            .as_ref()
            .map(|dt| dt.timezone())
            .ok_or(SkillError::NoDateTimeFound)?;
        Ok((candidate.into_event(&self.normalizer)?, tz))
    }

    fn ask_date_time(&self, conversation: &mut dyn Conversation) -> SkillResult<DateTime<Tz>> {
        let validator = |answer: &str| self.datetime.contains_datetime(answer);
        let answer = conversation
            .prompt(PromptKey::DateTime, Some(&validator))
            .ok_or(SkillError::DialogueAborted(PromptKey::DateTime.key()))?;

        self.datetime
            .extract(&answer)
            .into_found()
            .map(|(date_time, _)| date_time)
            .ok_or(SkillError::NoDateTimeFound)
    }

    fn ask_description(&self, conversation: &mut dyn Conversation) -> SkillResult<String> {
        conversation
            .prompt(PromptKey::Description, None)
            .ok_or(SkillError::DialogueAborted(PromptKey::Description.key()))
    }

    fn ask_recurrence(
        &self,
        conversation: &mut dyn Conversation,
    ) -> SkillResult<Option<RecurrenceRule>> {
        if conversation.confirm(ConfirmKey::ShouldRecur) == Confirmation::No {
            return Ok(None);
        }

        let validator = |answer: &str| self.frequency.contains_frequency(answer);
        let answer = conversation
            .prompt(PromptKey::Frequency, Some(&validator))
            .ok_or(SkillError::DialogueAborted(PromptKey::Frequency.key()))?;

        Ok(self.frequency.extract(&answer).value().cloned())
    }

    fn created_dialog(&self, event: &CalendarEvent, tz: Tz) -> DialogData {
        let table = self.locale.table();

        let frequency = match event.recurrence {
            Some(ref rule) => {
                let data = DialogData::from([(
                    "frequency".to_string(),
                    table.nice_frequency(rule),
                )]);
                table.render("event.created.frequency", &data)
            }
            None => String::new(),
        };

        DialogData::from([
            ("description".to_string(), event.description.to_string()),
            (
                "date_time".to_string(),
                table.nice_date(&event.start.with_timezone(&tz)),
            ),
            ("frequency".to_string(), frequency),
        ])
    }
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::Validator;
    use crate::recurrence::RecurrenceKind;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Europe::Stockholm;
    use std::collections::VecDeque;

    const REL_PATH: &str = "modules/calendar/calendar.ics";

    /// Answers prompts from a script. `None` in the script is a user who
    /// gives up.
    #[derive(Default)]
    struct ScriptedConversation {
        answers: VecDeque<Option<&'static str>>,
        confirmations: VecDeque<Confirmation>,
        asked: Vec<&'static str>,
        rejected: Vec<&'static str>,
        rendered: Vec<(DialogKey, DialogData)>,
    }

    impl ScriptedConversation {
        fn new(answers: &[Option<&'static str>], confirmations: &[Confirmation]) -> Self {
            ScriptedConversation {
                answers: answers.iter().copied().collect(),
                confirmations: confirmations.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl Conversation for ScriptedConversation {
        fn prompt(&mut self, key: PromptKey, validator: Option<Validator<'_>>) -> Option<String> {
            self.asked.push(key.key());
            loop {
                let answer = self.answers.pop_front()??;
                if validator.is_none_or(|valid| valid(answer)) {
                    return Some(answer.to_string());
                }
                self.rejected.push(answer);
            }
        }

        fn confirm(&mut self, key: ConfirmKey) -> Confirmation {
            self.asked.push(key.key());
            self.confirmations.pop_front().unwrap_or(Confirmation::No)
        }

        fn render(&mut self, key: DialogKey, data: &DialogData) {
            self.rendered.push((key, data.clone()));
        }
    }

    fn monday_morning() -> DateTime<Tz> {
        Stockholm.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
    }

    fn orchestrator(locale: Locale) -> SlotFillOrchestrator {
        SlotFillOrchestrator::new(LexicalDateParser::with_reference(monday_morning()), locale)
    }

    fn stockholm(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Stockholm
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn classifies_every_slot_combination() {
        let o = orchestrator(Locale::EnUs);

        assert_eq!(o.classify(None), SlotState::Blank);
        assert_eq!(o.classify(Some("   ")), SlotState::Blank);

        assert!(matches!(
            o.classify(Some("tomorrow at 1500")),
            SlotState::DateTimeOnly { .. }
        ));

        match o.classify(Some("meeting tomorrow at 1500 weekly")) {
            SlotState::DateTimeAndFrequency {
                frequency,
                description,
                ..
            } => {
                assert_eq!(frequency.kind(), RecurrenceKind::Weekly);
                assert_eq!(description.as_deref(), Some("meeting"));
            }
            other => panic!("unexpected {:?}", other),
        }

        match o.classify(Some("tomorrow 0800 daily")) {
            SlotState::DateTimeAndFrequency { description, .. } => assert_eq!(description, None),
            other => panic!("unexpected {:?}", other),
        }

        match o.classify(Some("dentist on friday at 1400")) {
            SlotState::DateTimeAndDescription { description, .. } => {
                assert_eq!(description, "dentist")
            }
            other => panic!("unexpected {:?}", other),
        }

        match o.classify(Some("yoga every week")) {
            SlotState::FrequencyOnly { description, .. } => {
                assert_eq!(description.as_deref(), Some("yoga"))
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            o.classify(Some("buy milk")),
            SlotState::DescriptionOnly {
                description: "buy milk".to_string()
            }
        );
    }

    #[test]
    fn follow_ups_per_state() {
        use FollowUp::*;
        let date_time = monday_morning();
        let weekly = RecurrenceRule::from_kind(RecurrenceKind::Weekly);

        let cases = [
            (SlotState::Blank, vec![AskDateTime, AskDescription, AskRecurrence]),
            (SlotState::DateTimeOnly { date_time }, vec![AskDescription, AskRecurrence]),
            (
                SlotState::DateTimeAndFrequency {
                    date_time,
                    frequency: weekly.clone(),
                    description: None,
                },
                vec![AskDescription],
            ),
            (
                SlotState::DateTimeAndFrequency {
                    date_time,
                    frequency: weekly.clone(),
                    description: Some("gym".into()),
                },
                vec![],
            ),
            (
                SlotState::DateTimeAndDescription {
                    date_time,
                    description: "gym".into(),
                },
                vec![AskRecurrence],
            ),
            (
                SlotState::FrequencyOnly {
                    frequency: weekly.clone(),
                    description: None,
                },
                vec![AskDateTime, AskDescription],
            ),
            (
                SlotState::FrequencyOnly {
                    frequency: weekly.clone(),
                    description: Some("gym".into()),
                },
                vec![AskDateTime],
            ),
            (
                SlotState::DescriptionOnly {
                    description: "gym".into(),
                },
                vec![AskDateTime, AskRecurrence],
            ),
        ];

        for (state, expected) in cases {
            let (_, follow_ups) = state.clone().plan();
            assert_eq!(follow_ups, expected, "{:?}", state);
        }
    }

    #[test]
    fn complete_utterance_is_stored_without_questions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::open(dir.path(), REL_PATH).unwrap();
        let mut rx = store.subscribe();
        let mut conversation = ScriptedConversation::default();

        let outcome = orchestrator(Locale::EnUs)
            .create_event(
                Some("meeting tomorrow at 1500 weekly"),
                &mut conversation,
                &mut store,
            )
            .unwrap();

        let CreationOutcome::Created(event) = outcome else {
            panic!("event was not created");
        };
        assert_eq!(event.description.as_str(), "Meeting");
        assert_eq!(event.start, stockholm(2026, 10, 20, 15, 0));
        assert_eq!(event.recurrence.as_ref().map(RecurrenceRule::kind), Some(RecurrenceKind::Weekly));
        assert!(conversation.asked.is_empty());

        let written = std::fs::read_to_string(dir.path().join(REL_PATH)).unwrap();
        assert!(written.contains("DESCRIPTION:Meeting"), "{}", written);
        assert!(written.contains("DTSTART:20261020T130000Z"), "{}", written);
        assert!(written.contains("RRULE:FREQ=WEEKLY;INTERVAL=1"), "{}", written);

        assert!(rx.try_recv().is_ok());

        let (key, data) = &conversation.rendered[0];
        assert_eq!(*key, DialogKey::EventCreated);
        assert_eq!(data["description"], "Meeting");
        assert_eq!(data["date_time"], "Tuesday, October 20, 2026 at 15:00");
        assert_eq!(data["frequency"], ", repeating weekly");
    }

    #[test]
    fn blank_utterance_asks_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::open(dir.path(), REL_PATH).unwrap();
        let mut conversation = ScriptedConversation::new(
            &[Some("tomorrow at 9"), Some("to buy milk")],
            &[Confirmation::No],
        );

        let outcome = orchestrator(Locale::EnUs)
            .create_event(None, &mut conversation, &mut store)
            .unwrap();

        assert_eq!(
            conversation.asked,
            vec!["what.datetime", "what.description", "should.event.recur"]
        );
        let CreationOutcome::Created(event) = outcome else {
            panic!("event was not created");
        };
        assert_eq!(event.description.as_str(), "Buy milk");
        assert_eq!(event.start, stockholm(2026, 10, 20, 9, 0));
        assert_eq!(event.recurrence, None);
        assert_eq!(conversation.rendered[0].1["frequency"], "");
    }

    #[test]
    fn datetime_only_asks_description_and_frequency() {
        let mut conversation = ScriptedConversation::new(
            &[Some("dentist"), Some("every month")],
            &[Confirmation::Yes],
        );

        let event = orchestrator(Locale::EnUs)
            .fill(Some("tomorrow 1400"), &mut conversation)
            .unwrap();

        assert_eq!(
            conversation.asked,
            vec!["what.description", "should.event.recur", "what.frequency"]
        );
        assert_eq!(event.description.as_str(), "Dentist");
        assert_eq!(event.start, stockholm(2026, 10, 20, 14, 0));
        assert_eq!(event.recurrence.map(|r| r.kind()), Some(RecurrenceKind::Monthly));
    }

    #[test]
    fn frequency_only_asks_for_a_date_until_one_is_given() {
        let mut conversation =
            ScriptedConversation::new(&[Some("purple"), Some("friday 1800")], &[]);

        let event = orchestrator(Locale::EnUs)
            .fill(Some("yoga every week"), &mut conversation)
            .unwrap();

        assert_eq!(conversation.asked, vec!["what.datetime"]);
        assert_eq!(conversation.rejected, vec!["purple"]);
        assert_eq!(event.description.as_str(), "Yoga");
        assert_eq!(event.start, stockholm(2026, 10, 23, 18, 0));
        assert_eq!(event.recurrence.map(|r| r.kind()), Some(RecurrenceKind::Weekly));
    }

    #[test]
    fn bare_frequency_asks_date_then_description() {
        let mut conversation =
            ScriptedConversation::new(&[Some("next monday at 0730"), Some("standup")], &[]);

        let event = orchestrator(Locale::EnUs)
            .fill(Some("weekdays"), &mut conversation)
            .unwrap();

        assert_eq!(conversation.asked, vec!["what.datetime", "what.description"]);
        assert_eq!(event.start, stockholm(2026, 10, 26, 7, 30));
        assert_eq!(event.recurrence.map(|r| r.kind()), Some(RecurrenceKind::Weekdays));
    }

    #[test]
    fn description_only_asks_date_and_recurrence() {
        let mut conversation = ScriptedConversation::new(&[Some("friday at 1200")], &[]);

        let event = orchestrator(Locale::EnUs)
            .fill(Some("lunch with anna"), &mut conversation)
            .unwrap();

        assert_eq!(conversation.asked, vec!["what.datetime", "should.event.recur"]);
        assert_eq!(event.description.as_str(), "Lunch with anna");
        assert_eq!(event.recurrence, None);
    }

    #[test]
    fn a_time_alone_answers_the_date_question() {
        let mut conversation = ScriptedConversation::new(&[Some("at 15")], &[]);

        let event = orchestrator(Locale::EnUs)
            .fill(Some("lunch with anna"), &mut conversation)
            .unwrap();

        assert!(conversation.rejected.is_empty());
        assert_eq!(event.start, stockholm(2026, 10, 19, 15, 0));
    }

    #[test]
    fn time_without_date_keeps_the_frequency_apart() {
        match orchestrator(Locale::EnUs).classify(Some("meeting at 1500 weekly")) {
            SlotState::DateTimeAndFrequency {
                date_time,
                frequency,
                description,
            } => {
                assert_eq!(date_time.with_timezone(&Utc), stockholm(2026, 10, 19, 15, 0));
                assert_eq!(frequency.kind(), RecurrenceKind::Weekly);
                assert_eq!(description.as_deref(), Some("meeting"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn swedish_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::open(dir.path(), REL_PATH).unwrap();
        let mut conversation = ScriptedConversation::default();

        let outcome = orchestrator(Locale::SvSe)
            .create_event(
                Some("att äta lunch imorgon klockan 1200 varje vecka"),
                &mut conversation,
                &mut store,
            )
            .unwrap();

        let CreationOutcome::Created(event) = outcome else {
            panic!("event was not created");
        };
        assert_eq!(event.description.as_str(), "Äta lunch");
        assert_eq!(event.start, stockholm(2026, 10, 20, 12, 0));
        assert_eq!(event.recurrence.map(|r| r.kind()), Some(RecurrenceKind::Weekly));
    }

    #[test]
    fn giving_up_leaves_the_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REL_PATH);
        let mut store = EventStore::open(dir.path(), REL_PATH).unwrap();
        store
            .add_event(&CalendarEvent::new(
                crate::event::Description::new("Existing").unwrap(),
                Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap(),
                None,
            ))
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut conversation = ScriptedConversation::new(&[None], &[]);
        let outcome = orchestrator(Locale::EnUs)
            .create_event(Some("buy milk"), &mut conversation, &mut store)
            .unwrap();

        assert_eq!(outcome, CreationOutcome::NotUnderstood);
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(store.events().len(), 1);
        assert_eq!(conversation.rendered[0].0, DialogKey::CouldNotUnderstand);
    }

    #[test]
    fn empty_description_is_not_understood() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::open(dir.path(), REL_PATH).unwrap();
        let mut conversation = ScriptedConversation::new(&[Some("to")], &[]);

        let outcome = orchestrator(Locale::EnUs)
            .create_event(Some("tomorrow at 1000 daily"), &mut conversation, &mut store)
            .unwrap();

        assert_eq!(outcome, CreationOutcome::NotUnderstood);
        assert!(!dir.path().join(REL_PATH).exists());
    }

    #[test]
    fn store_failures_are_returned() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::open(dir.path(), REL_PATH).unwrap();

        let calendar_dir = dir.path().join("modules/calendar");
        std::fs::remove_dir(&calendar_dir).unwrap();
        std::fs::write(&calendar_dir, "").unwrap();

        let mut conversation = ScriptedConversation::default();
        let result = orchestrator(Locale::EnUs).create_event(
            Some("meeting tomorrow at 1500 weekly"),
            &mut conversation,
            &mut store,
        );

        assert!(matches!(result, Err(SkillError::StoreIo { .. })));
        assert!(conversation.rendered.is_empty());
    }
}
