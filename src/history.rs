//! Filtering and sorting of past submissions for display.

use chrono::{NaiveDate, TimeZone};
use clap::ValueEnum;

use crate::{
    storage::entities::{AnswerSubmission, AnswerValue, Checklist, QuestionType},
    utils::time::local_date,
};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// First local calendar day included.
    pub start: Option<NaiveDate>,
    /// Last local calendar day included.
    pub end: Option<NaiveDate>,
    /// Question id and the value its answer has to match.
    pub answers: Vec<(String, String)>,
}

fn answer_matches(kind: QuestionType, answer: &AnswerValue, filter: &str) -> bool {
    let answer = answer.as_text();
    match kind {
        QuestionType::YesNo | QuestionType::MultipleChoice => {
            answer.to_lowercase() == filter.to_lowercase()
        }
        QuestionType::Number => answer.contains(filter),
        QuestionType::FreeText => answer.to_lowercase().contains(&filter.to_lowercase()),
    }
}

fn entry_matches<Tz: TimeZone>(
    entry: &AnswerSubmission,
    checklist: Option<&Checklist>,
    filter: &HistoryFilter,
    tz: &Tz,
) -> bool {
    let date = local_date(entry.submitted_at, tz);
    if filter.start.is_some_and(|start| date < start) || filter.end.is_some_and(|end| date > end) {
        return false;
    }

    filter
        .answers
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .all(|(question_id, value)| {
            // Filters on questions that no longer exist don't apply.
            let Some(question) = checklist.and_then(|c| c.question(question_id)) else {
                return true;
            };
            entry
                .answers
                .get(question_id)
                .is_some_and(|answer| answer_matches(question.kind, answer, value))
        })
}

pub fn filter_history<'a, Tz: TimeZone>(
    history: &'a [AnswerSubmission],
    checklist: Option<&Checklist>,
    filter: &HistoryFilter,
    order: SortOrder,
    tz: &Tz,
) -> Vec<&'a AnswerSubmission> {
    let mut entries = history
        .iter()
        .filter(|entry| entry_matches(entry, checklist, filter, tz))
        .collect::<Vec<_>>();
    match order {
        SortOrder::Ascending => entries.sort_by_key(|e| e.submitted_at),
        SortOrder::Descending => entries.sort_by_key(|e| std::cmp::Reverse(e.submitted_at)),
    }
    entries
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, Utc};

    use crate::{
        storage::entities::{AnswerSubmission, AnswerValue, Checklist, QuestionType},
        test_support::{daily_history, question, text},
    };

    use super::{filter_history, HistoryFilter, SortOrder};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn checklist() -> Checklist {
        Checklist {
            questions: vec![
                question("walk", QuestionType::YesNo),
                question("hours", QuestionType::Number),
                question("notes", QuestionType::FreeText),
            ],
            ..Default::default()
        }
    }

    fn history() -> Vec<AnswerSubmission> {
        let mut history = daily_history("walk", &[text("Yes"), text("no"), text("yes")]);
        history[0].answers.insert("hours".into(), AnswerValue::Number(7.5));
        history[1].answers.insert("hours".into(), text("8"));
        history[0].answers.insert("notes".into(), text("Felt GREAT"));
        history
    }

    fn days(entries: &[&AnswerSubmission]) -> Vec<NaiveDate> {
        entries.iter().map(|e| e.submitted_at.date_naive()).collect()
    }

    #[test]
    fn test_default_is_newest_first() {
        let history = history();
        let entries = filter_history(
            &history,
            None,
            &HistoryFilter::default(),
            SortOrder::default(),
            &Utc,
        );
        assert_eq!(days(&entries), vec![date(3), date(2), date(1)]);

        let entries = filter_history(
            &history,
            None,
            &HistoryFilter::default(),
            SortOrder::Ascending,
            &Utc,
        );
        assert_eq!(days(&entries), vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let history = history();
        let filter = HistoryFilter {
            start: Some(date(2)),
            end: Some(date(2)),
            ..Default::default()
        };
        let entries = filter_history(&history, None, &filter, SortOrder::Ascending, &Utc);
        assert_eq!(days(&entries), vec![date(2)]);

        // Noon UTC is still the previous day in UTC-13.
        let offset = FixedOffset::west_opt(13 * 3600).unwrap();
        let filter = HistoryFilter {
            start: Some(date(1)),
            end: Some(date(2)),
            ..Default::default()
        };
        let entries = filter_history(&history, None, &filter, SortOrder::Ascending, &offset);
        assert_eq!(days(&entries), vec![date(2), date(3)]);
    }

    #[test]
    fn test_answer_filters() {
        let history = history();
        let checklist = checklist();
        let run = |answers: &[(&str, &str)]| {
            let filter = HistoryFilter {
                answers: answers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            };
            days(&filter_history(
                &history,
                Some(&checklist),
                &filter,
                SortOrder::Ascending,
                &Utc,
            ))
        };

        assert_eq!(run(&[("walk", "YES")]), vec![date(1), date(3)]);
        assert_eq!(run(&[("walk", "ye")]), Vec::<NaiveDate>::new());
        assert_eq!(run(&[("hours", "7")]), vec![date(1)]);
        assert_eq!(run(&[("notes", "great")]), vec![date(1)]);
        assert_eq!(run(&[("walk", "yes"), ("hours", "8")]), Vec::<NaiveDate>::new());
        assert_eq!(run(&[("walk", ""), ("deleted", "x")]), vec![date(1), date(2), date(3)]);
    }
}
