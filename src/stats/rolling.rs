use chrono::TimeZone;

use crate::{
    storage::entities::{AnswerSubmission, AnswerValue},
    utils::{percentage::ratio_percentage, time::local_date},
};

use super::{DataPoint, OptionRate, PointValue};

/// Submissions that answered `question_id`, oldest first. Submissions with the same timestamp
/// keep their history order.
fn answered<'a>(
    question_id: &str,
    history: &'a [AnswerSubmission],
) -> Vec<(&'a AnswerSubmission, &'a AnswerValue)> {
    let mut answered = history
        .iter()
        .filter_map(|entry| entry.answers.get(question_id).map(|answer| (entry, answer)))
        .collect::<Vec<_>>();
    answered.sort_by_key(|(entry, _)| entry.submitted_at);
    answered
}

/// Calls `point` for every full window of `window` answers. Each point is dated with the local
/// date of the newest answer in its window. Nothing is produced until a full window exists.
fn rolling<Tz, F>(
    question_id: &str,
    history: &[AnswerSubmission],
    window: usize,
    tz: &Tz,
    point: F,
) -> Vec<DataPoint>
where
    Tz: TimeZone,
    F: Fn(&[(&AnswerSubmission, &AnswerValue)]) -> PointValue,
{
    let window = window.max(1);
    let answered = answered(question_id, history);
    if answered.len() < window {
        return vec![];
    }

    answered
        .windows(window)
        .map(|slice| {
            let (newest, _) = slice[slice.len() - 1];
            DataPoint {
                date: local_date(newest.submitted_at, tz),
                value: point(slice),
            }
        })
        .collect()
}

/// Share of "yes" answers per window.
pub fn yes_rates<Tz: TimeZone>(
    question_id: &str,
    history: &[AnswerSubmission],
    window: usize,
    tz: &Tz,
) -> Vec<DataPoint> {
    rolling(question_id, history, window, tz, |slice| {
        let yes = slice.iter().filter(|(_, answer)| answer.is("yes")).count();
        PointValue::YesRate(ratio_percentage(yes, slice.len()))
    })
}

/// Share of every configured option per window. Answers matching no option still take up room
/// in the window.
pub fn option_rates<Tz: TimeZone>(
    question_id: &str,
    options: &[String],
    history: &[AnswerSubmission],
    window: usize,
    tz: &Tz,
) -> Vec<DataPoint> {
    rolling(question_id, history, window, tz, |slice| {
        let rates = options
            .iter()
            .map(|option| {
                let count = slice.iter().filter(|(_, answer)| answer.is(option)).count();
                OptionRate {
                    option: option.clone(),
                    rate: ratio_percentage(count, slice.len()),
                }
            })
            .collect();
        PointValue::OptionRates(rates)
    })
}
