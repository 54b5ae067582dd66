use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, TimeZone};
use tracing::trace;

use crate::{storage::entities::AnswerSubmission, utils::time::local_date};

use super::{DataPoint, PointValue, StatsError};

/// First day of a `days` long period that ends on `end`, both included.
pub fn period_start(end: NaiveDate, days: u32) -> Result<NaiveDate, StatsError> {
    if days == 0 {
        return Err(StatsError::EmptyPeriod);
    }
    end.checked_sub_days(Days::new(u64::from(days) - 1))
        .ok_or(StatsError::DateOutOfRange { end, days })
}

/// Average of numeric answers per local calendar day over the last `days` days. Days without a
/// numeric answer have no point.
pub fn daily_averages<Tz: TimeZone>(
    question_id: &str,
    history: &[AnswerSubmission],
    today: NaiveDate,
    days: u32,
    tz: &Tz,
) -> Result<Vec<DataPoint>, StatsError> {
    let start = period_start(today, days)?;

    let mut totals = BTreeMap::<NaiveDate, (f64, usize)>::new();
    for entry in history {
        let Some(value) = entry.answers.get(question_id).and_then(|v| v.as_number()) else {
            continue;
        };
        let date = local_date(entry.submitted_at, tz);
        if date < start || date > today {
            trace!("Skipping {question_id} answer from {date}");
            continue;
        }
        let (sum, count) = totals.entry(date).or_default();
        *sum += value;
        *count += 1;
    }

    Ok(totals
        .into_iter()
        .map(|(date, (sum, count))| DataPoint {
            date,
            value: PointValue::Average(sum / count as f64),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};

    use crate::{
        stats::StatsError,
        storage::entities::AnswerValue,
        test_support::{daily_history, text},
    };

    use super::{daily_averages, period_start};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_period_start() {
        assert_eq!(period_start(date(30), 30), Ok(date(1)));
        assert_eq!(period_start(date(30), 1), Ok(date(30)));
        assert_eq!(period_start(date(30), 0), Err(StatsError::EmptyPeriod));
        assert!(matches!(
            period_start(NaiveDate::MIN, 2),
            Err(StatsError::DateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_averages_per_day() {
        let mut history = daily_history(
            "mood",
            &[AnswerValue::Number(2.), text("4"), text("n/a"), text("")],
        );
        // Second answer on the first day.
        let mut extra = history[0].clone();
        extra.submitted_at += Duration::hours(3);
        extra.answers.insert("mood".into(), AnswerValue::Number(4.));
        history.push(extra);

        let points = daily_averages("mood", &history, date(4), 30, &Utc).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date(1));
        assert_eq!(points[0].average(), Some(3.));
        assert_eq!(points[1].date, date(2));
        assert_eq!(points[1].average(), Some(4.));
    }

    #[test]
    fn test_period_bounds() {
        let values = (1..=10).map(|v| AnswerValue::Number(v as f64)).collect::<Vec<_>>();
        let history = daily_history("mood", &values);

        let points = daily_averages("mood", &history, date(8), 3, &Utc).unwrap();
        assert_eq!(
            points.iter().map(|p| p.date).collect::<Vec<_>>(),
            vec![date(6), date(7), date(8)]
        );
    }
}
