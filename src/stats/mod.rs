//! Per-question time series derived from the answer history.
//!
//! Yes/no and multiple choice questions use an answer-indexed rolling window: one point for every
//! answer once at least a window's worth of answers exists. Number questions are averaged per
//! calendar day over a trailing period that ends today.

pub mod daily;
pub mod rolling;

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::{
    storage::entities::{AnswerSubmission, Checklist, Question, QuestionType},
    utils::percentage::Percentage,
};

/// Length of the trailing period for daily averages when nothing else is requested.
pub const DEFAULT_NUMBER_DAYS: u32 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatsError {
    #[error("The averaging period must contain at least one day")]
    EmptyPeriod,
    #[error("A period of {days} days ending {end} is out of the supported date range")]
    DateOutOfRange { end: NaiveDate, days: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRate {
    pub option: String,
    pub rate: Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PointValue {
    YesRate(Percentage),
    OptionRates(Vec<OptionRate>),
    Average(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub value: PointValue,
}

impl DataPoint {
    pub fn yes_rate(&self) -> Option<Percentage> {
        match &self.value {
            PointValue::YesRate(v) => Some(*v),
            _ => None,
        }
    }

    pub fn option_rate(&self, option: &str) -> Option<Percentage> {
        match &self.value {
            PointValue::OptionRates(rates) => rates
                .iter()
                .find(|v| v.option == option)
                .map(|v| v.rate),
            _ => None,
        }
    }

    pub fn average(&self) -> Option<f64> {
        match &self.value {
            PointValue::Average(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatsConfig {
    /// Trailing calendar days for number questions, today included.
    pub number_days: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            number_days: DEFAULT_NUMBER_DAYS,
        }
    }
}

/// Series of every graphed question, keyed by question id.
pub type Series = BTreeMap<String, Vec<DataPoint>>;

/// Computes the series of every question with graphing enabled. A question that fails to
/// compute gets an empty series, the rest are unaffected.
#[instrument(skip_all)]
pub fn compute_series<Tz: TimeZone>(
    checklist: &Checklist,
    history: &[AnswerSubmission],
    today: NaiveDate,
    tz: &Tz,
    config: &StatsConfig,
) -> Series {
    checklist
        .questions
        .iter()
        .filter(|q| q.graph_config.is_enabled() && q.kind.is_graphable())
        .map(|question| {
            let points = question_series(question, history, today, tz, config)
                .inspect_err(|e| error!("Failed to compute series for {}: {e}", question.id))
                .unwrap_or_default();
            debug!("Question {} has {} points", question.id, points.len());
            (question.id.clone(), points)
        })
        .collect()
}

pub fn question_series<Tz: TimeZone>(
    question: &Question,
    history: &[AnswerSubmission],
    today: NaiveDate,
    tz: &Tz,
    config: &StatsConfig,
) -> Result<Vec<DataPoint>, StatsError> {
    let window = question.graph_config.window_size();
    match question.kind {
        QuestionType::YesNo => Ok(rolling::yes_rates(&question.id, history, window, tz)),
        QuestionType::MultipleChoice => Ok(rolling::option_rates(
            &question.id,
            &question.options,
            history,
            window,
            tz,
        )),
        QuestionType::Number => {
            daily::daily_averages(&question.id, history, today, config.number_days, tz)
        }
        QuestionType::FreeText => Ok(vec![]),
    }
}
