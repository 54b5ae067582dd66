//! A single pass through the checklist, from the first question to the submission.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::{
    sequencer::{session_order, OrderingPolicy},
    storage::entities::{
        AnswerSubmission, AnswerValue, Checklist, NumberValidation, Question, QuestionType,
    },
    utils::clock::Clock,
};

/// Reasons a number answer can't be accepted. The user has to correct it before moving on.
#[derive(Error, Debug, PartialEq)]
pub enum AnswerError {
    #[error("Please enter a number")]
    Missing,
    #[error("{0:?} is not a valid number")]
    NotANumber(String),
    #[error("Please enter a whole number")]
    NotInteger,
    #[error("Please enter a number of at least {0}")]
    BelowMinimum(f64),
    #[error("Please enter a number of at most {0}")]
    AboveMaximum(f64),
}

pub fn validate_number(validation: &NumberValidation, raw: &str) -> Result<f64, AnswerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AnswerError::Missing);
    }
    let value = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnswerError::NotANumber(raw.to_string()))?;

    if validation.integer && value.fract() != 0. {
        return Err(AnswerError::NotInteger);
    }
    if let Some(min) = validation.min {
        if value < min {
            return Err(AnswerError::BelowMinimum(min));
        }
    }
    if let Some(max) = validation.max {
        if value > max {
            return Err(AnswerError::AboveMaximum(max));
        }
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Finished,
}

pub struct ChecklistSession {
    checklist_id: String,
    checklist_title: String,
    order: Vec<Question>,
    position: usize,
    answers: BTreeMap<String, AnswerValue>,
    started_at: DateTime<Utc>,
}

impl ChecklistSession {
    /// Orders the questions and records the start time. A checklist without questions can't be
    /// answered.
    pub fn start<R: Rng + ?Sized>(
        checklist: &Checklist,
        policy: OrderingPolicy,
        rng: &mut R,
        clock: &dyn Clock,
    ) -> Option<Self> {
        if checklist.questions.is_empty() {
            return None;
        }
        let order = session_order(&checklist.questions, policy, rng)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        debug!("Starting session with {} questions", order.len());
        Some(Self {
            checklist_id: checklist.id.clone(),
            checklist_title: checklist.title.clone(),
            order,
            position: 0,
            answers: BTreeMap::new(),
            started_at: clock.time(),
        })
    }

    pub fn current(&self) -> Option<&Question> {
        self.order.get(self.position)
    }

    /// 1-based index of the current question and the total.
    pub fn progress(&self) -> (usize, usize) {
        ((self.position + 1).min(self.order.len()), self.order.len())
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.order.len()
    }

    /// Records the answer to the current question and moves on. Number questions have to pass
    /// their validation, anything else is accepted and an empty value skips the question.
    pub fn answer(&mut self, raw: Option<&str>) -> Result<Step, AnswerError> {
        let Some(question) = self.order.get(self.position) else {
            return Ok(Step::Finished);
        };

        match question.kind {
            QuestionType::Number => {
                let value = validate_number(&question.validation, raw.unwrap_or_default())?;
                self.answers
                    .insert(question.id.clone(), AnswerValue::Number(value));
            }
            _ => match raw.filter(|v| !v.is_empty()) {
                Some(v) => {
                    self.answers
                        .insert(question.id.clone(), AnswerValue::Text(v.to_string()));
                }
                None => debug!("Question {} skipped", question.id),
            },
        }

        self.position += 1;
        if self.is_finished() {
            Ok(Step::Finished)
        } else {
            Ok(Step::Next)
        }
    }

    /// Builds the history entry. Questions that weren't answered are left out.
    pub fn into_submission(self, clock: &dyn Clock) -> AnswerSubmission {
        let submitted_at = clock.time();
        let duration = (submitted_at - self.started_at).num_milliseconds().max(0) as u64;
        AnswerSubmission {
            checklist_id: self.checklist_id,
            checklist_title: self.checklist_title,
            submitted_at,
            answers: self.answers,
            duration: Some(duration),
        }
    }
}
