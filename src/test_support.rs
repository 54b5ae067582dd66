//! Builders shared by unit tests.

use std::collections::BTreeMap;

use chrono::{Duration, TimeZone, Utc};

use crate::storage::entities::{
    AnswerSubmission, AnswerValue, GraphConfig, NumberValidation, Question, QuestionType,
};

pub fn question(id: &str, kind: QuestionType) -> Question {
    Question {
        id: id.into(),
        text: format!("Question {id}"),
        kind,
        options: vec![],
        validation: NumberValidation::default(),
        is_last: false,
        graph_config: GraphConfig {
            enabled: Some(true),
            ..Default::default()
        },
        order_index: None,
        random_order: None,
    }
}

/// Submissions one day apart, starting 2024-01-01 at noon UTC.
pub fn daily_history(id: &str, answers: &[AnswerValue]) -> Vec<AnswerSubmission> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    answers
        .iter()
        .enumerate()
        .map(|(i, answer)| AnswerSubmission {
            checklist_id: "c1".into(),
            checklist_title: "Daily".into(),
            submitted_at: start + Duration::days(i as i64),
            answers: BTreeMap::from([(id.to_string(), answer.clone())]),
            duration: None,
        })
        .collect()
}

pub fn text(v: &str) -> AnswerValue {
    AnswerValue::Text(v.into())
}
