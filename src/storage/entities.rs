use std::{borrow::Cow, collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Window used for rolling rates when a question doesn't configure its own.
pub const DEFAULT_ROLLING_WINDOW: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    YesNo,
    MultipleChoice,
    Number,
    FreeText,
}

impl QuestionType {
    /// Types for which statistics, graphs and alerts are defined.
    pub fn is_graphable(self) -> bool {
        matches!(
            self,
            QuestionType::YesNo | QuestionType::MultipleChoice | QuestionType::Number
        )
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::YesNo => write!(f, "yes/no"),
            QuestionType::MultipleChoice => write!(f, "multiple choice"),
            QuestionType::Number => write!(f, "number"),
            QuestionType::FreeText => write!(f, "free text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCondition::Above => write!(f, "above"),
            AlertCondition::Below => write!(f, "below"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    /// Unset in checklists saved before graphing could be toggled. The editor fills it in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_condition: Option<AlertCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_window_size: Option<u32>,
    /// Graph title used by older checklists. Read so that old documents still load, never
    /// written back.
    #[serde(default, skip_serializing)]
    pub custom_name: Option<String>,
}

impl GraphConfig {
    /// Unset counts as disabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// Number of answers in a rolling window. Unset or zero falls back to the default.
    pub fn window_size(&self) -> usize {
        match self.rolling_window_size {
            None | Some(0) => DEFAULT_ROLLING_WINDOW as usize,
            Some(v) => v as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub integer: bool,
}

/// 1-indexed inclusive range of positions a question may be shuffled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionRange {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedPosition {
    Last,
}

/// Ordering constraints understood by the ranged ordering policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomOrder {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<PositionRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<FixedPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default)]
    pub validation: NumberValidation,
    #[serde(default)]
    pub is_last: bool,
    #[serde(default)]
    pub graph_config: GraphConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_order: Option<RandomOrder>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Checklist {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions in their editing order. Missing order indexes sort as 0.
    pub fn questions_in_order(&self) -> Vec<&Question> {
        let mut questions = self.questions.iter().collect::<Vec<_>>();
        questions.sort_by_key(|q| q.order_index.unwrap_or(0));
        questions
    }
}

/// Value of a single answer. Number questions answered through the session are stored as
/// numbers, everything else as text. Older documents stored numbers as text, so both are
/// accepted wherever a number is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            AnswerValue::Number(v) => *v,
            AnswerValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<f64>().ok()?
            }
            AnswerValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            AnswerValue::Number(v) => Cow::Owned(v.to_string()),
            AnswerValue::Text(s) => Cow::Borrowed(s),
            AnswerValue::Other(v) => Cow::Owned(v.to_string()),
        }
    }

    /// Exact comparison against a textual answer such as "yes" or a choice option.
    pub fn is(&self, expected: &str) -> bool {
        matches!(self, AnswerValue::Text(s) if s == expected)
    }
}

impl Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// A single completed checklist. `submitted_at` identifies the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    #[serde(default)]
    pub checklist_id: String,
    #[serde(default)]
    pub checklist_title: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: BTreeMap<String, AnswerValue>,
    /// Time spent answering, in milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Everything except wiki pages. Always read and written as a whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub checklist: Option<Checklist>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<AnswerSubmission>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dismissed_alerts: Vec<String>,
}

/// Reads `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
