//! Threshold alerts on the latest point of every graphed question.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    stats::{DataPoint, Series},
    storage::entities::{AlertCondition, Checklist, Question, QuestionType},
    utils::time::date_label,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "option")]
pub enum AlertTarget {
    YesRate,
    Option(String),
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRule {
    pub threshold: f64,
    pub condition: AlertCondition,
    pub target: AlertTarget,
}

impl AlertRule {
    /// Rule configured on a question. Incomplete configurations have no rule.
    pub fn for_question(question: &Question) -> Option<Self> {
        let config = &question.graph_config;
        if !config.is_enabled() {
            return None;
        }
        let threshold = config.threshold_value?;
        let condition = config.alert_condition?;
        let target = match question.kind {
            QuestionType::YesNo => AlertTarget::YesRate,
            QuestionType::MultipleChoice => AlertTarget::Option(config.threshold_option.clone()?),
            QuestionType::Number => AlertTarget::Value,
            QuestionType::FreeText => return None,
        };
        Some(Self {
            threshold,
            condition,
            target,
        })
    }

    pub fn relevant_value(&self, point: &DataPoint) -> Option<f64> {
        match &self.target {
            AlertTarget::YesRate => point.yes_rate().map(|v| *v),
            AlertTarget::Option(option) => point.option_rate(option).map(|v| *v),
            AlertTarget::Value => point.average(),
        }
    }

    /// Strict comparison, a value equal to the threshold never alerts.
    pub fn holds(&self, value: f64) -> bool {
        match self.condition {
            AlertCondition::Above => value > self.threshold,
            AlertCondition::Below => value < self.threshold,
        }
    }
}

pub fn alert_id(question_id: &str, date: NaiveDate) -> String {
    format!("{question_id}-{}", date_label(date))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub question_id: String,
    pub question_text: String,
    pub rule: AlertRule,
    pub actual_value: f64,
    pub date: NaiveDate,
}

impl Alert {
    pub fn describe(&self) -> String {
        let verb = match self.rule.condition {
            AlertCondition::Above => "exceeded",
            AlertCondition::Below => "fell below",
        };
        let subject = match &self.rule.target {
            AlertTarget::YesRate => "yes rate".to_string(),
            AlertTarget::Option(option) => format!("rate of {option:?}"),
            AlertTarget::Value => "daily average".to_string(),
        };
        format!(
            "{}: {subject} {:.1} {verb} {} on {}",
            self.question_text,
            self.actual_value,
            self.rule.threshold,
            date_label(self.date)
        )
    }
}

/// Alerts whose condition holds on the latest point and that weren't dismissed.
pub fn active_alerts(checklist: &Checklist, series: &Series, dismissed: &[String]) -> Vec<Alert> {
    checklist
        .questions_in_order()
        .into_iter()
        .filter_map(|question| {
            let rule = AlertRule::for_question(question)?;
            let latest = series.get(&question.id)?.last()?;
            let value = rule.relevant_value(latest)?;
            if !rule.holds(value) {
                return None;
            }
            let id = alert_id(&question.id, latest.date);
            if dismissed.contains(&id) {
                return None;
            }
            Some(Alert {
                id,
                question_id: question.id.clone(),
                question_text: question.text.clone(),
                rule,
                actual_value: value,
                date: latest.date,
            })
        })
        .collect()
}

/// Adds `id` to the dismissed set. Returns false when it was already there.
pub fn dismiss(dismissed: &mut Vec<String>, id: &str) -> bool {
    if dismissed.iter().any(|v| v == id) {
        return false;
    }
    dismissed.push(id.to_string());
    true
}
