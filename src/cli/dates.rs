use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

fn validation_error(message: String) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}

/// Parses dates like "yesterday", "2 days ago" or "15/03/2025" into a local calendar day.
pub fn parse_day(
    value: Option<&str>,
    style: DateStyle,
    now: DateTime<Local>,
) -> Result<Option<NaiveDate>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_date_string(value, now, style.into()) {
        Ok(v) => Ok(Some(v.with_timezone(&Local).date_naive())),
        Err(e) => Err(validation_error(format!(
            "Failed to validate date {value:?}: {e}"
        ))),
    }
}

/// Submissions are identified by their exact submission time, as printed by `history list`.
pub fn parse_submission_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| {
            validation_error(format!(
                "{value:?} is not a submission time like 2024-01-01T07:00:00Z: {e}"
            ))
        })
}
