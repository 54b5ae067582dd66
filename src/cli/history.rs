use anyhow::{anyhow, Result};
use chrono::{Local, SecondsFormat};
use clap::{Args as ClapArgs, Subcommand};

use crate::{
    history::{filter_history, HistoryFilter, SortOrder},
    storage::entities::{AnswerSubmission, Checklist},
    utils::time::format_duration_ms,
};

use super::{
    dates::{parse_day, parse_submission_time, DateStyle},
    CliApp,
};

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    #[command(about = "List past answers")]
    List(ListArgs),
    #[command(about = "Delete the submission made at the given time")]
    Delete {
        #[arg(help = "Submission time as printed by `history list`, e.g. 2024-01-01T07:00:00.000Z")]
        submitted_at: String,
    },
}

#[derive(Debug, ClapArgs)]
pub struct ListArgs {
    #[arg(
        long,
        short,
        help = "First day included. Examples are \"yesterday\", \"2 weeks ago\", \"15/03/2025\""
    )]
    start: Option<String>,
    #[arg(
        long,
        short,
        help = "Last day included. Examples are \"today\", \"15/03/2025\""
    )]
    end: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long = "answer",
        short,
        value_parser = parse_answer_filter,
        help = "Only show submissions whose answer matches, as question_id=value. Can be repeated"
    )]
    answers: Vec<(String, String)>,
    #[arg(long, value_enum, default_value_t = SortOrder::Descending)]
    order: SortOrder,
}

fn parse_answer_filter(value: &str) -> Result<(String, String)> {
    let (id, filter) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("expected question_id=value"))?;
    Ok((id.trim().to_string(), filter.to_string()))
}

pub async fn process_history_command(app: &mut CliApp, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List(args) => {
            let now = Local::now();
            let filter = HistoryFilter {
                start: parse_day(args.start.as_deref(), args.date_style, now)?,
                end: parse_day(args.end.as_deref(), args.date_style, now)?,
                answers: args.answers,
            };
            let entries = filter_history(app.history(), app.checklist(), &filter, args.order, &Local);
            if entries.is_empty() {
                println!("No submissions found.");
                return Ok(());
            }
            for entry in entries {
                print_entry(entry, app.checklist());
            }
            Ok(())
        }
        HistoryCommand::Delete { submitted_at } => {
            let submitted_at = parse_submission_time(&submitted_at)?;
            app.delete_answer(submitted_at).await?;
            println!("Deleted the submission from {}", submitted_at.with_timezone(&Local));
            Ok(())
        }
    }
}

fn print_entry(entry: &AnswerSubmission, checklist: Option<&Checklist>) {
    let duration = entry
        .duration
        .map(format_duration_ms)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}\t{}\t{}\t{}",
        entry.submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        entry.submitted_at.with_timezone(&Local).format("%x %H:%M"),
        duration,
        entry.checklist_title
    );

    // Columns follow the checklist, answers to removed questions come last.
    let mut shown = vec![];
    if let Some(checklist) = checklist {
        for question in checklist.questions_in_order() {
            let answer = entry
                .answers
                .get(&question.id)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("\t{}: {answer}", question.text);
            shown.push(question.id.as_str());
        }
    }
    for (id, answer) in &entry.answers {
        if !shown.contains(&id.as_str()) {
            println!("\t{id} (removed question): {answer}");
        }
    }
}
