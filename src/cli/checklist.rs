use std::path::PathBuf;

use ansi_term::Colour;
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Subcommand};
use tracing::warn;

use crate::{
    app::AppError,
    checklist::{ChecklistDraft, Direction, EditorError},
    sequencer::range_demand,
    storage::entities::{AlertCondition, Checklist, QuestionType},
    utils::clock::DefaultClock,
};

use super::CliApp;

#[derive(Debug, Subcommand)]
pub enum ChecklistCommand {
    #[command(about = "Print the checklist")]
    Show {
        #[arg(long, help = "Print as json")]
        json: bool,
    },
    #[command(about = "Print the checklist as json, ready to be edited and passed to `checklist edit`")]
    Template,
    #[command(about = "Replace the checklist with the one in a json file")]
    Edit { path: PathBuf },
    #[command(about = "Add a question")]
    Add(AddArgs),
    #[command(about = "Remove a question")]
    Remove { id: String },
    #[command(about = "Move a question up or down")]
    Move {
        id: String,
        #[arg(value_enum)]
        direction: Direction,
    },
    #[command(about = "Always show a question last")]
    Pin {
        id: String,
        #[arg(long, help = "Remove the pin instead")]
        unset: bool,
    },
}

#[derive(Debug, ClapArgs)]
pub struct AddArgs {
    #[arg(long, short)]
    text: String,
    #[arg(long = "type", short = 'k', value_enum, default_value = "yes-no")]
    kind: QuestionType,
    #[arg(long = "option", short, help = "Choice of a multiple choice question. Can be repeated")]
    options: Vec<String>,
    #[arg(long, help = "Smallest accepted number")]
    min: Option<f64>,
    #[arg(long, help = "Largest accepted number")]
    max: Option<f64>,
    #[arg(long, help = "Only accept whole numbers")]
    integer: bool,
    #[arg(long, help = "Answers per rolling window")]
    window: Option<u32>,
    #[arg(long, help = "Don't graph this question")]
    no_graph: bool,
    #[arg(long, requires = "condition", help = "Alert when the latest value crosses this")]
    threshold: Option<f64>,
    #[arg(long, value_enum)]
    condition: Option<AlertCondition>,
    #[arg(long, help = "Option the threshold applies to, for multiple choice questions")]
    threshold_option: Option<String>,
    #[arg(long, help = "Always show this question last")]
    last: bool,
}

pub async fn process_checklist_command(app: &mut CliApp, command: ChecklistCommand) -> Result<()> {
    let clock = DefaultClock;
    match command {
        ChecklistCommand::Show { json } => {
            match (app.checklist(), json) {
                (None, _) => println!("There is no checklist yet."),
                (Some(checklist), true) => println!("{}", serde_json::to_string_pretty(checklist)?),
                (Some(checklist), false) => print_checklist(checklist),
            }
            return Ok(());
        }
        ChecklistCommand::Template => {
            let checklist = match app.checklist() {
                Some(checklist) => checklist.clone(),
                None => {
                    let draft = ChecklistDraft::new();
                    Checklist {
                        questions: draft.questions().to_vec(),
                        ..Default::default()
                    }
                }
            };
            println!("{}", serde_json::to_string_pretty(&checklist)?);
            return Ok(());
        }
        ChecklistCommand::Edit { path } => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut edited = serde_json::from_str::<Checklist>(&text)
                .with_context(|| format!("{} is not a valid checklist", path.display()))?;
            if edited.id.is_empty() {
                if let Some(current) = app.checklist() {
                    edited.id = current.id.clone();
                }
            }
            save(app, ChecklistDraft::from_checklist(&edited), &clock).await?;
        }
        ChecklistCommand::Add(args) => {
            let checklist = app.checklist().ok_or(AppError::NoChecklist)?;
            let mut draft = ChecklistDraft::from_checklist(checklist);
            let id = add_question(&mut draft, args)?;
            save(app, draft, &clock).await?;
            println!("Added question {id}");
        }
        ChecklistCommand::Remove { id } => {
            let mut draft = ChecklistDraft::from_optional(app.checklist());
            draft.remove_question(&id)?;
            save(app, draft, &clock).await?;
        }
        ChecklistCommand::Move { id, direction } => {
            let mut draft = ChecklistDraft::from_optional(app.checklist());
            let index = draft
                .questions()
                .iter()
                .position(|q| q.id == id)
                .ok_or_else(|| EditorError::UnknownQuestion(id.clone()))?;
            if !draft.move_question(index, direction) {
                println!("Question {id} can't move further");
                return Ok(());
            }
            save(app, draft, &clock).await?;
        }
        ChecklistCommand::Pin { id, unset } => {
            let mut draft = ChecklistDraft::from_optional(app.checklist());
            draft.set_last(&id, !unset)?;
            save(app, draft, &clock).await?;
        }
    }

    if let Some(checklist) = app.checklist() {
        print_checklist(checklist);
    }
    Ok(())
}

fn add_question(draft: &mut ChecklistDraft, args: AddArgs) -> Result<String> {
    let id = {
        let question = draft.add_question();
        question.text = args.text;
        question.id.clone()
    };
    draft.set_type(&id, args.kind)?;

    let question = draft.question_mut(&id)?;
    if args.kind == QuestionType::MultipleChoice {
        question.options = args.options;
    }
    question.validation.min = args.min;
    question.validation.max = args.max;
    question.validation.integer = args.integer;
    question.graph_config.alert_condition = args.condition;
    question.graph_config.threshold_option = args.threshold_option;

    draft.set_threshold(&id, args.threshold)?;
    if let Some(window) = args.window {
        draft.set_rolling_window(&id, window)?;
    }
    if args.no_graph {
        draft.set_graph_enabled(&id, false)?;
    }
    if args.last {
        draft.set_last(&id, true)?;
    }
    Ok(id)
}

async fn save(app: &mut CliApp, draft: ChecklistDraft, clock: &DefaultClock) -> Result<()> {
    let checklist = app.save_draft(draft, clock).await?;
    for ((start, end), count) in range_demand(&checklist.questions) {
        let room = end
            .min(checklist.questions.len())
            .saturating_sub(start.saturating_sub(1));
        if count > room {
            warn!("Range {start}-{end} has {count} questions but only {room} slots");
            println!(
                "{}",
                Colour::Yellow.paint(format!(
                    "Range {start}-{end} has {count} questions but only {room} slots, some will be placed freely"
                ))
            );
        }
    }
    println!("{}", Colour::Green.paint("Checklist saved"));
    Ok(())
}

fn print_checklist(checklist: &Checklist) {
    println!("{}", Colour::White.bold().paint(&checklist.title));
    if !checklist.description.is_empty() {
        println!("{}", checklist.description);
    }
    for (i, q) in checklist.questions_in_order().into_iter().enumerate() {
        let mut flags = vec![q.kind.to_string()];
        if q.is_last {
            flags.push("last".into());
        }
        if q.graph_config.is_enabled() {
            flags.push(format!("graph window {}", q.graph_config.window_size()));
        }
        if let (Some(threshold), Some(condition)) =
            (q.graph_config.threshold_value, q.graph_config.alert_condition)
        {
            match &q.graph_config.threshold_option {
                Some(option) => flags.push(format!("alert {option} {condition} {threshold}")),
                None => flags.push(format!("alert {condition} {threshold}")),
            }
        }
        println!("{:>3}. {} [{}] ({})", i + 1, q.text, flags.join(", "), q.id);
        if !q.options.is_empty() {
            println!("     options: {}", q.options.join(", "));
        }
    }
}
