use std::io::Write;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::{
    sequencer::OrderingPolicy,
    session::{ChecklistSession, Step},
    storage::entities::{Question, QuestionType},
    utils::{clock::DefaultClock, time::format_duration_ms},
};

use super::CliApp;

#[derive(Debug, Parser)]
pub struct TakeCommand {
    #[arg(
        long,
        value_enum,
        default_value_t = OrderingPolicy::PinnedLast,
        help = "How questions are ordered. Ranged uses the per question ranges of older checklists"
    )]
    ordering: OrderingPolicy,
}

pub async fn process_take_command(
    app: &mut CliApp,
    TakeCommand { ordering }: TakeCommand,
) -> Result<()> {
    let Some(checklist) = app.checklist() else {
        println!("There is no checklist yet. Create one with `routinely checklist edit`.");
        return Ok(());
    };

    let clock = DefaultClock;
    let mut rng = rand::thread_rng();
    let Some(session) = ChecklistSession::start(checklist, ordering, &mut rng, &clock) else {
        println!("The checklist has no questions.");
        return Ok(());
    };

    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = std::io::stdout();
    let session = run_session(session, &mut input, &mut output).await?;

    let submission = session.into_submission(&clock);
    let duration = submission.duration.unwrap_or_default();
    app.add_answer(submission).await?;
    info!("Checklist answered in {duration}ms");
    println!("Answers recorded in {}.", format_duration_ms(duration));
    Ok(())
}

fn prompt(question: &Question) -> String {
    match question.kind {
        QuestionType::YesNo => "[y]es / [n]o, empty to skip".to_string(),
        QuestionType::MultipleChoice => {
            let options = question
                .options
                .iter()
                .enumerate()
                .map(|(i, v)| format!("{}) {v}", i + 1))
                .collect::<Vec<_>>()
                .join("  ");
            format!("{options}, empty to skip")
        }
        QuestionType::Number => {
            let mut hints = vec![];
            if question.validation.integer {
                hints.push("whole number".to_string());
            }
            if let Some(min) = question.validation.min {
                hints.push(format!("min {min}"));
            }
            if let Some(max) = question.validation.max {
                hints.push(format!("max {max}"));
            }
            if hints.is_empty() {
                "number".to_string()
            } else {
                format!("number, {}", hints.join(", "))
            }
        }
        QuestionType::FreeText => "text, empty to skip".to_string(),
    }
}

/// Turns a typed line into the stored answer. `None` means the line should be asked again.
fn interpret(question: &Question, line: &str) -> Option<Option<String>> {
    let line = line.trim();
    match question.kind {
        QuestionType::YesNo => match line.to_lowercase().as_str() {
            "" => Some(None),
            "y" | "yes" => Some(Some("yes".into())),
            "n" | "no" => Some(Some("no".into())),
            _ => None,
        },
        QuestionType::MultipleChoice => {
            if line.is_empty() {
                return Some(None);
            }
            if let Some(option) = line
                .parse::<usize>()
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| question.options.get(i))
            {
                return Some(Some(option.clone()));
            }
            question
                .options
                .iter()
                .find(|v| v.eq_ignore_ascii_case(line))
                .map(|v| Some(v.clone()))
        }
        QuestionType::Number | QuestionType::FreeText => Some(Some(line.to_string())),
    }
}

/// Asks every question until the session is finished.
pub async fn run_session<R, W>(
    mut session: ChecklistSession,
    input: &mut R,
    output: &mut W,
) -> Result<ChecklistSession>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut line = String::new();
    while let Some(question) = session.current() {
        let (position, total) = session.progress();
        writeln!(output, "[{position}/{total}] {}", question.text)?;
        write!(output, "({}) > ", prompt(question))?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            return Err(anyhow!("Input ended before the checklist was finished"));
        }

        let Some(value) = interpret(question, &line) else {
            writeln!(output, "Please pick one of the listed answers")?;
            continue;
        };
        match session.answer(value.as_deref()) {
            Ok(Step::Next) => {}
            Ok(Step::Finished) => break,
            Err(e) => writeln!(output, "{e}")?,
        }
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{
        sequencer::OrderingPolicy,
        session::ChecklistSession,
        storage::entities::{AnswerValue, Checklist, QuestionType},
        test_support::question,
        utils::clock::MockClock,
    };

    use super::run_session;

    #[tokio::test]
    async fn test_run_session_with_retries() {
        let mut walk = question("walk", QuestionType::YesNo);
        walk.order_index = Some(0);
        let mut mood = question("mood", QuestionType::MultipleChoice);
        mood.options = vec!["good".into(), "bad".into()];
        let mut sleep = question("sleep", QuestionType::Number);
        sleep.validation.integer = true;
        sleep.is_last = true;
        let checklist = Checklist {
            questions: vec![sleep, mood, walk],
            ..Default::default()
        };

        let mut clock = MockClock::new();
        clock.expect_time().return_const(Utc::now());
        let mut rng = StdRng::seed_from_u64(2);
        let session =
            ChecklistSession::start(&checklist, OrderingPolicy::PinnedLast, &mut rng, &clock)
                .unwrap();
        let first = session.current().unwrap().id.clone();

        // Answers for whichever of walk/mood comes first, then the other one, then sleep.
        let answers = |id: &str| if id == "walk" { "maybe\nY\n" } else { "3\n2\n" };
        let second = if first == "walk" { "mood" } else { "walk" };
        let script = format!("{}{}7.5\n\n7\n", answers(first.as_str()), answers(second));
        let mut input = script.as_bytes();
        let mut output = vec![];

        let session = run_session(session, &mut input, &mut output).await.unwrap();
        let submission = session.into_submission(&clock);
        assert_eq!(submission.answers["walk"], AnswerValue::Text("yes".into()));
        assert_eq!(submission.answers["mood"], AnswerValue::Text("bad".into()));
        assert_eq!(submission.answers["sleep"], AnswerValue::Number(7.));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("[3/3] Question sleep"));
        assert!(output.contains("Please enter a whole number"));
        assert!(output.contains("Please enter a number"));
    }

    #[tokio::test]
    async fn test_run_session_stops_at_end_of_input() {
        let checklist = Checklist {
            questions: vec![question("walk", QuestionType::YesNo)],
            ..Default::default()
        };
        let mut clock = MockClock::new();
        clock.expect_time().return_const(Utc::now());
        let mut rng = StdRng::seed_from_u64(0);
        let session =
            ChecklistSession::start(&checklist, OrderingPolicy::PinnedLast, &mut rng, &clock)
                .unwrap();

        let mut input = "".as_bytes();
        let mut output = vec![];
        assert!(run_session(session, &mut input, &mut output).await.is_err());
    }
}
