use anyhow::Result;
use chrono::Local;
use clap::Parser;

use crate::{
    stats::{DataPoint, PointValue, StatsConfig, DEFAULT_NUMBER_DAYS},
    storage::entities::{Question, QuestionType},
    utils::time::date_label,
};

use super::CliApp;

const BAR_WIDTH: f64 = 30.;

#[derive(Debug, Parser)]
pub struct GraphCommand {
    #[arg(
        long,
        default_value_t = DEFAULT_NUMBER_DAYS,
        help = "Days shown for number questions, today included"
    )]
    days: u32,
    #[arg(long, short, help = "Only show the question with this id")]
    question: Option<String>,
}

pub fn process_graph_command(
    app: &CliApp,
    GraphCommand { days, question }: GraphCommand,
) -> Result<()> {
    let Some(checklist) = app.checklist() else {
        println!("There is no checklist yet.");
        return Ok(());
    };

    let today = Local::now().date_naive();
    let series = app.series(today, &Local, &StatsConfig { number_days: days });
    if series.is_empty() {
        println!("No question has graphing enabled.");
        return Ok(());
    }

    for q in checklist.questions_in_order() {
        if question.as_ref().is_some_and(|id| *id != q.id) {
            continue;
        }
        let Some(points) = series.get(&q.id) else {
            continue;
        };
        println!("{}", heading(q, days));
        if points.is_empty() {
            println!("\tNot enough answers yet");
        }
        for point in points {
            println!("{}", format_point(point));
        }
        println!();
    }
    Ok(())
}

fn heading(question: &Question, days: u32) -> String {
    match question.kind {
        QuestionType::Number => format!("{} (daily average, last {days} days)", question.text),
        _ => format!(
            "{} (rolling rate over {} answers)",
            question.text,
            question.graph_config.window_size()
        ),
    }
}

fn bar(rate: f64) -> String {
    "#".repeat((rate.clamp(0., 100.) / 100. * BAR_WIDTH).round() as usize)
}

fn format_point(point: &DataPoint) -> String {
    let date = date_label(point.date);
    match &point.value {
        PointValue::YesRate(rate) => {
            format!("\t{date}\t{:>6}\t{}", rate.to_string(), bar(**rate))
        }
        PointValue::OptionRates(rates) => {
            let rates = rates
                .iter()
                .map(|v| format!("{}: {}", v.option, v.rate))
                .collect::<Vec<_>>()
                .join("\t");
            format!("\t{date}\t{rates}")
        }
        PointValue::Average(value) => format!("\t{date}\t{value:.2}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        stats::{DataPoint, OptionRate, PointValue},
        utils::percentage::Percentage,
    };

    use super::{bar, format_point};

    #[test]
    fn test_format_points() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let point = DataPoint {
            date,
            value: PointValue::YesRate(Percentage::new_opt(50.).unwrap()),
        };
        assert_eq!(format_point(&point), format!("\t2024-01-07\t 50.0%\t{}", bar(50.)));

        let point = DataPoint {
            date,
            value: PointValue::OptionRates(vec![OptionRate {
                option: "good".into(),
                rate: Percentage::new_opt(25.).unwrap(),
            }]),
        };
        assert_eq!(format_point(&point), "\t2024-01-07\tgood: 25.0%");

        let point = DataPoint {
            date,
            value: PointValue::Average(7.25),
        };
        assert_eq!(format_point(&point), "\t2024-01-07\t7.25");
        assert_eq!(bar(100.).len(), 30);
    }
}
