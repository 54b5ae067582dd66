use ansi_term::Colour;
use anyhow::Result;
use chrono::Local;
use clap::Subcommand;

use crate::stats::StatsConfig;

use super::CliApp;

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    #[command(about = "List alerts that weren't dismissed")]
    List,
    #[command(about = "Hide an alert. A new alert appears once a later day crosses the threshold")]
    Dismiss {
        #[arg(help = "Alert id as printed by `alerts list`")]
        id: String,
    },
}

pub async fn process_alerts_command(app: &mut CliApp, command: AlertsCommand) -> Result<()> {
    match command {
        AlertsCommand::List => {
            let series = app.series(Local::now().date_naive(), &Local, &StatsConfig::default());
            let alerts = app.active_alerts(&series);
            if alerts.is_empty() {
                println!("{}", Colour::Green.paint("No active alerts"));
                return Ok(());
            }
            for alert in alerts {
                println!(
                    "{}\t{}",
                    Colour::Red.bold().paint(alert.describe()),
                    Colour::Fixed(244).paint(&alert.id)
                );
            }
            Ok(())
        }
        AlertsCommand::Dismiss { id } => {
            app.dismiss_alert(&id).await?;
            println!("Dismissed {id}");
            Ok(())
        }
    }
}
