pub mod alerts;
pub mod checklist;
pub mod dates;
pub mod graph;
pub mod history;
pub mod take;
pub mod wiki;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::{
    app::AppState,
    storage::FileStorage,
    utils::{
        dir::{create_application_default_path, ensure_dir, LOGS_DIR_NAME},
        logging::{enable_logging, LoggingOptions, CLI_PREFIX},
    },
};

use self::{
    alerts::{process_alerts_command, AlertsCommand},
    checklist::{process_checklist_command, ChecklistCommand},
    graph::{process_graph_command, GraphCommand},
    history::{process_history_command, HistoryCommand},
    take::{process_take_command, TakeCommand},
    wiki::{process_wiki_command, WikiCommand},
};

#[derive(Parser, Debug)]
#[command(name = "Routinely", version, long_about = None)]
#[command(about = "Application for tracking daily routines through checklists", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Print the log to stderr and record trace level details")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Answer the checklist")]
    Take {
        #[command(flatten)]
        command: TakeCommand,
    },
    #[command(about = "Browse or delete past answers", subcommand)]
    History(HistoryCommand),
    #[command(about = "Print the statistics of graphed questions")]
    Graph {
        #[command(flatten)]
        command: GraphCommand,
    },
    #[command(about = "List or dismiss threshold alerts", subcommand)]
    Alerts(AlertsCommand),
    #[command(about = "Show or edit the checklist", subcommand)]
    Checklist(ChecklistCommand),
    #[command(about = "Manage wiki pages", subcommand)]
    Wiki(WikiCommand),
    #[command(about = "Write checklist, history and wiki into a single file")]
    Export { path: PathBuf },
    #[command(about = "Replace all data with the content of an exported file")]
    Import { path: PathBuf },
}

pub type CliApp = AppState<FileStorage>;

async fn open_app(dir: PathBuf) -> Result<CliApp> {
    let storage = FileStorage::new(&dir)?;
    Ok(AppState::load(storage).await)
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    enable_logging(
        CLI_PREFIX,
        &ensure_dir(dir.join(LOGS_DIR_NAME))?,
        LoggingOptions { verbose: args.log },
    )?;
    debug!("Using application directory {dir:?}");

    let mut app = open_app(dir).await?;

    match args.commands {
        Commands::Take { command } => process_take_command(&mut app, command).await,
        Commands::History(command) => process_history_command(&mut app, command).await,
        Commands::Graph { command } => process_graph_command(&app, command),
        Commands::Alerts(command) => process_alerts_command(&mut app, command).await,
        Commands::Checklist(command) => process_checklist_command(&mut app, command).await,
        Commands::Wiki(command) => process_wiki_command(app.storage(), command).await,
        Commands::Export { path } => {
            app.export_to(&path).await?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Commands::Import { path } => {
            let summary = app.import_from(&path).await?;
            println!(
                "Imported {} history entries and {} wiki pages",
                app.history().len(),
                summary.pages_written
            );
            if summary.pages_skipped > 0 {
                println!("{} wiki pages were skipped", summary.pages_skipped);
            }
            Ok(())
        }
    }
}
