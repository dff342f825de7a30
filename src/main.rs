use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod error;
mod form;
mod models;
mod nav;
mod report;
mod score;
mod session;
mod store;

use config::AppPaths;
use session::Session;
use store::{NoteStore, Store};

#[derive(Parser)]
#[command(name = "symptom-tracker")]
#[command(about = "Track daily symptoms and see how your days add up", long_about = None)]
struct Cli {
    /// Directory holding data.json and the notes folder
    #[arg(long, global = true, env = "SYMPTOM_TRACKER_HOME")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive session (default)
    Run,
    /// Create the data directory and a starter data file
    Init,
    /// Print the report for one day as markdown
    Report {
        /// Day to report on, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List recorded days with their scores, newest first
    History,
    /// Write every reading to a CSV file
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("symptom_tracker=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = AppPaths::resolve(cli.data_dir.as_deref());
    let today = Local::now().date_naive();

    if store::bootstrap(&paths)
        .with_context(|| format!("failed to set up {}", paths.root.display()))?
    {
        println!("Created a starter data file at {}.", paths.data_file.display());
    }

    let store = Store::new(&paths.data_file);
    let notes = NoteStore::new(&paths.notes_dir);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Init => {
            println!("Data directory ready at {}.", paths.root.display());
        }
        Commands::Run => {
            let mut session = Session::open(store, notes, today)
                .with_context(|| format!("failed to load {}", paths.data_file.display()))?;
            let stdin = std::io::stdin();
            console::run(&mut session, stdin.lock(), std::io::stdout())?;
        }
        Commands::Report { date } => {
            let dataset = store.load().context("failed to load dataset")?;
            let date = date.unwrap_or(today);
            match report::build_report(&dataset, &notes, date) {
                Ok(day_report) => print!("{}", report::render_report(&day_report)),
                Err(err) if err.is_empty_result() => println!("Nothing to show: {err}"),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::History => {
            let dataset = store.load().context("failed to load dataset")?;
            print!("{}", report::render_history(&report::list_days(&dataset)));
        }
        Commands::Export { csv } => {
            let dataset = store.load().context("failed to load dataset")?;
            let file = std::fs::File::create(&csv)
                .with_context(|| format!("failed to create {}", csv.display()))?;
            let written = report::export_csv(&dataset, file)?;
            println!("Exported {written} readings to {}.", csv.display());
        }
    }

    Ok(())
}
