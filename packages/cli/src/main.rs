#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for dengue watch.
//!
//! ```text
//! dengue_watch refresh [--top 5] [--json]
//! dengue_watch cached
//! dengue_watch report-case --district Galle --cases 12 --deaths 0 --reporter moh-7
//! dengue_watch cases [--district Galle]
//! dengue_watch serve [--interactive]
//! ```
//!
//! Running with no subcommand enters interactive mode.
//!
//! Uses `indicatif-log-bridge` (via [`dengue_watch_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dialoguer::Select;

#[derive(Parser)]
#[command(
    name = "dengue_watch",
    about = "Dengue breeding risk dashboard for Sri Lankan districts"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh stale district risks and print the dashboard summary
    Refresh {
        /// Number of districts in the top list
        #[arg(long, default_value = "5")]
        top: usize,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cached district risks without refreshing
    Cached,
    /// Record a dengue case report for a district
    ReportCase {
        /// District name (e.g. "Colombo")
        #[arg(long)]
        district: String,
        /// Confirmed cases
        #[arg(long)]
        cases: u32,
        /// Deaths
        #[arg(long, default_value = "0")]
        deaths: u32,
        /// Reporting officer ID
        #[arg(long)]
        reporter: String,
        /// Date the cases refer to (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List case reports and totals
    Cases {
        /// Restrict to one district
        #[arg(long)]
        district: Option<String>,
    },
    /// Start the API server
    Serve {
        /// Prompt for bind address, port, and missing keys
        #[arg(long)]
        interactive: bool,
    },
}

/// Actions offered in interactive mode.
enum Action {
    Refresh,
    Cached,
    Cases,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[Self::Refresh, Self::Cached, Self::Cases, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Refresh => "Refresh district risks",
            Self::Cached => "Show cached risks",
            Self::Cases => "Show case reports",
            Self::Serve => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = dengue_watch_cli_utils::init_logger();
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Dengue Watch");
            println!();

            let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
            let idx = Select::new()
                .with_prompt("What would you like to do?")
                .items(&labels)
                .default(0)
                .interact()?;

            match Action::ALL[idx] {
                Action::Refresh => Commands::Refresh {
                    top: 5,
                    json: false,
                },
                Action::Cached => Commands::Cached,
                Action::Cases => Commands::Cases { district: None },
                Action::Serve => Commands::Serve { interactive: true },
            }
        }
    };

    match command {
        Commands::Refresh { top, json } => commands::refresh(&multi, top, json).await?,
        Commands::Cached => commands::cached().await?,
        Commands::ReportCase {
            district,
            cases,
            deaths,
            reporter,
            date,
        } => commands::report_case(district, cases, deaths, reporter, date).await?,
        Commands::Cases { district } => commands::cases(district).await?,
        Commands::Serve { interactive } => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(async move {
                    if interactive {
                        dengue_watch_server::interactive::run().await
                    } else {
                        dengue_watch_server::serve().await
                    }
                })
            })
            .await??;
        }
    }

    Ok(())
}
