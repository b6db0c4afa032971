//! turnario: monthly doctor shift planning.
//!
//! Subcommands:
//! - `roster`: list, add, or remove doctors (persisted remotely)
//! - `grid`: build a month's schedule grid, apply edits, print or export it

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "turnario")]
#[command(about = "Monthly doctor shift planning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Connection and tuning for the remote document store.
#[derive(Args)]
struct StoreArgs {
    /// Contents API base URL, e.g. https://api.example.com/repos/OWNER/REPO/contents
    #[arg(long, env = "TURNARIO_API_URL")]
    api_base: String,

    /// Access token for the document store
    #[arg(long, env = "TURNARIO_TOKEN")]
    token: String,

    /// Branch to read and write
    #[arg(long, env = "TURNARIO_BRANCH", default_value = "main")]
    branch: String,

    /// Roster document path within the store
    #[arg(long, default_value = turnario_core::DEFAULT_ROSTER_PATH)]
    path: String,

    /// Remote attempts per operation, including the first
    #[arg(long, default_value = "3")]
    max_attempts: u32,

    /// Base retry delay in milliseconds
    #[arg(long, default_value = "500")]
    base_delay_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Local backup directory (defaults to the platform data dir)
    #[arg(long)]
    backup_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the doctor roster
    Roster {
        #[command(flatten)]
        store: StoreArgs,

        #[command(subcommand)]
        action: RosterAction,
    },

    /// Build and print a month's schedule grid
    Grid {
        #[command(flatten)]
        store: StoreArgs,

        /// Year to plan
        #[arg(long)]
        year: i32,

        /// Month to plan (1-12)
        #[arg(long)]
        month: u32,

        /// Doctors to plan, comma-separated; all roster members if omitted
        #[arg(long, value_delimiter = ',')]
        doctors: Option<Vec<String>>,

        /// Holiday table JSON file ({"YYYY-MM-DD": "Name", ...})
        #[arg(long)]
        holidays: Option<PathBuf>,

        /// Country code for the holiday lookup
        #[arg(long, env = "TURNARIO_COUNTRY", default_value = "IT")]
        country: String,

        /// Cell edits, repeatable
        #[arg(long = "set", value_name = "DATE=DOCTOR=STATUS")]
        set: Vec<String>,

        /// Write the grid as CSV to this file or directory
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum RosterAction {
    /// Print the roster
    List,
    /// Add a doctor
    Add { name: String },
    /// Remove a doctor
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "turnario=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roster { store, action } => commands::run_roster(&store, action).await,

        Commands::Grid {
            store,
            year,
            month,
            doctors,
            holidays,
            country,
            set,
            csv,
        } => {
            commands::run_grid(
                &store,
                year,
                month,
                doctors,
                holidays.as_deref(),
                &country,
                &set,
                csv.as_deref(),
            )
            .await
        }
    }
}
