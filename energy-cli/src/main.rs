use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use energy_cli::config::AppConfig;
use energy_cli::intake::IntakeFile;
use energy_cli::{app, csv_loader, logging};
use energy_core::analytics::{Analytics, EnergyAnalyzer};
use energy_core::form::EnergyRecordDraft;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Energy consumption intake.
///
/// Signs users in and out, submits the multi-step intake form from a TOML
/// file, and prints the analytics derived from the stored record.
#[derive(Debug, Parser)]
#[command(name = "energy-intake", version)]
struct Cli {
    /// Config file (defaults to `energy-intake.toml` when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Store connection string.
    /// For SQLite this is a file path (e.g. `energy.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or EnvFilter directive (RUST_LOG takes precedence).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Hide console log output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account.
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ENERGY_INTAKE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and remember the session.
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ENERGY_INTAKE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the remembered session.
    SignOut,
    /// Fill in and submit the intake form.
    Submit {
        /// Intake answers as TOML.
        #[arg(long)]
        input: PathBuf,
        /// Appliance list as CSV (name, power_watts, usage_hours_per_day).
        #[arg(long)]
        appliances: Option<PathBuf>,
    },
    /// Show the analytics for the stored record.
    Report,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    if let Some(db) = cli.db {
        config.store.connection_string = db;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(file) = cli.log_file {
        config.logging.file = Some(file);
    }

    logging::init_logging(&config.logging, cli.quiet)?;
    debug!(?config, "resolved configuration");

    let analyzer =
        EnergyAnalyzer::new(config.analytics.clone()).context("Invalid [analytics] settings")?;
    let store = app::open_store(&config.store).await?;
    let store = store.as_ref();

    match cli.command {
        Command::SignUp { email, password } => {
            app::sign_up(store, &email, &password).await?;
            println!("Account created for {email}. Sign in to continue.");
        }
        Command::SignIn { email, password } => {
            let session = app::sign_in(store, &email, &password, &config.session_file).await?;
            println!(
                "Signed in as {} (session valid until {}).",
                session.email,
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        Command::SignOut => {
            app::sign_out(store, &config.session_file).await?;
            println!("Signed out.");
        }
        Command::Submit { input, appliances } => {
            let session = app::current_session(store, &config.session_file).await?;
            let intake = IntakeFile::load(&input)?;
            let extra = match appliances {
                Some(path) => csv_loader::load_from_file(&path)?,
                None => Vec::new(),
            };

            let record = app::submit_intake(store, &session, &intake, extra).await?;
            println!("{}", EnergyRecordDraft::from_record(&record));
            println!();
            println!("{}", app::SAVED_MESSAGE);
        }
        Command::Report => {
            let session = app::current_session(store, &config.session_file).await?;
            match app::load_analytics(store, &session, &analyzer).await? {
                Analytics::NoData => println!("{}", app::NO_DATA_MESSAGE),
                Analytics::Report(report) => print!("{report}"),
            }
        }
    }

    Ok(())
}
