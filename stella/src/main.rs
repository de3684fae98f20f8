//! stella - astronaut readiness trainer
//!
//! Command-line front end for readiness assessments, training sessions and
//! the STELLA coach.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Store: $XDG_DATA_HOME/stella/stella.db (~/.local/share/stella/stella.db)
//! - Config: $XDG_CONFIG_HOME/stella/config.toml (~/.config/stella/config.toml)
//! - Logs: $XDG_STATE_HOME/stella/ (~/.local/state/stella/)

mod assess;
mod coach;
mod train;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stella_core::training::TrainingCatalog;
use stella_core::{AssessmentType, Config, Database};

#[derive(Parser)]
#[command(name = "stella")]
#[command(about = "Astronaut readiness assessments, training sessions and coaching")]
#[command(version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/stella/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Take a readiness assessment
    Assess {
        /// Assessment type: initial, module-specific, mission-specific
        #[arg(short = 't', long = "type", default_value = "initial")]
        assessment_type: AssessmentType,
    },

    /// Run a training session for a module
    Train {
        /// Module id (see `stella modules`)
        module: String,

        /// Seed for the simulated metrics feed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Ask STELLA a question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Get guidance for an activity
    Guidance(coach::GuidanceArgs),

    /// List training modules
    Modules,

    /// Send questions queued while offline
    Replay,

    /// Show file locations and the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard =
        stella_core::logging::init(&config.logging).context("failed to initialize logging")?;

    match args.command {
        Command::Assess { assessment_type } => {
            assess::run(&config, open_store()?, assessment_type).await
        }
        Command::Train { module, seed } => train::run(&config, open_store()?, &module, seed).await,
        Command::Ask { question } => coach::ask(&config, open_store()?, &question.join(" ")).await,
        Command::Guidance(guidance) => coach::guidance(&config, open_store()?, &guidance).await,
        Command::Modules => cmd_modules(),
        Command::Replay => coach::replay(&config, open_store()?).await,
        Command::Config => cmd_config(&config),
    }
}

fn open_store() -> Result<Arc<Database>> {
    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening store");

    let db = Database::open(&db_path).context("failed to open store")?;
    db.migrate().context("failed to run store migrations")?;
    Ok(Arc::new(db))
}

fn cmd_modules() -> Result<()> {
    let catalog = TrainingCatalog::builtin().context("failed to load training catalog")?;

    println!("Training modules");
    println!("================");
    for module in catalog.modules() {
        println!();
        println!(
            "{:<20} {} ({:?})",
            module.id, module.title, module.category
        );
        if !module.description.is_empty() {
            println!("{:<20} {}", "", module.description);
        }
        for spec in &module.exercises {
            println!(
                "{:<20}   - {:<20} {} ({}s)",
                "",
                spec.exercise.as_str(),
                spec.title,
                spec.target_secs
            );
        }
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Config file: {}", Config::config_path().display());
    println!("Store:       {}", Config::database_path().display());
    println!("Logs:        {}", Config::state_dir().display());
    println!();

    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
