mod commands;
mod terminal;

use anyhow::Result;
use caldir_skill_core::Locale;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "caldir-skill")]
#[command(about = "Add calendar events by describing them in a sentence")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an event, e.g. `caldir-skill new meeting tomorrow at 1500 weekly`
    New {
        /// What to add. Asked for interactively when left out.
        utterance: Vec<String>,

        /// Language of the request (en-us, sv-se)
        #[arg(short, long)]
        locale: Option<Locale>,
    },
    /// List upcoming events in the calendar file
    Events,
    /// Show configuration paths and values, optionally changing them
    Config {
        /// Language to use from now on (en-us, sv-se)
        #[arg(long)]
        locale: Option<Locale>,

        /// Time zone to use from now on, e.g. Europe/Stockholm
        #[arg(long)]
        timezone: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::New { utterance, locale } => commands::new::run(utterance, locale).await,
        Commands::Events => commands::events::run(),
        Commands::Config { locale, timezone } => commands::config::run(locale, timezone),
    }
}
