use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod runtime;
mod screen;

#[derive(Parser)]
#[command(
    name = "draftclock",
    version,
    about = "Keep writing or lose the draft"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write for a number of minutes
    Time {
        /// Minutes to write (default: session.default_goal_time)
        minutes: Option<u32>,
        #[command(flatten)]
        session: commands::session::SessionArgs,
    },
    /// Write a number of words
    Words {
        /// Words to write (default: session.default_goal_word_count)
        count: Option<u32>,
        #[command(flatten)]
        session: commands::session::SessionArgs,
    },
    /// Start a session with the configured default goal
    Start {
        #[command(flatten)]
        session: commands::session::SessionArgs,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print drafts wiped under the kill policy
    Recover {
        #[command(flatten)]
        args: commands::recover::RecoverArgs,
    },
}

/// Logging is off unless DRAFTCLOCK_LOG is set (e.g. `DRAFTCLOCK_LOG=debug`),
/// since stderr shares the terminal with the session screen.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("DRAFTCLOCK_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Time { minutes, session } => {
            commands::session::run(Some(draftclock_core::GoalKind::Time), minutes, session)
        }
        Commands::Words { count, session } => {
            commands::session::run(Some(draftclock_core::GoalKind::WordCount), count, session)
        }
        Commands::Start { session } => commands::session::run(None, None, session),
        Commands::Config { action } => commands::config::run(action),
        Commands::Recover { args } => commands::recover::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
