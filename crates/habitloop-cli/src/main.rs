use clap::{Parser, Subcommand};
use habitloop_core::Timestamp;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitloop", version, about = "Habitloop habit tracker CLI")]
struct Cli {
    /// Treat this day as today (YYYY-MM-DD, "today" or "yesterday")
    #[arg(long, global = true, value_parser = commands::parse_day)]
    today: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Record and inspect daily entries
    Entry {
        #[command(subcommand)]
        action: commands::entry::EntryAction,
    },
    /// Scores, streaks and grouped totals
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so JSON on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("HABITLOOP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let ctx = commands::Context::new(cli.today);
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action, &ctx),
        Commands::Entry { action } => commands::entry::run(action, &ctx),
        Commands::Stats { action } => commands::stats::run(action, &ctx),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
