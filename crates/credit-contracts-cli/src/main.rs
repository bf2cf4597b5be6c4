mod commands;
mod config;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{filter::LevelFilter, fmt};

use commands::lifecycle::{LifecycleArgs, TransitionsArgs};
use commands::schedule::{RecalculateArgs, ScheduleArgs, TermArgs};

/// Credit contract schedules and lifecycle operations
#[derive(Parser)]
#[command(
    name = "ccm",
    version,
    about = "Credit contract schedules and lifecycle operations",
    long_about = "A CLI for issuing credit contracts and computing repayment schedules \
                  with decimal precision. Supports constant, degressive, balloon and bullet \
                  amortization, partial-payment recalculation, term conversion and the \
                  contract status state machine."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine settings file (TOML, YAML or JSON); CCM__* environment variables override it
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a repayment schedule
    Schedule(ScheduleArgs),
    /// Recalculate a schedule after a partial payment
    Recalculate(RecalculateArgs),
    /// Convert a duration into a number of payment periods
    Term(TermArgs),
    /// Show the allowed contract status transitions
    Transitions(TransitionsArgs),
    /// Replay a contract lifecycle scenario against an in-memory store
    Lifecycle(LifecycleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose, cli.quiet));

    let engine = match config::load(cli.config.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &engine),
        Commands::Recalculate(args) => commands::schedule::run_recalculate(args, &engine),
        Commands::Term(args) => commands::schedule::run_term(args),
        Commands::Transitions(args) => commands::lifecycle::run_transitions(args),
        Commands::Lifecycle(args) => commands::lifecycle::run_lifecycle(args, &engine),
        Commands::Version => {
            println!("ccm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}
