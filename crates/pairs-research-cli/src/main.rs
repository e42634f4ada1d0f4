mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::backtest::BacktestArgs;
use commands::data::MergeArgs;
use commands::research::ResearchArgs;
use commands::screen::{AdfArgs, ScreenArgs};
use commands::signals::{SignalsArgs, SmtArgs, ZscoreArgs};

/// Pairs-trading research on futures closes
#[derive(Parser)]
#[command(
    name = "pairs",
    version,
    about = "Pairs-trading research on futures closes",
    long_about = "Screens instruments for Engle-Granger cointegration, builds hedge-ratio \
                  spreads and rolling z-scores, generates threshold signals and backtests \
                  them, all with decimal precision. Logging goes to stderr and is \
                  controlled with RUST_LOG."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge per-symbol close files into one aligned panel
    Merge(MergeArgs),
    /// Test every pair of instruments for cointegration
    Screen(ScreenArgs),
    /// Augmented Dickey-Fuller unit-root test on one instrument
    Adf(AdfArgs),
    /// Spread and rolling z-score of a pair
    Zscore(ZscoreArgs),
    /// Entry/exit signals from the spread z-score
    Signals(SignalsArgs),
    /// Backtest the threshold rule on a pair
    Backtest(BacktestArgs),
    /// SMT divergence between two instruments
    Smt(SmtArgs),
    /// Screen, then analyze and backtest every accepted pair
    Research(ResearchArgs),
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

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Merge(args) => commands::data::run_merge(args),
        Commands::Screen(args) => commands::screen::run_screen(args),
        Commands::Adf(args) => commands::screen::run_adf(args),
        Commands::Zscore(args) => commands::signals::run_zscore(args),
        Commands::Signals(args) => commands::signals::run_signals(args),
        Commands::Backtest(args) => commands::backtest::run_backtest(args),
        Commands::Smt(args) => commands::signals::run_smt(args),
        Commands::Research(args) => commands::research::run_research(args),
        Commands::Version => {
            println!("pairs {}", env!("CARGO_PKG_VERSION"));
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
