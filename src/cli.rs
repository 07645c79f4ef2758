//! CLI argument parsing for Aspecto

use clap::{Parser, ValueEnum};

/// Output format for scenario reports
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// The lines printed by the scenario (default)
    Text,
    /// JSON report with the advised join points and the printed lines
    Json,
}

/// Scenario to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Advise a free function that swaps a sandwich for dirt
    Lunch,
    /// Advise an instance, a class-bound and a static method at once
    Eater,
    /// Advise the same free function twice
    Layered,
}

#[derive(Parser, Debug)]
#[command(name = "aspecto")]
#[command(version)]
#[command(about = "Run join-point interception scenarios", long_about = None)]
pub struct Cli {
    /// Scenario to run
    #[arg(value_enum)]
    pub scenario: Scenario,

    /// Food to serve, repeatable (lunch and layered; default: soup, sandwich)
    #[arg(short = 'f', long = "food", value_name = "FOOD")]
    pub foods: Vec<String>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Register static methods with an explicit owner instead of searching for it
    #[arg(long = "no-static-search")]
    pub no_static_search: bool,

    /// Enable debug tracing output (to stderr)
    #[arg(long = "debug")]
    pub debug: bool,
}
