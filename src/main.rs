use anyhow::Result;
use aspecto::cli::{Cli, OutputFormat, Scenario};
use aspecto::scenario::{self, ScenarioReport};
use aspecto::RegistrationConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Build the registration configuration from the command line
fn registration_config(args: &Cli) -> RegistrationConfig {
    RegistrationConfig::new().with_static_search(!args.no_static_search)
}

fn print_report(report: &ScenarioReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for line in &report.output {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.scenario == Scenario::Eater && !args.foods.is_empty() {
        anyhow::bail!("--food applies to the lunch and layered scenarios only");
    }

    init_tracing(args.debug);

    let config = registration_config(&args);
    let foods = if args.foods.is_empty() {
        vec!["soup".to_string(), "sandwich".to_string()]
    } else {
        args.foods.clone()
    };

    let report = match args.scenario {
        Scenario::Lunch => scenario::run_lunch(&foods, config)?,
        Scenario::Eater => scenario::run_eater(config)?,
        Scenario::Layered => scenario::run_layered(&foods, config)?,
    };

    print_report(&report, args.format)
}
