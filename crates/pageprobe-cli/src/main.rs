//! pageprobe CLI: verify a product page in a real browser
//!
//! ## Usage
//!
//! ```bash
//! pageprobe run --base-url https://dealer.example -p /cars/42   # Run the check suite
//! pageprobe config --format json                                # Show resolved config
//! pageprobe validate zip 1234                                   # Predict the form's verdict
//! ```

use clap::Parser;
use pageprobe_cli::{
    build_config, handlers, init_tracing, Cli, CliError, CliResult, Commands,
    ConfigArgs, Reporter, RunArgs, ValidateArgs,
};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => run_checks(config_path, &args, &reporter),
        Commands::Config(args) => run_config(config_path, &args, &reporter),
        Commands::Validate(args) => run_validate(config_path, &args),
    }
}

fn run_checks(config_path: Option<&Path>, args: &RunArgs, reporter: &Reporter) -> CliResult<()> {
    let config = handlers::config::resolve_config(config_path)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(handlers::run::execute_run(config, args, reporter))?;
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ChecksFailed {
            failed: report.total() - report.passed(),
            total: report.total(),
        })
    }
}

fn run_config(config_path: Option<&Path>, args: &ConfigArgs, reporter: &Reporter) -> CliResult<()> {
    let (text, invalid) = handlers::config::execute_config(config_path, args)?;
    println!("{}", text.trim_end());
    if let Some(e) = invalid {
        reporter.warning(&format!("configuration would be rejected: {e}"));
    }
    Ok(())
}

fn run_validate(config_path: Option<&Path>, args: &ValidateArgs) -> CliResult<()> {
    let probe = handlers::config::resolve_config(config_path)?;
    let prediction = handlers::validate::predict(&probe, args.field, &args.value)?;
    if args.json {
        println!("{}", serde_json::to_string(&prediction)?);
    } else {
        println!("{prediction}");
    }
    Ok(())
}
