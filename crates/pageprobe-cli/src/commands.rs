//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use pageprobe::{CheckMode, FormField};
use std::path::PathBuf;

/// pageprobe: verify product page carousels, lead form and reviews in a real browser
#[derive(Parser, Debug)]
#[command(name = "pageprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the check suite against a live page
    Run(RunArgs),

    /// Print the resolved configuration
    Config(ConfigArgs),

    /// Predict whether the lead form accepts a value
    Validate(ValidateArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Base URL of the site (overrides config and environment)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path of the product page
    #[arg(short, long)]
    pub path: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Stop at the first failing check
    #[arg(long)]
    pub fail_fast: bool,

    /// ZIP code submitted by the form check
    #[arg(long, default_value = "12345")]
    pub zip: String,

    /// Email submitted by the form check
    #[arg(long, default_value = "qa@example.com")]
    pub email: String,

    /// Phone number submitted by the form check
    #[arg(long, default_value = "5551234567")]
    pub phone: String,

    /// Directory for the JSON report
    #[arg(short, long, default_value = "target/pageprobe")]
    pub output: PathBuf,
}

impl RunArgs {
    /// Check collection mode
    #[must_use]
    pub const fn mode(&self) -> CheckMode {
        if self.fail_fast {
            CheckMode::FailFast
        } else {
            CheckMode::Collect
        }
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Print built-in defaults instead of the resolved configuration
    #[arg(long)]
    pub defaults: bool,
}

/// Configuration output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML
    #[default]
    Yaml,
    /// JSON
    Json,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Form field (zip, email, phone)
    pub field: FormField,

    /// Value to check (use `--` before values starting with '-')
    #[arg(default_value = "")]
    pub value: String,

    /// Print the prediction as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_command() {
            let cli = Cli::parse_from(["pageprobe", "run"]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.zip, "12345");
            assert_eq!(args.mode(), CheckMode::Collect);
            assert!(!args.headed);
        }

        #[test]
        fn test_parse_run_overrides() {
            let cli = Cli::parse_from([
                "pageprobe",
                "run",
                "--base-url",
                "https://dealer.test",
                "-p",
                "/cars/42",
                "--fail-fast",
                "--headed",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.base_url.as_deref(), Some("https://dealer.test"));
            assert_eq!(args.path.as_deref(), Some("/cars/42"));
            assert_eq!(args.mode(), CheckMode::FailFast);
            assert!(args.headed);
        }

        #[test]
        fn test_parse_validate_field() {
            let cli = Cli::parse_from(["pageprobe", "validate", "Zip", "1234"]);
            let Commands::Validate(args) = cli.command else {
                panic!("expected Validate command");
            };
            assert_eq!(args.field, FormField::Zip);
            assert_eq!(args.value, "1234");
        }

        #[test]
        fn test_validate_value_defaults_to_empty() {
            let cli = Cli::parse_from(["pageprobe", "validate", "phone"]);
            let Commands::Validate(args) = cli.command else {
                panic!("expected Validate command");
            };
            assert!(args.value.is_empty());
            assert!(!args.json);
        }

        #[test]
        fn test_validate_rejects_unknown_field() {
            assert!(Cli::try_parse_from(["pageprobe", "validate", "address", "x"]).is_err());
        }

        #[test]
        fn test_parse_config_format() {
            let cli = Cli::parse_from(["pageprobe", "config", "--format", "json"]);
            let Commands::Config(args) = cli.command else {
                panic!("expected Config command");
            };
            assert_eq!(args.format, ConfigFormat::Json);
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let cli = Cli::parse_from([
                "pageprobe",
                "config",
                "-vv",
                "--color",
                "never",
                "--config",
                "site.yaml",
            ]);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.color, ColorArg::Never));
            assert_eq!(cli.config, Some(PathBuf::from("site.yaml")));
        }
    }
}
