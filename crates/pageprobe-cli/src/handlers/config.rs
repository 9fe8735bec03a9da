//! Config command handler

use pageprobe::ProbeConfig;
use std::path::Path;

use crate::commands::{ConfigArgs, ConfigFormat};
use crate::error::CliResult;

/// Load the configuration file, if any, then apply environment overrides
pub fn resolve_config(path: Option<&Path>) -> CliResult<ProbeConfig> {
    let config = match path {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Render a configuration in the requested format
pub fn render_config(config: &ProbeConfig, format: ConfigFormat) -> CliResult<String> {
    Ok(match format {
        ConfigFormat::Yaml => config.to_yaml()?,
        ConfigFormat::Json => config.to_json()?,
    })
}

/// Execute the config command.
///
/// Returns the rendered configuration; an invalid configuration is still
/// rendered, with the validation error alongside.
pub fn execute_config(
    path: Option<&Path>,
    args: &ConfigArgs,
) -> CliResult<(String, Option<pageprobe::ProbeError>)> {
    let config = if args.defaults {
        ProbeConfig::default()
    } else {
        resolve_config(path)?
    };
    let text = render_config(&config, args.format)?;
    Ok((text, config.validate().err()))
}
