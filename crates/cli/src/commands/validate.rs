//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{channels, SchedulerConfig, MIN_INTERVAL_SECS};

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    default_interval_ms: f64,
    critical_interval_ms: f64,
    max_per_invocation: usize,
    immediate_count: usize,
    critical_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_config(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    default_interval_ms: config.default_interval * 1000.0,
                    critical_interval_ms: config.critical_interval * 1000.0,
                    max_per_invocation: config.max_per_invocation,
                    immediate_count: config.immediate_channels.len(),
                    critical_count: config.critical_channels.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SchedulerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.critical_interval > config.default_interval {
        warnings.push(format!(
            "critical_interval ({}s) is longer than default_interval ({}s)",
            config.critical_interval, config.default_interval
        ));
    }

    for (field, value) in [
        ("default_interval", config.default_interval),
        ("critical_interval", config.critical_interval),
    ] {
        if value < MIN_INTERVAL_SECS {
            warnings.push(format!(
                "{field} ({value}s) is below {MIN_INTERVAL_SECS}s and will be clamped"
            ));
        }
    }

    for channel in config
        .immediate_channels
        .iter()
        .chain(&config.critical_channels)
    {
        if !channels::ALL.contains(&channel.as_str()) {
            warnings.push(format!("'{channel}' is not a known channel"));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Default interval: {:.1} ms", summary.default_interval_ms);
            println!("  Critical interval: {:.1} ms", summary.critical_interval_ms);
            println!("  Max per tick: {}", summary.max_per_invocation);
            println!("  Immediate channels: {}", summary.immediate_count);
            println!("  Critical channels: {}", summary.critical_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
