//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{channels, SchedulerConfig};

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    intervals: IntervalInfo,
    max_per_invocation: usize,
    stats_window_secs: f64,
    channels: Vec<ChannelInfo>,
}

#[derive(Serialize)]
struct IntervalInfo {
    default_ms: f64,
    critical_ms: f64,
}

#[derive(Serialize)]
struct ChannelInfo {
    id: String,
    mode: &'static str,
    interval_ms: Option<f64>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)?;

    if args.json {
        let info = build_config_info(&config);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

/// Reference channels first, then any extra channel named in the config
fn channel_table(config: &SchedulerConfig) -> Vec<ChannelInfo> {
    let mut ids: Vec<String> = channels::ALL.iter().map(|c| c.to_string()).collect();
    for channel in config
        .immediate_channels
        .iter()
        .chain(&config.critical_channels)
    {
        if !ids.iter().any(|id| id == channel.as_str()) {
            ids.push(channel.to_string());
        }
    }

    ids.into_iter()
        .map(|id| {
            let (mode, interval) = if config.immediate_channels.contains(id.as_str()) {
                ("immediate", None)
            } else if config.critical_channels.contains(id.as_str()) {
                ("critical", Some(config.critical_interval_duration()))
            } else {
                ("normal", Some(config.default_interval_duration()))
            };
            ChannelInfo {
                id,
                mode,
                interval_ms: interval.map(|d| d.as_secs_f64() * 1000.0),
            }
        })
        .collect()
}

fn build_config_info(config: &SchedulerConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        intervals: IntervalInfo {
            default_ms: config.default_interval * 1000.0,
            critical_ms: config.critical_interval * 1000.0,
        },
        max_per_invocation: config.max_per_invocation,
        stats_window_secs: config.stats_window,
        channels: channel_table(config),
    }
}

fn print_config_info(config: &SchedulerConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Update Scheduler Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Scheduler");
    println!("   ├─ Version: {:?}", config.version);
    println!(
        "   ├─ Default interval: {:.1} ms",
        config.default_interval * 1000.0
    );
    println!(
        "   ├─ Critical interval: {:.1} ms",
        config.critical_interval * 1000.0
    );
    println!("   ├─ Max per tick: {}", config.max_per_invocation);
    println!("   └─ Stats window: {:.2} s", config.stats_window);

    let table = channel_table(config);
    println!("\n📡 Channels ({})", table.len());
    for (i, channel) in table.iter().enumerate() {
        let prefix = if i == table.len() - 1 { "└─" } else { "├─" };
        match channel.interval_ms {
            Some(ms) => println!(
                "   {} {} ({}, every {:.1} ms)",
                prefix, channel.id, channel.mode, ms
            ),
            None => println!("   {} {} ({})", prefix, channel.id, channel.mode),
        }
    }

    println!();
}
