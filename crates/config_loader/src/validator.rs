//! 配置校验模块
//!
//! 校验规则：
//! - default_interval / critical_interval / stats_window 为正有限数，且不超出 `Duration` 范围
//! - max_per_invocation > 0
//! - channel id 非空
//! - 同一 channel 不能同时是 immediate 和 critical

use contracts::{try_interval_duration, ChannelId, ContractError, SchedulerConfig};

/// 校验 SchedulerConfig
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SchedulerConfig) -> Result<(), ContractError> {
    validate_positive("default_interval", config.default_interval)?;
    validate_positive("critical_interval", config.critical_interval)?;
    validate_positive("stats_window", config.stats_window)?;
    validate_budget(config)?;
    validate_channel_ids("immediate_channels", config.immediate_channels.iter())?;
    validate_channel_ids("critical_channels", config.critical_channels.iter())?;
    validate_disjoint(config)?;
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> Result<(), ContractError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ContractError::config_validation(
            field,
            format!("must be a positive number of seconds, got {value}"),
        ));
    }
    if try_interval_duration(value).is_none() {
        return Err(ContractError::config_validation(
            field,
            format!("{value}s is too large to represent as a duration"),
        ));
    }
    Ok(())
}

fn validate_budget(config: &SchedulerConfig) -> Result<(), ContractError> {
    if config.max_per_invocation == 0 {
        return Err(ContractError::config_validation(
            "max_per_invocation",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_channel_ids<'a>(
    field: &str,
    channels: impl Iterator<Item = &'a ChannelId>,
) -> Result<(), ContractError> {
    for (idx, channel) in channels.enumerate() {
        if channel.is_blank() {
            return Err(ContractError::config_validation(
                format!("{field}[{idx}]"),
                "channel id cannot be empty",
            ));
        }
    }
    Ok(())
}

/// Immediate channels never reach the rate limiter, so a critical tier on
/// one of them is a configuration mistake.
fn validate_disjoint(config: &SchedulerConfig) -> Result<(), ContractError> {
    if let Some(channel) = config
        .immediate_channels
        .intersection(&config.critical_channels)
        .next()
    {
        return Err(ContractError::config_validation(
            format!("critical_channels[{channel}]"),
            "channel is already listed in immediate_channels",
        ));
    }
    Ok(())
}
