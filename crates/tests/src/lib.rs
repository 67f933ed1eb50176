//! # Integration Tests
//!
//! 集成测试。
//!
//! 负责：
//! - 合约快照测试
//! - 调度场景测试 (ManualClock，确定性)
//! - 调度不变量测试

#[cfg(test)]
mod contract_tests {
    use contracts::{channels, ConfigVersion, SchedulerConfig};

    #[test]
    fn test_default_config_snapshot() {
        let config = SchedulerConfig::default();
        assert_eq!(config.version, ConfigVersion::V1);
        assert_eq!(config.default_interval, 0.1);
        assert_eq!(config.critical_interval, 0.05);
        assert_eq!(config.max_per_invocation, 5);
        assert_eq!(config.stats_window, 1.0);
        let immediate: Vec<&str> = config.immediate_channels.iter().map(|c| c.as_str()).collect();
        assert_eq!(immediate, vec![channels::BATTLE, channels::MESSAGES]);
        assert!(config.critical_channels.is_empty());
    }
}

#[cfg(test)]
mod support;

#[cfg(test)]
mod scenario_tests;

#[cfg(test)]
mod property_tests;
