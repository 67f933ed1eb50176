//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON 格式。

use contracts::{ContractError, SchedulerConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<SchedulerConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<SchedulerConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<SchedulerConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::channels;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
default_interval = 0.2
critical_interval = 0.02
max_per_invocation = 3
stats_window = 2.0
immediate_channels = ["Messages"]
critical_channels = ["PlayerStats", "Battle"]
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.default_interval, 0.2);
        assert_eq!(config.critical_interval, 0.02);
        assert_eq!(config.max_per_invocation, 3);
        assert_eq!(config.immediate_channels.len(), 1);
        assert!(config.critical_channels.contains(channels::PLAYER_STATS));
        assert!(config.critical_channels.contains(channels::BATTLE));
    }

    #[test]
    fn test_parse_toml_empty_uses_defaults() {
        let config = parse_toml("").unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    fn test_parse_json_partial() {
        let content = r#"{ "max_per_invocation": 8, "immediate_channels": [] }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.max_per_invocation, 8);
        assert!(config.immediate_channels.is_empty());
        assert_eq!(config.default_interval, 0.1);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_toml_wrong_type() {
        let result = parse_toml("max_per_invocation = \"five\"");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
