//! # 执行配置
//!
//! 应用共享的 TOML 配置文件：
//!
//! ```toml
//! [session]
//! init_timeout_ms = 5000
//! stop_grace_period_ms = 2000
//! playback_poll_interval_ms = 50
//! channel_capacity = 64
//!
//! [playback]
//! default_speed = 100
//! ```
//!
//! 缺省字段使用默认值；加载时统一校验。

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trajex_protocol::PlaybackSpeedPercent;

/// 执行配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub session: SessionSettings,
    pub playback: PlaybackSettings,
}

/// 会话设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// 初始化握手超时（毫秒）
    pub init_timeout_ms: u64,
    /// 停止序列等待确认的宽限期（毫秒）
    pub stop_grace_period_ms: u64,
    /// 无入站消息时重新检查播放控制的间隔（毫秒）
    pub playback_poll_interval_ms: u64,
    /// 运动流通道容量
    pub channel_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            init_timeout_ms: 5000,
            stop_grace_period_ms: 2000,
            playback_poll_interval_ms: 50,
            channel_capacity: 64,
        }
    }
}

/// 播放设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// 注册运动组时使用的默认速度百分比
    pub default_speed: i64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { default_speed: 100 }
    }
}

impl PlaybackSettings {
    /// 校验后的默认速度
    pub fn default_speed(&self) -> Result<PlaybackSpeedPercent> {
        PlaybackSpeedPercent::new(self.default_speed).context("Invalid [playback] default_speed")
    }
}

impl ExecutionConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse execution config")?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// 保存配置到文件（保存前校验）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        let content = self.to_toml_string()?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize execution config")
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        self.playback.default_speed()?;
        if self.session.init_timeout_ms == 0 {
            bail!("[session] init_timeout_ms must be greater than 0");
        }
        if self.session.stop_grace_period_ms == 0 {
            bail!("[session] stop_grace_period_ms must be greater than 0");
        }
        if self.session.playback_poll_interval_ms == 0 {
            bail!("[session] playback_poll_interval_ms must be greater than 0");
        }
        if self.session.channel_capacity == 0 {
            bail!("[session] channel_capacity must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ExecutionConfig::default();
        assert_eq!(config.session.init_timeout_ms, 5000);
        assert_eq!(config.session.stop_grace_period_ms, 2000);
        assert_eq!(config.session.playback_poll_interval_ms, 50);
        assert_eq!(config.session.channel_capacity, 64);
        assert_eq!(config.playback.default_speed, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = ExecutionConfig::from_toml_str(
            r#"
[session]
stop_grace_period_ms = 500
"#,
        )
        .unwrap();
        assert_eq!(config.session.stop_grace_period_ms, 500);
        assert_eq!(config.session.init_timeout_ms, 5000);
        assert_eq!(config.playback.default_speed, 100);

        let empty = ExecutionConfig::from_toml_str("").unwrap();
        assert_eq!(empty, ExecutionConfig::default());
    }

    #[test]
    fn test_out_of_range_speed_rejected() {
        let err = ExecutionConfig::from_toml_str("[playback]\ndefault_speed = 150\n").unwrap_err();
        assert!(format!("{:#}", err).contains("default_speed"), "{:#}", err);

        let err = ExecutionConfig::from_toml_str("[playback]\ndefault_speed = -1\n").unwrap_err();
        assert!(format!("{:#}", err).contains("out of range"), "{:#}", err);
    }

    #[test]
    fn test_zero_durations_rejected() {
        let mut config = ExecutionConfig::default();
        config.session.playback_poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ExecutionConfig::default();
        config.session.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(ExecutionConfig::from_toml_str("[session\ninit_timeout_ms = ").is_err());
        assert!(ExecutionConfig::from_toml_str("[session]\ninit_timeout_ms = \"soon\"\n").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trajex.toml");

        let mut config = ExecutionConfig::default();
        config.session.init_timeout_ms = 1500;
        config.playback.default_speed = 35;
        config.save_to_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[session]"));
        assert!(content.contains("default_speed = 35"));

        let loaded = ExecutionConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ExecutionConfig::load_from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_save_refuses_invalid_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        let mut config = ExecutionConfig::default();
        config.playback.default_speed = 101;
        assert!(config.save_to_file(&path).is_err());
        assert!(!path.exists());
    }
}
