//! 会话运行时配置

use std::time::Duration;
use trajex_tools::ExecutionConfig;

/// 会话运行时配置（`ExecutionConfig` 的强类型形式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// 初始化握手超时
    pub init_timeout: Duration,
    /// 停止序列等待确认的宽限期
    pub stop_grace_period: Duration,
    /// 无入站消息时重新检查播放控制的间隔
    pub playback_poll_interval: Duration,
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

impl From<&ExecutionConfig> for SessionConfig {
    fn from(config: &ExecutionConfig) -> Self {
        let session = &config.session;
        Self {
            init_timeout: Duration::from_millis(session.init_timeout_ms),
            stop_grace_period: Duration::from_millis(session.stop_grace_period_ms),
            playback_poll_interval: Duration::from_millis(session.playback_poll_interval_ms.max(1)),
            channel_capacity: session.channel_capacity.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_execution_config() {
        let mut file = ExecutionConfig::default();
        file.session.stop_grace_period_ms = 250;
        let config = SessionConfig::from(&file);
        assert_eq!(config.stop_grace_period, Duration::from_millis(250));
        assert_eq!(config.init_timeout, Duration::from_secs(5));
        assert_eq!(config.playback_poll_interval, Duration::from_millis(50));
        assert_eq!(config.channel_capacity, 64);
    }
}
