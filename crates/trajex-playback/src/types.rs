//! 播放控制数据类型

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use trajex_protocol::{PlaybackDirection, PlaybackSpeedPercent};

/// 播放状态
///
/// `Executing` 与 `Playing` 都表示未暂停的运动，区别在于层级：
/// - `Executing`: 执行状态层（由 pause / resume / set_execution_state 写入）
/// - `Playing`: 用户意图层（外部覆盖携带的状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Executing,
    Paused,
    Playing,
}

impl PlaybackState {
    /// 是否处于运动中（未暂停）
    pub fn is_moving(self) -> bool {
        matches!(self, PlaybackState::Executing | PlaybackState::Playing)
    }
}

/// 控制记录来源（同时也是优先级层）
///
/// 优先级从高到低：External > Method > Decorator > Default。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSource {
    /// 系统默认（100%）
    Default,
    /// 装饰器 / 配置默认值
    Decorator,
    /// 方法参数
    Method,
    /// 外部覆盖（UI、操作员工具等）
    External,
}

/// 播放控制记录
///
/// 创建后不可变；任何修改都生成新记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackControl {
    pub speed: PlaybackSpeedPercent,
    pub state: Option<PlaybackState>,
    pub direction: Option<PlaybackDirection>,
    pub source: ControlSource,
    pub timestamp: SystemTime,
}

impl PlaybackControl {
    pub fn new(speed: PlaybackSpeedPercent, source: ControlSource) -> Self {
        Self {
            speed,
            state: None,
            direction: None,
            source,
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_state(mut self, state: Option<PlaybackState>) -> Self {
        self.state = state;
        self
    }

    pub fn with_direction(mut self, direction: Option<PlaybackDirection>) -> Self {
        self.direction = direction;
        self
    }

    /// 系统默认记录（100%，无状态 / 方向）
    pub fn system_default() -> Self {
        Self::new(PlaybackSpeedPercent::FULL, ControlSource::Default)
    }
}

/// 机器人元数据
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RobotMetadata {
    pub name: Option<String>,
}
