//! 出站指令
//!
//! 会话层发往执行器网关的所有消息。具体线格式由传输层决定，
//! 这里只定义语义字段。

use crate::{IoCondition, ProtocolError, SetIo, TrajectoryId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== 播放参数 ====================

/// 播放速度百分比（0-100）
///
/// 构造即校验：一旦持有该类型的值，就不可能观察到越界速度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct PlaybackSpeedPercent(u8);

impl PlaybackSpeedPercent {
    /// 系统默认速度（100%）
    pub const FULL: Self = Self(100);

    /// 创建速度百分比
    ///
    /// # 错误
    ///
    /// `value` 不在 [0, 100] 内时返回 `ProtocolError::SpeedOutOfRange`。
    pub fn new(value: i64) -> Result<Self, ProtocolError> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ProtocolError::SpeedOutOfRange { value })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// 转换为 [0.0, 1.0] 的比例
    pub fn as_fraction(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for PlaybackSpeedPercent {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<i64> for PlaybackSpeedPercent {
    type Error = ProtocolError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlaybackSpeedPercent> for u8 {
    fn from(speed: PlaybackSpeedPercent) -> Self {
        speed.0
    }
}

impl fmt::Display for PlaybackSpeedPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// 播放方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackDirection {
    #[default]
    Forward,
    Backward,
}

// ==================== 出站消息 ====================

/// 初始化请求：绑定轨迹并设置起始路径参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeMovementRequest {
    pub trajectory_id: TrajectoryId,
    pub initial_location: f64,
}

/// 启动请求
///
/// `pause_on_io` 在当前实现中总是 `None`，保留字段以对齐网关定义。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StartMovementRequest {
    pub set_io_list: Vec<SetIo>,
    pub start_on_io: Option<IoCondition>,
    pub pause_on_io: Option<IoCondition>,
}

/// 运行时速度覆盖
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedOverrideRequest {
    pub speed: PlaybackSpeedPercent,
}

/// 运行时方向切换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionRequest {
    pub direction: PlaybackDirection,
}

/// 发往网关的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum GatewayRequest {
    Initialize(InitializeMovementRequest),
    Start(StartMovementRequest),
    SpeedOverride(SpeedOverrideRequest),
    Pause,
    Resume,
    Direction(DirectionRequest),
    /// 减速并保持
    Stop,
}
