//! 入站响应
//!
//! 执行器网关回传的初始化结果、运动状态快照与静止事件。

use crate::TrajectoryId;
use serde::{Deserialize, Serialize};

/// 初始化响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitResponse {
    pub succeeded: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl InitResponse {
    pub fn accepted() -> Self {
        Self {
            succeeded: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            reason: Some(reason.into()),
        }
    }
}

/// 轨迹执行阶段
///
/// 线上的 `execute.details` 判别字段，显式建模为带标签的和类型，
/// 由状态机穷尽匹配。未知标签在解码时即被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutePhase {
    /// 运行中（附带剩余时间估计）
    Running { time_to_end_ms: u64 },
    /// 到达轨迹终点
    Ended,
    /// 被用户暂停
    PausedByUser,
}

/// 执行负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execute {
    pub trajectory_id: TrajectoryId,
    /// 路径参数
    pub location: f64,
    pub phase: ExecutePhase,
}

/// 运动状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionStateSnapshot {
    /// 所有关节速度为零
    pub standstill: bool,
    #[serde(default)]
    pub execute: Option<Execute>,
}

impl MotionStateSnapshot {
    /// 不带执行负载的快照
    pub fn bare(standstill: bool) -> Self {
        Self {
            standstill,
            execute: None,
        }
    }

    pub fn with_execute(
        standstill: bool,
        trajectory_id: TrajectoryId,
        location: f64,
        phase: ExecutePhase,
    ) -> Self {
        Self {
            standstill,
            execute: Some(Execute {
                trajectory_id,
                location,
                phase,
            }),
        }
    }
}

/// 静止原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandstillReason {
    /// 运动结束（部分传输以此报告完成）
    MotionEnded,
    PausedByUser,
    PausedOnIo,
    /// 响应 Stop 指令或出站通道关闭后的保持
    Stopped,
    Other(String),
}

/// 独立的静止事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandstillEvent {
    pub reason: StandstillReason,
    #[serde(default)]
    pub location: Option<f64>,
}

/// 网关回传的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum GatewayResponse {
    Init(InitResponse),
    State(MotionStateSnapshot),
    Standstill(StandstillEvent),
}

impl GatewayResponse {
    /// 作为 Stop 的确认：`StandstillEvent{Stopped}` 或静止快照
    ///
    /// 只对 Stop 发出之后收到的消息有意义。
    pub fn acknowledges_stop(&self) -> bool {
        match self {
            GatewayResponse::State(snapshot) => snapshot.standstill,
            GatewayResponse::Standstill(event) => event.reason == StandstillReason::Stopped,
            GatewayResponse::Init(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledges_stop() {
        let event = |reason| {
            GatewayResponse::Standstill(StandstillEvent {
                reason,
                location: None,
            })
        };
        assert!(GatewayResponse::State(MotionStateSnapshot::bare(true)).acknowledges_stop());
        assert!(!GatewayResponse::State(MotionStateSnapshot::bare(false)).acknowledges_stop());
        assert!(event(StandstillReason::Stopped).acknowledges_stop());
        assert!(!event(StandstillReason::MotionEnded).acknowledges_stop());
        assert!(!event(StandstillReason::PausedByUser).acknowledges_stop());
        assert!(!GatewayResponse::Init(InitResponse::accepted()).acknowledges_stop());
    }

    #[test]
    fn test_init_response_constructors() {
        let rejected = InitResponse::rejected("trajectory not found");
        assert!(!rejected.succeeded);
        assert_eq!(rejected.reason.as_deref(), Some("trajectory not found"));
        assert!(InitResponse::accepted().succeeded);
    }
}
