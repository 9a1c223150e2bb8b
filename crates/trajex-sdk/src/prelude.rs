//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use trajex_sdk::prelude::*;
//! ```

// 客户端层
pub use trajex_client::{
    Action, CancellationSupervisor, CombinedActions, Completion, ExecuteOptions,
    ExecutionProgress, ExecutionSummary, Motion, MotionType, MovementSession,
    MovementSessionContext, SequentialPlanner, SessionConfig, TrajectoryExecutionState,
    TrajectoryExecutor, TrajectoryPlanner,
};

// 播放控制
pub use trajex_playback::{PlaybackControlManager, PlaybackEvent, PlaybackState};

// 驱动层
pub use trajex_driver::{MotionGateway, MotionStream, SimulatedGateway, SimulatorConfig};

// 协议层
pub use trajex_protocol::{
    IoCondition, IoValue, IoWrite, MotionGroupId, PlaybackDirection, PlaybackSpeedPercent,
    TrajectoryId,
};

// 配置
pub use trajex_tools::ExecutionConfig;

// 取消令牌
pub use tokio_util::sync::CancellationToken;

// 错误类型
pub use trajex_client::ExecutionError;
pub use trajex_driver::DriverError;
pub use trajex_playback::PlaybackError;
pub use trajex_protocol::ProtocolError;
