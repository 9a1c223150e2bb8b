//! 执行层错误类型定义

use crate::state::{ExecutionCommand, TrajectoryExecutionState};
use std::time::Duration;
use thiserror::Error;
use trajex_driver::DriverError;
use trajex_playback::PlaybackError;
use trajex_protocol::TrajectoryId;

/// 调用方提供的代码（状态消费者、规划器）返回的错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 执行层错误类型
///
/// 停止序列总是在错误返回之前完成，但不会改变错误的种类。
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// 网关拒绝初始化（不会发送 Start，不可由本组件重试）
    #[error("Gateway rejected trajectory {trajectory_id}: {reason}")]
    InitializationRejected {
        trajectory_id: TrajectoryId,
        reason: String,
    },

    /// 初始化握手超时
    #[error("Gateway did not answer initialization within {timeout:?}")]
    InitializationTimeout { timeout: Duration },

    /// 并行运行的状态消费者失败（原样携带）
    #[error("State consumer failed: {0}")]
    ConsumerFault(#[source] BoxError),

    /// 协作式取消
    #[error("Trajectory execution cancelled")]
    Cancelled,

    /// 运行中的传输故障
    #[error("Remote stream fault: {0}")]
    RemoteStreamFault(#[from] DriverError),

    /// 状态机拒绝的显式指令
    #[error("Command {command:?} is not valid in state {state}")]
    InvalidTransition {
        state: TrajectoryExecutionState,
        command: ExecutionCommand,
    },

    /// 播放控制参数错误
    #[error("Playback control error: {0}")]
    Playback(#[from] PlaybackError),

    /// 规划器失败
    #[error("Trajectory planning failed: {0}")]
    Planning(#[source] BoxError),
}

impl ExecutionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutionError::Cancelled)
    }
}
