//! 轨迹执行客户端
//!
//! 本 crate 提供单次轨迹执行的完整协议逻辑，包括：
//! - `TrajectoryExecutionMachine`（执行状态机，只由快照与显式指令驱动）
//! - `MovementSession`（初始化握手、启动、播放控制到运行时指令的翻译）
//! - `CancellationSupervisor`（任意退出路径上的停止序列）
//! - `TrajectoryExecutor`（规划 → 注册 → 打开流 → 监督 的组合入口）
//!
//! # 使用场景
//!
//! 大多数调用方只需要 [`TrajectoryExecutor`]。需要自定义流（例如自己的传输层）时，
//! 可以直接构造 [`MovementSession`] 并交给 [`CancellationSupervisor`]。

pub mod actions;
mod config;
pub mod control;
mod error;
mod executor;
pub mod state;

// 重新导出常用类型
pub use actions::{Action, AnchoredIo, CombinedActions, Motion, MotionType};
pub use config::SessionConfig;
pub use control::{
    CancellationSupervisor, Completion, ExecutionProgress, ExecutionSummary, MovementSession,
    MovementSessionContext, StopGuard, StopReport,
};
pub use error::{BoxError, ExecutionError};
pub use executor::{
    ExecuteOptions, PlannedTrajectory, SequentialPlanner, TrajectoryExecutor, TrajectoryPlanner,
};
pub use state::{
    ExecutionCommand, StateUpdateResult, TrajectoryExecutionMachine, TrajectoryExecutionState,
};
