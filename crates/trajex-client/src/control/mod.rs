//! 执行控制模块
//!
//! - `MovementSession` - 单次轨迹执行的初始化、启动与播放控制驱动
//! - `CancellationSupervisor` - 任意退出路径上的停止序列

mod session;
mod supervisor;

pub use session::{
    Completion, ExecutionProgress, ExecutionSummary, MovementSession, MovementSessionContext,
};
pub use supervisor::{CancellationSupervisor, StopGuard, StopReport, stop_sequence};
