//! Trajex SDK - 受监督的轨迹执行
//!
//! 把执行器网关上的一次轨迹执行包装成可取消、可暂停、可调速的单次调用。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 网关消息与 JSON-line 编解码
//! - **播放控制层** (`playback`): 运动组级别的速度 / 暂停 / 方向，四层优先级
//! - **驱动层** (`driver`): 双通道运动流、传输管道、模拟执行器
//! - **客户端层** (`client`): 状态机、运动会话、取消监督、执行入口
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use trajex_sdk::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), ExecutionError> {
//! let executor = TrajectoryExecutor::new(
//!     SimulatedGateway::new(SimulatorConfig::new(800.0, 100.0)),
//!     SequentialPlanner::new(),
//!     Arc::new(PlaybackControlManager::new()),
//!     SessionConfig::default(),
//! );
//! let actions = CombinedActions::from_actions([Action::Motion(Motion::joint([0.0, 1.0]))]);
//! let token = CancellationToken::new();
//! let summary = executor
//!     .execute(&MotionGroupId::new("0@sim"), &actions, ExecuteOptions::default(), &token)
//!     .await?;
//! println!("finished in state {}", summary.final_state);
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub use trajex_client as client;
pub use trajex_driver as driver;
pub use trajex_playback as playback;
pub use trajex_protocol as protocol;
pub use trajex_tools as tools;

// 错误类型
pub use trajex_client::{BoxError, ExecutionError};
pub use trajex_driver::DriverError;
pub use trajex_playback::PlaybackError;
pub use trajex_protocol::ProtocolError;

// 客户端层（推荐入口）
pub use trajex_client::{
    CancellationSupervisor, ExecuteOptions, ExecutionSummary, MovementSession,
    TrajectoryExecutor, TrajectoryPlanner,
};
pub use trajex_playback::PlaybackControlManager;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 日志初始化错误
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log directive: {0}")]
    Directive(#[from] tracing_subscriber::filter::ParseError),

    #[error("Global tracing subscriber already set: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Global log logger already set: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// 安装全局 fmt subscriber，并把 `log` 门面桥接到 tracing
///
/// 过滤规则优先读取 `RUST_LOG`；未设置时使用 `default_directive`（如 `"trajex=info"`）。
pub fn init_logging(default_directive: &str) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)?,
    };
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

