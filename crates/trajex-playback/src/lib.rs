//! # Trajex Playback
//!
//! 运动组级别的播放控制：速度覆盖、暂停 / 恢复、方向。
//!
//! ## 模块
//!
//! - `manager`: [`PlaybackControlManager`]，四层优先级解析
//! - `hooks`: 状态变化事件回调
//! - `types`: 播放状态 / 控制记录等数据类型
//!
//! 管理器是显式构造的服务对象，不提供全局单例；
//! 执行会话通过 `Arc<PlaybackControlManager>` 共享同一个实例。

mod error;
pub mod hooks;
mod manager;
mod types;

pub use error::PlaybackError;
pub use hooks::{CallbackHandle, HookManager, PlaybackEvent, PlaybackEventCallback};
pub use manager::PlaybackControlManager;
pub use types::{ControlSource, PlaybackControl, PlaybackState, RobotMetadata};
