//! 事件钩子系统
//!
//! 播放控制状态变化时向订阅者（事件 / 指标 sink）投递事件。
//!
//! # 投递语义
//!
//! - **锁外投递**: 管理器在内部锁中完成修改并收集事件，释放锁之后才触发回调，
//!   因此回调内可以再次调用管理器而不会死锁
//! - **尽力而为**: 回调 panic 会被捕获并记录日志，不影响修改本身，也不影响其他回调
//!
//! # 使用示例
//!
//! ```rust
//! use trajex_playback::{PlaybackControlManager, PlaybackEvent};
//! use trajex_protocol::MotionGroupId;
//!
//! let manager = PlaybackControlManager::new();
//! let handle = manager.register_event_callback(|event: &PlaybackEvent| {
//!     println!("playback event: {:?}", event);
//! });
//! manager.register_robot(&MotionGroupId::new("0@ur5e"), None, 100).unwrap();
//! manager.remove_event_callback(handle);
//! ```

use crate::PlaybackState;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::error;
use trajex_protocol::{MotionGroupId, PlaybackSpeedPercent};

/// 播放控制事件
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    RobotRegistered {
        id: MotionGroupId,
        name: Option<String>,
    },
    RobotUnregistered {
        id: MotionGroupId,
    },
    SpeedChanged {
        id: MotionGroupId,
        old: PlaybackSpeedPercent,
        new: PlaybackSpeedPercent,
    },
    StateChanged {
        id: MotionGroupId,
        old: PlaybackState,
        new: PlaybackState,
    },
}

impl PlaybackEvent {
    /// 事件所属运动组
    pub fn motion_group(&self) -> &MotionGroupId {
        match self {
            PlaybackEvent::RobotRegistered { id, .. }
            | PlaybackEvent::RobotUnregistered { id }
            | PlaybackEvent::SpeedChanged { id, .. }
            | PlaybackEvent::StateChanged { id, .. } => id,
        }
    }
}

/// 事件回调 Trait
///
/// 回调在修改线程上同步执行，应保持短小；耗时处理请转发到 channel。
pub trait PlaybackEventCallback: Send + Sync {
    fn on_event(&self, event: &PlaybackEvent);
}

impl<F> PlaybackEventCallback for F
where
    F: Fn(&PlaybackEvent) + Send + Sync,
{
    fn on_event(&self, event: &PlaybackEvent) {
        self(event)
    }
}

/// 回调句柄（用于移除回调）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u64);

/// 钩子管理器
///
/// 回调列表本身不是线程安全的，需要外部同步（管理器内部使用 `RwLock<HookManager>`）。
#[derive(Default)]
pub struct HookManager {
    callbacks: Vec<(CallbackHandle, Arc<dyn PlaybackEventCallback>)>,
    next_id: u64,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
            next_id: 0,
        }
    }

    /// 添加回调，返回用于移除的句柄
    pub fn add_callback(&mut self, callback: Arc<dyn PlaybackEventCallback>) -> CallbackHandle {
        let handle = CallbackHandle(self.next_id);
        self.next_id += 1;
        self.callbacks.push((handle, callback));
        handle
    }

    /// 移除回调，返回是否存在
    pub fn remove_callback(&mut self, handle: CallbackHandle) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(h, _)| *h != handle);
        self.callbacks.len() != before
    }

    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 获取回调快照
    ///
    /// 调用方在释放外部锁之后再逐个触发，避免回调重入时死锁。
    pub fn snapshot(&self) -> Vec<Arc<dyn PlaybackEventCallback>> {
        self.callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// 逐个触发回调，隔离 panic
pub(crate) fn dispatch(callbacks: &[Arc<dyn PlaybackEventCallback>], events: &[PlaybackEvent]) {
    for event in events {
        for callback in callbacks {
            let outcome = catch_unwind(AssertUnwindSafe(|| callback.on_event(event)));
            if outcome.is_err() {
                error!(
                    motion_group = %event.motion_group(),
                    "Playback event callback panicked on {:?}",
                    event
                );
            }
        }
    }
}
