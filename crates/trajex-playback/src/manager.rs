//! 播放控制管理器
//!
//! 按运动组解析"多快、哪个方向、是否暂停"的唯一真相来源。
//!
//! # 优先级
//!
//! 速度 / 方向按四层解析：
//!
//! ```text
//! External（外部覆盖） > Method（方法参数） > Decorator（装饰器默认） > Default（100%）
//! ```
//!
//! 状态（暂停 / 恢复）单独维护在执行状态层，优先于外部覆盖记录里携带的状态；
//! 唯一的跨层交互：外部覆盖显式设置 `Playing` 时会清除执行状态层中的 `Paused`。
//!
//! # 线程安全
//!
//! 所有映射由一把粗粒度锁保护（临界区都是 O(1) 的 map 操作），
//! 事件在锁释放之后投递，回调中可以安全地再次调用管理器。

use crate::hooks::{CallbackHandle, HookManager, PlaybackEvent, PlaybackEventCallback, dispatch};
use crate::{ControlSource, PlaybackControl, PlaybackError, PlaybackState, RobotMetadata};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info};
use trajex_protocol::{MotionGroupId, PlaybackDirection, PlaybackSpeedPercent};

/// 各优先级层的存储
#[derive(Default)]
struct Registry {
    metadata: HashMap<MotionGroupId, RobotMetadata>,
    decorator: HashMap<MotionGroupId, PlaybackControl>,
    external: HashMap<MotionGroupId, PlaybackControl>,
    execution_state: HashMap<MotionGroupId, PlaybackState>,
}

impl Registry {
    fn resolve_speed(
        &self,
        id: &MotionGroupId,
        method_speed: Option<PlaybackSpeedPercent>,
    ) -> (PlaybackSpeedPercent, ControlSource) {
        if let Some(external) = self.external.get(id) {
            return (external.speed, ControlSource::External);
        }
        if let Some(speed) = method_speed {
            return (speed, ControlSource::Method);
        }
        if let Some(decorator) = self.decorator.get(id) {
            return (decorator.speed, ControlSource::Decorator);
        }
        (PlaybackSpeedPercent::FULL, ControlSource::Default)
    }

    fn resolve_state(&self, id: &MotionGroupId) -> PlaybackState {
        self.execution_state
            .get(id)
            .copied()
            .or_else(|| self.external.get(id).and_then(|c| c.state))
            .unwrap_or(PlaybackState::Playing)
    }

    fn resolve_direction(&self, id: &MotionGroupId) -> PlaybackDirection {
        self.external
            .get(id)
            .and_then(|c| c.direction)
            .unwrap_or_default()
    }

    fn contains(&self, id: &MotionGroupId) -> bool {
        self.metadata.contains_key(id)
            || self.decorator.contains_key(id)
            || self.external.contains_key(id)
            || self.execution_state.contains_key(id)
    }
}

/// 播放控制管理器
///
/// 显式构造的服务对象：由组合根持有进程级实例（通常包在 `Arc` 中共享），
/// 测试可以随意创建互相隔离的实例。
///
/// # 示例
///
/// ```rust
/// use trajex_playback::{PlaybackControlManager, PlaybackState};
/// use trajex_protocol::MotionGroupId;
///
/// let manager = PlaybackControlManager::new();
/// let arm = MotionGroupId::new("0@ur5e");
///
/// manager.register_robot(&arm, Some("left arm"), 80)?;
/// assert_eq!(manager.get_effective_speed(&arm, None).value(), 80);
///
/// manager.set_external_override(&arm, 25, None, None)?;
/// assert_eq!(manager.get_effective_speed(&arm, None).value(), 25);
///
/// manager.pause(&arm);
/// assert_eq!(manager.get_effective_state(&arm), PlaybackState::Paused);
/// # Ok::<(), trajex_playback::PlaybackError>(())
/// ```
#[derive(Default)]
pub struct PlaybackControlManager {
    registry: Mutex<Registry>,
    hooks: RwLock<HookManager>,
}

impl PlaybackControlManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在锁内修改并收集事件，释放锁后投递
    fn mutate<R>(&self, f: impl FnOnce(&mut Registry, &mut Vec<PlaybackEvent>) -> R) -> R {
        let mut events = Vec::new();
        let result = {
            let mut registry = self.registry.lock();
            f(&mut registry, &mut events)
        };
        if !events.is_empty() {
            let callbacks = self.hooks.read().snapshot();
            dispatch(&callbacks, &events);
        }
        result
    }

    // ==================== 注册 ====================

    /// 注册机器人
    ///
    /// 写入元数据；若尚无装饰器默认记录，则以 `initial_speed` 创建。
    /// 重复注册不会覆盖已有的装饰器默认值。
    pub fn register_robot(
        &self,
        id: &MotionGroupId,
        name: Option<&str>,
        initial_speed: i64,
    ) -> Result<(), PlaybackError> {
        let speed = PlaybackSpeedPercent::new(initial_speed)?;
        self.mutate(|registry, events| {
            let metadata = registry.metadata.entry(id.clone()).or_default();
            if let Some(name) = name {
                metadata.name = Some(name.to_string());
            }
            let name = metadata.name.clone();
            registry
                .decorator
                .entry(id.clone())
                .or_insert_with(|| PlaybackControl::new(speed, ControlSource::Decorator));

            info!(motion_group = %id, name = ?name, "Robot registered for playback control");
            events.push(PlaybackEvent::RobotRegistered {
                id: id.clone(),
                name,
            });
        });
        Ok(())
    }

    /// 注销机器人：移除所有层；未知 id 为空操作
    pub fn unregister_robot(&self, id: &MotionGroupId) {
        self.mutate(|registry, events| {
            if !registry.contains(id) {
                return;
            }
            registry.metadata.remove(id);
            registry.decorator.remove(id);
            registry.external.remove(id);
            registry.execution_state.remove(id);

            info!(motion_group = %id, "Robot unregistered from playback control");
            events.push(PlaybackEvent::RobotUnregistered { id: id.clone() });
        });
    }

    // ==================== 速度 / 方向 ====================

    /// 设置装饰器（配置）默认速度
    pub fn set_decorator_default(&self, id: &MotionGroupId, speed: i64) -> Result<(), PlaybackError> {
        let speed = PlaybackSpeedPercent::new(speed)?;
        self.mutate(|registry, events| {
            let (old, _) = registry.resolve_speed(id, None);
            registry
                .decorator
                .insert(id.clone(), PlaybackControl::new(speed, ControlSource::Decorator));
            let (new, _) = registry.resolve_speed(id, None);

            debug!(motion_group = %id, speed = %speed, "Decorator default speed set");
            if new != old {
                events.push(PlaybackEvent::SpeedChanged {
                    id: id.clone(),
                    old,
                    new,
                });
            }
        });
        Ok(())
    }

    /// 设置外部覆盖
    ///
    /// 未提供的 `state` / `direction` 沿用上一条外部覆盖记录中的值。
    /// `state == Playing` 会清除执行状态层中残留的 `Paused`。
    ///
    /// # 错误
    ///
    /// `speed` 不在 [0, 100] 内时返回 `PlaybackError::Validation`，且不做任何修改。
    pub fn set_external_override(
        &self,
        id: &MotionGroupId,
        speed: i64,
        state: Option<PlaybackState>,
        direction: Option<PlaybackDirection>,
    ) -> Result<(), PlaybackError> {
        let speed = PlaybackSpeedPercent::new(speed)?;
        self.mutate(|registry, events| {
            let (old_speed, _) = registry.resolve_speed(id, None);
            let old_state = registry.resolve_state(id);

            let prior = registry.external.get(id);
            let record = PlaybackControl::new(speed, ControlSource::External)
                .with_state(state.or_else(|| prior.and_then(|c| c.state)))
                .with_direction(direction.or_else(|| prior.and_then(|c| c.direction)));
            registry.external.insert(id.clone(), record);

            if state == Some(PlaybackState::Playing)
                && registry.execution_state.get(id) == Some(&PlaybackState::Paused)
            {
                registry.execution_state.remove(id);
                debug!(motion_group = %id, "External play intent cleared a stale pause");
            }

            let (new_speed, _) = registry.resolve_speed(id, None);
            debug!(
                motion_group = %id,
                speed = %speed,
                state = ?state,
                direction = ?direction,
                "External override set"
            );
            if new_speed != old_speed {
                events.push(PlaybackEvent::SpeedChanged {
                    id: id.clone(),
                    old: old_speed,
                    new: new_speed,
                });
            }
            if let Some(requested) = state.filter(|s| *s != old_state) {
                events.push(PlaybackEvent::StateChanged {
                    id: id.clone(),
                    old: old_state,
                    new: requested,
                });
            }
        });
        Ok(())
    }

    /// 清除外部覆盖（执行状态层不受影响）
    pub fn clear_external_override(&self, id: &MotionGroupId) {
        self.mutate(|registry, events| {
            let (old_speed, _) = registry.resolve_speed(id, None);
            let old_state = registry.resolve_state(id);
            if registry.external.remove(id).is_none() {
                return;
            }
            let (new_speed, _) = registry.resolve_speed(id, None);
            let new_state = registry.resolve_state(id);

            debug!(motion_group = %id, speed = %new_speed, "External override cleared");
            events.push(PlaybackEvent::SpeedChanged {
                id: id.clone(),
                old: old_speed,
                new: new_speed,
            });
            if new_state != old_state {
                events.push(PlaybackEvent::StateChanged {
                    id: id.clone(),
                    old: old_state,
                    new: new_state,
                });
            }
        });
    }

    // ==================== 执行状态 ====================

    /// 写入执行状态层；与当前有效状态相同时为空操作
    pub fn set_execution_state(&self, id: &MotionGroupId, state: PlaybackState) {
        self.mutate(|registry, events| {
            let old = registry.resolve_state(id);
            registry.execution_state.insert(id.clone(), state);
            if old == state {
                return;
            }

            debug!(motion_group = %id, old = ?old, new = ?state, "Execution state changed");
            events.push(PlaybackEvent::StateChanged {
                id: id.clone(),
                old,
                new: state,
            });
        });
    }

    /// 暂停（已暂停时为空操作，不重复发事件）
    pub fn pause(&self, id: &MotionGroupId) {
        self.set_execution_state(id, PlaybackState::Paused);
    }

    /// 恢复（已在运动中时为空操作）
    pub fn resume(&self, id: &MotionGroupId) {
        if self.get_effective_state(id).is_moving() {
            return;
        }
        self.set_execution_state(id, PlaybackState::Playing);
    }

    // ==================== 查询 ====================

    /// 有效速度：外部覆盖 > `method_speed` > 装饰器默认 > 100
    pub fn get_effective_speed(
        &self,
        id: &MotionGroupId,
        method_speed: Option<PlaybackSpeedPercent>,
    ) -> PlaybackSpeedPercent {
        self.registry.lock().resolve_speed(id, method_speed).0
    }

    /// 有效状态：执行状态层 > 外部覆盖中的状态 > Playing
    pub fn get_effective_state(&self, id: &MotionGroupId) -> PlaybackState {
        self.registry.lock().resolve_state(id)
    }

    /// 有效方向：外部覆盖中的方向 > Forward
    pub fn get_effective_direction(&self, id: &MotionGroupId) -> PlaybackDirection {
        self.registry.lock().resolve_direction(id)
    }

    /// 在一次加锁内解析速度 / 状态 / 方向，并标注速度的来源层
    pub fn effective_control(
        &self,
        id: &MotionGroupId,
        method_speed: Option<PlaybackSpeedPercent>,
    ) -> PlaybackControl {
        let registry = self.registry.lock();
        let (speed, source) = registry.resolve_speed(id, method_speed);
        PlaybackControl::new(speed, source)
            .with_state(Some(registry.resolve_state(id)))
            .with_direction(Some(registry.resolve_direction(id)))
    }

    /// 只看执行状态层：Executing / Playing 时可暂停
    pub fn can_pause(&self, id: &MotionGroupId) -> bool {
        matches!(
            self.registry.lock().execution_state.get(id),
            Some(PlaybackState::Executing | PlaybackState::Playing)
        )
    }

    /// 只看执行状态层：Paused 时可恢复
    pub fn can_resume(&self, id: &MotionGroupId) -> bool {
        self.registry.lock().execution_state.get(id) == Some(&PlaybackState::Paused)
    }

    /// 出现在任一层中的所有运动组（排序后返回）
    pub fn get_all_robots(&self) -> Vec<MotionGroupId> {
        let registry = self.registry.lock();
        let ids: BTreeSet<&MotionGroupId> = registry
            .metadata
            .keys()
            .chain(registry.decorator.keys())
            .chain(registry.external.keys())
            .chain(registry.execution_state.keys())
            .collect();
        ids.into_iter().cloned().collect()
    }

    pub fn robot_name(&self, id: &MotionGroupId) -> Option<String> {
        self.registry
            .lock()
            .metadata
            .get(id)
            .and_then(|m| m.name.clone())
    }

    pub fn decorator_default(&self, id: &MotionGroupId) -> Option<PlaybackSpeedPercent> {
        self.registry.lock().decorator.get(id).map(|c| c.speed)
    }

    pub fn external_override(&self, id: &MotionGroupId) -> Option<PlaybackControl> {
        self.registry.lock().external.get(id).cloned()
    }

    // ==================== 事件 ====================

    /// 注册事件回调
    pub fn register_event_callback<C>(&self, callback: C) -> CallbackHandle
    where
        C: PlaybackEventCallback + 'static,
    {
        self.hooks.write().add_callback(Arc::new(callback))
    }

    /// 移除事件回调，返回是否存在
    pub fn remove_event_callback(&self, handle: CallbackHandle) -> bool {
        self.hooks.write().remove_callback(handle)
    }
}
