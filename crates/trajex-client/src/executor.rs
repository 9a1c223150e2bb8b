//! 轨迹执行入口
//!
//! 把规划器、播放控制、网关与取消监督组合成一次调用：
//!
//! ```text
//! plan → register_robot → 捕获有效速度 → open_stream → supervise
//! ```
//!
//! 规划器是外部协作者（[`TrajectoryPlanner`]），本 crate 只提供一个
//! 不做插值、只分配轨迹 id 的 [`SequentialPlanner`]，供模拟器和测试使用。

use crate::actions::CombinedActions;
use crate::config::SessionConfig;
use crate::control::{
    CancellationSupervisor, ExecutionProgress, ExecutionSummary, MovementSession,
    MovementSessionContext,
};
use crate::{BoxError, ExecutionError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use trajex_driver::MotionGateway;
use trajex_playback::PlaybackControlManager;
use trajex_protocol::{IoCondition, MotionGroupId, PlaybackSpeedPercent, TrajectoryId};

/// 规划结果
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedTrajectory {
    /// 网关侧已加载轨迹的 id
    pub trajectory_id: TrajectoryId,
    pub combined_actions: CombinedActions,
}

/// 轨迹规划器
#[async_trait]
pub trait TrajectoryPlanner: Send + Sync {
    async fn plan(
        &self,
        motion_group: &MotionGroupId,
        actions: &CombinedActions,
    ) -> Result<PlannedTrajectory, BoxError>;
}

/// 只分配轨迹 id 的规划器
///
/// id 格式为 `"<motion_group>-<n>"`，`n` 从 1 递增。空动作列表被拒绝。
#[derive(Debug, Default)]
pub struct SequentialPlanner {
    counter: AtomicU64,
}

impl SequentialPlanner {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrajectoryPlanner for SequentialPlanner {
    async fn plan(
        &self,
        motion_group: &MotionGroupId,
        actions: &CombinedActions,
    ) -> Result<PlannedTrajectory, BoxError> {
        if actions.motions().is_empty() {
            return Err("action list contains no motion".into());
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(PlannedTrajectory {
            trajectory_id: TrajectoryId::new(format!("{motion_group}-{n}")),
            combined_actions: actions.clone(),
        })
    }
}

/// 单次执行的选项
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOptions {
    /// 方法参数层速度
    pub method_speed: Option<PlaybackSpeedPercent>,
    /// 启动门控条件
    pub start_on_io: Option<IoCondition>,
    /// 首次注册运动组时使用的名称
    pub robot_name: Option<String>,
    /// 首次注册运动组时的装饰器默认速度
    pub default_speed: i64,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            method_speed: None,
            start_on_io: None,
            robot_name: None,
            default_speed: i64::from(PlaybackSpeedPercent::FULL.value()),
        }
    }
}

impl ExecuteOptions {
    pub fn with_method_speed(mut self, speed: PlaybackSpeedPercent) -> Self {
        self.method_speed = Some(speed);
        self
    }

    pub fn with_start_on_io(mut self, condition: IoCondition) -> Self {
        self.start_on_io = Some(condition);
        self
    }

    pub fn with_robot_name(mut self, name: impl Into<String>) -> Self {
        self.robot_name = Some(name.into());
        self
    }

    pub fn with_default_speed(mut self, speed: i64) -> Self {
        self.default_speed = speed;
        self
    }
}

/// 轨迹执行器
pub struct TrajectoryExecutor<G, P> {
    gateway: G,
    planner: P,
    playback: Arc<PlaybackControlManager>,
    config: SessionConfig,
}

impl<G, P> TrajectoryExecutor<G, P>
where
    G: MotionGateway,
    P: TrajectoryPlanner,
{
    pub fn new(
        gateway: G,
        planner: P,
        playback: Arc<PlaybackControlManager>,
        config: SessionConfig,
    ) -> Self {
        Self {
            gateway,
            planner,
            playback,
            config,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn playback(&self) -> &Arc<PlaybackControlManager> {
        &self.playback
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// 执行动作列表，直到完成、出错或 `token` 被取消
    pub async fn execute(
        &self,
        motion_group: &MotionGroupId,
        actions: &CombinedActions,
        options: ExecuteOptions,
        token: &CancellationToken,
    ) -> Result<ExecutionSummary, ExecutionError> {
        let (session, supervisor) = self.prepare(motion_group, actions, options).await?;
        let stream = self.gateway.open_stream(motion_group).await?;
        supervisor.supervise(session, stream, token).await
    }

    /// 执行动作列表，同时运行调用方的进度消费者
    ///
    /// 消费者收到进度订阅；返回 `Err` 会中止执行并以 `ConsumerFault` 返回。
    pub async fn execute_with_consumer<F, Fut>(
        &self,
        motion_group: &MotionGroupId,
        actions: &CombinedActions,
        options: ExecuteOptions,
        token: &CancellationToken,
        consumer: F,
    ) -> Result<ExecutionSummary, ExecutionError>
    where
        F: FnOnce(watch::Receiver<ExecutionProgress>) -> Fut,
        Fut: Future<Output = Result<(), BoxError>> + Send,
    {
        let (session, supervisor) = self.prepare(motion_group, actions, options).await?;
        let progress = session.subscribe();
        let stream = self.gateway.open_stream(motion_group).await?;
        supervisor
            .supervise_with_consumer(session, stream, token, consumer(progress))
            .await
    }

    async fn prepare(
        &self,
        motion_group: &MotionGroupId,
        actions: &CombinedActions,
        options: ExecuteOptions,
    ) -> Result<(MovementSession, CancellationSupervisor), ExecutionError> {
        let planned = self
            .planner
            .plan(motion_group, actions)
            .await
            .map_err(ExecutionError::Planning)?;
        debug!(
            motion_group = %motion_group,
            trajectory = %planned.trajectory_id,
            "Trajectory planned"
        );

        self.playback.register_robot(
            motion_group,
            options.robot_name.as_deref(),
            options.default_speed,
        )?;

        // 会话开始时的有效速度；之后的变化由会话按轮询下发
        let speed = self
            .playback
            .get_effective_speed(motion_group, options.method_speed);
        info!(
            motion_group = %motion_group,
            trajectory = %planned.trajectory_id,
            speed = %speed,
            "Executing trajectory"
        );

        let context =
            MovementSessionContext::new(motion_group.clone(), planned.trajectory_id, planned.combined_actions)
                .with_effective_speed(speed)
                .with_method_speed(options.method_speed)
                .with_start_on_io(options.start_on_io);
        let session = MovementSession::new(context, Arc::clone(&self.playback), self.config.clone());
        Ok((session, CancellationSupervisor::from(&self.config)))
    }
}
