//! 运动会话
//!
//! 一次轨迹执行对应一个 [`MovementSession`]，独占一条 [`MotionStream`]：
//!
//! 1. 发送 `Initialize`，在超时内等待 `InitResponse`（被拒绝时不会发送 Start）
//! 2. 发送 `Start`（携带 IO 列表与启动门控条件）
//! 3. 循环：每轮先把播放控制的变化翻译成运行时指令，再等待下一条入站消息或轮询间隔
//!
//! 会话本身不负责停止执行器；任何退出路径上的停止序列由
//! [`CancellationSupervisor`](super::CancellationSupervisor) 执行。

use crate::actions::CombinedActions;
use crate::config::SessionConfig;
use crate::ExecutionError;
use crate::state::{ExecutionCommand, TrajectoryExecutionMachine, TrajectoryExecutionState};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};
use trajex_driver::{DriverError, MotionStream};
use trajex_playback::{PlaybackControlManager, PlaybackState};
use trajex_protocol::{
    DirectionRequest, GatewayRequest, GatewayResponse, InitResponse, InitializeMovementRequest,
    IoCondition, MotionGroupId, PlaybackDirection, PlaybackSpeedPercent, SpeedOverrideRequest,
    StandstillReason, StartMovementRequest, TrajectoryId,
};

/// 单次执行的上下文
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSessionContext {
    pub combined_actions: CombinedActions,
    pub trajectory_id: TrajectoryId,
    pub motion_group: MotionGroupId,
    /// 会话开始时解析出的有效速度
    pub effective_speed: PlaybackSpeedPercent,
    /// 方法参数层的速度
    pub method_speed: Option<PlaybackSpeedPercent>,
    /// 启动门控条件
    pub start_on_io: Option<IoCondition>,
}

impl MovementSessionContext {
    pub fn new(
        motion_group: MotionGroupId,
        trajectory_id: TrajectoryId,
        combined_actions: CombinedActions,
    ) -> Self {
        Self {
            combined_actions,
            trajectory_id,
            motion_group,
            effective_speed: PlaybackSpeedPercent::FULL,
            method_speed: None,
            start_on_io: None,
        }
    }

    pub fn with_effective_speed(mut self, speed: PlaybackSpeedPercent) -> Self {
        self.effective_speed = speed;
        self
    }

    pub fn with_method_speed(mut self, speed: Option<PlaybackSpeedPercent>) -> Self {
        self.method_speed = speed;
        self
    }

    pub fn with_start_on_io(mut self, condition: Option<IoCondition>) -> Self {
        self.start_on_io = condition;
        self
    }
}

/// 对外发布的执行进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionProgress {
    pub location: Option<f64>,
    pub state: TrajectoryExecutionState,
}

/// 完成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 状态机经 Execute/Ended 到达 Completed
    Ended,
    /// 网关发送了独立的 `StandstillEvent{MotionEnded}`
    Standstill,
}

/// 成功执行的摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    pub trajectory_id: TrajectoryId,
    pub final_state: TrajectoryExecutionState,
    pub final_location: Option<f64>,
    /// 发送的运行时指令数（速度 / 暂停 / 恢复 / 方向）
    pub directives_sent: usize,
    pub completion: Completion,
}

/// 已发送到本条流上的播放控制
#[derive(Debug, Clone, Copy)]
struct SentPlayback {
    speed: PlaybackSpeedPercent,
    moving: bool,
    direction: PlaybackDirection,
}

impl Default for SentPlayback {
    fn default() -> Self {
        // 网关在 Start 之后的默认行为
        Self {
            speed: PlaybackSpeedPercent::FULL,
            moving: true,
            direction: PlaybackDirection::Forward,
        }
    }
}

/// 运动会话
pub struct MovementSession {
    context: MovementSessionContext,
    playback: Arc<PlaybackControlManager>,
    config: SessionConfig,
    machine: TrajectoryExecutionMachine,
    progress: watch::Sender<ExecutionProgress>,
    sent: SentPlayback,
    directives_sent: usize,
}

impl MovementSession {
    pub fn new(
        context: MovementSessionContext,
        playback: Arc<PlaybackControlManager>,
        config: SessionConfig,
    ) -> Self {
        let machine = TrajectoryExecutionMachine::new();
        let (progress, _) = watch::channel(ExecutionProgress {
            location: None,
            state: machine.state(),
        });
        Self {
            context,
            playback,
            config,
            machine,
            progress,
            sent: SentPlayback::default(),
            directives_sent: 0,
        }
    }

    pub fn context(&self) -> &MovementSessionContext {
        &self.context
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn machine(&self) -> &TrajectoryExecutionMachine {
        &self.machine
    }

    /// 订阅执行进度（位置与状态）
    pub fn subscribe(&self) -> watch::Receiver<ExecutionProgress> {
        self.progress.subscribe()
    }

    /// 驱动整条流直到轨迹完成或出错
    ///
    /// 取消安全：future 在任意等待点被丢弃时，流保持可用，由调用方执行停止序列。
    pub async fn run(&mut self, stream: &mut MotionStream) -> Result<ExecutionSummary, ExecutionError> {
        self.initialize(stream).await?;
        self.start(stream).await?;
        self.drive(stream).await
    }

    async fn initialize(&mut self, stream: &mut MotionStream) -> Result<(), ExecutionError> {
        let trajectory_id = self.context.trajectory_id.clone();
        info!(
            motion_group = %self.context.motion_group,
            trajectory = %trajectory_id,
            "Initializing movement"
        );
        stream
            .send(GatewayRequest::Initialize(InitializeMovementRequest {
                trajectory_id: trajectory_id.clone(),
                initial_location: 0.0,
            }))
            .await
            .map_err(|e| self.fault(e))?;

        let init_timeout = self.config.init_timeout;
        let response = match timeout(init_timeout, Self::await_init(stream)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(self.fault(e)),
            Err(_) => {
                warn!(trajectory = %trajectory_id, "Initialization timed out after {:?}", init_timeout);
                return Err(ExecutionError::InitializationTimeout {
                    timeout: init_timeout,
                });
            },
        };

        if !response.succeeded {
            let reason = response.reason.unwrap_or_else(|| "no reason given".to_string());
            warn!(trajectory = %trajectory_id, "Initialization rejected: {}", reason);
            return Err(ExecutionError::InitializationRejected {
                trajectory_id,
                reason,
            });
        }
        Ok(())
    }

    async fn await_init(
        stream: &mut MotionStream,
    ) -> Result<InitResponse, DriverError> {
        loop {
            match stream.recv().await {
                Some(Ok(GatewayResponse::Init(response))) => return Ok(response),
                Some(Ok(other)) => debug!("Ignoring {:?} before initialization response", other),
                Some(Err(e)) => return Err(e),
                None => return Err(DriverError::ChannelClosed),
            }
        }
    }

    async fn start(&mut self, stream: &mut MotionStream) -> Result<(), ExecutionError> {
        let request = StartMovementRequest {
            set_io_list: self.context.combined_actions.set_io_list(),
            start_on_io: self.context.start_on_io.clone(),
            pause_on_io: None,
        };
        stream
            .send(GatewayRequest::Start(request))
            .await
            .map_err(|e| self.fault(e))?;
        self.machine.send(ExecutionCommand::Start)?;
        self.publish();

        info!(
            motion_group = %self.context.motion_group,
            trajectory = %self.context.trajectory_id,
            speed = %self.context.effective_speed,
            "Movement started"
        );

        let captured = self.context.effective_speed;
        if captured != self.sent.speed {
            self.send_directive(
                stream,
                GatewayRequest::SpeedOverride(SpeedOverrideRequest { speed: captured }),
            )
            .await?;
            self.sent.speed = captured;
        }
        Ok(())
    }

    async fn drive(&mut self, stream: &mut MotionStream) -> Result<ExecutionSummary, ExecutionError> {
        let mut ticker = interval(self.config.playback_poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.sync_playback(stream).await?;

            tokio::select! {
                inbound = stream.recv() => match inbound {
                    Some(Ok(response)) => {
                        if let Some(completion) = self.handle_response(response) {
                            return Ok(self.summary(completion));
                        }
                    },
                    Some(Err(e)) => return Err(self.fault(e)),
                    None => return Err(self.fault(DriverError::ChannelClosed)),
                },
                _ = ticker.tick() => {},
            }
        }
    }

    /// 把播放控制的最新值与本条流上已发送的值比较，发送差异
    async fn sync_playback(&mut self, stream: &mut MotionStream) -> Result<(), ExecutionError> {
        let control = self
            .playback
            .effective_control(&self.context.motion_group, self.context.method_speed);
        let speed = control.speed;
        let moving = control.state.unwrap_or(PlaybackState::Playing).is_moving();
        let direction = control.direction.unwrap_or_default();

        if speed != self.sent.speed {
            self.send_directive(
                stream,
                GatewayRequest::SpeedOverride(SpeedOverrideRequest { speed }),
            )
            .await?;
            self.sent.speed = speed;
        }

        if moving != self.sent.moving {
            let request = if moving {
                GatewayRequest::Resume
            } else {
                GatewayRequest::Pause
            };
            self.send_directive(stream, request).await?;
            self.sent.moving = moving;
        }

        // 网关可能在处理 Resume 之前回报暂停静止
        if self.sent.moving && self.machine.is_paused() {
            debug!(trajectory = %self.context.trajectory_id, "Resume already sent, restarting machine");
            self.machine.send(ExecutionCommand::Start)?;
            self.publish();
        }

        if direction != self.sent.direction {
            self.send_directive(stream, GatewayRequest::Direction(DirectionRequest { direction }))
                .await?;
            self.sent.direction = direction;
        }
        Ok(())
    }

    async fn send_directive(
        &mut self,
        stream: &mut MotionStream,
        request: GatewayRequest,
    ) -> Result<(), ExecutionError> {
        debug!(
            motion_group = %self.context.motion_group,
            trajectory = %self.context.trajectory_id,
            "Sending runtime directive {:?}",
            request
        );
        stream.send(request).await.map_err(|e| self.fault(e))?;
        self.directives_sent += 1;
        Ok(())
    }

    /// 处理一条入站响应；返回 `Some` 表示执行完成
    fn handle_response(&mut self, response: GatewayResponse) -> Option<Completion> {
        match response {
            GatewayResponse::State(snapshot) => {
                let result = self.machine.process_motion_state(&snapshot);
                if result.skip {
                    return None;
                }
                self.publish();
                (result.current_state == TrajectoryExecutionState::Completed)
                    .then_some(Completion::Ended)
            },
            GatewayResponse::Standstill(event) => match event.reason {
                StandstillReason::MotionEnded => {
                    info!(
                        trajectory = %self.context.trajectory_id,
                        "Gateway reported motion ended via standstill event"
                    );
                    Some(Completion::Standstill)
                },
                reason => {
                    debug!(trajectory = %self.context.trajectory_id, "Standstill event: {:?}", reason);
                    None
                },
            },
            GatewayResponse::Init(response) => {
                warn!("Unexpected initialization response mid-stream: {:?}", response);
                None
            },
        }
    }

    /// 传输故障：状态机进入 Error 并转换为 `RemoteStreamFault`
    fn fault(&mut self, error: DriverError) -> ExecutionError {
        warn!(
            motion_group = %self.context.motion_group,
            trajectory = %self.context.trajectory_id,
            "Remote stream fault: {}",
            error
        );
        if self.machine.send(ExecutionCommand::Fail).is_ok() {
            self.publish();
        }
        ExecutionError::RemoteStreamFault(error)
    }

    fn publish(&self) {
        self.progress.send_replace(ExecutionProgress {
            location: self.machine.location(),
            state: self.machine.state(),
        });
    }

    fn summary(&self, completion: Completion) -> ExecutionSummary {
        info!(
            trajectory = %self.context.trajectory_id,
            state = %self.machine.state(),
            directives = self.directives_sent,
            "Movement finished"
        );
        ExecutionSummary {
            trajectory_id: self.context.trajectory_id.clone(),
            final_state: self.machine.state(),
            final_location: self.machine.location(),
            directives_sent: self.directives_sent,
            completion,
        }
    }
}
