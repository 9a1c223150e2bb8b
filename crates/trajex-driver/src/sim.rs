//! 模拟执行器
//!
//! 一维执行器：沿长度为 `length` 的路径以名义速率 `rate`（单位/秒，100% 速度时）移动。
//! 行为与真实网关约定一致：
//!
//! - 速度覆盖按百分比缩放每个 tick 的位移
//! - Pause 先回报 `PausedByUser`（非静止），下一个 tick 回报静止
//! - Stop 立即保持位置，并以 `StandstillEvent{Stopped}` 确认
//! - 客户端关闭出站方向时减速并保持（默认安全行为）
//!
//! 状态通过 `ArcSwap` 发布，测试与 CLI 可以无锁读取当前位置。

use crate::{DriverError, GatewayEndpoint, MotionGateway, MotionStream, motion_channel};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use trajex_protocol::{
    ExecutePhase, GatewayRequest, GatewayResponse, InitResponse, MotionGroupId, MotionStateSnapshot,
    PlaybackDirection, PlaybackSpeedPercent, StandstillEvent, StandstillReason, TrajectoryId,
};

/// 轨迹结束时的上报方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionReport {
    /// 携带 `Ended` 的静止快照
    #[default]
    Snapshot,
    /// 独立的 `StandstillEvent{MotionEnded}`
    StandstillEvent,
}

/// 模拟器配置
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// 路径长度（单位）
    pub length: f64,
    /// 100% 速度下的名义速率（单位/秒）
    pub rate: f64,
    /// 仿真步长
    pub tick: Duration,
    pub channel_capacity: usize,
    /// 设置后拒绝所有 Initialize 请求
    pub reject_init: Option<String>,
    pub completion: CompletionReport,
}

impl SimulatorConfig {
    pub fn new(length: f64, rate: f64) -> Self {
        Self {
            length: length.max(0.0),
            rate: rate.max(0.0),
            tick: Duration::from_millis(10),
            channel_capacity: 64,
            reject_init: None,
            completion: CompletionReport::default(),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn rejecting_init(mut self, reason: impl Into<String>) -> Self {
        self.reject_init = Some(reason.into());
        self
    }

    pub fn with_completion(mut self, completion: CompletionReport) -> Self {
        self.completion = completion;
        self
    }
}

/// 执行器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorPhase {
    Idle,
    Initialized,
    Running,
    Finished,
    /// Stop 或出站关闭后的保持
    Held,
}

/// 执行器状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorState {
    pub position: f64,
    pub moving: bool,
    pub paused: bool,
    pub speed: PlaybackSpeedPercent,
    pub direction: PlaybackDirection,
    pub phase: ActuatorPhase,
    pub trajectory_id: Option<TrajectoryId>,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self {
            position: 0.0,
            moving: false,
            paused: false,
            speed: PlaybackSpeedPercent::FULL,
            direction: PlaybackDirection::Forward,
            phase: ActuatorPhase::Idle,
            trajectory_id: None,
        }
    }
}

struct Shared {
    config: SimulatorConfig,
    state: ArcSwap<ActuatorState>,
    requests: Mutex<Vec<GatewayRequest>>,
}

/// 模拟执行器网关
///
/// `Clone` 共享同一个执行器；每次 [`connect`](Self::connect) 启动一个服务任务。
#[derive(Clone)]
pub struct SimulatedGateway {
    shared: Arc<Shared>,
}

impl SimulatedGateway {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: ArcSwap::from_pointee(ActuatorState::default()),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.shared.config
    }

    /// 当前状态（无锁读取）
    pub fn state(&self) -> ActuatorState {
        ActuatorState::clone(&self.shared.state.load())
    }

    pub fn position(&self) -> f64 {
        self.shared.state.load().position
    }

    /// 路径参数：位置占路径长度的比例
    pub fn location(&self) -> f64 {
        location_of(self.shared.state.load().position, self.shared.config.length)
    }

    pub fn is_moving(&self) -> bool {
        self.shared.state.load().moving
    }

    /// 迄今收到的所有出站指令（按到达顺序）
    pub fn received_requests(&self) -> Vec<GatewayRequest> {
        self.shared.requests.lock().clone()
    }

    /// 打开一条运动流并启动服务任务（需要在 tokio runtime 中调用）
    pub fn connect(&self, motion_group: &MotionGroupId) -> MotionStream {
        let (stream, endpoint) = motion_channel(self.shared.config.channel_capacity);
        debug!(motion_group = %motion_group, "Simulated gateway stream opened");
        tokio::spawn(serve(self.shared.clone(), endpoint, motion_group.clone()));
        stream
    }
}

#[async_trait]
impl MotionGateway for SimulatedGateway {
    async fn open_stream(&self, motion_group: &MotionGroupId) -> Result<MotionStream, DriverError> {
        Ok(self.connect(motion_group))
    }
}

fn location_of(position: f64, length: f64) -> f64 {
    if length > 0.0 { position / length } else { 0.0 }
}

/// 单个服务任务内的可变执行器
struct Actuator<'a> {
    shared: &'a Shared,
    state: ActuatorState,
    pause_standstill_pending: bool,
}

impl<'a> Actuator<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            state: ActuatorState::clone(&shared.state.load()),
            pause_standstill_pending: false,
        }
    }

    fn publish(&self) {
        self.shared.state.store(Arc::new(self.state.clone()));
    }

    fn location(&self) -> f64 {
        location_of(self.state.position, self.shared.config.length)
    }

    /// 是否需要 tick 推进
    fn is_active(&self) -> bool {
        self.state.phase == ActuatorPhase::Running
            && (!self.state.paused || self.pause_standstill_pending)
    }

    fn snapshot(&self, standstill: bool, phase: ExecutePhase) -> GatewayResponse {
        let trajectory_id = self
            .state
            .trajectory_id
            .clone()
            .unwrap_or_else(|| TrajectoryId::new(""));
        GatewayResponse::State(MotionStateSnapshot::with_execute(
            standstill,
            trajectory_id,
            self.location(),
            phase,
        ))
    }

    fn hold(&mut self) {
        self.state.phase = ActuatorPhase::Held;
        self.state.moving = false;
        self.pause_standstill_pending = false;
        self.publish();
    }

    fn handle(&mut self, request: GatewayRequest) -> Vec<GatewayResponse> {
        let shared = self.shared;
        let config = &shared.config;
        let replies = match request {
            GatewayRequest::Initialize(init) => {
                if let Some(reason) = &config.reject_init {
                    warn!(trajectory = %init.trajectory_id, "Simulator rejecting initialization: {}", reason);
                    return vec![GatewayResponse::Init(InitResponse::rejected(reason.clone()))];
                }
                self.state.trajectory_id = Some(init.trajectory_id);
                self.state.position = (init.initial_location * config.length).clamp(0.0, config.length);
                self.state.phase = ActuatorPhase::Initialized;
                self.state.paused = false;
                self.state.moving = false;
                vec![GatewayResponse::Init(InitResponse::accepted())]
            },
            GatewayRequest::Start(start) => {
                if self.state.phase == ActuatorPhase::Initialized {
                    debug!(
                        io_writes = start.set_io_list.len(),
                        gated = start.start_on_io.is_some(),
                        "Simulator starting movement"
                    );
                    self.state.phase = ActuatorPhase::Running;
                } else {
                    warn!(phase = ?self.state.phase, "Simulator ignoring Start outside Initialized");
                }
                Vec::new()
            },
            GatewayRequest::SpeedOverride(r) => {
                self.state.speed = r.speed;
                Vec::new()
            },
            GatewayRequest::Direction(r) => {
                self.state.direction = r.direction;
                Vec::new()
            },
            GatewayRequest::Pause => {
                if self.state.paused {
                    return Vec::new();
                }
                self.state.paused = true;
                self.state.moving = false;
                if self.state.phase == ActuatorPhase::Running {
                    self.pause_standstill_pending = true;
                    vec![self.snapshot(false, ExecutePhase::PausedByUser)]
                } else {
                    Vec::new()
                }
            },
            GatewayRequest::Resume => {
                self.state.paused = false;
                self.pause_standstill_pending = false;
                Vec::new()
            },
            GatewayRequest::Stop => {
                info!(position = self.state.position, "Simulator stopping and holding position");
                self.hold();
                vec![GatewayResponse::Standstill(StandstillEvent {
                    reason: StandstillReason::Stopped,
                    location: Some(self.location()),
                })]
            },
        };
        self.publish();
        replies
    }

    fn advance(&mut self) -> Vec<GatewayResponse> {
        if self.state.paused {
            self.pause_standstill_pending = false;
            return vec![self.snapshot(true, ExecutePhase::PausedByUser)];
        }

        let shared = self.shared;
        let config = &shared.config;
        let effective_rate = config.rate * self.state.speed.as_fraction();
        let delta = effective_rate * config.tick.as_secs_f64();
        let previous = self.state.position;
        let next = match self.state.direction {
            PlaybackDirection::Forward => (previous + delta).min(config.length),
            PlaybackDirection::Backward => (previous - delta).max(0.0),
        };
        self.state.position = next;
        self.state.moving = next != previous;

        let replies = if self.state.direction == PlaybackDirection::Forward && next >= config.length {
            self.state.phase = ActuatorPhase::Finished;
            self.state.moving = false;
            info!(position = next, "Simulated trajectory reached its end");
            let done = match config.completion {
                CompletionReport::Snapshot => self.snapshot(true, ExecutePhase::Ended),
                CompletionReport::StandstillEvent => GatewayResponse::Standstill(StandstillEvent {
                    reason: StandstillReason::MotionEnded,
                    location: Some(self.location()),
                }),
            };
            vec![self.snapshot(false, ExecutePhase::Ended), done]
        } else {
            let remaining = config.length - next;
            let time_to_end_ms = if effective_rate > 0.0 {
                (remaining / effective_rate * 1000.0).round() as u64
            } else {
                u64::MAX
            };
            vec![self.snapshot(!self.state.moving, ExecutePhase::Running { time_to_end_ms })]
        };
        self.publish();
        replies
    }
}

async fn serve(shared: Arc<Shared>, mut endpoint: GatewayEndpoint, motion_group: MotionGroupId) {
    let mut actuator = Actuator::new(&shared);
    let mut ticker = interval(shared.config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let replies = tokio::select! {
            request = endpoint.recv() => {
                let Some(request) = request else {
                    info!(motion_group = %motion_group, "Outbound closed, decelerating and holding");
                    actuator.hold();
                    return;
                };
                shared.requests.lock().push(request.clone());
                actuator.handle(request)
            },
            _ = ticker.tick(), if actuator.is_active() => actuator.advance(),
        };

        for reply in replies {
            if endpoint.send(reply).await.is_err() {
                info!(motion_group = %motion_group, "Client went away, holding position");
                actuator.hold();
                return;
            }
        }
    }
}
