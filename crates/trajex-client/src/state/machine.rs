//! 轨迹执行状态机
//!
//! 把执行器回报的 [`MotionStateSnapshot`] 映射为一次轨迹执行的生命周期状态。
//!
//! # 状态转换
//!
//! ```text
//!            start                 Ended, 非静止            Ended + 静止
//! Idle ───────────────> Executing ──────────────> Ending ──────────────> Completed
//!   ^                     │  ^  │                                            │
//!   │                     │  │  │ PausedByUser, 非静止                       │ start
//!   │                     │  │  └──────────────> Pausing ──> Paused          │
//!   │                     │  │     Running (恢复先于静止到达) │       │ start │
//!   │                     │  └─────────────────────────────┘       │        │
//!   │                     │  <─────────────────────────────────────┘        │
//!   │                     │  <──────────────────────────────────────────────┘
//!   │                     └── fail（任意非终止状态）──> Error（不再接受指令）
//! ```
//!
//! # 静止规则
//!
//! 不带 `Execute` 负载的快照从不触发转换，即使 `standstill = true`：
//! `Ending` / `Pausing` 只会被"静止 **且** 携带对应阶段 Execute"的快照完成。
//!
//! 状态机由单个会话独占，不需要加锁。

use crate::ExecutionError;
use std::fmt;
use tracing::{debug, info};
use trajex_protocol::{ExecutePhase, MotionStateSnapshot, TrajectoryId};

/// 轨迹执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrajectoryExecutionState {
    Idle,
    Executing,
    /// 已收到 Ended，等待静止
    Ending,
    /// 已收到 PausedByUser，等待静止
    Pausing,
    Paused,
    Completed,
    Error,
}

impl TrajectoryExecutionState {
    /// 只有 Completed / Error 是终止状态
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn is_waiting_for_standstill(self) -> bool {
        matches!(self, Self::Ending | Self::Pausing)
    }
}

impl fmt::Display for TrajectoryExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Executing => "executing",
            Self::Ending => "ending",
            Self::Pausing => "pausing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// 显式指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionCommand {
    /// 启动 / 恢复 / 重新开始
    Start,
    Fail,
}

/// 每次处理快照的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateUpdateResult {
    /// 快照不含可用信息，未评估任何转换
    pub skip: bool,
    pub state_changed: bool,
    pub has_execute: bool,
    /// 本次快照携带的路径位置
    pub location: Option<f64>,
    pub current_state: TrajectoryExecutionState,
}

/// 轨迹执行状态机
#[derive(Debug, Clone)]
pub struct TrajectoryExecutionMachine {
    state: TrajectoryExecutionState,
    location: Option<f64>,
    trajectory_id: Option<TrajectoryId>,
}

impl Default for TrajectoryExecutionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryExecutionMachine {
    pub fn new() -> Self {
        Self {
            state: TrajectoryExecutionState::Idle,
            location: None,
            trajectory_id: None,
        }
    }

    pub fn state(&self) -> TrajectoryExecutionState {
        self.state
    }

    /// 最近一次回报的位置；一旦设置就不会回到 `None`
    pub fn location(&self) -> Option<f64> {
        self.location
    }

    /// 最近一次 Execute 负载中的轨迹 id
    pub fn trajectory_id(&self) -> Option<&TrajectoryId> {
        self.trajectory_id.as_ref()
    }

    /// 发送显式指令，返回指令处理后的状态
    ///
    /// # 错误
    ///
    /// - `Start` 只在 Idle / Paused / Completed 时转换，Executing 时为空操作，其余状态拒绝
    /// - `Fail` 在终止状态拒绝
    pub fn send(
        &mut self,
        command: ExecutionCommand,
    ) -> Result<TrajectoryExecutionState, ExecutionError> {
        use TrajectoryExecutionState::*;

        let next = match (command, self.state) {
            (ExecutionCommand::Start, Idle | Paused | Completed) => Executing,
            (ExecutionCommand::Start, Executing) => return Ok(Executing),
            (ExecutionCommand::Fail, state) if !state.is_terminal() => Error,
            (command, state) => {
                return Err(ExecutionError::InvalidTransition { state, command });
            },
        };
        self.transition(next);
        Ok(next)
    }

    /// 处理一条执行器状态快照
    pub fn process_motion_state(&mut self, snapshot: &MotionStateSnapshot) -> StateUpdateResult {
        use TrajectoryExecutionState::*;

        let Some(execute) = &snapshot.execute else {
            debug!(state = %self.state, standstill = snapshot.standstill, "Snapshot without execute payload ignored");
            return StateUpdateResult {
                skip: true,
                state_changed: false,
                has_execute: false,
                location: None,
                current_state: self.state,
            };
        };

        self.location = Some(execute.location);
        self.trajectory_id = Some(execute.trajectory_id.clone());

        let standstill = snapshot.standstill;
        let next = match (self.state, execute.phase) {
            (Executing, ExecutePhase::Running { .. }) => Executing,
            (Executing, ExecutePhase::Ended) => {
                if standstill { Completed } else { Ending }
            },
            (Executing, ExecutePhase::PausedByUser) => {
                if standstill { Paused } else { Pausing }
            },
            (Ending, ExecutePhase::Ended) if standstill => Completed,
            (Pausing, ExecutePhase::PausedByUser) if standstill => Paused,
            // 恢复指令先于静止到达：执行器已继续运动
            (Pausing, ExecutePhase::Running { .. }) => Executing,
            // 暂停途中轨迹走完
            (Pausing, ExecutePhase::Ended) if standstill => Completed,
            (state, _) => state,
        };

        let state_changed = next != self.state;
        if state_changed {
            self.transition(next);
        }

        StateUpdateResult {
            skip: false,
            state_changed,
            has_execute: true,
            location: Some(execute.location),
            current_state: self.state,
        }
    }

    fn transition(&mut self, next: TrajectoryExecutionState) {
        info!(
            from = %self.state,
            to = %next,
            location = ?self.location,
            "Trajectory execution state changed"
        );
        self.state = next;
    }

    pub fn is_idle(&self) -> bool {
        self.state == TrajectoryExecutionState::Idle
    }

    pub fn is_executing(&self) -> bool {
        self.state == TrajectoryExecutionState::Executing
    }

    pub fn is_ending(&self) -> bool {
        self.state == TrajectoryExecutionState::Ending
    }

    pub fn is_pausing(&self) -> bool {
        self.state == TrajectoryExecutionState::Pausing
    }

    pub fn is_paused(&self) -> bool {
        self.state == TrajectoryExecutionState::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.state == TrajectoryExecutionState::Completed
    }

    pub fn is_error(&self) -> bool {
        self.state == TrajectoryExecutionState::Error
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_waiting_for_standstill(&self) -> bool {
        self.state.is_waiting_for_standstill()
    }
}
