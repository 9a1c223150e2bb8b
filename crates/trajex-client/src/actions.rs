//! 动作列表
//!
//! 调用方（脚本、程序）给出的有序动作列表。规划器只关心其中的运动，
//! IO 写入则锚定到路径位置，随 Start 指令一起下发给网关。

use trajex_protocol::{IoWrite, SetIo};

/// 运动类型
///
/// 决定规划器如何在两点之间插值；对本 crate 不透明。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionType {
    /// 关节空间运动
    #[default]
    Joint,
    /// 笛卡尔空间点位运动
    Cartesian,
    /// 直线运动
    Linear,
    /// 圆弧运动
    Circular,
}

/// 单个运动
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub motion_type: MotionType,
    /// 目标（关节角或位姿），由规划器解释
    pub target: Vec<f64>,
}

impl Motion {
    pub fn new(motion_type: MotionType, target: impl Into<Vec<f64>>) -> Self {
        Self {
            motion_type,
            target: target.into(),
        }
    }

    pub fn joint(target: impl Into<Vec<f64>>) -> Self {
        Self::new(MotionType::Joint, target)
    }

    pub fn linear(target: impl Into<Vec<f64>>) -> Self {
        Self::new(MotionType::Linear, target)
    }
}

/// 动作
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Motion(Motion),
    WriteIo(IoWrite),
}

/// 锚定在第 `after_motions` 个运动结束处的 IO 写入
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredIo {
    pub after_motions: usize,
    pub io: IoWrite,
}

/// 拆分后的动作列表：运动序列 + 锚定的 IO 写入
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedActions {
    motions: Vec<Motion>,
    io_writes: Vec<AnchoredIo>,
}

impl CombinedActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_actions(actions: impl IntoIterator<Item = Action>) -> Self {
        let mut combined = Self::new();
        for action in actions {
            combined.push(action);
        }
        combined
    }

    pub fn push(&mut self, action: Action) {
        match action {
            Action::Motion(motion) => self.motions.push(motion),
            Action::WriteIo(io) => self.io_writes.push(AnchoredIo {
                after_motions: self.motions.len(),
                io,
            }),
        }
    }

    pub fn motions(&self) -> &[Motion] {
        &self.motions
    }

    pub fn io_writes(&self) -> &[AnchoredIo] {
        &self.io_writes
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty() && self.io_writes.is_empty()
    }

    /// Start 指令携带的 IO 列表
    ///
    /// 路径位置 `k` 表示第 `k` 个运动的终点，因此 IO 写入的位置就是它前面的运动数。
    pub fn set_io_list(&self) -> Vec<SetIo> {
        self.io_writes
            .iter()
            .map(|anchored| SetIo {
                io: anchored.io.clone(),
                location: anchored.after_motions as f64,
            })
            .collect()
    }
}

impl FromIterator<Action> for CombinedActions {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self::from_actions(iter)
    }
}
