//! 执行状态机

mod machine;

pub use machine::{
    ExecutionCommand, StateUpdateResult, TrajectoryExecutionMachine, TrajectoryExecutionState,
};
