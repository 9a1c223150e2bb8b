//! 驱动层模块
//!
//! 本模块提供与执行器网关通信的传输管道，包括：
//! - 双通道运动流（出站指令 / 入站响应分别独立持有）
//! - `MotionGateway` 抽象：每次轨迹执行打开一条新流
//! - JSON-line 传输：把运动流接到任意异步字节流上
//! - 模拟执行器（`ArcSwap` 无锁读取位置与状态）
//!
//! # 使用场景
//!
//! 协议逻辑（状态机、会话、取消监督）在 `trajex-client` 中，只依赖 [`MotionStream`]。
//! 本 crate 只负责"字节怎么走"。

mod channel;
mod error;
mod gateway;
pub mod sim;
pub mod transport;

pub use channel::{GatewayEndpoint, InboundItem, MotionStream, motion_channel};
pub use error::DriverError;
pub use gateway::MotionGateway;
pub use sim::{ActuatorPhase, ActuatorState, CompletionReport, SimulatedGateway, SimulatorConfig};
pub use transport::JsonLineTransport;
