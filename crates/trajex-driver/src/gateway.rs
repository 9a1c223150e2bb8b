//! 执行器网关抽象

use crate::{DriverError, MotionStream};
use async_trait::async_trait;
use trajex_protocol::MotionGroupId;

/// 执行器网关
///
/// 每次调用为一次轨迹执行打开一条新的双向运动流。
/// 实现方负责把 [`GatewayEndpoint`](crate::GatewayEndpoint) 一侧接到真实传输或模拟器上。
#[async_trait]
pub trait MotionGateway: Send + Sync {
    async fn open_stream(&self, motion_group: &MotionGroupId) -> Result<MotionStream, DriverError>;
}
