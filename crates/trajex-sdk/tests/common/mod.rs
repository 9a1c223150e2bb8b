//! 集成测试公共工具

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use trajex_sdk::driver::{GatewayEndpoint, motion_channel};
use trajex_sdk::prelude::*;

pub fn arm() -> MotionGroupId {
    MotionGroupId::new("0@sim")
}

pub fn two_motions() -> CombinedActions {
    CombinedActions::from_actions([
        Action::Motion(Motion::joint([0.0, 0.0, 0.0])),
        Action::Motion(Motion::linear([0.4, 0.2, 0.1])),
    ])
}

pub fn sim_executor(
    config: SimulatorConfig,
) -> (TrajectoryExecutor<SimulatedGateway, SequentialPlanner>, SimulatedGateway) {
    let gateway = SimulatedGateway::new(config);
    let executor = TrajectoryExecutor::new(
        gateway.clone(),
        SequentialPlanner::new(),
        Arc::new(PlaybackControlManager::new()),
        SessionConfig::default(),
    );
    (executor, gateway)
}

/// 把每条新流的网关一侧交给测试代码手动驱动
pub struct ScriptedGateway {
    endpoints: mpsc::UnboundedSender<GatewayEndpoint>,
}

impl ScriptedGateway {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GatewayEndpoint>) {
        let (endpoints, rx) = mpsc::unbounded_channel();
        (Self { endpoints }, rx)
    }
}

#[async_trait]
impl MotionGateway for ScriptedGateway {
    async fn open_stream(&self, _motion_group: &MotionGroupId) -> Result<MotionStream, DriverError> {
        let (stream, endpoint) = motion_channel(16);
        self.endpoints
            .send(endpoint)
            .map_err(|_| DriverError::ChannelClosed)?;
        Ok(stream)
    }
}

pub fn scripted_executor() -> (
    TrajectoryExecutor<ScriptedGateway, SequentialPlanner>,
    mpsc::UnboundedReceiver<GatewayEndpoint>,
) {
    let (gateway, endpoints) = ScriptedGateway::new();
    let executor = TrajectoryExecutor::new(
        gateway,
        SequentialPlanner::new(),
        Arc::new(PlaybackControlManager::new()),
        SessionConfig::default(),
    );
    (executor, endpoints)
}
