//! 模拟执行命令
//!
//! 在模拟执行器上执行一条轨迹。Ctrl-C 触发协作式取消：
//! 监督者发送 Stop、等待静止确认，随后打印执行器保持的位置。

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use trajex_sdk::prelude::*;

/// 模拟执行参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 路径长度（单位）
    #[arg(long)]
    pub length: f64,

    /// 100% 速度下的名义速率（单位/秒）
    #[arg(long)]
    pub rate: f64,

    /// 方法参数层速度百分比 [0, 100]
    #[arg(long)]
    pub speed: Option<i64>,

    /// 执行配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 运动组标识
    #[arg(long, default_value = "0@sim")]
    pub motion_group: String,
}

impl SimulateCommand {
    pub async fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => ExecutionConfig::load_from_file(path)?,
            None => ExecutionConfig::default(),
        };
        let method_speed = self
            .speed
            .map(PlaybackSpeedPercent::new)
            .transpose()
            .context("Invalid --speed")?;
        let motion_group = MotionGroupId::new(self.motion_group.as_str());

        let gateway = SimulatedGateway::new(
            SimulatorConfig::new(self.length, self.rate)
                .with_channel_capacity(config.session.channel_capacity),
        );
        let executor = TrajectoryExecutor::new(
            gateway.clone(),
            SequentialPlanner::new(),
            Arc::new(PlaybackControlManager::new()),
            SessionConfig::from(&config),
        );

        let token = CancellationToken::new();
        {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Ctrl-C received, cancelling trajectory");
                    token.cancel();
                }
            });
        }

        let actions = CombinedActions::from_actions([
            Action::Motion(Motion::joint([0.0])),
            Action::Motion(Motion::joint([self.length])),
        ]);
        let options = ExecuteOptions {
            method_speed,
            default_speed: config.playback.default_speed,
            ..ExecuteOptions::default()
        };

        println!(
            "▶️  {} 单位 @ {} 单位/秒（Ctrl-C 取消）",
            self.length, self.rate
        );
        let result = executor
            .execute_with_consumer(&motion_group, &actions, options, &token, report_progress)
            .await;

        match result {
            Ok(summary) => {
                println!(
                    "✅ 轨迹 {} 完成: 状态 {}，位置 {:.1}",
                    summary.trajectory_id,
                    summary.final_state,
                    gateway.position()
                );
                Ok(())
            },
            Err(ExecutionError::Cancelled) => {
                println!("🛑 已取消，执行器保持在位置 {:.1}", gateway.position());
                Ok(())
            },
            Err(e) => Err(e).context("Trajectory execution failed"),
        }
    }
}

/// 每前进 10% 打印一次进度
async fn report_progress(
    mut progress: tokio::sync::watch::Receiver<ExecutionProgress>,
) -> Result<(), trajex_sdk::BoxError> {
    let mut next_decile = 1;
    while progress.changed().await.is_ok() {
        let current = *progress.borrow_and_update();
        let Some(location) = current.location else {
            continue;
        };
        while next_decile <= 10 && location * 10.0 >= f64::from(next_decile) {
            info!(state = %current.state, "{}%", next_decile * 10);
            next_decile += 1;
        }
    }
    Ok(())
}
