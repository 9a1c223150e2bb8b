//! 取消监督
//!
//! 包裹 [`MovementSession::run`]，保证每条退出路径上恰好执行一次停止序列：
//!
//! ```text
//! 正常完成 / 传输故障 / 消费者失败 / CancellationToken 取消
//!     → 发送 Stop → 宽限期内等待静止确认 → 关闭流 → 原样返回退出原因
//! 所属任务被 abort（future 被直接丢弃）
//!     → StopGuard::drop 发送 Stop，随后流被释放（出站关闭 = 减速并保持）
//! ```
//!
//! 停止序列在独立任务中运行并等待其 `JoinHandle`：即使调用方在等待期间再次被取消，
//! 停止序列也会继续执行到结束。

use crate::config::SessionConfig;
use crate::control::session::{ExecutionSummary, MovementSession};
use crate::{BoxError, ExecutionError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use trajex_driver::MotionStream;
use trajex_protocol::GatewayRequest;

/// 停止序列的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReport {
    /// 宽限期内收到静止确认
    Acknowledged,
    /// 网关在确认前关闭了入站方向
    StreamClosed,
    /// 宽限期耗尽，强制关闭
    TimedOut,
    /// Stop 无法发送（网关已退出）
    GatewayGone,
    /// 初始化被拒绝，未启动任何运动，只关闭流
    Skipped,
}

/// 在所属 future 被丢弃时发送 Stop 的守卫
///
/// 正常路径上由监督者解除；只有 future 在运行中被直接丢弃（例如任务被 abort）时才会触发。
pub struct StopGuard {
    outbound: Option<mpsc::Sender<GatewayRequest>>,
    grace_period: Duration,
}

impl StopGuard {
    pub fn arm(stream: &MotionStream, grace_period: Duration) -> Self {
        Self {
            outbound: stream.outbound_handle(),
            grace_period,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.outbound.is_some()
    }

    /// 解除守卫（释放出站发送端的克隆）
    pub fn disarm(&mut self) {
        self.outbound = None;
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        let Some(outbound) = self.outbound.take() else {
            return;
        };
        warn!("Supervised execution dropped mid-run, sending Stop from guard");
        match outbound.try_send(GatewayRequest::Stop) {
            Ok(()) => {},
            Err(TrySendError::Closed(_)) => debug!("Gateway already gone, nothing to stop"),
            Err(TrySendError::Full(request)) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let grace_period = self.grace_period;
                    handle.spawn(async move {
                        if timeout(grace_period, outbound.send(request)).await.is_err() {
                            warn!("Stop from guard not accepted within {:?}", grace_period);
                        }
                    });
                },
                Err(_) => error!("No runtime available to deliver Stop, relying on channel closure"),
            },
        }
    }
}

/// 取消监督者
#[derive(Debug, Clone, Copy)]
pub struct CancellationSupervisor {
    grace_period: Duration,
}

impl CancellationSupervisor {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// 运行会话直到完成、出错或 `token` 被取消
    pub async fn supervise(
        &self,
        session: MovementSession,
        stream: MotionStream,
        token: &CancellationToken,
    ) -> Result<ExecutionSummary, ExecutionError> {
        self.supervise_with_consumer(
            session,
            stream,
            token,
            std::future::pending::<Result<(), BoxError>>(),
        )
        .await
    }

    /// 与调用方的状态消费者并行运行会话
    ///
    /// 消费者返回 `Err` 时立即停止执行器并以 `ConsumerFault` 原样返回；
    /// 消费者正常结束不影响会话继续运行。
    pub async fn supervise_with_consumer<F>(
        &self,
        mut session: MovementSession,
        mut stream: MotionStream,
        token: &CancellationToken,
        consumer: F,
    ) -> Result<ExecutionSummary, ExecutionError>
    where
        F: Future<Output = Result<(), BoxError>> + Send,
    {
        let mut guard = StopGuard::arm(&stream, self.grace_period);
        let trajectory_id = session.context().trajectory_id.clone();

        let outcome = {
            let run = session.run(&mut stream);
            tokio::pin!(run);
            tokio::pin!(consumer);
            let mut consumer_done = false;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break Err(ExecutionError::Cancelled),
                    result = &mut run => break result,
                    result = &mut consumer, if !consumer_done => match result {
                        Ok(()) => consumer_done = true,
                        Err(e) => break Err(ExecutionError::ConsumerFault(e)),
                    },
                }
            }
        };

        let send_stop = !matches!(outcome, Err(ExecutionError::InitializationRejected { .. }));
        guard.disarm();

        // 在独立任务中执行，调用方再次被取消也不会中断
        let sequence = tokio::spawn(stop_sequence(stream, self.grace_period, send_stop));
        match sequence.await {
            Ok(report) => match report {
                StopReport::Acknowledged | StopReport::Skipped => {
                    info!(trajectory = %trajectory_id, ?report, "Stop sequence finished");
                },
                _ => warn!(trajectory = %trajectory_id, ?report, "Stop sequence finished without acknowledgment"),
            },
            Err(e) => error!(trajectory = %trajectory_id, "Stop sequence task failed: {}", e),
        }

        outcome
    }
}

impl From<&SessionConfig> for CancellationSupervisor {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.stop_grace_period)
    }
}

/// 发送 Stop，在宽限期内等待静止确认，然后关闭流
///
/// 发送 Stop 之前已缓冲的入站消息会被丢弃，不能作为确认。
pub async fn stop_sequence(
    mut stream: MotionStream,
    grace_period: Duration,
    send_stop: bool,
) -> StopReport {
    if !send_stop {
        stream.close();
        return StopReport::Skipped;
    }

    let mut stale = 0usize;
    while stream.try_recv().is_some() {
        stale += 1;
    }
    if stale > 0 {
        debug!(stale, "Discarded inbound messages queued before Stop");
    }

    let acknowledged = timeout(grace_period, async {
        if stream.send(GatewayRequest::Stop).await.is_err() {
            return StopReport::GatewayGone;
        }
        while let Some(item) = stream.recv().await {
            match item {
                Ok(response) if response.acknowledges_stop() => return StopReport::Acknowledged,
                Ok(_) => continue,
                Err(e) => debug!("Ignoring inbound error while stopping: {}", e),
            }
        }
        StopReport::StreamClosed
    })
    .await;

    stream.close();
    acknowledged.unwrap_or(StopReport::TimedOut)
}
