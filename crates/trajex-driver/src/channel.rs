//! 双通道运动流
//!
//! 一次轨迹执行对应一对独立的通道：
//!
//! ```text
//! MotionStream (客户端)                 GatewayEndpoint (网关 / 传输层)
//!   send(GatewayRequest)  ── outbound ──>  recv()
//!   recv()                <── inbound ───  send(GatewayResponse) / send_error()
//! ```
//!
//! 协议逻辑只看到 [`MotionStream`]，字节怎么走由持有 [`GatewayEndpoint`] 的一方决定。
//! 关闭 outbound（[`MotionStream::close`] 或 drop）是网关约定的"减速并保持"信号。

use crate::DriverError;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use trajex_protocol::{GatewayRequest, GatewayResponse};

/// 入站条目：网关响应，或传输层故障
pub type InboundItem = Result<GatewayResponse, DriverError>;

/// 创建一对运动流通道，两个方向共用同一容量
pub fn motion_channel(capacity: usize) -> (MotionStream, GatewayEndpoint) {
    let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
    let (response_tx, response_rx) = mpsc::channel(capacity.max(1));
    (
        MotionStream {
            outbound: Some(request_tx),
            inbound: response_rx,
        },
        GatewayEndpoint {
            requests: request_rx,
            responses: response_tx,
        },
    )
}

/// 客户端持有的一侧
#[derive(Debug)]
pub struct MotionStream {
    outbound: Option<mpsc::Sender<GatewayRequest>>,
    inbound: mpsc::Receiver<InboundItem>,
}

impl MotionStream {
    /// 发送出站指令
    ///
    /// # 错误
    ///
    /// 本端已关闭或网关已退出时返回 `DriverError::ChannelClosed`。
    pub async fn send(&self, request: GatewayRequest) -> Result<(), DriverError> {
        let outbound = self.outbound.as_ref().ok_or(DriverError::ChannelClosed)?;
        outbound
            .send(request)
            .await
            .map_err(|_| DriverError::ChannelClosed)
    }

    /// 非阻塞发送
    pub fn try_send(&self, request: GatewayRequest) -> Result<(), DriverError> {
        let outbound = self.outbound.as_ref().ok_or(DriverError::ChannelClosed)?;
        outbound.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => DriverError::ChannelFull,
            TrySendError::Closed(_) => DriverError::ChannelClosed,
        })
    }

    /// 接收下一条入站消息；`None` 表示网关已关闭入站方向
    ///
    /// 取消安全：在 `select!` 中被丢弃不会丢消息。
    pub async fn recv(&mut self) -> Option<InboundItem> {
        self.inbound.recv().await
    }

    /// 非阻塞接收：没有已到达的消息（或入站已关闭）时返回 `None`
    pub fn try_recv(&mut self) -> Option<InboundItem> {
        self.inbound.try_recv().ok()
    }

    /// 出站发送端的克隆，供需要在流之外发送 Stop 的一方持有
    ///
    /// 注意：克隆存活期间，[`close`](Self::close) 不会真正关闭出站方向。
    pub fn outbound_handle(&self) -> Option<mpsc::Sender<GatewayRequest>> {
        self.outbound.clone()
    }

    /// 关闭两个方向（幂等）
    pub fn close(&mut self) {
        self.outbound = None;
        self.inbound.close();
    }

    /// 出站方向是否已不可用
    pub fn is_closed(&self) -> bool {
        self.outbound.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

/// 网关 / 传输层持有的一侧
#[derive(Debug)]
pub struct GatewayEndpoint {
    requests: mpsc::Receiver<GatewayRequest>,
    responses: mpsc::Sender<InboundItem>,
}

impl GatewayEndpoint {
    /// 接收下一条出站指令；`None` 表示客户端已关闭出站方向
    pub async fn recv(&mut self) -> Option<GatewayRequest> {
        self.requests.recv().await
    }

    pub async fn send(&self, response: GatewayResponse) -> Result<(), DriverError> {
        self.responses
            .send(Ok(response))
            .await
            .map_err(|_| DriverError::ChannelClosed)
    }

    /// 向客户端转发传输层故障
    pub async fn send_error(&self, error: DriverError) -> Result<(), DriverError> {
        self.responses
            .send(Err(error))
            .await
            .map_err(|_| DriverError::ChannelClosed)
    }

    /// 客户端是否已丢弃入站接收端
    pub fn is_client_gone(&self) -> bool {
        self.responses.is_closed()
    }

    /// 拆分为两个方向，供读写分离的传输任务使用
    pub fn into_parts(self) -> (mpsc::Receiver<GatewayRequest>, mpsc::Sender<InboundItem>) {
        (self.requests, self.responses)
    }
}
