//! JSON-line 传输
//!
//! 把 [`GatewayEndpoint`] 接到任意 tokio 字节流上（TCP、Unix socket、串口、管道）。
//! 读写各由一个后台任务负责：
//!
//! - **写任务**: 出站指令逐条编码为一行 JSON；客户端关闭出站方向后 shutdown 写端
//! - **读任务**: 逐行解码入站响应；解码失败作为入站错误转发，读到 EOF 时关闭入站方向

use crate::{DriverError, GatewayEndpoint, InboundItem};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use trajex_protocol::{GatewayRequest, decode_response, encode_request};

/// 运行中的 JSON-line 传输
#[derive(Debug)]
pub struct JsonLineTransport {
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl JsonLineTransport {
    /// 启动读写任务（需要在 tokio runtime 中调用）
    pub fn spawn<R, W>(reader: R, writer: W, endpoint: GatewayEndpoint) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (requests, responses) = endpoint.into_parts();
        // 写任务只持有弱引用：读任务退出时入站方向必须能真正关闭
        let error_tx = responses.downgrade();
        let writer_task = tokio::spawn(write_loop(writer, requests, error_tx));
        let reader_task = tokio::spawn(read_loop(reader, responses));
        Self {
            reader_task,
            writer_task,
        }
    }

    /// 两个任务是否都已退出
    pub fn is_finished(&self) -> bool {
        self.reader_task.is_finished() && self.writer_task.is_finished()
    }

    /// 立即终止读写任务
    pub fn abort(&self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }

    /// 等待读写任务自然结束
    pub async fn join(self) {
        let _ = self.writer_task.await;
        let _ = self.reader_task.await;
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut requests: mpsc::Receiver<GatewayRequest>,
    errors: mpsc::WeakSender<InboundItem>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(request) = requests.recv().await {
        if let Err(e) = write_line(&mut writer, &request).await {
            warn!("Failed to write gateway request: {}", e);
            if let Some(tx) = errors.upgrade() {
                let _ = tx.send(Err(e)).await;
            }
            return;
        }
    }

    debug!("Outbound direction closed, shutting down writer");
    if let Err(e) = writer.shutdown().await {
        debug!("Writer shutdown failed: {}", e);
    }
}

async fn write_line<W>(writer: &mut W, request: &GatewayRequest) -> Result<(), DriverError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = encode_request(request)?;
    trace!("-> {}", line);
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_loop<R>(reader: R, responses: mpsc::Sender<InboundItem>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let item = match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                trace!("<- {}", line);
                decode_response(&line).map_err(DriverError::from)
            },
            Ok(None) => {
                debug!("Gateway closed the byte stream");
                return;
            },
            Err(e) => {
                warn!("Failed to read from gateway: {}", e);
                let _ = responses.send(Err(e.into())).await;
                return;
            },
        };

        if let Err(e) = &item {
            warn!("Forwarding undecodable gateway line as error: {}", e);
        }
        if responses.send(item).await.is_err() {
            debug!("Client dropped the inbound direction, stopping reader");
            return;
        }
    }
}
