//! 驱动层错误类型定义

use thiserror::Error;
use trajex_protocol::ProtocolError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 协议编解码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 底层字节流 IO 错误
    #[error("Transport IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 通道已关闭（对端已退出）
    #[error("Motion channel closed")]
    ChannelClosed,

    /// 通道已满
    #[error("Motion channel full")]
    ChannelFull,
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use trajex_protocol::ProtocolError;

    #[test]
    fn test_driver_error_display() {
        assert_eq!(DriverError::ChannelClosed.to_string(), "Motion channel closed");
        assert_eq!(DriverError::ChannelFull.to_string(), "Motion channel full");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let msg = DriverError::from(io).to_string();
        assert!(msg.contains("Transport IO") && msg.contains("pipe gone"), "{}", msg);
    }

    #[test]
    fn test_from_protocol_error() {
        let driver_error: DriverError = ProtocolError::InvalidMotionGroupId("x".into()).into();
        match driver_error {
            DriverError::Protocol(ProtocolError::InvalidMotionGroupId(id)) => assert_eq!(id, "x"),
            other => panic!("Expected Protocol variant, got {:?}", other),
        }
    }
}
