//! 播放控制层错误类型定义

use thiserror::Error;
use trajex_protocol::ProtocolError;

/// 播放控制层错误类型
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// 参数校验失败（在任何状态修改之前返回）
    #[error("Validation error: {0}")]
    Validation(#[from] ProtocolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_error_display() {
        let err: PlaybackError = ProtocolError::SpeedOutOfRange { value: 120 }.into();
        let msg = err.to_string();
        assert!(msg.contains("Validation error"), "message: {}", msg);
        assert!(msg.contains("120"), "message: {}", msg);
    }
}
