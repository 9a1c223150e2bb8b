//! # Trajex Protocol
//!
//! 轨迹执行网关（actuator gateway）的消息定义（无传输依赖）
//!
//! ## 模块
//!
//! - `ids`: 运动组 / 轨迹标识
//! - `control`: 出站指令（Initialize / Start / 运行时覆盖 / Stop）
//! - `feedback`: 入站响应（InitResponse / MotionStateSnapshot / StandstillEvent）
//! - `io`: IO 写入与 IO 触发条件
//! - `codec`: JSON-line 编解码
//!
//! ## 分层
//!
//! ```text
//! Client Layer (trajex-client)   状态机 / 会话 / 取消监督
//!     ↓ GatewayRequest / GatewayResponse
//! Protocol Layer (此 crate)
//!     ↓ codec（JSON-line）或进程内通道
//! Driver Layer (trajex-driver)   传输管道 / 模拟执行器
//! ```

pub mod codec;
pub mod control;
pub mod feedback;
pub mod ids;
pub mod io;

// 重新导出常用类型
pub use codec::*;
pub use control::*;
pub use feedback::*;
pub use ids::*;
pub use io::*;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 速度百分比超出 [0, 100]
    #[error("Playback speed {value} is out of range [0, 100]")]
    SpeedOutOfRange { value: i64 },

    /// 运动组标识格式错误
    #[error("Invalid motion group id: {0:?}")]
    InvalidMotionGroupId(String),

    /// 消息解码失败（包括未知的 phase 标签）
    #[error("Failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    /// 消息编码失败
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::SpeedOutOfRange { value: 101 };
        assert_eq!(
            err.to_string(),
            "Playback speed 101 is out of range [0, 100]"
        );

        let err = ProtocolError::InvalidMotionGroupId("ur5".to_string());
        assert!(err.to_string().contains("\"ur5\""));
    }
}
