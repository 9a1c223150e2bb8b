//! JSON-line 编解码
//!
//! 每条消息编码为单行 JSON，不含换行符，由传输层负责分帧。

use crate::{GatewayRequest, GatewayResponse, ProtocolError};

/// 编码出站消息
pub fn encode_request(request: &GatewayRequest) -> Result<String, ProtocolError> {
    serde_json::to_string(request).map_err(ProtocolError::Encode)
}

/// 解码出站消息（网关侧使用）
pub fn decode_request(line: &str) -> Result<GatewayRequest, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::Decode)
}

/// 编码入站消息（网关侧使用）
pub fn encode_response(response: &GatewayResponse) -> Result<String, ProtocolError> {
    serde_json::to_string(response).map_err(ProtocolError::Encode)
}

/// 解码入站消息
///
/// 未知的 `phase.kind` 标签会在这里失败，而不是进入状态机。
pub fn decode_response(line: &str) -> Result<GatewayResponse, ProtocolError> {
    serde_json::from_str(line.trim()).map_err(ProtocolError::Decode)
}
