//! 标识类型
//!
//! 运动组与轨迹的字符串标识。两者在协议层都是不透明字符串，
//! 只在需要时按约定解析。

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 运动组标识
///
/// 约定格式为 `"<index>@<controllerName>"`（如 `"0@ur5e"`），
/// 作为所有播放控制与会话状态的键。
///
/// 构造时不做格式校验；`index()` / `controller()` 仅在符合约定时返回值。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionGroupId(String);

impl MotionGroupId {
    /// 从任意字符串创建
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 从索引和控制器名称组装
    pub fn from_parts(index: u32, controller: &str) -> Self {
        Self(format!("{index}@{controller}"))
    }

    /// 原始字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 运动组在控制器内的索引
    pub fn index(&self) -> Option<u32> {
        self.split().and_then(|(index, _)| index.parse().ok())
    }

    /// 控制器名称
    pub fn controller(&self) -> Option<&str> {
        self.split().map(|(_, controller)| controller)
    }

    fn split(&self) -> Option<(&str, &str)> {
        self.0
            .split_once('@')
            .filter(|(index, controller)| !index.is_empty() && !controller.is_empty())
    }
}

impl fmt::Display for MotionGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MotionGroupId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MotionGroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 严格解析：要求符合 `"<index>@<controllerName>"` 约定
impl FromStr for MotionGroupId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self::new(s);
        if id.index().is_some() {
            Ok(id)
        } else {
            Err(ProtocolError::InvalidMotionGroupId(s.to_string()))
        }
    }
}

/// 轨迹标识（由外部规划服务分配）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrajectoryId(String);

impl TrajectoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrajectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrajectoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_group_parts() {
        let id = MotionGroupId::from_parts(0, "ur5e");
        assert_eq!(id.as_str(), "0@ur5e");
        assert_eq!(id.index(), Some(0));
        assert_eq!(id.controller(), Some("ur5e"));
    }

    #[test]
    fn test_motion_group_opaque() {
        // 不符合约定的标识依然可用，只是无法拆分
        let id = MotionGroupId::new("left-arm");
        assert_eq!(id.index(), None);
        assert_eq!(id.controller(), None);

        let id = MotionGroupId::new("@ur5e");
        assert_eq!(id.index(), None);
    }

    #[test]
    fn test_motion_group_from_str() {
        let id: MotionGroupId = "1@kuka".parse().unwrap();
        assert_eq!(id.index(), Some(1));

        assert!(matches!(
            "kuka".parse::<MotionGroupId>(),
            Err(ProtocolError::InvalidMotionGroupId(_))
        ));
        assert!("x@kuka".parse::<MotionGroupId>().is_err());
    }
}
