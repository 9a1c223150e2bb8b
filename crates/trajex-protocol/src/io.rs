//! IO 类型
//!
//! `StartMovementRequest` 携带的 IO 写入列表与启动 / 暂停触发条件。
//! IO 的实际语义由外部总线子系统定义，这里只描述数据形状。

use serde::{Deserialize, Serialize};

/// IO 值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IoValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl IoValue {
    fn as_f64(self) -> f64 {
        match self {
            IoValue::Bool(b) => f64::from(u8::from(b)),
            IoValue::Integer(i) => i as f64,
            IoValue::Float(f) => f,
        }
    }
}

/// 单次 IO 写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoWrite {
    /// IO 名称（如 `"tool_out[0]"`）
    pub io: String,
    pub value: IoValue,
}

impl IoWrite {
    pub fn new(io: impl Into<String>, value: IoValue) -> Self {
        Self {
            io: io.into(),
            value,
        }
    }
}

/// 锚定到轨迹位置的 IO 写入
///
/// 执行器在路径参数到达 `location` 时执行写入。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetIo {
    pub io: IoWrite,
    pub location: f64,
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// IO 触发条件（用于 startOnIO / pauseOnIO）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoCondition {
    pub io: String,
    pub comparator: Comparator,
    pub value: IoValue,
}

impl IoCondition {
    pub fn new(io: impl Into<String>, comparator: Comparator, value: IoValue) -> Self {
        Self {
            io: io.into(),
            comparator,
            value,
        }
    }

    /// 判断给定的 IO 读数是否满足条件
    ///
    /// 布尔值按 0/1 参与比较。
    pub fn is_met(&self, reading: IoValue) -> bool {
        let (lhs, rhs) = (reading.as_f64(), self.value.as_f64());
        match self.comparator {
            Comparator::Eq => lhs == rhs,
            Comparator::Ne => lhs != rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
        }
    }
}
