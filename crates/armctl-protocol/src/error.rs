//! 协议层错误类型定义

use thiserror::Error;

/// 协议层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// 空行
    #[error("Empty line")]
    EmptyLine,

    /// 不是 STATUS 报文
    #[error("Not a status line (prefix: {prefix:?})")]
    NotStatus { prefix: String },

    /// 字段数量不足
    #[error("Status line has {actual} fields, expected at least {expected}")]
    MissingFields { expected: usize, actual: usize },

    /// 数值字段无法解析
    #[error("Invalid number in field {field}: {value:?}")]
    InvalidNumber { field: usize, value: String },

    /// 吸泵 PWM 占空比越界（0-255）
    #[error("Invalid PWM duty cycle: {0} (must be 0-255)")]
    PwmOutOfRange(i32),

    /// 舵机编号越界（1-10）
    #[error("Invalid servo ID: {0} (must be 1-10)")]
    InvalidServoId(i32),

    /// 关节编号越界（1-6）
    #[error("Invalid joint index: {0} (must be 1-6)")]
    InvalidJoint(usize),

    /// 控制模式名称无效
    #[error("Invalid mode {0:?}. Must be 'simulation' or 'physical'")]
    InvalidMode(String),

    /// 旋转模式名称无效
    #[error("Invalid rotate mode {0:?}. Must be 'abs' or 'rel'")]
    InvalidRotateMode(String),
}
