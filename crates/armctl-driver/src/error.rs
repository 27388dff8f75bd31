//! 驱动层错误类型定义

use armctl_kinematics::{CommandError, IkError};
use armctl_protocol::{LimitError, ProtocolError};
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 协议错误（模式名称、关节编号等）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 关节限位校验失败
    #[error("Limit violation: {0}")]
    Limit(#[from] LimitError),

    /// 逆运动学失败
    #[error("IK error: {0}")]
    Ik(#[from] IkError),

    /// 文本指令无法识别
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// 遥测服务已在运行
    #[error("Telemetry service already running")]
    AlreadyRunning,

    /// 遥测服务已停止，不能再次启动
    #[error("Telemetry service already stopped")]
    AlreadyStopped,

    /// 线程创建失败
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// 线程未在时限内退出
    #[error("Thread did not stop within {0:?}")]
    JoinTimeout(std::time::Duration),

    /// 后台线程 panic
    #[error("Worker thread panicked")]
    WorkerPanicked,

    /// 无效输入
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
