//! # armctl Protocol
//!
//! 机械臂文本行协议与关节数据模型（无硬件依赖）
//!
//! ## 模块
//!
//! - `joint`: 关节数量、名称与角度工具函数
//! - `limits`: 关节限位与校验
//! - `mode`: 控制模式（仿真 / 实体）
//! - `command`: 下行指令构建（`abs_rotate`、`PUMP_ON`、`ESTOP` ...）
//! - `status`: 上行 `STATUS` 报文解析
//!
//! ## 报文格式
//!
//! 控制板使用 ASCII 文本行，每条指令以配置的行终止符结尾。
//! 状态回读格式为 `STATUS,<j1>,<j2>,<j3>,<j4>,<j5>,<j6>,<error_code>`，
//! 这是 best-effort 格式，无法解析的行一律丢弃。

pub mod command;
pub mod error;
pub mod joint;
pub mod limits;
pub mod mode;
pub mod status;

pub use command::{ArmCommand, RotateMode, frame_line};
pub use error::ProtocolError;
pub use joint::{AngleSlot, JOINT_COUNT, JOINT_NAMES, JointAngles, JointReadings};
pub use limits::{JointLimits, JointRange, LimitError};
pub use mode::{AtomicControlMode, ControlMode};
pub use status::{StatusReport, unix_timestamp};
