//! armctl SDK - 6 关节串口机械臂 Rust SDK
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 关节数据、限位、文本指令与 `STATUS` 报文
//! - **传输层** (`serial`): 串口 / Mock 传输
//! - **运动学** (`kinematics`): 解析逆运动学、预设位置、关键词指令
//! - **驱动层** (`driver`): 指令分发、遥测服务、技能表、控制通道
//!
//! # 快速开始
//!
//! ```rust
//! use armctl_sdk::prelude::*;
//!
//! let config = AppConfig::default();
//! let arm = config.builder().build();
//!
//! let result = arm.router().dispatch(&[0.0, 10.0, 20.0, 0.0, -30.0, 0.0], "doc");
//! assert_eq!(result.mode, ControlMode::Simulation);
//! assert!(!result.serial_sent);
//! ```

pub use armctl_driver as driver;
pub use armctl_kinematics as kinematics;
pub use armctl_protocol as protocol;
pub use armctl_serial as serial;

pub mod config;
pub mod logging;
pub mod prelude;

pub use config::{AppConfig, ConfigError, ControlSection, TelemetrySection};

pub use armctl_driver::{
    Arm, ArmBuilder, ArmContext, ChannelSink, DispatchResult, DispatchRouter, DriverError,
    SubscriberId, TelemetryService, TelemetrySink, TelemetrySnapshot,
};
pub use armctl_kinematics::{AnalyticIkSolver, IkError, Preset};
pub use armctl_protocol::{ControlMode, JointLimits, ProtocolError};
pub use armctl_serial::{SerialConfig, Transport, TransportError};
