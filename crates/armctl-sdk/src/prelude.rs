//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use armctl_sdk::prelude::*;
//! ```

// 装配与配置
pub use crate::config::AppConfig;
pub use armctl_driver::{Arm, ArmBuilder};

// 分发与遥测
pub use armctl_driver::{
    ChannelSink, DispatchResult, SubscriberId, TelemetrySink, TelemetrySnapshot,
};

// 协议与运动学
pub use armctl_kinematics::{AnalyticIkSolver, Preset};
pub use armctl_protocol::{ArmCommand, ControlMode, JointLimits, RotateMode};

// 传输层（常用 Trait）
pub use armctl_serial::{SerialConfig, Transport};

// 错误类型
pub use crate::config::ConfigError;
pub use armctl_driver::{DriverError, SinkError, SkillError};
pub use armctl_kinematics::{CommandError, IkError};
pub use armctl_protocol::{LimitError, ProtocolError};
pub use armctl_serial::TransportError;
