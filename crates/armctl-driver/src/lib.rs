//! 驱动层模块
//!
//! 本模块提供机械臂的指令分发与遥测功能，包括：
//! - 应用上下文（控制模式、传输句柄）
//! - 指令分发（限位校验 → 串口 / 仿真）
//! - 遥测服务（后台采样线程，ArcSwap 快照，观察者广播）
//! - 技能表与控制通道会话协议
//!
//! # 使用场景
//!
//! 大多数用户通过 [`ArmBuilder`] 装配 [`Arm`]，再通过 [`Arm::router`] 下发指令、
//! [`Arm::telemetry`] 订阅状态。

mod builder;
pub mod context;
pub mod dispatch;
mod error;
pub mod observer;
pub mod session;
pub mod skills;
pub mod telemetry;

pub use builder::{Arm, ArmBuilder};
pub use context::{ArmContext, HardwareStatus};
pub use dispatch::{DispatchResult, DispatchRouter};
pub use error::DriverError;
pub use observer::{ChannelSink, ObserverRegistry, SinkError, SubscriberId, TelemetrySink};
pub use session::{ClientMessage, ControlSession, MessageSink, ServerMessage};
pub use skills::{OutcomeMode, SkillError, SkillExecutor, SkillKind, SkillOutcome};
pub use telemetry::{
    TelemetryConfig, TelemetryService, TelemetrySnapshot, TelemetryState, TelemetryStats,
};
