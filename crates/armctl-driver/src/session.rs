//! 控制通道会话
//!
//! 每个连接（TCP、WebSocket ...）对应一个 [`ControlSession`]。
//! 客户端消息以 `action` 字段区分，服务端消息以 `type` 字段区分，均为 JSON。
//!
//! ```text
//! -> {"action":"move_to_angles","angles":[0,0.1,0.2,0,0,0]}
//! <- {"type":"dispatch_result","mode":"simulation","source":"websocket",...}
//! -> {"action":"subscribe"}
//! <- {"type":"telemetry_snapshot","data":{...}}
//! <- {"type":"telemetry","data":{...}}
//! ```

use crate::builder::Arm;
use crate::context::HardwareStatus;
use crate::dispatch::DispatchResult;
use crate::error::DriverError;
use crate::observer::{SinkError, SubscriberId, TelemetrySink};
use crate::skills::{OutcomeMode, SkillOutcome};
use crate::telemetry::TelemetrySnapshot;
use armctl_protocol::joint::rad_to_deg;
use armctl_protocol::{ControlMode, JOINT_COUNT};
use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// 关节角度指令的来源标识
pub const SOURCE_ANGLES: &str = "websocket";
/// 笛卡尔目标指令的来源标识
pub const SOURCE_TARGET: &str = "websocket_ik";
/// 技能指令的来源标识
pub const SOURCE_SKILL: &str = "skill";

/// 客户端消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Start,
    /// 关节角度（弧度）
    MoveToAngles {
        #[serde(default)]
        angles: Vec<f64>,
    },
    /// 笛卡尔目标 `[x, y, z]`（米）
    SetTarget {
        #[serde(default)]
        target: Vec<f64>,
    },
    GetMode,
    SetMode {
        mode: String,
    },
    GetStatus,
    Subscribe,
    Unsubscribe,
    Skill {
        name: String,
        #[serde(default)]
        args: Value,
    },
}

/// 服务端消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        message: String,
        control_mode: ControlMode,
    },
    Pong,
    DispatchResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ik_success: Option<bool>,
        #[serde(flatten)]
        result: DispatchResult,
    },
    Error {
        message: String,
    },
    IkError {
        message: String,
    },
    ModeInfo {
        mode: ControlMode,
        serial_available: bool,
    },
    HardwareStatus {
        #[serde(flatten)]
        status: HardwareStatus,
    },
    SkillResult {
        outcome: SkillOutcome,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dispatch: Option<DispatchResult>,
    },
    /// 订阅后的首个快照
    TelemetrySnapshot {
        data: TelemetrySnapshot,
    },
    Telemetry {
        data: TelemetrySnapshot,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

/// 把遥测快照转成 [`ServerMessage`] 写入连接的 sink
///
/// 第一次推送为 `telemetry_snapshot`，之后为 `telemetry`。
#[derive(Debug)]
pub struct MessageSink {
    tx: Sender<ServerMessage>,
    first: AtomicBool,
}

impl MessageSink {
    pub fn new(tx: Sender<ServerMessage>) -> Self {
        Self {
            tx,
            first: AtomicBool::new(true),
        }
    }
}

impl TelemetrySink for MessageSink {
    fn push(&self, snapshot: &TelemetrySnapshot) -> Result<(), SinkError> {
        let data = snapshot.clone();
        let message = if self.first.swap(false, Ordering::AcqRel) {
            ServerMessage::TelemetrySnapshot { data }
        } else {
            ServerMessage::Telemetry { data }
        };
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

/// 控制通道会话
///
/// 会话结束（drop）时自动注销遥测订阅。
pub struct ControlSession {
    arm: Arc<Arm>,
    outbound: Option<Sender<ServerMessage>>,
    subscription: Option<SubscriberId>,
}

impl ControlSession {
    /// `outbound` 为连接的发送队列；为 `None` 时不支持订阅遥测
    pub fn new(arm: Arc<Arm>, outbound: Option<Sender<ServerMessage>>) -> Self {
        Self {
            arm,
            outbound,
            subscription: None,
        }
    }

    /// 连接建立时发送的问候消息
    pub fn greeting(&self) -> ServerMessage {
        ServerMessage::Connected {
            message: "armctl control channel connected".to_string(),
            control_mode: self.arm.context().mode(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// 处理一行 JSON 文本
    pub fn handle_line(&mut self, line: &str) -> Option<ServerMessage> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<ClientMessage>(line) {
            Ok(message) => self.handle(message),
            Err(e) => {
                debug!("Control session: invalid message {:?}: {}", line, e);
                Some(ServerMessage::error(format!("Invalid message: {}", e)))
            },
        }
    }

    /// 处理一条客户端消息，返回需要回复的消息
    pub fn handle(&mut self, message: ClientMessage) -> Option<ServerMessage> {
        match message {
            ClientMessage::Ping => Some(ServerMessage::Pong),
            ClientMessage::Start => {
                info!("Control session: start requested");
                None
            },
            ClientMessage::MoveToAngles { angles } => Some(self.move_to_angles(&angles)),
            ClientMessage::SetTarget { target } => Some(self.set_target(&target)),
            ClientMessage::GetMode => Some(self.mode_info()),
            ClientMessage::SetMode { mode } => match self.arm.context().set_mode_str(&mode) {
                Ok(_) => Some(self.mode_info()),
                Err(e) => Some(ServerMessage::error(e.to_string())),
            },
            ClientMessage::GetStatus => Some(ServerMessage::HardwareStatus {
                status: self.arm.context().hardware_status(),
            }),
            ClientMessage::Subscribe => self.subscribe(),
            ClientMessage::Unsubscribe => {
                self.unsubscribe();
                None
            },
            ClientMessage::Skill { name, args } => Some(self.skill(&name, &args)),
        }
    }

    fn mode_info(&self) -> ServerMessage {
        let context = self.arm.context();
        ServerMessage::ModeInfo {
            mode: context.mode(),
            serial_available: context.serial_available(),
        }
    }

    fn move_to_angles(&self, angles_rad: &[f64]) -> ServerMessage {
        if angles_rad.len() != JOINT_COUNT {
            return ServerMessage::error(format!(
                "angles must contain exactly {} values",
                JOINT_COUNT
            ));
        }
        let angles_deg: Vec<f64> = angles_rad.iter().copied().map(rad_to_deg).collect();
        ServerMessage::DispatchResult {
            ik_success: None,
            result: self.arm.router().dispatch(&angles_deg, SOURCE_ANGLES),
        }
    }

    fn set_target(&self, target: &[f64]) -> ServerMessage {
        let &[x, y, z] = target else {
            return ServerMessage::error("target must contain exactly 3 values");
        };
        match self.arm.router().dispatch_target(x, y, z, SOURCE_TARGET) {
            Ok((_, result)) => ServerMessage::DispatchResult {
                ik_success: Some(true),
                result,
            },
            Err(DriverError::Ik(e)) => ServerMessage::IkError {
                message: e.to_string(),
            },
            Err(e) => ServerMessage::error(e.to_string()),
        }
    }

    fn skill(&self, name: &str, args: &Value) -> ServerMessage {
        match self.arm.skills().execute(name, args) {
            Ok(outcome) => {
                let dispatch = match (outcome.mode, outcome.angles) {
                    (OutcomeMode::Work, Some(angles)) => {
                        Some(self.arm.router().dispatch(&angles, SOURCE_SKILL))
                    },
                    _ => None,
                };
                ServerMessage::SkillResult { outcome, dispatch }
            },
            Err(e) => ServerMessage::error(e.to_string()),
        }
    }

    fn subscribe(&mut self) -> Option<ServerMessage> {
        if self.subscription.is_some() {
            return Some(ServerMessage::TelemetrySnapshot {
                data: self.arm.telemetry().latest().as_ref().clone(),
            });
        }
        let Some(tx) = self.outbound.clone() else {
            return Some(ServerMessage::error(
                "telemetry subscription not supported on this channel",
            ));
        };
        // 首个快照经 sink 发送
        match self.arm.telemetry().subscribe(Arc::new(MessageSink::new(tx))) {
            Ok(id) => {
                self.subscription = Some(id);
                None
            },
            Err(e) => {
                warn!("Control session: telemetry subscription failed: {}", e);
                Some(ServerMessage::error(e.to_string()))
            },
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.arm.telemetry().unsubscribe(id);
        }
    }
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
