//! 应用上下文
//!
//! 进程级共享状态（控制模式、传输句柄、串口配置）集中在 [`ArmContext`]，
//! 以 `Arc<ArmContext>` 传入分发器和遥测服务。测试可以创建互不干扰的多个实例。

use armctl_protocol::{AtomicControlMode, ControlMode, ProtocolError};
use armctl_serial::{LinkState, SerialConfig, Transport, available_ports, open_transport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// 应用上下文
pub struct ArmContext {
    transport: Option<Arc<dyn Transport>>,
    mode: AtomicControlMode,
    serial_config: SerialConfig,
}

impl fmt::Debug for ArmContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArmContext")
            .field("mode", &self.mode.get())
            .field("link_state", &self.link_state())
            .field("serial_port", &self.serial_config.port)
            .finish()
    }
}

impl ArmContext {
    pub fn new(
        transport: Option<Arc<dyn Transport>>,
        mode: ControlMode,
        serial_config: SerialConfig,
    ) -> Self {
        Self {
            transport,
            mode: AtomicControlMode::new(mode),
            serial_config,
        }
    }

    /// 按配置选择传输实现并创建上下文
    pub fn from_config(serial_config: SerialConfig, mode: ControlMode) -> Self {
        let transport = open_transport(&serial_config);
        Self::new(Some(transport), mode, serial_config)
    }

    /// 传输句柄（可能不存在）
    pub fn transport(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }

    pub fn serial_config(&self) -> &SerialConfig {
        &self.serial_config
    }

    /// 当前控制模式
    pub fn mode(&self) -> ControlMode {
        self.mode.get()
    }

    /// 切换控制模式，返回旧模式
    pub fn set_mode(&self, mode: ControlMode) -> ControlMode {
        let previous = self.mode.swap(mode);
        if previous != mode {
            info!("Control mode changed: {} -> {}", previous, mode);
        }
        previous
    }

    /// 按名称切换控制模式
    ///
    /// 只接受 `simulation` / `physical`，无效值不改变当前模式。
    pub fn set_mode_str(&self, mode: &str) -> Result<ControlMode, ProtocolError> {
        let mode: ControlMode = mode.parse()?;
        self.set_mode(mode);
        Ok(mode)
    }

    pub fn link_state(&self) -> LinkState {
        self.transport
            .as_ref()
            .map_or(LinkState::Mock, |t| t.link_state())
    }

    /// 传输是否为 Mock（没有传输时也视为 Mock）
    pub fn serial_mock(&self) -> bool {
        self.transport.as_ref().is_none_or(|t| t.is_mock())
    }

    /// 是否有可用的真实串口传输
    pub fn serial_available(&self) -> bool {
        !self.serial_mock()
    }

    /// 硬件状态汇总
    pub fn hardware_status(&self) -> HardwareStatus {
        HardwareStatus {
            control_mode: self.mode(),
            serial_enabled: self.serial_config.enabled,
            serial_connected: self.link_state() == LinkState::Connected,
            serial_port: self.serial_config.port.clone(),
            serial_mock: self.serial_mock(),
            link_state: self.link_state().as_str().to_string(),
            available_ports: if self.transport.is_some() {
                available_ports()
            } else {
                Vec::new()
            },
        }
    }
}

/// 硬件状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareStatus {
    pub control_mode: ControlMode,
    pub serial_enabled: bool,
    pub serial_connected: bool,
    pub serial_port: String,
    pub serial_mock: bool,
    pub link_state: String,
    pub available_ports: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use armctl_serial::MockTransport;

    fn mock_context() -> ArmContext {
        ArmContext::new(
            Some(Arc::new(MockTransport::new())),
            ControlMode::Simulation,
            SerialConfig::default(),
        )
    }

    #[test]
    fn test_mode_switching() {
        let ctx = mock_context();
        assert_eq!(ctx.mode(), ControlMode::Simulation);

        assert_eq!(ctx.set_mode(ControlMode::Physical), ControlMode::Simulation);
        assert_eq!(ctx.mode(), ControlMode::Physical);

        assert_eq!(ctx.set_mode_str("simulation").unwrap(), ControlMode::Simulation);
        assert_eq!(ctx.mode(), ControlMode::Simulation);
    }

    #[test]
    fn test_invalid_mode_leaves_state_unchanged() {
        let ctx = mock_context();
        ctx.set_mode(ControlMode::Physical);
        assert!(ctx.set_mode_str("turbo").is_err());
        assert_eq!(ctx.mode(), ControlMode::Physical);
    }

    #[test]
    fn test_hardware_status_with_mock() {
        let ctx = mock_context();
        let status = ctx.hardware_status();
        assert_eq!(status.control_mode, ControlMode::Simulation);
        assert!(!status.serial_enabled);
        assert!(!status.serial_connected);
        assert!(status.serial_mock);
        assert_eq!(status.serial_port, "COM3");
        assert_eq!(status.link_state, "mock");
        assert!(!ctx.serial_available());
    }

    #[test]
    fn test_no_transport_counts_as_mock() {
        let ctx = ArmContext::new(None, ControlMode::Physical, SerialConfig::default());
        assert!(ctx.serial_mock());
        assert_eq!(ctx.link_state(), LinkState::Mock);
        assert!(ctx.hardware_status().available_ports.is_empty());
    }

    #[test]
    fn test_independent_instances() {
        let a = mock_context();
        let b = mock_context();
        a.set_mode(ControlMode::Physical);
        assert_eq!(b.mode(), ControlMode::Simulation);
    }
}
