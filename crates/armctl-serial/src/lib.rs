//! # armctl Serial Transport Layer
//!
//! 控制板传输抽象层。调用方只面对 [`Transport`] trait，
//! 具体实现在构造时一次性选定：
//!
//! - [`MockTransport`]：配置未启用串口，或编译时关闭了 `serial` feature
//! - [`SerialTransport`]：真实串口（懒重连、握手、急停优先）
//!
//! 所有失败都记录日志并以 `bool` / `Option` 返回，不会 panic。

use std::sync::Arc;
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod mock;
pub mod serial;
pub mod transport;

pub use config::{SerialConfig, parse_bool};
pub use error::TransportError;
pub use mock::MockTransport;
pub use serial::{PortIo, PortOpener, SerialTransport};
pub use transport::{LinkState, Transport};

/// 根据配置选择传输实现
///
/// 启用串口时会立即尝试连接一次；失败不影响返回值，
/// 之后的发送会懒重连。
pub fn open_transport(config: &SerialConfig) -> Arc<dyn Transport> {
    if !config.enabled {
        info!(
            "Serial transport in mock mode (enabled=false, port={})",
            config.port
        );
        return Arc::new(MockTransport::new());
    }

    #[cfg(feature = "serial")]
    {
        let transport = SerialTransport::new(config.clone());
        if !transport.connect() {
            warn!(
                "Serial port {} not available yet, will retry on next command",
                config.port
            );
        }
        Arc::new(transport)
    }

    #[cfg(not(feature = "serial"))]
    {
        warn!("Serial support not compiled in, falling back to mock transport");
        Arc::new(MockTransport::new())
    }
}

/// 列出系统可用串口
///
/// 没有设备支持或枚举失败时返回空列表。
pub fn available_ports() -> Vec<String> {
    #[cfg(feature = "serial")]
    {
        match serialport::available_ports() {
            Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
            Err(e) => {
                warn!("Failed to enumerate serial ports: {}", e);
                Vec::new()
            },
        }
    }

    #[cfg(not(feature = "serial"))]
    {
        Vec::new()
    }
}
