//! # armctl Bridge
//!
//! TCP 桥接：控制通道与遥测流，JSON 行协议

pub mod bridge;
pub mod client_manager;

pub use bridge::{Bridge, BridgeConfig, BridgeError};
pub use client_manager::{ClientError, ClientManager};
