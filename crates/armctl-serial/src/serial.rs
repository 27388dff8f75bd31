//! 串口传输实现
//!
//! # 锁策略
//!
//! 端口句柄与接收缓冲由同一把 `parking_lot::Mutex` 保护，
//! 每次只在单次读或写期间持有。急停与普通指令共用这把锁，
//! 但急停会先清空输出缓冲。
//!
//! # 懒重连
//!
//! 打开失败或写入时链路断开后，句柄被丢弃；下一次 `send_command` /
//! `read_line` 会重新打开并发送握手。读失败不会断开链路。

use crate::config::SerialConfig;
use crate::error::TransportError;
use crate::transport::{LinkState, Transport};
use armctl_protocol::{ArmCommand, frame_line};
use parking_lot::Mutex;
use std::fmt;
use std::io::{ErrorKind, Read, Write};
use tracing::{error, info, trace, warn};

/// 单次读取的块大小
const READ_CHUNK: usize = 256;

/// 接收缓冲上限，超过后丢弃（控制板每行远小于此值）
const MAX_PENDING: usize = 4096;

/// 串口句柄抽象
///
/// 系统串口由 `serialport` 提供；测试中可以注入内存实现。
pub trait PortIo: Read + Write + Send {
    /// 丢弃尚未发出的输出
    fn clear_output(&mut self) -> std::io::Result<()>;

    /// 丢弃尚未读取的输入
    fn clear_input(&mut self) -> std::io::Result<()>;
}

/// 打开串口的工厂函数
pub type PortOpener =
    Box<dyn Fn(&SerialConfig) -> Result<Box<dyn PortIo>, TransportError> + Send + Sync>;

#[cfg(feature = "serial")]
impl PortIo for Box<dyn serialport::SerialPort> {
    fn clear_output(&mut self) -> std::io::Result<()> {
        self.clear(serialport::ClearBuffer::Output)
            .map_err(std::io::Error::from)
    }

    fn clear_input(&mut self) -> std::io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)
            .map_err(std::io::Error::from)
    }
}

#[cfg(feature = "serial")]
fn open_system_port(config: &SerialConfig) -> Result<Box<dyn PortIo>, TransportError> {
    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.timeout())
        .open()
        .map_err(|e| TransportError::Open {
            port: config.port.clone(),
            message: e.to_string(),
        })?;
    Ok(Box::new(port))
}

struct PortState {
    port: Option<Box<dyn PortIo>>,
    /// 已读取但尚未组成完整行的字节
    pending: Vec<u8>,
}

/// 真实串口传输
pub struct SerialTransport {
    config: SerialConfig,
    opener: PortOpener,
    state: Mutex<PortState>,
}

impl fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.config.port)
            .field("baud_rate", &self.config.baud_rate)
            .field("link_state", &self.link_state())
            .finish()
    }
}

impl SerialTransport {
    /// 使用系统串口
    ///
    /// 不会立即打开端口，首次 `connect()` 或发送时才打开。
    #[cfg(feature = "serial")]
    pub fn new(config: SerialConfig) -> Self {
        Self::with_opener(config, open_system_port)
    }

    /// 使用自定义的端口工厂
    pub fn with_opener<F>(config: SerialConfig, opener: F) -> Self
    where
        F: Fn(&SerialConfig) -> Result<Box<dyn PortIo>, TransportError> + Send + Sync + 'static,
    {
        Self {
            config,
            opener: Box::new(opener),
            state: Mutex::new(PortState {
                port: None,
                pending: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn frame(&self, command: &str) -> String {
        frame_line(command, &self.config.newline)
    }

    /// 在已持有锁的情况下确保端口打开
    fn ensure_open(&self, state: &mut PortState) -> bool {
        if state.port.is_some() {
            return true;
        }

        let mut port = match (self.opener)(&self.config) {
            Ok(port) => port,
            Err(e) => {
                error!("Serial open failed: {}", e);
                return false;
            },
        };
        info!(
            "Serial port {} opened (baud={})",
            self.config.port, self.config.baud_rate
        );

        if let Some(handshake) = self.config.handshake_command()
            && let Err(e) = write_port(port.as_mut(), &self.frame(handshake))
        {
            warn!("Handshake {:?} failed: {}", handshake, e);
        }

        state.port = Some(port);
        state.pending.clear();
        true
    }
}

fn write_port(port: &mut dyn PortIo, line: &str) -> Result<(), TransportError> {
    port.write_all(line.as_bytes())?;
    port.flush()?;
    Ok(())
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = pending.drain(..=pos).collect();
    Some(decode_line(&line))
}

/// 读取下一行完整数据
///
/// 缓冲中已有完整行时直接返回；否则只调用一次 `read`（受端口超时约束），
/// 仍不完整则返回 [`TransportError::Timeout`]，字节留在缓冲中等下一次调用。
fn read_line_locked(state: &mut PortState) -> Result<String, TransportError> {
    if let Some(line) = take_line(&mut state.pending) {
        return Ok(line);
    }

    let port = state.port.as_mut().ok_or(TransportError::NotConnected)?;
    let mut buf = [0u8; READ_CHUNK];
    let n = loop {
        match port.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                return Err(TransportError::Timeout);
            },
            Err(e) => return Err(e.into()),
        }
    };
    state.pending.extend_from_slice(&buf[..n]);

    if let Some(line) = take_line(&mut state.pending) {
        return Ok(line);
    }
    if state.pending.len() > MAX_PENDING {
        warn!(
            "Discarding {} bytes of unterminated serial input",
            state.pending.len()
        );
        state.pending.clear();
    }
    Err(TransportError::Timeout)
}

impl Transport for SerialTransport {
    fn connect(&self) -> bool {
        let mut state = self.state.lock();
        self.ensure_open(&mut state)
    }

    fn close(&self) {
        let mut state = self.state.lock();
        if let Some(mut port) = state.port.take() {
            if self.config.handshake_command().is_some()
                && let Err(e) = write_port(port.as_mut(), &self.frame(&ArmCommand::RemoteDisable.to_string()))
            {
                warn!("Failed to send remote_disable: {}", e);
            }
            drop(port);
            info!("Serial port {} closed", self.config.port);
        }
        state.pending.clear();
    }

    fn link_state(&self) -> LinkState {
        if self.state.lock().port.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    fn send_command(&self, command: &str) -> bool {
        let line = self.frame(command);
        let mut state = self.state.lock();
        if !self.ensure_open(&mut state) {
            return false;
        }

        let Some(port) = state.port.as_mut() else {
            return false;
        };
        match write_port(port.as_mut(), &line) {
            Ok(()) => {
                trace!("-> {}", line.trim_end());
                true
            },
            Err(e) => {
                error!("Serial write failed ({}): {}", line.trim_end(), e);
                if e.is_link_lost() {
                    state.port = None;
                    warn!("Serial link lost, will reconnect on next command");
                }
                false
            },
        }
    }

    fn read_line(&self) -> Option<String> {
        let mut state = self.state.lock();
        if !self.ensure_open(&mut state) {
            return None;
        }

        match read_line_locked(&mut state) {
            Ok(line) if line.is_empty() => None,
            Ok(line) => {
                trace!("<- {}", line);
                Some(line)
            },
            Err(TransportError::Timeout) => None,
            Err(e) => {
                error!("Serial read failed: {}", e);
                None
            },
        }
    }

    fn send_emergency_stop(&self) -> bool {
        let line = self.frame(&ArmCommand::EmergencyStop.to_string());
        let mut state = self.state.lock();
        let Some(port) = state.port.as_mut() else {
            error!("Emergency stop not sent: serial port not connected");
            return false;
        };

        if let Err(e) = port.clear_output() {
            warn!("Failed to clear output buffer before ESTOP: {}", e);
        }
        match write_port(port.as_mut(), &line) {
            Ok(()) => {
                warn!("Emergency stop sent");
                true
            },
            Err(e) => {
                error!("Emergency stop write failed: {}", e);
                false
            },
        }
    }

    fn flush_input(&self) -> bool {
        let mut state = self.state.lock();
        state.pending.clear();
        let Some(port) = state.port.as_mut() else {
            return false;
        };
        match port.clear_input() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to clear serial input buffer: {}", e);
                false
            },
        }
    }

    fn flush_output(&self) -> bool {
        let mut state = self.state.lock();
        let Some(port) = state.port.as_mut() else {
            return false;
        };
        match port.clear_output() {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to clear serial output buffer: {}", e);
                false
            },
        }
    }
}
