//! TCP 桥接主体
//!
//! 每个客户端两个线程：
//! - 读线程：逐行解析控制消息，交给 [`ControlSession`] 处理
//! - 写线程：从有界队列取 [`ServerMessage`]，序列化为 JSON 行写回
//!
//! 回复消息阻塞入队，遥测消息非阻塞入队（队列满时丢弃该帧）。

use crate::client_manager::ClientManager;
use armctl_sdk::driver::{ControlSession, ServerMessage};
use armctl_sdk::{Arm, DriverError};
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::RwLock;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 桥接配置
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// 监听地址
    pub listen: String,
    /// 最大客户端数
    pub max_clients: usize,
    /// 每个连接的发送队列容量
    pub queue_capacity: usize,
    /// 无新连接时的轮询间隔
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:18888".to_string(),
            max_clients: 16,
            queue_capacity: 64,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// 桥接错误类型
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

pub struct Bridge {
    arm: Arc<Arm>,
    config: BridgeConfig,
    clients: Arc<RwLock<ClientManager>>,
}

impl Bridge {
    pub fn new(arm: Arc<Arm>, config: BridgeConfig) -> Self {
        let clients = Arc::new(RwLock::new(ClientManager::new(config.max_clients)));
        Self {
            arm,
            config,
            clients,
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().count()
    }

    /// 绑定监听地址（非阻塞 accept）
    pub fn bind(&self) -> Result<TcpListener, BridgeError> {
        let listener = TcpListener::bind(&self.config.listen).map_err(|source| {
            BridgeError::Bind {
                addr: self.config.listen.clone(),
                source,
            }
        })?;
        listener.set_nonblocking(true)?;
        Ok(listener)
    }

    /// 启动遥测并接受连接，直到 `shutdown` 置位
    ///
    /// 退出时关闭所有连接并停止机械臂（遥测线程 + 串口）。
    pub fn serve(&self, listener: TcpListener, shutdown: &AtomicBool) -> Result<(), BridgeError> {
        self.arm.start_telemetry()?;
        info!(
            "Bridge listening on {} (mode: {})",
            listener.local_addr()?,
            self.arm.context().mode()
        );

        while !shutdown.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, addr)) => self.accept(stream, addr),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.config.poll_interval);
                },
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    thread::sleep(self.config.poll_interval);
                },
            }
        }

        info!("Bridge shutting down ({} clients)", self.client_count());
        self.clients.read().shutdown_all();
        self.arm.shutdown()?;
        Ok(())
    }

    fn accept(&self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = self.spawn_client(stream, addr) {
            warn!("Rejected client {}: {}", addr, e);
        }
    }

    fn spawn_client(&self, stream: TcpStream, addr: SocketAddr) -> Result<(), BridgeError> {
        // 监听端为非阻塞，新连接需显式切回阻塞
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;

        let id = match self.clients.write().register_auto(addr, stream.try_clone()?) {
            Ok(id) => id,
            Err(e) => {
                let mut writer = BufWriter::new(&stream);
                let _ = write_message(&mut writer, &ServerMessage::error(e.to_string()));
                return Err(io::Error::other(e).into());
            },
        };

        let (tx, rx) = bounded::<ServerMessage>(self.config.queue_capacity.max(1));
        let writer_stream = stream.try_clone()?;
        let writer = thread::Builder::new()
            .name(format!("armctl-client-{}-tx", id))
            .spawn(move || writer_loop(writer_stream, rx));
        let writer = match writer {
            Ok(handle) => handle,
            Err(e) => {
                self.clients.write().unregister(id);
                return Err(e.into());
            },
        };

        let arm = Arc::clone(&self.arm);
        let clients = Arc::clone(&self.clients);
        let reader = thread::Builder::new()
            .name(format!("armctl-client-{}-rx", id))
            .spawn(move || {
                reader_loop(stream, arm, tx);
                if writer.join().is_err() {
                    error!("Client {} writer thread panicked", id);
                }
                if let Some(age) = clients.write().unregister(id) {
                    info!("Client {} ({}) disconnected after {:?}", id, addr, age);
                }
            });

        if let Err(e) = reader {
            // 写线程随 tx 一起被丢弃而退出
            self.clients.write().unregister(id);
            return Err(e.into());
        }

        info!("Client {} connected from {}", id, addr);
        Ok(())
    }
}

/// 读线程：处理控制消息直到 EOF
fn reader_loop(stream: TcpStream, arm: Arc<Arm>, tx: Sender<ServerMessage>) {
    let mut session = ControlSession::new(arm, Some(tx.clone()));
    if tx.send(session.greeting()).is_err() {
        return;
    }

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!("Client read ended: {}", e);
                break;
            },
        };

        if let Some(reply) = session.handle_line(&line)
            && tx.send(reply).is_err()
        {
            break;
        }
    }
    // session drop 时注销遥测订阅，随后写线程的队列断开
}

/// 写线程：队列断开或写失败时退出
fn writer_loop(stream: TcpStream, rx: Receiver<ServerMessage>) {
    let mut writer = BufWriter::new(stream);
    for message in rx {
        if let Err(e) = write_message(&mut writer, &message) {
            debug!("Client write ended: {}", e);
            break;
        }
    }
}

/// 写一条 JSON 行并刷新
pub fn write_message<W: Write>(writer: &mut W, message: &ServerMessage) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use armctl_sdk::ArmBuilder;

    #[test]
    fn test_write_message_is_one_line() {
        let mut buf = Vec::new();
        write_message(&mut buf, &ServerMessage::Pong).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"type\":\"pong\"}\n");
    }

    #[test]
    fn test_bind_error() {
        let arm = Arc::new(ArmBuilder::new().without_transport().build());
        let bridge = Bridge::new(
            arm,
            BridgeConfig {
                listen: "not-an-address".to_string(),
                ..BridgeConfig::default()
            },
        );
        assert!(matches!(bridge.bind(), Err(BridgeError::Bind { .. })));
    }
}
