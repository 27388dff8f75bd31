//! 客户端管理
//!
//! 记录已连接的 TCP 客户端，退出时统一关闭连接以唤醒阻塞的读线程

use std::collections::HashMap;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 客户端信息
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    /// 连接句柄的克隆，仅用于关闭
    stream: TcpStream,
    pub connected_at: Instant,
}

impl Client {
    /// 连接时长
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// 客户端错误类型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Too many clients (limit {0})")]
    Full(usize),
}

/// 客户端管理器
#[derive(Debug)]
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    /// 从 1 开始（0 保留为无效 ID），溢出后从 1 重新开始
    next_id: AtomicU32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_id: AtomicU32::new(1),
            max_clients,
        }
    }

    /// 生成未被占用的 ID
    fn generate_client_id(&self) -> u32 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let id = if id == 0 { 1 } else { id };
            if !self.clients.contains_key(&id) {
                return id;
            }
        }
    }

    /// 注册客户端（自动生成 ID）
    ///
    /// `stream` 是连接的克隆句柄，[`shutdown_all`](Self::shutdown_all) 通过它关闭连接。
    pub fn register_auto(
        &mut self,
        addr: SocketAddr,
        stream: TcpStream,
    ) -> Result<u32, ClientError> {
        if self.clients.len() >= self.max_clients {
            return Err(ClientError::Full(self.max_clients));
        }

        let id = self.generate_client_id();
        self.clients.insert(
            id,
            Client {
                id,
                addr,
                stream,
                connected_at: Instant::now(),
            },
        );
        Ok(id)
    }

    /// 注销客户端，返回其连接时长
    pub fn unregister(&mut self, id: u32) -> Option<Duration> {
        self.clients.remove(&id).map(|client| client.age())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.clients.contains_key(&id)
    }

    /// 关闭所有连接
    ///
    /// 客户端线程在读到 EOF 后自行注销，这里不移除记录。
    pub fn shutdown_all(&self) {
        for client in self.clients.values() {
            debug!("Closing client {} ({})", client.id, client.addr);
            if let Err(e) = client.stream.shutdown(Shutdown::Both) {
                warn!("Failed to close client {} ({}): {}", client.id, client.addr, e);
            }
        }
    }
}
