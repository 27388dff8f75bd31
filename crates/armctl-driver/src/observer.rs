//! 遥测观察者
//!
//! [`TelemetrySink`] 是遥测推送的出口（WebSocket 连接、TCP 客户端、CLI 监视器等）。
//! [`ObserverRegistry`] 保存已注册的 sink，广播后返回推送失败的 ID，
//! 由遥测服务统一移除。
//!
//! # 实现要求
//!
//! - `push` 必须非阻塞，推荐使用 `try_send`
//! - 返回 `Err` 表示该 sink 已失效，会被移出注册表（`Full` 除外）

use crate::telemetry::TelemetrySnapshot;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// Sink 推送错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// 接收端已关闭
    #[error("Sink disconnected")]
    Disconnected,

    /// 缓冲区已满
    #[error("Sink buffer full")]
    Full,

    /// 底层 I/O 失败
    #[error("Sink I/O error: {0}")]
    Io(String),
}

impl SinkError {
    /// 是否应移除该 sink（缓冲区满只丢弃本次推送）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SinkError::Full)
    }
}

/// 遥测推送接口
pub trait TelemetrySink: Send + Sync {
    /// 推送一个快照
    fn push(&self, snapshot: &TelemetrySnapshot) -> Result<(), SinkError>;
}

/// 订阅者 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 观察者注册表
///
/// 本身不是线程安全的，由遥测服务放在 `parking_lot::Mutex` 中。
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    sinks: Vec<(SubscriberId, Arc<dyn TelemetrySink>)>,
}

impl ObserverRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            sinks: Vec::new(),
        }
    }

    pub fn add(&mut self, sink: Arc<dyn TelemetrySink>) -> SubscriberId {
        self.next_id += 1;
        let id = SubscriberId(self.next_id);
        self.sinks.push((id, sink));
        id
    }

    /// 移除 sink，返回是否存在
    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(sid, _)| *sid != id);
        self.sinks.len() != before
    }

    /// 向所有 sink 推送，返回失效的 ID（不在此处移除）
    pub fn broadcast(&self, snapshot: &TelemetrySnapshot) -> Vec<SubscriberId> {
        let mut failed = Vec::new();
        for (id, sink) in &self.sinks {
            match sink.push(snapshot) {
                Ok(()) => {},
                Err(e) if e.is_fatal() => {
                    debug!("Telemetry sink {} failed: {}", id, e);
                    failed.push(*id);
                },
                Err(e) => trace!("Telemetry sink {} skipped: {}", id, e),
            }
        }
        failed
    }

    /// 移除一组 sink，返回实际移除的数量
    pub fn remove_all(&mut self, ids: &[SubscriberId]) -> usize {
        let before = self.sinks.len();
        self.sinks.retain(|(sid, _)| !ids.contains(sid));
        before - self.sinks.len()
    }

    pub fn clear(&mut self) {
        self.sinks.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscribers", &self.sinks.len())
            .finish()
    }
}

/// 基于有界 channel 的 sink
///
/// 缓冲区满时丢弃本次推送并返回 `Full`（不会被移除）；
/// 接收端关闭后返回 `Disconnected`。
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<TelemetrySnapshot>,
}

impl ChannelSink {
    /// 创建 sink 和对应的接收端
    pub fn new(capacity: usize) -> (Self, Receiver<TelemetrySnapshot>) {
        let (tx, rx) = bounded(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn push(&self, snapshot: &TelemetrySnapshot) -> Result<(), SinkError> {
        self.tx.try_send(snapshot.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}
