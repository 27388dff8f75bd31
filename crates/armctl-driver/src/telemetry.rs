//! 遥测服务
//!
//! 后台线程按固定周期采样机械臂状态并推送给所有观察者：
//!
//! - 实体模式且传输不是 Mock：读取控制板 `STATUS` 报文，读取失败时保留上一快照
//! - 其他情况：生成正弦摆动的模拟角度（幅度 25°）
//!
//! # 生命周期
//!
//! `Idle -> Running -> Cancelled -> Stopped`。取消信号在每个周期的等待点检查，
//! `stop()` 在返回前 join 后台线程。服务不会关闭传输层。

use crate::context::ArmContext;
use crate::error::DriverError;
use crate::observer::{ObserverRegistry, SinkError, SubscriberId, TelemetrySink};
use arc_swap::ArcSwap;
use armctl_protocol::joint::{deg_to_rad, round2};
use armctl_protocol::{ControlMode, JOINT_COUNT, JointReadings, StatusReport, unix_timestamp};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// 模拟运动每个周期的相位增量
const MOCK_PHASE_STEP: f64 = 0.1;
/// 模拟运动相邻关节的相位差
const MOCK_JOINT_OFFSET: f64 = 0.5;
/// 模拟运动幅度（度）
const MOCK_AMPLITUDE_DEG: f64 = 25.0;

/// 遥测快照
///
/// 不可变；新快照整体替换旧快照。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// 关节角度（度，保留两位小数）
    pub angles_deg: JointReadings,
    /// 关节角度（弧度）
    pub angles_rad: JointReadings,
    pub error_code: Option<i64>,
    pub raw: Option<String>,
    /// Unix 秒
    pub timestamp: Option<f64>,
    pub serial_mock: bool,
    pub mode: ControlMode,
}

impl TelemetrySnapshot {
    /// 服务启动前的快照：全部未知
    pub fn initial() -> Self {
        Self {
            angles_deg: [None; JOINT_COUNT],
            angles_rad: [None; JOINT_COUNT],
            error_code: None,
            raw: None,
            timestamp: None,
            serial_mock: true,
            mode: ControlMode::Simulation,
        }
    }

    /// 由控制板状态报文构造
    pub fn from_report(report: &StatusReport, mode: ControlMode) -> Self {
        let degrees = report.angles_deg.map(round2);
        Self {
            angles_deg: degrees.map(Some),
            angles_rad: degrees.map(|d| Some(deg_to_rad(d))),
            error_code: Some(report.error_code),
            raw: Some(report.raw.clone()),
            timestamp: Some(report.timestamp),
            serial_mock: report.is_mock,
            mode,
        }
    }

    /// 按相位生成模拟快照
    pub fn synthetic(phase: f64, mode: ControlMode) -> Self {
        let degrees: [f64; JOINT_COUNT] = std::array::from_fn(|i| {
            round2((phase + i as f64 * MOCK_JOINT_OFFSET).sin() * MOCK_AMPLITUDE_DEG)
        });
        Self {
            angles_deg: degrees.map(Some),
            angles_rad: degrees.map(|d| Some(deg_to_rad(d))),
            error_code: Some(0),
            raw: Some("mock".to_string()),
            timestamp: Some(unix_timestamp()),
            serial_mock: true,
            mode,
        }
    }

    /// 是否已有关节读数
    pub fn has_angles(&self) -> bool {
        self.angles_deg.iter().any(Option::is_some)
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// 遥测配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// 采样周期
    pub period: Duration,
    /// `stop()` 等待后台线程退出的时限
    pub join_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            join_timeout: Duration::from_secs(2),
        }
    }
}

impl TelemetryConfig {
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }
}

/// 服务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TelemetryState {
    Idle = 0,
    Running = 1,
    Cancelled = 2,
    Stopped = 3,
}

impl TelemetryState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Cancelled,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for TelemetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Cancelled => "cancelled",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// 遥测统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryStats {
    /// 采样周期数
    pub ticks: u64,
    /// 快照更新次数
    pub updates: u64,
    /// 串口读取失败次数
    pub read_misses: u64,
    /// 因推送失败被移除的 sink 数
    pub dropped_sinks: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    ticks: AtomicU64,
    updates: AtomicU64,
    read_misses: AtomicU64,
    dropped_sinks: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> TelemetryStats {
        TelemetryStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            read_misses: self.read_misses.load(Ordering::Relaxed),
            dropped_sinks: self.dropped_sinks.load(Ordering::Relaxed),
        }
    }
}

/// 后台线程与服务句柄共享的状态
struct Shared {
    context: Arc<ArmContext>,
    snapshot: ArcSwap<TelemetrySnapshot>,
    registry: Mutex<ObserverRegistry>,
    stats: StatsCounters,
    state: AtomicU8,
}

impl Shared {
    fn state(&self) -> TelemetryState {
        TelemetryState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TelemetryState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// 单个采样周期
    fn tick(&self, phase: &mut f64) {
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);
        let mode = self.context.mode();

        let snapshot = match self.context.transport() {
            Some(transport) if mode.is_physical() && !transport.is_mock() => {
                match transport.read_status() {
                    Some(report) => {
                        let mut snapshot = TelemetrySnapshot::from_report(&report, mode);
                        snapshot.serial_mock = false;
                        snapshot
                    },
                    None => {
                        self.stats.read_misses.fetch_add(1, Ordering::Relaxed);
                        trace!("Telemetry: no status line this tick");
                        return;
                    },
                }
            },
            _ => {
                *phase += MOCK_PHASE_STEP;
                TelemetrySnapshot::synthetic(*phase, mode)
            },
        };

        self.publish(snapshot);
    }

    /// 替换快照并广播，广播后移除失效的 sink
    fn publish(&self, snapshot: TelemetrySnapshot) {
        let snapshot = Arc::new(snapshot);
        self.snapshot.store(snapshot.clone());
        self.stats.updates.fetch_add(1, Ordering::Relaxed);

        let mut registry = self.registry.lock();
        let failed = registry.broadcast(&snapshot);
        if !failed.is_empty() {
            let removed = registry.remove_all(&failed);
            self.stats
                .dropped_sinks
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(
                "Telemetry: removed {} stale subscriber(s), {} remaining",
                removed,
                registry.len()
            );
        }
    }
}

/// 在时限内等待遥测线程退出
///
/// `JoinHandle::join` 本身不支持超时，这里由一个看门狗线程代为 join，
/// 调用方只在通道上等待 `timeout`。超时后看门狗线程继续等待，不再有人接收结果。
fn join_worker(handle: JoinHandle<()>, timeout: Duration) -> Result<(), DriverError> {
    let (done_tx, done_rx) = bounded(1);
    thread::spawn(move || {
        // 接收方可能已超时返回
        let _ = done_tx.send(handle.join().is_ok());
    });

    match done_rx.recv_timeout(timeout) {
        Ok(true) => Ok(()),
        Ok(false) | Err(RecvTimeoutError::Disconnected) => Err(DriverError::WorkerPanicked),
        Err(RecvTimeoutError::Timeout) => Err(DriverError::JoinTimeout(timeout)),
    }
}

/// 遥测服务
///
/// 持有规范快照和观察者注册表。所有方法都只需要 `&self`，
/// 可以放在 `Arc` 中由多个连接共享。
///
/// # 示例
///
/// ```rust
/// use armctl_driver::{ArmContext, ChannelSink, TelemetryConfig, TelemetryService};
/// use armctl_protocol::ControlMode;
/// use armctl_serial::SerialConfig;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let context = Arc::new(ArmContext::from_config(SerialConfig::default(), ControlMode::Simulation));
/// let service = TelemetryService::new(context, TelemetryConfig::with_period(Duration::from_millis(10)));
///
/// let (sink, rx) = ChannelSink::new(16);
/// service.subscribe(Arc::new(sink)).unwrap();
/// service.start().unwrap();
///
/// let first = rx.recv().unwrap();
/// assert!(first.serial_mock);
/// service.stop().unwrap();
/// ```
pub struct TelemetryService {
    shared: Arc<Shared>,
    config: TelemetryConfig,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for TelemetryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryService")
            .field("state", &self.state())
            .field("period", &self.config.period)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl TelemetryService {
    pub fn new(context: Arc<ArmContext>, config: TelemetryConfig) -> Self {
        let mut initial = TelemetrySnapshot::initial();
        initial.mode = context.mode();
        Self {
            shared: Arc::new(Shared {
                context,
                snapshot: ArcSwap::from_pointee(initial),
                registry: Mutex::new(ObserverRegistry::new()),
                stats: StatsCounters::default(),
                state: AtomicU8::new(TelemetryState::Idle as u8),
            }),
            config,
            shutdown_tx: Mutex::new(None),
            worker: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn state(&self) -> TelemetryState {
        self.shared.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == TelemetryState::Running
    }

    /// 启动后台采样线程
    ///
    /// 每个服务只能启动一次；停止后不能重启。
    pub fn start(&self) -> Result<(), DriverError> {
        let mut worker = self.worker.lock();
        match self.shared.state() {
            TelemetryState::Idle => {},
            TelemetryState::Running => return Err(DriverError::AlreadyRunning),
            TelemetryState::Cancelled | TelemetryState::Stopped => {
                return Err(DriverError::AlreadyStopped);
            },
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let shared = self.shared.clone();
        let period = self.config.period;

        self.shared.set_state(TelemetryState::Running);
        let handle = thread::Builder::new()
            .name("armctl-telemetry".to_string())
            .spawn(move || telemetry_loop(shared, shutdown_rx, period))
            .inspect_err(|_| self.shared.set_state(TelemetryState::Idle))?;

        *worker = Some(handle);
        *self.shutdown_tx.lock() = Some(shutdown_tx);
        info!("Telemetry service started (period {:?})", period);
        Ok(())
    }

    /// 停止后台线程并等待其退出
    ///
    /// 可重复调用；未启动的服务直接进入 `Stopped`。
    pub fn stop(&self) -> Result<(), DriverError> {
        let mut worker = self.worker.lock();
        match self.shared.state() {
            TelemetryState::Stopped => return Ok(()),
            TelemetryState::Idle => {
                self.shared.set_state(TelemetryState::Stopped);
                return Ok(());
            },
            TelemetryState::Running | TelemetryState::Cancelled => {},
        }

        self.shared.set_state(TelemetryState::Cancelled);
        // 发送信号并 drop Sender，后台线程在等待点退出
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.try_send(());
        }

        let mut result = Ok(());
        if let Some(handle) = worker.take()
            && let Err(e) = join_worker(handle, self.config.join_timeout)
        {
            error!("Telemetry thread did not exit cleanly: {}", e);
            result = Err(e);
        }

        self.shared.set_state(TelemetryState::Stopped);
        info!("Telemetry service stopped");
        result
    }

    /// 注册观察者
    ///
    /// 先推送当前快照，成功后再注册；首次推送失败则不注册。
    pub fn subscribe(&self, sink: Arc<dyn TelemetrySink>) -> Result<SubscriberId, SinkError> {
        let mut registry = self.shared.registry.lock();
        let current = self.shared.snapshot.load_full();
        match sink.push(&current) {
            Ok(()) | Err(SinkError::Full) => {},
            Err(e) => {
                warn!("Telemetry subscriber rejected initial snapshot: {}", e);
                return Err(e);
            },
        }
        let id = registry.add(sink);
        debug!("Telemetry subscriber {} added ({} total)", id, registry.len());
        Ok(id)
    }

    /// 注销观察者，返回是否存在
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.shared.registry.lock().remove(id);
        if removed {
            debug!("Telemetry subscriber {} removed", id);
        }
        removed
    }

    /// 当前规范快照
    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        self.shared.snapshot.load_full()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.lock().len()
    }

    pub fn stats(&self) -> TelemetryStats {
        self.shared.stats.snapshot()
    }

    /// 立即执行一个采样周期（不启动后台线程）
    ///
    /// 供 CLI 单次读取与测试使用；`phase` 由调用方持有。
    pub fn sample_once(&self, phase: &mut f64) -> Arc<TelemetrySnapshot> {
        self.shared.tick(phase);
        self.latest()
    }
}

impl Drop for TelemetryService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Telemetry service did not stop cleanly: {}", e);
        }
    }
}

/// 后台采样循环
///
/// 先采样再等待；截止时间按固定周期推进，落后时不补发。
fn telemetry_loop(shared: Arc<Shared>, shutdown_rx: Receiver<()>, period: Duration) {
    let mut phase = 0.0;
    let mut deadline = Instant::now();

    loop {
        shared.tick(&mut phase);

        deadline += period;
        let now = Instant::now();
        if deadline < now {
            deadline = now;
        }

        match shutdown_rx.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    trace!("Telemetry loop exited after {} ticks", shared.stats.ticks.load(Ordering::Relaxed));
}
