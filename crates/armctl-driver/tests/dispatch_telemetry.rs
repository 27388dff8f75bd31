//! 分发与遥测集成测试
//!
//! 用可观测的 Spy 传输验证：
//! 1. 仿真模式不写串口
//! 2. 限位失败的指令不会到达传输层
//! 3. 遥测服务周期推送，失效的观察者被移除
//! 4. 实体模式下读取串口状态，读取失败保留上一快照

use armctl_driver::{
    ArmBuilder, ChannelSink, DispatchResult, SinkError, TelemetrySink, TelemetrySnapshot,
    TelemetryState,
};
use armctl_protocol::ControlMode;
use armctl_serial::{LinkState, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Spy 传输：记录写入，按队列返回读取行
struct SpyTransport {
    mock: bool,
    writes: Mutex<Vec<String>>,
    lines: Mutex<VecDeque<String>>,
    reads: AtomicU64,
}

impl SpyTransport {
    fn new(mock: bool) -> Arc<Self> {
        Arc::new(Self {
            mock,
            writes: Mutex::new(Vec::new()),
            lines: Mutex::new(VecDeque::new()),
            reads: AtomicU64::new(0),
        })
    }

    fn queue_line(&self, line: &str) {
        self.lines.lock().push_back(line.to_string());
    }

    fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }
}

impl Transport for SpyTransport {
    fn connect(&self) -> bool {
        true
    }

    fn close(&self) {}

    fn link_state(&self) -> LinkState {
        if self.mock {
            LinkState::Mock
        } else {
            LinkState::Connected
        }
    }

    fn send_command(&self, command: &str) -> bool {
        self.writes.lock().push(command.to_string());
        true
    }

    fn read_line(&self) -> Option<String> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.lines.lock().pop_front()
    }

    fn send_emergency_stop(&self) -> bool {
        self.send_command("ESTOP")
    }
}

/// 第 N 次推送开始失败的观察者
struct FlakySink {
    pushes: AtomicU64,
    fail_after: u64,
}

impl TelemetrySink for FlakySink {
    fn push(&self, _snapshot: &TelemetrySnapshot) -> Result<(), SinkError> {
        let n = self.pushes.fetch_add(1, Ordering::Relaxed) + 1;
        if n > self.fail_after {
            Err(SinkError::Io("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_simulation_mode_never_writes() {
    let spy = SpyTransport::new(false);
    let arm = ArmBuilder::new()
        .transport(spy.clone())
        .mode(ControlMode::Simulation)
        .build();

    for _ in 0..10 {
        let result = arm.router().dispatch(&[10.0, 20.0, 30.0, 0.0, 0.0, 0.0], "test");
        assert!(!result.serial_sent);
        assert!(!result.validation_failed);
    }
    assert!(spy.writes().is_empty());
}

#[test]
fn test_physical_mode_writes_each_joint() {
    let spy = SpyTransport::new(false);
    let arm = ArmBuilder::new()
        .transport(spy.clone())
        .mode(ControlMode::Physical)
        .build();

    let result = arm.router().dispatch(&[0.0, 45.456, -30.0, 90.0, 0.0, 10.0], "api");
    assert_eq!(
        result,
        DispatchResult {
            mode: ControlMode::Physical,
            source: "api".to_string(),
            angles: vec![0.0, 45.456, -30.0, 90.0, 0.0, 10.0],
            serial_sent: true,
            serial_mock: false,
            validation_failed: false,
            error: None,
        }
    );
    assert_eq!(
        spy.writes(),
        vec![
            "abs_rotate 1 0.00 0 0 0 0",
            "abs_rotate 2 45.46 0 0 0 0",
            "abs_rotate 3 -30.00 0 0 0 0",
            "abs_rotate 4 90.00 0 0 0 0",
            "abs_rotate 5 0.00 0 0 0 0",
            "abs_rotate 6 10.00 0 0 0 0",
        ]
    );
}

#[test]
fn test_invalid_angles_never_reach_transport() {
    let spy = SpyTransport::new(false);
    let arm = ArmBuilder::new()
        .transport(spy.clone())
        .mode(ControlMode::Physical)
        .build();

    let cases: [&[f64]; 4] = [
        &[0.0, 95.0, 0.0, 0.0, 0.0, 0.0],
        &[0.0, 0.0, 0.0, 0.0, 0.0, -200.0],
        &[0.0, 0.0, f64::NAN, 0.0, 0.0, 0.0],
        &[0.0, 0.0, 0.0],
    ];
    for angles in cases {
        let result = arm.router().dispatch(angles, "test");
        assert!(result.validation_failed, "{:?}", angles);
        assert!(!result.serial_sent);
        assert!(result.serial_mock);
        assert!(result.error.is_some());
    }
    assert!(spy.writes().is_empty());
}

#[test]
fn test_mode_switch_takes_effect_on_next_dispatch() {
    let spy = SpyTransport::new(false);
    let arm = ArmBuilder::new().transport(spy.clone()).build();

    arm.router().dispatch(&[0.0; 6], "test");
    assert!(spy.writes().is_empty());

    arm.context().set_mode_str("physical").unwrap();
    arm.router().dispatch(&[0.0; 6], "test");
    assert_eq!(spy.writes().len(), 6);
}

#[test]
fn test_mock_telemetry_is_periodic_and_bounded() {
    let arm = ArmBuilder::new()
        .transport(SpyTransport::new(true))
        .mode(ControlMode::Physical)
        .telemetry_period(Duration::from_millis(10))
        .build();

    let (sink, rx) = ChannelSink::new(64);
    arm.telemetry().subscribe(Arc::new(sink)).unwrap();
    arm.start_telemetry().unwrap();

    let initial = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert!(!initial.has_angles());

    let mut updates = Vec::new();
    while updates.len() < 5 {
        updates.push(rx.recv_timeout(Duration::from_secs(1)).unwrap());
    }
    arm.telemetry().stop().unwrap();

    for snapshot in &updates {
        assert!(snapshot.serial_mock);
        assert_eq!(snapshot.raw.as_deref(), Some("mock"));
        for angle in snapshot.angles_deg.iter().flatten() {
            assert!(angle.abs() <= 25.0);
        }
    }
    // 相位每个周期推进，相邻快照不同
    assert_ne!(updates[0].angles_deg, updates[1].angles_deg);
}

#[test]
fn test_physical_telemetry_reads_status() {
    let spy = SpyTransport::new(false);
    spy.queue_line("STATUS,0,45.5,-30,90,0,10,7");
    let arm = ArmBuilder::new()
        .transport(spy.clone())
        .mode(ControlMode::Physical)
        .build();

    let mut phase = 0.0;
    let snapshot = arm.telemetry().sample_once(&mut phase);
    assert_eq!(
        snapshot.angles_deg,
        [Some(0.0), Some(45.5), Some(-30.0), Some(90.0), Some(0.0), Some(10.0)]
    );
    assert_eq!(snapshot.error_code, Some(7));
    assert!(!snapshot.serial_mock);
    assert_eq!(snapshot.raw.as_deref(), Some("STATUS,0,45.5,-30,90,0,10,7"));

    // 无数据：保留上一快照
    let again = arm.telemetry().sample_once(&mut phase);
    assert_eq!(again, snapshot);
    assert_eq!(arm.telemetry().stats().read_misses, 1);

    // 垃圾行同样被丢弃
    spy.queue_line("OK");
    let again = arm.telemetry().sample_once(&mut phase);
    assert_eq!(again, snapshot);
    assert_eq!(phase, 0.0);
}

#[test]
fn test_failing_sink_is_removed() {
    let arm = ArmBuilder::new()
        .transport(SpyTransport::new(true))
        .telemetry_period(Duration::from_millis(5))
        .build();

    let flaky = Arc::new(FlakySink {
        pushes: AtomicU64::new(0),
        fail_after: 3,
    });
    let (healthy, rx) = ChannelSink::new(256);
    arm.telemetry().subscribe(flaky.clone()).unwrap();
    arm.telemetry().subscribe(Arc::new(healthy)).unwrap();
    arm.start_telemetry().unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        arm.telemetry().subscriber_count() == 1
    }));
    arm.telemetry().stop().unwrap();

    // 初始快照 + 2 次成功 + 1 次失败
    assert_eq!(flaky.pushes.load(Ordering::Relaxed), 4);
    assert_eq!(arm.telemetry().stats().dropped_sinks, 1);
    assert!(rx.try_iter().count() >= 4);
}

#[test]
fn test_stop_joins_and_freezes_snapshot() {
    let arm = ArmBuilder::new()
        .telemetry_period(Duration::from_millis(5))
        .build();
    arm.start_telemetry().unwrap();
    assert!(wait_until(Duration::from_secs(2), || {
        arm.telemetry().stats().updates >= 3
    }));

    let started = Instant::now();
    arm.telemetry().stop().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(arm.telemetry().state(), TelemetryState::Stopped);

    let frozen = arm.telemetry().latest();
    let ticks = arm.telemetry().stats().ticks;
    thread::sleep(Duration::from_millis(30));
    assert_eq!(arm.telemetry().latest(), frozen);
    assert_eq!(arm.telemetry().stats().ticks, ticks);
}
