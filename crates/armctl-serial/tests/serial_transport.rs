//! SerialTransport 集成测试
//!
//! 使用内存端口替代真实串口，验证握手、懒重连、急停和行组帧。

use armctl_protocol::RotateMode;
use armctl_serial::{LinkState, PortIo, SerialConfig, SerialTransport, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 内存端口共享状态
#[derive(Default)]
struct FakeWire {
    written: Vec<u8>,
    incoming: VecDeque<Vec<u8>>,
    output_clears: usize,
    input_clears: usize,
    broken: bool,
}

impl FakeWire {
    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .split_terminator('\n')
            .map(str::to_string)
            .collect()
    }
}

struct FakePort {
    wire: Arc<Mutex<FakeWire>>,
}

impl Read for FakePort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut wire = self.wire.lock();
        match wire.incoming.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    wire.incoming.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            },
            None => Err(io::Error::from(io::ErrorKind::TimedOut)),
        }
    }
}

impl Write for FakePort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut wire = self.wire.lock();
        if wire.broken {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        wire.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PortIo for FakePort {
    fn clear_output(&mut self) -> io::Result<()> {
        self.wire.lock().output_clears += 1;
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        let mut wire = self.wire.lock();
        wire.input_clears += 1;
        wire.incoming.clear();
        Ok(())
    }
}

struct Harness {
    transport: SerialTransport,
    wire: Arc<Mutex<FakeWire>>,
    opens: Arc<AtomicUsize>,
}

/// 前 `failures` 次打开失败
fn harness(config: SerialConfig, failures: usize) -> Harness {
    let wire = Arc::new(Mutex::new(FakeWire::default()));
    let opens = Arc::new(AtomicUsize::new(0));

    let opener_wire = wire.clone();
    let opener_opens = opens.clone();
    let transport = SerialTransport::with_opener(config, move |cfg: &SerialConfig| {
        let attempt = opener_opens.fetch_add(1, Ordering::SeqCst);
        if attempt < failures {
            return Err(TransportError::Open {
                port: cfg.port.clone(),
                message: "no such device".to_string(),
            });
        }
        opener_wire.lock().broken = false;
        Ok(Box::new(FakePort {
            wire: opener_wire.clone(),
        }) as Box<dyn PortIo>)
    });

    Harness {
        transport,
        wire,
        opens,
    }
}

fn enabled_config() -> SerialConfig {
    SerialConfig {
        enabled: true,
        port: "/dev/ttyFAKE0".to_string(),
        timeout_ms: 1000,
        ..SerialConfig::default()
    }
}

#[test]
fn test_connect_sends_handshake_once() {
    let h = harness(enabled_config(), 0);
    assert_eq!(h.transport.link_state(), LinkState::Disconnected);
    assert!(!h.transport.is_mock());

    assert!(h.transport.connect());
    assert!(h.transport.connect());
    assert_eq!(h.transport.link_state(), LinkState::Connected);
    assert_eq!(h.opens.load(Ordering::SeqCst), 1);
    assert_eq!(h.wire.lock().lines(), vec!["remote_enable"]);
}

#[test]
fn test_no_handshake_when_disabled() {
    let config = SerialConfig {
        handshake: None,
        ..enabled_config()
    };
    let h = harness(config, 0);
    assert!(h.transport.send_command("RESET"));
    h.transport.close();
    assert_eq!(h.wire.lock().lines(), vec!["RESET"]);
}

#[test]
fn test_lazy_reconnect_after_open_failure() {
    let h = harness(enabled_config(), 1);
    assert!(!h.transport.connect());
    assert_eq!(h.transport.link_state(), LinkState::Disconnected);

    // 下一次发送时重新打开
    assert!(h.transport.send_command("PUMP_ON"));
    assert_eq!(h.opens.load(Ordering::SeqCst), 2);
    assert_eq!(h.wire.lock().lines(), vec!["remote_enable", "PUMP_ON"]);
}

#[test]
fn test_broken_link_is_dropped_and_reopened() {
    let h = harness(enabled_config(), 0);
    assert!(h.transport.connect());

    h.wire.lock().broken = true;
    assert!(!h.transport.send_command("LED_OFF"));
    assert_eq!(h.transport.link_state(), LinkState::Disconnected);

    assert!(h.transport.send_command("LED_OFF"));
    assert_eq!(h.opens.load(Ordering::SeqCst), 2);
}

#[test]
fn test_command_framing() {
    let config = SerialConfig {
        newline: "\r\n".to_string(),
        ..enabled_config()
    };
    let h = harness(config, 0);
    assert!(h.transport.send_command("SERVO 3 90.00\n"));
    let written = String::from_utf8(h.wire.lock().written.clone()).unwrap();
    assert_eq!(written, "remote_enable\r\nSERVO 3 90.00\r\n");
}

#[test]
fn test_joint_angles_validated_before_write() {
    let h = harness(enabled_config(), 0);
    let angles = [Some(10.0), Some(120.0), None, None, None, None];
    assert!(!h.transport.send_joint_angles(&angles, RotateMode::Abs, true));
    // 校验失败时不会打开端口
    assert_eq!(h.opens.load(Ordering::SeqCst), 0);

    let angles = [Some(10.0), None, Some(-45.5), None, None, None];
    assert!(h.transport.send_joint_angles(&angles, RotateMode::Abs, true));
    assert_eq!(
        h.wire.lock().lines(),
        vec![
            "remote_enable",
            "abs_rotate 1 10.00 0 0 0 0",
            "abs_rotate 3 -45.50 0 0 0 0",
        ]
    );
}

#[test]
fn test_peripheral_ranges_never_reach_wire() {
    let h = harness(enabled_config(), 0);
    assert!(!h.transport.send_pump_pwm(256));
    assert!(!h.transport.send_servo(11, 0.0));
    assert_eq!(h.opens.load(Ordering::SeqCst), 0);

    assert!(h.transport.send_pump_pwm(200));
    assert!(h.transport.send_led(true, Some("G")));
    assert_eq!(
        h.wire.lock().lines(),
        vec!["remote_enable", "PUMP_PWM 200", "LED_ON G"]
    );
}

#[test]
fn test_emergency_stop_clears_output_first() {
    let h = harness(enabled_config(), 0);
    // 未连接时急停不会懒重连
    assert!(!h.transport.send_emergency_stop());
    assert_eq!(h.opens.load(Ordering::SeqCst), 0);

    assert!(h.transport.connect());
    assert!(h.transport.send_emergency_stop());
    let wire = h.wire.lock();
    assert_eq!(wire.output_clears, 1);
    assert_eq!(wire.lines().last().map(String::as_str), Some("ESTOP"));
}

#[test]
fn test_close_sends_remote_disable() {
    let h = harness(enabled_config(), 0);
    assert!(h.transport.connect());
    h.transport.close();
    assert_eq!(h.transport.link_state(), LinkState::Disconnected);
    assert_eq!(h.wire.lock().lines(), vec!["remote_enable", "remote_disable"]);

    // 重复关闭无副作用
    h.transport.close();
    assert_eq!(h.wire.lock().lines().len(), 2);
}

#[test]
fn test_read_status_across_chunks() {
    let h = harness(enabled_config(), 0);
    assert!(h.transport.connect());
    {
        let mut wire = h.wire.lock();
        wire.incoming.push_back(b"STATUS,0,45.5,-30".to_vec());
        wire.incoming.push_back(b",90,0,10,7\r\nSTATUS,1,2".to_vec());
    }

    // 每次调用只读一块，第一块没有换行
    assert!(h.transport.read_status().is_none());
    let report = h.transport.read_status().unwrap();
    assert_eq!(report.angles_deg, [0.0, 45.5, -30.0, 90.0, 0.0, 10.0]);
    assert_eq!(report.error_code, 7);
    assert!(!report.is_mock);

    // 不完整的行保留到下一次读取
    assert!(h.transport.read_status().is_none());
    h.wire.lock().incoming.push_back(b",3,4,5,6,0\n".to_vec());
    let report = h.transport.read_status().unwrap();
    assert_eq!(report.angles_deg, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_read_line_takes_one_chunk_per_call() {
    let h = harness(enabled_config(), 0);
    assert!(h.transport.connect());
    {
        let mut wire = h.wire.lock();
        wire.incoming.push_back(b"STA".to_vec());
        wire.incoming.push_back(b"TUS,1".to_vec());
        wire.incoming.push_back(b",2,3,4,5,6,0\nOK\n".to_vec());
    }

    assert!(h.transport.read_line().is_none());
    assert_eq!(h.wire.lock().incoming.len(), 2);
    assert!(h.transport.read_line().is_none());
    assert_eq!(h.wire.lock().incoming.len(), 1);

    assert_eq!(h.transport.read_line().as_deref(), Some("STATUS,1,2,3,4,5,6,0"));
    // 已缓冲的行不再触发端口读取
    h.wire.lock().incoming.push_back(b"late\n".to_vec());
    assert_eq!(h.transport.read_line().as_deref(), Some("OK"));
    assert_eq!(h.wire.lock().incoming.len(), 1);
}

#[test]
fn test_garbage_lines_are_discarded() {
    let h = harness(enabled_config(), 0);
    assert!(h.transport.connect());
    h.wire
        .lock()
        .incoming
        .push_back(b"OK\nSTATUS,1,2,3\n\xff\xfe\n".to_vec());

    assert!(h.transport.read_status().is_none());
    assert!(h.transport.read_status().is_none());
    assert_eq!(h.transport.read_line().as_deref(), Some("\u{fffd}\u{fffd}"));
    assert!(h.transport.read_line().is_none());
    // 读超时不断开链路
    assert_eq!(h.transport.link_state(), LinkState::Connected);
}

#[test]
fn test_flush_input_drops_pending() {
    let h = harness(enabled_config(), 0);
    assert!(!h.transport.flush_input());
    assert!(h.transport.connect());
    h.wire.lock().incoming.push_back(b"STATUS,1".to_vec());
    assert!(h.transport.read_line().is_none());

    assert!(h.transport.flush_input());
    h.wire.lock().incoming.push_back(b",2,3,4,5,6,0\n".to_vec());
    // 前半行已被丢弃
    assert!(h.transport.read_status().is_none());
    assert_eq!(h.wire.lock().input_clears, 1);
}
