//! Mock 传输
//!
//! 没有真实设备时使用：所有发送都成功，状态回读返回全零。

use crate::transport::{LinkState, Transport};
use armctl_protocol::{StatusReport, frame_line};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Mock 传输
///
/// 记录发送次数和最后一条指令，便于上层观察。
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: AtomicU64,
    last_command: Mutex<Option<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已"发送"的指令条数（含急停）
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// 最后一条指令（不含行终止符）
    pub fn last_command(&self) -> Option<String> {
        self.last_command.lock().clone()
    }

    fn record(&self, command: &str) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        *self.last_command.lock() = Some(command.to_string());
    }
}

impl Transport for MockTransport {
    fn connect(&self) -> bool {
        true
    }

    fn close(&self) {
        info!("Mock transport closed");
    }

    fn link_state(&self) -> LinkState {
        LinkState::Mock
    }

    fn send_command(&self, command: &str) -> bool {
        let line = frame_line(command, "\n");
        let body = line.trim_end();
        debug!("[MOCK] -> {}", body);
        self.record(body);
        true
    }

    fn read_line(&self) -> Option<String> {
        None
    }

    fn read_status(&self) -> Option<StatusReport> {
        Some(StatusReport::synthetic_zero())
    }

    fn send_emergency_stop(&self) -> bool {
        warn!("[MOCK] Emergency stop triggered");
        self.record("ESTOP");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armctl_protocol::RotateMode;

    #[test]
    fn test_mock_accepts_everything() {
        let mock = MockTransport::new();
        assert!(mock.is_mock());
        assert!(mock.connect());
        assert!(mock.send_command("abs_rotate 1 0.00 0 0 0 0\r\n"));
        assert_eq!(mock.last_command().as_deref(), Some("abs_rotate 1 0.00 0 0 0 0"));
        assert!(mock.send_pump(true));
        assert!(mock.send_emergency_stop());
        assert_eq!(mock.sent_count(), 3);
    }

    #[test]
    fn test_mock_status_is_zero() {
        let status = MockTransport::new().read_status().unwrap();
        assert_eq!(status.angles_deg, [0.0; 6]);
        assert_eq!(status.error_code, 0);
        assert!(status.is_mock);
    }

    #[test]
    fn test_mock_still_checks_ranges() {
        let mock = MockTransport::new();
        assert!(!mock.send_pump_pwm(300));
        assert!(!mock.send_servo(0, 10.0));
        assert!(
            !mock.send_joint_angles(&[Some(200.0), None, None, None, None, None], RotateMode::Abs, true)
        );
        assert_eq!(mock.sent_count(), 0);

        // 相对模式不做限位校验
        assert!(mock.send_joint_angles(&[Some(200.0), None, None, None, None, None], RotateMode::Rel, true));
        assert_eq!(mock.last_command().as_deref(), Some("rel_rotate 1 200.00 0 0 0 0"));
    }
}
