//! 传输 trait
//!
//! 实现者只需提供底层的连接、文本行收发与急停；关节指令、外设指令和
//! 状态解析由默认方法在 [`Transport::send_command`] / [`Transport::read_line`] 之上构建。

use armctl_protocol::{ArmCommand, JointLimits, RotateMode, StatusReport};
use tracing::{debug, error};

/// 链路状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// 模拟传输，没有真实设备
    Mock,
    /// 串口已打开
    Connected,
    /// 串口未打开（下次发送时懒重连）
    Disconnected,
}

impl LinkState {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkState::Mock => "mock",
            LinkState::Connected => "connected",
            LinkState::Disconnected => "disconnected",
        }
    }
}

/// 控制板传输接口
///
/// 所有方法都可以跨线程并发调用，实现内部负责加锁。
/// 失败只记录日志并返回 `false` / `None`。
pub trait Transport: Send + Sync {
    /// 建立连接（幂等）
    fn connect(&self) -> bool;

    /// 关闭连接；配置了握手时先发送 `remote_disable`
    fn close(&self);

    fn link_state(&self) -> LinkState;

    fn is_mock(&self) -> bool {
        self.link_state() == LinkState::Mock
    }

    /// 发送一行原始指令（自动补齐行终止符）
    fn send_command(&self, command: &str) -> bool;

    /// 读取一行（已去除首尾空白）；无数据或出错返回 `None`
    fn read_line(&self) -> Option<String>;

    /// 急停：优先发送，不排队，不懒重连
    fn send_emergency_stop(&self) -> bool;

    fn flush_input(&self) -> bool {
        true
    }

    fn flush_output(&self) -> bool {
        true
    }

    /// 读取并解析一条 `STATUS` 报文
    fn read_status(&self) -> Option<StatusReport> {
        let line = self.read_line()?;
        match StatusReport::parse(&line) {
            Ok(report) => Some(report),
            Err(e) => {
                debug!("Discarding serial line {:?}: {}", line, e);
                None
            },
        }
    }

    fn send(&self, command: &ArmCommand) -> bool {
        self.send_command(&command.to_string())
    }

    /// 逐关节发送旋转指令
    ///
    /// `Abs` 模式且 `validate_limits` 为真时先做限位校验，失败则一条都不发。
    /// 未知关节（`None`）跳过。全部发送成功才返回 `true`。
    fn send_joint_angles(
        &self,
        angles: &[Option<f64>],
        mode: RotateMode,
        validate_limits: bool,
    ) -> bool {
        if validate_limits
            && mode == RotateMode::Abs
            && let Err(e) = JointLimits::DEFAULT.validate(angles)
        {
            error!("Joint limit validation failed: {}", e);
            return false;
        }

        // 不短路：一条失败后仍尝试发送剩余关节
        let mut success = true;
        for command in ArmCommand::rotations(angles, mode) {
            success &= self.send(&command);
        }
        success
    }

    /// 末端笛卡尔移动（米）
    fn send_end_effector(&self, x: f64, y: f64, z: f64) -> bool {
        self.send(&ArmCommand::EndEffector { x, y, z })
    }

    /// 末端速度遥控
    fn send_remote_velocity(&self, vx: f64, vy: f64, vz: f64) -> bool {
        self.send(&ArmCommand::RemoteVelocity { vx, vy, vz })
    }

    fn send_pump(&self, on: bool) -> bool {
        self.send(&ArmCommand::Pump(on))
    }

    /// 吸泵强度，占空比越界（0-255）时不发送
    fn send_pump_pwm(&self, duty_cycle: i32) -> bool {
        match ArmCommand::pump_pwm(duty_cycle) {
            Ok(command) => self.send(&command),
            Err(e) => {
                error!("{}", e);
                false
            },
        }
    }

    fn send_led(&self, on: bool, color: Option<&str>) -> bool {
        self.send(&ArmCommand::led(on, color))
    }

    /// 辅助舵机，编号越界（1-10）时不发送
    fn send_servo(&self, servo_id: i32, angle: f64) -> bool {
        match ArmCommand::servo(servo_id, angle) {
            Ok(command) => self.send(&command),
            Err(e) => {
                error!("{}", e);
                false
            },
        }
    }

    fn send_reset_controller(&self) -> bool {
        self.send(&ArmCommand::Reset)
    }
}
