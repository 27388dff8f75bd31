//! 下行指令构建
//!
//! 控制板接收 ASCII 文本行。这里集中所有指令的文本格式，
//! 传输层只负责追加行终止符并写出。

use crate::error::ProtocolError;
use crate::joint::AngleSlot;
use std::fmt;
use std::str::FromStr;

/// 关节旋转模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotateMode {
    /// 绝对角度（默认，下发前做限位校验）
    #[default]
    Abs,
    /// 相对增量
    Rel,
}

impl RotateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RotateMode::Abs => "abs",
            RotateMode::Rel => "rel",
        }
    }
}

impl FromStr for RotateMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abs" => Ok(RotateMode::Abs),
            "rel" => Ok(RotateMode::Rel),
            _ => Err(ProtocolError::InvalidRotateMode(s.to_string())),
        }
    }
}

/// 控制板指令
///
/// `Display` 输出不含行终止符的指令文本。
#[derive(Debug, Clone, PartialEq)]
pub enum ArmCommand {
    /// 单关节旋转：`abs_rotate <joint> <angle> 0 0 0 0`
    Rotate {
        mode: RotateMode,
        /// 关节编号（1-6）
        joint: usize,
        /// 角度（度）
        angle: f64,
    },
    /// 末端笛卡尔移动：`auto <x> <y> <z>`（米）
    EndEffector { x: f64, y: f64, z: f64 },
    /// 末端速度遥控：`remote_event p0..p5`
    RemoteVelocity { vx: f64, vy: f64, vz: f64 },
    /// 握手：进入远程控制
    RemoteEnable,
    /// 退出远程控制（关闭串口前发送）
    RemoteDisable,
    /// 吸泵开关
    Pump(bool),
    /// 吸泵强度（PWM 占空比 0-255）
    PumpPwm(u8),
    /// 状态灯
    Led { on: bool, color: Option<String> },
    /// 辅助舵机（编号 1-10）
    Servo { id: u8, angle: f64 },
    /// 急停
    EmergencyStop,
    /// 控制器复位
    Reset,
    /// 原始文本
    Raw(String),
}

impl ArmCommand {
    /// 舵机编号上限
    pub const MAX_SERVO_ID: i32 = 10;

    /// 单关节旋转指令，关节编号必须为 1-6
    pub fn rotate(mode: RotateMode, joint: usize, angle: f64) -> Result<Self, ProtocolError> {
        if !(1..=crate::JOINT_COUNT).contains(&joint) {
            return Err(ProtocolError::InvalidJoint(joint));
        }
        Ok(ArmCommand::Rotate { mode, joint, angle })
    }

    /// 为每个已知关节生成一条旋转指令（未知值跳过）
    pub fn rotations<A: AngleSlot>(
        angles: &[A],
        mode: RotateMode,
    ) -> impl Iterator<Item = ArmCommand> + '_ {
        angles.iter().enumerate().filter_map(move |(idx, slot)| {
            slot.angle().map(|angle| ArmCommand::Rotate {
                mode,
                joint: idx + 1,
                angle,
            })
        })
    }

    /// 吸泵 PWM，占空比必须在 0-255
    pub fn pump_pwm(duty_cycle: i32) -> Result<Self, ProtocolError> {
        u8::try_from(duty_cycle)
            .map(ArmCommand::PumpPwm)
            .map_err(|_| ProtocolError::PwmOutOfRange(duty_cycle))
    }

    /// 辅助舵机，编号必须在 1-10
    pub fn servo(id: i32, angle: f64) -> Result<Self, ProtocolError> {
        if !(1..=Self::MAX_SERVO_ID).contains(&id) {
            return Err(ProtocolError::InvalidServoId(id));
        }
        Ok(ArmCommand::Servo {
            id: id as u8,
            angle,
        })
    }

    pub fn led(on: bool, color: Option<&str>) -> Self {
        ArmCommand::Led {
            on,
            color: color.map(str::to_string),
        }
    }
}

impl fmt::Display for ArmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArmCommand::Rotate { mode, joint, angle } => {
                write!(f, "{}_rotate {} {:.2} 0 0 0 0", mode.as_str(), joint, angle)
            },
            ArmCommand::EndEffector { x, y, z } => write!(f, "auto {:.3} {:.3} {:.3}", x, y, z),
            ArmCommand::RemoteVelocity { vx, vy, vz } => write!(
                f,
                "remote_event {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
                -vx, vy, 0.0, 0.0, vz, -vz
            ),
            ArmCommand::RemoteEnable => f.write_str("remote_enable"),
            ArmCommand::RemoteDisable => f.write_str("remote_disable"),
            ArmCommand::Pump(true) => f.write_str("PUMP_ON"),
            ArmCommand::Pump(false) => f.write_str("PUMP_OFF"),
            ArmCommand::PumpPwm(duty) => write!(f, "PUMP_PWM {}", duty),
            ArmCommand::Led { on: true, color } => match color {
                Some(c) => write!(f, "LED_ON {}", c),
                None => f.write_str("LED_ON"),
            },
            ArmCommand::Led { on: false, .. } => f.write_str("LED_OFF"),
            ArmCommand::Servo { id, angle } => write!(f, "SERVO {} {:.2}", id, angle),
            ArmCommand::EmergencyStop => f.write_str("ESTOP"),
            ArmCommand::Reset => f.write_str("RESET"),
            ArmCommand::Raw(text) => f.write_str(text),
        }
    }
}

/// 组帧：去掉末尾的 CR/LF，再追加配置的行终止符
pub fn frame_line(command: &str, newline: &str) -> String {
    let body = command.trim_end_matches(['\r', '\n']);
    let mut line = String::with_capacity(body.len() + newline.len());
    line.push_str(body);
    line.push_str(newline);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_format() {
        let cmd = ArmCommand::rotate(RotateMode::Abs, 2, 45.456).unwrap();
        assert_eq!(cmd.to_string(), "abs_rotate 2 45.46 0 0 0 0");

        let cmd = ArmCommand::rotate(RotateMode::Rel, 6, -3.0).unwrap();
        assert_eq!(cmd.to_string(), "rel_rotate 6 -3.00 0 0 0 0");

        assert_eq!(
            ArmCommand::rotate(RotateMode::Abs, 7, 0.0),
            Err(ProtocolError::InvalidJoint(7))
        );
    }

    #[test]
    fn test_rotations_skip_unknown() {
        let angles = [Some(10.0), None, Some(-5.5), None, None, Some(0.0)];
        let lines: Vec<String> = ArmCommand::rotations(&angles, RotateMode::Abs)
            .map(|c| c.to_string())
            .collect();
        assert_eq!(
            lines,
            vec![
                "abs_rotate 1 10.00 0 0 0 0",
                "abs_rotate 3 -5.50 0 0 0 0",
                "abs_rotate 6 0.00 0 0 0 0",
            ]
        );
    }

    #[test]
    fn test_peripheral_formats() {
        assert_eq!(ArmCommand::Pump(true).to_string(), "PUMP_ON");
        assert_eq!(ArmCommand::Pump(false).to_string(), "PUMP_OFF");
        assert_eq!(ArmCommand::pump_pwm(128).unwrap().to_string(), "PUMP_PWM 128");
        assert_eq!(ArmCommand::led(true, Some("R")).to_string(), "LED_ON R");
        assert_eq!(ArmCommand::led(true, None).to_string(), "LED_ON");
        assert_eq!(ArmCommand::led(false, Some("G")).to_string(), "LED_OFF");
        assert_eq!(ArmCommand::servo(3, 90.0).unwrap().to_string(), "SERVO 3 90.00");
        assert_eq!(ArmCommand::EmergencyStop.to_string(), "ESTOP");
        assert_eq!(ArmCommand::Reset.to_string(), "RESET");
    }

    #[test]
    fn test_range_checks() {
        assert_eq!(ArmCommand::pump_pwm(256), Err(ProtocolError::PwmOutOfRange(256)));
        assert_eq!(ArmCommand::pump_pwm(-1), Err(ProtocolError::PwmOutOfRange(-1)));
        assert!(ArmCommand::pump_pwm(0).is_ok());
        assert!(ArmCommand::pump_pwm(255).is_ok());

        assert_eq!(ArmCommand::servo(0, 0.0), Err(ProtocolError::InvalidServoId(0)));
        assert_eq!(ArmCommand::servo(11, 0.0), Err(ProtocolError::InvalidServoId(11)));
        assert!(ArmCommand::servo(10, 0.0).is_ok());
    }

    #[test]
    fn test_cartesian_formats() {
        let cmd = ArmCommand::EndEffector {
            x: 0.1,
            y: 0.25,
            z: 0.3,
        };
        assert_eq!(cmd.to_string(), "auto 0.100 0.250 0.300");

        let cmd = ArmCommand::RemoteVelocity {
            vx: 1.0,
            vy: 2.0,
            vz: 0.5,
        };
        assert_eq!(
            cmd.to_string(),
            "remote_event -1.00 2.00 0.00 0.00 0.50 -0.50"
        );
    }

    #[test]
    fn test_frame_line() {
        assert_eq!(frame_line("ESTOP", "\n"), "ESTOP\n");
        assert_eq!(frame_line("ESTOP\r\n", "\n"), "ESTOP\n");
        assert_eq!(frame_line("RESET\n", "\r\n"), "RESET\r\n");
    }

    #[test]
    fn test_rotate_mode_parse() {
        assert_eq!("abs".parse::<RotateMode>().unwrap(), RotateMode::Abs);
        assert_eq!("rel".parse::<RotateMode>().unwrap(), RotateMode::Rel);
        assert!("absolute".parse::<RotateMode>().is_err());
    }
}
