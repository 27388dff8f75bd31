//! 移动命令
//!
//! 把 6 个关节角度（度）分发给机械臂，发送前做限位校验

use crate::modes::oneshot::OneShotMode;
use anyhow::{Context, Result};
use armctl_sdk::protocol::{JOINT_COUNT, JointAngles};
use armctl_sdk::{Arm, ControlMode, DispatchResult, JointLimits};
use clap::Args;

/// 分发来源标记
pub const SOURCE_CLI: &str = "cli";

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 目标关节角度（度），逗号分隔
    /// 例如：0,10,20,0,-30,0
    #[arg(short, long, allow_hyphen_values = true)]
    pub joints: String,

    /// 控制模式（覆盖配置）：simulation / physical
    #[arg(short, long)]
    pub mode: Option<ControlMode>,
}

impl MoveCommand {
    /// 解析并校验关节角度
    pub fn parse_joints(&self) -> Result<JointAngles> {
        let angles: Vec<f64> = self
            .joints
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .context("解析关节角度失败")?;

        if angles.len() != JOINT_COUNT {
            anyhow::bail!("需要 {} 个关节角度，实际 {} 个", JOINT_COUNT, angles.len());
        }

        JointLimits::DEFAULT.validate(&angles).context("关节角度超出限位")?;

        let mut joints = [0.0; JOINT_COUNT];
        joints.copy_from_slice(&angles);
        Ok(joints)
    }

    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        let angles = self.parse_joints()?;

        println!("⏳ 正在移动到目标位置...");
        for (i, angle) in angles.iter().enumerate() {
            println!("  J{}: {:.1}° ({:.3} rad)", i + 1, angle, angle.to_radians());
        }

        println!("🔌 装配机械臂...");
        let arm = mode.arm(self.mode);

        let result = with_arm(&arm, |arm| {
            println!("📡 分发关节指令...");
            Ok(arm.router().dispatch(&angles, SOURCE_CLI))
        })?;

        print_dispatch(&result);
        ensure_dispatched(&result)
    }
}

/// 在机械臂上执行一次操作；无论成功与否都停止遥测并关闭传输
pub fn with_arm<T>(arm: &Arm, op: impl FnOnce(&Arm) -> Result<T>) -> Result<T> {
    let outcome = op(arm);
    arm.shutdown()?;
    outcome
}

/// 打印分发结果
pub fn print_dispatch(result: &DispatchResult) {
    let route = if result.serial_sent {
        if result.serial_mock { "Mock 串口" } else { "串口" }
    } else {
        "未发送"
    };
    println!("  模式: {}  来源: {}  通道: {}", result.mode, result.source, route);

    if result.validation_failed {
        println!("❌ 限位校验失败");
    } else if result.serial_sent || result.mode == ControlMode::Simulation {
        println!("✅ 分发完成");
    } else {
        println!("❌ 实体模式下指令未发送到串口");
    }
}

/// 分发未生效时返回错误（限位失败，或实体模式下未发出）
pub fn ensure_dispatched(result: &DispatchResult) -> Result<()> {
    if let Some(error) = &result.error {
        anyhow::bail!("分发失败: {}", error);
    }
    if result.mode == ControlMode::Physical && !result.serial_sent {
        anyhow::bail!("分发失败: 实体模式下关节指令未发送");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use armctl_sdk::{ArmBuilder, Transport};
    use armctl_sdk::driver::TelemetryState;
    use armctl_sdk::serial::LinkState;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// 已连接但每次写入都失败的串口
    #[derive(Default)]
    struct DeadLink {
        closed: AtomicBool,
    }

    impl Transport for DeadLink {
        fn connect(&self) -> bool {
            true
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn link_state(&self) -> LinkState {
            LinkState::Connected
        }

        fn send_command(&self, _command: &str) -> bool {
            false
        }

        fn read_line(&self) -> Option<String> {
            None
        }

        fn send_emergency_stop(&self) -> bool {
            false
        }
    }

    fn dead_arm(mode: ControlMode) -> (Arm, Arc<DeadLink>) {
        let link = Arc::new(DeadLink::default());
        let transport: Arc<dyn Transport> = link.clone();
        let arm = ArmBuilder::new().transport(transport).mode(mode).build();
        (arm, link)
    }

    #[test]
    fn test_physical_send_failure_is_error() {
        let (arm, _link) = dead_arm(ControlMode::Physical);
        let result = arm.router().dispatch(&[0.0; 6], SOURCE_CLI);

        assert!(!result.serial_sent);
        assert_eq!(result.error, None);
        assert!(ensure_dispatched(&result).is_err());
    }

    #[test]
    fn test_simulation_and_limit_failures() {
        let (arm, _link) = dead_arm(ControlMode::Simulation);
        let ok = arm.router().dispatch(&[0.0; 6], SOURCE_CLI);
        assert!(ensure_dispatched(&ok).is_ok());

        let rejected = arm.router().dispatch(&[0.0, 95.0, 0.0, 0.0, 0.0, 0.0], SOURCE_CLI);
        assert!(ensure_dispatched(&rejected).is_err());
    }

    #[test]
    fn test_with_arm_shuts_down_on_error() {
        let (arm, link) = dead_arm(ControlMode::Physical);
        let outcome: Result<()> = with_arm(&arm, |_| anyhow::bail!("solve failed"));

        assert!(outcome.is_err());
        assert!(link.closed.load(Ordering::SeqCst));
        assert_eq!(arm.telemetry().state(), TelemetryState::Stopped);
    }

    fn cmd(joints: &str) -> MoveCommand {
        MoveCommand {
            joints: joints.to_string(),
            mode: None,
        }
    }

    #[test]
    fn test_parse_joints() {
        let angles = cmd("0, 10, 20, 0, -30, 0").parse_joints().unwrap();
        assert_eq!(angles, [0.0, 10.0, 20.0, 0.0, -30.0, 0.0]);
    }

    #[test]
    fn test_parse_joints_invalid() {
        assert!(cmd("0,invalid,0,0,0,0").parse_joints().is_err());
        // 数量不对
        assert!(cmd("0,10,20").parse_joints().is_err());
        // J2 越界（±90°）
        assert!(cmd("0,95,0,0,0,0").parse_joints().is_err());
    }
}
