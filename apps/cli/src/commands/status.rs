//! 状态查询命令

use crate::modes::oneshot::OneShotMode;
use anyhow::{Context, Result};
use armctl_sdk::{ControlMode, TelemetrySnapshot};
use clap::Args;

#[derive(Args, Debug)]
pub struct StatusCommand {
    /// 同时采样一次关节角度（实体模式读取 STATUS）
    #[arg(short, long)]
    pub sample: bool,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,

    /// 控制模式（覆盖配置）
    #[arg(short, long)]
    pub mode: Option<ControlMode>,
}

impl StatusCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        let arm = mode.arm(self.mode);
        let status = arm.context().hardware_status();
        let snapshot = self.sample.then(|| {
            let mut phase = 0.0;
            arm.telemetry().sample_once(&mut phase)
        });
        arm.shutdown()?;

        if self.json {
            let mut value = serde_json::to_value(&status).context("序列化状态失败")?;
            if let (Some(snapshot), Some(map)) = (&snapshot, value.as_object_mut()) {
                map.insert(
                    "telemetry".to_string(),
                    serde_json::to_value(snapshot.as_ref()).context("序列化遥测失败")?,
                );
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("机械臂状态:");
        println!("  控制模式: {}", status.control_mode);
        println!("  串口启用: {}", status.serial_enabled);
        println!("  串口端口: {}", status.serial_port);
        println!("  链路状态: {}", status.link_state);
        println!("  Mock 传输: {}", status.serial_mock);
        if status.available_ports.is_empty() {
            println!("  可用端口: (无)");
        } else {
            println!("  可用端口: {}", status.available_ports.join(", "));
        }

        if let Some(snapshot) = snapshot {
            print_snapshot(&snapshot);
        }
        Ok(())
    }
}

/// 单行打印遥测快照
pub fn print_snapshot(snapshot: &TelemetrySnapshot) {
    if !snapshot.has_angles() {
        println!("  关节角度: (未知)");
        return;
    }

    let angles: Vec<String> = snapshot
        .angles_deg
        .iter()
        .map(|a| match a {
            Some(v) => format!("{:7.2}", v),
            None => "      -".to_string(),
        })
        .collect();
    println!(
        "  关节角度: [{}]  错误码: {}",
        angles.join(" "),
        snapshot
            .error_code
            .map_or_else(|| "-".to_string(), |c| c.to_string())
    );
}
