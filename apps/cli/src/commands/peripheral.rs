//! 外设命令：吸泵、LED、辅助舵机、控制器复位
//!
//! 外设指令直接写串口（强制实体模式）。越界参数在本地拒绝，不会发送。

use crate::modes::oneshot::OneShotMode;
use anyhow::Result;
use armctl_sdk::Transport;
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpAction {
    /// 打开吸泵
    On,
    /// 关闭吸泵
    Off,
    /// 设置吸泵强度
    Pwm {
        /// 占空比（0-255）
        duty_cycle: i32,
    },
}

#[derive(Args, Debug)]
pub struct PumpCommand {
    #[command(subcommand)]
    pub action: PumpAction,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LedAction {
    /// 打开 LED
    On {
        /// 颜色，例如 red / #00ff00
        #[arg(short, long)]
        color: Option<String>,
    },
    /// 关闭 LED
    Off,
}

#[derive(Args, Debug)]
pub struct LedCommand {
    #[command(subcommand)]
    pub action: LedAction,
}

#[derive(Args, Debug)]
pub struct ServoCommand {
    /// 舵机编号（1-10）
    pub id: i32,

    /// 目标角度（度）
    #[arg(allow_hyphen_values = true)]
    pub angle: f64,
}

/// 在实体模式机械臂上执行一次发送
fn with_transport<F>(mode: &OneShotMode, label: &str, send: F) -> Result<()>
where
    F: FnOnce(&dyn Transport) -> bool,
{
    let arm = mode.physical_arm();
    let transport = arm
        .context()
        .transport()
        .ok_or_else(|| anyhow::anyhow!("没有可用的传输"))?;

    println!("📡 {}...", label);
    let sent = send(transport.as_ref());
    arm.shutdown()?;

    if !sent {
        anyhow::bail!("{}失败", label);
    }
    println!("✅ {}完成", label);
    Ok(())
}

impl PumpCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        match self.action {
            PumpAction::On => with_transport(mode, "打开吸泵", |t| t.send_pump(true)),
            PumpAction::Off => with_transport(mode, "关闭吸泵", |t| t.send_pump(false)),
            PumpAction::Pwm { duty_cycle } => {
                if !(0..=255).contains(&duty_cycle) {
                    anyhow::bail!("占空比必须在 0-255 之间，实际 {}", duty_cycle);
                }
                with_transport(mode, "设置吸泵强度", |t| t.send_pump_pwm(duty_cycle))
            },
        }
    }
}

impl LedCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        match &self.action {
            LedAction::On { color } => {
                with_transport(mode, "打开 LED", |t| t.send_led(true, color.as_deref()))
            },
            LedAction::Off => with_transport(mode, "关闭 LED", |t| t.send_led(false, None)),
        }
    }
}

impl ServoCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        if !(1..=10).contains(&self.id) {
            anyhow::bail!("舵机编号必须在 1-10 之间，实际 {}", self.id);
        }
        with_transport(mode, "设置辅助舵机", |t| t.send_servo(self.id, self.angle))
    }
}

/// 控制器复位
pub async fn reset(mode: &OneShotMode) -> Result<()> {
    with_transport(mode, "复位控制器", |t| t.send_reset_controller())
}
