//! 文本指令命令
//!
//! 关键词匹配到预设位置，求解后分发

use super::goto::print_solution;
use super::r#move::{SOURCE_CLI, ensure_dispatched, print_dispatch};
use crate::modes::oneshot::OneShotMode;
use anyhow::Result;
use armctl_sdk::ControlMode;
use armctl_sdk::kinematics::available_commands;
use clap::Args;

#[derive(Args, Debug)]
pub struct SayCommand {
    /// 指令文本，例如 "向左" / "move left" / "你好"
    #[arg(required_unless_present = "list")]
    pub text: Vec<String>,

    /// 列出可识别的指令
    #[arg(long)]
    pub list: bool,

    /// 控制模式（覆盖配置）
    #[arg(short, long)]
    pub mode: Option<ControlMode>,
}

impl SayCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        if self.list {
            println!("可识别的指令:");
            for command in available_commands() {
                println!("  {}", command);
            }
            return Ok(());
        }

        let text = self.text.join(" ");
        let arm = mode.arm(self.mode);

        println!("⏳ 解析指令: {:?}", text);
        let outcome = arm.router().dispatch_command(&text, SOURCE_CLI);
        arm.shutdown()?;

        let (planned, result) = outcome?;
        println!("  预设位置: {}", planned.preset);
        print_solution(&planned.solution);
        print_dispatch(&result);
        ensure_dispatched(&result)
    }
}
