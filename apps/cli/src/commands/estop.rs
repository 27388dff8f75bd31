//! 急停命令
//!
//! 直接写串口，不经过分发路由，不受控制模式影响

use crate::modes::oneshot::OneShotMode;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct EstopCommand {
    /// 急停后再发送控制器复位
    #[arg(long)]
    pub reset: bool,
}

impl EstopCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        let arm = mode.physical_arm();
        let transport = arm
            .context()
            .transport()
            .ok_or_else(|| anyhow::anyhow!("没有可用的传输"))?;

        println!("🛑 发送急停...");
        let stopped = transport.send_emergency_stop();
        let reset = !self.reset || transport.send_reset_controller();
        arm.shutdown()?;

        if !stopped {
            anyhow::bail!("急停发送失败");
        }
        if !reset {
            anyhow::bail!("控制器复位发送失败");
        }

        println!("✅ 急停已发送");
        Ok(())
    }
}
