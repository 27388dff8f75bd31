//! 遥测监控命令
//!
//! 启动遥测服务并订阅快照，直到 Ctrl+C 或达到时长

use crate::commands::status::print_snapshot;
use crate::modes::oneshot::OneShotMode;
use anyhow::{Context, Result};
use armctl_sdk::{ChannelSink, ControlMode, TelemetrySnapshot};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct MonitorCommand {
    /// 监控时长（秒），不指定则直到 Ctrl+C
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// 采样周期（毫秒，覆盖配置）
    #[arg(short, long)]
    pub period_ms: Option<u64>,

    /// 以 JSON 行输出
    #[arg(long)]
    pub json: bool,

    /// 控制模式（覆盖配置）
    #[arg(short, long)]
    pub mode: Option<ControlMode>,
}

impl MonitorCommand {
    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        let mut builder = mode.config().builder();
        if let Some(control) = self.mode {
            builder = builder.mode(control);
        }
        if let Some(period_ms) = self.period_ms {
            builder = builder.telemetry_period(Duration::from_millis(period_ms));
        }
        let arm = builder.build();

        let capacity = mode.config().telemetry.sink_capacity;
        let (sink, rx) = ChannelSink::new(capacity);
        let id = arm
            .telemetry()
            .subscribe(Arc::new(sink))
            .context("订阅遥测失败")?;
        arm.start_telemetry().context("启动遥测失败")?;

        let period = arm.telemetry().config().period;
        println!(
            "📡 监控遥测（模式 {}，周期 {} ms），按 Ctrl+C 退出",
            arm.context().mode(),
            period.as_millis()
        );

        let deadline = async {
            match self.duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for snapshot in rx.try_iter() {
                        self.print(&snapshot)?;
                    }
                }
                _ = &mut deadline => break,
                _ = &mut ctrl_c => {
                    println!();
                    println!("🛑 收到中断信号");
                    break;
                }
            }
        }

        arm.telemetry().unsubscribe(id);
        let stats = arm.telemetry().stats();
        arm.shutdown()?;

        println!(
            "✅ 监控结束：采样 {} 次，更新 {} 次，读取失败 {} 次",
            stats.ticks, stats.updates, stats.read_misses
        );
        Ok(())
    }

    fn print(&self, snapshot: &TelemetrySnapshot) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(snapshot)?);
        } else {
            print_snapshot(snapshot);
        }
        Ok(())
    }
}
