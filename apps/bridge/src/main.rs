//! armctl 桥接进程主入口
//!
//! 通过 TCP 向客户端提供控制通道和遥测流。协议为 JSON 行：
//! 客户端每行一条 `{"action": ...}`，服务端每行一条 `{"type": ...}`。

use anyhow::{Context, Result};
use armctl_bridge::{Bridge, BridgeConfig};
use armctl_sdk::{AppConfig, ControlMode};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// armctl 桥接进程
///
/// 持有串口并运行遥测服务，所有客户端共享同一个机械臂实例
#[derive(Parser, Debug)]
#[command(name = "armctl-bridge")]
#[command(about = "armctl bridge - control channel and telemetry over TCP", long_about = None)]
struct Args {
    /// TCP 监听地址
    ///
    /// 格式: IP:PORT (例如: 127.0.0.1:18888)
    #[arg(long, default_value = "127.0.0.1:18888")]
    listen: String,

    /// 配置文件路径（TOML），环境变量覆盖文件中的值
    #[arg(long)]
    config: Option<PathBuf>,

    /// 初始控制模式（覆盖配置）：simulation / physical
    #[arg(long)]
    mode: Option<ControlMode>,

    /// 最大客户端数
    #[arg(long, default_value = "16")]
    max_clients: usize,
}

fn main() -> Result<()> {
    armctl_sdk::logging::init("armctl=info");
    let args = Args::parse();

    let config = AppConfig::from_env_or_file(args.config.as_deref()).context("加载配置失败")?;

    // Ctrl+C 只置位标志，由主循环负责清理
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        flag.store(true, Ordering::Release);
    })
    .context("设置信号处理失败")?;

    let mut builder = config.builder();
    if let Some(mode) = args.mode {
        builder = builder.mode(mode);
    }
    let arm = Arc::new(builder.build());

    eprintln!("armctl bridge starting...");
    eprintln!("  Listen: {}", args.listen);
    eprintln!("  Mode: {}", arm.context().mode());
    eprintln!(
        "  Serial: {} ({})",
        config.serial.port,
        if config.serial.enabled { "enabled" } else { "mock" }
    );
    eprintln!("  Telemetry: {} ms", config.telemetry.period_ms);

    let bridge = Bridge::new(
        arm,
        BridgeConfig {
            listen: args.listen,
            max_clients: args.max_clients,
            queue_capacity: config.telemetry.sink_capacity,
            ..BridgeConfig::default()
        },
    );
    let listener = bridge.bind()?;

    eprintln!("armctl bridge started. Press Ctrl+C to stop.");
    bridge.serve(listener, &shutdown)?;
    Ok(())
}
