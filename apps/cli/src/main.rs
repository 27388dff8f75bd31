//! # armctl CLI
//!
//! 6 关节串口机械臂命令行工具。
//!
//! 每条命令独立执行（One-shot）：加载配置 -> 装配机械臂 -> 执行 -> 关闭串口。
//!
//! ```bash
//! # 写出默认配置，之后按需编辑
//! armctl config init
//!
//! # 仿真模式下分发关节角度（度）
//! armctl move --joints 0,10,20,0,-30,0
//!
//! # 实体模式下移动到预设位置
//! armctl goto --preset home --mode physical
//!
//! # 订阅遥测 10 秒
//! armctl monitor --duration 10
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod modes;

use commands::{
    ConfigCommand, EstopCommand, GotoCommand, LedCommand, MonitorCommand, MoveCommand,
    PortsCommand, PumpCommand, SayCommand, ServoCommand, StatusCommand,
};
use modes::oneshot::OneShotMode;

/// armctl - 机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "armctl")]
#[command(about = "Command-line interface for the 6-joint serial arm", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 `<config_dir>/armctl/config.toml`）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出可用串口
    Ports(PortsCommand),

    /// 查询硬件状态
    Status(StatusCommand),

    /// 分发 6 个关节角度
    Move(MoveCommand),

    /// 移动到预设位置或笛卡尔目标
    Goto(GotoCommand),

    /// 文本指令（关键词匹配预设位置）
    Say(SayCommand),

    /// 急停
    Estop(EstopCommand),

    /// 吸泵控制
    Pump(PumpCommand),

    /// LED 控制
    Led(LedCommand),

    /// 辅助舵机
    Servo(ServoCommand),

    /// 复位控制器
    Reset,

    /// 监控遥测
    Monitor(MonitorCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    armctl_sdk::logging::init("armctl=info");

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(config).await,
        Commands::Ports(cmd) => cmd.execute().await,
        command => {
            let mode = OneShotMode::new(config)?;
            match command {
                Commands::Status(cmd) => cmd.execute(&mode).await,
                Commands::Move(cmd) => cmd.execute(&mode).await,
                Commands::Goto(cmd) => cmd.execute(&mode).await,
                Commands::Say(cmd) => cmd.execute(&mode).await,
                Commands::Estop(cmd) => cmd.execute(&mode).await,
                Commands::Pump(cmd) => cmd.execute(&mode).await,
                Commands::Led(cmd) => cmd.execute(&mode).await,
                Commands::Servo(cmd) => cmd.execute(&mode).await,
                Commands::Reset => commands::peripheral::reset(&mode).await,
                Commands::Monitor(cmd) => cmd.execute(&mode).await,
                Commands::Config(_) | Commands::Ports(_) => Ok(()),
            }
        },
    }
}
