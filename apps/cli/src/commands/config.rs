//! 配置管理命令
//!
//! 配置文件为 TOML，默认位于 `<config_dir>/armctl/config.toml`，
//! 环境变量（`SERIAL_*`、`ARMCTL_CONTROL_MODE`）覆盖文件中的值。

use crate::modes::oneshot::{OneShotMode, default_config_path};
use anyhow::{Context, Result};
use armctl_sdk::AppConfig;
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（文件 + 环境变量）
    Show,

    /// 校验配置
    Check,

    /// 写出默认配置文件
    Init {
        /// 目标路径（默认 `<config_dir>/armctl/config.toml`）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => Self::show_(config_path),
            ConfigCommand::Check => Self::check_(config_path),
            ConfigCommand::Init { path, force } => {
                let path = match path.or_else(default_config_path) {
                    Some(path) => path,
                    None => anyhow::bail!("无法确定配置目录"),
                };
                write_default(&path, force)?;
                println!("✅ 已写入默认配置: {}", path.display());
                Ok(())
            },
        }
    }

    fn show_(config_path: Option<&Path>) -> Result<()> {
        let mode = OneShotMode::new(config_path)?;
        print_source(&mode);
        print!("{}", mode.config().to_toml().context("序列化配置失败")?);
        Ok(())
    }

    fn check_(config_path: Option<&Path>) -> Result<()> {
        let mode = OneShotMode::new(config_path)?;
        print_source(&mode);

        let config = mode.config();
        println!("  控制模式: {}", config.control.mode);
        println!(
            "  串口: {} @ {} baud（{}）",
            config.serial.port,
            config.serial.baud_rate,
            if config.serial.enabled { "启用" } else { "Mock" }
        );
        println!(
            "  遥测: {} ms，订阅缓冲 {}",
            config.telemetry.period_ms, config.telemetry.sink_capacity
        );
        println!("✅ 配置有效");
        Ok(())
    }
}

fn print_source(mode: &OneShotMode) {
    match mode.source() {
        Some(path) => println!("配置文件: {}", path.display()),
        None => println!("配置文件: (内置默认值)"),
    }
}

/// 写出默认配置；文件已存在且未指定 `force` 时报错
pub fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("创建配置目录失败")?;
    }

    let content = AppConfig::default().to_toml().context("序列化配置失败")?;
    fs::write(path, content).context("写入配置文件失败")?;
    Ok(())
}
