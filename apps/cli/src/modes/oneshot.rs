//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置（`--config` 或默认路径，再叠加环境变量）
//! 2. 装配机械臂（串口 / Mock）
//! 3. 执行操作
//! 4. 关闭传输

use anyhow::{Context, Result};
use armctl_sdk::{AppConfig, Arm, ControlMode};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认配置文件路径：`<config_dir>/armctl/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("armctl");
    path.push("config.toml");
    Some(path)
}

/// One-shot 模式
pub struct OneShotMode {
    config: AppConfig,
    source: Option<PathBuf>,
}

impl OneShotMode {
    /// 加载配置
    ///
    /// 显式给出的文件必须存在；默认路径不存在时使用内置默认值。
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let source = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        let config = AppConfig::from_env_or_file(source.as_deref()).with_context(|| match &source {
            Some(path) => format!("加载配置文件失败: {}", path.display()),
            None => "加载配置失败".to_string(),
        })?;
        debug!("CLI config loaded (source: {:?}, mode: {})", source, config.control.mode);

        Ok(Self { config, source })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 配置来源（`None` 表示内置默认值）
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 装配机械臂；`mode` 覆盖配置中的控制模式
    pub fn arm(&self, mode: Option<ControlMode>) -> Arm {
        let mut builder = self.config.builder();
        if let Some(mode) = mode {
            builder = builder.mode(mode);
        }
        builder.build()
    }

    /// 装配机械臂，强制实体模式（外设、急停等直接写串口的命令）
    pub fn physical_arm(&self) -> Arm {
        let arm = self.arm(Some(ControlMode::Physical));
        if arm.context().serial_mock() {
            println!("⚠️  串口未启用，使用 Mock 传输（指令只记录日志）");
        }
        arm
    }
}
