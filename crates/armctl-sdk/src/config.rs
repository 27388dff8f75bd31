//! 应用配置
//!
//! TOML 文件 + 环境变量覆盖：
//!
//! ```toml
//! [serial]
//! enabled = true
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! timeout_ms = 500
//! handshake = "remote_enable"
//!
//! [telemetry]
//! period_ms = 100
//! sink_capacity = 64
//!
//! [control]
//! mode = "simulation"
//! ```

use armctl_driver::{ArmBuilder, TelemetryConfig};
use armctl_protocol::ControlMode;
use armctl_serial::SerialConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 控制模式覆盖变量
pub const ENV_CONTROL_MODE: &str = "ARMCTL_CONTROL_MODE";

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 字段取值无效
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 遥测配置段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    /// 采样周期（毫秒）
    pub period_ms: u64,
    /// 每个订阅连接的缓冲容量
    pub sink_capacity: usize,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            period_ms: 100,
            sink_capacity: 64,
        }
    }
}

impl TelemetrySection {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn to_config(&self) -> TelemetryConfig {
        TelemetryConfig::with_period(self.period())
    }
}

/// 控制配置段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSection {
    /// 启动时的控制模式
    pub mode: ControlMode,
}

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub telemetry: TelemetrySection,
    pub control: ControlSection,
}

impl AppConfig {
    /// 从 TOML 文件加载（不应用环境变量）
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// 文件（可选）+ 进程环境变量
    pub fn from_env_or_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// 串口相关见 [`SerialConfig::apply_env`]；无效值保留原配置并记录警告。
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.serial.apply_env(&lookup);

        if let Some(value) = lookup(ENV_CONTROL_MODE) {
            match value.parse::<ControlMode>() {
                Ok(mode) => self.control.mode = mode,
                Err(e) => warn!("Ignoring {}: {}", ENV_CONTROL_MODE, e),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.period_ms must be greater than 0".to_string(),
            ));
        }
        if self.telemetry.sink_capacity == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.sink_capacity must be greater than 0".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid(
                "serial.baud_rate must be greater than 0".to_string(),
            ));
        }
        if self.serial.enabled && self.serial.port.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "serial.port must be set when serial is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 按配置预设好的 [`ArmBuilder`]
    pub fn builder(&self) -> ArmBuilder {
        ArmBuilder::new()
            .serial_config(self.serial.clone())
            .mode(self.control.mode)
            .telemetry_config(self.telemetry.to_config())
    }
}
