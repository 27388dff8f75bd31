//! 控制模式定义
//!
//! 决定下发的关节指令是否真正到达硬件。

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// 控制模式
///
/// # 模式说明
///
/// - **Simulation**: 仿真模式（默认），指令只记录，不写串口
/// - **Physical**: 实体模式，指令经限位校验后写入串口
///
/// # 线程安全
///
/// 进程级共享状态使用 [`AtomicControlMode`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ControlMode {
    /// 仿真模式（默认）
    #[default]
    Simulation = 0,

    /// 实体模式
    Physical = 1,
}

impl ControlMode {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Simulation（安全侧）。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Physical,
            _ => Self::Simulation,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 报文/配置中使用的名称
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simulation => "simulation",
            Self::Physical => "physical",
        }
    }

    pub fn is_physical(self) -> bool {
        self == Self::Physical
    }

    pub fn is_simulation(self) -> bool {
        self == Self::Simulation
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = ProtocolError;

    /// 只接受 `simulation` / `physical`（忽略首尾空白与大小写）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulation" => Ok(Self::Simulation),
            "physical" => Ok(Self::Physical),
            _ => Err(ProtocolError::InvalidMode(s.to_string())),
        }
    }
}

/// 控制模式（原子版本，用于线程间共享）
///
/// # 使用场景
///
/// - 遥测线程每个周期读取模式
/// - 请求处理线程在分发指令时读取模式
/// - 只有显式的切换操作会调用 `set()`
///
/// # 示例
///
/// ```rust
/// use armctl_protocol::mode::{AtomicControlMode, ControlMode};
///
/// let mode = AtomicControlMode::new(ControlMode::Simulation);
/// mode.set(ControlMode::Physical);
/// assert_eq!(mode.get(), ControlMode::Physical);
/// ```
#[derive(Debug)]
pub struct AtomicControlMode {
    inner: AtomicU8,
}

impl AtomicControlMode {
    pub fn new(mode: ControlMode) -> Self {
        Self {
            inner: AtomicU8::new(mode.as_u8()),
        }
    }

    /// 获取当前模式
    pub fn get(&self) -> ControlMode {
        ControlMode::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// 设置模式
    pub fn set(&self, mode: ControlMode) {
        self.inner.store(mode.as_u8(), Ordering::Release);
    }

    /// 设置模式并返回旧值
    pub fn swap(&self, mode: ControlMode) -> ControlMode {
        ControlMode::from_u8(self.inner.swap(mode.as_u8(), Ordering::AcqRel))
    }
}

impl Default for AtomicControlMode {
    fn default() -> Self {
        Self::new(ControlMode::default())
    }
}

impl Clone for AtomicControlMode {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}
