//! 命名预设位置

use crate::error::IkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 预设位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 初始位置（中间）
    Home,
    Left,
    Right,
    /// 中心低位
    Center,
    /// 高位
    High,
    /// 拾取位置（右后低）
    Pickup,
    /// 前方（向前伸展）
    Forward,
    /// 后方（向后收缩）
    Back,
}

impl Preset {
    pub const ALL: [Preset; 8] = [
        Preset::Home,
        Preset::Left,
        Preset::Right,
        Preset::Center,
        Preset::High,
        Preset::Pickup,
        Preset::Forward,
        Preset::Back,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Home => "home",
            Preset::Left => "left",
            Preset::Right => "right",
            Preset::Center => "center",
            Preset::High => "high",
            Preset::Pickup => "pickup",
            Preset::Forward => "forward",
            Preset::Back => "back",
        }
    }

    /// 目标位置 `(x, y, z)`（米）
    pub fn target(self) -> (f64, f64, f64) {
        match self {
            Preset::Home => (0.0, 0.25, 0.3),
            Preset::Left => (-0.15, 0.25, 0.25),
            Preset::Right => (0.15, 0.25, 0.25),
            Preset::Center => (0.0, 0.20, 0.20),
            Preset::High => (0.0, 0.25, 0.40),
            Preset::Pickup => (0.10, 0.30, 0.15),
            Preset::Forward => (0.0, 0.15, 0.25),
            Preset::Back => (0.0, 0.35, 0.25),
        }
    }

    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|p| p.name().to_string()).collect()
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = IkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or_else(|| IkError::UnknownPreset {
                name: s.to_string(),
                available: Self::names(),
            })
    }
}
