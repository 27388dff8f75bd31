//! 运动学错误类型

use thiserror::Error;

/// 逆运动学错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IkError {
    #[error("Target out of reach ({reach:.3}m > {max_reach:.3}m)")]
    TooFar { reach: f64, max_reach: f64 },

    #[error("Target too close ({reach:.3}m < {min_reach:.3}m)")]
    TooClose { reach: f64, min_reach: f64 },

    #[error("Invalid target ({x}, {y}, {z})")]
    InvalidTarget { x: f64, y: f64, z: f64 },

    #[error("Unknown preset {name:?} (available: {})", .available.join(", "))]
    UnknownPreset { name: String, available: Vec<String> },
}

/// 关键词指令解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// 问候语，不是控制指令
    #[error("Hello! Please give a motion command, e.g. \"move forward\", \"go to left\", \"home\"")]
    Greeting { available: Vec<String> },

    #[error("Unrecognized command: {text:?}")]
    Unrecognized { text: String, available: Vec<String> },

    #[error(transparent)]
    Ik(#[from] IkError),
}

impl CommandError {
    /// 可用指令提示
    pub fn available_commands(&self) -> &[String] {
        match self {
            CommandError::Greeting { available } | CommandError::Unrecognized { available, .. } => {
                available
            },
            CommandError::Ik(_) => &[],
        }
    }

    pub fn is_greeting(&self) -> bool {
        matches!(self, CommandError::Greeting { .. })
    }
}
