//! # armctl Kinematics
//!
//! 笛卡尔目标 → 关节角度。
//!
//! ## 模块
//!
//! - `geometry`: 连杆长度与工作空间
//! - `solver`: 几何法逆运动学（平面两连杆 + 底座旋转）
//! - `preset`: 命名预设位置
//! - `command`: 关键词指令解析（中文 / 英文）
//!
//! ## 坐标系
//!
//! - X：左(-) / 右(+)
//! - Y：前(小) / 后(大)
//! - Z：下(-) / 上(+)
//!
//! 底座角使用 `atan2(x, y)`，与该机械臂的轴向布置一致。
//! 手腕旋转与末端旋转固定为 0，关节 5 补偿大臂与肘关节使末端保持水平。
//! 求解结果**不做**关节限位校验，下发前由调用方校验。

pub mod command;
pub mod error;
pub mod geometry;
pub mod preset;
pub mod solver;

pub use command::{PresetMove, available_commands, interpret};
pub use error::{CommandError, IkError};
pub use geometry::{ArmGeometry, RecommendedZone, WorkspaceLimits};
pub use preset::Preset;
pub use solver::{AnalyticIkSolver, CartesianTarget, IkSolution};
