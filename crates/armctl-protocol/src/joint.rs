//! 关节基础定义
//!
//! 关节编号从 1 开始（1 = 底座，6 = 末端），数组下标从 0 开始。

/// 关节数量
pub const JOINT_COUNT: usize = 6;

/// 关节名称（按编号顺序）
pub const JOINT_NAMES: [&str; JOINT_COUNT] = [
    "base rotation",
    "shoulder pitch",
    "elbow",
    "wrist rotation",
    "wrist pitch",
    "end effector rotation",
];

/// 指令侧关节角度（度），6 个值都必须存在
pub type JointAngles = [f64; JOINT_COUNT];

/// 遥测侧关节角度（度），`None` 表示该关节没有读数
pub type JointReadings = [Option<f64>; JOINT_COUNT];

/// 角度槽位
///
/// 统一 `f64`（指令侧）与 `Option<f64>`（遥测/部分更新）两种输入，
/// 让限位校验只写一份。
pub trait AngleSlot: Copy {
    /// 返回角度值；`None` 表示未知，校验时跳过
    fn angle(self) -> Option<f64>;
}

impl AngleSlot for f64 {
    #[inline]
    fn angle(self) -> Option<f64> {
        Some(self)
    }
}

impl AngleSlot for Option<f64> {
    #[inline]
    fn angle(self) -> Option<f64> {
        self
    }
}

impl<T: AngleSlot> AngleSlot for &T {
    #[inline]
    fn angle(self) -> Option<f64> {
        (*self).angle()
    }
}

/// 度 → 弧度
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// 弧度 → 度
#[inline]
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// 保留两位小数
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 把指令侧角度提升为遥测侧角度
pub fn to_readings(angles: &JointAngles) -> JointReadings {
    angles.map(Some)
}
