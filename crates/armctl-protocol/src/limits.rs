//! # 关节限位
//!
//! 机械臂物理关节角度限制（度）。这是硬件安全边界，任何下发的绝对角度都不能越界。

use crate::joint::{AngleSlot, JOINT_COUNT, JointAngles};
use thiserror::Error;

/// 单个关节的闭区间 `[min, max]`（度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointRange {
    pub min: f64,
    pub max: f64,
}

impl JointRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 是否在区间内（闭区间，NaN 视为越界）
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// 限位校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LimitError {
    /// 角度数量不是 6 个
    #[error("Expected {expected} joint angles, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// 某个关节越界（只报告按编号顺序的第一个）
    #[error("Joint {joint} angle {value:.2}° exceeds limits [{min}, {max}]")]
    OutOfRange {
        /// 关节编号（1-6）
        joint: usize,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl LimitError {
    /// 越界关节编号（1-6）
    pub fn joint(&self) -> Option<usize> {
        match self {
            LimitError::OutOfRange { joint, .. } => Some(*joint),
            LimitError::Arity { .. } => None,
        }
    }
}

/// 关节限位表
///
/// 全局常量 [`JointLimits::DEFAULT`]，运行期不修改。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    ranges: [JointRange; JOINT_COUNT],
}

impl JointLimits {
    /// 默认限位（度）
    pub const DEFAULT: JointLimits = JointLimits::new([
        JointRange::new(-180.0, 180.0), // 底座旋转
        JointRange::new(-90.0, 90.0),   // 大臂俯仰
        JointRange::new(-135.0, 135.0), // 肘关节
        JointRange::new(-180.0, 180.0), // 手腕旋转
        JointRange::new(-90.0, 90.0),   // 手腕俯仰
        JointRange::new(-180.0, 180.0), // 末端旋转
    ]);

    pub const fn new(ranges: [JointRange; JOINT_COUNT]) -> Self {
        Self { ranges }
    }

    /// 按关节编号（1-6）取区间
    pub fn get(&self, joint: usize) -> Option<JointRange> {
        joint
            .checked_sub(1)
            .and_then(|idx| self.ranges.get(idx))
            .copied()
    }

    /// 遍历 `(关节编号, 区间)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, JointRange)> + '_ {
        self.ranges.iter().enumerate().map(|(idx, r)| (idx + 1, *r))
    }

    /// 单关节检查；无效编号返回 false
    pub fn contains(&self, joint: usize, value: f64) -> bool {
        self.get(joint).is_some_and(|r| r.contains(value))
    }

    /// 校验关节角度
    ///
    /// - 数量必须为 6，否则返回 [`LimitError::Arity`]
    /// - 未知值（`None`）跳过，允许部分更新通过
    /// - 返回第一个越界的关节
    pub fn validate<A: AngleSlot>(&self, angles: &[A]) -> Result<(), LimitError> {
        if angles.len() != JOINT_COUNT {
            return Err(LimitError::Arity {
                expected: JOINT_COUNT,
                actual: angles.len(),
            });
        }

        for ((joint, range), slot) in self.iter().zip(angles) {
            let Some(value) = slot.angle() else {
                continue;
            };
            if !range.contains(value) {
                return Err(LimitError::OutOfRange {
                    joint,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        Ok(())
    }

    /// 把角度限制到有效范围
    pub fn clamp(&self, angles: &JointAngles) -> JointAngles {
        let mut out = *angles;
        for (value, range) in out.iter_mut().zip(&self.ranges) {
            *value = range.clamp(*value);
        }
        out
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}
