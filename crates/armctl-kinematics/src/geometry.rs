//! 机械臂几何参数

use serde::{Deserialize, Serialize};

/// 连杆长度（米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    /// 底座到关节 2 的高度
    pub l1: f64,
    /// 大臂（关节 2 → 关节 3）
    pub l2: f64,
    /// 小臂（关节 3 → 关节 4）
    pub l3: f64,
    /// 手腕到末端
    pub l4: f64,
}

impl ArmGeometry {
    pub const DEFAULT: ArmGeometry = ArmGeometry {
        l1: 0.166,
        l2: 0.200,
        l3: 0.185,
        l4: 0.125,
    };

    /// 平面两连杆最大伸展距离
    #[inline]
    pub fn max_reach(&self) -> f64 {
        self.l2 + self.l3
    }

    /// 平面两连杆最小伸展距离
    #[inline]
    pub fn min_reach(&self) -> f64 {
        (self.l2 - self.l3).abs()
    }

    /// 工作空间范围
    pub fn workspace_limits(&self) -> WorkspaceLimits {
        WorkspaceLimits {
            max_reach: self.max_reach(),
            min_reach: self.min_reach(),
            height_min: self.l1 - self.max_reach(),
            height_max: self.l1 + self.max_reach(),
            recommended: RecommendedZone::DEFAULT,
        }
    }
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// 工作空间范围（米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceLimits {
    pub max_reach: f64,
    pub min_reach: f64,
    pub height_min: f64,
    pub height_max: f64,
    pub recommended: RecommendedZone,
}

/// 推荐操作区域，各轴 `(min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendedZone {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
}

impl RecommendedZone {
    pub const DEFAULT: RecommendedZone = RecommendedZone {
        x: (-0.2, 0.2),
        y: (0.15, 0.40),
        z: (0.15, 0.45),
    };

    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        let within = |v: f64, (lo, hi): (f64, f64)| lo <= v && v <= hi;
        within(x, self.x) && within(y, self.y) && within(z, self.z)
    }
}
