//! 几何法逆运动学
//!
//! 1. 底座角 `theta1 = atan2(x, y)`
//! 2. 投影到竖直平面：水平距离 `r' = hypot(x, y) - L4/2`，高度 `h = z - L1`
//! 3. 大臂/小臂按平面两连杆求解（余弦定理，肘部取 `acos` 的正解）
//! 4. `theta5 = -(theta2 + theta3)` 保持末端水平，`theta4 = theta6 = 0`

use crate::error::IkError;
use crate::geometry::ArmGeometry;
use crate::preset::Preset;
use armctl_protocol::JointAngles;
use armctl_protocol::joint::deg_to_rad;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 笛卡尔目标（米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartesianTarget {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 求解结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkSolution {
    /// 关节角度（度）
    pub angles_deg: JointAngles,
    /// 关节角度（弧度）
    pub angles_rad: JointAngles,
    pub target: CartesianTarget,
}

/// 几何法求解器
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticIkSolver {
    geometry: ArmGeometry,
}

impl AnalyticIkSolver {
    pub fn new(geometry: ArmGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    /// 求解到达 `(x, y, z)` 的关节角度
    pub fn solve(&self, x: f64, y: f64, z: f64) -> Result<IkSolution, IkError> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(IkError::InvalidTarget { x, y, z });
        }

        let ArmGeometry { l1, l2, l3, l4 } = self.geometry;

        let theta1 = x.atan2(y);

        let height = z - l1;
        let planar = x.hypot(y) - l4 * 0.5;
        let reach = planar.hypot(height);

        let max_reach = self.geometry.max_reach();
        if reach > max_reach {
            return Err(IkError::TooFar { reach, max_reach });
        }
        let min_reach = self.geometry.min_reach();
        if reach < min_reach {
            return Err(IkError::TooClose { reach, min_reach });
        }

        let cos3 = ((reach * reach - l2 * l2 - l3 * l3) / (2.0 * l2 * l3)).clamp(-1.0, 1.0);
        let theta3 = cos3.acos();

        let alpha = height.atan2(planar);
        let beta = (l3 * theta3.sin()).atan2(l2 + l3 * theta3.cos());
        let theta2 = -(alpha - beta);

        let theta5_deg = -(theta2.to_degrees() + theta3.to_degrees());

        let angles_deg = [
            theta1.to_degrees(),
            theta2.to_degrees(),
            theta3.to_degrees(),
            0.0,
            theta5_deg,
            0.0,
        ];
        let angles_rad = [theta1, theta2, theta3, 0.0, deg_to_rad(theta5_deg), 0.0];

        debug!(
            "IK ({:.3}, {:.3}, {:.3}) -> {:?} (reach {:.3}m)",
            x, y, z, angles_deg, reach
        );

        Ok(IkSolution {
            angles_deg,
            angles_rad,
            target: CartesianTarget { x, y, z },
        })
    }

    pub fn solve_preset(&self, preset: Preset) -> Result<IkSolution, IkError> {
        let (x, y, z) = preset.target();
        self.solve(x, y, z)
    }

    /// 按名称求解预设位置
    pub fn preset(&self, name: &str) -> Result<IkSolution, IkError> {
        self.solve_preset(name.parse()?)
    }
}
