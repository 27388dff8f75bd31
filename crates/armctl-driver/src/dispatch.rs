//! 指令分发
//!
//! 所有指令源（语音解析、技能执行、控制通道、CLI）都经过 [`DispatchRouter::dispatch`]：
//!
//! 1. 关节限位校验，失败则不触碰传输层
//! 2. 实体模式且存在传输时，发送逐关节绝对旋转指令
//! 3. 仿真模式只记录，不写串口
//!
//! 分发器只负责"是否到达真实硬件"，不决定仿真端如何渲染。

use crate::context::ArmContext;
use crate::error::DriverError;
use armctl_kinematics::{AnalyticIkSolver, IkSolution, Preset, PresetMove};
use armctl_protocol::{ControlMode, JointLimits, RotateMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 分发结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// 分发时的控制模式
    pub mode: ControlMode,
    /// 指令来源标识
    pub source: String,
    /// 请求的关节角度（度）
    pub angles: Vec<f64>,
    /// 是否成功写入传输层
    pub serial_sent: bool,
    /// 传输层是否为 Mock
    pub serial_mock: bool,
    pub validation_failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 指令分发器
#[derive(Debug, Clone)]
pub struct DispatchRouter {
    context: Arc<ArmContext>,
    limits: JointLimits,
    solver: AnalyticIkSolver,
}

impl DispatchRouter {
    pub fn new(context: Arc<ArmContext>) -> Self {
        Self::with_solver(context, AnalyticIkSolver::default())
    }

    pub fn with_solver(context: Arc<ArmContext>, solver: AnalyticIkSolver) -> Self {
        Self {
            context,
            limits: JointLimits::DEFAULT,
            solver,
        }
    }

    pub fn context(&self) -> &Arc<ArmContext> {
        &self.context
    }

    pub fn solver(&self) -> &AnalyticIkSolver {
        &self.solver
    }

    /// 分发关节角度（度）
    pub fn dispatch(&self, angles: &[f64], source: &str) -> DispatchResult {
        let mode = self.context.mode();
        let mut result = DispatchResult {
            mode,
            source: source.to_string(),
            angles: angles.to_vec(),
            serial_sent: false,
            serial_mock: true,
            validation_failed: false,
            error: None,
        };

        if let Err(e) = self.limits.validate(angles) {
            error!("[DISPATCH] {}: joint limit validation failed - {}", source, e);
            result.validation_failed = true;
            result.error = Some(e.to_string());
            return result;
        }

        match (mode, self.context.transport()) {
            (ControlMode::Physical, Some(transport)) => {
                let readings: Vec<Option<f64>> = angles.iter().copied().map(Some).collect();
                let sent = transport.send_joint_angles(&readings, RotateMode::Abs, true);
                result.serial_sent = sent;
                result.serial_mock = transport.is_mock();
                if sent {
                    info!(
                        "[DISPATCH] {}: joint command sent (mock={})",
                        source, result.serial_mock
                    );
                } else {
                    warn!("[DISPATCH] {}: joint command send failed", source);
                }
            },
            (ControlMode::Physical, None) => {
                warn!("[DISPATCH] {}: physical mode but no transport available", source);
            },
            (ControlMode::Simulation, _) => {
                debug!("[DISPATCH] {}: simulation mode, serial skipped", source);
            },
        }

        result
    }

    /// 求解笛卡尔目标并分发
    pub fn dispatch_target(
        &self,
        x: f64,
        y: f64,
        z: f64,
        source: &str,
    ) -> Result<(IkSolution, DispatchResult), DriverError> {
        let solution = self.solver.solve(x, y, z)?;
        let result = self.dispatch(&solution.angles_deg, source);
        Ok((solution, result))
    }

    /// 求解预设位置并分发
    pub fn dispatch_preset(
        &self,
        name: &str,
        source: &str,
    ) -> Result<(IkSolution, DispatchResult), DriverError> {
        let preset: Preset = name.parse()?;
        let solution = self.solver.solve_preset(preset)?;
        let result = self.dispatch(&solution.angles_deg, source);
        Ok((solution, result))
    }

    /// 解析文本指令、求解并分发
    pub fn dispatch_command(
        &self,
        text: &str,
        source: &str,
    ) -> Result<(PresetMove, DispatchResult), DriverError> {
        let planned = self.solver.parse_command(text)?;
        let result = self.dispatch(&planned.solution.angles_deg, source);
        Ok((planned, result))
    }
}
