//! 技能表
//!
//! 上层（语言模型路由、脚本）以"技能名 + JSON 参数"的形式调用机械臂能力。
//! 技能集合是封闭的 [`SkillKind`]，未知名称直接拒绝。
//!
//! 技能只计算目标角度，不下发；是否写入硬件由调用方交给 [`DispatchRouter`](crate::DispatchRouter)。

use armctl_kinematics::{AnalyticIkSolver, IkError};
use armctl_protocol::{JOINT_COUNT, JointAngles};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info};

/// 技能错误
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("No skill name provided")]
    MissingName,

    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// 缺少必需参数
    #[error("Skill {skill} requires argument '{arg}'")]
    MissingArgument { skill: SkillKind, arg: &'static str },

    /// 参数类型或取值无效
    #[error("Invalid argument '{arg}': {message}")]
    InvalidArgument { arg: &'static str, message: String },

    /// 关节编号不在 1-6
    #[error("Invalid joint index: {0}")]
    InvalidJoint(i64),

    #[error("No valid joint targets")]
    NoValidJoints,

    #[error(transparent)]
    Ik(#[from] IkError),
}

/// 技能种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// 单关节控制
    ControlJoint,
    /// 多关节同时控制
    ControlMultipleJoints,
    /// 笛卡尔目标（经 IK）
    MoveTo,
    /// 预设位置
    ApplyPreset,
    /// 动作序列（由前端编排）
    PerformAction,
}

impl SkillKind {
    pub const ALL: [SkillKind; 5] = [
        SkillKind::ControlJoint,
        SkillKind::ControlMultipleJoints,
        SkillKind::MoveTo,
        SkillKind::ApplyPreset,
        SkillKind::PerformAction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillKind::ControlJoint => "control_joint",
            SkillKind::ControlMultipleJoints => "control_multiple_joints",
            SkillKind::MoveTo => "move_to",
            SkillKind::ApplyPreset => "apply_preset",
            SkillKind::PerformAction => "perform_action",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillKind {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(SkillError::MissingName);
        }
        SkillKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| SkillError::UnknownSkill(name.to_string()))
    }
}

/// 技能结果的交互模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeMode {
    /// 产生了关节目标，需要执行
    Work,
    /// 只需回复，不下发角度
    Chat,
}

/// 技能执行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillOutcome {
    pub skill: SkillKind,
    pub mode: OutcomeMode,
    pub action: String,
    /// 面向用户的回复文本
    pub response: String,
    /// 目标关节角度（度）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angles: Option<JointAngles>,
    /// 笛卡尔目标（米）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<[f64; 3]>,
}

/// 技能执行器
#[derive(Debug, Clone, Default)]
pub struct SkillExecutor {
    solver: AnalyticIkSolver,
}

impl SkillExecutor {
    pub fn new(solver: AnalyticIkSolver) -> Self {
        Self { solver }
    }

    /// 按名称执行技能
    ///
    /// `args` 必须是 JSON 对象；`current_angles` 缺失或不足 6 个值时按全零处理。
    pub fn execute(&self, name: &str, args: &Value) -> Result<SkillOutcome, SkillError> {
        let kind: SkillKind = name.parse()?;
        info!("Executing skill {} args={}", kind, args);

        let result = match kind {
            SkillKind::ControlJoint => self.control_joint(args),
            SkillKind::ControlMultipleJoints => self.control_multiple_joints(args),
            SkillKind::MoveTo => self.move_to(args),
            SkillKind::ApplyPreset => self.apply_preset(args),
            SkillKind::PerformAction => self.perform_action(args),
        };
        if let Err(e) = &result {
            error!("Skill {} failed: {}", kind, e);
        }
        result
    }

    fn control_joint(&self, args: &Value) -> Result<SkillOutcome, SkillError> {
        let kind = SkillKind::ControlJoint;
        let joint = integer_arg(args, kind, "joint_index")?;
        let angle = number_arg(args, kind, "angle")?;
        let slot = joint_slot(joint).ok_or(SkillError::InvalidJoint(joint))?;

        let mut angles = current_angles(args);
        angles[slot] = angle;
        Ok(SkillOutcome {
            skill: kind,
            mode: OutcomeMode::Work,
            action: kind.as_str().to_string(),
            response: format!("好的，正在调整关节{}到{}度", joint, angle),
            angles: Some(angles),
            target: None,
        })
    }

    fn control_multiple_joints(&self, args: &Value) -> Result<SkillOutcome, SkillError> {
        let kind = SkillKind::ControlMultipleJoints;
        let targets = args
            .get("target_angles_dict")
            .ok_or(SkillError::MissingArgument {
                skill: kind,
                arg: "target_angles_dict",
            })?
            .as_object()
            .ok_or_else(|| SkillError::InvalidArgument {
                arg: "target_angles_dict",
                message: "expected an object of joint index to angle".to_string(),
            })?;

        let mut angles = current_angles(args);
        let mut updated = Vec::new();
        for (key, value) in targets {
            // 无法解析的条目跳过
            let Ok(joint) = key.trim().parse::<i64>() else {
                continue;
            };
            let (Some(slot), Some(angle)) = (joint_slot(joint), as_number(value)) else {
                continue;
            };
            angles[slot] = angle;
            updated.push(format!("关节{}={}度", joint, angle));
        }

        if updated.is_empty() {
            return Err(SkillError::NoValidJoints);
        }

        Ok(SkillOutcome {
            skill: kind,
            mode: OutcomeMode::Work,
            action: kind.as_str().to_string(),
            response: format!("好的，正在调整: {}", updated.join(", ")),
            angles: Some(angles),
            target: None,
        })
    }

    fn move_to(&self, args: &Value) -> Result<SkillOutcome, SkillError> {
        let kind = SkillKind::MoveTo;
        let x = number_arg(args, kind, "x")?;
        let y = number_arg(args, kind, "y")?;
        let z = number_arg(args, kind, "z")?;
        let solution = self.solver.solve(x, y, z)?;

        Ok(SkillOutcome {
            skill: kind,
            mode: OutcomeMode::Work,
            action: kind.as_str().to_string(),
            response: "正在移动到目标位置".to_string(),
            angles: Some(solution.angles_deg),
            target: Some([x, y, z]),
        })
    }

    fn apply_preset(&self, args: &Value) -> Result<SkillOutcome, SkillError> {
        let kind = SkillKind::ApplyPreset;
        let name = string_arg(args, kind, "name")?;
        let solution = self.solver.preset(name)?;

        Ok(SkillOutcome {
            skill: kind,
            mode: OutcomeMode::Work,
            action: name.to_string(),
            response: format!("正在移动到{}位置", name),
            angles: Some(solution.angles_deg),
            target: None,
        })
    }

    fn perform_action(&self, args: &Value) -> Result<SkillOutcome, SkillError> {
        let kind = SkillKind::PerformAction;
        let action = string_arg(args, kind, "action_name")?;

        Ok(SkillOutcome {
            skill: kind,
            mode: OutcomeMode::Chat,
            action: action.to_string(),
            response: format!("开始{}", action),
            angles: None,
            target: None,
        })
    }
}

/// 关节编号（1-6）→ 数组下标
fn joint_slot(joint: i64) -> Option<usize> {
    usize::try_from(joint)
        .ok()
        .filter(|j| (1..=JOINT_COUNT).contains(j))
        .map(|j| j - 1)
}

/// 数字或数字字符串
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn number_arg(args: &Value, skill: SkillKind, arg: &'static str) -> Result<f64, SkillError> {
    let value = args
        .get(arg)
        .ok_or(SkillError::MissingArgument { skill, arg })?;
    as_number(value).ok_or_else(|| SkillError::InvalidArgument {
        arg,
        message: format!("expected a number, got {}", value),
    })
}

fn integer_arg(args: &Value, skill: SkillKind, arg: &'static str) -> Result<i64, SkillError> {
    let value = number_arg(args, skill, arg)?;
    if value.fract() != 0.0 {
        return Err(SkillError::InvalidArgument {
            arg,
            message: format!("expected an integer, got {}", value),
        });
    }
    Ok(value as i64)
}

fn string_arg<'a>(
    args: &'a Value,
    skill: SkillKind,
    arg: &'static str,
) -> Result<&'a str, SkillError> {
    args.get(arg)
        .ok_or(SkillError::MissingArgument { skill, arg })?
        .as_str()
        .ok_or_else(|| SkillError::InvalidArgument {
            arg,
            message: "expected a string".to_string(),
        })
}

/// 当前关节角度，缺失、不足 6 个或含非数字时为全零
fn current_angles(args: &Value) -> JointAngles {
    let mut angles = [0.0; JOINT_COUNT];
    let Some(values) = args.get("current_angles").and_then(Value::as_array) else {
        return angles;
    };
    if values.len() < JOINT_COUNT {
        return angles;
    }
    let parsed: Option<Vec<f64>> = values.iter().take(JOINT_COUNT).map(as_number).collect();
    if let Some(parsed) = parsed {
        angles.copy_from_slice(&parsed);
    }
    angles
}
