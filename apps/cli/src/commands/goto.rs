//! 笛卡尔目标命令
//!
//! 预设位置或 `x,y,z`（米）经逆运动学求解后分发

use super::r#move::{SOURCE_CLI, ensure_dispatched, print_dispatch, with_arm};
use crate::modes::oneshot::OneShotMode;
use anyhow::{Context, Result};
use armctl_sdk::ControlMode;
use armctl_sdk::kinematics::{AnalyticIkSolver, IkError, IkSolution, Preset};
use clap::Args;

/// 目标命令参数
#[derive(Args, Debug)]
pub struct GotoCommand {
    /// 预设位置：home / left / right / center / high / pickup / forward / back
    #[arg(short, long, conflicts_with = "xyz", required_unless_present = "xyz")]
    pub preset: Option<String>,

    /// 末端目标（米），逗号分隔，例如：0,0.25,0.3
    #[arg(long, allow_hyphen_values = true)]
    pub xyz: Option<String>,

    /// 只求解，不分发
    #[arg(long)]
    pub dry_run: bool,

    /// 控制模式（覆盖配置）
    #[arg(short, long)]
    pub mode: Option<ControlMode>,
}

/// 解析 `x,y,z`
pub fn parse_xyz(text: &str) -> Result<(f64, f64, f64)> {
    let values: Vec<f64> = text
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .context("解析目标坐标失败")?;

    match values.as_slice() {
        [x, y, z] => Ok((*x, *y, *z)),
        _ => anyhow::bail!("目标坐标需要 3 个值，实际 {} 个", values.len()),
    }
}

impl GotoCommand {
    /// 求解目标关节角度
    pub fn solve(&self, solver: &AnalyticIkSolver) -> Result<IkSolution> {
        match (&self.preset, &self.xyz) {
            (Some(name), _) => {
                let preset: Preset = name.parse()?;
                println!("⏳ 求解预设位置 {}...", preset);
                Ok(solver.solve_preset(preset)?)
            },
            (None, Some(xyz)) => {
                let (x, y, z) = parse_xyz(xyz)?;
                println!("⏳ 求解目标 ({:.3}, {:.3}, {:.3}) m...", x, y, z);
                Ok(solver.solve(x, y, z)?)
            },
            (None, None) => anyhow::bail!("请指定 --preset 或 --xyz"),
        }
    }

    pub async fn execute(&self, mode: &OneShotMode) -> Result<()> {
        let arm = mode.arm(self.mode);
        let result = with_arm(&arm, |arm| {
            let solution = self.solve(arm.router().solver())?;
            print_solution(&solution);

            if self.dry_run {
                return Ok(None);
            }
            println!("📡 分发关节指令...");
            Ok(Some(arm.router().dispatch(&solution.angles_deg, SOURCE_CLI)))
        })?;

        match result {
            Some(result) => {
                print_dispatch(&result);
                ensure_dispatched(&result)
            },
            None => {
                println!("✅ 求解完成（未分发）");
                Ok(())
            },
        }
    }
}

pub fn print_solution(solution: &IkSolution) {
    for (i, (deg, rad)) in solution
        .angles_deg
        .iter()
        .zip(solution.angles_rad.iter())
        .enumerate()
    {
        println!("  J{}: {:.2}° ({:.3} rad)", i + 1, deg, rad);
    }
}
