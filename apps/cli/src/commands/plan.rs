//! 定位计划命令

use crate::output::{OutputFormat, print_json};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tmc_driver::MovePlan;
use tmc_protocol::{Direction, DirectionMode, MicrostepPosition, MicrostepResolution};

/// 定位计划命令参数
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// 当前微步位置
    #[arg(long)]
    pub from: u32,

    /// 目标（与 "set step" 命令相同：偶数，0..=1050）
    #[arg(long)]
    pub to: i64,

    /// 方向模式（forward / backward / auto）
    #[arg(short, long, default_value = "auto")]
    pub dir: DirectionMode,

    /// 微步分辨率
    #[arg(short, long, default_value_t = 256)]
    pub microsteps: u32,

    /// 输出格式（text / json）
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct PlanReport {
    current: MicrostepPosition,
    target: MicrostepPosition,
    direction: Direction,
    steps: u16,
}

impl PlanCommand {
    fn plan(&self) -> Result<MovePlan> {
        let resolution = MicrostepResolution::new(self.microsteps)?;
        let target = MicrostepPosition::from_step_command(self.to, resolution)?;
        let current = MicrostepPosition::wrapping(self.from, resolution);
        Ok(MovePlan::compute(current, target, self.dir, resolution))
    }

    pub fn execute(&self) -> Result<()> {
        let plan = self.plan()?;

        match self.format {
            OutputFormat::Json => print_json(&PlanReport {
                current: plan.current,
                target: plan.target,
                direction: plan.direction,
                steps: plan.steps,
            }),
            OutputFormat::Text => {
                println!(
                    "🧭 {} -> {}: {} steps {} (mode: {})",
                    plan.current, plan.target, plan.steps, plan.direction, self.dir
                );
                Ok(())
            },
        }
    }
}
