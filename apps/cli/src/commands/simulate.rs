//! 仿真命令
//!
//! 在 Mock 硬件上创建轴，按顺序执行 "set wave" / "set step" 命令。

use anyhow::{Context, Result, bail};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tmc_driver::MockAxisHardware;
use tmc_linearity::LinearityController;
use tmc_tools::{AxisConfig, LinearityConfig};
use tracing::{info, warn};

/// 仿真命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 要执行的命令（如 TMC_SET_STEP_X1050）
    pub commands: Vec<String>,

    /// 配置文件（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 未指定配置文件时创建的轴
    #[arg(short, long = "axis", conflicts_with = "config", default_values_t = [String::from("X")])]
    pub axes: Vec<String>,

    /// 命令脚本（每行一条命令，# 开头为注释）
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// 微步计数器初始位置
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// 保留配置中的脉冲时序（默认不等待）
    #[arg(long)]
    pub realtime: bool,

    /// 命令失败后继续执行
    #[arg(long)]
    pub continue_on_error: bool,
}

impl SimulateCommand {
    fn load_config(&self) -> Result<LinearityConfig> {
        let mut config = match &self.config {
            Some(path) => LinearityConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => self
                .axes
                .iter()
                .fold(LinearityConfig::default(), |config, label| {
                    config.with_axis(label.clone(), AxisConfig::default())
                }),
        };

        if !self.realtime {
            config.positioning.dir_setup_us = 0;
            config.positioning.pulse_width_us = 0;
            config.positioning.step_interval_us = 0;
        }
        Ok(config)
    }

    fn collect_commands(&self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        if let Some(path) = &self.script {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            lines.extend(parse_script(&content));
        }
        lines.extend(self.commands.iter().cloned());
        Ok(lines)
    }

    pub fn execute(&self) -> Result<()> {
        let config = self.load_config()?;
        let commands = self.collect_commands()?;

        let controller = LinearityController::from_config(&config, |resolved| {
            MockAxisHardware::new(resolved.resolution).with_position(self.start)
        })?;
        if controller.is_empty() {
            bail!("No axes configured");
        }

        controller.apply_all()?;
        info!(axes = controller.len(), commands = commands.len(), "Simulation started");

        let mut failures = 0usize;
        for line in &commands {
            match controller.execute(line) {
                Ok(response) => println!("✅ {}", response),
                Err(e) => {
                    failures += 1;
                    println!("❌ {}: {}", line, e);
                    if !self.continue_on_error {
                        break;
                    }
                    warn!("Continuing after failed command");
                },
            }
        }

        println!();
        for id in controller.axis_ids() {
            if let Some(axis) = controller.axis(id) {
                let axis = axis.lock();
                println!(
                    "{}: factor {}, position {}, pulses {}",
                    id,
                    axis.factor(),
                    axis.hardware().position(),
                    axis.hardware().pulses()
                );
            }
        }

        if failures > 0 {
            bail!("{} command(s) failed", failures);
        }
        Ok(())
    }
}

/// 解析脚本：去掉空行与注释
fn parse_script(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}
