//! 配置文件命令

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::PathBuf;
use tmc_tools::{AxisConfig, LinearityConfig};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 生成默认配置文件
    Init {
        /// 输出路径
        path: PathBuf,

        /// 步进电机段名（可多次指定）
        #[arg(short, long = "stepper", default_values_t = [String::from("stepper_x")])]
        steppers: Vec<String>,

        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 校验配置文件
    Check {
        /// 配置文件路径
        path: PathBuf,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init {
                path,
                steppers,
                force,
            } => Self::init_(path, steppers, force),

            ConfigCommand::Check { path } => Self::check_(path),
        }
    }

    fn init_(path: PathBuf, steppers: Vec<String>, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }

        let config = steppers
            .into_iter()
            .fold(LinearityConfig::default(), |config, section| {
                config.with_axis(section, AxisConfig::default())
            });
        config
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!("✅ Wrote {}", path.display());
        Ok(())
    }

    fn check_(path: PathBuf) -> Result<()> {
        let config = LinearityConfig::load(&path)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        println!("配置文件: {}", path.display());
        let p = &config.positioning;
        println!(
            "  positioning: dir_setup {}us, pulse_width {}us, step_interval {}us, max_retries {}, readback_timeout {}ms",
            p.dir_setup_us, p.pulse_width_us, p.step_interval_us, p.max_retries, p.readback_timeout_ms
        );
        for axis in config.resolved_axes()? {
            println!(
                "  [{}] axis {}: factor {}, microsteps {}, invert_dir {}",
                axis.section,
                axis.axis,
                axis.factor,
                axis.resolution.microsteps(),
                axis.invert_dir
            );
        }
        Ok(())
    }
}
