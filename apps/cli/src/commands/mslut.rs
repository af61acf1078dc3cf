//! MSLUT 寄存器镜像命令

use super::FactorArgs;
use crate::output::{OutputFormat, print_json};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tmc_protocol::{MslutImage, generate};

/// MSLUT 命令参数
#[derive(Args, Debug)]
pub struct MslutCommand {
    #[command(flatten)]
    pub factor: FactorArgs,

    /// 输出格式（text / json）
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct RegisterValue {
    register: &'static str,
    value: String,
}

#[derive(Serialize)]
struct MslutReport {
    widths: [u8; 4],
    bounds: [u8; 3],
    segments: usize,
    registers: Vec<RegisterValue>,
}

impl MslutReport {
    fn new(image: &MslutImage) -> Self {
        Self {
            widths: image.select.widths(),
            bounds: image.select.bounds(),
            segments: image.segment_count(),
            registers: image
                .registers()
                .into_iter()
                .map(|(register, value)| RegisterValue {
                    register: register.name(),
                    value: format!("0x{:08x}", value),
                })
                .collect(),
        }
    }
}

impl MslutCommand {
    pub fn execute(&self) -> Result<()> {
        let factor = self.factor.resolve()?;
        let image = MslutImage::encode(&generate(factor).sine)?;
        let report = MslutReport::new(&image);

        match self.format {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Text => {
                println!("🧮 MSLUT image for linearity factor {}", factor);
                println!(
                    "  widths: {:?}  bounds: {:?}  segments: {}",
                    report.widths, report.bounds, report.segments
                );
                for entry in &report.registers {
                    println!("  {:<10} {}", entry.register, entry.value);
                }
                Ok(())
            },
        }
    }
}
