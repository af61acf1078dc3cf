//! 波表生成命令

use super::FactorArgs;
use crate::output::{OutputFormat, print_json, print_rows};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tmc_protocol::{CorrectionFactor, WavePair, generate};
use tracing::info;

/// 波表生成命令参数
#[derive(Args, Debug)]
pub struct TableCommand {
    #[command(flatten)]
    pub factor: FactorArgs,

    /// 输出格式（text / json）
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct TableReport {
    factor: CorrectionFactor,
    sine: Vec<u8>,
    cosine: Vec<u8>,
    max_magnitude_error: f64,
}

impl TableReport {
    fn new(pair: &WavePair) -> Self {
        Self {
            factor: pair.factor,
            sine: pair.sine.iter().collect(),
            cosine: pair.cosine.iter().collect(),
            max_magnitude_error: max_magnitude_error(pair),
        }
    }
}

/// 合成幅值与目标幅值的最大偏差
fn max_magnitude_error(pair: &WavePair) -> f64 {
    (0..pair.sine.as_array().len())
        .map(|i| (pair.magnitude(i) - f64::from(tmc_protocol::AMPLITUDE)).abs())
        .fold(0.0, f64::max)
}

impl TableCommand {
    pub fn execute(&self) -> Result<()> {
        let factor = self.factor.resolve()?;
        let pair = generate(factor);
        info!(factor = %factor, "Generated wave table");

        match self.format {
            OutputFormat::Json => print_json(&TableReport::new(&pair)),
            OutputFormat::Text => {
                println!("📈 Linearity factor {} (offset: {})", factor, factor.offset());
                print_rows("Phase A (sine)", pair.sine.iter());
                print_rows("Phase B (cosine)", pair.cosine.iter());
                println!("Max magnitude error: {:.3}", max_magnitude_error(&pair));
                Ok(())
            },
        }
    }
}
