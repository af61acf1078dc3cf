//! 命令定义和实现

pub mod catalogue;
pub mod config;
pub mod mslut;
pub mod plan;
pub mod simulate;
pub mod table;

pub use catalogue::CatalogueCommand;
pub use config::ConfigCommand;
pub use mslut::MslutCommand;
pub use plan::PlanCommand;
pub use simulate::SimulateCommand;
pub use table::TableCommand;

use anyhow::Result;
use clap::Args;
use tmc_protocol::CorrectionFactor;

/// 校正因子参数（小数或 "set wave" 偏移，二选一）
#[derive(Args, Debug, Clone, Default)]
pub struct FactorArgs {
    /// 校正因子（1.0..=1.2）
    #[arg(short, long, conflicts_with = "offset")]
    pub factor: Option<f64>,

    /// "set wave" 偏移（0..=200，10 的倍数）
    #[arg(short, long)]
    pub offset: Option<i64>,
}

impl FactorArgs {
    /// 未指定时为 1.0（不校正）
    pub fn resolve(&self) -> Result<CorrectionFactor> {
        let factor = match (self.factor, self.offset) {
            (Some(value), _) => CorrectionFactor::from_decimal(value)?,
            (None, Some(offset)) => CorrectionFactor::from_offset(offset)?,
            (None, None) => CorrectionFactor::NONE,
        };
        Ok(factor)
    }
}
