//! 命令目录

use anyhow::Result;
use clap::Args;
use tmc_linearity::command_catalogue;
use tmc_protocol::AxisId;

/// 命令目录参数
#[derive(Args, Debug)]
pub struct CatalogueCommand {
    /// 轴标签（可多次指定）
    #[arg(short, long = "axis", default_values_t = [String::from("X")])]
    pub axes: Vec<String>,

    /// 只列出名称包含该字符串的命令
    #[arg(long)]
    pub filter: Option<String>,
}

impl CatalogueCommand {
    pub fn execute(&self) -> Result<()> {
        let filter = self.filter.as_deref().map(str::to_ascii_uppercase);

        for label in &self.axes {
            let axis = AxisId::new(label)?;
            for spec in command_catalogue(&axis) {
                if filter.as_deref().is_some_and(|f| !spec.name.contains(f)) {
                    continue;
                }
                println!("{:<24} {}", spec.name, spec.description);
            }
        }
        Ok(())
    }
}
