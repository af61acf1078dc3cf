//! # TMC CLI
//!
//! TMC2130 线性度校正的命令行工具。
//!
//! ## 离线计算
//!
//! ```bash
//! # 打印校正因子 1.1 的两相波表
//! tmc-cli table --factor 1.1
//!
//! # 打印 MSLUT 寄存器镜像
//! tmc-cli mslut --offset 100
//!
//! # 计算定位计划
//! tmc-cli plan --from 100 --to 900
//! ```
//!
//! ## 仿真
//!
//! ```bash
//! # 在 Mock 硬件上执行命令
//! tmc-cli simulate TMC_SET_WAVE_X100 TMC_SET_STEP_X1050
//!
//! # 按配置文件创建轴，从脚本读取命令
//! tmc-cli simulate --config linearity.toml --script moves.txt
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{
    CatalogueCommand, ConfigCommand, MslutCommand, PlanCommand, SimulateCommand, TableCommand,
};

/// TMC CLI - 步进电机线性度校正工具
#[derive(Parser, Debug)]
#[command(name = "tmc-cli")]
#[command(about = "TMC2130 wave tables and microstep positioning", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 生成恒力矩波表
    Table {
        #[command(flatten)]
        args: TableCommand,
    },

    /// 生成 MSLUT 寄存器镜像
    Mslut {
        #[command(flatten)]
        args: MslutCommand,
    },

    /// 计算定位计划
    Plan {
        #[command(flatten)]
        args: PlanCommand,
    },

    /// 在 Mock 硬件上执行命令
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },

    /// 列出命令目录
    Commands {
        #[command(flatten)]
        args: CatalogueCommand,
    },

    /// 配置文件管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tmc_linearity::init_logging("tmc_cli=info")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Table { args } => args.execute(),
        Commands::Mslut { args } => args.execute(),
        Commands::Plan { args } => args.execute(),
        Commands::Simulate { args } => args.execute(),
        Commands::Commands { args } => args.execute(),
        Commands::Config(cmd) => cmd.execute(),
    }
}
