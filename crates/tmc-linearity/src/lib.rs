//! TMC Linearity - TMC2130 步进电机线性度校正
//!
//! 为 TMC2130 驱动器生成恒力矩微步波表，并提供电周期内的微步定位，
//! 用于补偿步进电机在微步之间的非线性。
//!
//! # 架构设计
//!
//! - **协议层** (`tmc-protocol`): 校正因子、微步位置、波表生成、MSLUT 编码（纯计算）
//! - **驱动层** (`tmc-driver`): 硬件能力 trait、微步定位状态机、Mock 硬件
//! - **配置** (`tmc-tools`): TOML 配置模型
//! - **本 crate**: 按轴的波表/定位操作、命令解析、多轴控制器
//!
//! # 快速开始
//!
//! ```rust
//! use tmc_linearity::prelude::*;
//!
//! let pair = generate(CorrectionFactor::from_offset(100).unwrap());
//! assert_eq!(pair.sine[0], 0);
//! assert_eq!(pair.cosine[0], 248);
//! ```

pub mod axis;
pub mod command;
pub mod controller;
mod error;
pub mod logging;
pub mod prelude;

pub use axis::{LinearityAxis, StepOutcome, WaveOutcome, positioner_config};
pub use command::{CommandSpec, LinearityCommand, command_catalogue};
pub use controller::{CommandOutcome, LinearityController, SharedAxis};
pub use error::LinearityError;
pub use logging::init_logging;

pub use tmc_driver as driver;
pub use tmc_protocol as protocol;
pub use tmc_tools as tools;
