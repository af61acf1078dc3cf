//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use tmc_linearity::prelude::*;
//! ```

pub use crate::axis::{LinearityAxis, StepOutcome, WaveOutcome};
pub use crate::command::{CommandSpec, LinearityCommand, command_catalogue};
pub use crate::controller::{CommandOutcome, LinearityController, SharedAxis};
pub use crate::error::LinearityError;

// 协议层
pub use tmc_protocol::{
    AxisId, CorrectionFactor, Direction, DirectionMode, MicrostepPosition, MicrostepResolution,
    MslutImage, Phase, WavePair, WaveTable, generate,
};

// 驱动层（硬件 trait）
pub use tmc_driver::{
    AxisHardware, DriverError, MicrostepCounter, MovePlan, MoveReport, PositionerConfig,
    PositioningRequest, StepDirection, WaveTableWriter,
};

// 配置
pub use tmc_tools::LinearityConfig;
