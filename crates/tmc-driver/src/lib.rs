//! 驱动层模块
//!
//! 本模块提供步进驱动器的硬件抽象与微步定位，包括：
//! - 硬件能力 trait（波表写入、方向/脉冲、微步计数器读取）
//! - 微步定位状态机（读取 → 计算 → 脉冲 → 校验 → 有限重试）
//! - Mock 硬件（`mock` feature）：用于无硬件测试与仿真
//!
//! # 使用场景
//!
//! 需要直接控制单轴硬件时使用本层。
//! 大多数用户应该使用 `tmc-linearity` 提供的按轴/按命令的高层接口。

mod error;
pub mod hardware;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod positioner;

pub use error::DriverError;
pub use hardware::{AxisHardware, HardwareError, MicrostepCounter, StepDirection, WaveTableWriter};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockAxisHardware;
pub use positioner::{
    MovePlan, MoveReport, PositionerConfig, PositioningRequest, Readback, StepPositioner,
};
