//! 硬件抽象层
//!
//! 驱动层只通过以下三个能力访问步进驱动器：
//!
//! - [`WaveTableWriter`]：写入单相波表（以及可选的 MSLUT 寄存器镜像）
//! - [`StepDirection`]：设置方向信号、发送单个步进脉冲
//! - [`MicrostepCounter`]：读取 10 bit 微步计数器（MSCNT）
//!
//! 三者合起来构成 [`AxisHardware`]，任何同时实现了三个 trait 的类型都自动满足。

use std::time::Duration;
use thiserror::Error;
use tmc_protocol::{AxisId, MslutImage, Phase, WaveTable};

/// 硬件访问错误
#[derive(Error, Debug)]
pub enum HardwareError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("Device Error: {0}")]
    Device(String),
    #[error("Device not ready")]
    NotReady,
}

impl HardwareError {
    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, HardwareError::Timeout)
    }
}

impl From<String> for HardwareError {
    fn from(message: String) -> Self {
        HardwareError::Device(message)
    }
}

impl From<&str> for HardwareError {
    fn from(message: &str) -> Self {
        HardwareError::Device(message.to_string())
    }
}

pub trait WaveTableWriter {
    fn write_wave_table(
        &mut self,
        axis: &AxisId,
        phase: Phase,
        table: &WaveTable,
    ) -> Result<(), HardwareError>;

    /// 写入压缩后的 MSLUT 寄存器镜像
    ///
    /// 不支持直接写寄存器的后端保持默认实现即可。
    fn write_mslut(&mut self, _axis: &AxisId, _image: &MslutImage) -> Result<(), HardwareError> {
        Ok(())
    }
}

pub trait StepDirection {
    /// 设置方向信号电平（已与反转标志异或）
    fn set_direction(&mut self, axis: &AxisId, level: bool) -> Result<(), HardwareError>;
    fn pulse(&mut self, axis: &AxisId) -> Result<(), HardwareError>;
}

pub trait MicrostepCounter {
    /// 读取 MSCNT 原始值（1/256 微步，低 10 bit 有效）
    fn read_microstep_counter(
        &mut self,
        axis: &AxisId,
        timeout: Duration,
    ) -> Result<u16, HardwareError>;
}

/// 单轴完整硬件能力
pub trait AxisHardware: WaveTableWriter + StepDirection + MicrostepCounter {}

impl<T: WaveTableWriter + StepDirection + MicrostepCounter + ?Sized> AxisHardware for T {}

impl<T: WaveTableWriter + ?Sized> WaveTableWriter for Box<T> {
    fn write_wave_table(
        &mut self,
        axis: &AxisId,
        phase: Phase,
        table: &WaveTable,
    ) -> Result<(), HardwareError> {
        (**self).write_wave_table(axis, phase, table)
    }

    fn write_mslut(&mut self, axis: &AxisId, image: &MslutImage) -> Result<(), HardwareError> {
        (**self).write_mslut(axis, image)
    }
}

impl<T: StepDirection + ?Sized> StepDirection for Box<T> {
    fn set_direction(&mut self, axis: &AxisId, level: bool) -> Result<(), HardwareError> {
        (**self).set_direction(axis, level)
    }

    fn pulse(&mut self, axis: &AxisId) -> Result<(), HardwareError> {
        (**self).pulse(axis)
    }
}

impl<T: MicrostepCounter + ?Sized> MicrostepCounter for Box<T> {
    fn read_microstep_counter(
        &mut self,
        axis: &AxisId,
        timeout: Duration,
    ) -> Result<u16, HardwareError> {
        (**self).read_microstep_counter(axis, timeout)
    }
}
