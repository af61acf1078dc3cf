//! 驱动层错误类型定义

use crate::hardware::HardwareError;
use thiserror::Error;
use tmc_protocol::{AxisId, MicrostepPosition, Phase, ProtocolError};

/// 驱动层错误类型
///
/// 所有硬件相关的变体都携带轴标识，便于多轴场景下定位问题。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 协议校验错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 波表写入失败
    #[error("Wave table write failed on axis {axis} (phase {phase}): {source}")]
    WaveWrite {
        axis: AxisId,
        phase: Phase,
        source: HardwareError,
    },

    /// MSLUT 压缩镜像写入失败
    #[error("MSLUT write failed on axis {axis}: {source}")]
    MslutWrite { axis: AxisId, source: HardwareError },

    /// 微步计数器不可读，操作中止
    #[error("Microstep counter unavailable on axis {axis} (target {target}): {source}")]
    ReadbackUnavailable {
        axis: AxisId,
        target: MicrostepPosition,
        source: HardwareError,
    },

    /// 方向或脉冲信号发送失败
    #[error("Step/direction error on axis {axis} after {pulses_sent} pulses: {source}")]
    StepSignal {
        axis: AxisId,
        pulses_sent: u32,
        source: HardwareError,
    },

    /// 有限次重试后位置仍不一致
    #[error(
        "Position mismatch on axis {axis}: expected {expected}, actual {actual} after {retries} retries"
    )]
    PositionMismatch {
        axis: AxisId,
        expected: MicrostepPosition,
        actual: MicrostepPosition,
        retries: u8,
    },
}

impl DriverError {
    /// 出错的轴（协议错误不绑定轴）
    pub fn axis(&self) -> Option<&AxisId> {
        match self {
            DriverError::Protocol(_) => None,
            DriverError::WaveWrite { axis, .. }
            | DriverError::MslutWrite { axis, .. }
            | DriverError::ReadbackUnavailable { axis, .. }
            | DriverError::StepSignal { axis, .. }
            | DriverError::PositionMismatch { axis, .. } => Some(axis),
        }
    }
}
