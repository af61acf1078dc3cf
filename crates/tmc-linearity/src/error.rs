//! SDK 层错误类型定义

use thiserror::Error;
use tmc_driver::DriverError;
use tmc_protocol::{AxisId, CorrectionFactor, ProtocolError};
use tmc_tools::ConfigError;

/// SDK 层错误类型
#[derive(Error, Debug)]
pub enum LinearityError {
    /// "set wave" 参数被拒绝，当前波表保持不变
    #[error("Rejected wave offset {requested} for axis {axis} (current factor {current}): {source}")]
    InvalidWave {
        axis: AxisId,
        requested: i64,
        current: CorrectionFactor,
        source: ProtocolError,
    },

    /// "set step" 参数被拒绝
    #[error("Rejected step target {requested} for axis {axis}: {source}")]
    InvalidStep {
        axis: AxisId,
        requested: i64,
        source: ProtocolError,
    },

    /// 驱动层错误（携带轴标识）
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 波表写入失败且无法恢复上一组波表，驱动器内容未知
    #[error("Wave table write failed on axis {axis} and the previous table was not restored: {source}")]
    WaveRollback {
        axis: AxisId,
        source: DriverError,
        /// 恢复写入的错误（没有上一组波表时为 None）
        restore: Option<DriverError>,
    },

    /// 协议层错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown axis: {0}")]
    UnknownAxis(AxisId),

    #[error("Axis {0} is already registered")]
    DuplicateAxis(AxisId),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid parameter {name} for {command}: {value}")]
    InvalidParameter {
        command: String,
        name: String,
        value: String,
    },
}

impl LinearityError {
    /// 是否为参数校验失败（硬件未被访问）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LinearityError::InvalidWave { .. }
                | LinearityError::InvalidStep { .. }
                | LinearityError::UnknownAxis(_)
                | LinearityError::UnknownCommand(_)
                | LinearityError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_wave_display() {
        let err = LinearityError::InvalidWave {
            axis: AxisId::new("X").unwrap(),
            requested: 205,
            current: CorrectionFactor::from_millis(1100).unwrap(),
            source: ProtocolError::InvalidFactor {
                requested: "offset 205".to_string(),
                reason: "offset must be a multiple of 10 in 0..=200",
            },
        };
        let msg = format!("{}", err);
        assert!(msg.contains("205") && msg.contains("axis X") && msg.contains("1.100"), "{}", msg);
        assert!(err.is_rejection());
    }

    #[test]
    fn test_from_driver_error() {
        let err: LinearityError = DriverError::Protocol(ProtocolError::InvalidAxis("?".into())).into();
        assert!(matches!(err, LinearityError::Driver(_)));
        assert!(!err.is_rejection());
    }
}
