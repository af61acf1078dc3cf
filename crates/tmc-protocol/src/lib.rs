//! # TMC Protocol
//!
//! 步进电机线性度校正的纯计算层（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 幅值、表长、因子范围等常量
//! - `registers`: TMC2130 寄存器地址
//! - `axis`: 轴标识（命令名中的轴字母）
//! - `factor`: 校正因子（千分制）
//! - `position`: 微步位置、微步分辨率、方向
//! - `wave`: 恒力矩波表生成
//! - `mslut`: MSLUT 压缩寄存器镜像编码/解码
//!
//! 所有类型都可以在任意线程中使用，不持有共享可变状态。

pub mod axis;
pub mod constants;
pub mod factor;
pub mod mslut;
pub mod position;
pub mod registers;
pub mod wave;

// 重新导出常用类型
pub use axis::AxisId;
pub use constants::*;
pub use factor::CorrectionFactor;
pub use mslut::{MslutImage, MslutSel, MslutStart};
pub use position::{Direction, DirectionMode, MicrostepPosition, MicrostepResolution};
pub use registers::Register;
pub use wave::{Phase, WavePair, WaveTable, generate};

use thiserror::Error;

/// 协议层错误类型
///
/// 边界校验失败时返回，调用方据此拒绝命令或配置，而不是静默截断。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid linearity factor {requested}: {reason}")]
    InvalidFactor {
        requested: String,
        reason: &'static str,
    },

    #[error("Invalid step target {raw}: expected an even value in 0..={max}")]
    InvalidTarget { raw: i64, max: u16 },

    #[error("Unsupported microstep resolution: {microsteps}")]
    InvalidResolution { microsteps: u32 },

    #[error("Invalid axis name: {0:?}")]
    InvalidAxis(String),

    #[error("MSLUT delta {delta} at index {index} is outside the encodable range -1..=3")]
    MslutDelta { index: usize, delta: i16 },

    #[error("MSLUT needs more than 4 segments (overflow at index {index})")]
    MslutSegments { index: usize },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl ProtocolError {
    /// 是否为校正因子相关的拒绝
    pub fn is_invalid_factor(&self) -> bool {
        matches!(self, ProtocolError::InvalidFactor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidFactor {
            requested: "offset 205".to_string(),
            reason: "offset must be a multiple of 10 in 0..=200",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("offset 205"), "message: {}", msg);
        assert!(err.is_invalid_factor());

        let err = ProtocolError::InvalidTarget { raw: 1051, max: 1050 };
        assert_eq!(
            format!("{}", err),
            "Invalid step target 1051: expected an even value in 0..=1050"
        );
        assert!(!err.is_invalid_factor());

        let err = ProtocolError::MslutSegments { index: 200 };
        assert!(format!("{}", err).contains("index 200"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let factor = CorrectionFactor::from_offset(150).unwrap();
        let json = serde_json::to_string(&factor).unwrap();
        assert_eq!(json, "1150");
        assert_eq!(serde_json::from_str::<CorrectionFactor>(&json).unwrap(), factor);

        let axis: AxisId = serde_json::from_str("\"E\"").unwrap();
        assert_eq!(axis.as_str(), "E");

        let mode: DirectionMode = serde_json::from_str("\"Backward\"").unwrap();
        assert_eq!(mode, DirectionMode::Backward);
    }
}
