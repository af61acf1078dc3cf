//! 线性度校正因子
//!
//! 内部以千分制整数保存（1000 = 1.000），保证命令参数与配置值可以精确往返。

use crate::ProtocolError;
use crate::constants::{
    FACTOR_OFFSET_STEP, MAX_FACTOR_OFFSET, MAX_LINEARITY_FACTOR, MIN_LINEARITY_FACTOR,
};
use std::fmt;

/// 小数因子的范围容差（只覆盖 f64 表示误差）
const DECIMAL_EPSILON: f64 = 1e-9;

/// 校正因子（千分制，1000..=1200）
///
/// 构造时校验范围，越界直接拒绝，不做截断：
/// 截断会让打印出的因子与实际写入驱动的波表不一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrectionFactor(u16);

impl CorrectionFactor {
    /// 不校正（标准正弦/余弦表）
    pub const NONE: Self = Self(MIN_LINEARITY_FACTOR);

    /// 最大推荐校正
    pub const MAX: Self = Self(MAX_LINEARITY_FACTOR);

    /// 从千分制整数创建
    pub fn from_millis(millis: i64) -> Result<Self, ProtocolError> {
        let range = i64::from(MIN_LINEARITY_FACTOR)..=i64::from(MAX_LINEARITY_FACTOR);
        if !range.contains(&millis) {
            return Err(ProtocolError::InvalidFactor {
                requested: format!("{} millis", millis),
                reason: "factor must be within 1000..=1200 millis",
            });
        }

        Ok(Self(millis as u16))
    }

    /// 从 "set wave" 命令偏移创建（因子 = 1000 + offset）
    ///
    /// 偏移必须是 0..=200 内 10 的倍数。
    pub fn from_offset(offset: i64) -> Result<Self, ProtocolError> {
        let in_range = (0..=i64::from(MAX_FACTOR_OFFSET)).contains(&offset);
        if !in_range || offset % i64::from(FACTOR_OFFSET_STEP) != 0 {
            return Err(ProtocolError::InvalidFactor {
                requested: format!("offset {}", offset),
                reason: "offset must be a multiple of 10 in 0..=200",
            });
        }

        Self::from_millis(i64::from(MIN_LINEARITY_FACTOR) + offset)
    }

    /// 从配置中的小数创建（1.0..=1.2）
    pub fn from_decimal(value: f64) -> Result<Self, ProtocolError> {
        if !value.is_finite() {
            return Err(ProtocolError::InvalidFactor {
                requested: format!("{}", value),
                reason: "factor must be a finite number",
            });
        }

        // 先按原始值校验范围，只容忍浮点表示误差，再四舍五入到千分位
        let min = f64::from(MIN_LINEARITY_FACTOR) / 1000.0 - DECIMAL_EPSILON;
        let max = f64::from(MAX_LINEARITY_FACTOR) / 1000.0 + DECIMAL_EPSILON;
        if !(min..=max).contains(&value) {
            return Err(ProtocolError::InvalidFactor {
                requested: format!("{}", value),
                reason: "factor must be within 1.0..=1.2",
            });
        }

        Ok(Self((value * 1000.0).round() as u16))
    }

    /// 千分制值
    pub fn millis(self) -> u16 {
        self.0
    }

    /// 相对 1000 的偏移（即 "set wave" 命令中的数值）
    pub fn offset(self) -> u16 {
        self.0 - MIN_LINEARITY_FACTOR
    }

    /// 幂律校正指数（1100 → 1.1）
    pub fn exponent(self) -> f64 {
        f64::from(self.0) / 1000.0
    }

    /// 是否为不校正
    pub fn is_identity(self) -> bool {
        self == Self::NONE
    }
}

impl Default for CorrectionFactor {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for CorrectionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.exponent())
    }
}
