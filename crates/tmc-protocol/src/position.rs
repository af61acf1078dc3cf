//! 微步位置、分辨率与方向
//!
//! 一个电周期包含 4 个四分之一周期。满分辨率（256 微步）下周期为 1024，
//! 所有位置运算都对周期取模，方向在计算距离之前就已确定，
//! 因此下发给硬件的步数永远是非负数。

use crate::ProtocolError;
use crate::constants::{MAX_STEP_COMMAND, MSCNT_MASK, STEP_COMMAND_STEP};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

// ============================================================================
// 微步分辨率
// ============================================================================

/// 微步分辨率（每整步的微步数，256 >> MRES）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MicrostepResolution(u16);

impl MicrostepResolution {
    /// 256 微步（MRES = 0）
    pub const FULL: Self = Self(256);

    /// 从微步数创建（1, 2, 4, ..., 256）
    pub fn new(microsteps: u32) -> Result<Self, ProtocolError> {
        if microsteps == 0 || microsteps > 256 || !microsteps.is_power_of_two() {
            return Err(ProtocolError::InvalidResolution { microsteps });
        }
        Ok(Self(microsteps as u16))
    }

    /// 从 CHOPCONF.MRES 字段创建
    pub fn from_mres(mres: u8) -> Result<Self, ProtocolError> {
        if mres > 8 {
            return Err(ProtocolError::InvalidValue {
                field: "MRES".to_string(),
                value: mres.to_string(),
            });
        }
        Ok(Self(256 >> mres))
    }

    /// 每整步微步数
    pub fn microsteps(self) -> u16 {
        self.0
    }

    /// MRES 字段值，同时也是 MSCNT 到当前分辨率的右移位数
    pub fn mres(self) -> u8 {
        (256u16 / self.0).trailing_zeros() as u8
    }

    /// 一个电周期内的位置数（4 × 微步数）
    pub fn cycle(self) -> u16 {
        4 * self.0
    }

    /// 位置掩码（周期 - 1）
    pub fn mask(self) -> u16 {
        self.cycle() - 1
    }
}

impl Default for MicrostepResolution {
    fn default() -> Self {
        Self::FULL
    }
}

// ============================================================================
// 微步位置
// ============================================================================

/// 电周期内的绝对微步位置（单位为当前分辨率下的微步）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MicrostepPosition(u16);

impl MicrostepPosition {
    pub const ZERO: Self = Self(0);

    /// 对周期取模后创建
    pub fn wrapping(value: u32, resolution: MicrostepResolution) -> Self {
        Self((value % u32::from(resolution.cycle())) as u16)
    }

    /// 从 MSCNT 原始读数创建
    ///
    /// MSCNT 始终以 1/256 微步计数，先取低 10 位再按分辨率右移。
    pub fn from_mscnt(raw: u16, resolution: MicrostepResolution) -> Self {
        Self((raw & MSCNT_MASK) >> resolution.mres())
    }

    /// 从 "set step" 命令的原始目标值创建
    ///
    /// 原始值必须是 0..=1050 内的偶数；超过周期的部分按掩码折回（1050 → 26）。
    pub fn from_step_command(
        raw: i64,
        resolution: MicrostepResolution,
    ) -> Result<Self, ProtocolError> {
        let in_range = (0..=i64::from(MAX_STEP_COMMAND)).contains(&raw);
        if !in_range || raw % i64::from(STEP_COMMAND_STEP) != 0 {
            return Err(ProtocolError::InvalidTarget {
                raw,
                max: MAX_STEP_COMMAND,
            });
        }

        Ok(Self(raw as u16 & resolution.mask()))
    }

    /// 位置值
    pub fn value(self) -> u16 {
        self.0
    }

    /// 正向到达 `target` 需要的步数（对周期取模）
    pub fn forward_distance_to(self, target: Self, resolution: MicrostepResolution) -> u16 {
        let cycle = resolution.cycle();
        (target.0 % cycle + cycle - self.0 % cycle) % cycle
    }

    /// 沿 `direction` 走 `steps` 步后的位置
    pub fn advanced(self, direction: Direction, steps: u16, resolution: MicrostepResolution) -> Self {
        let cycle = u32::from(resolution.cycle());
        let steps = u32::from(steps) % cycle;
        let value = match direction {
            Direction::Forward => u32::from(self.0) + steps,
            Direction::Backward => u32::from(self.0) + cycle - steps,
        };
        Self((value % cycle) as u16)
    }
}

impl fmt::Display for MicrostepPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// 方向
// ============================================================================

/// 运动方向（已解析，不含 Auto）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// 微步计数器递增
    Forward,
    /// 微步计数器递减
    Backward,
}

impl Direction {
    /// 方向信号电平：正向为高，再与轴的反转标志异或
    pub fn signal(self, invert: bool) -> bool {
        (self == Direction::Forward) ^ invert
    }

    /// 反方向
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

/// 定位方向模式
///
/// 数值与固件 `goto_step` 的 `dir` 参数一致：0 = 反向，1 = 正向，2 = 自动。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DirectionMode {
    Backward = 0,
    Forward = 1,
    /// 自动选择最短路径（距离相等时取正向）
    Auto = 2,
}

impl Default for DirectionMode {
    fn default() -> Self {
        DirectionMode::Auto
    }
}

impl std::str::FromStr for DirectionMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FORWARD" | "FWD" | "1" => Ok(DirectionMode::Forward),
            "BACKWARD" | "BWD" | "0" => Ok(DirectionMode::Backward),
            "AUTO" | "2" => Ok(DirectionMode::Auto),
            _ => Err(ProtocolError::InvalidValue {
                field: "DIR".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DirectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionMode::Forward => f.write_str("forward"),
            DirectionMode::Backward => f.write_str("backward"),
            DirectionMode::Auto => f.write_str("auto"),
        }
    }
}
