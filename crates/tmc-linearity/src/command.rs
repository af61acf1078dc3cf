//! 命令解析
//!
//! 命令名把轴标签与数值编码在一起：
//!
//! - `TMC_SET_WAVE_<AXIS><OFFSET>`：OFFSET ∈ {0, 10, ..., 200}，因子 = 1000 + OFFSET
//! - `TMC_SET_STEP_<AXIS><STEP>`：STEP ∈ {0, 2, ..., 1050}，可选参数 `DIR=FORWARD|BACKWARD|AUTO`
//!
//! 解析只做语法拆分，数值范围由 [`LinearityAxis`](crate::LinearityAxis) 校验，
//! 这样越界的偏移会以 `InvalidWave` 的形式携带轴与当前因子返回。

use crate::error::LinearityError;
use std::fmt;
use tmc_protocol::{
    AxisId, DirectionMode, FACTOR_OFFSET_STEP, MAX_FACTOR_OFFSET, MAX_STEP_COMMAND,
    MIN_LINEARITY_FACTOR, STEP_COMMAND_STEP,
};

const SET_WAVE_PREFIX: &str = "TMC_SET_WAVE_";
const SET_STEP_PREFIX: &str = "TMC_SET_STEP_";

/// 解析后的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinearityCommand {
    /// 设置线性度因子
    SetWave { axis: AxisId, offset: i64 },
    /// 移动到微步位置
    SetStep {
        axis: AxisId,
        target: i64,
        mode: DirectionMode,
    },
}

impl LinearityCommand {
    /// 解析一行命令（大小写不敏感）
    ///
    /// ```
    /// use tmc_linearity::LinearityCommand;
    /// use tmc_protocol::DirectionMode;
    ///
    /// let cmd = LinearityCommand::parse("TMC_SET_STEP_X1050 DIR=FORWARD").unwrap();
    /// assert_eq!(cmd.axis().as_str(), "X");
    /// assert!(matches!(cmd, LinearityCommand::SetStep { target: 1050, mode: DirectionMode::Forward, .. }));
    /// ```
    pub fn parse(line: &str) -> Result<Self, LinearityError> {
        let mut parts = line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| LinearityError::UnknownCommand(line.to_string()))?
            .to_ascii_uppercase();

        let (is_wave, rest) = if let Some(rest) = name.strip_prefix(SET_WAVE_PREFIX) {
            (true, rest)
        } else if let Some(rest) = name.strip_prefix(SET_STEP_PREFIX) {
            (false, rest)
        } else {
            return Err(LinearityError::UnknownCommand(name));
        };

        let (axis, value) = split_axis_value(rest)
            .ok_or_else(|| LinearityError::UnknownCommand(name.clone()))?;

        let mut mode = DirectionMode::Auto;
        for param in parts {
            let (key, raw) = param.split_once('=').unwrap_or((param, ""));
            let key = key.to_ascii_uppercase();
            let invalid = || LinearityError::InvalidParameter {
                command: name.clone(),
                name: key.clone(),
                value: raw.to_string(),
            };

            if is_wave || key != "DIR" {
                return Err(invalid());
            }
            mode = raw.parse().map_err(|_| invalid())?;
        }

        Ok(if is_wave {
            LinearityCommand::SetWave {
                axis,
                offset: value,
            }
        } else {
            LinearityCommand::SetStep {
                axis,
                target: value,
                mode,
            }
        })
    }

    pub fn axis(&self) -> &AxisId {
        match self {
            LinearityCommand::SetWave { axis, .. } | LinearityCommand::SetStep { axis, .. } => axis,
        }
    }

    /// 命令名（不含参数）
    pub fn name(&self) -> String {
        match self {
            LinearityCommand::SetWave { axis, offset } => {
                format!("{}{}{}", SET_WAVE_PREFIX, axis, offset)
            },
            LinearityCommand::SetStep { axis, target, .. } => {
                format!("{}{}{}", SET_STEP_PREFIX, axis, target)
            },
        }
    }
}

impl fmt::Display for LinearityCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())?;
        match self {
            LinearityCommand::SetStep { mode, .. } if *mode != DirectionMode::Auto => {
                write!(f, " DIR={}", mode.to_string().to_ascii_uppercase())
            },
            _ => Ok(()),
        }
    }
}

/// "X1050" → (X, 1050)；轴标签不能以数字结尾，因此尾部数字即为数值
fn split_axis_value(rest: &str) -> Option<(AxisId, i64)> {
    let digits = rest.len() - rest.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 || digits == rest.len() {
        return None;
    }

    let (label, number) = rest.split_at(rest.len() - digits);
    let axis = AxisId::new(label).ok()?;
    let value = number.parse().ok()?;
    Some((axis, value))
}

// ============================================================================
// 命令目录
// ============================================================================

/// 命令目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
}

/// 枚举一个轴的全部命令名（21 个 "set wave" + 526 个 "set step"）
pub fn command_catalogue(axis: &AxisId) -> Vec<CommandSpec> {
    let waves = (0..=MAX_FACTOR_OFFSET)
        .step_by(usize::from(FACTOR_OFFSET_STEP))
        .map(|offset| CommandSpec {
            name: format!("{}{}{}", SET_WAVE_PREFIX, axis, offset),
            description: format!(
                "Set TMC2130 linearity factor to {:.3}",
                f64::from(MIN_LINEARITY_FACTOR + offset) / 1000.0
            ),
        });

    let steps = (0..=MAX_STEP_COMMAND)
        .step_by(usize::from(STEP_COMMAND_STEP))
        .map(|step| CommandSpec {
            name: format!("{}{}{}", SET_STEP_PREFIX, axis, step),
            description: format!("Move TMC2130 to microstep position {}", step),
        });

    waves.chain(steps).collect()
}
