//! 轴标识
//!
//! 轴标识是命令名中出现的轴标签（如 `TMC_SET_WAVE_X100` 中的 `X`）。

use crate::ProtocolError;
use std::fmt;

/// 常用步进电机段名到命令轴字母的映射
const STEPPER_LABELS: [(&str, &str); 4] = [
    ("stepper_x", "X"),
    ("stepper_y", "Y"),
    ("stepper_z", "Z"),
    ("extruder", "E"),
];

/// 轴标识（命令轴标签）
///
/// 只包含大写 ASCII 字母、数字和下划线，且不能以数字结尾，
/// 否则无法与命令名尾部的数值区分。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisId(String);

impl AxisId {
    /// 从轴标签创建（自动转为大写）
    pub fn new(label: impl AsRef<str>) -> Result<Self, ProtocolError> {
        let label = label.as_ref().trim().to_ascii_uppercase();

        let valid_chars = label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        let ends_with_digit = label.chars().last().is_some_and(|c| c.is_ascii_digit());

        if label.is_empty() || !valid_chars || ends_with_digit {
            return Err(ProtocolError::InvalidAxis(label));
        }

        Ok(Self(label))
    }

    /// 从步进电机段名推导轴标签
    ///
    /// `stepper_x` → `X`，`extruder` → `E`，其他名称取大写形式。
    pub fn from_stepper_name(name: &str) -> Result<Self, ProtocolError> {
        let name = name.trim();
        let label = STEPPER_LABELS
            .iter()
            .find(|(stepper, _)| stepper.eq_ignore_ascii_case(name))
            .map(|(_, label)| *label)
            .unwrap_or(name);

        Self::new(label)
    }

    /// 轴标签字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AxisId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
