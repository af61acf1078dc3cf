//! # 线性度配置
//!
//! 配置文件示例：
//!
//! ```toml
//! [positioning]
//! dir_setup_us = 1
//! pulse_width_us = 2
//! step_interval_us = 1000
//! max_retries = 1
//! readback_timeout_ms = 50
//!
//! [axes.stepper_x]
//! linearity_factor = 1.1
//! invert_dir = false
//! microsteps = 256
//! ```
//!
//! 所有字段都有默认值；加载时统一校验，越界的因子直接拒绝而不是截断。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tmc_protocol::{
    AxisId, CorrectionFactor, MAX_RETRIES_LIMIT, MicrostepResolution, ProtocolError,
};

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration in [{section}]: {source}")]
    Invalid {
        section: String,
        source: ProtocolError,
    },

    #[error("max_retries {requested} exceeds the limit of {limit}")]
    TooManyRetries { requested: u8, limit: u8 },

    #[error("Sections [{first}] and [{second}] both map to axis {axis}")]
    DuplicateAxis {
        first: String,
        second: String,
        axis: AxisId,
    },
}

/// 线性度配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearityConfig {
    /// 定位参数（所有轴共用）
    pub positioning: PositioningConfig,

    /// 按步进电机段名索引的轴配置（`stepper_x`、`extruder` ...）
    pub axes: BTreeMap<String, AxisConfig>,
}

/// 定位参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositioningConfig {
    /// 方向建立时间（微秒）
    pub dir_setup_us: u64,
    /// 脉冲沿稳定时间（微秒）
    pub pulse_width_us: u64,
    /// 步进间隔（微秒）
    pub step_interval_us: u64,
    /// 校验失败后的重试次数
    pub max_retries: u8,
    /// 计数器读取超时（毫秒）
    pub readback_timeout_ms: u64,
}

impl Default for PositioningConfig {
    fn default() -> Self {
        Self {
            dir_setup_us: 1,
            pulse_width_us: 2,
            step_interval_us: 1000,
            max_retries: 1,
            readback_timeout_ms: 50,
        }
    }
}

/// 单轴配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// 线性度校正因子（1.0..=1.2）
    pub linearity_factor: f64,
    /// 方向信号反转
    pub invert_dir: bool,
    /// 微步分辨率
    pub microsteps: u32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            linearity_factor: 1.0,
            invert_dir: false,
            microsteps: 256,
        }
    }
}

impl AxisConfig {
    pub fn factor(&self) -> Result<CorrectionFactor, ProtocolError> {
        CorrectionFactor::from_decimal(self.linearity_factor)
    }

    pub fn resolution(&self) -> Result<MicrostepResolution, ProtocolError> {
        MicrostepResolution::new(self.microsteps)
    }
}

/// 校验后的轴配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAxis {
    /// 配置段名
    pub section: String,
    /// 命令轴标签
    pub axis: AxisId,
    pub factor: CorrectionFactor,
    pub resolution: MicrostepResolution,
    pub invert_dir: bool,
}

impl LinearityConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 保存到文件（保存前校验）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 添加或替换一个轴
    pub fn with_axis(mut self, section: impl Into<String>, axis: AxisConfig) -> Self {
        self.axes.insert(section.into(), axis);
        self
    }

    pub fn axis(&self, section: &str) -> Option<&AxisConfig> {
        self.axes.get(section)
    }

    /// 校验全部配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolved_axes().map(|_| ())
    }

    /// 校验并解析所有轴（按段名排序）
    pub fn resolved_axes(&self) -> Result<Vec<ResolvedAxis>, ConfigError> {
        if self.positioning.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::TooManyRetries {
                requested: self.positioning.max_retries,
                limit: MAX_RETRIES_LIMIT,
            });
        }

        let mut resolved: Vec<ResolvedAxis> = Vec::with_capacity(self.axes.len());
        for (section, axis_config) in &self.axes {
            let invalid = |source| ConfigError::Invalid {
                section: section.clone(),
                source,
            };

            let axis = AxisId::from_stepper_name(section).map_err(invalid)?;
            let factor = axis_config.factor().map_err(invalid)?;
            let resolution = axis_config.resolution().map_err(invalid)?;

            if let Some(existing) = resolved.iter().find(|r| r.axis == axis) {
                return Err(ConfigError::DuplicateAxis {
                    first: existing.section.clone(),
                    second: section.clone(),
                    axis,
                });
            }

            resolved.push(ResolvedAxis {
                section: section.clone(),
                axis,
                factor,
                resolution,
                invert_dir: axis_config.invert_dir,
            });
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[positioning]
step_interval_us = 500
max_retries = 2

[axes.stepper_x]
linearity_factor = 1.1

[axes.extruder]
linearity_factor = 1.15
invert_dir = true
microsteps = 16
"#;

    #[test]
    fn test_parse_sample() {
        let config = LinearityConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.positioning.step_interval_us, 500);
        assert_eq!(config.positioning.max_retries, 2);
        // 未指定的字段取默认值
        assert_eq!(config.positioning.dir_setup_us, 1);
        assert_eq!(config.axis("stepper_x").unwrap().microsteps, 256);

        let axes = config.resolved_axes().unwrap();
        assert_eq!(axes.len(), 2);
        // BTreeMap 按段名排序：extruder 在前
        assert_eq!(axes[0].axis.as_str(), "E");
        assert_eq!(axes[0].factor.millis(), 1150);
        assert_eq!(axes[0].resolution.microsteps(), 16);
        assert!(axes[0].invert_dir);
        assert_eq!(axes[1].axis.as_str(), "X");
        assert_eq!(axes[1].factor.millis(), 1100);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LinearityConfig::from_toml_str("").unwrap();
        assert_eq!(config, LinearityConfig::default());
        assert_eq!(config.positioning, PositioningConfig::default());
        assert!(config.axes.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_factor() {
        let err = LinearityConfig::from_toml_str(
            r#"
[axes.stepper_y]
linearity_factor = 1.3
"#,
        )
        .unwrap_err();

        match err {
            ConfigError::Invalid { section, source } => {
                assert_eq!(section, "stepper_y");
                assert!(source.is_invalid_factor());
            },
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_resolution_and_retries() {
        let err = LinearityConfig::default()
            .with_axis(
                "stepper_z",
                AxisConfig {
                    microsteps: 12,
                    ..AxisConfig::default()
                },
            )
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = LinearityConfig::from_toml_str("[positioning]\nmax_retries = 4\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooManyRetries {
                requested: 4,
                limit: 3
            }
        ));
    }

    #[test]
    fn test_rejects_duplicate_axis() {
        let err = LinearityConfig::default()
            .with_axis("stepper_x", AxisConfig::default())
            .with_axis("x", AxisConfig::default())
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAxis { .. }), "{:?}", err);
    }

    #[test]
    fn test_parse_error() {
        let err = LinearityConfig::from_toml_str("[axes.stepper_x\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("linearity.toml");

        let config = LinearityConfig::default().with_axis(
            "stepper_x",
            AxisConfig {
                linearity_factor: 1.05,
                invert_dir: true,
                microsteps: 64,
            },
        );
        config.save(&path).unwrap();

        let loaded = LinearityConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[axes.stepper_x]"), "{}", content);
    }

    #[test]
    fn test_save_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        let config = LinearityConfig::default().with_axis(
            "stepper_x",
            AxisConfig {
                linearity_factor: 0.5,
                ..AxisConfig::default()
            },
        );
        assert!(config.save(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = LinearityConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
