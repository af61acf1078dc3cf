//! # TMC Tools
//!
//! 线性度校正的配置模型，供 SDK 与 CLI 共享。
//!
//! - `config`: TOML 配置（按步进电机段划分的轴配置与定位参数）

pub mod config;

pub use config::{AxisConfig, ConfigError, LinearityConfig, PositioningConfig, ResolvedAxis};
