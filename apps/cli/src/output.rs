//! 输出格式

use anyhow::{Result, bail};
use serde::Serialize;
use std::str::FromStr;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "table" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown output format: {} (expected text or json)", other),
        }
    }
}

/// 以 JSON 打印
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 每行 16 个值打印一张 256 项的表
pub fn print_rows(label: &str, values: impl Iterator<Item = u8>) {
    println!("{}:", label);
    let values: Vec<u8> = values.collect();
    for (row, chunk) in values.chunks(16).enumerate() {
        let line: Vec<String> = chunk.iter().map(|v| format!("{:3}", v)).collect();
        println!("  {:3}: {}", row * 16, line.join(" "));
    }
}
