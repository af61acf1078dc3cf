//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 订阅者（`RUST_LOG` 优先，其次是默认指令，输出到 stderr），
//! 并通过 `tracing-log` 把 `log` crate 的记录转发到 tracing。

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::prelude::*;

/// 日志初始化错误
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log directive: {0}")]
    Directive(#[from] ParseError),

    #[error("Failed to install log bridge: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),

    #[error("Global subscriber already set: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// 初始化全局日志
///
/// `default_directive` 形如 `"tmc_linearity=info"`，
/// 与环境变量 `RUST_LOG` 中的指令合并。
///
/// # Example
///
/// ```no_run
/// tmc_linearity::logging::init_logging("tmc_linearity=debug").unwrap();
/// ```
pub fn init_logging(default_directive: &str) -> Result<(), LoggingError> {
    let directive: Directive = default_directive.parse()?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    tracing_log::LogTracer::init()?;

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_directive() {
        let err = init_logging("tmc_linearity=loud").unwrap_err();
        assert!(matches!(err, LoggingError::Directive(_)));
    }
}
