//! 日志初始化
//!
//! 控制台输出加按天滚动的日志文件 `photoshelf.log`。返回的 guard 必须
//! 保持到进程结束，否则文件里最后几行会丢失。

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 日志文件名前缀
pub const LOG_FILE_NAME: &str = "photoshelf.log";

/// 构造过滤器。设置了 RUST_LOG 时以它为准，否则用配置里的级别
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化全局日志
pub fn init_logging(level: &str, logs_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    tracing::debug!("日志目录: {:?}", logs_dir);
    Ok(guard)
}
