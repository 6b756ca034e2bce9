use anyhow::Context;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::consts::NAME;

/// 初始化 Logger
///
/// 日志同时写入控制台和 `log_folder` 下按天分割的 `tiny-cdn.<date>.log` 文件。
/// 设置了 `RUST_LOG` 时优先使用环境变量，否则使用配置中的 `log_level`。
///
/// 返回的 guard 需要一直持有，丢弃后文件日志不再写入。
pub fn init_logger(log_level: &str, log_folder: &str) -> anyhow::Result<WorkerGuard> {
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(log_folder)?);

    let file_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(non_blocking);
    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(log_level));
    let collector = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(collector)
        .with_context(|| "to set a global collector")?;
    Ok(guard)
}

fn file_appender(log_folder: &str) -> anyhow::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(NAME)
        .filename_suffix("log")
        .build(log_folder)
        .with_context(|| format!("create log folder {log_folder} failed"))
}

/// Filter from a configured level, `info` when it does not parse
fn level_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|err| {
        eprintln!("invalid log_level {log_level:?}: {err}, using info");
        EnvFilter::new("info")
    })
}
