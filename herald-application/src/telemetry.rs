use herald_domain::logging::LogLevel;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// 安装全局 tracing 订阅器：`RUST_LOG` 优先，否则使用给定级别
///
/// 重复安装返回错误，不会覆盖已有订阅器。
pub fn init_tracing(level: LogLevel) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level.into()).into())
        .from_env_lossy();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
}
