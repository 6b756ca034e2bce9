use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use tiny_cdn::{
    cli::Cli,
    config::Settings,
    consts::{ARCH, COMMIT, COMPILER, NAME, OS, VERSION},
    http::{cache::CacheStore, make_server},
    utils::{init_logger, shutdown_signal},
};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings = Settings::new(&args.config)
        .with_context(|| format!("init config {} failed", args.config))?;

    let _guard = init_logger(settings.log_level.as_str(), settings.log_folder.as_str())
        .with_context(|| "init logger failed")?;

    debug!("settings {:?}", settings);
    info!("{}/{} {}", NAME, VERSION, COMMIT);
    info!("{}", COMPILER);
    info!("OS: {} {}", OS, ARCH);

    let cache = Arc::new(CacheStore::from_config(&settings.cache));
    let (handle, server) = make_server(settings, cache)
        .await
        .with_context(|| "start server failed")?;

    info!("Server started");

    let signal = shutdown_signal().await?;
    info!("Received {}, shutting down", signal);

    // 优雅关闭服务器，等待进行中的请求完成
    handle.graceful_shutdown(Some(Duration::from_secs(30)));
    server
        .await
        .with_context(|| "server task failed during shutdown")?;
    info!("Server has shut down");

    Ok(())
}
