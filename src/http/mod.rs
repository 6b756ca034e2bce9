use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::{Context, anyhow};
use axum::{Router, middleware};
use axum_server::Handle;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, error, info};

use crate::{
    config::Settings,
    http::cache::CacheStore,
    middlewares::{add_version, logging_route},
};

// 内存文件缓存
pub mod cache;
// 协商缓存 If-Modified-Since / If-None-Match
pub mod conditional;
pub mod error;
pub mod mime;
// 请求路径到磁盘路径
pub mod resolve;
// 处理静态文件
pub mod serve;

/// State shared by every request
///
/// The cache store is the only mutable piece, it synchronizes internally.
#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub cache: Arc<CacheStore>,
}

impl AppState {
    pub fn new(settings: Settings, cache: Arc<CacheStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            cache,
        }
    }
}

/// Build the application router
///
/// Every method and every path goes to the static file handler.
pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .fallback(serve::serve)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(middleware::from_fn(add_version)));
    logging_route(router)
}

/// 启动服务器
///
/// 绑定配置中的 `host:port` 并在后台任务中运行服务。监听成功后返回控制句柄和
/// 后台任务，绑定失败时返回错误。关闭时先调用 `graceful_shutdown`，再等待任务结束。
pub async fn make_server(
    settings: Settings,
    cache: Arc<CacheStore>,
) -> anyhow::Result<(Handle<SocketAddr>, JoinHandle<()>)> {
    debug!("make_server start with settings: {:?}", settings);
    let ip: IpAddr = settings
        .host
        .parse()
        .with_context(|| format!("invalid host address {}", settings.host))?;
    let addr = SocketAddr::new(ip, settings.port);

    info!("Serving files from: {:?}", settings.root);
    info!(
        "Cache: {} (max {} items, {} bytes per file)",
        if settings.cache.enabled { "enabled" } else { "disabled" },
        cache.max_items(),
        cache.max_file_size()
    );
    info!(
        "Compression: {}",
        if settings.compression.enabled { "enabled" } else { "disabled" }
    );
    info!(
        "CORS: {}",
        if settings.cors.enabled { "enabled" } else { "disabled" }
    );

    let router = router(AppState::new(settings, cache));

    let handle = Handle::new();
    let handle_clone = handle.clone();

    // 生成一个任务来运行服务器
    let task = tokio::spawn(async move {
        if let Err(err) = axum_server::bind(addr)
            .handle(handle_clone)
            .serve(router.into_make_service())
            .await
        {
            error!("Server on {} stopped: {:?}", addr, err);
        }
    });

    let listening = handle
        .listening()
        .await
        .ok_or_else(|| anyhow!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listening);

    Ok((handle, task))
}
