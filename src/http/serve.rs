use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use http::{
    HeaderMap, HeaderValue, StatusCode,
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        CACHE_CONTROL, CONTENT_ENCODING, CONTENT_TYPE, ETAG, LAST_MODIFIED, VARY,
    },
};
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    http::{
        AppState,
        cache::CacheEntry,
        conditional::{self, Freshness},
        error::{RouteError, RouteResult},
        mime,
        resolve::resolve_path,
    },
    utils::compress,
};

/// 提供静态文件服务
///
/// 1. 解析请求路径，拒绝包含 `..` 的路径
/// 2. 从缓存读取文件，未命中时读取磁盘并写入缓存
/// 3. 检查 If-Modified-Since / If-None-Match，满足时返回 304
/// 4. 按 Accept-Encoding 协商 gzip 压缩并返回 200
///
/// 第 2 到 4 步受配置的请求超时限制，超时返回 504。
#[axum::debug_handler]
pub async fn serve(State(state): State<AppState>, request: Request) -> RouteResult<Response> {
    let settings = &state.settings;
    let path = cache_key(settings, request.uri().path())
        .inspect_err(|_| warn!("rejected path {}", request.uri().path()))?;
    debug!("resolved {} to {:?}", request.uri().path(), path);

    let timeout = Duration::from_secs(settings.timeout.into());
    tokio::time::timeout(timeout, deliver(&state, &path, request.headers()))
        .await
        .map_err(|_| {
            warn!("serving {:?} timed out after {:?}", path, timeout);
            RouteError::Timeout()
        })?
}

async fn deliver(
    state: &AppState,
    path: &Path,
    req_headers: &HeaderMap,
) -> RouteResult<Response> {
    let settings = &state.settings;
    let entry = fetch(state, path).await?;

    let etag = conditional::etag(entry.modified, entry.size);
    let mut headers = response_headers(settings, path, &entry, &etag)?;

    if conditional::evaluate(req_headers, entry.modified, &etag) == Freshness::NotModified {
        debug!("{:?} not modified", path);
        return Ok((StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let size = entry.size;
    let encoded = compress::negotiate(&settings.compression, req_headers, entry.content).await;
    if encoded.gzip {
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    }
    info!("{:?} - {} bytes", path, size);
    Ok((StatusCode::OK, headers, Body::from(encoded.body)).into_response())
}

/// Get a file from the cache, falling back to disk
///
/// A disk read always completes before the cache insert, and the insert
/// before the caller continues.
async fn fetch(state: &AppState, path: &Path) -> RouteResult<CacheEntry> {
    let config = &state.settings.cache;
    if !config.enabled {
        let (content, modified) = read_file(path).await?;
        return Ok(entry_of(content, modified));
    }

    if let Some(entry) = state.cache.get(path) {
        if !config.revalidate {
            debug!("[CACHE HIT] {:?}", path);
            return Ok(entry);
        }
        let modified = match file_modified(path).await {
            Ok(modified) => modified,
            Err(err) => {
                state.cache.remove(path);
                return Err(err);
            }
        };
        if modified == entry.modified {
            debug!("[CACHE HIT] {:?}", path);
            return Ok(entry);
        }
        info!("[CACHE STALE] {:?} changed on disk, reloading", path);
    }

    let (content, modified) = read_file(path).await?;
    if state.cache.put(path.to_path_buf(), content.clone(), modified) {
        debug!("[CACHE MISS] {:?} - added to cache", path);
    } else {
        debug!("[CACHE MISS] {:?} - not cached", path);
    }
    Ok(entry_of(content, modified))
}

fn entry_of(content: Bytes, modified: SystemTime) -> CacheEntry {
    CacheEntry {
        size: content.len() as u64,
        content,
        modified,
    }
}

/// Read a whole file and its modification time
async fn read_file(path: &Path) -> RouteResult<(Bytes, SystemTime)> {
    let mut file = File::open(path).await?;
    let metadata = file.metadata().await?;
    if metadata.is_dir() {
        warn!("{:?} is a directory", path);
        return Err(RouteError::InternalError());
    }
    let modified = metadata
        .modified()
        .with_context(|| "Get file modified time failed")?;

    let mut buffer = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut buffer).await?;
    Ok((Bytes::from(buffer), modified))
}

async fn file_modified(path: &Path) -> RouteResult<SystemTime> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata
        .modified()
        .with_context(|| "Get file modified time failed")?)
}

/// Headers shared by 200 and 304 responses
fn response_headers(
    settings: &Settings,
    path: &Path,
    entry: &CacheEntry,
    etag: &str,
) -> RouteResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime::from_path(path)));
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_str(&format!(
            "public, max-age={}",
            settings.cache.browser_cache_ttl
        ))
        .with_context(|| "Insert header failed")?,
    );
    headers.insert(
        LAST_MODIFIED,
        HeaderValue::from_str(&conditional::last_modified(entry.modified))
            .with_context(|| "Insert header failed")?,
    );
    headers.insert(
        ETAG,
        HeaderValue::from_str(etag).with_context(|| "Insert header failed")?,
    );
    if settings.compression.enabled {
        headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
    }

    let cors = &settings.cors;
    if cors.enabled {
        for (name, value) in [
            (ACCESS_CONTROL_ALLOW_ORIGIN, &cors.allow_origin),
            (ACCESS_CONTROL_ALLOW_METHODS, &cors.allow_methods),
            (ACCESS_CONTROL_ALLOW_HEADERS, &cors.allow_headers),
        ] {
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid CORS header value: {value}"))?;
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

/// Cache key a request path maps to, for callers inspecting the store
pub fn cache_key(settings: &Settings, req_path: &str) -> RouteResult<PathBuf> {
    resolve_path(req_path, &settings.root, &settings.index)
}
