//! 集成测试的公共辅助函数和工具
#![allow(dead_code)]

use std::{fs, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use tiny_cdn::{
    config::Settings,
    http::{self, cache::CacheStore, serve::cache_key},
};

/// 测试服务器配置
#[derive(Debug)]
pub struct TestServerConfig {
    pub host: String,
    pub port: u16,
    /// Extra toml appended after the top level keys
    pub extra: String,
    /// Files written below the public folder, `(relative path, content)`
    pub files: Vec<(String, Vec<u8>)>,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            // 由系统分配端口
            port: 0,
            extra: String::new(),
            files: Vec::new(),
        }
    }
}

impl TestServerConfig {
    pub fn with_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((name.to_string(), content.into()));
        self
    }

    pub fn with_extra(mut self, extra: &str) -> Self {
        self.extra.push_str(extra);
        self
    }
}

/// 运行中的测试服务器
pub struct TestServer {
    pub handle: axum_server::Handle<SocketAddr>,
    /// Background serve task, `None` once awaited by `stop`
    pub task: Option<JoinHandle<()>>,
    pub addr: SocketAddr,
    pub cache: Arc<CacheStore>,
    pub settings: Settings,
    pub dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Cache key for a request path
    pub fn key(&self, req_path: &str) -> PathBuf {
        cache_key(&self.settings, req_path).expect("Invalid request path")
    }

    pub fn public(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    /// Graceful shutdown, waits for the serve task to finish
    pub async fn stop(&mut self, grace: Duration) -> Result<()> {
        self.handle.graceful_shutdown(Some(grace));
        if let Some(task) = self.task.take() {
            tokio::time::timeout(grace * 2, task).await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}

/// 创建临时配置文件用于测试
pub fn create_temp_config(config: &TestServerConfig, dir: &TempDir) -> Result<PathBuf> {
    let public = dir.path().join("public");
    fs::create_dir_all(&public)?;
    for (name, content) in &config.files {
        let file = public.join(name);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(file, content)?;
    }

    let mut config_content = String::new();
    config_content.push_str(&format!("host = \"{}\"\n", config.host));
    config_content.push_str(&format!("port = {}\n", config.port));
    config_content.push_str(&format!(
        "public_dir = '{}'\n",
        public.to_str().expect("Invalid path")
    ));
    config_content.push_str(&format!(
        "log_folder = '{}'\n",
        dir.path().join("logs").to_str().expect("Invalid path")
    ));
    config_content.push_str(&config.extra);

    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, config_content)?;
    Ok(config_path)
}

/// 启动测试服务器
pub async fn start_test_server(config: TestServerConfig) -> Result<TestServer> {
    let dir = TempDir::new()?;
    let config_path = create_temp_config(&config, &dir)?;

    let settings = Settings::new(config_path.to_str().expect("Invalid path"))?;
    let cache = Arc::new(CacheStore::from_config(&settings.cache));
    let (handle, task) = http::make_server(settings.clone(), cache.clone()).await?;
    let addr = get_server_addr(&handle).await;

    Ok(TestServer {
        handle,
        task: Some(task),
        addr,
        cache,
        settings,
        dir,
    })
}

/// 获取服务器实际监听地址
pub async fn get_server_addr(handle: &axum_server::Handle<SocketAddr>) -> SocketAddr {
    handle.listening().await.expect("Server not listening")
}

/// 发送HTTP请求到测试服务器
pub async fn send_test_request(server: &TestServer, path: &str) -> Result<reqwest::Response> {
    let client = reqwest::Client::new();
    client.get(server.url(path)).send().await.map_err(Into::into)
}
