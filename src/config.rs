use std::{
    fs,
    path::{self, PathBuf},
};

use serde::Deserialize;

use crate::{
    consts::{
        browser_cache_ttl, cache_max_file_size, cache_max_items, compression_level,
        cors_allow_headers, cors_allow_methods, cors_allow_origin, enabled, host_default,
        host_index, log_folder_default, log_level_default, port_default, process_timeout,
        public_dir_default,
    },
    error::{Error, Result},
};

/// In-memory file cache settings
#[derive(Deserialize, Clone, Debug)]
pub struct CacheConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// Entry count that triggers eviction on the next insert
    #[serde(default = "cache_max_items")]
    pub max_items: usize,
    /// Files larger than this (bytes) are never cached
    #[serde(default = "cache_max_file_size")]
    pub max_file_size: u64,
    /// `Cache-Control: max-age` sent to clients, in seconds
    #[serde(default = "browser_cache_ttl")]
    pub browser_cache_ttl: u64,
    /// Stat the file on every hit and reload it when its mtime changed
    #[serde(default)]
    pub revalidate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: enabled(),
            max_items: cache_max_items(),
            max_file_size: cache_max_file_size(),
            browser_cache_ttl: browser_cache_ttl(),
            revalidate: false,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct CompressionConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// gzip level, 0 - 9
    #[serde(default = "compression_level")]
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: enabled(),
            level: compression_level(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "cors_allow_origin")]
    pub allow_origin: String,
    #[serde(default = "cors_allow_methods")]
    pub allow_methods: String,
    #[serde(default = "cors_allow_headers")]
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_origin: cors_allow_origin(),
            allow_methods: cors_allow_methods(),
            allow_headers: cors_allow_headers(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default = "host_default")]
    pub host: String,
    #[serde(default = "port_default")]
    pub port: u16,
    /// The static assets root folder
    #[serde(default = "public_dir_default")]
    pub public_dir: String,
    /// Absolute form of `public_dir`, resolved after loading
    #[serde(skip_deserializing)]
    pub root: PathBuf,
    /// Default document for directory requests
    #[serde(default = "host_index")]
    pub index: String,
    /// Per request timeout in seconds, covers disk reads and compression
    #[serde(default = "process_timeout")]
    pub timeout: u16,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "log_folder_default")]
    pub log_folder: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self> {
        let file = fs::read_to_string(path)?;
        Self::from_toml(&file)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        settings.root = path::absolute(&settings.public_dir)?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.compression.level > 9 {
            return Err(Error::InvalidConfig(format!(
                "compression level must be between 0 and 9, got {}",
                self.compression.level
            )));
        }
        if self.timeout == 0 {
            return Err(Error::InvalidConfig("timeout must be greater than 0".into()));
        }
        if matches!(self.index.as_str(), "" | "." | "..") || self.index.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "index must be a plain file name, got {:?}",
                self.index
            )));
        }
        Ok(())
    }
}
