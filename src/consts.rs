use std::env;

use const_format::concatcp;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("CDN_COMMIT");
pub const COMPILER: &str = env!("CDN_COMPILER");
pub const OS: &str = env::consts::OS;
pub const ARCH: &str = env::consts::ARCH;

/// `Server` response header value, e.g. `tiny-cdn/0.1.0`
pub const SERVER_TOKEN: &str = concatcp!(NAME, "/", VERSION);

// config defaults
pub const HOST_DEFAULT: &str = "127.0.0.1";
pub fn host_default() -> String {
    HOST_DEFAULT.to_string()
}

pub const PORT_DEFAULT: u16 = 3000;
pub fn port_default() -> u16 {
    PORT_DEFAULT
}

pub const PUBLIC_DIR_DEFAULT: &str = "./public";
pub fn public_dir_default() -> String {
    PUBLIC_DIR_DEFAULT.to_string()
}

pub const HOST_INDEX: &str = "index.html";
pub fn host_index() -> String {
    HOST_INDEX.to_string()
}

pub const PROCESS_TIMEOUT: u16 = 75;
pub fn process_timeout() -> u16 {
    PROCESS_TIMEOUT
}

pub const LOG_LEVEL_DEFAULT: &str = "info";
pub fn log_level_default() -> String {
    LOG_LEVEL_DEFAULT.to_string()
}

pub const LOG_FOLDER_DEFAULT: &str = "./logs";
pub fn log_folder_default() -> String {
    LOG_FOLDER_DEFAULT.to_string()
}

pub const CACHE_MAX_ITEMS: usize = 100;
pub fn cache_max_items() -> usize {
    CACHE_MAX_ITEMS
}

/// 1 MiB
pub const CACHE_MAX_FILE_SIZE: u64 = 1024 * 1024;
pub fn cache_max_file_size() -> u64 {
    CACHE_MAX_FILE_SIZE
}

pub const BROWSER_CACHE_TTL: u64 = 3600;
pub fn browser_cache_ttl() -> u64 {
    BROWSER_CACHE_TTL
}

pub const COMPRESSION_LEVEL: u32 = 6;
pub fn compression_level() -> u32 {
    COMPRESSION_LEVEL
}

pub fn enabled() -> bool {
    true
}

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub fn cors_allow_origin() -> String {
    CORS_ALLOW_ORIGIN.to_string()
}

pub const CORS_ALLOW_METHODS: &str = "GET, HEAD, OPTIONS";
pub fn cors_allow_methods() -> String {
    CORS_ALLOW_METHODS.to_string()
}

pub const CORS_ALLOW_HEADERS: &str = "Content-Type";
pub fn cors_allow_headers() -> String {
    CORS_ALLOW_HEADERS.to_string()
}
