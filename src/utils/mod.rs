// gzip 协商与压缩
pub mod compress;
pub mod logging;
pub mod shutdown;

pub use logging::*;
pub use shutdown::shutdown_signal;
