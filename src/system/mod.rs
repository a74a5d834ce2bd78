//! System-level modules
//!
//! - 日志初始化
//! - 进程信号

pub mod logging;
pub mod signal;

pub use logging::init_logging;
