//! linkpulse - short link resolution with click analytics
//!
//! 短码解析走 cache-aside，点击采集异步进行，不阻塞解析路径。
//!
//! # Features
//! - **cli**: 命令行工具 (default)
//!
//! # Architecture
//! - `utils`: base62 编码、时钟、URL 校验、时间解析
//! - `cache`: 解析缓存及其后端（moka / Redis / none）
//! - `storage`: 链接与点击事件的持久化（SeaORM / 内存）
//! - `analytics`: UA 分类、点击流水线、周期任务
//! - `services`: 短码生成、链接服务、统计服务
//! - `runtime`: 组装与生命周期
//! - `config` / `system` / `errors`: 配置、日志与信号、错误类型

pub mod analytics;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
#[cfg(feature = "cli")]
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
