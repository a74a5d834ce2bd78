//! 点击采集与后台任务
//!
//! - `classifier`: User-Agent 分类
//! - `recorder`: 单次点击的落库逻辑
//! - `pipeline`: 有界 worker 池，解析路径只负责提交
//! - `sweeper` / `retention`: 周期性的过期停用和事件清理

pub mod classifier;
pub mod periodic;
pub mod pipeline;
pub mod recorder;
pub mod retention;
pub mod sweeper;

pub use classifier::{Browser, ClientProfile, DeviceType, OperatingSystem, classify};
pub use periodic::{PeriodicHandle, PeriodicJob, spawn_periodic};
pub use pipeline::{ClickPipeline, PipelineStats, ShutdownReport};
pub use recorder::{ClickJob, ClickRecorder, ClientMetadata, RecordOutcome};
pub use retention::ClickRetentionTask;
pub use sweeper::ExpirationSweeper;
