//! 点击采集流水线
//!
//! 固定数量的 worker 共享一个有界队列：
//! - 入队成功立即返回
//! - 队列已满或已关闭时由提交方就地处理，不丢弃
//! - 记录失败只计数和记日志，不向解析路径传播

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::recorder::{ClickJob, ClickRecorder, ClientMetadata, RecordOutcome};
use crate::config::PipelineConfig;
use crate::utils::Clock;

/// 流水线计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// 成功入队
    pub queued: u64,
    pub recorded: u64,
    pub skipped: u64,
    pub failed: u64,
    /// 由提交方就地处理
    pub inline: u64,
    /// 关闭超时后丢弃
    pub discarded: u64,
}

impl PipelineStats {
    pub fn processed(&self) -> u64 {
        self.recorded + self.skipped + self.failed
    }
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    recorded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    inline: AtomicU64,
    discarded: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            queued: self.queued.load(Ordering::Relaxed),
            recorded: self.recorded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            inline: self.inline.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// 关闭结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// 宽限期内 worker 是否全部退出
    pub drained: bool,
    pub discarded: u64,
}

struct Shared {
    recorder: ClickRecorder,
    counters: Counters,
}

impl Shared {
    async fn process(&self, job: ClickJob) {
        match self.recorder.record(&job).await {
            Ok(RecordOutcome::Recorded) => {
                self.counters.recorded.fetch_add(1, Ordering::Relaxed);
            }
            Ok(RecordOutcome::Skipped) => {
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("Failed to record click for '{}': {}", job.code, e);
            }
        }
    }
}

pub struct ClickPipeline {
    shared: Arc<Shared>,
    /// 关闭后为 None
    sender: parking_lot::Mutex<Option<mpsc::Sender<ClickJob>>>,
    receiver: Arc<Mutex<mpsc::Receiver<ClickJob>>>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    clock: Arc<dyn Clock>,
}

impl ClickPipeline {
    /// 创建并启动 worker，需要在 tokio 运行时中调用
    pub fn start(recorder: ClickRecorder, config: &PipelineConfig, clock: Arc<dyn Clock>) -> Self {
        let worker_count = config.worker_count.max(1);
        let (tx, rx) = mpsc::channel::<ClickJob>(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(rx));
        let shared = Arc::new(Shared {
            recorder,
            counters: Counters::default(),
        });

        let workers = (0..worker_count)
            .map(|id| {
                let shared = Arc::clone(&shared);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        // 只在取任务时持锁
                        let next = receiver.lock().await.recv().await;
                        let Some(job) = next else {
                            break;
                        };
                        trace!("Worker {} processing click for {}", id, job.code);
                        shared.process(job).await;
                    }
                    trace!("Click worker {} exited", id);
                })
            })
            .collect();

        info!(
            "Click pipeline started: {} workers, queue capacity {}",
            worker_count, config.queue_capacity
        );

        Self {
            shared,
            sender: parking_lot::Mutex::new(Some(tx)),
            receiver,
            workers: parking_lot::Mutex::new(workers),
            clock,
        }
    }

    /// 提交一次点击。入队成功立即返回，否则在当前任务中处理完再返回
    pub async fn submit(&self, code: &str, metadata: ClientMetadata) {
        let job = ClickJob {
            code: code.to_string(),
            metadata,
            occurred_at: self.clock.now(),
        };

        let sender = self.sender.lock().clone();
        let job = match sender {
            Some(tx) => match tx.try_send(job) {
                Ok(()) => {
                    self.shared.counters.queued.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(mpsc::error::TrySendError::Full(job)) => {
                    debug!("Click queue full, recording '{}' inline", job.code);
                    job
                }
                Err(mpsc::error::TrySendError::Closed(job)) => job,
            },
            None => job,
        };

        self.shared.counters.inline.fetch_add(1, Ordering::Relaxed);
        self.shared.process(job).await;
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// 等待所有已入队任务处理完成，超时返回 false
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let stats = self.stats();
            if stats.processed() >= stats.queued + stats.inline {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// 关闭队列，等待 worker 处理完剩余任务，超过 `grace` 后中止并丢弃剩余任务
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        let Some(sender) = self.sender.lock().take() else {
            return ShutdownReport {
                drained: true,
                discarded: 0,
            };
        };
        drop(sender);

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        let drained = tokio::time::timeout(grace, join_all(handles)).await.is_ok();
        if drained {
            info!("Click pipeline drained");
            return ShutdownReport {
                drained: true,
                discarded: 0,
            };
        }

        for handle in &aborts {
            handle.abort();
        }

        // 中止后锁会随任务释放
        let mut discarded = 0;
        let mut rx = self.receiver.lock().await;
        while rx.try_recv().is_ok() {
            discarded += 1;
        }
        self.shared
            .counters
            .discarded
            .fetch_add(discarded, Ordering::Relaxed);

        warn!(
            "Click pipeline did not drain within {:?}; {} queued clicks discarded",
            grace, discarded
        );
        ShutdownReport {
            drained: false,
            discarded,
        }
    }
}
