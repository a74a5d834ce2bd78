//! 周期任务调度
//!
//! 首次运行在一个周期之后，单次失败只记日志，通过 `watch` 信号停止。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::errors::Result;

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// 执行一次，返回受影响的行数
    async fn run_once(&self) -> Result<u64>;
}

/// 已启动的周期任务句柄
pub struct PeriodicHandle {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 发出停止信号并等待任务退出
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await
            && !e.is_cancelled()
        {
            error!("Periodic task '{}' ended abnormally: {}", self.name, e);
        }
        debug!("Periodic task '{}' stopped", self.name);
    }
}

pub fn spawn_periodic<J: PeriodicJob>(job: Arc<J>, interval: Duration) -> PeriodicHandle {
    let name = job.name();
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let interval = interval.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match job.run_once().await {
                        Ok(affected) => debug!("Periodic task '{}' affected {} rows", name, affected),
                        Err(e) => error!("Periodic task '{}' failed: {}", name, e),
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    info!("Periodic task '{}' started (interval: {:?})", name, interval);
    PeriodicHandle {
        name,
        stop_tx,
        handle,
    }
}
