use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::analytics::{
    ClickPipeline, ClickRecorder, ClickRetentionTask, ClientMetadata, ExpirationSweeper,
    PeriodicHandle, ShutdownReport, spawn_periodic,
};
use crate::cache::{CacheBackend, CacheFactory, NullCacheBackend, ResolutionCache};
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::services::{AnalyticsService, IdGenerator, LinkService};
use crate::storage::{ClickEventStore, LinkStore, Storage, StorageFactory};
use crate::utils::{Clock, SystemClock};

pub struct AppContext {
    pub config: StaticConfig,
    pub links: Arc<dyn LinkStore>,
    pub events: Arc<dyn ClickEventStore>,
    pub cache: Arc<ResolutionCache>,
    pub link_service: Arc<LinkService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub pipeline: Arc<ClickPipeline>,
    pub sweeper: Arc<ExpirationSweeper>,
    pub retention: Arc<ClickRetentionTask>,
    pub clock: Arc<dyn Clock>,
    tasks: parking_lot::Mutex<Vec<PeriodicHandle>>,
}

impl AppContext {
    /// 按配置连接存储和缓存，组装服务并启动后台任务
    pub async fn build(config: StaticConfig) -> Result<Self> {
        let start_time = Instant::now();
        config.validate()?;

        let storage = StorageFactory::create(&config.database).await?;
        info!("Using storage backend: {}", storage.backend_name());

        let backend: Arc<dyn CacheBackend> = match CacheFactory::create(&config.cache).await {
            Ok(backend) => backend,
            Err(e) => {
                warn!("Cache backend unavailable, continuing without cache: {}", e);
                Arc::new(NullCacheBackend)
            }
        };

        let ctx = Self::with_parts(config, storage, backend, Arc::new(SystemClock));
        ctx.start_background_tasks();

        debug!("AppContext ready in {:?}", start_time.elapsed());
        Ok(ctx)
    }

    /// 用调用方提供的存储、缓存后端和时钟组装，不启动周期任务
    ///
    /// 点击流水线的 worker 会立即启动，需要在 tokio 运行时中调用。
    pub fn with_parts<S: Storage + 'static>(
        config: StaticConfig,
        storage: Arc<S>,
        backend: Arc<dyn CacheBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let links: Arc<dyn LinkStore> = storage.clone();
        let events: Arc<dyn ClickEventStore> = storage;

        let cache = Arc::new(ResolutionCache::new(backend, config.cache.op_timeout()));
        let ids = IdGenerator::new(links.clone(), clock.clone(), config.links.id_probe_limit);
        let link_service = Arc::new(LinkService::new(
            links.clone(),
            cache.clone(),
            ids,
            clock.clone(),
            config.links.clone(),
            config.cache.default_ttl(),
        ));
        let analytics_service = Arc::new(AnalyticsService::new(
            link_service.clone(),
            events.clone(),
            cache.clone(),
            clock.clone(),
            config.analytics.clone(),
        ));

        let recorder = ClickRecorder::new(links.clone(), events.clone());
        let pipeline = Arc::new(ClickPipeline::start(
            recorder,
            &config.pipeline,
            clock.clone(),
        ));

        let sweeper = Arc::new(ExpirationSweeper::new(link_service.clone()));
        let retention = Arc::new(ClickRetentionTask::new(
            events.clone(),
            clock.clone(),
            config.analytics.retention_days,
        ));

        Self {
            config,
            links,
            events,
            cache,
            link_service,
            analytics_service,
            pipeline,
            sweeper,
            retention,
            clock,
            tasks: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// 按配置启动过期清扫和事件清理，重复调用无效
    pub fn start_background_tasks(&self) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return;
        }

        if self.config.sweeper.enabled {
            tasks.push(spawn_periodic(
                self.sweeper.clone(),
                Duration::from_secs(self.config.sweeper.interval_secs),
            ));
        } else {
            info!("Expiration sweeper disabled");
        }

        if self.retention.retention_days() > 0 {
            tasks.push(spawn_periodic(
                self.retention.clone(),
                Duration::from_secs(self.config.analytics.retention_interval_secs),
            ));
        }
    }

    pub fn background_task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// 解析短码，成功后提交一次点击
    pub async fn resolve_and_record(&self, code: &str, metadata: ClientMetadata) -> Result<String> {
        let target = self.link_service.resolve(code).await?;
        self.pipeline.submit(code, metadata).await;
        Ok(target)
    }

    /// 停止周期任务，并在宽限期内排空点击队列
    pub async fn shutdown(&self) -> ShutdownReport {
        let tasks: Vec<PeriodicHandle> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            debug!("Stopping periodic task '{}'", task.name());
            task.stop().await;
        }

        let report = self
            .pipeline
            .shutdown(self.config.pipeline.shutdown_grace())
            .await;
        let stats = self.pipeline.stats();
        info!(
            "Shutdown complete: {} clicks recorded, {} skipped, {} failed, {} discarded",
            stats.recorded, stats.skipped, stats.failed, report.discarded
        );
        report
    }
}
