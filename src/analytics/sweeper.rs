//! 过期链接清扫

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::periodic::PeriodicJob;
use crate::errors::Result;
use crate::services::LinkService;

pub struct ExpirationSweeper {
    links: Arc<LinkService>,
}

impl ExpirationSweeper {
    pub fn new(links: Arc<LinkService>) -> Self {
        Self { links }
    }

    /// 停用所有已到期的链接，返回本次停用数量
    pub async fn run_once(&self) -> Result<u64> {
        let affected = self.links.deactivate_expired().await?;
        if affected > 0 {
            info!("Expiration sweep deactivated {} links", affected);
        } else {
            tracing::debug!("Expiration sweep found nothing to deactivate");
        }
        Ok(affected)
    }
}

#[async_trait]
impl PeriodicJob for ExpirationSweeper {
    fn name(&self) -> &'static str {
        "expiration-sweeper"
    }

    async fn run_once(&self) -> Result<u64> {
        ExpirationSweeper::run_once(self).await
    }
}
