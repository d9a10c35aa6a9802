use async_trait::async_trait;

use crate::domain::coins::coin::LatestCoinData;

#[async_trait]
pub trait LatestCoinDataRepository: Send + Sync {
    async fn list(&self, exchange: Option<&str>) -> anyhow::Result<Vec<LatestCoinData>>;

    async fn for_coin(&self, coin_id: i32) -> anyhow::Result<Vec<LatestCoinData>>;
}
