use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::coins::coin::{CoinData, QuoteTick};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub exchange: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTick {
    pub stored: CoinData,
    /// False when a newer observation already held the latest row.
    pub latest_updated: bool,
}

#[async_trait]
pub trait CoinDataRepository: Send + Sync {
    /// Newest first.
    async fn history(&self, coin_id: i32, query: &HistoryQuery) -> anyhow::Result<Vec<CoinData>>;

    /// Inserts the observation and refreshes the latest row for its
    /// (coin, exchange) in one transaction. An older tick never replaces a
    /// newer latest row.
    async fn record(&self, coin_id: i32, tick: &QuoteTick) -> anyhow::Result<RecordedTick>;
}
