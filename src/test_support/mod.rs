// In-memory stand-in for the Postgres repositories so services and handlers
// can be exercised without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::coin_data_repository::{
    CoinDataRepository, HistoryQuery, RecordedTick,
};
use crate::application::ports::coin_repository::CoinRepository;
use crate::application::ports::latest_coin_data_repository::LatestCoinDataRepository;
use crate::domain::coins::coin::{Coin, CoinData, LatestCoinData, QuoteTick};

#[derive(Default)]
struct Tables {
    coins: BTreeMap<String, Coin>,
    data: Vec<CoinData>,
    latest: BTreeMap<(i32, String), CoinData>,
    next_coin_id: i32,
    next_data_id: i64,
}

#[derive(Default)]
pub struct InMemoryCoinStore {
    tables: RwLock<Tables>,
    is_offline: bool,
}

impl InMemoryCoinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            is_offline: true,
            ..Self::default()
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.is_offline {
            anyhow::bail!("coin store offline");
        }
        Ok(())
    }
}

fn insert_coin(tables: &mut Tables, name: &str) -> Coin {
    tables.next_coin_id += 1;
    let coin = Coin {
        coin_id: tables.next_coin_id,
        coin_name: name.to_string(),
        created_at: Utc::now(),
    };
    tables.coins.insert(name.to_string(), coin.clone());
    coin
}

fn coin_name_of(tables: &Tables, coin_id: i32) -> String {
    tables
        .coins
        .values()
        .find(|c| c.coin_id == coin_id)
        .map(|c| c.coin_name.clone())
        .unwrap_or_default()
}

fn to_latest(tables: &Tables, row: &CoinData) -> LatestCoinData {
    LatestCoinData {
        coin_id: row.coin_id,
        coin_name: coin_name_of(tables, row.coin_id),
        exchange: row.exchange.clone(),
        timestamp: row.timestamp,
        best_bid: row.best_bid,
        best_ask: row.best_ask,
        best_bid_qty: row.best_bid_qty,
        best_ask_qty: row.best_ask_qty,
        mark_price: row.mark_price,
        last_price: row.last_price,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl CoinRepository for InMemoryCoinStore {
    async fn list(&self) -> anyhow::Result<Vec<Coin>> {
        self.check()?;
        Ok(self.tables.read().await.coins.values().cloned().collect())
    }

    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Coin>> {
        self.check()?;
        Ok(self.tables.read().await.coins.get(name).cloned())
    }

    async fn create(&self, name: &str) -> anyhow::Result<Option<Coin>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.coins.contains_key(name) {
            return Ok(None);
        }
        Ok(Some(insert_coin(&mut tables, name)))
    }

    async fn find_or_create(&self, name: &str) -> anyhow::Result<Coin> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if let Some(coin) = tables.coins.get(name) {
            return Ok(coin.clone());
        }
        Ok(insert_coin(&mut tables, name))
    }

    async fn delete_by_name(&self, name: &str) -> anyhow::Result<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(coin) = tables.coins.remove(name) else {
            return Ok(false);
        };
        tables.data.retain(|d| d.coin_id != coin.coin_id);
        tables.latest.retain(|(id, _), _| *id != coin.coin_id);
        Ok(true)
    }

    async fn names(&self) -> anyhow::Result<Vec<String>> {
        self.check()?;
        Ok(self.tables.read().await.coins.keys().cloned().collect())
    }
}

#[async_trait]
impl CoinDataRepository for InMemoryCoinStore {
    async fn history(&self, coin_id: i32, query: &HistoryQuery) -> anyhow::Result<Vec<CoinData>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<CoinData> = tables
            .data
            .iter()
            .filter(|d| d.coin_id == coin_id)
            .filter(|d| query.exchange.as_deref().is_none_or(|e| d.exchange == e))
            .filter(|d| query.from.is_none_or(|from| d.timestamp >= from))
            .filter(|d| query.to.is_none_or(|to| d.timestamp <= to))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(query.limit.max(0) as usize);
        Ok(rows)
    }

    async fn record(&self, coin_id: i32, tick: &QuoteTick) -> anyhow::Result<RecordedTick> {
        self.check()?;
        let mut tables = self.tables.write().await;
        tables.next_data_id += 1;
        let row = CoinData {
            id: tables.next_data_id,
            coin_id,
            timestamp: tick.timestamp,
            best_bid: tick.best_bid,
            best_ask: tick.best_ask,
            best_bid_qty: tick.best_bid_qty,
            best_ask_qty: tick.best_ask_qty,
            mark_price: tick.mark_price,
            last_price: tick.last_price,
            updated_at: tick.timestamp,
            exchange: tick.exchange.clone(),
        };
        tables.data.push(row.clone());
        let key = (coin_id, tick.exchange.clone());
        let newer = tables
            .latest
            .get(&key)
            .is_none_or(|current| current.timestamp <= row.timestamp);
        if newer {
            tables.latest.insert(key, row.clone());
        }
        Ok(RecordedTick {
            stored: row,
            latest_updated: newer,
        })
    }
}

#[async_trait]
impl LatestCoinDataRepository for InMemoryCoinStore {
    async fn list(&self, exchange: Option<&str>) -> anyhow::Result<Vec<LatestCoinData>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .latest
            .values()
            .filter(|row| exchange.is_none_or(|e| row.exchange == e))
            .map(|row| to_latest(&tables, row))
            .collect())
    }

    async fn for_coin(&self, coin_id: i32) -> anyhow::Result<Vec<LatestCoinData>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .latest
            .values()
            .filter(|row| row.coin_id == coin_id)
            .map(|row| to_latest(&tables, row))
            .collect())
    }
}
