use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::latest_coin_data_repository::LatestCoinDataRepository;
use crate::domain::coins::coin::LatestCoinData;
use crate::infrastructure::db::PgPool;

pub struct SqlxLatestCoinDataRepository {
    pub pool: PgPool,
}

impl SqlxLatestCoinDataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_LATEST: &str = r#"SELECT l.coin_id, c.coin_name, l.exchange, l.timestamp,
       l.best_bid, l.best_ask, l.best_bid_qty, l.best_ask_qty,
       l.mark_price, l.last_price, l.updated_at
  FROM latest_coin_data l
  JOIN coins_table c ON c.coin_id = l.coin_id"#;

fn map_latest(r: PgRow) -> LatestCoinData {
    LatestCoinData {
        coin_id: r.get("coin_id"),
        coin_name: r.get("coin_name"),
        exchange: r.get("exchange"),
        timestamp: r.get("timestamp"),
        best_bid: r.get("best_bid"),
        best_ask: r.get("best_ask"),
        best_bid_qty: r.get("best_bid_qty"),
        best_ask_qty: r.get("best_ask_qty"),
        mark_price: r.get("mark_price"),
        last_price: r.get("last_price"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl LatestCoinDataRepository for SqlxLatestCoinDataRepository {
    async fn list(&self, exchange: Option<&str>) -> anyhow::Result<Vec<LatestCoinData>> {
        let sql = format!(
            "{SELECT_LATEST} WHERE ($1::TEXT IS NULL OR l.exchange = $1) ORDER BY c.coin_name ASC, l.exchange ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(exchange)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(map_latest).collect())
    }

    async fn for_coin(&self, coin_id: i32) -> anyhow::Result<Vec<LatestCoinData>> {
        let sql = format!("{SELECT_LATEST} WHERE l.coin_id = $1 ORDER BY l.exchange ASC");
        let rows = sqlx::query(&sql)
            .bind(coin_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(map_latest).collect())
    }
}
