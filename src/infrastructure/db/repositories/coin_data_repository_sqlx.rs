use anyhow::Context;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::coin_data_repository::{
    CoinDataRepository, HistoryQuery, RecordedTick,
};
use crate::domain::coins::coin::{CoinData, QuoteTick};
use crate::infrastructure::db::PgPool;

pub struct SqlxCoinDataRepository {
    pub pool: PgPool,
}

impl SqlxCoinDataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_coin_data(r: PgRow) -> CoinData {
    CoinData {
        id: r.get("id"),
        coin_id: r.get("coin_id"),
        timestamp: r.get("timestamp"),
        best_bid: r.get("best_bid"),
        best_ask: r.get("best_ask"),
        best_bid_qty: r.get("best_bid_qty"),
        best_ask_qty: r.get("best_ask_qty"),
        mark_price: r.get("mark_price"),
        last_price: r.get("last_price"),
        updated_at: r.get("updated_at"),
        exchange: r.get("exchange"),
    }
}

#[async_trait]
impl CoinDataRepository for SqlxCoinDataRepository {
    async fn history(&self, coin_id: i32, query: &HistoryQuery) -> anyhow::Result<Vec<CoinData>> {
        let rows = sqlx::query(
            r#"SELECT id, coin_id, timestamp, best_bid, best_ask, best_bid_qty, best_ask_qty,
                      mark_price, last_price, updated_at, exchange
               FROM coin_data_table
               WHERE coin_id = $1
                 AND ($2::TEXT IS NULL OR exchange = $2)
                 AND ($3::TIMESTAMPTZ IS NULL OR timestamp >= $3)
                 AND ($4::TIMESTAMPTZ IS NULL OR timestamp <= $4)
               ORDER BY timestamp DESC, id DESC
               LIMIT $5"#,
        )
        .bind(coin_id)
        .bind(query.exchange.as_deref())
        .bind(query.from)
        .bind(query.to)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_coin_data).collect())
    }

    async fn record(&self, coin_id: i32, tick: &QuoteTick) -> anyhow::Result<RecordedTick> {
        let mut tx = self.pool.begin().await.context("coin_data_tx_begin")?;

        let row = sqlx::query(
            r#"INSERT INTO coin_data_table (
                   coin_id, timestamp, best_bid, best_ask, best_bid_qty, best_ask_qty,
                   mark_price, last_price, updated_at, exchange
               ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $2, $9)
               RETURNING id, coin_id, timestamp, best_bid, best_ask, best_bid_qty, best_ask_qty,
                         mark_price, last_price, updated_at, exchange"#,
        )
        .bind(coin_id)
        .bind(tick.timestamp)
        .bind(tick.best_bid)
        .bind(tick.best_ask)
        .bind(tick.best_bid_qty)
        .bind(tick.best_ask_qty)
        .bind(tick.mark_price)
        .bind(tick.last_price)
        .bind(&tick.exchange)
        .fetch_one(&mut *tx)
        .await
        .context("coin_data_insert")?;
        let stored = map_coin_data(row);

        // The WHERE guard turns a stale upsert into a 0-row statement
        let upsert = sqlx::query(
            r#"INSERT INTO latest_coin_data (
                   coin_id, exchange, timestamp, best_bid, best_ask, best_bid_qty, best_ask_qty,
                   mark_price, last_price, updated_at
               ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               ON CONFLICT (coin_id, exchange) DO UPDATE SET
                   timestamp = EXCLUDED.timestamp,
                   best_bid = EXCLUDED.best_bid,
                   best_ask = EXCLUDED.best_ask,
                   best_bid_qty = EXCLUDED.best_bid_qty,
                   best_ask_qty = EXCLUDED.best_ask_qty,
                   mark_price = EXCLUDED.mark_price,
                   last_price = EXCLUDED.last_price,
                   updated_at = EXCLUDED.updated_at
               WHERE latest_coin_data.timestamp <= EXCLUDED.timestamp"#,
        )
        .bind(stored.coin_id)
        .bind(&stored.exchange)
        .bind(stored.timestamp)
        .bind(stored.best_bid)
        .bind(stored.best_ask)
        .bind(stored.best_bid_qty)
        .bind(stored.best_ask_qty)
        .bind(stored.mark_price)
        .bind(stored.last_price)
        .bind(stored.updated_at)
        .execute(&mut *tx)
        .await
        .context("latest_coin_data_upsert")?;

        tx.commit().await.context("coin_data_tx_commit")?;
        Ok(RecordedTick {
            stored,
            latest_updated: upsert.rows_affected() > 0,
        })
    }
}
