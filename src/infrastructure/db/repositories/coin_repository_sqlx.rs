use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::application::ports::coin_repository::CoinRepository;
use crate::domain::coins::coin::Coin;
use crate::infrastructure::db::PgPool;

pub struct SqlxCoinRepository {
    pub pool: PgPool,
}

impl SqlxCoinRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_coin(r: PgRow) -> Coin {
    Coin {
        coin_id: r.get("coin_id"),
        coin_name: r.get("coin_name"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl CoinRepository for SqlxCoinRepository {
    async fn list(&self) -> anyhow::Result<Vec<Coin>> {
        let rows = sqlx::query(
            "SELECT coin_id, coin_name, created_at FROM coins_table ORDER BY coin_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(map_coin).collect())
    }

    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Coin>> {
        let row = sqlx::query(
            "SELECT coin_id, coin_name, created_at FROM coins_table WHERE coin_name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(map_coin))
    }

    async fn create(&self, name: &str) -> anyhow::Result<Option<Coin>> {
        let row = sqlx::query(
            r#"INSERT INTO coins_table (coin_name) VALUES ($1)
               ON CONFLICT (coin_name) DO NOTHING
               RETURNING coin_id, coin_name, created_at"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(map_coin))
    }

    async fn find_or_create(&self, name: &str) -> anyhow::Result<Coin> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let row = sqlx::query(
            r#"INSERT INTO coins_table (coin_name) VALUES ($1)
               ON CONFLICT (coin_name) DO UPDATE SET coin_name = EXCLUDED.coin_name
               RETURNING coin_id, coin_name, created_at"#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_coin(row))
    }

    async fn delete_by_name(&self, name: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM coins_table WHERE coin_name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn names(&self) -> anyhow::Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT coin_name FROM coins_table ORDER BY coin_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }
}
