use async_trait::async_trait;

use crate::domain::coins::coin::Coin;

#[async_trait]
pub trait CoinRepository: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Coin>>;

    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Coin>>;

    // None when a coin with this name already exists
    async fn create(&self, name: &str) -> anyhow::Result<Option<Coin>>;

    async fn find_or_create(&self, name: &str) -> anyhow::Result<Coin>;

    async fn delete_by_name(&self, name: &str) -> anyhow::Result<bool>;

    async fn names(&self) -> anyhow::Result<Vec<String>>;
}
