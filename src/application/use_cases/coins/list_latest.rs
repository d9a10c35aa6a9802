use crate::application::ports::latest_coin_data_repository::LatestCoinDataRepository;
use crate::domain::coins::coin::{LatestCoinData, normalize_exchange};

pub struct ListLatest<'a, R: LatestCoinDataRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: LatestCoinDataRepository + ?Sized> ListLatest<'a, R> {
    pub async fn execute(&self, exchange: Option<&str>) -> anyhow::Result<Vec<LatestCoinData>> {
        let exchange = exchange.and_then(normalize_exchange);
        self.repo.list(exchange.as_deref()).await
    }
}
