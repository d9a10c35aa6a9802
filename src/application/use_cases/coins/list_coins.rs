use crate::application::ports::coin_repository::CoinRepository;
use crate::domain::coins::coin::Coin;

pub struct ListCoins<'a, R: CoinRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: CoinRepository + ?Sized> ListCoins<'a, R> {
    pub async fn execute(&self) -> anyhow::Result<Vec<Coin>> {
        self.repo.list().await
    }
}
