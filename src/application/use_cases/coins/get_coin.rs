use crate::application::ports::coin_repository::CoinRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::domain::coins::coin::{Coin, normalize_coin_name};

pub struct GetCoin<'a, R: CoinRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: CoinRepository + ?Sized> GetCoin<'a, R> {
    pub async fn execute(&self, name: &str) -> Result<Coin, CoinsError> {
        // A name that cannot be stored cannot exist either
        let name = normalize_coin_name(name).ok_or(CoinsError::NotFound)?;
        self.repo
            .get_by_name(&name)
            .await?
            .ok_or(CoinsError::NotFound)
    }
}
