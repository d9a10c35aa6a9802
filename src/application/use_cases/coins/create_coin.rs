use crate::application::ports::coin_repository::CoinRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::domain::coins::coin::{Coin, normalize_coin_name};

pub struct CreateCoin<'a, R: CoinRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: CoinRepository + ?Sized> CreateCoin<'a, R> {
    pub async fn execute(&self, name: &str) -> Result<Coin, CoinsError> {
        let name = normalize_coin_name(name).ok_or(CoinsError::InvalidName)?;
        self.repo
            .create(&name)
            .await?
            .ok_or(CoinsError::AlreadyExists)
    }
}
