use crate::application::ports::coin_repository::CoinRepository;
use crate::application::ports::latest_coin_data_repository::LatestCoinDataRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::domain::coins::coin::{LatestCoinData, normalize_coin_name};

pub struct LatestForCoin<'a, C, L>
where
    C: CoinRepository + ?Sized,
    L: LatestCoinDataRepository + ?Sized,
{
    pub coins: &'a C,
    pub latest: &'a L,
}

impl<'a, C, L> LatestForCoin<'a, C, L>
where
    C: CoinRepository + ?Sized,
    L: LatestCoinDataRepository + ?Sized,
{
    pub async fn execute(&self, name: &str) -> Result<Vec<LatestCoinData>, CoinsError> {
        let name = normalize_coin_name(name).ok_or(CoinsError::NotFound)?;
        let coin = self
            .coins
            .get_by_name(&name)
            .await?
            .ok_or(CoinsError::NotFound)?;
        Ok(self.latest.for_coin(coin.coin_id).await?)
    }
}
