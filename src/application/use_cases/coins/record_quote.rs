use crate::application::ports::coin_data_repository::CoinDataRepository;
use crate::application::ports::coin_repository::CoinRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::domain::coins::coin::{LatestCoinData, QuoteTick, normalize_coin_name};

pub struct RecordQuote<'a, C, D>
where
    C: CoinRepository + ?Sized,
    D: CoinDataRepository + ?Sized,
{
    pub coins: &'a C,
    pub data: &'a D,
}

impl<'a, C, D> RecordQuote<'a, C, D>
where
    C: CoinRepository + ?Sized,
    D: CoinDataRepository + ?Sized,
{
    /// Stores the tick, registering its symbol as a coin on first sight.
    /// Returns the new latest quote, or `None` when the tick is older than
    /// the one already held for its coin and exchange.
    pub async fn execute(&self, tick: &QuoteTick) -> Result<Option<LatestCoinData>, CoinsError> {
        let name = normalize_coin_name(&tick.symbol).ok_or(CoinsError::InvalidName)?;
        let coin = self.coins.find_or_create(&name).await?;
        let recorded = self.data.record(coin.coin_id, tick).await?;
        Ok(recorded
            .latest_updated
            .then(|| LatestCoinData::from_record(&coin, &recorded.stored)))
    }
}
