use chrono::{DateTime, Utc};

use crate::application::ports::coin_data_repository::{CoinDataRepository, HistoryQuery};
use crate::application::ports::coin_repository::CoinRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::domain::coins::coin::{CoinData, normalize_coin_name, normalize_exchange};

pub const DEFAULT_HISTORY_LIMIT: i64 = 100;
pub const MAX_HISTORY_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct HistoryRequest {
    pub exchange: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl HistoryRequest {
    fn into_query(self) -> Result<HistoryQuery, CoinsError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(CoinsError::InvalidRange);
            }
        }
        Ok(HistoryQuery {
            exchange: self.exchange.as_deref().and_then(normalize_exchange),
            from: self.from,
            to: self.to,
            limit: self
                .limit
                .unwrap_or(DEFAULT_HISTORY_LIMIT)
                .clamp(1, MAX_HISTORY_LIMIT),
        })
    }
}

pub struct GetCoinHistory<'a, C, D>
where
    C: CoinRepository + ?Sized,
    D: CoinDataRepository + ?Sized,
{
    pub coins: &'a C,
    pub data: &'a D,
}

impl<'a, C, D> GetCoinHistory<'a, C, D>
where
    C: CoinRepository + ?Sized,
    D: CoinDataRepository + ?Sized,
{
    pub async fn execute(
        &self,
        name: &str,
        request: HistoryRequest,
    ) -> Result<Vec<CoinData>, CoinsError> {
        let query = request.into_query()?;
        let name = normalize_coin_name(name).ok_or(CoinsError::NotFound)?;
        let coin = self
            .coins
            .get_by_name(&name)
            .await?
            .ok_or(CoinsError::NotFound)?;
        Ok(self.data.history(coin.coin_id, &query).await?)
    }
}
