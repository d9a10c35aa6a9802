use std::sync::Arc;

use futures_util::{StreamExt, stream::BoxStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::application::ports::coin_data_repository::CoinDataRepository;
use crate::application::ports::coin_repository::CoinRepository;
use crate::application::ports::latest_coin_data_repository::LatestCoinDataRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::application::use_cases::coins::create_coin::CreateCoin;
use crate::application::use_cases::coins::delete_coin::DeleteCoin;
use crate::application::use_cases::coins::get_coin::GetCoin;
use crate::application::use_cases::coins::get_coin_history::{GetCoinHistory, HistoryRequest};
use crate::application::use_cases::coins::latest_for_coin::LatestForCoin;
use crate::application::use_cases::coins::list_coins::ListCoins;
use crate::application::use_cases::coins::list_latest::ListLatest;
use crate::application::use_cases::coins::record_quote::RecordQuote;
use crate::domain::coins::coin::{Coin, CoinData, LatestCoinData, QuoteTick};

const LATEST_CHANNEL_CAPACITY: usize = 1024;

/// Business logic of the coins module. The HTTP controller and the market
/// feed both go through this type.
#[derive(Clone)]
pub struct CoinsService {
    coins: Arc<dyn CoinRepository>,
    data: Arc<dyn CoinDataRepository>,
    latest: Arc<dyn LatestCoinDataRepository>,
    latest_tx: broadcast::Sender<LatestCoinData>,
}

impl CoinsService {
    pub fn new(
        coins: Arc<dyn CoinRepository>,
        data: Arc<dyn CoinDataRepository>,
        latest: Arc<dyn LatestCoinDataRepository>,
    ) -> Self {
        let (latest_tx, _) = broadcast::channel(LATEST_CHANNEL_CAPACITY);
        Self {
            coins,
            data,
            latest,
            latest_tx,
        }
    }

    pub async fn list_coins(&self) -> Result<Vec<Coin>, CoinsError> {
        let uc = ListCoins {
            repo: self.coins.as_ref(),
        };
        Ok(uc.execute().await?)
    }

    pub async fn get_coin(&self, name: &str) -> Result<Coin, CoinsError> {
        let uc = GetCoin {
            repo: self.coins.as_ref(),
        };
        uc.execute(name).await
    }

    pub async fn create_coin(&self, name: &str) -> Result<Coin, CoinsError> {
        let uc = CreateCoin {
            repo: self.coins.as_ref(),
        };
        let coin = uc.execute(name).await?;
        tracing::info!(coin_id = coin.coin_id, coin = %coin.coin_name, "coin_created");
        Ok(coin)
    }

    pub async fn delete_coin(&self, name: &str) -> Result<(), CoinsError> {
        let uc = DeleteCoin {
            repo: self.coins.as_ref(),
        };
        let deleted = uc.execute(name).await?;
        tracing::info!(coin = %deleted, "coin_deleted");
        Ok(())
    }

    pub async fn coin_history(
        &self,
        name: &str,
        request: HistoryRequest,
    ) -> Result<Vec<CoinData>, CoinsError> {
        let uc = GetCoinHistory {
            coins: self.coins.as_ref(),
            data: self.data.as_ref(),
        };
        uc.execute(name, request).await
    }

    pub async fn latest(&self, exchange: Option<&str>) -> Result<Vec<LatestCoinData>, CoinsError> {
        let uc = ListLatest {
            repo: self.latest.as_ref(),
        };
        Ok(uc.execute(exchange).await?)
    }

    pub async fn latest_for_coin(&self, name: &str) -> Result<Vec<LatestCoinData>, CoinsError> {
        let uc = LatestForCoin {
            coins: self.coins.as_ref(),
            latest: self.latest.as_ref(),
        };
        uc.execute(name).await
    }

    pub async fn coin_names(&self) -> Result<Vec<String>, CoinsError> {
        Ok(self.coins.names().await?)
    }

    /// Stores a tick. Subscribers only hear about it when it became the
    /// latest quote for its coin and exchange.
    pub async fn record_quote(
        &self,
        tick: &QuoteTick,
    ) -> Result<Option<LatestCoinData>, CoinsError> {
        let uc = RecordQuote {
            coins: self.coins.as_ref(),
            data: self.data.as_ref(),
        };
        let latest = uc.execute(tick).await?;
        if let Some(latest) = &latest {
            // No receivers is the common case when nobody is streaming
            let _ = self.latest_tx.send(latest.clone());
        } else {
            tracing::debug!(
                symbol = %tick.symbol,
                timestamp = %tick.timestamp,
                "stale_quote_not_broadcast"
            );
        }
        Ok(latest)
    }

    pub fn subscribe_latest(&self) -> BoxStream<'static, LatestCoinData> {
        BroadcastStream::new(self.latest_tx.subscribe())
            .filter_map(|evt| async move { evt.ok() })
            .boxed()
    }
}
