use std::sync::Arc;

use crate::application::ports::coin_data_repository::CoinDataRepository;
use crate::application::ports::coin_repository::CoinRepository;
use crate::application::ports::latest_coin_data_repository::LatestCoinDataRepository;
use crate::application::services::coins::CoinsService;
use crate::bootstrap::config::Config;
use crate::infrastructure::db::PgPool;
use crate::infrastructure::db::repositories::coin_data_repository_sqlx::SqlxCoinDataRepository;
use crate::infrastructure::db::repositories::coin_repository_sqlx::SqlxCoinRepository;
use crate::infrastructure::db::repositories::latest_coin_data_repository_sqlx::SqlxLatestCoinDataRepository;

/// Router state: configuration plus the services the controllers call.
#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

/// The coins module: its three entity repositories and the service built
/// over them.
pub struct AppServices {
    coins_service: CoinsService,
}

impl AppServices {
    pub fn new(
        coin_repo: Arc<dyn CoinRepository>,
        coin_data_repo: Arc<dyn CoinDataRepository>,
        latest_repo: Arc<dyn LatestCoinDataRepository>,
    ) -> Self {
        Self {
            coins_service: CoinsService::new(coin_repo, coin_data_repo, latest_repo),
        }
    }

    pub fn from_pool(pool: &PgPool) -> Self {
        Self::new(
            Arc::new(SqlxCoinRepository::new(pool.clone())),
            Arc::new(SqlxCoinDataRepository::new(pool.clone())),
            Arc::new(SqlxLatestCoinDataRepository::new(pool.clone())),
        )
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    /// Exported to other modules (the market feed records through it).
    pub fn coins_service(&self) -> CoinsService {
        self.services.coins_service.clone()
    }
}
