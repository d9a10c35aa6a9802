use std::net::SocketAddr;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use coins_api::bootstrap::app_context::{AppContext, AppServices};
use coins_api::bootstrap::config::Config;
use coins_api::infrastructure::market::coinex::CoinexFeed;
use coins_api::presentation::http::health::HealthState;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            coins_api::presentation::http::coins::list_coins,
            coins_api::presentation::http::coins::create_coin,
            coins_api::presentation::http::coins::get_coin,
            coins_api::presentation::http::coins::delete_coin,
            coins_api::presentation::http::coins::get_coin_data,
            coins_api::presentation::http::coins::get_coin_latest,
            coins_api::presentation::http::coins::list_latest,
            coins_api::presentation::http::coins::stream_latest,
            coins_api::presentation::http::health::health,
        ),
        components(schemas(
            coins_api::presentation::http::coins::Coin,
            coins_api::presentation::http::coins::CoinListResponse,
            coins_api::presentation::http::coins::CreateCoinRequest,
            coins_api::presentation::http::coins::CoinData,
            coins_api::presentation::http::coins::CoinDataResponse,
            coins_api::presentation::http::coins::LatestCoinData,
            coins_api::presentation::http::coins::LatestCoinDataResponse,
            coins_api::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Coins", description = "Coins, quote history and latest quotes"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

fn cors_layer(cfg: &Config) -> CorsLayer {
    let methods = [
        http::Method::GET,
        http::Method::POST,
        http::Method::DELETE,
        http::Method::OPTIONS,
    ];
    let base = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers([http::header::CONTENT_TYPE]);
    match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin),
        // Production requires FRONTEND_URL (checked in Config), so this is dev only
        _ if !cfg.is_production => base.allow_origin(AllowOrigin::mirror_request()),
        _ => base.allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            "http://invalid",
        ))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "coins_api=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting coins API");

    // Database
    let pool =
        coins_api::infrastructure::db::connect_pool(&cfg.database_url, cfg.db_max_connections)
            .await?;
    coins_api::infrastructure::db::migrate(&pool).await?;

    let ctx = AppContext::new(cfg.clone(), AppServices::from_pool(&pool));

    let health = HealthState {
        pool: pool.clone(),
        market_feed_enabled: cfg.coinex.enabled,
    };

    let app = Router::new()
        .nest("/api", coins_api::presentation::http::health::routes(health))
        .nest(
            "/api",
            coins_api::presentation::http::coins::routes(ctx.clone()),
        )
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&cfg))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    let api_handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    // Market feed
    let feed_handle: Option<JoinHandle<anyhow::Result<()>>> = if cfg.coinex.enabled {
        let feed = CoinexFeed::new(cfg.coinex.clone(), ctx.coins_service())?;
        info!(url = %cfg.coinex.ws_url, "coinex_feed_enabled");
        Some(tokio::spawn(feed.run()))
    } else {
        info!("coinex_feed_disabled");
        None
    };

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(?e, "API server task failed"),
        Err(e) => error!(?e, "API server task panicked"),
    }

    if let Some(handle) = feed_handle {
        handle.abort();
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(?e, "Market feed task failed"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!(?e, "Market feed task panicked"),
        }
    }
    Ok(())
}
