use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::use_cases::coins::CoinsError;
use crate::application::use_cases::coins::get_coin_history::HistoryRequest;
use crate::bootstrap::app_context::AppContext;
use crate::domain::coins::coin as domain;
use crate::domain::coins::coin::normalize_exchange;

#[derive(Debug, Serialize, ToSchema)]
pub struct Coin {
    pub coin_id: i32,
    pub coin_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<domain::Coin> for Coin {
    fn from(c: domain::Coin) -> Self {
        Coin {
            coin_id: c.coin_id,
            coin_name: c.coin_name,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoinListResponse {
    pub items: Vec<Coin>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCoinRequest {
    pub coin_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoinData {
    pub id: i64,
    pub coin_id: i32,
    pub timestamp: DateTime<Utc>,
    pub best_bid: f64,
    pub best_ask: f64,
    pub best_bid_qty: f64,
    pub best_ask_qty: f64,
    pub mark_price: Option<f64>,
    pub last_price: Option<f64>,
    pub updated_at: DateTime<Utc>,
    pub exchange: String,
}

impl From<domain::CoinData> for CoinData {
    fn from(d: domain::CoinData) -> Self {
        CoinData {
            id: d.id,
            coin_id: d.coin_id,
            timestamp: d.timestamp,
            best_bid: d.best_bid,
            best_ask: d.best_ask,
            best_bid_qty: d.best_bid_qty,
            best_ask_qty: d.best_ask_qty,
            mark_price: d.mark_price,
            last_price: d.last_price,
            updated_at: d.updated_at,
            exchange: d.exchange,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoinDataResponse {
    pub items: Vec<CoinData>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestCoinData {
    pub coin_id: i32,
    pub coin_name: String,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
    pub best_bid: f64,
    pub best_ask: f64,
    pub best_bid_qty: f64,
    pub best_ask_qty: f64,
    pub mark_price: Option<f64>,
    pub last_price: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::LatestCoinData> for LatestCoinData {
    fn from(l: domain::LatestCoinData) -> Self {
        LatestCoinData {
            coin_id: l.coin_id,
            coin_name: l.coin_name,
            exchange: l.exchange,
            timestamp: l.timestamp,
            best_bid: l.best_bid,
            best_ask: l.best_ask,
            best_bid_qty: l.best_bid_qty,
            best_ask_qty: l.best_ask_qty,
            mark_price: l.mark_price,
            last_price: l.last_price,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestCoinDataResponse {
    pub items: Vec<LatestCoinData>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub exchange: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeParams {
    pub exchange: Option<String>,
}

fn error_status(err: CoinsError) -> StatusCode {
    match err {
        CoinsError::NotFound => StatusCode::NOT_FOUND,
        CoinsError::AlreadyExists => StatusCode::CONFLICT,
        CoinsError::InvalidName | CoinsError::InvalidRange => StatusCode::BAD_REQUEST,
        CoinsError::Repository(e) => {
            tracing::error!(error = ?e, "coins_repository_failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[utoipa::path(get, path = "/api/coins", tag = "Coins",
    responses((status = 200, body = CoinListResponse)))]
pub async fn list_coins(
    State(ctx): State<AppContext>,
) -> Result<Json<CoinListResponse>, StatusCode> {
    let coins = ctx.coins_service().list_coins().await.map_err(error_status)?;
    let items = coins.into_iter().map(Into::into).collect();
    Ok(Json(CoinListResponse { items }))
}

#[utoipa::path(post, path = "/api/coins", tag = "Coins", request_body = CreateCoinRequest,
    responses(
        (status = 201, body = Coin),
        (status = 400, description = "Invalid coin name"),
        (status = 409, description = "Coin already exists")
    ))]
pub async fn create_coin(
    State(ctx): State<AppContext>,
    Json(req): Json<CreateCoinRequest>,
) -> Result<(StatusCode, Json<Coin>), StatusCode> {
    let coin = ctx
        .coins_service()
        .create_coin(&req.coin_name)
        .await
        .map_err(error_status)?;
    Ok((StatusCode::CREATED, Json(coin.into())))
}

#[utoipa::path(get, path = "/api/coins/{name}", tag = "Coins",
    params(("name" = String, Path, description = "Market symbol, e.g. BTCUSDT")),
    responses((status = 200, body = Coin), (status = 404, description = "Unknown coin")))]
pub async fn get_coin(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<Coin>, StatusCode> {
    let coin = ctx
        .coins_service()
        .get_coin(&name)
        .await
        .map_err(error_status)?;
    Ok(Json(coin.into()))
}

#[utoipa::path(delete, path = "/api/coins/{name}", tag = "Coins",
    params(("name" = String, Path, description = "Market symbol")),
    responses((status = 204), (status = 404, description = "Unknown coin")))]
pub async fn delete_coin(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    ctx.coins_service()
        .delete_coin(&name)
        .await
        .map_err(error_status)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/coins/{name}/data", tag = "Coins",
    params(
        ("name" = String, Path, description = "Market symbol"),
        ("exchange" = Option<String>, Query, description = "Exchange filter, e.g. COINEX"),
        ("from" = Option<String>, Query, description = "RFC 3339 lower bound (inclusive)"),
        ("to" = Option<String>, Query, description = "RFC 3339 upper bound (inclusive)"),
        ("limit" = Option<i64>, Query, description = "Max rows, 1..=1000, default 100")
    ),
    responses((status = 200, body = CoinDataResponse), (status = 400), (status = 404)))]
pub async fn get_coin_data(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<CoinDataResponse>, StatusCode> {
    let request = HistoryRequest {
        exchange: params.exchange,
        from: params.from,
        to: params.to,
        limit: params.limit,
    };
    let rows = ctx
        .coins_service()
        .coin_history(&name, request)
        .await
        .map_err(error_status)?;
    let items = rows.into_iter().map(Into::into).collect();
    Ok(Json(CoinDataResponse { items }))
}

#[utoipa::path(get, path = "/api/coins/{name}/latest", tag = "Coins",
    params(("name" = String, Path, description = "Market symbol")),
    responses((status = 200, body = LatestCoinDataResponse), (status = 404)))]
pub async fn get_coin_latest(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<LatestCoinDataResponse>, StatusCode> {
    let rows = ctx
        .coins_service()
        .latest_for_coin(&name)
        .await
        .map_err(error_status)?;
    let items = rows.into_iter().map(Into::into).collect();
    Ok(Json(LatestCoinDataResponse { items }))
}

#[utoipa::path(get, path = "/api/latest", tag = "Coins",
    params(("exchange" = Option<String>, Query, description = "Exchange filter")),
    responses((status = 200, body = LatestCoinDataResponse)))]
pub async fn list_latest(
    State(ctx): State<AppContext>,
    Query(params): Query<ExchangeParams>,
) -> Result<Json<LatestCoinDataResponse>, StatusCode> {
    let rows = ctx
        .coins_service()
        .latest(params.exchange.as_deref())
        .await
        .map_err(error_status)?;
    let items = rows.into_iter().map(Into::into).collect();
    Ok(Json(LatestCoinDataResponse { items }))
}

#[utoipa::path(get, path = "/api/latest/stream", tag = "Coins",
    params(("exchange" = Option<String>, Query, description = "Exchange filter")),
    responses((status = 200, description = "text/event-stream of `quote` events carrying LatestCoinData")))]
pub async fn stream_latest(
    State(ctx): State<AppContext>,
    Query(params): Query<ExchangeParams>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let exchange = params.exchange.as_deref().and_then(normalize_exchange);
    let initial = stream::iter(vec![Ok(Event::default().event("ready").data("{}"))]);
    let updates = ctx.coins_service().subscribe_latest().filter_map(move |latest| {
        let exchange = exchange.clone();
        async move {
            if exchange.is_some_and(|e| e != latest.exchange) {
                return None;
            }
            let body = LatestCoinData::from(latest);
            match serde_json::to_string(&body) {
                Ok(payload) => Some(Ok(Event::default().event("quote").data(payload))),
                Err(e) => {
                    tracing::warn!(error = ?e, "latest_quote_serialize_failed");
                    None
                }
            }
        }
    });
    let keepalive = KeepAlive::new()
        .interval(Duration::from_secs(25))
        .text("keepalive");
    Sse::new(initial.chain(updates)).keep_alive(keepalive)
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/coins", get(list_coins).post(create_coin))
        .route("/coins/:name", get(get_coin).delete(delete_coin))
        .route("/coins/:name/data", get(get_coin_data))
        .route("/coins/:name/latest", get(get_coin_latest))
        .route("/latest", get(list_latest))
        .route("/latest/stream", get(stream_latest))
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::TimeZone;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::bootstrap::app_context::AppServices;
    use crate::bootstrap::config::Config;
    use crate::domain::coins::coin::{EXCHANGE_COINEX, QuoteTick};
    use crate::test_support::InMemoryCoinStore;

    fn test_config() -> Config {
        Config {
            api_port: 0,
            frontend_url: None,
            database_url: String::new(),
            db_max_connections: 1,
            is_production: false,
            coinex: Default::default(),
        }
    }

    fn context(store: InMemoryCoinStore) -> AppContext {
        let store = Arc::new(store);
        AppContext::new(
            test_config(),
            AppServices::new(store.clone(), store.clone(), store),
        )
    }

    fn app(ctx: &AppContext) -> Router {
        Router::new().nest("/api", routes(ctx.clone()))
    }

    async fn send(ctx: &AppContext, req: Request<Body>) -> (StatusCode, Value) {
        let response = app(ctx).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn record(ctx: &AppContext, symbol: &str, minute: u32, bid: f64) {
        let tick = QuoteTick {
            symbol: symbol.into(),
            exchange: EXCHANGE_COINEX.into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            best_bid: bid,
            best_ask: bid + 0.5,
            best_bid_qty: 1.0,
            best_ask_qty: 1.0,
            mark_price: None,
            last_price: None,
        };
        ctx.coins_service().record_quote(&tick).await.unwrap();
    }

    async fn next_event(body: &mut Body) -> String {
        let frame = body.frame().await.unwrap().unwrap();
        let data = frame.into_data().unwrap();
        String::from_utf8(data.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn stream_sends_ready_then_recorded_quotes() {
        let ctx = context(InMemoryCoinStore::new());
        let response = app(&ctx).oneshot(get("/api/latest/stream")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
        let mut body = response.into_body();

        let ready = next_event(&mut body).await;
        assert!(ready.starts_with("event: ready\n"), "{ready}");

        record(&ctx, "btcusdt", 1, 100.0).await;
        let quote = tokio::time::timeout(Duration::from_secs(1), next_event(&mut body))
            .await
            .unwrap();
        assert!(quote.starts_with("event: quote\n"), "{quote}");
        assert!(quote.contains(r#""coin_name":"BTCUSDT""#), "{quote}");
        assert!(quote.contains(r#""exchange":"COINEX""#), "{quote}");
    }

    #[tokio::test]
    async fn stream_filters_quotes_by_exchange() {
        let ctx = context(InMemoryCoinStore::new());
        let response = app(&ctx)
            .oneshot(get("/api/latest/stream?exchange=BINANCE"))
            .await
            .unwrap();
        let mut body = response.into_body();
        assert!(next_event(&mut body).await.starts_with("event: ready\n"));

        record(&ctx, "BTCUSDT", 1, 100.0).await;
        let waited =
            tokio::time::timeout(Duration::from_millis(100), next_event(&mut body)).await;
        assert!(waited.is_err(), "quote for another exchange was streamed");
    }

    #[tokio::test]
    async fn creates_lists_and_deletes_coins() {
        let ctx = context(InMemoryCoinStore::new());

        let (status, body) = send(&ctx, post_json("/api/coins", json!({"coin_name": "btcusdt"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["coin_name"], "BTCUSDT");

        let (status, _) = send(&ctx, post_json("/api/coins", json!({"coin_name": "BTCUSDT"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(&ctx, get("/api/coins")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);

        let (status, body) = send(&ctx, get("/api/coins/BTCUSDT")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["coin_name"], "BTCUSDT");

        let delete = Request::delete("/api/coins/BTCUSDT")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&ctx, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&ctx, get("/api/coins/BTCUSDT")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_coin_name_is_bad_request() {
        let ctx = context(InMemoryCoinStore::new());
        let (status, _) = send(&ctx, post_json("/api/coins", json!({"coin_name": "BTC/USDT"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn returns_history_and_latest() {
        let ctx = context(InMemoryCoinStore::new());
        record(&ctx, "ETHUSDT", 0, 3000.0).await;
        record(&ctx, "ETHUSDT", 1, 3001.0).await;
        record(&ctx, "ETHUSDT", 2, 3002.0).await;

        let (status, body) = send(&ctx, get("/api/coins/ETHUSDT/data?limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["best_bid"], 3002.0);
        assert_eq!(items[0]["exchange"], "COINEX");
        assert_eq!(items[0]["mark_price"], Value::Null);

        let (status, body) = send(
            &ctx,
            get("/api/coins/ETHUSDT/data?from=2024-05-01T12:01:00Z&to=2024-05-01T12:01:30Z"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);

        let (status, body) = send(&ctx, get("/api/coins/ETHUSDT/latest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["best_bid"], 3002.0);

        let (status, body) = send(&ctx, get("/api/latest?exchange=coinex")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["coin_name"], "ETHUSDT");
    }

    #[tokio::test]
    async fn reversed_range_is_bad_request() {
        let ctx = context(InMemoryCoinStore::new());
        record(&ctx, "ETHUSDT", 0, 3000.0).await;

        let (status, _) = send(
            &ctx,
            get("/api/coins/ETHUSDT/data?from=2024-05-02T00:00:00Z&to=2024-05-01T00:00:00Z"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_coin_history_is_not_found() {
        let ctx = context(InMemoryCoinStore::new());
        let (status, _) = send(&ctx, get("/api/coins/NOPE/data")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn repository_failure_is_internal_error() {
        let ctx = context(InMemoryCoinStore::offline());
        let (status, _) = send(&ctx, get("/api/coins")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
