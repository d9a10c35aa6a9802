use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::infrastructure::db::PgPool;

#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub market_feed_enabled: bool,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct HealthResp {
    /// "ok" when the database answers, "degraded" otherwise.
    pub status: &'static str,
    pub database: &'static str,
    pub market_feed: &'static str,
}

fn summarize(db_ok: bool, market_feed_enabled: bool) -> HealthResp {
    HealthResp {
        status: if db_ok { "ok" } else { "degraded" },
        database: if db_ok { "up" } else { "down" },
        market_feed: if market_feed_enabled {
            "enabled"
        } else {
            "disabled"
        },
    }
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, body = HealthResp))
)]
pub async fn health(State(state): State<HealthState>) -> Json<HealthResp> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    if !db_ok {
        tracing::warn!("health_database_unreachable");
    }
    Json(summarize(db_ok, state.market_feed_enabled))
}

pub fn routes(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}
