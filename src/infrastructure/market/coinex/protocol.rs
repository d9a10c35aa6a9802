use std::io::Read;

use chrono::DateTime;
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::coins::coin::{EXCHANGE_COINEX, QuoteTick};

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("failed to decompress frame")]
    Decompress(#[source] std::io::Error),
    #[error("failed to decode message")]
    Decode(#[source] serde_json::Error),
    #[error("invalid update timestamp {0}")]
    Timestamp(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Quote(QuoteTick),
    /// Reply to one of our requests, or any message without market data.
    Ack {
        code: Option<i64>,
        message: Option<String>,
    },
}

pub fn sign_request(access_id: &str, signed_str: &str, timestamp_ms: i64) -> String {
    json!({
        "method": "server.sign",
        "params": {
            "access_id": access_id,
            "signed_str": signed_str,
            "timestamp": timestamp_ms,
        },
        "id": 1,
    })
    .to_string()
}

pub fn subscribe_request(markets: &[String]) -> String {
    json!({
        "method": "bbo.subscribe",
        "params": { "market_list": markets },
        "id": 1,
    })
    .to_string()
}

/// Binary frames from CoinEx are gzip-compressed JSON.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, FeedError> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(FeedError::Decompress)?;
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BboUpdate {
    market: String,
    #[serde(deserialize_with = "number_or_string")]
    best_bid_price: f64,
    #[serde(deserialize_with = "number_or_string")]
    best_ask_price: f64,
    #[serde(deserialize_with = "number_or_string")]
    best_bid_size: f64,
    #[serde(deserialize_with = "number_or_string")]
    best_ask_size: f64,
    updated_at: i64,
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub fn parse_message(payload: &[u8]) -> Result<FeedMessage, FeedError> {
    let envelope: Envelope = serde_json::from_slice(payload).map_err(FeedError::Decode)?;
    let data = match envelope.data {
        Some(data) if data.get("market").is_some() => data,
        _ => {
            return Ok(FeedMessage::Ack {
                code: envelope.code,
                message: envelope.message,
            });
        }
    };

    let bbo: BboUpdate = serde_json::from_value(data).map_err(FeedError::Decode)?;
    let timestamp =
        DateTime::from_timestamp_millis(bbo.updated_at).ok_or(FeedError::Timestamp(bbo.updated_at))?;
    Ok(FeedMessage::Quote(QuoteTick {
        symbol: bbo.market,
        exchange: EXCHANGE_COINEX.to_string(),
        timestamp,
        best_bid: bbo.best_bid_price,
        best_ask: bbo.best_ask_price,
        best_bid_qty: bbo.best_bid_size,
        best_ask_qty: bbo.best_ask_size,
        mark_price: None,
        last_price: None,
    }))
}
