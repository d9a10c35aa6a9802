use chrono::{DateTime, Utc};

pub const EXCHANGE_COINEX: &str = "COINEX";

const MAX_NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub coin_id: i32,
    pub coin_name: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted best bid/offer observation.
#[derive(Debug, Clone, PartialEq)]
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

/// Most recent observation per (coin, exchange).
#[derive(Debug, Clone, PartialEq)]
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

/// Quote received from an exchange, keyed by market symbol and not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteTick {
    pub symbol: String,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
    pub best_bid: f64,
    pub best_ask: f64,
    pub best_bid_qty: f64,
    pub best_ask_qty: f64,
    pub mark_price: Option<f64>,
    pub last_price: Option<f64>,
}

impl LatestCoinData {
    pub fn from_record(coin: &Coin, data: &CoinData) -> Self {
        Self {
            coin_id: coin.coin_id,
            coin_name: coin.coin_name.clone(),
            exchange: data.exchange.clone(),
            timestamp: data.timestamp,
            best_bid: data.best_bid,
            best_ask: data.best_ask,
            best_bid_qty: data.best_bid_qty,
            best_ask_qty: data.best_ask_qty,
            mark_price: data.mark_price,
            last_price: data.last_price,
            updated_at: data.updated_at,
        }
    }
}

/// Canonical form of a market symbol: trimmed, upper-cased, `[A-Z0-9_-]{1,32}`.
pub fn normalize_coin_name(raw: &str) -> Option<String> {
    let name = raw.trim().to_ascii_uppercase();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return None;
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return None;
    }
    Some(name)
}

pub fn normalize_exchange(raw: &str) -> Option<String> {
    let exchange = raw.trim().to_ascii_uppercase();
    if exchange.is_empty() {
        None
    } else {
        Some(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_symbols() {
        assert_eq!(normalize_coin_name(" btcusdt ").as_deref(), Some("BTCUSDT"));
        assert_eq!(normalize_coin_name("1000PEPE_USDT").as_deref(), Some("1000PEPE_USDT"));
    }

    #[test]
    fn rejects_bad_symbols() {
        assert!(normalize_coin_name("").is_none());
        assert!(normalize_coin_name("   ").is_none());
        assert!(normalize_coin_name("BTC/USDT").is_none());
        assert!(normalize_coin_name(&"A".repeat(33)).is_none());
    }

    #[test]
    fn blank_exchange_is_no_filter() {
        assert_eq!(normalize_exchange("coinex").as_deref(), Some("COINEX"));
        assert!(normalize_exchange(" ").is_none());
    }
}
