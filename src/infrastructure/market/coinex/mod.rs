//! CoinEx futures market-data feed: best bid/offer updates over WebSocket,
//! stored through the coins service.

pub mod client;
pub mod protocol;
pub mod schedule;

pub use client::CoinexFeed;
