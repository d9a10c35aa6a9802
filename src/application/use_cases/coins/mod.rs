pub mod create_coin;
pub mod delete_coin;
pub mod error;
pub mod get_coin;
pub mod get_coin_history;
pub mod latest_for_coin;
pub mod list_coins;
pub mod list_latest;
pub mod record_quote;

pub use error::CoinsError;
