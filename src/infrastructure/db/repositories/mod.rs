pub mod coin_data_repository_sqlx;
pub mod coin_repository_sqlx;
pub mod latest_coin_data_repository_sqlx;
