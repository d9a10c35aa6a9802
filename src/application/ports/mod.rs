pub mod coin_data_repository;
pub mod coin_repository;
pub mod latest_coin_data_repository;
