pub mod db;
pub mod market;
