pub mod coins;
pub mod health;
