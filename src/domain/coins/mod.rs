pub mod coin;
