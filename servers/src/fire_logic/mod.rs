pub mod config;
pub mod reload;
