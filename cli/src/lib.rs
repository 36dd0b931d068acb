//! coinfolio-cli: runs coinfolio backtests from a TOML config and price files.
//!
//! Price histories are read from `<prices.dir>/<COIN>.json`, merged into a
//! fully covered price table, and handed to the engine. Results are printed
//! as tables or written as JSON.

pub mod commands;
pub mod config;
pub mod error;
pub mod prices;
pub mod report;
