//! Recipe catalog: SQLite-backed server, HTTP client session and a local
//! shopping list.

pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod server;
pub mod shopping;
pub mod storage;
