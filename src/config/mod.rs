//! Configuration module
//!
//! Settings that shape generated SQL and insert behaviour, loaded from
//! TOML.

pub mod config;

pub use config::DaoConfig;
