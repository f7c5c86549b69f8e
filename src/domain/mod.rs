//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod composite;
pub mod analysis;
pub mod fundamental;
pub mod screener;
pub mod filter_parser;
pub mod position;
pub mod portfolio;
pub mod universe;
pub mod config_validation;
pub mod error;
