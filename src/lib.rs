//! MEMEFOLIO: portfolio gain/loss calculator with memes and roasts.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod classify;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod prices;
pub mod server;
pub mod storage;
pub mod types;
