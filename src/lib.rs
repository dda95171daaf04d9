//! Trend-following futures bot.
//!
//! Picks the roll-forward contract of one futures market, reads a trailing
//! window of daily closes and scores momentum as a z-score of a fast EWM mean
//! against a slow EWM mean and standard deviation. The score can be replayed
//! over a date range or used to reconcile a broker position.

pub mod broker;
pub mod config;
pub mod contracts;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod series;
pub mod simulation;
pub mod strategy;
pub mod types;

pub use crate::config::BotConfig;
pub use crate::error::{BotError, Result};
