//! Signal layer.
//!
//! A signal turns a reference date into a desired exposure on one contract.
//! The simulation and execution drivers only see the [`Signal`] trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Contract;

pub mod trend_follow;

pub use trend_follow::{SignalConfig, TrendFollowSignal, ZeroVolatilityPolicy};

/// One evaluation of a signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub date: NaiveDate,
    /// Contract the value applies to.
    pub contract: Contract,
    /// Desired exposure in signal units. `None` means "do not trade".
    pub value: Option<f64>,
    pub last_close: f64,
    pub bars: usize,
}

#[async_trait]
pub trait Signal: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(&self, date: NaiveDate) -> Result<SignalReading>;
}
