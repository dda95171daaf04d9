//! Brokerage boundary.
//!
//! Everything the bot knows about contracts, prices and positions comes through
//! this trait. A live implementation wraps a vendor client; `paper` holds an
//! in-memory account for demos and tests.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{Bar, BarSize, Contract, ContractTemplate, OrderId, OrderParams, Position, WhatToShow};

pub mod paper;

#[async_trait]
pub trait Broker: Send + Sync {
    fn is_connected(&self) -> bool;

    /// All listed contract variants matching the template, in broker order.
    async fn contract_details(&self, template: &ContractTemplate) -> anyhow::Result<Vec<Contract>>;

    /// Bars ending at `end` (inclusive) and covering `duration_days` calendar days.
    async fn historical_bars(
        &self,
        contract: &Contract,
        end: NaiveDate,
        duration_days: u32,
        bar_size: BarSize,
        what_to_show: WhatToShow,
        use_rth: bool,
    ) -> anyhow::Result<Vec<Bar>>;

    async fn positions(&self) -> anyhow::Result<Vec<Position>>;

    async fn place_order(&self, params: OrderParams) -> anyhow::Result<OrderId>;
}
