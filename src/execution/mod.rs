//! Position reconciliation.
//!
//! The driver turns today's signal into a whole-contract target, compares it
//! with what the account holds in the active contract and sends one market
//! order for the difference. Running it twice with an unchanged signal trades
//! once: the second run finds the account already at target.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::broker::Broker;
use crate::error::{BotError, Result};
use crate::strategy::Signal;
use crate::types::{Contract, OrderId, OrderParams, Position, Side, TimeInForce};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Contracts per unit of signal.
    pub contracts_per_unit: f64,
    /// Absolute cap on the target position.
    pub max_contracts: u32,
    pub tif: TimeInForce,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            contracts_per_unit: 1.0,
            max_contracts: 10,
            tif: TimeInForce::Day,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.contracts_per_unit.is_finite() && self.contracts_per_unit > 0.0) {
            return Err(BotError::InvalidConfig(format!(
                "contracts_per_unit must be positive, got {}",
                self.contracts_per_unit
            )));
        }
        Ok(())
    }

    /// Whole-contract target for a signal value.
    pub fn target_contracts(&self, value: f64) -> f64 {
        let cap = f64::from(self.max_contracts);
        // `+ 0.0` turns a rounded -0.0 into 0.0
        (value * self.contracts_per_unit).round().clamp(-cap, cap) + 0.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    /// Signal produced no value; nothing was compared or sent.
    Skipped,
    /// Account already at target.
    AtTarget,
    /// One order sent and the account verified at target.
    Traded { order_id: OrderId, side: Side, qty_contracts: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub date: NaiveDate,
    pub contract: Contract,
    pub signal: Option<f64>,
    pub previous: f64,
    pub target: Option<f64>,
    pub outcome: ExecutionOutcome,
}

pub struct ExecutionDriver<S> {
    broker: Arc<dyn Broker>,
    signal: S,
    cfg: ExecutionConfig,
}

impl<S: Signal> ExecutionDriver<S> {
    pub fn new(broker: Arc<dyn Broker>, signal: S, cfg: ExecutionConfig) -> Self {
        Self { broker, signal, cfg }
    }

    pub fn signal(&self) -> &S {
        &self.signal
    }

    /// Bring the active-contract position in line with the signal for `date`.
    pub async fn rebalance(&self, date: NaiveDate) -> Result<ExecutionReport> {
        if !self.broker.is_connected() {
            return Err(BotError::NotConnected);
        }
        let reading = self.signal.evaluate(date).await?;
        let contract = reading.contract;

        let positions = self.broker.positions().await?;
        report_roll_leftovers(&positions, &contract);
        let previous = held_quantity(&positions, &contract);

        let Some(value) = reading.value else {
            info!(%date, contract = %contract.local_symbol, previous, "no signal value, holding");
            return Ok(ExecutionReport {
                date,
                contract,
                signal: None,
                previous,
                target: None,
                outcome: ExecutionOutcome::Skipped,
            });
        };

        let target = self.cfg.target_contracts(value);
        let delta = target - previous;
        let Some(side) = Side::for_delta(delta) else {
            info!(%date, contract = %contract.local_symbol, target, "already at target");
            return Ok(ExecutionReport {
                date,
                contract,
                signal: Some(value),
                previous,
                target: Some(target),
                outcome: ExecutionOutcome::AtTarget,
            });
        };

        let qty = delta.abs();
        info!(
            %date,
            contract = %contract.local_symbol,
            previous,
            target,
            ?side,
            qty,
            "sending market order"
        );
        let order_id = self
            .broker
            .place_order(OrderParams::market(contract.clone(), side, qty, self.cfg.tif))
            .await?;

        let after = held_quantity(&self.broker.positions().await?, &contract);
        if after != target {
            return Err(BotError::PositionMismatch {
                contract: contract.local_symbol.clone(),
                expected: target,
                actual: after,
            });
        }

        Ok(ExecutionReport {
            date,
            contract,
            signal: Some(value),
            previous,
            target: Some(target),
            outcome: ExecutionOutcome::Traded {
                order_id,
                side,
                qty_contracts: qty,
            },
        })
    }
}

/// Net quantity held in `contract`, matched on symbol and expiry.
pub fn held_quantity(positions: &[Position], contract: &Contract) -> f64 {
    positions
        .iter()
        .filter(|p| p.contract.same_listing(contract))
        .map(|p| p.quantity)
        .sum::<f64>()
        + 0.0
}

fn report_roll_leftovers(positions: &[Position], active: &Contract) {
    for p in positions {
        if p.contract.symbol == active.symbol && !p.contract.same_listing(active) && p.quantity != 0.0 {
            warn!(
                held = %p.contract.local_symbol,
                active = %active.local_symbol,
                quantity = p.quantity,
                "position left in a contract that is no longer active"
            );
        }
    }
}
