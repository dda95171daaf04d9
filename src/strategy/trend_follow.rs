//! Trend-following momentum on the roll-forward future.
//!
//! The reading is a z-score of a fast EWM mean against a slow EWM mean,
//! normalized by the slow EWM standard deviation:
//!
//! ```text
//! value = (ewm_mean(short) - ewm_mean(long)) / ewm_std(long)
//! ```
//!
//! evaluated at the last daily close of a trailing window. Missing closes are
//! forward-filled and anything before the first observation counts as zero.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::contracts::front_month_contract;
use crate::error::{BotError, Result};
use crate::indicators::{ewm_last, ewm_mean, Decay};
use crate::series::PriceSeries;
use crate::strategy::{Signal, SignalReading};
use crate::types::{BarSize, ContractTemplate, WhatToShow};

/// What to report when the slow standard deviation is zero or undefined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVolatilityPolicy {
    /// Report a value of zero: no exposure.
    #[default]
    Flat,
    /// Report no value: leave the current position untouched.
    Hold,
}

/// Upper bound on any day count in [`SignalConfig`] (about a century).
pub const MAX_HORIZON_DAYS: u32 = 36_500;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub template: ContractTemplate,
    pub short_decay: Decay,
    pub long_decay: Decay,
    /// Calendar days of daily bars requested per evaluation.
    pub lookback_days: u32,
    /// Index into the eligible contract chain (1 = one past the nearest).
    pub nth_contract: usize,
    pub min_days_to_expiry: u32,
    pub zero_volatility: ZeroVolatilityPolicy,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            template: ContractTemplate::default(),
            short_decay: Decay::Com(1.0),
            long_decay: Decay::Com(30.0),
            lookback_days: 30,
            nth_contract: 1,
            min_days_to_expiry: 50,
            zero_volatility: ZeroVolatilityPolicy::Flat,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.short_decay.alpha().is_none() {
            return Err(BotError::InvalidConfig(format!("bad short_decay {:?}", self.short_decay)));
        }
        if self.long_decay.alpha().is_none() {
            return Err(BotError::InvalidConfig(format!("bad long_decay {:?}", self.long_decay)));
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_HORIZON_DAYS {
            return Err(BotError::InvalidConfig(format!(
                "lookback_days must be in 1..={MAX_HORIZON_DAYS}, got {}",
                self.lookback_days
            )));
        }
        if self.min_days_to_expiry > MAX_HORIZON_DAYS {
            return Err(BotError::InvalidConfig(format!(
                "min_days_to_expiry must be at most {MAX_HORIZON_DAYS}, got {}",
                self.min_days_to_expiry
            )));
        }
        if self.template.symbol.0.is_empty() {
            return Err(BotError::InvalidConfig("template symbol is empty".into()));
        }
        Ok(())
    }
}

/// Z-score of the short EWM mean against the long EWM mean/std at the last point.
///
/// `None` when the long standard deviation is zero (relative to the price
/// level), undefined, or when the result would not be finite.
pub fn ewm_zscore(closes: &[f64], short: Decay, long: Decay) -> Option<f64> {
    let short_mean = ewm_mean(closes, short)?;
    let long_stats = ewm_last(closes, long)?;
    let std = long_stats.std?;
    if !std.is_finite() || std <= 1e-12 * long_stats.mean.abs().max(1.0) {
        return None;
    }
    let z = (short_mean - long_stats.mean) / std;
    z.is_finite().then_some(z)
}

pub struct TrendFollowSignal {
    broker: Arc<dyn Broker>,
    cfg: SignalConfig,
}

impl TrendFollowSignal {
    pub fn new(broker: Arc<dyn Broker>, cfg: SignalConfig) -> Self {
        Self { broker, cfg }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.cfg
    }
}

#[async_trait]
impl Signal for TrendFollowSignal {
    fn name(&self) -> &str {
        "trend_follow"
    }

    async fn evaluate(&self, date: NaiveDate) -> Result<SignalReading> {
        if !self.broker.is_connected() {
            return Err(BotError::NotConnected);
        }
        let cfg = &self.cfg;

        let contract = front_month_contract(
            self.broker.as_ref(),
            &cfg.template,
            date,
            cfg.nth_contract,
            cfg.min_days_to_expiry,
        )
        .await?;

        let bars = self
            .broker
            .historical_bars(&contract, date, cfg.lookback_days, BarSize::OneDay, WhatToShow::Trades, true)
            .await?;
        if bars.is_empty() {
            return Err(BotError::NoPriceData {
                contract: contract.local_symbol.clone(),
                end: date,
            });
        }

        let series = PriceSeries::from_bars(&bars);
        let closes = series.filled();
        debug!(
            contract = %contract.local_symbol,
            bars = series.len(),
            missing = series.missing(),
            "loaded closes"
        );

        let value = match ewm_zscore(&closes, cfg.short_decay, cfg.long_decay) {
            Some(z) => Some(z),
            None => {
                warn!(
                    %date,
                    contract = %contract.local_symbol,
                    policy = ?cfg.zero_volatility,
                    "long-term volatility is zero or undefined"
                );
                match cfg.zero_volatility {
                    ZeroVolatilityPolicy::Flat => Some(0.0),
                    ZeroVolatilityPolicy::Hold => None,
                }
            }
        };

        let last_close = closes.last().copied().unwrap_or(0.0);
        info!(%date, contract = %contract.local_symbol, ?value, last_close, "signal");

        Ok(SignalReading {
            date,
            contract,
            value,
            last_close,
            bars: series.len(),
        })
    }
}
