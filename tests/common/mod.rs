#![allow(dead_code)]

use chrono::NaiveDate;
use futures_trend_bot::broker::paper::PaperBroker;
use futures_trend_bot::indicators::Decay;
use futures_trend_bot::strategy::SignalConfig;
use futures_trend_bot::types::*;

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn contract(id: i64, code: &str, expiry: NaiveDate) -> Contract {
    Contract {
        con_id: ContractId(id),
        symbol: Symbol("CL".into()),
        exchange: Exchange("NYMEX".into()),
        local_symbol: code.into(),
        expiry,
        multiplier: 1000.0,
    }
}

pub fn bar(date: NaiveDate, close: f64) -> Bar {
    Bar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 100.0,
    }
}

/// Reference date used throughout: Thursday 2026-01-15.
pub fn as_of() -> NaiveDate {
    ymd(2026, 1, 15)
}

/// CLH6 (nearest eligible on `as_of`), CLM6 (roll-forward), CLU6, CLZ6.
pub fn chain() -> Vec<Contract> {
    vec![
        contract(2, "CLM6", ymd(2026, 6, 19)),
        contract(1, "CLH6", ymd(2026, 3, 20)),
        contract(4, "CLZ6", ymd(2026, 12, 18)),
        contract(3, "CLU6", ymd(2026, 9, 18)),
    ]
}

pub fn roll_forward() -> Contract {
    contract(2, "CLM6", ymd(2026, 6, 19))
}

/// Paper account where the roll-forward contract closes at `closes` on the
/// business days ending `as_of`, and every other contract trades flat at 50.
pub fn broker_with_closes(closes: &[f64]) -> PaperBroker {
    let broker = PaperBroker::new();
    let days = trailing_business_days(as_of(), closes.len());
    for c in chain() {
        let bars = if c.con_id == ContractId(2) {
            days.iter().zip(closes).map(|(d, px)| bar(*d, *px)).collect()
        } else {
            days.iter().map(|d| bar(*d, 50.0)).collect()
        };
        broker.add_contract(c, bars);
    }
    broker
}

pub fn trailing_business_days(end: NaiveDate, n: usize) -> Vec<NaiveDate> {
    use chrono::{Datelike, Weekday};
    let mut out = Vec::new();
    let mut d = end;
    while out.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d = d.pred_opt().unwrap();
    }
    out.reverse();
    out
}

/// Short com=0 (last close), long com=1: on closes 1, 2, 3 the score is
/// (3 - 17/7) / sqrt(13/14).
pub fn hand_config() -> SignalConfig {
    SignalConfig {
        short_decay: Decay::Com(0.0),
        long_decay: Decay::Com(1.0),
        ..Default::default()
    }
}

pub fn hand_score() -> f64 {
    (3.0 - 17.0 / 7.0) / (13.0f64 / 14.0).sqrt()
}
